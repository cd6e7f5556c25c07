use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::ArtifactError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Attacking,
    Defending,
    Passing,
    KeyPassing,
    Goalkeeping,
    General,
}

impl Category {
    /// Merge order of the performance sheets. General is joined last.
    pub const PERFORMANCE: [Category; 5] = [
        Category::Attacking,
        Category::Defending,
        Category::Passing,
        Category::KeyPassing,
        Category::Goalkeeping,
    ];

    pub fn sheet_name(self) -> &'static str {
        match self {
            Category::Attacking => "Attacking",
            Category::Defending => "Defending",
            Category::Passing => "Passing",
            Category::KeyPassing => "Key Passing",
            Category::Goalkeeping => "Goalkeeping",
            Category::General => "General",
        }
    }

    pub fn from_sheet_name(raw: &str) -> Option<Self> {
        let name = raw.trim();
        [Category::General]
            .into_iter()
            .chain(Category::PERFORMANCE)
            .find(|c| c.sheet_name().eq_ignore_ascii_case(name))
    }
}

/// One sheet of the workbook: a header row and string cells, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawStatTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Cell text, `None` for blank cells and for rows shorter than the header.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn from_csv_reader<R: Read>(name: impl Into<String>, rdr: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
        Ok(Self::new(name, headers, rows))
    }

    pub fn from_csv_path(name: impl Into<String>, path: &Path) -> Result<Self, ArtifactError> {
        let file = fs::File::open(path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv_reader(name, file).map_err(|source| ArtifactError::Csv {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Sheets of a stats workbook keyed by sheet name.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: BTreeMap<String, RawStatTable>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: RawStatTable) {
        self.sheets.insert(table.name.clone(), table);
    }

    pub fn remove(&mut self, name: &str) -> Option<RawStatTable> {
        self.sheets.remove(name)
    }

    pub fn sheet(&self, name: &str) -> Option<&RawStatTable> {
        self.sheets.get(name)
    }

    pub fn category(&self, category: Category) -> Option<&RawStatTable> {
        self.sheet(category.sheet_name()).or_else(|| {
            self.sheets
                .values()
                .find(|t| Category::from_sheet_name(&t.name) == Some(category))
        })
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(|k| k.as_str())
    }

    /// Reads every `*.csv` in `dir` as a sheet named after the file stem
    /// (`Key Passing.csv` → "Key Passing").
    pub fn load_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let io_err = |source: std::io::Error| ArtifactError::Io {
            path: dir.display().to_string(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut workbook = Self::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let table = RawStatTable::from_csv_path(stem, &path)?;
            workbook.insert(table);
        }
        Ok(workbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_round_trip_through_category() {
        for category in Category::PERFORMANCE {
            assert_eq!(Category::from_sheet_name(category.sheet_name()), Some(category));
        }
        assert_eq!(Category::from_sheet_name(" key passing "), Some(Category::KeyPassing));
        assert_eq!(Category::from_sheet_name("Shooting"), None);
    }

    #[test]
    fn csv_reader_keeps_short_rows_and_strips_bom() {
        let raw = "\u{feff}Player,Goals,Assists\nA,1,2\nB,3\n";
        let table = RawStatTable::from_csv_reader("Attacking", raw.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Player", "Goals", "Assists"]);
        assert_eq!(table.cell(1, 1), Some("3"));
        assert_eq!(table.cell(1, 2), None);
    }
}
