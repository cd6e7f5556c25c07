use std::env;
use std::path::PathBuf;

pub const PLAYER_COLUMN: &str = "Player";
pub const POSITION_COLUMN: &str = "Position";
pub const MINUTES_COLUMN: &str = "Minutes played";

pub const DEFAULT_EXCLUDED_KEYWORDS: [&str; 6] = [
    "team",
    "age",
    "passport",
    "height",
    "weight",
    "matches played",
];
pub const DEFAULT_LEFT_SUFFIX: &str = "_x";
pub const DEFAULT_RIGHT_SUFFIX: &str = "_y";

pub const DEFAULT_DIMENSIONS: usize = 5;
pub const DEFAULT_NEIGHBORS: usize = 5;
pub const DEFAULT_ARTIFACT_FILE: &str = "standardized_players.csv";

/// Column rules applied while merging and filtering the stat sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationConfig {
    /// Lowercase substrings; a column whose lowercased name contains any of
    /// these is not a performance stat.
    pub excluded_keywords: Vec<String>,
    /// Suffix given to the existing column when a join brings in a second
    /// column of the same name.
    pub left_suffix: String,
    /// Suffix given to the incoming column on a name collision.
    pub right_suffix: String,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            excluded_keywords: DEFAULT_EXCLUDED_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            left_suffix: DEFAULT_LEFT_SUFFIX.to_string(),
            right_suffix: DEFAULT_RIGHT_SUFFIX.to_string(),
        }
    }
}

impl ConsolidationConfig {
    pub fn is_excluded_keyword(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        self.excluded_keywords
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
    }

    pub fn is_collision_variant(&self, column: &str) -> bool {
        column.ends_with(&self.left_suffix) || column.ends_with(&self.right_suffix)
    }

    /// `column` is `base` itself or `base` followed only by collision
    /// suffixes (`Position_y`, `Position_x_x`).
    pub fn is_variant_of(&self, column: &str, base: &str) -> bool {
        let Some(mut rest) = column.strip_prefix(base) else {
            return false;
        };
        'strip: while !rest.is_empty() {
            for suffix in [&self.left_suffix, &self.right_suffix] {
                if !suffix.is_empty()
                    && let Some(tail) = rest.strip_prefix(suffix.as_str())
                {
                    rest = tail;
                    continue 'strip;
                }
            }
            return false;
        }
        true
    }

    pub fn excludes(&self, column: &str) -> bool {
        self.is_excluded_keyword(column) || self.is_collision_variant(column)
    }
}

#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub data_dir: PathBuf,
    pub artifact_path: PathBuf,
    pub consolidation: ConsolidationConfig,
    pub default_dimensions: usize,
    pub neighbors: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_FILE),
            consolidation: ConsolidationConfig::default(),
            default_dimensions: DEFAULT_DIMENSIONS,
            neighbors: DEFAULT_NEIGHBORS,
        }
    }
}

impl ScoutConfig {
    /// Defaults overridden by `SCOUT_*` environment variables. Blank values
    /// are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = non_blank_var("SCOUT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_blank_var("SCOUT_ARTIFACT_PATH") {
            config.artifact_path = PathBuf::from(path);
        }
        if let Some(raw) = non_blank_var("SCOUT_EXCLUDE_KEYWORDS") {
            let keywords = parse_list(&raw)
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect::<Vec<_>>();
            if !keywords.is_empty() {
                config.consolidation.excluded_keywords = keywords;
            }
        }
        if let Some(raw) = non_blank_var("SCOUT_COLLISION_SUFFIXES") {
            let suffixes = parse_list(&raw);
            if let [left, right] = suffixes.as_slice()
                && left != right
            {
                config.consolidation.left_suffix = left.clone();
                config.consolidation.right_suffix = right.clone();
            }
        }
        config.default_dimensions = non_blank_var("SCOUT_DEFAULT_DIMS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_DIMENSIONS)
            .max(1);
        config.neighbors = non_blank_var("SCOUT_NEIGHBORS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_NEIGHBORS)
            .max(1);
        config
    }
}

/// Comma separated values, trimmed, empties dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let config = ConsolidationConfig::default();
        assert!(config.excludes("Team within selected timeframe"));
        assert!(config.excludes("Matches played"));
        assert!(config.excludes("Average pass length"));
        assert!(!config.excludes("Goals per 90"));
    }

    #[test]
    fn collision_suffixes_are_excluded() {
        let config = ConsolidationConfig::default();
        assert!(config.excludes("Goals_x"));
        assert!(config.excludes("Goals_y"));
        assert!(!config.excludes("Goals"));
    }

    #[test]
    fn variants_are_the_name_plus_suffixes() {
        let config = ConsolidationConfig::default();
        assert!(config.is_variant_of("Position", "Position"));
        assert!(config.is_variant_of("Position_y", "Position"));
        assert!(config.is_variant_of("Position_x_x", "Position"));
        assert!(!config.is_variant_of("Positional play", "Position"));
        assert!(!config.is_variant_of("Position_z", "Position"));
        assert!(!config.is_variant_of("Pos", "Position"));
    }

    #[test]
    fn parse_list_trims_and_drops_empties() {
        assert_eq!(parse_list(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
    }
}
