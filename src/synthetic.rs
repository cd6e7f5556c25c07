use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::stat_table::{Category, RawStatTable, Workbook};

const POSITIONS: [&str; 6] = ["CF", "LW", "RW", "CM", "CB", "LB"];
const TEAMS: [&str; 6] = [
    "Melbourne City",
    "Sydney FC",
    "Central Coast Mariners",
    "Western United",
    "Brisbane Roar",
    "Perth Glory",
];

/// Seeded workbook shaped like a league stats export: every fourth player
/// is a goalkeeper who only appears in Goalkeeping, Passing and General.
pub fn synthetic_workbook(players: usize, seed: u64) -> Workbook {
    let mut rng = StdRng::seed_from_u64(seed);
    let roster = (0..players)
        .map(|i| SyntheticPlayer {
            name: format!("Player {:03}", i + 1),
            team: TEAMS[i % TEAMS.len()],
            keeper: i % 4 == 3,
            position: if i % 4 == 3 {
                "GK"
            } else {
                POSITIONS[i % POSITIONS.len()]
            },
            minutes: rng.gen_range(90..2_400),
            age: rng.gen_range(17..36),
        })
        .collect::<Vec<_>>();

    let mut workbook = Workbook::new();
    workbook.insert(sheet(
        Category::Attacking,
        &["Team", "Age", "Matches played", "Goals", "xG", "Shots", "Shots on target, %"],
        roster.iter().filter(|p| !p.keeper),
        &mut rng,
        |p, rng| {
            let shots = rng.gen_range(0.0..4.0_f64);
            vec![
                p.team.to_string(),
                p.age.to_string(),
                (p.minutes / 80).to_string(),
                fmt2(shots * rng.gen_range(0.05..0.2)),
                fmt2(shots * rng.gen_range(0.06..0.15)),
                fmt2(shots),
                fmt2(rng.gen_range(10.0..70.0)),
            ]
        },
    ));
    workbook.insert(sheet(
        Category::Defending,
        &["Team", "Defensive duels per 90", "Interceptions per 90", "Sliding tackles per 90"],
        roster.iter().filter(|p| !p.keeper),
        &mut rng,
        |p, rng| {
            vec![
                p.team.to_string(),
                fmt2(rng.gen_range(1.0..10.0)),
                fmt2(rng.gen_range(0.5..6.0)),
                fmt2(rng.gen_range(0.0..1.5)),
            ]
        },
    ));
    workbook.insert(sheet(
        Category::Passing,
        &["Team", "Passes per 90", "Accurate passes, %", "Progressive passes per 90"],
        roster.iter(),
        &mut rng,
        |p, rng| {
            let passes = rng.gen_range(10.0..60.0_f64);
            vec![
                p.team.to_string(),
                fmt2(passes),
                fmt2(rng.gen_range(55.0..92.0)),
                // Keepers sometimes export a dash instead of a number.
                if p.keeper && rng.gen_bool(0.5) {
                    "-".to_string()
                } else {
                    fmt2(passes * rng.gen_range(0.05..0.2))
                },
            ]
        },
    ));
    workbook.insert(sheet(
        Category::KeyPassing,
        &["Key passes per 90", "Smart passes per 90", "Shot assists per 90"],
        roster.iter().filter(|p| !p.keeper),
        &mut rng,
        |_, rng| {
            vec![
                fmt2(rng.gen_range(0.0..2.5)),
                fmt2(rng.gen_range(0.0..1.5)),
                fmt2(rng.gen_range(0.0..2.0)),
            ]
        },
    ));
    workbook.insert(sheet(
        Category::Goalkeeping,
        &["Team", "Height", "Conceded goals per 90", "Save rate, %", "Exits per 90"],
        roster.iter().filter(|p| p.keeper),
        &mut rng,
        |p, rng| {
            vec![
                p.team.to_string(),
                rng.gen_range(165..185).to_string(),
                fmt2(rng.gen_range(0.5..2.5)),
                fmt2(rng.gen_range(55.0..85.0)),
                fmt2(rng.gen_range(0.1..1.5)),
            ]
        },
    ));
    workbook.insert(sheet(
        Category::General,
        &["Team", "Position", "Age", "Minutes played", "Passport country"],
        roster.iter(),
        &mut rng,
        |p, _| {
            vec![
                p.team.to_string(),
                p.position.to_string(),
                p.age.to_string(),
                p.minutes.to_string(),
                "Australia".to_string(),
            ]
        },
    ));
    workbook
}

struct SyntheticPlayer {
    name: String,
    team: &'static str,
    keeper: bool,
    position: &'static str,
    minutes: u32,
    age: u32,
}

fn sheet<'a>(
    category: Category,
    columns: &[&str],
    players: impl Iterator<Item = &'a SyntheticPlayer>,
    rng: &mut StdRng,
    mut cells: impl FnMut(&SyntheticPlayer, &mut StdRng) -> Vec<String>,
) -> RawStatTable {
    let mut headers = vec!["Player".to_string()];
    headers.extend(columns.iter().map(|c| c.to_string()));
    let rows = players
        .map(|p| {
            let mut row = vec![p.name.clone()];
            row.extend(cells(p, rng));
            row
        })
        .collect();
    RawStatTable::new(category.sheet_name(), headers, rows)
}

fn fmt2(v: f64) -> String {
    format!("{v:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_workbook() {
        let a = synthetic_workbook(12, 7);
        let b = synthetic_workbook(12, 7);
        for category in Category::PERFORMANCE {
            assert_eq!(a.category(category), b.category(category));
        }
        assert_eq!(a.category(Category::General).map(|t| t.rows.len()), Some(12));
        assert_eq!(a.category(Category::Goalkeeping).map(|t| t.rows.len()), Some(3));
    }
}
