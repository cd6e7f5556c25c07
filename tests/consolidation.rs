use std::path::PathBuf;

use alw_scout::artifact::{ArtifactMeta, write_artifact};
use alw_scout::config::ConsolidationConfig;
use alw_scout::consolidate::consolidate_workbook;
use alw_scout::error::{ConsolidationError, ConsolidationWarning};
use alw_scout::stat_table::{Category, RawStatTable, Workbook};
use alw_scout::similarity::{SimilarityQuery, find_similar};
use alw_scout::standardize::mean_std;
use alw_scout::synthetic::synthetic_workbook;

fn fixture_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("workbook");
    path
}

fn fixture_workbook() -> Workbook {
    Workbook::load_dir(&fixture_dir()).expect("fixture workbook should load")
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("alw_scout_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn loads_every_sheet_by_file_stem() {
    let workbook = fixture_workbook();
    let names = workbook.sheet_names().collect::<Vec<_>>();
    assert_eq!(names.len(), 6);
    assert!(workbook.category(Category::KeyPassing).is_some());
    assert_eq!(
        workbook.category(Category::Passing).map(|t| t.headers[2].as_str()),
        Some("Accurate passes, %")
    );
}

#[test]
fn merge_keeps_every_performance_player_once() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default())
        .expect("fixture should consolidate");
    let players = out
        .table
        .identities()
        .iter()
        .map(|id| id.player.as_str())
        .collect::<Vec<_>>();
    // Zed only appears in General.
    assert_eq!(players, vec!["Ana", "Bea", "Cal", "Dan", "Gus", "Hugo"]);
    assert_eq!(out.report.players, 6);
    assert_eq!(out.report.merged_columns, 18);
}

#[test]
fn identity_comes_from_general() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default()).unwrap();
    let ana = out.table.identity(out.table.row_of("Ana").unwrap()).unwrap();
    assert_eq!(ana.position.as_deref(), Some("FW"));
    assert_eq!(ana.minutes_played, Some(1810.0));

    let gus = out.table.identity(out.table.row_of("Gus").unwrap()).unwrap();
    assert_eq!(gus.position.as_deref(), Some("GK"));
    assert_eq!(gus.minutes_played, Some(2700.0));
}

#[test]
fn keeper_only_in_goalkeeping_gets_zero_filled_outfield_stats() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default()).unwrap();
    let row = out.table.row_of("Hugo").expect("keeper should be merged");
    let hugo = out.table.identity(row).unwrap();
    assert_eq!(hugo.position.as_deref(), Some("GK"));
    assert_eq!(hugo.minutes_played, Some(1350.0));

    for feature in ["Goals", "Tackles", "Passes"] {
        let stats = out
            .report
            .column_stats
            .iter()
            .find(|s| s.feature == feature)
            .unwrap();
        let value = out.table.column(feature).unwrap()[row];
        let expected = (0.0 - stats.mean) / stats.std_dev;
        assert!((value - expected).abs() < 1e-12, "{feature}");
    }
}

#[test]
fn keyword_and_collision_columns_are_dropped() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default()).unwrap();
    assert_eq!(
        out.table.feature_names(),
        [
            "Goals",
            "Shots",
            "Tackles",
            "Interceptions",
            "Passes",
            "Accurate passes, %",
            "Key passes",
            "Own goals",
            "Saves",
        ]
    );
    assert_eq!(
        out.report.dropped_columns,
        vec![
            "Team_x",
            "Age",
            "Minutes played_x",
            "Team_y",
            "Position_x",
            "Average rating",
            "Height",
        ]
    );
}

#[test]
fn features_are_standardized() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default()).unwrap();
    for (name, column) in out.table.feature_names().iter().zip(out.table.values().columns()) {
        let (mean, std) = mean_std(column);
        assert!(mean.abs() < 1e-9, "{name} mean {mean}");
        if name != "Own goals" {
            assert!((std - 1.0).abs() < 1e-9, "{name} std {std}");
        }
    }
}

#[test]
fn constant_column_falls_back_and_warns() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default()).unwrap();
    let own_goals = out.table.column("Own goals").unwrap();
    assert!(own_goals.iter().all(|v| *v == 0.0));
    assert!(
        out.report
            .warnings
            .contains(&ConsolidationWarning::DegenerateColumn("Own goals".to_string()))
    );
    let stats = out
        .report
        .column_stats
        .iter()
        .find(|s| s.feature == "Own goals")
        .unwrap();
    assert!(stats.degenerate);
}

#[test]
fn missing_cells_become_zero_before_scaling() {
    let out = consolidate_workbook(&fixture_workbook(), &ConsolidationConfig::default()).unwrap();
    let saves = out.report.column_stats.iter().find(|s| s.feature == "Saves").unwrap();
    // Only the keepers have a value.
    assert!((saves.mean - (3.2 + 2.4) / 6.0).abs() < 1e-12);
    let accurate = out
        .report
        .column_stats
        .iter()
        .find(|s| s.feature == "Accurate passes, %")
        .unwrap();
    // Gus exports "-".
    assert!((accurate.mean - (78.5 + 84.0 + 76.2 + 88.3) / 6.0).abs() < 1e-9);
}

#[test]
fn missing_sheet_fails_without_writing_artifact() {
    let mut workbook = fixture_workbook();
    workbook.remove("Passing");
    let dir = temp_dir("missing_sheet");
    let path = dir.join("standardized_players.csv");

    // The artifact is only written from a successful consolidation.
    let err = match consolidate_workbook(&workbook, &ConsolidationConfig::default()) {
        Ok(out) => {
            let meta = ArtifactMeta::from_report(&out.report, None);
            let _ = write_artifact(&path, &out.table, &meta);
            panic!("consolidation should fail without Passing");
        }
        Err(err) => err,
    };
    assert_eq!(err, ConsolidationError::MissingCategory("Passing".to_string()));
    assert!(!path.exists());
}

#[test]
fn sheet_without_player_column_is_rejected() {
    let mut workbook = fixture_workbook();
    workbook.insert(RawStatTable::new(
        "Defending",
        vec!["Name".to_string(), "Tackles".to_string()],
        vec![vec!["Ana".to_string(), "1.0".to_string()]],
    ));
    let err = consolidate_workbook(&workbook, &ConsolidationConfig::default()).unwrap_err();
    assert_eq!(
        err,
        ConsolidationError::MissingColumn {
            category: "Defending".to_string(),
            column: "Player".to_string(),
        }
    );
}

#[test]
fn duplicate_rows_keep_the_first() {
    let mut workbook = fixture_workbook();
    let mut attacking = workbook.category(Category::Attacking).unwrap().clone();
    let mut dup = attacking.rows[0].clone();
    dup[3] = "9.99".to_string();
    attacking.rows.push(dup);
    workbook.insert(attacking);

    let out = consolidate_workbook(&workbook, &ConsolidationConfig::default()).unwrap();
    assert_eq!(out.table.len(), 6);
    assert!(out.report.warnings.contains(&ConsolidationWarning::DuplicatePlayer {
        category: "Attacking".to_string(),
        player: "Ana".to_string(),
    }));
    let goals = out.report.column_stats.iter().find(|s| s.feature == "Goals").unwrap();
    assert!((goals.mean - (0.60 + 0.20 + 0.45 + 0.05) / 6.0).abs() < 1e-9);
}

#[test]
fn repeated_header_keeps_both_columns_selectable() {
    let mut workbook = fixture_workbook();
    let mut attacking = workbook.category(Category::Attacking).unwrap().clone();
    attacking.headers.push("Goals".to_string());
    for (row, extra) in attacking.rows.iter_mut().zip(["0.1", "0.9", "0.4", "0.2"]) {
        row.push(extra.to_string());
    }
    workbook.insert(attacking);

    let out = consolidate_workbook(&workbook, &ConsolidationConfig::default()).unwrap();
    let names = out.table.feature_names();
    assert_eq!(names.len(), 10);
    assert_eq!(&names[..3], ["Goals", "Shots", "Goals.1"]);
    assert_ne!(
        out.table.column("Goals").unwrap().to_vec(),
        out.table.column("Goals.1").unwrap().to_vec()
    );

    let query = SimilarityQuery::all_features(&out.table, "Ana").with_neighbors(2);
    let result = find_similar(&out.table, &query).unwrap();
    assert_eq!(result.features, names.to_vec());
}

#[test]
fn custom_keywords_change_the_feature_set() {
    let config = ConsolidationConfig {
        excluded_keywords: vec!["team".to_string(), "height".to_string()],
        ..ConsolidationConfig::default()
    };
    let out = consolidate_workbook(&fixture_workbook(), &config).unwrap();
    assert!(out.table.feature_index("Age").is_some());
    assert!(out.table.feature_index("Average rating").is_some());
    assert!(out.table.feature_index("Height").is_none());
}

#[test]
fn synthetic_workbook_consolidates() {
    let workbook = synthetic_workbook(40, 11);
    let out = consolidate_workbook(&workbook, &ConsolidationConfig::default()).unwrap();
    assert_eq!(out.table.len(), 40);
    assert_eq!(out.report.features, 16);
    assert!(
        out.table
            .identities()
            .iter()
            .all(|id| id.position.is_some() && id.minutes_played.is_some())
    );
    assert!(out.table.values().iter().all(|v| v.is_finite()));
}
