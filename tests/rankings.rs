use std::fs;
use std::path::PathBuf;

use cup8_sim::config::Config;
use cup8_sim::rankings::{
    RankProvider, RankTable, WORST_RANK, load_rankings, load_rankings_file, parse_rankings_json,
};
use cup8_sim::team::{MIN_STRENGTH, Team};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn rankings_file_parses_and_skips_unranked_rows() {
    let entries = load_rankings_file(&fixture_path("rankings.json")).expect("fixture should load");
    assert_eq!(entries.len(), 7);
    assert!(entries.iter().all(|e| e.rank > 0));
    let iceland = entries
        .iter()
        .find(|e| e.country == "iceland")
        .expect("iceland row");
    assert_eq!(iceland.points, 0.0);
}

#[test]
fn table_merges_aliases_and_keeps_best_rank() {
    let entries = load_rankings_file(&fixture_path("rankings.json")).expect("fixture should load");
    let table = RankTable::new(entries);
    assert_eq!(table.len(), 6);
    assert_eq!(table.lookup("Poland"), 34);
    assert_eq!(table.lookup("  POLSKA "), 34);
    assert_eq!(table.lookup("Iceland"), 73);
    assert_eq!(table.lookup("san marino"), 210);
    assert_eq!(table.lookup("Atlantis"), WORST_RANK);
}

#[test]
fn null_and_blank_payloads_are_empty() {
    assert!(parse_rankings_json("null").expect("null parses").is_empty());
    assert!(parse_rankings_json("  ").expect("blank parses").is_empty());
    assert!(parse_rankings_json("{\"rank\": 1}").is_err());
}

#[test]
fn configured_file_wins_over_builtin() {
    let config = Config {
        rankings_file: Some(fixture_path("rankings.json")),
        ..Config::default()
    };
    let table = load_rankings(&config);
    assert_eq!(table.len(), 6);
    assert_eq!(table.lookup("Iceland"), 73);
}

#[test]
fn broken_sources_fall_back_to_builtin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "not json").expect("write broken file");
    let config = Config {
        rankings_file: Some(broken),
        ..Config::default()
    };
    let table = load_rankings(&config);
    assert_eq!(table.len(), RankTable::builtin().len());
    assert_eq!(table.lookup("Polska"), 34);
}

#[test]
fn unknown_country_gets_weakest_team() {
    let table = RankTable::builtin();
    let team = Team::from_provider("Atlantis", &table);
    assert_eq!(team.fifa_rank, WORST_RANK);
    assert_eq!(team.strength, MIN_STRENGTH);
    assert_eq!(
        team.to_string(),
        format!("Atlantis – 0 pts, 0 goals (FIFA rank: {WORST_RANK})")
    );
}

#[test]
fn unreachable_rankings_url_falls_back_to_builtin() {
    let cache = tempfile::tempdir().expect("tempdir");
    // SAFETY: no other test in this binary reads XDG_CACHE_HOME.
    unsafe {
        std::env::set_var("XDG_CACHE_HOME", cache.path());
    }
    let config = Config {
        rankings_url: Some("http://127.0.0.1:1/rankings.json".to_string()),
        ..Config::default()
    };
    let table = load_rankings(&config);
    assert_eq!(table.len(), RankTable::builtin().len());
    assert_eq!(table.lookup("Polska"), 34);
    assert_eq!(table.lookup("Atlantis"), WORST_RANK);
}
