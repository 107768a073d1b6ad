//! Batch runs, result files and strategy files.

use skirmish_core::prelude::*;
use skirmish_headless::batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
use skirmish_headless::match_runner::{run_match, MatchConfig};
use skirmish_headless::strategies::Strategy;

fn short_template() -> MatchConfig {
    MatchConfig {
        setup: MatchSetup {
            map_id: Some("flat_land".into()),
            minutes: Some(1),
            difficulty: Difficulty::Hard,
            ..MatchSetup::default()
        },
        ..MatchConfig::default()
    }
}

#[test]
fn test_results_survive_save_and_load() {
    let config = BatchConfig::new(short_template(), 3).with_seed(40);
    let results = run_batch(config.clone(), &MapCatalog::builtin()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("results.json");
    results.save(&path).unwrap();
    assert!(path.exists());

    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.config, config);
    assert_eq!(loaded.games, results.games);
    assert_eq!(loaded.summary.total_games, results.summary.total_games);
    assert_eq!(loaded.summary.blue_wins + loaded.summary.red_wins, 3);
}

#[test]
fn test_batch_matches_single_runs() {
    let results = run_batch(BatchConfig::new(short_template(), 2).with_seed(8), &MapCatalog::builtin()).unwrap();
    for game in &results.games {
        let single = run_match(&short_template().with_seed(game.seed), &MapCatalog::builtin()).unwrap();
        assert_eq!(single.final_state_hash, game.final_state_hash);
        assert_eq!(single.winner, game.winner);
    }
}

#[test]
fn test_loading_garbage_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(BatchResults::load(&path).is_err());
    assert!(BatchResults::load(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_strategy_file_drives_a_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("swarm.ron");
    std::fs::write(
        &path,
        r#"(
            name: "Swarm",
            description: "Spend everything, attack at once",
            build_order: [Unit(None), Unit(None), Unit(None)],
            attack_at_ms: 0,
            regroup_below: 0,
            reserve_gold: 0,
            think_interval_ms: 500,
        )"#,
    )
    .unwrap();

    let strategy = Strategy::load(&path).unwrap();
    assert_eq!(strategy.name, "Swarm");
    let config = MatchConfig {
        strategy,
        max_ticks: 40,
        ..short_template()
    };
    let result = run_match(&config, &MapCatalog::builtin()).unwrap();
    assert_eq!(result.ticks, 40);
    assert!(Strategy::load(dir.path().join("missing.ron")).is_err());
}

#[test]
fn test_ranged_matches_are_deterministic() {
    let mut template = short_template();
    template.setup.combat = CombatPolicy::RangedCooldown;
    template.strategy = Strategy::rush();
    let (hashes, deterministic) = verify_determinism(&template, 77, 3, &MapCatalog::builtin()).unwrap();
    assert!(deterministic, "hashes differ: {hashes:?}");
}
