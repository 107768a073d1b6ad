//! Frame loop, commands and boundary integration tests.

use std::time::Duration;

use skirmish_core::prelude::*;
use skirmish_core::session::LobbySlots;
use skirmish_test_utils::fixtures::{place, two_bots, MatchBuilder, RecordingReporter, BLUE, RED};

fn ended_on_first_frame() -> MatchState {
    let mut state = MatchBuilder::new().build();
    state.roster_mut().players_mut()[0].economy = PlayerEconomy::new(0, 100);
    place(&mut state, RED, 2500, 100, 6);
    state
}

#[test]
fn test_reporter_sees_creation_and_end_once() {
    let reporter = RecordingReporter::default();
    let mut sim = SimulationLoop::with_reporter(ended_on_first_frame(), Box::new(reporter.clone()));
    assert_eq!(reporter.recorded().created.len(), 1);
    assert_eq!(reporter.recorded().created[0].seats.len(), 2);

    let handle = sim.start(Duration::ZERO);
    let events = sim.frame(handle, Duration::from_millis(16));
    assert!(events.outcome.is_some());
    for ms in [32, 48, 64] {
        assert!(sim.frame(handle, Duration::from_millis(ms)).is_empty());
    }

    let recorded = reporter.recorded();
    assert_eq!(recorded.finished.len(), 1);
    let report = &recorded.finished[0];
    assert_eq!(report.winner, Team::Red);
    assert_eq!(report.ticks, 1);
    assert_eq!(report.players[1].units_alive, 1);
}

#[test]
fn test_commands_after_end_are_rejected() {
    let mut sim = SimulationLoop::new(ended_on_first_frame());
    sim.step(Fixed::from_num(0.016));
    assert_eq!(
        sim.apply(MatchCommand::Spawn {
            player: BLUE,
            kind: None
        }),
        Err(CommandError::MatchEnded)
    );
    let view = sim.view();
    assert!(view.ended);
    assert_eq!(view.winner, Some(Team::Red));
}

#[test]
fn test_frames_before_start_do_nothing() {
    let mut sim = SimulationLoop::new(MatchBuilder::new().build());
    let handle = sim.start(Duration::from_secs(5));
    sim.stop();
    assert!(!sim.is_running());
    sim.frame(handle, Duration::from_secs(6));
    assert_eq!(sim.state().tick(), 0);
}

#[test]
fn test_first_frame_after_start_has_zero_delta() {
    let mut sim = SimulationLoop::new(MatchBuilder::new().build());
    let handle = sim.start(Duration::from_secs(100));
    sim.frame(handle, Duration::from_secs(100));
    assert_eq!(sim.state().tick(), 1);
    assert_eq!(sim.state().elapsed_ms(), Fixed::ZERO);
}

#[test]
fn test_global_cap_notice() {
    let mut sim = SimulationLoop::new(
        MatchBuilder::new()
            .tune(|c| c.max_total_units = 1)
            .build(),
    );
    sim.apply(MatchCommand::Spawn {
        player: RED,
        kind: None,
    })
    .expect("red spawns");
    let events = sim
        .apply(MatchCommand::Spawn {
            player: BLUE,
            kind: None,
        })
        .expect("refusal is not an error");
    assert_eq!(events.notices.len(), 1);
    assert_eq!(events.notices[0].level, skirmish_core::events::NoticeLevel::Error);
    assert_eq!(sim.view().player(BLUE).map(|p| p.gold), Some(100));
}

#[test]
fn test_view_reports_hud_numbers() {
    let mut sim = SimulationLoop::new(MatchBuilder::new().map("desert_siege").build());
    place(sim.state_mut(), BLUE, 100, 100, 12);
    place(sim.state_mut(), BLUE, 300, 100, 30);
    let view = sim.view();

    assert_eq!(view.map_id.as_deref(), Some("desert_siege"));
    assert_eq!(view.objectives.len(), 3);
    assert_eq!(view.units.len(), 2);
    assert_eq!(view.units[1].x, 300.0);
    assert_eq!(view.strength(Team::Blue), 42);
    let blue = view.player(BLUE).expect("blue in view");
    assert_eq!((blue.alive, blue.created, blue.lost), (2, 2, 0));
    assert!(!blue.bot);
    assert_eq!(view.remaining_ms, 600_000);
}

#[test]
fn test_move_target_outside_world_is_clamped() {
    let mut sim = SimulationLoop::new(MatchBuilder::new().build());
    let unit = place(sim.state_mut(), BLUE, 2900, 100, 10);
    sim.apply(MatchCommand::SelectUnits {
        player: BLUE,
        units: vec![unit],
    })
    .expect("select");
    sim.apply(MatchCommand::MoveSelected {
        player: BLUE,
        target: Vec2Fixed::from_ints(100_000, -40_000),
    })
    .expect("move");

    let handle = sim.start(Duration::ZERO);
    for ms in [16, 32, 48] {
        sim.frame(handle, Duration::from_millis(ms));
    }
    // 141 units of travel at the slowest speed fits in four seconds
    for _ in 0..80 {
        sim.step(Fixed::from_num(0.05));
    }

    let moved = sim.state().roster().unit(unit).expect("unit alive");
    assert_eq!(moved.target, Vec2Fixed::from_ints(3000, 0));
    assert!(moved.has_arrived());
    assert!(moved.position.x <= Fixed::from_num(3000));
}

#[test]
fn test_oversized_match_length_is_capped() {
    let state = MatchBuilder::new().minutes(u32::MAX).build();
    let minutes = u64::from(skirmish_core::config::MAX_MATCH_MINUTES);
    assert_eq!(SimulationLoop::new(state).view().remaining_ms, minutes * 60_000);
}

#[test]
fn test_two_vs_two_teammate_mirrors_human_stance() {
    let setup = MatchSetup {
        mode: MatchMode::TwoVsTwo,
        seed: 3,
        ..MatchSetup::default()
    };
    let session = SessionSnapshot {
        username: Some("Commander".into()),
        ..SessionSnapshot::default()
    };
    let state = MatchState::from_setup(GameplayConfig::default(), &setup, &session, &MapCatalog::builtin())
        .expect("builtin map");
    let mut sim = SimulationLoop::new(state);
    let teammate = sim
        .state()
        .roster()
        .players()
        .iter()
        .find(|p| p.mirror() == Some(PlayerId(0)))
        .map(|p| p.id)
        .expect("2v2 seats a mirroring teammate");

    sim.apply(MatchCommand::SetStance {
        player: PlayerId(0),
        stance: Stance::Attack,
    })
    .expect("human seat");
    // one bot think cycle at medium difficulty
    for _ in 0..70 {
        sim.step(Fixed::from_num(50) / Fixed::from_num(1000));
    }

    let view = sim.view();
    assert_eq!(view.players.len(), 4);
    assert_eq!(view.player(teammate).map(|p| p.stance), Some(Stance::Attack));
}

#[test]
fn test_unknown_map_is_an_error() {
    let setup = MatchSetup {
        map_id: Some("atlantis".into()),
        ..MatchSetup::default()
    };
    let err = MatchState::from_setup(
        GameplayConfig::default(),
        &setup,
        &SessionSnapshot::default(),
        &MapCatalog::builtin(),
    )
    .unwrap_err();
    assert!(matches!(err, GameError::UnknownMap(id) if id == "atlantis"));
}

#[test]
fn test_invalid_config_is_an_error() {
    let config = GameplayConfig {
        passive_income_interval_ms: 0,
        ..GameplayConfig::default()
    };
    let err = MatchState::from_setup(
        config,
        &MatchSetup::default(),
        &SessionSnapshot::default(),
        &MapCatalog::builtin(),
    )
    .unwrap_err();
    assert!(matches!(err, GameError::Config(ConfigError::Invalid { .. })));
}

#[test]
fn test_oversized_config_is_an_error() {
    let config = GameplayConfig {
        world_width: u32::MAX,
        ..GameplayConfig::default()
    };
    let err = MatchState::from_setup(
        config,
        &MatchSetup::default(),
        &SessionSnapshot::default(),
        &MapCatalog::builtin(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        GameError::Config(ConfigError::Invalid {
            field: "world_width",
            ..
        })
    ));
}

#[test]
fn test_lan_lobby_keeps_human_seats_empty_of_bots() {
    let setup = MatchSetup {
        lan: true,
        mode: MatchMode::TwoVsTwo,
        lobby: LobbySlots {
            blue: vec!["Commander".into(), "OPEN".into()],
            red: vec!["guest-2".into(), "BOT RED 2".into()],
        },
        ..MatchSetup::default()
    };
    let session = SessionSnapshot {
        username: Some("Commander".into()),
        ..SessionSnapshot::default()
    };
    let players = setup.build_players(&session, &GameplayConfig::default());
    let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Commander", "BOT RED 2"]);
}

#[test]
fn test_initial_armies_are_free() {
    let state = MatchBuilder::new()
        .tune(|c| c.initial_army_size = 5)
        .map("flat_land")
        .players(two_bots(100, 100))
        .build();
    for player in state.roster().players() {
        assert_eq!(player.units.len(), 5);
        assert_eq!(player.economy.gold, 100);
        assert_eq!(player.stance, Stance::Defense);
    }
}
