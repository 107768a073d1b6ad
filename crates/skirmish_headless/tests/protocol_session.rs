//! Full JSON-lines sessions against the headless runner.

use std::io::Cursor;

use serde_json::Value;
use skirmish_core::prelude::*;
use skirmish_headless::runner::{HeadlessConfig, HeadlessRunner};
use skirmish_test_utils::fixtures::{place, MatchBuilder, BLUE, RED};

fn session(state: MatchState, config: HeadlessConfig, input: &str) -> Vec<Value> {
    let mut runner = HeadlessRunner::new(state, config);
    let mut output = Vec::new();
    runner.run(Cursor::new(input.as_bytes()), &mut output).unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn kinds(responses: &[Value]) -> Vec<&str> {
    responses.iter().map(|r| r["type"].as_str().unwrap()).collect()
}

#[test]
fn test_session_round_trip() {
    let mut state = MatchBuilder::new().build();
    state.roster_mut().players_mut()[0].developer = true;

    let input = [
        r#"{"cmd":"spawn"}"#,
        r#"{"cmd":"grant","amount":500}"#,
        r#"{"cmd":"select","units":[]}"#,
        "",
        r#"{"cmd":"tick","count":10}"#,
        r#"{"cmd":"hash"}"#,
        r#"{"cmd":"query"}"#,
        r#"{"cmd":"quit"}"#,
        r#"{"cmd":"tick","count":10}"#,
    ]
    .join("\n");
    let responses = session(state, HeadlessConfig::default(), &input);

    assert_eq!(
        kinds(&responses),
        vec!["ready", "events", "ack", "ack", "events", "hash", "state", "bye"]
    );
    assert_eq!(responses[0]["version"], "1.0");
    assert_eq!(responses[0]["seat"], 0);
    assert_eq!(responses[1]["events"]["spawned"].as_array().unwrap().len(), 1);
    assert_eq!(responses[2]["cmd"], "grant");
    assert_eq!(responses[4]["tick"], 10);
    assert_eq!(responses[5]["tick"], 10);
    assert_eq!(responses[6]["hash"], responses[5]["hash"]);

    let view = &responses[6]["view"];
    assert_eq!(view["tick"], 10);
    // 100 - 10 for the unit, then the grant is clamped to the cap
    assert_eq!(view["players"][0]["gold"], 100);
    assert_eq!(view["players"][0]["name"], "Commander");
}

#[test]
fn test_game_over_is_sent_once() {
    let mut state = MatchBuilder::new().build();
    state.roster_mut().players_mut()[0].economy = PlayerEconomy::new(0, 100);
    place(&mut state, RED, 2500, 100, 6);

    let input = [
        r#"{"cmd":"tick","count":5}"#,
        r#"{"cmd":"tick","count":5}"#,
        r#"{"cmd":"spawn"}"#,
    ]
    .join("\n");
    let responses = session(state, HeadlessConfig::default(), &input);

    assert_eq!(kinds(&responses), vec!["ready", "events", "game_over", "events", "error"]);
    // the match ends on the first frame
    assert_eq!(responses[1]["tick"], 1);
    assert_eq!(responses[1]["events"]["outcome"]["winner"], "red");
    assert_eq!(responses[2]["report"]["winner"], "red");
    assert_eq!(responses[3]["tick"], 1);
    assert_eq!(responses[4]["cmd"], "spawn");
}

#[test]
fn test_auto_state_follows_every_tick() {
    let config = HeadlessConfig {
        frame_ms: 100,
        auto_state: true,
    };
    let input = [r#"{"cmd":"tick"}"#, r#"{"cmd":"tick","count":3}"#].join("\n");
    let responses = session(MatchBuilder::new().build(), config, &input);

    assert_eq!(kinds(&responses), vec!["ready", "events", "state", "events", "state"]);
    assert_eq!(responses[4]["view"]["tick"], 4);
}

#[test]
fn test_commands_for_other_seats() {
    let input = [
        r#"{"cmd":"stance","stance":"attack","player":1}"#,
        r#"{"cmd":"spawn","player":7}"#,
        r#"{"cmd":"move","x":500,"y":400}"#,
        r#"{"cmd":"launch"}"#,
    ]
    .join("\n");
    let mut state = MatchBuilder::new().build();
    place(&mut state, BLUE, 300, 300, 20);
    let responses = session(state, HeadlessConfig::default(), &input);

    assert_eq!(kinds(&responses), vec!["ready", "ack", "error", "ack", "error"]);
    assert!(responses[2]["message"].as_str().unwrap().contains("Unknown player"));
    assert!(responses[4]["cmd"].is_null());
}

#[test]
fn test_far_move_stays_inside_the_world() {
    let mut state = MatchBuilder::new().build();
    let unit = place(&mut state, BLUE, 2950, 1000, 10);
    let select = format!(r#"{{"cmd":"select","units":[{}]}}"#, unit.0);
    let input = [
        select.as_str(),
        r#"{"cmd":"move","x":100000,"y":0}"#,
        r#"{"cmd":"tick","count":120}"#,
        r#"{"cmd":"query"}"#,
    ]
    .join("\n");
    let responses = session(state, HeadlessConfig::default(), &input);

    assert_eq!(kinds(&responses), vec!["ready", "ack", "ack", "events", "state"]);
    let x = responses[4]["view"]["units"][0]["x"].as_f64().unwrap();
    assert!(x <= 3000.0, "unit left the world at x = {x}");
}
