//! Full diff flow over two live daemons: fetch, align, classify.

use serde_json::{json, Map};

use core_diff::{
    build_draw_records, diff_draws, diff_stats, query_both, DiffSession, DiffStatus, PassRow,
};
use core_replay::fixture::FixtureReplay;
use core_replay::{Action, ActionFlags, PipeSnapshot};

fn marker_draw(eid: u64, marker: &str, indices: u64) -> Action {
    Action {
        eid: eid - 1,
        flags: ActionFlags::SET_MARKER,
        name: marker.into(),
        children: vec![Action {
            eid,
            flags: ActionFlags::DRAWCALL | ActionFlags::INDEXED,
            name: "vkCmdDrawIndexed".into(),
            num_indices: indices,
            num_instances: 1,
            ..Action::default()
        }],
        ..Action::default()
    }
}

fn pass(begin: u64, end: u64, name: &str, draws: Vec<Action>) -> Vec<Action> {
    vec![
        Action {
            eid: begin,
            flags: ActionFlags::BEGIN_PASS | ActionFlags::PASS_BOUNDARY,
            name: name.into(),
            children: draws,
            ..Action::default()
        },
        Action {
            eid: end,
            flags: ActionFlags::END_PASS | ActionFlags::PASS_BOUNDARY,
            name: "EndPass".into(),
            ..Action::default()
        },
    ]
}

fn capture_a() -> FixtureReplay {
    let actions = pass(
        1,
        9,
        "GBuffer",
        vec![
            marker_draw(3, "GBuffer/Floor", 300),
            marker_draw(5, "GBuffer/Wall", 600),
        ],
    );
    FixtureReplay::builder()
        .actions(actions)
        .default_snapshot(PipeSnapshot::default())
        .build()
}

fn capture_b() -> FixtureReplay {
    let mut actions = pass(
        1,
        9,
        "GBuffer",
        vec![
            marker_draw(3, "GBuffer/Floor", 300),
            marker_draw(5, "GBuffer/Wall", 600),
        ],
    );
    actions.extend(pass(20, 29, "Lighting", vec![marker_draw(23, "Lighting/Sun", 900)]));
    FixtureReplay::builder()
        .actions(actions)
        .default_snapshot(PipeSnapshot::default())
        .build()
}

#[test]
fn aligned_draw_diff_across_live_daemons() {
    let session = DiffSession::launch(
        Box::new(capture_a()),
        "a.rdc",
        Box::new(capture_b()),
        "b.rdc",
    )
    .unwrap();

    let (ra, rb, err) = query_both(&session.ctx, "draws", &Map::new());
    assert!(err.is_none(), "{err:?}");
    let rows_a = ra.unwrap()["draws"].as_array().unwrap().clone();
    let rows_b = rb.unwrap()["draws"].as_array().unwrap().clone();
    assert_eq!(rows_a.len(), 2);
    assert_eq!(rows_b.len(), 3);

    let records_a = build_draw_records(&rows_a);
    let records_b = build_draw_records(&rows_b);
    let diff = diff_draws(&records_a, &records_b);

    let equal = diff.iter().filter(|r| r.status == DiffStatus::Equal).count();
    let added = diff.iter().filter(|r| r.status == DiffStatus::Added).count();
    assert_eq!(equal, 2);
    assert_eq!(added, 1);
    assert!(diff.iter().all(|r| r.confidence == "high"));

    let any_differences = diff.iter().any(|r| r.status != DiffStatus::Equal);
    assert_eq!(core_diff::exit_code(false, any_differences), 1);

    session.stop();
}

#[test]
fn stats_diff_across_live_daemons() {
    let session = DiffSession::launch(
        Box::new(capture_a()),
        "a.rdc",
        Box::new(capture_b()),
        "b.rdc",
    )
    .unwrap();

    let (ra, rb, err) = query_both(&session.ctx, "stats", &Map::new());
    assert!(err.is_none());
    let parse = |v: serde_json::Value| -> Vec<PassRow> {
        v["per_pass"]
            .as_array()
            .unwrap()
            .iter()
            .map(PassRow::from_json)
            .collect()
    };
    let rows = diff_stats(&parse(ra.unwrap()), &parse(rb.unwrap()));
    assert_eq!(rows.len(), 2);
    let by_name = |n: &str| rows.iter().find(|r| r.name == n).unwrap();
    assert_eq!(by_name("GBuffer").status, DiffStatus::Equal);
    assert_eq!(by_name("Lighting").status, DiffStatus::Added);

    session.stop();
}

#[test]
fn tokens_are_independent_per_side() {
    let session = DiffSession::launch(
        Box::new(capture_a()),
        "a.rdc",
        Box::new(capture_b()),
        "b.rdc",
    )
    .unwrap();
    assert_ne!(session.ctx.token_a, session.ctx.token_b);
    assert_ne!(session.ctx.port_a, session.ctx.port_b);
    assert_eq!(session.ctx.session_id.len(), 12);
    session.stop();
}
