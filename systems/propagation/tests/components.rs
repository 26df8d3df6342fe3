mod support;

use prismatic_core::{
    CellCoord, Channel, ColorMask, Direction, LogicMode, PieceKind, Placement, SimEventKind,
    SyncRule,
};
use prismatic_system_propagation::{simulate, SimOptions};
use support::{
    green_from_above, logic_gate, open_level, piece, receiver, red_source, source, timing_level,
};

fn white_source() -> prismatic_core::Piece {
    source(1, 3, Direction::East, ColorMask::WHITE, 300)
}

#[test]
fn prism_fans_channels_around_its_facing() {
    let mut level = open_level(
        "prism",
        vec![
            white_source(),
            piece(3, 3, Direction::East, PieceKind::Prism),
            receiver(5, 5, Channel::Red, 100),
            receiver(5, 3, Channel::Green, 100),
            receiver(5, 1, Channel::Blue, 100),
        ],
    );
    level.rules.purity = true;
    level.rules.sync = Some(SyncRule {
        window: 0,
        targets: Channel::ALL.to_vec(),
    });
    let result = simulate(&level, &[], SimOptions::default());

    for runtime in result.receivers.iter() {
        assert_eq!(runtime.received, 100, "{:?} share", runtime.channel);
        assert_eq!(runtime.first_satisfied_tick, Some(4));
        assert!(!runtime.contaminated);
    }
    assert!(result.victory);
    assert_eq!(result.stats.solve_tick, Some(4));
}

#[test]
fn splitter_duplicates_without_losing_energy() {
    let level = open_level(
        "splitter",
        vec![
            white_source(),
            piece(3, 3, Direction::East, PieceKind::Splitter),
            receiver(5, 3, Channel::Red, 100),
            receiver(3, 1, Channel::Green, 100),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.receivers.red.received, 100);
    assert_eq!(result.receivers.green.received, 100);
    assert_eq!(
        result.stats.leak_count, 2,
        "each receiver rejects the off-channel part once"
    );
}

#[test]
fn filter_keeps_one_channel_and_preserves_purity() {
    let mut level = open_level(
        "filter",
        vec![
            white_source(),
            piece(3, 3, Direction::East, PieceKind::Filter(Channel::Green)),
            receiver(5, 3, Channel::Green, 100),
        ],
    );
    level.rules.purity = true;
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.receivers.green.received, 100);
    assert!(!result.receivers.green.contaminated);
    assert_eq!(result.stats.leak_count, 0);
}

#[test]
fn filter_without_matching_share_emits_nothing() {
    let level = open_level(
        "filter-empty",
        vec![
            source(1, 3, Direction::East, ColorMask::GREEN, 100),
            piece(3, 3, Direction::East, PieceKind::Filter(Channel::Blue)),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.paths.len(), 1, "only the source segment moved");
    assert_eq!(result.stats.leak_count, 0);
}

#[test]
fn purity_marks_mixed_energy_as_contamination() {
    let mut level = timing_level(
        "purity",
        vec![source(1, 3, Direction::East, ColorMask::RED | ColorMask::GREEN, 200)],
    );
    level.rules.purity = true;
    let result = simulate(&level, &[], SimOptions::default());

    assert!(result.receivers.red.lit);
    assert!(result.receivers.red.contaminated);
    assert!(!result.victory);
    assert_eq!(result.stats.solve_tick, None);
}

#[test]
fn mirror_reflects_by_facing_parity() {
    let level = open_level(
        "mirror",
        vec![
            red_source(),
            piece(3, 3, Direction::East, PieceKind::Mirror),
            receiver(3, 1, Channel::Red, 100),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.receivers.red.first_satisfied_tick, Some(4));
    assert_eq!(result.stats.bounce_count, 1);
}

#[test]
fn wall_stops_the_beam_inside_its_cell() {
    let mut level = open_level("wall", vec![red_source()]);
    level.walls.push(CellCoord::new(3, 3));
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.stats.leak_count, 1);
    assert_eq!(result.stats.elapsed_ticks, 2);
    assert_eq!(result.paths.len(), 1);
    assert_eq!(
        result.paths[0].points,
        vec![
            CellCoord::new(1, 3),
            CellCoord::new(2, 3),
            CellCoord::new(3, 3),
        ],
        "the path ends on the wall cell"
    );
}

#[test]
fn blocked_cell_leaks_like_a_wall() {
    let mut level = open_level("blocked", vec![red_source()]);
    level.blocked_cells.push(CellCoord::new(2, 3));
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.stats.leak_count, 1);
    assert_eq!(result.paths[0].points.last(), Some(&CellCoord::new(2, 3)));
}

#[test]
fn exhausted_bounce_budget_absorbs_the_beam() {
    let mut level = open_level(
        "mirror-budget",
        vec![
            red_source(),
            piece(3, 3, Direction::East, PieceKind::Mirror),
            receiver(3, 1, Channel::Red, 100),
        ],
    );
    level.rules.max_bounces = 0;
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.receivers.red.received, 0);
    assert_eq!(result.stats.bounce_count, 0);
    assert_eq!(result.stats.leak_count, 1);
}

#[test]
fn logic_and_fires_on_two_inputs() {
    let level = timing_level(
        "logic-and",
        vec![
            red_source(),
            green_from_above(),
            logic_gate(3, 3, LogicMode::And, ColorMask::RED),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert!(result.victory);
    assert_eq!(result.receivers.red.received, 200);
    let trigger = result
        .events_matching(|kind| matches!(kind, SimEventKind::LogicTrigger { .. }))
        .map(|event| event.kind.clone())
        .next();
    assert_eq!(
        trigger,
        Some(SimEventKind::LogicTrigger {
            color: ColorMask::RED,
            amount: 200,
            mode: LogicMode::And,
        })
    );
}

#[test]
fn logic_xor_rejects_dual_input() {
    let level = timing_level(
        "logic-xor-dual",
        vec![
            red_source(),
            green_from_above(),
            logic_gate(3, 3, LogicMode::Xor, ColorMask::RED),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert!(!result.victory);
    assert_eq!(result.stats.leak_count, 2);
    assert_eq!(
        result
            .events_matching(|kind| matches!(kind, SimEventKind::LogicTrigger { .. }))
            .count(),
        0
    );
}

#[test]
fn logic_xor_fires_on_single_input() {
    let level = timing_level(
        "logic-xor-single",
        vec![red_source(), logic_gate(3, 3, LogicMode::Xor, ColorMask::RED)],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert!(result.victory);
    assert_eq!(result.receivers.red.first_satisfied_tick, Some(4));
}

#[test]
fn logic_not_inverts_merged_input() {
    let level = open_level(
        "logic-not",
        vec![
            source(1, 3, Direction::East, ColorMask::GREEN, 100),
            logic_gate(3, 3, LogicMode::Not, ColorMask::WHITE),
            receiver(5, 3, Channel::Red, 50),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(result.receivers.red.received, 50);
    let trigger = result
        .events_matching(|kind| matches!(kind, SimEventKind::LogicTrigger { .. }))
        .map(|event| event.kind.clone())
        .next();
    assert_eq!(
        trigger,
        Some(SimEventKind::LogicTrigger {
            color: ColorMask::RED | ColorMask::BLUE,
            amount: 100,
            mode: LogicMode::Not,
        })
    );
}

#[test]
fn logic_not_of_white_triggers_without_a_beam() {
    let level = open_level(
        "logic-not-white",
        vec![
            white_source(),
            logic_gate(3, 3, LogicMode::Not, ColorMask::WHITE),
        ],
    );
    let result = simulate(&level, &[], SimOptions::default());

    assert_eq!(
        result
            .events_matching(|kind| matches!(kind, SimEventKind::LogicTrigger { .. }))
            .count(),
        1
    );
    assert_eq!(result.paths.len(), 1, "no output segment is opened");
}

#[test]
fn placements_replace_fixed_pieces_and_placed_sources_stay_dark() {
    let level = timing_level("placements", vec![red_source()]);
    let placements = vec![
        Placement::new(
            "p-1",
            source(1, 5, Direction::East, ColorMask::RED, 100),
        ),
        Placement::new("p-2", piece(5, 3, Direction::East, PieceKind::Prism)),
    ];
    let result = simulate(&level, &placements, SimOptions::default());

    assert_eq!(result.stats.placed_count, 2);
    assert_eq!(result.receivers.red.received, 0, "prism replaced the receiver");
    assert!(result
        .paths
        .iter()
        .all(|path| path.points[0] != CellCoord::new(1, 5)));
}
