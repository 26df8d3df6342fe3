use std::{collections::HashSet, fmt::Write as _};

use prismatic_board::Board;
use prismatic_core::{
    CellCoord, Channel, Level, MirrorKind, Piece, PieceKind, Placement, SimEventKind, SimResult,
    Termination,
};

/// Renders a human-readable report of one run.
pub(crate) fn render(level: &Level, placements: &[Placement], result: &SimResult) -> String {
    let mut out = String::new();
    let verdict = if result.victory { "SOLVED" } else { "unsolved" };
    let _ = writeln!(out, "{} ({}): {verdict}", level.title, level.id);

    let stats = &result.stats;
    let ending = match result.termination {
        Termination::Converged => "converged",
        Termination::TickLimitReached => "tick limit reached",
    };
    let _ = writeln!(
        out,
        "ticks {}/{} ({ending}), placed {}, steps {}, bounces {}, leaks {}",
        stats.elapsed_ticks,
        stats.tick_limit,
        stats.placed_count,
        stats.beam_steps,
        stats.bounce_count,
        stats.leak_count,
    );
    if let Some(tick) = stats.solve_tick {
        let _ = writeln!(out, "solved on tick {tick}");
    }

    out.push('\n');
    for receiver in result.receivers.iter() {
        let first = receiver
            .first_satisfied_tick
            .map_or_else(|| "-".to_owned(), |tick| tick.to_string());
        let _ = writeln!(
            out,
            "{} {:>6}/{:<6} lit={:<5} contaminated={:<5} first={first}",
            receiver.channel.label(),
            receiver.received,
            receiver.threshold,
            receiver.lit,
            receiver.contaminated,
        );
    }

    out.push('\n');
    out.push_str(&render_board(level, placements, result));

    let notable = result
        .events_matching(|kind| !matches!(kind, SimEventKind::ReceiverHit { .. }))
        .count();
    let _ = writeln!(
        out,
        "\n{} events ({} notable)",
        result.events.len(),
        notable
    );
    out
}

/// Draws the grid with pieces, walls and every cell a beam crossed.
pub(crate) fn render_board(level: &Level, placements: &[Placement], result: &SimResult) -> String {
    let board = Board::assemble(level, placements);
    let lit: HashSet<CellCoord> = result
        .paths
        .iter()
        .flat_map(|path| path.points.iter().copied())
        .collect();

    let grid = board.grid();
    let mut out = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = CellCoord::new(cell_index(x), cell_index(y));
            let glyph = match board.piece_at(cell) {
                Some(piece) => glyph(piece),
                None if level.blocked_cells.contains(&cell) => 'x',
                None if !board.is_passable(cell) => '#',
                None if lit.contains(&cell) => '+',
                None => '.',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn cell_index(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn glyph(piece: &Piece) -> char {
    match piece.kind {
        PieceKind::Source { .. } => 'S',
        PieceKind::Mirror => match MirrorKind::from_facing(piece.facing) {
            MirrorKind::Slash => '/',
            MirrorKind::Backslash => '\\',
        },
        PieceKind::Prism => 'P',
        PieceKind::Filter(channel) => match channel {
            Channel::Red => 'r',
            Channel::Green => 'g',
            Channel::Blue => 'b',
        },
        PieceKind::Mixer { .. } => 'M',
        PieceKind::Splitter => 'T',
        PieceKind::Delay(_) => 'D',
        PieceKind::Gate(_) => 'H',
        PieceKind::LogicGate(_) => 'L',
        PieceKind::Accumulator(_) => 'A',
        PieceKind::Receiver { channel, .. } => match channel {
            Channel::Red => 'R',
            Channel::Green => 'G',
            Channel::Blue => 'B',
        },
    }
}
