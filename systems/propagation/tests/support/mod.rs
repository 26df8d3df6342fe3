#![allow(dead_code)]

use prismatic_core::{
    AccumulatorConfig, CellCoord, Channel, ColorMask, DelayConfig, Direction, GateConfig,
    GridSize, Level, LogicConfig, LogicMode, Piece, PieceKind,
};

pub fn piece(x: i32, y: i32, facing: Direction, kind: PieceKind) -> Piece {
    Piece::new(CellCoord::new(x, y), facing, kind)
}

pub fn source(x: i32, y: i32, facing: Direction, color: ColorMask, intensity: u32) -> Piece {
    piece(x, y, facing, PieceKind::Source { color, intensity })
}

pub fn receiver(x: i32, y: i32, channel: Channel, threshold: u32) -> Piece {
    piece(x, y, Direction::East, PieceKind::Receiver { channel, threshold })
}

pub fn delay(x: i32, y: i32, ticks: u32) -> Piece {
    piece(x, y, Direction::East, PieceKind::Delay(DelayConfig::new(ticks)))
}

pub fn gate(x: i32, y: i32, open: u32, close: u32) -> Piece {
    piece(x, y, Direction::East, PieceKind::Gate(GateConfig::new(open, close)))
}

pub fn mixer(x: i32, y: i32, require_distinct_directions: bool) -> Piece {
    piece(
        x,
        y,
        Direction::East,
        PieceKind::Mixer {
            require_distinct_directions,
        },
    )
}

pub fn logic_gate(x: i32, y: i32, mode: LogicMode, output: ColorMask) -> Piece {
    piece(
        x,
        y,
        Direction::East,
        PieceKind::LogicGate(LogicConfig::new(mode, output)),
    )
}

pub fn accumulator(x: i32, y: i32, config: AccumulatorConfig) -> Piece {
    piece(x, y, Direction::East, PieceKind::Accumulator(config))
}

/// Empty 7x7 level with a 60 tick budget.
pub fn open_level(id: &str, fixed: Vec<Piece>) -> Level {
    let mut level = Level::new(id, GridSize::new(7, 7));
    level.fixed = fixed;
    level.rules.max_ticks = 60;
    level
}

/// 7x7 level whose red receiver sits at (5, 3) and whose green and blue
/// receivers are satisfied without energy.
pub fn timing_level(id: &str, mut fixed: Vec<Piece>) -> Level {
    fixed.extend([
        receiver(5, 3, Channel::Red, 100),
        receiver(0, 0, Channel::Green, 0),
        receiver(6, 0, Channel::Blue, 0),
    ]);
    open_level(id, fixed)
}

pub fn red_source() -> Piece {
    source(1, 3, Direction::East, ColorMask::RED, 100)
}

pub fn green_from_above() -> Piece {
    source(3, 1, Direction::South, ColorMask::GREEN, 100)
}
