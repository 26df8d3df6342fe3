#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Prismatic optics puzzle.
//!
//! This crate defines the vocabulary every other crate speaks. Levels and
//! placements are described with [`Level`], [`Piece`] and [`Placement`]; the
//! propagation engine consumes them and answers with a [`SimResult`] made of
//! [`BeamPath`] polylines, [`Receivers`], [`SimEvent`] records and
//! [`SimStats`]. Geometry lives in [`Direction`] and color arithmetic in
//! [`ColorMask`] and [`decompose`].
//!
//! Piece configuration is normalized when a value is constructed, so anything
//! expressible with these types is safe to simulate.

mod color;
mod direction;
mod level;
mod outcome;
mod piece;

pub use color::{decompose, Channel, ChannelShares, ColorMask};
pub use direction::{Direction, InvalidDirection, MirrorKind};
pub use level::{Difficulty, GridSize, InventoryItem, Level, LevelRules, SequenceRule, SyncRule};
pub use outcome::{
    BeamPath, ReceiverRuntime, Receivers, SimEvent, SimEventKind, SimResult, SimStats, Termination,
};
pub use piece::{
    AccumulatorConfig, CellCoord, DelayConfig, GateConfig, LogicConfig, LogicMode, Piece,
    PieceKind, PieceType, Placement, DEFAULT_RECEIVER_THRESHOLD, DEFAULT_SOURCE_COLOR,
    DEFAULT_SOURCE_INTENSITY,
};
