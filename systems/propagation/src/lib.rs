#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that propagates light beams across a Prismatic board.
//!
//! [`simulate`] runs one level with one set of placements from tick zero until
//! the board goes idle or the tick limit is reached. Each tick follows a fixed
//! phase order:
//!
//! 1. armed accumulators emit a pulse;
//! 2. active beams advance one cell and group by destination;
//! 3. delay pieces release beams that are due;
//! 4. arrival groups resolve against the piece on their cell.
//!
//! Runs are deterministic: every intermediate collection is iterated in
//! insertion order, so identical inputs yield identical results. A loop guard
//! drops beam states seen too often, which bounds adversarial mirror loops
//! well inside any tick budget. Polling with a growing tick limit replays the
//! same timeline prefix, which hosts use for scrubbing.

mod accumulator;
mod arrivals;
mod beam;
mod delay;
mod run;

use prismatic_board::Board;
use prismatic_core::{Level, Placement, SimResult, SimStats};

use crate::run::Run;

/// Per-call options of [`simulate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimOptions {
    /// Requested tick limit. The level's own tick budget still caps it.
    pub tick_limit: Option<u32>,
}

impl SimOptions {
    /// Options that stop the run after `ticks` ticks.
    #[must_use]
    pub const fn until(ticks: u32) -> Self {
        Self {
            tick_limit: Some(ticks),
        }
    }
}

/// Simulates one level with the provided placements.
///
/// Fixed sources seed beams at tick zero. Placed pieces replace fixed ones on
/// shared cells. The engine never fails: exhausted budgets and saturated
/// queues are counted as leaks and an exhausted tick budget is reported
/// through [`SimResult::termination`].
#[must_use]
pub fn simulate(level: &Level, placements: &[Placement], options: SimOptions) -> SimResult {
    let tick_limit = options
        .tick_limit
        .map_or(level.rules.max_ticks, |requested| {
            requested.min(level.rules.max_ticks)
        });
    let stats = SimStats {
        placed_count: u32::try_from(placements.len()).unwrap_or(u32::MAX),
        tick_limit,
        ..SimStats::default()
    };

    let board = Board::assemble(level, placements);
    let mut run = Run::new(level, board, stats);
    run.seed();
    run.execute()
}
