use prismatic_board::Board;
use prismatic_core::{AccumulatorConfig, CellCoord, Direction, PieceKind};

#[derive(Debug)]
struct Charger {
    cell: CellCoord,
    facing: Direction,
    config: AccumulatorConfig,
    charge: u32,
    pulses_remaining: u32,
    touched: bool,
}

/// Pulse an accumulator emits at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pulse {
    pub(crate) cell: CellCoord,
    pub(crate) facing: Direction,
    pub(crate) config: AccumulatorConfig,
}

/// Charge and pulse counters of every accumulator on the board, in board order.
#[derive(Debug, Default)]
pub(crate) struct AccumulatorBank {
    chargers: Vec<Charger>,
}

impl AccumulatorBank {
    pub(crate) fn from_board(board: &Board) -> Self {
        let chargers = board
            .pieces()
            .filter_map(|piece| match piece.kind {
                PieceKind::Accumulator(config) => Some(Charger {
                    cell: piece.cell,
                    facing: piece.facing,
                    config,
                    charge: 0,
                    pulses_remaining: 0,
                    touched: false,
                }),
                _ => None,
            })
            .collect();
        Self { chargers }
    }

    pub(crate) fn has_pending_pulse(&self) -> bool {
        self.chargers
            .iter()
            .any(|charger| charger.pulses_remaining > 0)
    }

    /// Emits one pulse from every armed accumulator.
    pub(crate) fn emit_pulses(&mut self) -> Vec<Pulse> {
        self.chargers
            .iter_mut()
            .filter(|charger| charger.pulses_remaining > 0)
            .map(|charger| {
                charger.pulses_remaining -= 1;
                Pulse {
                    cell: charger.cell,
                    facing: charger.facing,
                    config: charger.config,
                }
            })
            .collect()
    }

    /// Applies one tick of arrivals to the accumulator on `cell`.
    ///
    /// Returns the charge reached when the arrivals carried the target color.
    pub(crate) fn absorb(&mut self, cell: CellCoord, charged: bool) -> Option<u32> {
        let charger = self
            .chargers
            .iter_mut()
            .find(|charger| charger.cell == cell)?;
        charger.touched = true;

        let reached = if charged {
            charger.charge = charger.charge.saturating_add(1);
            Some(charger.charge)
        } else {
            charger.charge = 0;
            None
        };

        if charger.charge >= charger.config.threshold_ticks() && charger.pulses_remaining == 0 {
            charger.charge = 0;
            charger.pulses_remaining = charger.config.pulse_ticks();
        }

        reached
    }

    /// Breaks the charge streak of accumulators that saw no arrivals this tick
    /// and are not pulsing.
    pub(crate) fn settle_untouched(&mut self) {
        for charger in &mut self.chargers {
            if !charger.touched && charger.pulses_remaining == 0 {
                charger.charge = 0;
            }
            charger.touched = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use prismatic_core::{GridSize, Level, Piece};

    use super::*;

    fn bank(threshold_ticks: u32, pulse_ticks: u32) -> (AccumulatorBank, CellCoord) {
        let cell = CellCoord::new(2, 2);
        let config = AccumulatorConfig::default()
            .with_threshold_ticks(threshold_ticks)
            .with_pulse_ticks(pulse_ticks);
        let mut level = Level::new("accumulator", GridSize::new(5, 5));
        level.fixed = vec![Piece::new(
            cell,
            Direction::East,
            PieceKind::Accumulator(config),
        )];
        let board = Board::assemble(&level, &[]);
        (AccumulatorBank::from_board(&board), cell)
    }

    #[test]
    fn wrong_color_arrival_resets_the_charge() {
        let (mut bank, cell) = bank(3, 1);

        assert_eq!(bank.absorb(cell, true), Some(1));
        bank.settle_untouched();
        assert_eq!(bank.absorb(cell, true), Some(2));
        bank.settle_untouched();
        assert_eq!(bank.absorb(cell, false), None);
        assert_eq!(bank.chargers[0].charge, 0);
        bank.settle_untouched();

        assert_eq!(
            bank.absorb(cell, true),
            Some(1),
            "streak restarts after the reset"
        );
        assert!(!bank.has_pending_pulse());
    }

    #[test]
    fn arrivals_during_a_pulse_train_keep_counting_without_rearming() {
        let (mut bank, cell) = bank(1, 3);
        assert_eq!(bank.absorb(cell, true), Some(1));
        bank.settle_untouched();
        assert!(bank.has_pending_pulse());

        for expected in 1..=2 {
            assert_eq!(bank.emit_pulses().len(), 1);
            assert_eq!(bank.absorb(cell, true), Some(expected));
            bank.settle_untouched();
        }
        assert_eq!(bank.chargers[0].pulses_remaining, 1, "train was not restarted");

        assert_eq!(bank.emit_pulses().len(), 1);
        assert!(!bank.has_pending_pulse());
        assert!(bank.emit_pulses().is_empty());

        assert_eq!(bank.absorb(cell, true), Some(3));
        assert_eq!(bank.chargers[0].charge, 0);
        assert_eq!(bank.chargers[0].pulses_remaining, 3);
    }

    #[test]
    fn untouched_charge_survives_while_pulses_remain() {
        let (mut bank, cell) = bank(1, 3);
        assert_eq!(bank.absorb(cell, true), Some(1));
        bank.settle_untouched();
        assert_eq!(bank.absorb(cell, true), Some(1));
        bank.settle_untouched();

        bank.settle_untouched();
        assert_eq!(bank.chargers[0].charge, 1, "pulsing accumulator keeps its charge");

        for _ in 0..3 {
            let _ = bank.emit_pulses();
        }
        bank.settle_untouched();
        assert_eq!(bank.chargers[0].charge, 0, "idle accumulator loses its charge");
    }
}
