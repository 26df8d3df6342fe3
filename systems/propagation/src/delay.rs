use prismatic_core::{CellCoord, ColorMask, Direction};

/// Beams a single delay piece may hold at once.
pub(crate) const DELAY_QUEUE_CAPACITY: usize = 8;

/// Beam waiting inside a delay piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HeldBeam {
    pub(crate) cell: CellCoord,
    pub(crate) direction: Direction,
    pub(crate) color: ColorMask,
    pub(crate) intensity: u32,
}

#[derive(Debug)]
struct Queue {
    cell: CellCoord,
    held: Vec<(u32, HeldBeam)>,
}

/// Per-cell delay queues, kept in the order the cells first received a beam.
#[derive(Debug, Default)]
pub(crate) struct DelayLine {
    queues: Vec<Queue>,
}

impl DelayLine {
    /// Queues a beam for release on `release_tick`.
    ///
    /// Returns `false` when the cell's queue is saturated and the beam was not
    /// accepted.
    pub(crate) fn hold(&mut self, beam: HeldBeam, release_tick: u32) -> bool {
        let index = match self.queues.iter().position(|queue| queue.cell == beam.cell) {
            Some(index) => index,
            None => {
                self.queues.push(Queue {
                    cell: beam.cell,
                    held: Vec::new(),
                });
                self.queues.len() - 1
            }
        };

        let Some(queue) = self.queues.get_mut(index) else {
            return false;
        };
        if queue.held.len() >= DELAY_QUEUE_CAPACITY {
            return false;
        }
        queue.held.push((release_tick, beam));
        true
    }

    /// Removes and returns every beam due on `tick`, queue by queue.
    pub(crate) fn release(&mut self, tick: u32) -> Vec<HeldBeam> {
        let mut released = Vec::new();
        self.queues.retain_mut(|queue| {
            queue.held.retain(|(release_tick, beam)| {
                if *release_tick == tick {
                    released.push(*beam);
                    false
                } else {
                    true
                }
            });
            !queue.held.is_empty()
        });
        released
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
