use std::collections::HashMap;

use prismatic_core::{BeamPath, CellCoord, ColorMask, Direction};

/// Times a single beam state may be seen before further copies are dropped.
pub(crate) const LOOP_VISIT_LIMIT: u32 = 8;

/// Beam in flight during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Beam {
    pub(crate) segment: u32,
    pub(crate) cell: CellCoord,
    pub(crate) direction: Direction,
    pub(crate) color: ColorMask,
    pub(crate) intensity: u32,
}

impl Beam {
    pub(crate) fn advanced(self) -> Self {
        Self {
            cell: self.cell.step(self.direction),
            ..self
        }
    }
}

type VisitKey = (CellCoord, Direction, ColorMask, u32);

/// Counts visits per beam state and refuses states seen too often.
#[derive(Debug, Default)]
pub(crate) struct LoopGuard {
    visits: HashMap<VisitKey, u32>,
}

impl LoopGuard {
    /// Registers the beam, returning `false` once its state exceeds the limit.
    pub(crate) fn admit(&mut self, beam: &Beam) -> bool {
        let count = self
            .visits
            .entry((beam.cell, beam.direction, beam.color, beam.intensity))
            .or_insert(0);
        *count = count.saturating_add(1);
        *count <= LOOP_VISIT_LIMIT
    }
}

/// Path segments in creation order. Segment ids start at one.
#[derive(Debug, Default)]
pub(crate) struct PathLog {
    segments: Vec<BeamPath>,
}

impl PathLog {
    pub(crate) fn open(&mut self, cell: CellCoord, color: ColorMask, intensity: u32) -> u32 {
        let id = u32::try_from(self.segments.len())
            .map_or(u32::MAX, |count| count.saturating_add(1));
        self.segments.push(BeamPath {
            id,
            color,
            intensity,
            points: vec![cell],
        });
        id
    }

    pub(crate) fn extend(&mut self, segment: u32, cell: CellCoord) {
        let Some(path) = segment
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.segments.get_mut(index))
        else {
            return;
        };

        if path.points.last() != Some(&cell) {
            path.points.push(cell);
        }
    }

    /// Segments that moved at least once.
    pub(crate) fn into_paths(self) -> Vec<BeamPath> {
        self.segments
            .into_iter()
            .filter(|path| path.points.len() > 1)
            .collect()
    }
}
