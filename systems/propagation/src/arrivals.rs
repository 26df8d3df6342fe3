use std::collections::HashMap;

use prismatic_core::CellCoord;

use crate::beam::Beam;

/// Beams that landed on the same cell this tick, grouped in order of first arrival.
#[derive(Debug, Default)]
pub(crate) struct ArrivalGroups {
    groups: Vec<(CellCoord, Vec<Beam>)>,
    index: HashMap<CellCoord, usize>,
}

impl ArrivalGroups {
    pub(crate) fn push(&mut self, beam: Beam) {
        if let Some(group) = self
            .index
            .get(&beam.cell)
            .and_then(|slot| self.groups.get_mut(*slot))
        {
            group.1.push(beam);
            return;
        }

        let _ = self.index.insert(beam.cell, self.groups.len());
        self.groups.push((beam.cell, vec![beam]));
    }

    pub(crate) fn into_groups(self) -> impl Iterator<Item = (CellCoord, Vec<Beam>)> {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismatic_core::{ColorMask, Direction};

    fn beam(segment: u32, x: i32) -> Beam {
        Beam {
            segment,
            cell: CellCoord::new(x, 0),
            direction: Direction::East,
            color: ColorMask::WHITE,
            intensity: 1,
        }
    }

    #[test]
    fn groups_follow_first_arrival_order() {
        let mut arrivals = ArrivalGroups::default();
        arrivals.push(beam(1, 4));
        arrivals.push(beam(2, 1));
        arrivals.push(beam(3, 4));

        let groups: Vec<(i32, Vec<u32>)> = arrivals
            .into_groups()
            .map(|(cell, beams)| (cell.x(), beams.iter().map(|b| b.segment).collect()))
            .collect();
        assert_eq!(groups, vec![(4, vec![1, 3]), (1, vec![2])]);
    }
}
