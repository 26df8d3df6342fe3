#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system that keeps the player's placements and checks them
//! against a level's placement limits.

use std::collections::BTreeMap;

use prismatic_board::query;
use prismatic_core::{CellCoord, Direction, Level, Piece, PieceKind, PieceType, Placement};
use thiserror::Error;

/// What [`Builder::place`] did with a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// A placement of the same type already occupied the cell.
    Unchanged,
    /// A placement of another type was swapped for the requested type.
    Replaced,
    /// A new placement was added.
    Added,
}

/// Player placements for one level, with stable identifiers.
#[derive(Clone, Debug)]
pub struct Builder {
    placements: Vec<Placement>,
    next_id: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a builder without placements.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            placements: Vec::new(),
            next_id: 1,
        }
    }

    /// Resumes from existing placements. New identifiers continue after the
    /// highest `p-{n}` identifier already in use.
    #[must_use]
    pub fn with_placements(placements: Vec<Placement>) -> Self {
        let next_id = placements
            .iter()
            .filter_map(|placement| placement.id.strip_prefix("p-")?.parse::<u32>().ok())
            .max()
            .map_or(1, |highest| highest.saturating_add(1));
        Self {
            placements,
            next_id,
        }
    }

    /// Places a piece of `piece_type` on `cell`.
    ///
    /// A placement of the same type is left alone. A placement of another type
    /// keeps its identifier and facing but takes the new type's default
    /// configuration. Otherwise a new placement facing east is appended.
    pub fn place(&mut self, piece_type: PieceType, cell: CellCoord) -> PlaceOutcome {
        let kind = PieceKind::default_for(piece_type);
        if let Some(existing) = self.placement_at_mut(cell) {
            if existing.piece.kind.piece_type() == piece_type {
                return PlaceOutcome::Unchanged;
            }
            existing.piece.kind = kind;
            return PlaceOutcome::Replaced;
        }

        let id = format!("p-{}", self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.placements
            .push(Placement::new(id, Piece::new(cell, Direction::East, kind)));
        PlaceOutcome::Added
    }

    /// Places a piece after checking the cell and the level's limits.
    ///
    /// Placing the type already on the cell always succeeds.
    pub fn try_place(
        &mut self,
        level: &Level,
        piece_type: PieceType,
        cell: CellCoord,
    ) -> Result<PlaceOutcome, PlacementViolation> {
        let id = self
            .placement_at(cell)
            .map_or_else(|| format!("p-{}", self.next_id), |existing| existing.id.clone());

        if let Some(violation) = cell_violation(level, &id, piece_type, cell) {
            return Err(violation);
        }
        if self
            .placement_at(cell)
            .is_some_and(|existing| existing.piece.kind.piece_type() == piece_type)
        {
            return Ok(PlaceOutcome::Unchanged);
        }

        let used = count_of(&self.placements, piece_type);
        if let Some(available) = inventory_limit(level, piece_type) {
            if used >= available {
                return Err(PlacementViolation::InventoryExceeded {
                    piece_type,
                    used: used + 1,
                    available,
                });
            }
        }
        if let Some(cap) = level.max_place_by_type.get(&piece_type).copied() {
            if used >= cap {
                return Err(PlacementViolation::TypeCapExceeded {
                    piece_type,
                    used: used + 1,
                    cap,
                });
            }
        }
        if let Some(cap) = level.max_pieces {
            let total = u32::try_from(self.placements.len()).unwrap_or(u32::MAX);
            if self.placement_at(cell).is_none() && total >= cap {
                return Err(PlacementViolation::TooManyPieces {
                    used: total.saturating_add(1),
                    cap,
                });
            }
        }

        Ok(self.place(piece_type, cell))
    }

    /// Rotates the placement on `cell` by `steps` eighth turns.
    ///
    /// Returns `false` when no placement occupies the cell or the facing did
    /// not change.
    pub fn rotate(&mut self, cell: CellCoord, steps: i32) -> bool {
        let Some(existing) = self.placement_at_mut(cell) else {
            return false;
        };
        let facing = existing.piece.facing.rotate(steps);
        let changed = facing != existing.piece.facing;
        existing.piece.facing = facing;
        changed
    }

    /// Replaces the configuration of the placement on `cell`.
    ///
    /// The new kind must have the same type as the placement. Returns `false`
    /// when nothing changed.
    pub fn configure(&mut self, cell: CellCoord, kind: PieceKind) -> bool {
        let Some(existing) = self.placement_at_mut(cell) else {
            return false;
        };
        if existing.piece.kind.piece_type() != kind.piece_type() || existing.piece.kind == kind {
            return false;
        }
        existing.piece.kind = kind;
        true
    }

    /// Removes the placement on `cell`.
    pub fn remove(&mut self, cell: CellCoord) -> Option<Placement> {
        let index = self
            .placements
            .iter()
            .position(|placement| placement.piece.cell == cell)?;
        Some(self.placements.remove(index))
    }

    /// Placement occupying `cell`, if any.
    #[must_use]
    pub fn placement_at(&self, cell: CellCoord) -> Option<&Placement> {
        self.placements
            .iter()
            .find(|placement| placement.piece.cell == cell)
    }

    fn placement_at_mut(&mut self, cell: CellCoord) -> Option<&mut Placement> {
        self.placements
            .iter_mut()
            .find(|placement| placement.piece.cell == cell)
    }

    /// Placements in the order they were first added.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Consumes the builder, returning its placements.
    #[must_use]
    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }
}

/// Reason a set of placements breaks a level's limits.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlacementViolation {
    /// Sources and receivers are level-authored only.
    #[error("{id}: {} cannot be placed by the player", .piece_type.label())]
    NotPlaceable {
        /// Offending placement.
        id: String,
        /// Type that was placed.
        piece_type: PieceType,
    },
    /// The cell lies off the grid.
    #[error("{id}: cell ({}, {}) is outside the grid", .cell.x(), .cell.y())]
    OutOfBounds {
        /// Offending placement.
        id: String,
        /// Cell used.
        cell: CellCoord,
    },
    /// The cell is a wall or a blocked cell.
    #[error("{id}: cell ({}, {}) is blocked", .cell.x(), .cell.y())]
    Blocked {
        /// Offending placement.
        id: String,
        /// Cell used.
        cell: CellCoord,
    },
    /// A level-authored piece already occupies the cell.
    #[error("{id}: cell ({}, {}) holds a fixed piece", .cell.x(), .cell.y())]
    OccupiedByFixed {
        /// Offending placement.
        id: String,
        /// Cell used.
        cell: CellCoord,
    },
    /// Another placement already occupies the cell.
    #[error("{id}: cell ({}, {}) is already used by {other}", .cell.x(), .cell.y())]
    Overlapping {
        /// Offending placement.
        id: String,
        /// Placement listed earlier on the same cell.
        other: String,
        /// Cell used.
        cell: CellCoord,
    },
    /// The level restricts placements to build pads and the cell is not one.
    #[error("{id}: cell ({}, {}) is not a build pad", .cell.x(), .cell.y())]
    OffBuildPads {
        /// Offending placement.
        id: String,
        /// Cell used.
        cell: CellCoord,
    },
    /// The level restricts placements to an area and the cell is outside it.
    #[error("{id}: cell ({}, {}) is outside the allowed area", .cell.x(), .cell.y())]
    OutsideAllowedArea {
        /// Offending placement.
        id: String,
        /// Cell used.
        cell: CellCoord,
    },
    /// More pieces of a type than the inventory grants.
    #[error("{used} {} placed but the inventory holds {available}", .piece_type.label())]
    InventoryExceeded {
        /// Type counted.
        piece_type: PieceType,
        /// Placements of the type.
        used: u32,
        /// Pieces granted.
        available: u32,
    },
    /// More pieces of a type than the per-type cap allows.
    #[error("{used} {} placed but at most {cap} are allowed", .piece_type.label())]
    TypeCapExceeded {
        /// Type counted.
        piece_type: PieceType,
        /// Placements of the type.
        used: u32,
        /// Cap for the type.
        cap: u32,
    },
    /// More placements than the level allows in total.
    #[error("{used} pieces placed but at most {cap} are allowed")]
    TooManyPieces {
        /// Placements in total.
        used: u32,
        /// Cap on placements.
        cap: u32,
    },
}

/// Reports every way `placements` break the limits of `level`.
///
/// Per-placement violations come first in placement order, followed by the
/// inventory, per-type and total counts.
#[must_use]
pub fn validate(level: &Level, placements: &[Placement]) -> Vec<PlacementViolation> {
    let mut violations = Vec::new();
    let mut seen: BTreeMap<CellCoord, &str> = BTreeMap::new();

    for placement in placements {
        let piece_type = placement.piece.kind.piece_type();
        let cell = placement.piece.cell;
        if let Some(violation) = cell_violation(level, &placement.id, piece_type, cell) {
            violations.push(violation);
        }
        if let Some(other) = seen.get(&cell) {
            violations.push(PlacementViolation::Overlapping {
                id: placement.id.clone(),
                other: (*other).to_owned(),
                cell,
            });
        } else {
            let _ = seen.insert(cell, placement.id.as_str());
        }
    }

    for piece_type in PieceType::PLACEABLE {
        let used = count_of(placements, piece_type);
        if used == 0 {
            continue;
        }
        if let Some(available) = inventory_limit(level, piece_type) {
            if used > available {
                violations.push(PlacementViolation::InventoryExceeded {
                    piece_type,
                    used,
                    available,
                });
            }
        }
        if let Some(cap) = level.max_place_by_type.get(&piece_type).copied() {
            if used > cap {
                violations.push(PlacementViolation::TypeCapExceeded {
                    piece_type,
                    used,
                    cap,
                });
            }
        }
    }

    if let Some(cap) = level.max_pieces {
        let used = u32::try_from(placements.len()).unwrap_or(u32::MAX);
        if used > cap {
            violations.push(PlacementViolation::TooManyPieces { used, cap });
        }
    }

    violations
}

/// Pieces of `piece_type` the inventory grants, or `None` when the level has
/// no inventory and placements are unlimited.
#[must_use]
pub fn inventory_limit(level: &Level, piece_type: PieceType) -> Option<u32> {
    if level.inventory.is_empty() {
        return None;
    }
    Some(
        level
            .inventory
            .iter()
            .find(|item| item.piece_type == piece_type)
            .map_or(0, |item| item.count),
    )
}

fn cell_violation(
    level: &Level,
    id: &str,
    piece_type: PieceType,
    cell: CellCoord,
) -> Option<PlacementViolation> {
    let id = id.to_owned();
    if !piece_type.is_placeable() {
        return Some(PlacementViolation::NotPlaceable { id, piece_type });
    }
    if !level.grid.contains(cell) {
        return Some(PlacementViolation::OutOfBounds { id, cell });
    }
    if query::is_blocked(level, cell) {
        return Some(PlacementViolation::Blocked { id, cell });
    }
    if query::fixed_piece_at(level, cell).is_some() {
        return Some(PlacementViolation::OccupiedByFixed { id, cell });
    }
    if let Some(pads) = &level.build_pads {
        if !pads.contains(&cell) {
            return Some(PlacementViolation::OffBuildPads { id, cell });
        }
    }
    if let Some(area) = &level.allowed_area {
        if !area.contains(&cell) {
            return Some(PlacementViolation::OutsideAllowedArea { id, cell });
        }
    }
    None
}

fn count_of(placements: &[Placement], piece_type: PieceType) -> u32 {
    let count = placements
        .iter()
        .filter(|placement| placement.piece.kind.piece_type() == piece_type)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
