#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable board assembled for a single Prismatic run.
//!
//! A [`Board`] merges the level's fixed pieces with the player's placements,
//! one piece per cell, and answers passability questions for beams. Boards are
//! built at the start of a run and dropped at its end.

use std::collections::{HashMap, HashSet};

use prismatic_core::{CellCoord, GridSize, Level, Piece, Placement};

/// Pieces, walls and bounds seen by the propagation engine.
#[derive(Clone, Debug)]
pub struct Board {
    grid: GridSize,
    pieces: Vec<Piece>,
    slots: HashMap<CellCoord, usize>,
    impassable: HashSet<CellCoord>,
}

impl Board {
    /// Merges fixed pieces and placements into a board.
    ///
    /// Fixed pieces are laid first, then placements in order. A piece landing
    /// on an occupied cell replaces the occupant but keeps its slot, so
    /// iteration order only depends on the first piece laid on each cell.
    #[must_use]
    pub fn assemble(level: &Level, placements: &[Placement]) -> Self {
        let mut board = Self {
            grid: level.grid,
            pieces: Vec::with_capacity(level.fixed.len() + placements.len()),
            slots: HashMap::new(),
            impassable: level.impassable_cells().collect(),
        };

        for piece in &level.fixed {
            board.lay(*piece);
        }
        for placement in placements {
            board.lay(placement.piece);
        }
        board
    }

    fn lay(&mut self, piece: Piece) {
        if let Some(slot) = self
            .slots
            .get(&piece.cell)
            .and_then(|index| self.pieces.get_mut(*index))
        {
            *slot = piece;
            return;
        }

        let _ = self.slots.insert(piece.cell, self.pieces.len());
        self.pieces.push(piece);
    }

    /// Dimensions of the underlying grid.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Piece occupying the cell, if any.
    #[must_use]
    pub fn piece_at(&self, cell: CellCoord) -> Option<&Piece> {
        self.slots
            .get(&cell)
            .and_then(|index| self.pieces.get(*index))
    }

    /// Reports whether a beam may enter the cell.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.grid.contains(cell) && !self.impassable.contains(&cell)
    }

    /// Pieces in board order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }
}

/// Read-only helpers over level definitions shared with placement tooling.
pub mod query {
    use prismatic_core::{CellCoord, Level, Piece};

    /// Reports whether the cell is off the grid, a wall or a blocked cell.
    #[must_use]
    pub fn is_blocked(level: &Level, cell: CellCoord) -> bool {
        !level.grid.contains(cell) || level.impassable_cells().any(|wall| wall == cell)
    }

    /// Fixed piece authored on the cell, if any.
    #[must_use]
    pub fn fixed_piece_at(level: &Level, cell: CellCoord) -> Option<&Piece> {
        level.fixed.iter().find(|piece| piece.cell == cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismatic_core::{Direction, GridSize, PieceKind, PieceType};

    fn piece(x: i32, y: i32, piece_type: PieceType) -> Piece {
        Piece::new(
            CellCoord::new(x, y),
            Direction::East,
            PieceKind::default_for(piece_type),
        )
    }

    fn level() -> Level {
        let mut level = Level::new("board", GridSize::new(6, 4));
        level.fixed.push(piece(0, 1, PieceType::Source));
        level.fixed.push(piece(5, 1, PieceType::RecvR));
        level.walls.push(CellCoord::new(2, 2));
        level.blocked_cells.push(CellCoord::new(3, 3));
        level
    }

    #[test]
    fn placements_fill_free_cells_after_fixed_pieces() {
        let placements = vec![Placement::new("p-1", piece(2, 1, PieceType::Mirror))];
        let board = Board::assemble(&level(), &placements);

        let order: Vec<PieceType> = board.pieces().map(|p| p.kind.piece_type()).collect();
        assert_eq!(order, vec![PieceType::Source, PieceType::RecvR, PieceType::Mirror]);
        assert_eq!(
            board.piece_at(CellCoord::new(2, 1)).map(|p| p.kind.piece_type()),
            Some(PieceType::Mirror)
        );
    }

    #[test]
    fn later_piece_replaces_occupant_in_place() {
        let placements = vec![
            Placement::new("p-1", piece(1, 1, PieceType::Mirror)),
            Placement::new("p-2", piece(2, 1, PieceType::Prism)),
            Placement::new("p-3", piece(1, 1, PieceType::Splitter)),
        ];
        let board = Board::assemble(&level(), &placements);

        let order: Vec<PieceType> = board.pieces().map(|p| p.kind.piece_type()).collect();
        assert_eq!(
            order,
            vec![
                PieceType::Source,
                PieceType::RecvR,
                PieceType::Splitter,
                PieceType::Prism
            ]
        );
    }

    #[test]
    fn walls_blocked_cells_and_edges_are_impassable() {
        let board = Board::assemble(&level(), &[]);
        assert!(board.is_passable(CellCoord::new(1, 1)));
        assert!(!board.is_passable(CellCoord::new(2, 2)));
        assert!(!board.is_passable(CellCoord::new(3, 3)));
        assert!(!board.is_passable(CellCoord::new(-1, 0)));
        assert!(!board.is_passable(CellCoord::new(6, 0)));
    }

    #[test]
    fn query_helpers_match_level_content() {
        let level = level();
        assert!(query::is_blocked(&level, CellCoord::new(3, 3)));
        assert!(query::is_blocked(&level, CellCoord::new(0, 4)));
        assert!(!query::is_blocked(&level, CellCoord::new(0, 0)));
        assert!(query::fixed_piece_at(&level, CellCoord::new(5, 1)).is_some());
        assert!(query::fixed_piece_at(&level, CellCoord::new(4, 1)).is_none());
    }
}
