use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Channel, Piece, PieceKind, PieceType, DEFAULT_RECEIVER_THRESHOLD};

/// Dimensions of a level grid measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    /// Creates a new grid size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies on the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let inside = |value: i32, bound: u32| u32::try_from(value).is_ok_and(|v| v < bound);
        inside(cell.x(), self.width) && inside(cell.y(), self.height)
    }
}

/// Difficulty bucket used to order a level catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Introductory levels.
    Tutorial,
    /// Single-mechanic levels.
    Basic,
    /// Levels combining mechanics.
    Intermediate,
    /// Timing-heavy levels.
    Advanced,
    /// Player-authored levels.
    Custom,
}

/// Bound on how far apart receivers may light.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncRule {
    /// Largest allowed spread between the earliest and latest first-satisfied tick.
    pub window: u32,
    /// Receivers whose first-satisfied ticks are compared.
    pub targets: Vec<Channel>,
}

impl SyncRule {
    /// Window applied when a level enables sync without naming one.
    pub const DEFAULT_WINDOW: u32 = 2;
}

impl Default for SyncRule {
    fn default() -> Self {
        Self {
            window: Self::DEFAULT_WINDOW,
            targets: Channel::ALL.to_vec(),
        }
    }
}

/// Required order in which receivers light.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceRule {
    /// Receivers in the order they must be satisfied.
    pub order: Vec<Channel>,
    /// Largest allowed gap in ticks between consecutive satisfactions.
    pub max_gap: u32,
}

/// Victory rules and per-run budgets of a level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelRules {
    /// Forbids receivers from ever seeing off-channel energy.
    pub purity: bool,
    /// Optional synchrony constraint.
    pub sync: Option<SyncRule>,
    /// Optional ordering constraint.
    pub sequence: Option<SequenceRule>,
    /// Mirror reflections allowed per run.
    pub max_bounces: u32,
    /// Ticks a run may take.
    pub max_ticks: u32,
}

impl LevelRules {
    /// Bounce budget of levels that do not name one.
    pub const DEFAULT_MAX_BOUNCES: u32 = 64;
    /// Tick budget of levels that do not name one.
    pub const DEFAULT_MAX_TICKS: u32 = 240;
}

impl Default for LevelRules {
    fn default() -> Self {
        Self {
            purity: false,
            sync: None,
            sequence: None,
            max_bounces: Self::DEFAULT_MAX_BOUNCES,
            max_ticks: Self::DEFAULT_MAX_TICKS,
        }
    }
}

/// Number of pieces of one type the player may place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Type of piece granted.
    pub piece_type: PieceType,
    /// Number of pieces granted.
    pub count: u32,
}

/// Immutable level definition handed to the engine for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    /// Catalog identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Catalog bucket.
    pub difficulty: Difficulty,
    /// Grid dimensions.
    pub grid: GridSize,
    /// Level-authored pieces.
    pub fixed: Vec<Piece>,
    /// Impassable cells.
    pub walls: Vec<CellCoord>,
    /// Additional impassable cells that also forbid placement.
    pub blocked_cells: Vec<CellCoord>,
    /// Cells placements must use, when restricted.
    pub build_pads: Option<Vec<CellCoord>>,
    /// Cells placements may use, when restricted.
    pub allowed_area: Option<Vec<CellCoord>>,
    /// Pieces granted to the player.
    pub inventory: Vec<InventoryItem>,
    /// Cap on the total number of placements.
    pub max_pieces: Option<u32>,
    /// Cap on placements per type.
    pub max_place_by_type: BTreeMap<PieceType, u32>,
    /// Victory rules and budgets.
    pub rules: LevelRules,
}

impl Level {
    /// Creates an empty level with default rules.
    #[must_use]
    pub fn new(id: impl Into<String>, grid: GridSize) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            difficulty: Difficulty::Custom,
            grid,
            fixed: Vec::new(),
            walls: Vec::new(),
            blocked_cells: Vec::new(),
            build_pads: None,
            allowed_area: None,
            inventory: Vec::new(),
            max_pieces: None,
            max_place_by_type: BTreeMap::new(),
            rules: LevelRules::default(),
        }
    }

    /// Threshold of the receiver keyed on `channel`.
    ///
    /// The last fixed receiver for the channel wins; channels without a fixed
    /// receiver use [`DEFAULT_RECEIVER_THRESHOLD`].
    #[must_use]
    pub fn receiver_threshold(&self, channel: Channel) -> u32 {
        self.fixed
            .iter()
            .filter_map(|piece| match piece.kind {
                PieceKind::Receiver {
                    channel: receiver,
                    threshold,
                } if receiver == channel => Some(threshold),
                _ => None,
            })
            .last()
            .unwrap_or(DEFAULT_RECEIVER_THRESHOLD)
    }

    /// Walls followed by blocked cells.
    pub fn impassable_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.walls.iter().chain(self.blocked_cells.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    #[test]
    fn grid_contains_rejects_negative_and_overflowing_cells() {
        let grid = GridSize::new(4, 3);
        assert!(grid.contains(CellCoord::new(0, 0)));
        assert!(grid.contains(CellCoord::new(3, 2)));
        assert!(!grid.contains(CellCoord::new(-1, 0)));
        assert!(!grid.contains(CellCoord::new(4, 0)));
        assert!(!grid.contains(CellCoord::new(0, 3)));
    }

    #[test]
    fn receiver_threshold_falls_back_to_default() {
        let mut level = Level::new("thresholds", GridSize::new(5, 5));
        level.fixed.push(Piece::new(
            CellCoord::new(4, 4),
            Direction::East,
            PieceKind::Receiver {
                channel: Channel::Blue,
                threshold: 40,
            },
        ));

        assert_eq!(level.receiver_threshold(Channel::Blue), 40);
        assert_eq!(level.receiver_threshold(Channel::Red), DEFAULT_RECEIVER_THRESHOLD);
    }

    #[test]
    fn difficulty_orders_catalog_buckets() {
        assert!(Difficulty::Tutorial < Difficulty::Basic);
        assert!(Difficulty::Advanced < Difficulty::Custom);
    }
}
