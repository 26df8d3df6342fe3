use std::collections::BTreeMap;

use prismatic_core::{
    AccumulatorConfig, CellCoord, Channel, ColorMask, DelayConfig, Difficulty, Direction,
    GateConfig, GridSize, InvalidDirection, InventoryItem, Level, LevelRules, LogicConfig,
    LogicMode, Piece, PieceKind, PieceType, Placement, SequenceRule, SyncRule,
    DEFAULT_RECEIVER_THRESHOLD, DEFAULT_SOURCE_COLOR, DEFAULT_SOURCE_INTENSITY,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only grid mode levels may use.
pub const GRID_MODE: &str = "D8";

/// Level definition as stored on disk and inside share strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelFile {
    /// Catalog identifier.
    #[serde(default)]
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Catalog bucket.
    #[serde(default = "custom_difficulty")]
    pub difficulty: Difficulty,
    /// Optional subtitle shown under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Optional objective text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    /// Optional hint text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Optional designer commentary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer_note: Option<String>,
    /// Cells placements must use, when restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_pads: Option<Vec<CellCoord>>,
    /// Impassable cells that also forbid placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_cells: Option<Vec<CellCoord>>,
    /// Cells placements may use, when restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_area: Option<Vec<CellCoord>>,
    /// Cap on the total number of placements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pieces: Option<u32>,
    /// Cap on placements per type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_place_by_type: Option<BTreeMap<PieceType, u32>>,
    /// Grid dimensions.
    pub grid: GridRecord,
    /// Grid mode, always [`GRID_MODE`] for playable levels.
    #[serde(default)]
    pub mode: String,
    /// Level-authored pieces.
    #[serde(default)]
    pub fixed: Vec<PieceRecord>,
    /// Impassable cells.
    #[serde(default)]
    pub walls: Vec<CellCoord>,
    /// Pieces granted to the player.
    #[serde(default)]
    pub inventory: Vec<InventoryRecord>,
    /// Victory rules and budgets. Missing rules use the defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RulesRecord>,
}

fn custom_difficulty() -> Difficulty {
    Difficulty::Custom
}

/// Grid dimensions as written in level files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRecord {
    /// Columns.
    pub w: u32,
    /// Rows.
    pub h: u32,
}

/// Inventory entry as written in level files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Type granted.
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    /// Pieces granted.
    pub count: u32,
}

/// Ordering rule as written in level files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRecord {
    /// Receivers in the order they must light.
    pub order: Vec<Channel>,
    /// Largest allowed gap between consecutive receivers.
    pub max_gap: u32,
}

/// Rules block as written in level files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesRecord {
    /// Forbids off-channel energy at receivers.
    #[serde(default)]
    pub purity: bool,
    /// Enables the synchrony rule.
    #[serde(default)]
    pub sync: bool,
    /// Synchrony window in ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_window: Option<u32>,
    /// Receivers compared by the synchrony rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_targets: Option<Vec<Channel>>,
    /// Ordering rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SequenceRecord>,
    /// Mirror reflections allowed per run.
    #[serde(default = "default_max_bounces")]
    pub max_bounces: u32,
    /// Ticks a run may take.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
}

fn default_max_bounces() -> u32 {
    LevelRules::DEFAULT_MAX_BOUNCES
}

fn default_max_ticks() -> u32 {
    LevelRules::DEFAULT_MAX_TICKS
}

impl Default for RulesRecord {
    fn default() -> Self {
        Self {
            purity: false,
            sync: false,
            sync_window: None,
            sync_targets: None,
            sequence: None,
            max_bounces: default_max_bounces(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl RulesRecord {
    /// Converts the record into engine rules, filling sync defaults.
    #[must_use]
    pub fn to_rules(&self) -> LevelRules {
        let sync = self.sync.then(|| {
            let defaults = SyncRule::default();
            SyncRule {
                window: self.sync_window.unwrap_or(defaults.window),
                targets: self.sync_targets.clone().unwrap_or(defaults.targets),
            }
        });
        LevelRules {
            purity: self.purity,
            sync,
            sequence: self.sequence.as_ref().map(|sequence| SequenceRule {
                order: sequence.order.clone(),
                max_gap: sequence.max_gap,
            }),
            max_bounces: self.max_bounces,
            max_ticks: self.max_ticks,
        }
    }
}

/// Flat piece or placement record with every optional configuration field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRecord {
    /// Identifier. Fixed pieces without one receive a generated id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Type tag.
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Facing, `0..=7`.
    pub dir: u8,
    /// Source color mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u8>,
    /// Source intensity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u32>,
    /// Receiver threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    /// Editor lock flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Marks level-authored pieces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<bool>,
    /// Delay latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ticks: Option<u32>,
    /// Gate open phase length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_open_ticks: Option<u32>,
    /// Gate closed phase length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_close_ticks: Option<u32>,
    /// Mixer distinct-heading requirement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixer_require_distinct: Option<bool>,
    /// Logic gate mode, `AND`, `XOR` or `NOT`. Anything else reads as `AND`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_mode: Option<String>,
    /// Logic gate output color mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_output_color: Option<u8>,
    /// Accumulator charging color mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_target_color: Option<u8>,
    /// Accumulator charge ticks needed to arm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_threshold_ticks: Option<u32>,
    /// Accumulator pulses per train.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_pulse_ticks: Option<u32>,
    /// Accumulator pulse color mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_output_color: Option<u8>,
    /// Accumulator pulse intensity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_output_intensity: Option<u32>,
}

impl PieceRecord {
    /// Record for a piece of `piece_type` at `(x, y)` facing `dir`.
    #[must_use]
    pub fn new(piece_type: PieceType, x: i32, y: i32, dir: u8) -> Self {
        Self {
            id: None,
            piece_type,
            x,
            y,
            dir,
            color: None,
            intensity: None,
            threshold: None,
            locked: None,
            fixed: None,
            delay_ticks: None,
            gate_open_ticks: None,
            gate_close_ticks: None,
            mixer_require_distinct: None,
            logic_mode: None,
            logic_output_color: None,
            accumulator_target_color: None,
            accumulator_threshold_ticks: None,
            accumulator_pulse_ticks: None,
            accumulator_output_color: None,
            accumulator_output_intensity: None,
        }
    }

    /// Converts the record into a piece on `grid`, normalizing configuration.
    pub fn to_piece(&self, grid: GridSize) -> Result<Piece, FormatError> {
        let facing = Direction::try_from(self.dir).map_err(|source| FormatError::Direction {
            piece: self.label(),
            source,
        })?;
        let cell = CellCoord::new(self.x, self.y);
        if !grid.contains(cell) {
            return Err(FormatError::OutOfGrid {
                piece: self.label(),
                x: self.x,
                y: self.y,
            });
        }
        Ok(Piece::new(cell, facing, self.kind()))
    }

    fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.piece_type.label().to_owned())
    }

    fn kind(&self) -> PieceKind {
        let mask = |bits: Option<u8>| bits.map(ColorMask::from_bits);
        match self.piece_type {
            PieceType::Source => PieceKind::Source {
                color: mask(self.color).unwrap_or(DEFAULT_SOURCE_COLOR),
                intensity: self.intensity.unwrap_or(DEFAULT_SOURCE_INTENSITY),
            },
            PieceType::Mixer => PieceKind::Mixer {
                require_distinct_directions: self.mixer_require_distinct.unwrap_or(false),
            },
            PieceType::Delay => PieceKind::Delay(DelayConfig::new(self.delay_ticks.unwrap_or(1))),
            PieceType::Gate => PieceKind::Gate(GateConfig::new(
                self.gate_open_ticks.unwrap_or(1),
                self.gate_close_ticks.unwrap_or(1),
            )),
            PieceType::LogicGate => PieceKind::LogicGate(LogicConfig::new(
                parse_logic_mode(self.logic_mode.as_deref()),
                mask(self.logic_output_color).unwrap_or(ColorMask::WHITE),
            )),
            PieceType::Accumulator => {
                let mut config = AccumulatorConfig::default();
                if let Some(color) = mask(self.accumulator_target_color) {
                    config = config.with_target_color(color);
                }
                if let Some(ticks) = self.accumulator_threshold_ticks {
                    config = config.with_threshold_ticks(ticks);
                }
                if let Some(ticks) = self.accumulator_pulse_ticks {
                    config = config.with_pulse_ticks(ticks);
                }
                if let Some(color) = mask(self.accumulator_output_color) {
                    config = config.with_output_color(color);
                }
                if let Some(intensity) = self.accumulator_output_intensity {
                    config = config.with_output_intensity(intensity);
                }
                PieceKind::Accumulator(config)
            }
            PieceType::RecvR | PieceType::RecvG | PieceType::RecvB => {
                match PieceKind::default_for(self.piece_type) {
                    PieceKind::Receiver { channel, .. } => PieceKind::Receiver {
                        channel,
                        threshold: self.threshold.unwrap_or(DEFAULT_RECEIVER_THRESHOLD),
                    },
                    other => other,
                }
            }
            other => PieceKind::default_for(other),
        }
    }
}

fn parse_logic_mode(mode: Option<&str>) -> LogicMode {
    match mode {
        Some("XOR") => LogicMode::Xor,
        Some("NOT") => LogicMode::Not,
        _ => LogicMode::And,
    }
}

/// Errors raised while turning file records into engine values.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The level uses a grid mode other than [`GRID_MODE`].
    #[error("grid mode '{0}' is not supported, expected D8")]
    UnsupportedMode(String),
    /// A piece faces outside the eight headings.
    #[error("piece {piece}: {source}")]
    Direction {
        /// Identifier or type of the piece.
        piece: String,
        /// Underlying direction error.
        #[source]
        source: InvalidDirection,
    },
    /// A piece lies off the grid.
    #[error("piece {piece}: cell ({x}, {y}) is outside the grid")]
    OutOfGrid {
        /// Identifier or type of the piece.
        piece: String,
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
    /// The document is not valid JSON for the expected shape.
    #[error("invalid level JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl LevelFile {
    /// Parses a level document. A leading byte order mark is ignored.
    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(strip_bom(text))?)
    }

    /// Converts the document into an engine level.
    pub fn to_level(&self) -> Result<Level, FormatError> {
        if self.mode != GRID_MODE {
            return Err(FormatError::UnsupportedMode(self.mode.clone()));
        }

        let grid = GridSize::new(self.grid.w, self.grid.h);
        let fixed = self
            .fixed
            .iter()
            .map(|record| record.to_piece(grid))
            .collect::<Result<Vec<_>, _>>()?;

        let mut level = Level::new(self.id.clone(), grid);
        level.title = self.title.clone();
        level.difficulty = self.difficulty;
        level.fixed = fixed;
        level.walls = self.walls.clone();
        level.blocked_cells = self.blocked_cells.clone().unwrap_or_default();
        level.build_pads = self.build_pads.clone();
        level.allowed_area = self.allowed_area.clone();
        level.inventory = self
            .inventory
            .iter()
            .map(|item| InventoryItem {
                piece_type: item.piece_type,
                count: item.count,
            })
            .collect();
        level.max_pieces = self.max_pieces;
        level.max_place_by_type = self.max_place_by_type.clone().unwrap_or_default();
        level.rules = self.rules.clone().unwrap_or_default().to_rules();
        Ok(level)
    }
}

/// Parses a JSON array of placement records for a level on `grid`.
pub fn parse_placements(text: &str, grid: GridSize) -> Result<Vec<Placement>, FormatError> {
    let records: Vec<PieceRecord> = serde_json::from_str(strip_bom(text))?;
    placements_from_records(&records, grid)
}

/// Converts placement records for a level on `grid`.
///
/// Records without an id are numbered `p-{n}` in order.
pub fn placements_from_records(
    records: &[PieceRecord],
    grid: GridSize,
) -> Result<Vec<Placement>, FormatError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let id = record
                .id
                .clone()
                .unwrap_or_else(|| format!("p-{}", index + 1));
            Ok(Placement::new(id, record.to_piece(grid)?))
        })
        .collect()
}

pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}
