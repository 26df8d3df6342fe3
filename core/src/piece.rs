use serde::{Deserialize, Serialize};

use crate::{Channel, ColorMask, Direction};

/// Location of a single grid cell.
///
/// Coordinates are signed so that the cell a beam steps into past the left or
/// top edge is still representable before it is discarded as a leak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Neighbouring cell one step along `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.vector();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Flat type tag of a piece, as written in level files and inventories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceType {
    /// Beam emitter.
    Source,
    /// Two-sided mirror.
    Mirror,
    /// Channel-splitting prism.
    Prism,
    /// Red pass filter.
    FilterR,
    /// Green pass filter.
    FilterG,
    /// Blue pass filter.
    FilterB,
    /// Same-tick beam combiner.
    Mixer,
    /// Lossless two-way fan-out.
    Splitter,
    /// Fixed-latency hold.
    Delay,
    /// Periodically opening shutter.
    Gate,
    /// AND/XOR/NOT trigger.
    LogicGate,
    /// Charge-and-pulse emitter.
    Accumulator,
    /// Red receiver.
    RecvR,
    /// Green receiver.
    RecvG,
    /// Blue receiver.
    RecvB,
}

impl PieceType {
    /// Types a player may place, in toolbar order.
    pub const PLACEABLE: [Self; 11] = [
        Self::Mirror,
        Self::Prism,
        Self::FilterR,
        Self::FilterG,
        Self::FilterB,
        Self::Mixer,
        Self::Splitter,
        Self::Delay,
        Self::Gate,
        Self::LogicGate,
        Self::Accumulator,
    ];

    /// Reports whether players may place pieces of this type.
    #[must_use]
    pub const fn is_placeable(self) -> bool {
        !matches!(
            self,
            Self::Source | Self::RecvR | Self::RecvG | Self::RecvB
        )
    }

    /// Short human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Mirror => "mirror",
            Self::Prism => "prism",
            Self::FilterR => "red filter",
            Self::FilterG => "green filter",
            Self::FilterB => "blue filter",
            Self::Mixer => "mixer",
            Self::Splitter => "splitter",
            Self::Delay => "delay",
            Self::Gate => "gate",
            Self::LogicGate => "logic gate",
            Self::Accumulator => "accumulator",
            Self::RecvR => "red receiver",
            Self::RecvG => "green receiver",
            Self::RecvB => "blue receiver",
        }
    }
}

/// Default color of a source that does not name one.
pub const DEFAULT_SOURCE_COLOR: ColorMask = ColorMask::WHITE;
/// Default intensity of a source that does not name one.
pub const DEFAULT_SOURCE_INTENSITY: u32 = 300;
/// Default energy a receiver needs before it lights.
pub const DEFAULT_RECEIVER_THRESHOLD: u32 = 100;

/// Latency of a delay piece. Only one, two or three ticks are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DelayConfig {
    ticks: u32,
}

impl DelayConfig {
    /// Normalizes a requested latency. Anything other than two or three
    /// becomes one tick.
    #[must_use]
    pub const fn new(ticks: u32) -> Self {
        let ticks = match ticks {
            2 | 3 => ticks,
            _ => 1,
        };
        Self { ticks }
    }

    /// Number of ticks an arriving beam is held.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Open/closed cycle of a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GateConfig {
    open_ticks: u32,
    close_ticks: u32,
}

impl GateConfig {
    const MIN_PHASE: u32 = 1;
    const MAX_PHASE: u32 = 9;

    /// Creates a gate cycle, clamping both phase lengths to `1..=9`.
    #[must_use]
    pub fn new(open_ticks: u32, close_ticks: u32) -> Self {
        Self {
            open_ticks: open_ticks.clamp(Self::MIN_PHASE, Self::MAX_PHASE),
            close_ticks: close_ticks.clamp(Self::MIN_PHASE, Self::MAX_PHASE),
        }
    }

    /// Ticks per cycle during which beams pass.
    #[must_use]
    pub const fn open_ticks(&self) -> u32 {
        self.open_ticks
    }

    /// Ticks per cycle during which beams are blocked.
    #[must_use]
    pub const fn close_ticks(&self) -> u32 {
        self.close_ticks
    }

    /// Reports whether the gate lets beams through on `tick`.
    ///
    /// Tick one opens the first cycle.
    #[must_use]
    pub const fn is_open_at(&self, tick: u32) -> bool {
        let period = self.open_ticks + self.close_ticks;
        let phase = (tick as i64 - 1).rem_euclid(period as i64);
        phase < self.open_ticks as i64
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Trigger rule applied by a logic gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicMode {
    /// Fires when at least two usable beams arrive together.
    #[default]
    And,
    /// Fires when exactly one usable beam arrives.
    Xor,
    /// Fires on any usable arrival and inverts its color.
    Not,
}

impl LogicMode {
    /// Upper-case name used in files and event metadata.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Not => "NOT",
        }
    }
}

/// Configuration of a logic gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct LogicConfig {
    mode: LogicMode,
    output_color: ColorMask,
}

impl LogicConfig {
    /// Creates a logic gate configuration. An empty output color becomes white.
    #[must_use]
    pub const fn new(mode: LogicMode, output_color: ColorMask) -> Self {
        Self {
            mode,
            output_color: output_color.or_if_empty(ColorMask::WHITE),
        }
    }

    /// Trigger rule.
    #[must_use]
    pub const fn mode(&self) -> LogicMode {
        self.mode
    }

    /// Color emitted by AND and XOR triggers.
    #[must_use]
    pub const fn output_color(&self) -> ColorMask {
        self.output_color
    }
}

impl Default for LogicConfig {
    fn default() -> Self {
        Self::new(LogicMode::And, ColorMask::WHITE)
    }
}

/// Configuration of an accumulator.
///
/// Every setter clamps into the supported range, so a value of this type is
/// always safe to simulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AccumulatorConfig {
    target_color: ColorMask,
    threshold_ticks: u32,
    pulse_ticks: u32,
    output_color: ColorMask,
    output_intensity: u32,
}

impl AccumulatorConfig {
    /// Consecutive charge ticks required to arm a pulse train when unspecified.
    pub const DEFAULT_THRESHOLD_TICKS: u32 = 5;
    /// Pulses emitted per train when unspecified.
    pub const DEFAULT_PULSE_TICKS: u32 = 2;
    /// Intensity of each pulse when unspecified.
    pub const DEFAULT_OUTPUT_INTENSITY: u32 = 100;

    /// Colors that charge the accumulator. An empty mask becomes green.
    #[must_use]
    pub const fn with_target_color(mut self, color: ColorMask) -> Self {
        self.target_color = color.or_if_empty(ColorMask::GREEN);
        self
    }

    /// Consecutive charge ticks needed to arm, clamped to `1..=12`.
    #[must_use]
    pub fn with_threshold_ticks(mut self, ticks: u32) -> Self {
        self.threshold_ticks = ticks.clamp(1, 12);
        self
    }

    /// Pulses emitted per train, clamped to `1..=8`.
    #[must_use]
    pub fn with_pulse_ticks(mut self, ticks: u32) -> Self {
        self.pulse_ticks = ticks.clamp(1, 8);
        self
    }

    /// Color of emitted pulses. An empty mask becomes green.
    #[must_use]
    pub const fn with_output_color(mut self, color: ColorMask) -> Self {
        self.output_color = color.or_if_empty(ColorMask::GREEN);
        self
    }

    /// Intensity of emitted pulses, clamped to `1..=600`.
    #[must_use]
    pub fn with_output_intensity(mut self, intensity: u32) -> Self {
        self.output_intensity = intensity.clamp(1, 600);
        self
    }

    /// Colors that charge the accumulator.
    #[must_use]
    pub const fn target_color(&self) -> ColorMask {
        self.target_color
    }

    /// Consecutive charge ticks needed to arm.
    #[must_use]
    pub const fn threshold_ticks(&self) -> u32 {
        self.threshold_ticks
    }

    /// Pulses emitted per train.
    #[must_use]
    pub const fn pulse_ticks(&self) -> u32 {
        self.pulse_ticks
    }

    /// Color of emitted pulses.
    #[must_use]
    pub const fn output_color(&self) -> ColorMask {
        self.output_color
    }

    /// Intensity of emitted pulses.
    #[must_use]
    pub const fn output_intensity(&self) -> u32 {
        self.output_intensity
    }
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            target_color: ColorMask::GREEN,
            threshold_ticks: Self::DEFAULT_THRESHOLD_TICKS,
            pulse_ticks: Self::DEFAULT_PULSE_TICKS,
            output_color: ColorMask::GREEN,
            output_intensity: Self::DEFAULT_OUTPUT_INTENSITY,
        }
    }
}

/// Behaviour of a piece together with the configuration only that behaviour uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PieceKind {
    /// Emits one beam at tick zero.
    Source {
        /// Color of the emitted beam.
        color: ColorMask,
        /// Energy of the emitted beam.
        intensity: u32,
    },
    /// Reflects beams; orientation comes from the facing parity.
    Mirror,
    /// Splits beams into per-channel children fanned around the facing.
    Prism,
    /// Passes only one channel.
    Filter(Channel),
    /// Merges beams that arrive on the same tick.
    Mixer {
        /// Requires the merged beams to come from at least two headings.
        require_distinct_directions: bool,
    },
    /// Duplicates beams along the facing and a quarter turn from it.
    Splitter,
    /// Holds beams for a fixed number of ticks.
    Delay(DelayConfig),
    /// Passes beams only during the open part of its cycle.
    Gate(GateConfig),
    /// Emits on AND/XOR/NOT conditions over same-tick arrivals.
    LogicGate(LogicConfig),
    /// Counts consecutive charged ticks and emits pulse trains.
    Accumulator(AccumulatorConfig),
    /// Collects energy on one channel.
    Receiver {
        /// Channel credited by the receiver.
        channel: Channel,
        /// Energy required before the receiver lights.
        threshold: u32,
    },
}

impl PieceKind {
    /// Default behaviour for a type tag, as used when a piece is first placed.
    #[must_use]
    pub fn default_for(piece_type: PieceType) -> Self {
        match piece_type {
            PieceType::Source => Self::Source {
                color: DEFAULT_SOURCE_COLOR,
                intensity: DEFAULT_SOURCE_INTENSITY,
            },
            PieceType::Mirror => Self::Mirror,
            PieceType::Prism => Self::Prism,
            PieceType::FilterR => Self::Filter(Channel::Red),
            PieceType::FilterG => Self::Filter(Channel::Green),
            PieceType::FilterB => Self::Filter(Channel::Blue),
            PieceType::Mixer => Self::Mixer {
                require_distinct_directions: false,
            },
            PieceType::Splitter => Self::Splitter,
            PieceType::Delay => Self::Delay(DelayConfig::default()),
            PieceType::Gate => Self::Gate(GateConfig::default()),
            PieceType::LogicGate => Self::LogicGate(LogicConfig::default()),
            PieceType::Accumulator => Self::Accumulator(AccumulatorConfig::default()),
            PieceType::RecvR => Self::receiver(Channel::Red),
            PieceType::RecvG => Self::receiver(Channel::Green),
            PieceType::RecvB => Self::receiver(Channel::Blue),
        }
    }

    const fn receiver(channel: Channel) -> Self {
        Self::Receiver {
            channel,
            threshold: DEFAULT_RECEIVER_THRESHOLD,
        }
    }

    /// Flat type tag of the behaviour.
    #[must_use]
    pub const fn piece_type(&self) -> PieceType {
        match self {
            Self::Source { .. } => PieceType::Source,
            Self::Mirror => PieceType::Mirror,
            Self::Prism => PieceType::Prism,
            Self::Filter(Channel::Red) => PieceType::FilterR,
            Self::Filter(Channel::Green) => PieceType::FilterG,
            Self::Filter(Channel::Blue) => PieceType::FilterB,
            Self::Mixer { .. } => PieceType::Mixer,
            Self::Splitter => PieceType::Splitter,
            Self::Delay(_) => PieceType::Delay,
            Self::Gate(_) => PieceType::Gate,
            Self::LogicGate(_) => PieceType::LogicGate,
            Self::Accumulator(_) => PieceType::Accumulator,
            Self::Receiver {
                channel: Channel::Red,
                ..
            } => PieceType::RecvR,
            Self::Receiver {
                channel: Channel::Green,
                ..
            } => PieceType::RecvG,
            Self::Receiver {
                channel: Channel::Blue,
                ..
            } => PieceType::RecvB,
        }
    }
}

/// Component occupying a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Piece {
    /// Cell occupied by the piece.
    pub cell: CellCoord,
    /// Heading the piece faces.
    pub facing: Direction,
    /// Behaviour and its configuration.
    pub kind: PieceKind,
}

impl Piece {
    /// Creates a new piece.
    #[must_use]
    pub const fn new(cell: CellCoord, facing: Direction, kind: PieceKind) -> Self {
        Self { cell, facing, kind }
    }
}

/// Piece supplied by the player for a single run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Placement {
    /// Stable identifier assigned by the editor.
    pub id: String,
    /// Placed piece.
    pub piece: Piece,
}

impl Placement {
    /// Creates a new placement.
    #[must_use]
    pub fn new(id: impl Into<String>, piece: Piece) -> Self {
        Self {
            id: id.into(),
            piece,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_outside_supported_values_becomes_one_tick() {
        assert_eq!(DelayConfig::new(0).ticks(), 1);
        assert_eq!(DelayConfig::new(2).ticks(), 2);
        assert_eq!(DelayConfig::new(3).ticks(), 3);
        assert_eq!(DelayConfig::new(7).ticks(), 1);
    }

    #[test]
    fn gate_phases_are_clamped() {
        let gate = GateConfig::new(0, 40);
        assert_eq!(gate.open_ticks(), 1);
        assert_eq!(gate.close_ticks(), 9);
    }

    #[test]
    fn gate_cycle_starts_open_on_tick_one() {
        let gate = GateConfig::new(2, 1);
        let pattern: Vec<bool> = (1..=6).map(|tick| gate.is_open_at(tick)).collect();
        assert_eq!(pattern, vec![true, true, false, true, true, false]);
        assert!(!gate.is_open_at(0));
    }

    #[test]
    fn accumulator_setters_clamp() {
        let config = AccumulatorConfig::default()
            .with_threshold_ticks(0)
            .with_pulse_ticks(40)
            .with_output_intensity(10_000)
            .with_target_color(ColorMask::NONE)
            .with_output_color(ColorMask::RED);
        assert_eq!(config.threshold_ticks(), 1);
        assert_eq!(config.pulse_ticks(), 8);
        assert_eq!(config.output_intensity(), 600);
        assert_eq!(config.target_color(), ColorMask::GREEN);
        assert_eq!(config.output_color(), ColorMask::RED);
    }

    #[test]
    fn logic_gate_empty_output_becomes_white() {
        let config = LogicConfig::new(LogicMode::Xor, ColorMask::NONE);
        assert_eq!(config.output_color(), ColorMask::WHITE);
    }

    #[test]
    fn default_kinds_report_their_type() {
        for piece_type in PieceType::PLACEABLE {
            assert_eq!(PieceKind::default_for(piece_type).piece_type(), piece_type);
            assert!(piece_type.is_placeable());
        }
        for piece_type in [PieceType::Source, PieceType::RecvR, PieceType::RecvG, PieceType::RecvB] {
            assert_eq!(PieceKind::default_for(piece_type).piece_type(), piece_type);
            assert!(!piece_type.is_placeable());
        }
    }

    #[test]
    fn piece_type_uses_level_file_spelling() {
        let encoded = serde_json::to_string(&PieceType::LogicGate).unwrap_or_default();
        assert_eq!(encoded, "\"LOGIC_GATE\"");
        let decoded: Option<PieceType> = serde_json::from_str("\"RECV_B\"").ok();
        assert_eq!(decoded, Some(PieceType::RecvB));
    }

    #[test]
    fn stepping_follows_heading_vector() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(origin.step(Direction::NorthWest), CellCoord::new(-1, -1));
        assert_eq!(origin.step(Direction::SouthEast), CellCoord::new(1, 1));
    }
}
