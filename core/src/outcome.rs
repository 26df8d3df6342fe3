use serde::Serialize;

use crate::{CellCoord, Channel, ColorMask, LogicMode};

/// Polyline travelled by one beam segment, ready for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BeamPath {
    /// Segment identifier, unique within a run and allocated in spawn order.
    pub id: u32,
    /// Color carried along the segment.
    pub color: ColorMask,
    /// Energy carried along the segment.
    pub intensity: u32,
    /// Visited cells, starting at the spawn cell. The last point may lie off
    /// the grid or inside a wall when the segment leaked.
    pub points: Vec<CellCoord>,
}

/// Runtime state of the receiver keyed on one channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ReceiverRuntime {
    /// Channel the receiver credits.
    pub channel: Channel,
    /// Energy required to light.
    pub threshold: u32,
    /// Energy credited so far.
    pub received: u64,
    /// Whether `received` reached `threshold` by the end of the run.
    pub lit: bool,
    /// Whether off-channel energy ever arrived while purity was enforced.
    pub contaminated: bool,
    /// Tick on which `received` first reached `threshold`. Latched once set.
    pub first_satisfied_tick: Option<u32>,
}

impl ReceiverRuntime {
    /// Creates an empty receiver.
    #[must_use]
    pub const fn new(channel: Channel, threshold: u32) -> Self {
        Self {
            channel,
            threshold,
            received: 0,
            lit: false,
            contaminated: false,
            first_satisfied_tick: None,
        }
    }

    /// Credits accepted energy, latching the first tick the threshold is met.
    pub fn credit(&mut self, energy: u32, tick: u32) {
        self.received = self.received.saturating_add(u64::from(energy));
        if self.first_satisfied_tick.is_none() && self.received >= u64::from(self.threshold) {
            self.first_satisfied_tick = Some(tick);
        }
    }

    /// Recomputes the lit flag from the accumulated energy.
    pub fn settle(&mut self) {
        self.lit = self.received >= u64::from(self.threshold);
    }
}

/// The three receivers of a run, one per channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Receivers {
    /// Red receiver.
    #[serde(rename = "R")]
    pub red: ReceiverRuntime,
    /// Green receiver.
    #[serde(rename = "G")]
    pub green: ReceiverRuntime,
    /// Blue receiver.
    #[serde(rename = "B")]
    pub blue: ReceiverRuntime,
}

impl Receivers {
    /// Builds empty receivers using the threshold reported for each channel.
    #[must_use]
    pub fn with_thresholds(mut threshold: impl FnMut(Channel) -> u32) -> Self {
        Self {
            red: ReceiverRuntime::new(Channel::Red, threshold(Channel::Red)),
            green: ReceiverRuntime::new(Channel::Green, threshold(Channel::Green)),
            blue: ReceiverRuntime::new(Channel::Blue, threshold(Channel::Blue)),
        }
    }

    /// Receiver keyed on `channel`.
    #[must_use]
    pub const fn get(&self, channel: Channel) -> &ReceiverRuntime {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Mutable receiver keyed on `channel`.
    pub fn get_mut(&mut self, channel: Channel) -> &mut ReceiverRuntime {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Receivers in red, green, blue order.
    pub fn iter(&self) -> impl Iterator<Item = &ReceiverRuntime> {
        [&self.red, &self.green, &self.blue].into_iter()
    }
}

/// Entry of the chronological event log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SimEvent {
    /// Tick during which the event happened.
    pub tick: u32,
    /// Cell of the piece that produced the event.
    pub cell: CellCoord,
    /// What happened.
    pub kind: SimEventKind,
}

/// Kinds of events recorded while a run resolves arrivals.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEventKind {
    /// A receiver accepted energy.
    ReceiverHit {
        /// Receiver credited.
        receiver: Channel,
        /// Color of the arriving beam.
        color: ColorMask,
        /// Energy accepted.
        amount: u32,
    },
    /// A beam crossed an open gate.
    GatePass {
        /// Color of the beam.
        color: ColorMask,
    },
    /// A beam was stopped by a closed gate.
    GateBlock {
        /// Color of the beam.
        color: ColorMask,
    },
    /// A held beam left a delay piece.
    DelayRelease {
        /// Color of the released beam.
        color: ColorMask,
    },
    /// A mixer merged same-tick arrivals.
    MixerTrigger {
        /// Merged color.
        color: ColorMask,
        /// Merged intensity.
        amount: u32,
    },
    /// A logic gate fired.
    LogicTrigger {
        /// Output color.
        color: ColorMask,
        /// Output intensity.
        amount: u32,
        /// Rule that fired.
        mode: LogicMode,
    },
    /// An accumulator counted a charged tick.
    AccumulatorCharge {
        /// Target color of the accumulator.
        color: ColorMask,
        /// Consecutive charged ticks including this one.
        charge: u32,
    },
    /// An accumulator emitted one pulse.
    AccumulatorPulse {
        /// Color of the pulse.
        color: ColorMask,
    },
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No active beams, queued delays or pending pulses remained.
    Converged,
    /// The tick limit stopped a run that still had work pending.
    TickLimitReached,
}

/// Aggregate counters of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SimStats {
    /// Number of placements supplied by the player.
    pub placed_count: u32,
    /// Single-cell moves taken by all beams.
    pub beam_steps: u64,
    /// Ticks simulated.
    pub elapsed_ticks: u32,
    /// Effective tick limit of the run.
    pub tick_limit: u32,
    /// Mirror reflections performed.
    pub bounce_count: u32,
    /// Beams or energy parcels lost to the grid edge, walls, rejection,
    /// saturated queues, exhausted budgets or loop suppression.
    pub leak_count: u64,
    /// Tick on which the final receiver lit, for victorious runs.
    pub solve_tick: Option<u32>,
}

/// Everything a run produces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SimResult {
    /// Beam segments with at least two points.
    pub paths: Vec<BeamPath>,
    /// Final receiver states.
    pub receivers: Receivers,
    /// Chronological event log.
    pub events: Vec<SimEvent>,
    /// Whether every victory rule held.
    pub victory: bool,
    /// How the run ended.
    pub termination: Termination,
    /// Aggregate counters.
    pub stats: SimStats,
}

impl SimResult {
    /// Reports whether the timeline finished before the tick limit cut it off.
    #[must_use]
    pub fn timeline_done(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Events of one kind, selected by a predicate over [`SimEventKind`].
    pub fn events_matching<'a>(
        &'a self,
        mut predicate: impl FnMut(&SimEventKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a SimEvent> + 'a {
        self.events.iter().filter(move |event| predicate(&event.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::{ReceiverRuntime, Receivers};
    use crate::Channel;

    #[test]
    fn first_satisfied_tick_is_latched() {
        let mut receiver = ReceiverRuntime::new(Channel::Green, 100);
        receiver.credit(60, 3);
        assert_eq!(receiver.first_satisfied_tick, None);
        receiver.credit(60, 5);
        receiver.credit(60, 9);
        assert_eq!(receiver.first_satisfied_tick, Some(5));
        receiver.settle();
        assert!(receiver.lit);
        assert_eq!(receiver.received, 180);
    }

    #[test]
    fn zero_threshold_receiver_lights_without_a_satisfied_tick() {
        let mut receivers = Receivers::with_thresholds(|_| 0);
        receivers.get_mut(Channel::Blue).settle();
        assert!(receivers.get(Channel::Blue).lit);
        assert_eq!(receivers.get(Channel::Blue).first_satisfied_tick, None);
    }
}
