use log::{debug, trace};
use prismatic_board::Board;
use prismatic_core::{
    decompose, CellCoord, Channel, ColorMask, Direction, Level, LogicMode, MirrorKind, Piece,
    PieceKind, Receivers, SimEvent, SimEventKind, SimResult, SimStats, Termination,
};
use prismatic_system_victory::evaluate;

use crate::{
    accumulator::AccumulatorBank,
    arrivals::ArrivalGroups,
    beam::{Beam, LoopGuard, PathLog},
    delay::{DelayLine, HeldBeam},
};

/// State owned by a single simulation, dropped when the result is produced.
pub(crate) struct Run<'a> {
    level: &'a Level,
    board: Board,
    guard: LoopGuard,
    paths: PathLog,
    delays: DelayLine,
    accumulators: AccumulatorBank,
    receivers: Receivers,
    events: Vec<SimEvent>,
    stats: SimStats,
    active: Vec<Beam>,
}

impl<'a> Run<'a> {
    pub(crate) fn new(level: &'a Level, board: Board, stats: SimStats) -> Self {
        let accumulators = AccumulatorBank::from_board(&board);
        Self {
            level,
            board,
            guard: LoopGuard::default(),
            paths: PathLog::default(),
            delays: DelayLine::default(),
            accumulators,
            receivers: Receivers::with_thresholds(|channel| level.receiver_threshold(channel)),
            events: Vec::new(),
            stats,
            active: Vec::new(),
        }
    }

    /// Seeds one beam per fixed source. Placed sources never emit.
    pub(crate) fn seed(&mut self) {
        let level = self.level;
        let mut seeded = Vec::new();
        for piece in &level.fixed {
            if let PieceKind::Source { color, intensity } = piece.kind {
                self.spawn(&mut seeded, piece.cell, piece.facing, color, intensity);
            }
        }
        self.active = seeded;
    }

    pub(crate) fn execute(mut self) -> SimResult {
        let mut converged = false;
        while self.stats.elapsed_ticks < self.stats.tick_limit {
            if self.is_idle() {
                converged = true;
                break;
            }
            self.stats.elapsed_ticks += 1;
            self.step(self.stats.elapsed_ticks);
        }
        converged = converged || self.is_idle();

        for channel in Channel::ALL {
            self.receivers.get_mut(channel).settle();
        }
        let verdict = evaluate(&self.level.rules, &self.receivers);
        self.stats.solve_tick = verdict.solve_tick;

        let termination = if converged {
            Termination::Converged
        } else {
            Termination::TickLimitReached
        };
        debug!(
            "level {}: {:?} after {} of {} ticks, victory={}, steps={}, bounces={}, leaks={}",
            self.level.id,
            termination,
            self.stats.elapsed_ticks,
            self.stats.tick_limit,
            verdict.victory,
            self.stats.beam_steps,
            self.stats.bounce_count,
            self.stats.leak_count,
        );

        SimResult {
            paths: self.paths.into_paths(),
            receivers: self.receivers,
            events: self.events,
            victory: verdict.victory,
            termination,
            stats: self.stats,
        }
    }

    fn is_idle(&self) -> bool {
        self.active.is_empty() && self.delays.is_empty() && !self.accumulators.has_pending_pulse()
    }

    fn step(&mut self, tick: u32) {
        let mut next = Vec::new();

        for pulse in self.accumulators.emit_pulses() {
            let color = pulse.config.output_color();
            self.record(tick, pulse.cell, SimEventKind::AccumulatorPulse { color });
            self.spawn(
                &mut next,
                pulse.cell,
                pulse.facing,
                color,
                pulse.config.output_intensity(),
            );
        }

        let mut arrivals = ArrivalGroups::default();
        for beam in std::mem::take(&mut self.active) {
            let moved = beam.advanced();
            self.stats.beam_steps += 1;
            self.paths.extend(beam.segment, moved.cell);
            if self.board.is_passable(moved.cell) {
                arrivals.push(moved);
            } else {
                self.leak(1);
            }
        }

        for held in self.delays.release(tick) {
            self.record(
                tick,
                held.cell,
                SimEventKind::DelayRelease { color: held.color },
            );
            self.launch(&mut next, held.cell, held.direction, held.color, held.intensity);
        }

        for (cell, incoming) in arrivals.into_groups() {
            self.resolve(tick, cell, incoming, &mut next);
        }
        self.accumulators.settle_untouched();

        trace!(
            "tick {tick}: {} beams active, {} events, {} leaks so far",
            next.len(),
            self.events.len(),
            self.stats.leak_count
        );
        self.active = next;
    }

    fn resolve(&mut self, tick: u32, cell: CellCoord, incoming: Vec<Beam>, next: &mut Vec<Beam>) {
        let Some(piece) = self.board.piece_at(cell).copied() else {
            for beam in incoming {
                self.admit(next, beam);
            }
            return;
        };

        match piece.kind {
            PieceKind::Source { .. } => {}
            PieceKind::Receiver { channel, .. } => self.receive(tick, cell, channel, &incoming),
            PieceKind::Filter(channel) => {
                for beam in &incoming {
                    let pass = decompose(beam.color, beam.intensity).get(channel);
                    self.spawn(next, cell, beam.direction, channel.mask(), pass);
                }
            }
            PieceKind::Mirror => {
                let mirror = MirrorKind::from_facing(piece.facing);
                for beam in &incoming {
                    if self.stats.bounce_count >= self.level.rules.max_bounces {
                        self.leak(1);
                        continue;
                    }
                    self.stats.bounce_count += 1;
                    let direction = beam.direction.reflect(mirror);
                    self.spawn(next, cell, direction, beam.color, beam.intensity);
                }
            }
            PieceKind::Prism => {
                for beam in &incoming {
                    let shares = decompose(beam.color, beam.intensity);
                    for (channel, turn) in [(Channel::Red, -1), (Channel::Green, 0), (Channel::Blue, 1)]
                    {
                        let direction = piece.facing.rotate(turn);
                        self.spawn(next, cell, direction, channel.mask(), shares.get(channel));
                    }
                }
            }
            PieceKind::Splitter => {
                for beam in &incoming {
                    for direction in [piece.facing, piece.facing.rotate(2)] {
                        self.spawn(next, cell, direction, beam.color, beam.intensity);
                    }
                }
            }
            PieceKind::Delay(config) => {
                let release_tick = tick.saturating_add(config.ticks());
                for beam in &incoming {
                    let held = HeldBeam {
                        cell,
                        direction: piece.facing,
                        color: beam.color,
                        intensity: beam.intensity,
                    };
                    if !self.delays.hold(held, release_tick) {
                        self.leak(1);
                    }
                }
            }
            PieceKind::Gate(config) => {
                let open = config.is_open_at(tick);
                for beam in &incoming {
                    let color = beam.color;
                    if open {
                        self.record(tick, cell, SimEventKind::GatePass { color });
                        self.spawn(next, cell, beam.direction, color, beam.intensity);
                    } else {
                        self.leak(1);
                        self.record(tick, cell, SimEventKind::GateBlock { color });
                    }
                }
            }
            PieceKind::Mixer {
                require_distinct_directions,
            } => self.mix(tick, &piece, require_distinct_directions, &incoming, next),
            PieceKind::LogicGate(config) => {
                let usable = usable(&incoming);
                let fires = match config.mode() {
                    LogicMode::And => usable.len() >= 2,
                    LogicMode::Xor => usable.len() == 1,
                    LogicMode::Not => !usable.is_empty(),
                };
                if !fires {
                    self.leak(usable.len());
                    return;
                }

                let (merged, amount) = merge(&usable);
                let color = match config.mode() {
                    LogicMode::Not => merged.complement(),
                    LogicMode::And | LogicMode::Xor => config.output_color(),
                };
                self.record(
                    tick,
                    cell,
                    SimEventKind::LogicTrigger {
                        color,
                        amount,
                        mode: config.mode(),
                    },
                );
                self.spawn(next, cell, piece.facing, color, amount);
            }
            PieceKind::Accumulator(config) => {
                let target = config.target_color();
                let charged = incoming.iter().any(|beam| beam.color.intersects(target));
                if let Some(charge) = self.accumulators.absorb(cell, charged) {
                    self.record(
                        tick,
                        cell,
                        SimEventKind::AccumulatorCharge {
                            color: target,
                            charge,
                        },
                    );
                }
            }
        }
    }

    fn receive(&mut self, tick: u32, cell: CellCoord, channel: Channel, incoming: &[Beam]) {
        let purity = self.level.rules.purity;
        for beam in incoming {
            let shares = decompose(beam.color, beam.intensity);
            let accepted = shares.get(channel);
            let receiver = self.receivers.get_mut(channel);

            if accepted > 0 {
                receiver.credit(accepted, tick);
            }
            if purity && shares.off_channel(channel) > 0 {
                receiver.contaminated = true;
            }
            if accepted > 0 {
                self.record(
                    tick,
                    cell,
                    SimEventKind::ReceiverHit {
                        receiver: channel,
                        color: beam.color,
                        amount: accepted,
                    },
                );
            }
            if beam.intensity > accepted {
                self.leak(1);
            }
        }
    }

    fn mix(
        &mut self,
        tick: u32,
        piece: &Piece,
        require_distinct_directions: bool,
        incoming: &[Beam],
        next: &mut Vec<Beam>,
    ) {
        let usable = usable(incoming);
        let headings = usable
            .iter()
            .fold(0u8, |seen, beam| seen | (1 << beam.direction.index()))
            .count_ones();
        let distinct = !require_distinct_directions || headings >= 2;

        if usable.len() < 2 || !distinct {
            self.leak(usable.len());
            return;
        }

        let (color, amount) = merge(&usable);
        self.record(tick, piece.cell, SimEventKind::MixerTrigger { color, amount });
        self.spawn(next, piece.cell, piece.facing, color, amount);
    }

    /// Creates a beam unless it carries no color or no energy.
    fn spawn(
        &mut self,
        out: &mut Vec<Beam>,
        cell: CellCoord,
        direction: Direction,
        color: ColorMask,
        intensity: u32,
    ) {
        if color.is_empty() || intensity == 0 {
            return;
        }
        self.launch(out, cell, direction, color, intensity);
    }

    /// Opens a path segment for a new beam and hands it to the loop guard.
    fn launch(
        &mut self,
        out: &mut Vec<Beam>,
        cell: CellCoord,
        direction: Direction,
        color: ColorMask,
        intensity: u32,
    ) {
        let segment = self.paths.open(cell, color, intensity);
        self.admit(
            out,
            Beam {
                segment,
                cell,
                direction,
                color,
                intensity,
            },
        );
    }

    fn admit(&mut self, out: &mut Vec<Beam>, beam: Beam) {
        if self.guard.admit(&beam) {
            out.push(beam);
        } else {
            self.leak(1);
        }
    }

    fn leak(&mut self, count: usize) {
        self.stats.leak_count = self
            .stats
            .leak_count
            .saturating_add(u64::try_from(count).unwrap_or(u64::MAX));
    }

    fn record(&mut self, tick: u32, cell: CellCoord, kind: SimEventKind) {
        self.events.push(SimEvent { tick, cell, kind });
    }
}

fn usable(incoming: &[Beam]) -> Vec<&Beam> {
    incoming
        .iter()
        .filter(|beam| beam.intensity > 0 && !beam.color.is_empty())
        .collect()
}

fn merge(beams: &[&Beam]) -> (ColorMask, u32) {
    beams
        .iter()
        .fold((ColorMask::NONE, 0u32), |(color, amount), beam| {
            (color.union(beam.color), amount.saturating_add(beam.intensity))
        })
}
