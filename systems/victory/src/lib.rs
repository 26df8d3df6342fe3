#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides whether a finished run satisfies a level's rules.

use prismatic_core::{Channel, LevelRules, Receivers, SequenceRule, SyncRule};

/// Outcome of evaluating receivers against level rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Whether every rule held.
    pub victory: bool,
    /// Latest first-satisfied tick over all receivers, for victorious runs.
    pub solve_tick: Option<u32>,
}

/// Evaluates settled receivers against the rules of a level.
#[must_use]
pub fn evaluate(rules: &LevelRules, receivers: &Receivers) -> Verdict {
    let victory = all_lit(receivers)
        && (!rules.purity || receivers.iter().all(|receiver| !receiver.contaminated))
        && rules
            .sync
            .as_ref()
            .map_or(true, |sync| sync_holds(sync, receivers))
        && rules
            .sequence
            .as_ref()
            .map_or(true, |sequence| sequence_holds(sequence, receivers));

    let solve_tick = victory.then(|| {
        receivers
            .iter()
            .map(|receiver| receiver.first_satisfied_tick.unwrap_or(0))
            .max()
            .unwrap_or(0)
    });

    Verdict {
        victory,
        solve_tick,
    }
}

fn all_lit(receivers: &Receivers) -> bool {
    receivers
        .iter()
        .all(|receiver| receiver.received >= u64::from(receiver.threshold))
}

fn first_ticks<'a>(
    receivers: &'a Receivers,
    channels: &'a [Channel],
) -> impl Iterator<Item = Option<u32>> + 'a {
    channels
        .iter()
        .map(|channel| receivers.get(*channel).first_satisfied_tick)
}

fn sync_holds(sync: &SyncRule, receivers: &Receivers) -> bool {
    let Some(ticks) = first_ticks(receivers, &sync.targets).collect::<Option<Vec<u32>>>() else {
        return false;
    };
    match (ticks.iter().min(), ticks.iter().max()) {
        (Some(earliest), Some(latest)) => latest - earliest <= sync.window,
        _ => true,
    }
}

fn sequence_holds(sequence: &SequenceRule, receivers: &Receivers) -> bool {
    let Some(ticks) = first_ticks(receivers, &sequence.order).collect::<Option<Vec<u32>>>() else {
        return false;
    };
    ticks.windows(2).all(|pair| {
        let gap = i64::from(pair[1]) - i64::from(pair[0]);
        gap > 0 && gap <= i64::from(sequence.max_gap)
    })
}
