//! Victim selection for page replacement.
//!
//! Each function assumes every frame is occupied; the manager only asks for a
//! victim after the search for an empty frame failed. Ties go to the lowest
//! frame index.

use ossim_common::{Error, PageId, ReplacementPolicy, Result};

use super::frame::Frame;

/// Picks the frame to evict under `policy`.
///
/// `future` is the part of the reference string that follows the current
/// access. Only Optimal reads it, and Optimal refuses to run without it.
/// `hand` is the Clock pointer and is only advanced by Clock.
pub(crate) fn select_victim(
    policy: ReplacementPolicy,
    frames: &mut [Frame],
    hand: &mut usize,
    future: Option<&[PageId]>,
) -> Result<usize> {
    debug_assert!(!frames.is_empty());
    debug_assert!(frames.iter().all(|f| !f.is_empty()));

    match policy {
        ReplacementPolicy::Fifo => Ok(fifo(frames)),
        ReplacementPolicy::Lru => Ok(lru(frames)),
        ReplacementPolicy::Optimal => future
            .map(|future| optimal(frames, future))
            .ok_or(Error::LookaheadRequired(policy)),
        ReplacementPolicy::Clock => Ok(clock(frames, hand)),
    }
}

/// Oldest load time.
fn fifo(frames: &[Frame]) -> usize {
    frames
        .iter()
        .enumerate()
        .min_by_key(|(_, frame)| frame.load_time)
        .map_or(0, |(index, _)| index)
}

/// Oldest use time.
fn lru(frames: &[Frame]) -> usize {
    frames
        .iter()
        .enumerate()
        .min_by_key(|(_, frame)| frame.last_used)
        .map_or(0, |(index, _)| index)
}

/// Farthest next use; pages never used again count as infinitely far.
fn optimal(frames: &[Frame], future: &[PageId]) -> usize {
    let next_use = |frame: &Frame| {
        frame
            .page_id
            .and_then(|page| future.iter().position(|&p| p == page))
            .unwrap_or(usize::MAX)
    };

    let mut victim = 0;
    let mut farthest = next_use(&frames[0]);
    for (index, frame) in frames.iter().enumerate().skip(1) {
        let distance = next_use(frame);
        if distance > farthest {
            victim = index;
            farthest = distance;
        }
    }
    victim
}

/// Second chance: clear set reference bits until an unset one turns up.
///
/// Terminates within two sweeps, since the first sweep clears every bit.
fn clock(frames: &mut [Frame], hand: &mut usize) -> usize {
    let count = frames.len();
    *hand %= count;
    loop {
        let frame = &mut frames[*hand];
        if frame.referenced {
            frame.referenced = false;
            *hand = (*hand + 1) % count;
        } else {
            let victim = *hand;
            *hand = (*hand + 1) % count;
            return victim;
        }
    }
}
