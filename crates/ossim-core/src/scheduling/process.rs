//! Process descriptors and their life cycle.

use ossim_common::{ProcessId, Tick};
use serde::{Deserialize, Serialize};

/// Life-cycle state of a simulated process.
///
/// Progresses `New -> Ready -> Running -> (Ready | Terminated)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// Submitted but not yet arrived.
    #[default]
    New,
    /// Arrived and waiting for the CPU.
    Ready,
    /// On the CPU.
    Running,
    /// Blocked. Not produced by the CPU-only policies.
    Waiting,
    /// Finished.
    Terminated,
}

/// A process as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessDescriptor {
    /// Process identifier.
    pub process_id: ProcessId,
    /// Total CPU time needed.
    pub burst_time: Tick,
    /// CPU time still needed.
    pub remaining: Tick,
    /// Time the process becomes runnable.
    pub arrival_time: Tick,
    /// Current state.
    pub state: ProcessState,
    /// First dispatch time.
    pub start_time: Option<Tick>,
    /// Completion time.
    pub finish_time: Option<Tick>,
    /// `turnaround_time - burst_time`, set on completion.
    pub waiting_time: Tick,
    /// `finish_time - arrival_time`, set on completion.
    pub turnaround_time: Tick,
}

impl ProcessDescriptor {
    /// Creates a new, not yet arrived, process.
    #[must_use]
    pub fn new(process_id: ProcessId, burst_time: Tick, arrival_time: Tick) -> Self {
        Self {
            process_id,
            burst_time,
            remaining: burst_time,
            arrival_time,
            state: ProcessState::New,
            start_time: None,
            finish_time: None,
            waiting_time: 0,
            turnaround_time: 0,
        }
    }

    /// Returns true once the process has finished.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state == ProcessState::Terminated
    }

    pub(crate) fn admit(&mut self) {
        if self.state == ProcessState::New {
            self.state = ProcessState::Ready;
        }
    }

    /// Runs the process for `slice` units starting at `now`.
    pub(crate) fn run(&mut self, now: Tick, slice: Tick) {
        debug_assert!(slice <= self.remaining);
        self.state = ProcessState::Running;
        self.start_time.get_or_insert(now);
        self.remaining -= slice;
    }

    pub(crate) fn preempt(&mut self) {
        self.state = ProcessState::Ready;
    }

    pub(crate) fn complete(&mut self, now: Tick) {
        self.state = ProcessState::Terminated;
        self.finish_time = Some(now);
        self.turnaround_time = now - self.arrival_time;
        self.waiting_time = self.turnaround_time - self.burst_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_cycle() {
        let mut p = ProcessDescriptor::new(ProcessId::new("P1"), 5, 1);
        assert_eq!(p.state, ProcessState::New);

        p.admit();
        assert_eq!(p.state, ProcessState::Ready);

        p.run(2, 3);
        assert_eq!(p.state, ProcessState::Running);
        assert_eq!(p.start_time, Some(2));
        assert_eq!(p.remaining, 2);

        p.preempt();
        p.run(7, 2);
        // Start time is the first dispatch only.
        assert_eq!(p.start_time, Some(2));

        p.complete(9);
        assert!(p.is_terminated());
        assert_eq!(p.turnaround_time, 8);
        assert_eq!(p.waiting_time, 3);
    }
}
