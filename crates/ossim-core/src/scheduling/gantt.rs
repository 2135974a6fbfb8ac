//! Gantt timeline and the execution log that accompanies it.

use std::fmt::Write as _;

use ossim_common::Tick;
use serde::Serialize;

use super::process::ProcessDescriptor;

/// What occupied the CPU during a Gantt slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceKind {
    /// A process ran.
    Process,
    /// Nothing was runnable.
    Idle,
}

/// One slice of the timeline, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttEntry {
    /// Process id, or `"idle"`.
    pub id: String,
    /// Slice start.
    pub start: Tick,
    /// Slice end.
    pub end: Tick,
    /// Slice kind.
    pub kind: SliceKind,
}

impl GanttEntry {
    /// Length of the slice.
    #[must_use]
    pub fn duration(&self) -> Tick {
        self.end - self.start
    }
}

/// Clock, chart and log shared by the scheduling loops.
#[derive(Debug, Default)]
pub(crate) struct Timeline {
    pub(crate) now: Tick,
    pub(crate) gantt: Vec<GanttEntry>,
    pub(crate) log: String,
}

impl Timeline {
    /// Records an idle slice up to `until`; no-op if `until` is not ahead.
    pub(crate) fn idle_until(&mut self, until: Tick) {
        if until <= self.now {
            return;
        }
        let _ = writeln!(self.log, "CPU idle from {} to {until}", self.now);
        self.gantt.push(GanttEntry {
            id: "idle".to_string(),
            start: self.now,
            end: until,
            kind: SliceKind::Idle,
        });
        self.now = until;
    }

    /// Runs `process` for `slice` units from the current time.
    pub(crate) fn execute(&mut self, process: &mut ProcessDescriptor, slice: Tick) {
        let (start, end) = (self.now, self.now + slice);
        let _ = writeln!(
            self.log,
            "Executing {} from {start} to {end}",
            process.process_id
        );
        self.gantt.push(GanttEntry {
            id: process.process_id.to_string(),
            start,
            end,
            kind: SliceKind::Process,
        });
        process.run(start, slice);
        self.now = end;
    }

    /// Marks `process` finished at the current time.
    pub(crate) fn complete(&mut self, process: &mut ProcessDescriptor) {
        process.complete(self.now);
        let _ = writeln!(
            self.log,
            "Process {} completed. Turnaround: {}, Waiting: {}",
            process.process_id, process.turnaround_time, process.waiting_time
        );
    }
}
