//! CPU scheduling over a queue of simulated processes.
//!
//! [`CpuScheduler`] owns the submission queue. Running a policy never mutates
//! the queue: every run works on a fresh copy, so the same workload can be
//! replayed under several policies and compared.
//!
//! ## Policies
//!
//! | Policy | Preemptive | Selection |
//! |--------|-----------|-----------|
//! | FCFS | no | arrival order |
//! | SJF | no | shortest burst among arrived processes |
//! | Round robin | yes, every `quantum` ticks | ready-queue order |
//!
//! All three share the same bookkeeping: `turnaround = finish - arrival`,
//! `waiting = turnaround - burst`.

mod algorithms;
pub mod gantt;
pub mod process;

use std::fmt;
use std::fmt::Write as _;

use ossim_common::utils::error::ensure_positive;
use ossim_common::{Error, ProcessId, Result, Tick};
use serde::{Deserialize, Serialize};

pub use gantt::{GanttEntry, SliceKind};
pub use process::{ProcessDescriptor, ProcessState};

use gantt::Timeline;

/// Scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Algorithm {
    /// First come, first served.
    Fcfs,
    /// Non-preemptive shortest job first.
    Sjf,
    /// Round robin with the given time quantum.
    RoundRobin {
        /// Slice length, must be positive.
        quantum: Tick,
    },
}

impl Algorithm {
    /// Parses a policy name, using `quantum` for round robin.
    ///
    /// Accepts `fcfs`, `sjf`, and `rr` / `round-robin`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPolicy` for other names.
    pub fn parse(name: &str, quantum: Tick) -> Result<Self> {
        match name.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "fcfs" => Ok(Self::Fcfs),
            "sjf" => Ok(Self::Sjf),
            "rr" | "round-robin" | "roundrobin" => Ok(Self::RoundRobin { quantum }),
            _ => Err(Error::UnknownPolicy {
                name: name.to_string(),
                expected: "fcfs, sjf, rr",
            }),
        }
    }

    /// Short display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Sjf => "SJF",
            Self::RoundRobin { .. } => "Round Robin",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobin { quantum } => write!(f, "{} (q={quantum})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Per-process results of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessMetrics {
    /// Process id.
    pub id: ProcessId,
    /// Arrival time.
    pub at: Tick,
    /// Burst time.
    pub bt: Tick,
    /// Finish time.
    pub ft: Tick,
    /// Turnaround time.
    pub tat: Tick,
    /// Waiting time.
    pub wt: Tick,
}

impl From<&ProcessDescriptor> for ProcessMetrics {
    fn from(p: &ProcessDescriptor) -> Self {
        Self {
            id: p.process_id.clone(),
            at: p.arrival_time,
            bt: p.burst_time,
            ft: p.finish_time.unwrap_or_default(),
            tat: p.turnaround_time,
            wt: p.waiting_time,
        }
    }
}

/// Result of running one policy over the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    /// Policy that produced this report.
    pub algorithm: Algorithm,
    /// Human-readable execution log.
    pub log: String,
    /// Metrics in completion order.
    pub metrics: Vec<ProcessMetrics>,
    /// Contiguous timeline from 0 to the makespan.
    pub gantt: Vec<GanttEntry>,
    /// Mean turnaround time, 0 for an empty queue.
    pub avg_turnaround: f64,
    /// Mean waiting time, 0 for an empty queue.
    pub avg_waiting: f64,
    /// Final state of every process, in arrival order.
    pub processes: Vec<ProcessDescriptor>,
}

impl ScheduleReport {
    /// End time of the last slice.
    #[must_use]
    pub fn makespan(&self) -> Tick {
        self.gantt.last().map_or(0, |entry| entry.end)
    }

    /// Time the CPU spent idle.
    #[must_use]
    pub fn idle_time(&self) -> Tick {
        self.gantt
            .iter()
            .filter(|entry| entry.kind == SliceKind::Idle)
            .map(GanttEntry::duration)
            .sum()
    }

    /// Share of the makespan spent running processes, in percent.
    #[must_use]
    pub fn cpu_utilization(&self) -> f64 {
        let makespan = self.makespan();
        if makespan == 0 {
            return 0.0;
        }
        (makespan - self.idle_time()) as f64 / makespan as f64 * 100.0
    }
}

/// Queue of submitted processes plus the scheduling policies.
#[derive(Debug, Clone, Default)]
pub struct CpuScheduler {
    queue: Vec<ProcessDescriptor>,
}

impl CpuScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a process.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty id, a zero burst time, or a workload
    ///   whose schedule could not end within the `Tick` range
    /// - `DuplicateProcessId` if the id is already queued
    pub fn add_process(
        &mut self,
        process_id: impl Into<ProcessId>,
        burst_time: Tick,
        arrival_time: Tick,
    ) -> Result<&ProcessDescriptor> {
        let process_id = process_id.into();
        if process_id.is_empty() {
            return Err(Error::invalid("process id must not be empty"));
        }
        ensure_positive("burst time", burst_time)?;
        if self.queue.iter().any(|p| p.process_id == process_id) {
            return Err(Error::DuplicateProcessId(process_id));
        }
        // The makespan never exceeds the latest arrival plus the total burst.
        let latest_arrival = self
            .queue
            .iter()
            .map(|p| p.arrival_time)
            .fold(arrival_time, Tick::max);
        self.queue
            .iter()
            .try_fold(burst_time, |total, p| total.checked_add(p.burst_time))
            .and_then(|total| total.checked_add(latest_arrival))
            .ok_or_else(|| {
                Error::invalid(format!(
                    "process {process_id} would push the schedule past the end of the clock"
                ))
            })?;

        self.queue
            .push(ProcessDescriptor::new(process_id, burst_time, arrival_time));
        Ok(&self.queue[self.queue.len() - 1])
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Returns the queue in submission order.
    #[must_use]
    pub fn queue(&self) -> &[ProcessDescriptor] {
        &self.queue
    }

    /// Returns true if no process has been submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs `algorithm` over a copy of the queue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a round-robin quantum of zero.
    pub fn run(&self, algorithm: Algorithm) -> Result<ScheduleReport> {
        if let Algorithm::RoundRobin { quantum } = algorithm {
            ensure_positive("time quantum", quantum)?;
        }

        Ok(self.schedule(algorithm))
    }

    fn schedule(&self, algorithm: Algorithm) -> ScheduleReport {
        let mut processes = self.queue.clone();
        processes.sort_by_key(|p| p.arrival_time);

        let mut timeline = Timeline::default();
        let order = match algorithm {
            Algorithm::Fcfs => algorithms::fcfs(&mut processes, &mut timeline),
            Algorithm::Sjf => algorithms::sjf(&mut processes, &mut timeline),
            Algorithm::RoundRobin { quantum } => {
                algorithms::round_robin(&mut processes, quantum, &mut timeline)
            }
        };

        let metrics: Vec<ProcessMetrics> = order
            .iter()
            .map(|&index| ProcessMetrics::from(&processes[index]))
            .collect();
        let (avg_turnaround, avg_waiting) = averages(&metrics);

        let Timeline { gantt, mut log, .. } = timeline;
        let _ = write!(
            log,
            "\nAverage Turnaround Time: {avg_turnaround:.2}\nAverage Waiting Time: {avg_waiting:.2}\n"
        );

        ScheduleReport {
            algorithm,
            log,
            metrics,
            gantt,
            avg_turnaround,
            avg_waiting,
            processes,
        }
    }

    /// Runs first come, first served.
    #[must_use]
    pub fn run_fcfs(&self) -> ScheduleReport {
        self.schedule(Algorithm::Fcfs)
    }

    /// Runs non-preemptive shortest job first.
    #[must_use]
    pub fn run_sjf(&self) -> ScheduleReport {
        self.schedule(Algorithm::Sjf)
    }

    /// Runs round robin.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `quantum` is zero.
    pub fn run_round_robin(&self, quantum: Tick) -> Result<ScheduleReport> {
        self.run(Algorithm::RoundRobin { quantum })
    }

    /// Runs FCFS, SJF and round robin over the same queue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `quantum` is zero.
    pub fn compare(&self, quantum: Tick) -> Result<Vec<ScheduleReport>> {
        [
            Algorithm::Fcfs,
            Algorithm::Sjf,
            Algorithm::RoundRobin { quantum },
        ]
        .into_iter()
        .map(|algorithm| self.run(algorithm))
        .collect()
    }
}

fn averages(metrics: &[ProcessMetrics]) -> (f64, f64) {
    if metrics.is_empty() {
        return (0.0, 0.0);
    }
    let count = metrics.len() as f64;
    let tat: u128 = metrics.iter().map(|m| u128::from(m.tat)).sum();
    let wt: u128 = metrics.iter().map(|m| u128::from(m.wt)).sum();
    (tat as f64 / count, wt as f64 / count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(processes: &[(&str, Tick, Tick)]) -> CpuScheduler {
        let mut scheduler = CpuScheduler::new();
        for &(id, burst, arrival) in processes {
            scheduler.add_process(id, burst, arrival).unwrap();
        }
        scheduler
    }

    fn chart(report: &ScheduleReport) -> Vec<(&str, Tick, Tick)> {
        report
            .gantt
            .iter()
            .map(|e| (e.id.as_str(), e.start, e.end))
            .collect()
    }

    #[test]
    fn test_fcfs_two_processes() {
        let report = scheduler(&[("P1", 5, 0), ("P2", 3, 1)]).run_fcfs();

        assert_eq!(chart(&report), vec![("P1", 0, 5), ("P2", 5, 8)]);
        // P2 waits from 1 to 5.
        assert_eq!(report.metrics[1].wt, 4);
        assert!((report.avg_waiting - 2.0).abs() < 1e-9);
        assert!((report.avg_turnaround - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_fcfs_idle_gap() {
        let report = scheduler(&[("P1", 2, 0), ("P2", 2, 5)]).run_fcfs();

        assert_eq!(
            chart(&report),
            vec![("P1", 0, 2), ("idle", 2, 5), ("P2", 5, 7)]
        );
        assert_eq!(report.gantt[1].kind, SliceKind::Idle);
        assert_eq!(report.idle_time(), 3);
        assert!(report.log.contains("CPU idle from 2 to 5"));
    }

    #[test]
    fn test_fcfs_sorts_by_arrival_stably() {
        let report = scheduler(&[("late", 1, 4), ("a", 2, 0), ("b", 2, 0)]).run_fcfs();
        let ids: Vec<_> = report.metrics.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "late"]);
    }

    #[test]
    fn test_sjf_picks_shortest_arrived() {
        let report = scheduler(&[("P1", 6, 0), ("P2", 8, 1), ("P3", 2, 2), ("P4", 3, 3)]).run_sjf();

        assert_eq!(
            chart(&report),
            vec![("P1", 0, 6), ("P3", 6, 8), ("P4", 8, 11), ("P2", 11, 19)]
        );
    }

    #[test]
    fn test_sjf_idles_until_next_arrival() {
        let report = scheduler(&[("P1", 4, 3), ("P2", 1, 10)]).run_sjf();
        assert_eq!(
            chart(&report),
            vec![("idle", 0, 3), ("P1", 3, 7), ("idle", 7, 10), ("P2", 10, 11)]
        );
    }

    #[test]
    fn test_sjf_tie_goes_to_submission_order() {
        let report = scheduler(&[("A", 3, 0), ("B", 3, 0)]).run_sjf();
        assert_eq!(report.gantt[0].id, "A");
    }

    #[test]
    fn test_round_robin_quantum_two() {
        let report = scheduler(&[("P1", 5, 0), ("P2", 3, 0)])
            .run_round_robin(2)
            .unwrap();

        assert_eq!(
            chart(&report),
            vec![
                ("P1", 0, 2),
                ("P2", 2, 4),
                ("P1", 4, 6),
                ("P2", 6, 7),
                ("P1", 7, 8)
            ]
        );
        assert_eq!(report.metrics[0].id.as_str(), "P2");
        assert_eq!(report.metrics[1].ft, 8);
    }

    #[test]
    fn test_round_robin_admits_arrivals_before_requeue() {
        // P2 arrives during P1's first slice and must run before P1 resumes.
        let report = scheduler(&[("P1", 4, 0), ("P2", 2, 1)])
            .run_round_robin(2)
            .unwrap();
        assert_eq!(
            chart(&report),
            vec![("P1", 0, 2), ("P2", 2, 4), ("P1", 4, 6)]
        );
    }

    #[test]
    fn test_round_robin_idle_and_zero_quantum() {
        let scheduler = scheduler(&[("P1", 1, 2)]);
        let report = scheduler.run_round_robin(3).unwrap();
        assert_eq!(chart(&report), vec![("idle", 0, 2), ("P1", 2, 3)]);

        let err = scheduler.run_round_robin(0).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_empty_queue() {
        let report = CpuScheduler::new().run_fcfs();
        assert!(report.gantt.is_empty());
        assert!(report.metrics.is_empty());
        assert_eq!(report.avg_waiting, 0.0);
        assert_eq!(report.cpu_utilization(), 0.0);
    }

    #[test]
    fn test_run_leaves_queue_untouched() {
        let scheduler = scheduler(&[("P1", 3, 0)]);
        let report = scheduler.run_fcfs();

        assert!(report.processes[0].is_terminated());
        assert_eq!(scheduler.queue()[0].state, ProcessState::New);
        assert_eq!(scheduler.queue()[0].remaining, 3);
    }

    #[test]
    fn test_add_process_rejects_clock_overflow() {
        let mut scheduler = CpuScheduler::new();
        assert_eq!(
            scheduler.add_process("P1", 2, u64::MAX - 1).unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            scheduler.add_process("P1", 1, u64::MAX).unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert!(scheduler.is_empty());

        let half = u64::MAX / 2 + 1;
        scheduler.add_process("A", half, 0).unwrap();
        assert!(scheduler.add_process("B", half, 0).is_err());
        assert_eq!(scheduler.queue().len(), 1);

        // Turnaround sums exceed the clock even though every finish time fits.
        scheduler.add_process("B", half - 1, 0).unwrap();
        let report = scheduler.run_fcfs();
        assert_eq!(report.makespan(), u64::MAX);
        assert!(report.avg_turnaround > u64::MAX as f64 / 2.0);
    }

    #[test]
    fn test_schedule_ending_at_clock_limit() {
        let mut scheduler = CpuScheduler::new();
        scheduler.add_process("P1", 2, u64::MAX - 2).unwrap();

        let report = scheduler.run_round_robin(1).unwrap();
        assert_eq!(report.makespan(), u64::MAX);
        assert_eq!(report.metrics[0].wt, 0);
        assert_eq!(report.idle_time(), u64::MAX - 2);
    }

    #[test]
    fn test_add_process_validation() {
        let mut scheduler = CpuScheduler::new();
        scheduler.add_process("P1", 3, 0).unwrap();

        assert_eq!(
            scheduler.add_process("P1", 2, 0).unwrap_err(),
            Error::DuplicateProcessId(ProcessId::new("P1"))
        );
        assert_eq!(scheduler.add_process("P2", 0, 0).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(scheduler.add_process("", 1, 0).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(scheduler.queue().len(), 1);

        scheduler.clear();
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_compare() {
        let reports = scheduler(&[("P1", 5, 0), ("P2", 3, 0)]).compare(2).unwrap();
        let names: Vec<_> = reports.iter().map(|r| r.algorithm.name()).collect();
        assert_eq!(names, vec!["FCFS", "SJF", "Round Robin"]);
        assert!(reports.iter().all(|r| r.makespan() == 8));
    }

    #[test]
    fn test_log_ends_with_averages() {
        let report = scheduler(&[("P1", 5, 0), ("P2", 3, 1)]).run_fcfs();
        assert!(report.log.ends_with(
            "\nAverage Turnaround Time: 6.00\nAverage Waiting Time: 2.00\n"
        ));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(Algorithm::parse("FCFS", 2).unwrap(), Algorithm::Fcfs);
        assert_eq!(
            Algorithm::parse("round_robin", 4).unwrap(),
            Algorithm::RoundRobin { quantum: 4 }
        );
        assert_eq!(Algorithm::parse("lottery", 2).unwrap_err().code(), "UNKNOWN_POLICY");
        assert_eq!(Algorithm::RoundRobin { quantum: 3 }.to_string(), "Round Robin (q=3)");
    }
}
