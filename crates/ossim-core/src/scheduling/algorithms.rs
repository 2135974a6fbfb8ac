//! The three scheduling loops.
//!
//! Each takes the processes already sorted by arrival time (stable, so equal
//! arrivals keep submission order) and drives a [`Timeline`]. Completed
//! processes are returned in completion order.

use std::collections::VecDeque;

use ossim_common::Tick;

use super::gantt::Timeline;
use super::process::ProcessDescriptor;

/// First come, first served: run to completion in arrival order.
pub(crate) fn fcfs(processes: &mut [ProcessDescriptor], timeline: &mut Timeline) -> Vec<usize> {
    for process in processes.iter_mut() {
        timeline.idle_until(process.arrival_time);
        process.admit();
        let burst = process.remaining;
        timeline.execute(process, burst);
        timeline.complete(process);
    }
    (0..processes.len()).collect()
}

/// Non-preemptive shortest job first.
///
/// Among arrived processes the shortest burst wins; ties fall to the earlier
/// arrival, then to submission order.
pub(crate) fn sjf(processes: &mut [ProcessDescriptor], timeline: &mut Timeline) -> Vec<usize> {
    let mut order = Vec::with_capacity(processes.len());

    while order.len() < processes.len() {
        let now = timeline.now;
        let shortest = processes
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_terminated() && p.arrival_time <= now)
            .min_by_key(|(_, p)| p.burst_time)
            .map(|(index, _)| index);

        match shortest {
            Some(index) => {
                let process = &mut processes[index];
                process.admit();
                let burst = process.remaining;
                timeline.execute(process, burst);
                timeline.complete(process);
                order.push(index);
            }
            None => {
                let next_arrival = processes
                    .iter()
                    .filter(|p| !p.is_terminated())
                    .map(|p| p.arrival_time)
                    .min()
                    .unwrap_or(now);
                timeline.idle_until(next_arrival);
            }
        }
    }

    order
}

/// Round robin with a fixed quantum.
///
/// Processes that arrive during a slice join the ready queue before the
/// preempted process goes back to its tail.
pub(crate) fn round_robin(
    processes: &mut [ProcessDescriptor],
    quantum: Tick,
    timeline: &mut Timeline,
) -> Vec<usize> {
    debug_assert!(quantum > 0);

    let mut order = Vec::with_capacity(processes.len());
    let mut ready: VecDeque<usize> = VecDeque::new();
    let mut next_arrival = 0;

    let admit = |processes: &mut [ProcessDescriptor],
                 ready: &mut VecDeque<usize>,
                 next_arrival: &mut usize,
                 now: Tick| {
        while *next_arrival < processes.len() && processes[*next_arrival].arrival_time <= now {
            processes[*next_arrival].admit();
            ready.push_back(*next_arrival);
            *next_arrival += 1;
        }
    };

    loop {
        admit(processes, &mut ready, &mut next_arrival, timeline.now);

        let Some(index) = ready.pop_front() else {
            match processes.get(next_arrival) {
                Some(upcoming) => {
                    timeline.idle_until(upcoming.arrival_time);
                    continue;
                }
                None => break,
            }
        };

        let process = &mut processes[index];
        let slice = process.remaining.min(quantum);
        timeline.execute(process, slice);

        admit(processes, &mut ready, &mut next_arrival, timeline.now);

        let process = &mut processes[index];
        if process.remaining == 0 {
            timeline.complete(process);
            order.push(index);
        } else {
            process.preempt();
            ready.push_back(index);
        }
    }

    order
}
