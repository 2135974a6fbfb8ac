//! CPU scheduling command.

use anyhow::{Result, bail};
use comfy_table::Cell;
use ossim_common::ProcessId;
use ossim_core::scheduling::{ScheduleReport, SliceKind};
use ossim_engine::{Command, CommandOutput, Simulator};

use super::ProcessSpec;
use crate::OutputFormat;
use crate::output::{self, Format};

fn print_report(report: &ScheduleReport, quiet: bool) {
    output::status(report.log.trim_end(), quiet);

    let mut table = output::create_table();
    output::add_header(&mut table, &["Slice", "Start", "End"]);
    for entry in &report.gantt {
        table.add_row(vec![
            output::flag_cell(&entry.id, entry.kind == SliceKind::Process),
            Cell::new(entry.start),
            Cell::new(entry.end),
        ]);
    }
    output::print_table(&format!("{} timeline", report.algorithm), &table, quiet);

    let mut table = output::create_table();
    output::add_header(
        &mut table,
        &["Process", "Arrival", "Burst", "Finish", "Turnaround", "Waiting"],
    );
    for m in &report.metrics {
        table.add_row(vec![
            Cell::new(&m.id),
            Cell::new(m.at),
            Cell::new(m.bt),
            Cell::new(m.ft),
            Cell::new(m.tat),
            Cell::new(m.wt),
        ]);
    }
    output::print_table(&format!("{} metrics", report.algorithm), &table, quiet);

    output::print_key_value_table(
        &[
            ("Average Turnaround", format!("{:.2}", report.avg_turnaround)),
            ("Average Waiting", format!("{:.2}", report.avg_waiting)),
            ("Makespan", report.makespan().to_string()),
            ("CPU Utilization", format!("{:.1}%", report.cpu_utilization())),
        ],
        quiet,
    );
}

fn print_comparison(reports: &[ScheduleReport], quiet: bool) {
    let mut table = output::create_table();
    output::add_header(
        &mut table,
        &["Algorithm", "Avg Turnaround", "Avg Waiting", "Makespan", "CPU Utilization"],
    );
    for report in reports {
        table.add_row(vec![
            Cell::new(report.algorithm),
            Cell::new(format!("{:.2}", report.avg_turnaround)),
            Cell::new(format!("{:.2}", report.avg_waiting)),
            Cell::new(report.makespan()),
            Cell::new(format!("{:.1}%", report.cpu_utilization())),
        ]);
    }
    output::print_table("Comparison", &table, quiet);
}

/// Run the schedule command.
pub fn run(
    processes: &[ProcessSpec],
    algorithm: &str,
    quantum: u64,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut sim = Simulator::new();
    for p in processes {
        sim.execute(Command::AddProcess {
            process_id: ProcessId::new(p.id.as_str()),
            burst_time: p.burst,
            arrival_time: p.arrival,
        })?;
    }

    let command = if algorithm.eq_ignore_ascii_case("all") {
        Command::CompareSchedulers {
            quantum: Some(quantum),
        }
    } else {
        Command::RunScheduler {
            algorithm: algorithm.to_string(),
            quantum: Some(quantum),
        }
    };
    let reports = match sim.execute(command)? {
        CommandOutput::Schedule(report) => vec![*report],
        CommandOutput::Comparison(reports) => reports,
        other => bail!("unexpected output {other:?}"),
    };

    let fmt: Format = format.into();
    match fmt {
        Format::Json => output::print_json(&reports, quiet)?,
        Format::Table => {
            for report in &reports {
                print_report(report, quiet);
            }
            if reports.len() > 1 {
                print_comparison(&reports, quiet);
            }
        }
    }

    Ok(())
}
