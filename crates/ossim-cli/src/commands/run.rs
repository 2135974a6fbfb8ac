//! Scenario replay command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::Cell;
use ossim_engine::{Command, CommandOutput, Config, Simulator};
use serde::Serialize;

use crate::OutputFormat;
use crate::output::{self, Format};

/// One replayed command and its outcome.
#[derive(Serialize)]
struct StepOutput<'a> {
    step: usize,
    op: &'static str,
    #[serde(flatten)]
    outcome: &'a ossim_engine::Outcome<CommandOutput>,
}

/// One-line description of a command result.
fn describe(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Done => "ok".to_string(),
        CommandOutput::BlockIndex(index) => format!("block #{index}"),
        CommandOutput::Placement(p) => format!(
            "block #{} ({} units, {} unused)",
            p.index, p.block_size, p.internal_fragmentation
        ),
        CommandOutput::FrameCount(n) => format!("{n} frames"),
        CommandOutput::PageTable(table) => format!("{} pages", table.len()),
        CommandOutput::Policy(policy) => format!("policy {policy}"),
        CommandOutput::Access(a) => match (a.fault, a.evicted) {
            (false, _) => format!("hit: page {} in frame {}", a.page_id, a.frame_id),
            (true, None) => format!("fault: page {} -> frame {}", a.page_id, a.frame_id),
            (true, Some(old)) => format!(
                "fault: page {} -> frame {} (evicted {old})",
                a.page_id, a.frame_id
            ),
        },
        CommandOutput::Pattern(pages) => pages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        CommandOutput::Simulation(report) => format!(
            "{}: {} faults / {} accesses ({:.1}%)",
            report.policy,
            report.summary.page_faults,
            report.summary.total_accesses,
            report.summary.fault_rate * 100.0
        ),
        CommandOutput::Region(region) => format!(
            "{} [{}..={}]",
            region.name().unwrap_or("free"),
            region.base(),
            region.end()
        ),
        CommandOutput::Fragmentation(stats) => format!(
            "{} free in {} holes ({:.1}% fragmented)",
            stats.total_free, stats.free_blocks, stats.external_fragmentation
        ),
        CommandOutput::SegmentTable(rows) => {
            let placed = rows.iter().filter(|r| r.base.is_some()).count();
            format!("{placed}/{} segments placed", rows.len())
        }
        CommandOutput::Process(p) => format!(
            "{} queued (burst {}, arrival {})",
            p.process_id, p.burst_time, p.arrival_time
        ),
        CommandOutput::Schedule(report) => format!(
            "{}: avg TAT {:.2}, avg WT {:.2}",
            report.algorithm, report.avg_turnaround, report.avg_waiting
        ),
        CommandOutput::Comparison(reports) => reports
            .iter()
            .map(|r| format!("{} WT {:.2}", r.algorithm.name(), r.avg_waiting))
            .collect::<Vec<_>>()
            .join("; "),
        CommandOutput::Snapshot(snapshot) => format!(
            "{} blocks, {} frames, {} regions, {} processes",
            snapshot.contiguous.blocks.len(),
            snapshot.paging.frames.len(),
            snapshot.segmentation.regions.len(),
            snapshot.processes.len()
        ),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Run the scenario command.
pub fn run(
    scenario: &Path,
    config: Option<&Path>,
    strict: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(scenario)
        .with_context(|| format!("reading scenario {}", scenario.display()))?;
    let commands: Vec<Command> = serde_json::from_str(&text)
        .with_context(|| format!("parsing scenario {}", scenario.display()))?;

    let mut sim = Simulator::with_config(load_config(config)?)?;
    let names: Vec<&'static str> = commands.iter().map(Command::name).collect();
    let outcomes = sim.run_script(commands);

    let fmt: Format = format.into();
    match fmt {
        Format::Json => {
            let steps: Vec<StepOutput<'_>> = outcomes
                .iter()
                .zip(&names)
                .enumerate()
                .map(|(i, (outcome, op))| StepOutput {
                    step: i + 1,
                    op: *op,
                    outcome,
                })
                .collect();
            output::print_json(&steps, quiet)?;
        }
        Format::Table => {
            let mut table = output::create_table();
            output::add_header(&mut table, &["#", "Command", "Status", "Result"]);
            for (i, (outcome, op)) in outcomes.iter().zip(&names).enumerate() {
                let (status, detail) = match (&outcome.payload, &outcome.error) {
                    (Some(payload), _) => ("ok", describe(payload)),
                    (None, Some(error)) => (error.code, error.message.clone()),
                    (None, None) => ("ok", String::new()),
                };
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(op),
                    output::flag_cell(status, outcome.success),
                    Cell::new(detail),
                ]);
            }
            output::print_table(&format!("Scenario {}", scenario.display()), &table, quiet);
        }
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    let quiet = quiet || fmt.is_json();
    if failed == 0 {
        output::success(&format!("{} commands applied", outcomes.len()), quiet);
    } else if strict {
        bail!("{failed} of {} commands failed", outcomes.len());
    } else {
        output::status(&format!("{failed} of {} commands failed", outcomes.len()), quiet);
    }

    Ok(())
}
