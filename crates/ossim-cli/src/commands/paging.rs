//! Demand-paging simulation command.

use anyhow::{Context, Result, bail};
use comfy_table::Cell;
use ossim_common::{PageId, ProcessId, ReplacementPolicy};
use ossim_core::paging::SimulationReport;
use ossim_engine::{Command, CommandOutput, Config, Simulator};
use serde::Serialize;

use crate::OutputFormat;
use crate::output::{self, Format};

/// Page size used for the simulated process; only frame and page counts matter.
const PAGE_SIZE: u64 = 1024;

/// Arguments of the paging command.
pub struct PagingArgs {
    pub pages: u32,
    pub accesses: usize,
    pub frames: u64,
    pub policy: String,
    pub locality: Option<f64>,
    pub write_ratio: Option<f64>,
    pub seed: Option<u64>,
    pub pattern: Option<Vec<u32>>,
}

/// Paging result output.
#[derive(Serialize)]
struct PagingOutput {
    frames: u64,
    pages: u32,
    pattern: Vec<PageId>,
    reports: Vec<SimulationReport>,
}

fn policies(name: &str) -> Result<Vec<ReplacementPolicy>> {
    if name.eq_ignore_ascii_case("all") {
        Ok(ReplacementPolicy::ALL.to_vec())
    } else {
        Ok(vec![name.parse()?])
    }
}

/// Run the paging command.
pub fn run(args: &PagingArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let policies = policies(&args.policy)?;
    let Some(memory_size) = args.frames.checked_mul(PAGE_SIZE) else {
        bail!("{} frames of {PAGE_SIZE} units overflow the memory size", args.frames);
    };
    let mut config = Config::default().with_memory(memory_size, PAGE_SIZE);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let mut sim = Simulator::with_config(config)?;

    let pattern = match &args.pattern {
        Some(pages) => pages.iter().copied().map(PageId::new).collect(),
        None => match sim.execute(Command::GenerateAccessPattern {
            page_count: args.pages,
            access_count: args.accesses,
            locality: args.locality,
        })? {
            CommandOutput::Pattern(pattern) => pattern,
            other => bail!("unexpected output {other:?}"),
        },
    };
    let pages = match pattern.iter().map(|p| p.as_u32()).max() {
        Some(highest) => highest
            .checked_add(1)
            .with_context(|| format!("page {highest} is out of range"))?,
        None => 0,
    }
    .max(args.pages);

    sim.execute(Command::CreatePageTable {
        process_id: ProcessId::new("P1"),
        process_size: u64::from(pages) * PAGE_SIZE,
        page_size: None,
    })?;

    let mut reports = Vec::with_capacity(policies.len());
    for policy in policies {
        sim.execute(Command::InitializePaging {
            memory_size,
            page_size: PAGE_SIZE,
        })?;
        sim.execute(Command::SetReplacementPolicy {
            policy: policy.name().to_string(),
        })?;
        match sim.execute(Command::SimulateAccessPattern {
            sequence: pattern.clone(),
            write_ratio: args.write_ratio,
        })? {
            CommandOutput::Simulation(report) => reports.push(report),
            other => bail!("unexpected output {other:?}"),
        }
    }

    let output = PagingOutput {
        frames: args.frames,
        pages,
        pattern,
        reports,
    };

    let fmt: Format = format.into();
    match fmt {
        Format::Json => output::print_json(&output, quiet)?,
        Format::Table => {
            let reference = output
                .pattern
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            output::status(&format!("Reference string: {reference}"), quiet);

            if let [report] = output.reports.as_slice() {
                let mut table = output::create_table();
                output::add_header(&mut table, &["#", "Page", "Access", "Result", "Frame", "Evicted"]);
                for record in &report.results {
                    let outcome = &record.outcome;
                    table.add_row(vec![
                        Cell::new(record.access_index + 1),
                        Cell::new(outcome.page_id),
                        Cell::new(if record.is_write { "W" } else { "R" }),
                        output::flag_cell(if outcome.fault { "FAULT" } else { "HIT" }, !outcome.fault),
                        Cell::new(outcome.frame_id),
                        Cell::new(outcome.evicted.map_or_else(|| "-".to_string(), |p| p.to_string())),
                    ]);
                }
                output::print_table(&format!("{} accesses", report.policy), &table, quiet);
            }

            let mut table = output::create_table();
            output::add_header(&mut table, &["Policy", "Faults", "Hits", "Fault Rate", "Hit Rate"]);
            for report in &output.reports {
                let s = &report.summary;
                table.add_row(vec![
                    Cell::new(report.policy),
                    Cell::new(s.page_faults),
                    Cell::new(s.page_hits),
                    Cell::new(format!("{:.1}%", s.fault_rate * 100.0)),
                    Cell::new(format!("{:.1}%", s.hit_rate * 100.0)),
                ]);
            }
            output::print_table(
                &format!("{} frames, {} pages", output.frames, output.pages),
                &table,
                quiet,
            );
        }
    }

    Ok(())
}
