//! Fixed-block allocation command.

use anyhow::Result;
use comfy_table::Cell;
use ossim_common::{FitStrategy, ProcessId};
use ossim_core::memory::{FragmentationStats, MemoryBlock, MemoryUsage};
use ossim_engine::{Command, CommandOutput, Config, Simulator};
use serde::Serialize;

use crate::OutputFormat;
use crate::output::{self, Format};

/// Result of one allocation request.
#[derive(Serialize)]
struct RequestOutput {
    process_id: String,
    size: u64,
    block: Option<usize>,
    error: Option<String>,
}

/// Allocation result output.
#[derive(Serialize)]
struct BlocksOutput {
    strategy: FitStrategy,
    requests: Vec<RequestOutput>,
    blocks: Vec<MemoryBlock>,
    fragmentation: FragmentationStats,
    usage: MemoryUsage,
}

/// Run the blocks command.
pub fn run(
    blocks: &[u64],
    requests: &[(String, u64)],
    free: &[String],
    strategy: &str,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let strategy: FitStrategy = strategy.parse()?;
    let mut sim = Simulator::with_config(
        Config::default()
            .with_blocks(blocks.to_vec())
            .with_fit_strategy(strategy),
    )?;

    let requests = requests
        .iter()
        .map(|(pid, size)| {
            let outcome = sim.apply(Command::AllocateBlock {
                size: *size,
                process_id: ProcessId::new(pid.as_str()),
                strategy: None,
            });
            let block = match outcome.payload {
                Some(CommandOutput::Placement(p)) => Some(p.index),
                _ => None,
            };
            RequestOutput {
                process_id: pid.clone(),
                size: *size,
                block,
                error: outcome.error.map(|e| e.message),
            }
        })
        .collect::<Vec<_>>();

    for pid in free {
        sim.execute(Command::DeallocateBlock {
            process_id: ProcessId::new(pid.as_str()),
        })?;
    }

    let allocator = sim.contiguous();
    let output = BlocksOutput {
        strategy,
        requests,
        blocks: allocator.blocks().to_vec(),
        fragmentation: allocator.fragmentation(),
        usage: allocator.usage(),
    };

    let fmt: Format = format.into();
    match fmt {
        Format::Json => output::print_json(&output, quiet)?,
        Format::Table => {
            let mut table = output::create_table();
            output::add_header(&mut table, &["Process", "Size", "Block", "Result"]);
            for r in &output.requests {
                table.add_row(vec![
                    Cell::new(&r.process_id),
                    Cell::new(r.size),
                    Cell::new(r.block.map_or_else(|| "-".to_string(), |b| b.to_string())),
                    output::flag_cell(r.error.as_deref().unwrap_or("allocated"), r.error.is_none()),
                ]);
            }
            output::print_table(&format!("Requests ({})", strategy.name()), &table, quiet);

            let mut table = output::create_table();
            output::add_header(&mut table, &["#", "Size", "Status", "Process", "Used", "Unused"]);
            for (i, block) in output.blocks.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i),
                    Cell::new(block.size()),
                    output::flag_cell(
                        if block.is_allocated() { "allocated" } else { "free" },
                        !block.is_allocated(),
                    ),
                    Cell::new(block.process_id().map_or("-", ProcessId::as_str)),
                    Cell::new(block.process_size().unwrap_or(0)),
                    Cell::new(block.internal_fragmentation()),
                ]);
            }
            output::print_table("Blocks", &table, quiet);

            let items = vec![
                ("Total", output.usage.total.to_string()),
                (
                    "Allocated",
                    format!(
                        "{} ({:.1}%)",
                        output.usage.allocated, output.usage.allocation_percent
                    ),
                ),
                ("Internal Fragmentation", output.fragmentation.internal.to_string()),
                ("External Fragmentation", output.fragmentation.external.to_string()),
            ];
            output::print_key_value_table(&items, quiet);
        }
    }

    Ok(())
}
