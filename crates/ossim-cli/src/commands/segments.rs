//! Segmentation layout command.

use anyhow::{Result, bail};
use comfy_table::Cell;
use ossim_core::memory::HoleStats;
use ossim_core::segmentation::SegmentTableRow;
use ossim_core::Region;
use ossim_engine::command::SegmentRequest;
use ossim_engine::{Command, CommandOutput, Config, Simulator};
use serde::Serialize;

use crate::OutputFormat;
use crate::output::{self, Format};

/// Segmentation result output.
#[derive(Serialize)]
struct SegmentsOutput {
    total_size: u64,
    table: Vec<SegmentTableRow>,
    regions: Vec<Region>,
    fragmentation: HoleStats,
}

/// Run the segments command.
pub fn run(
    size: u64,
    segments: &[(String, u64)],
    free: &[String],
    compact: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut sim = Simulator::with_config(Config::default().with_segment_space(size))?;

    let table = match sim.execute(Command::AllocateSegments {
        total_size: size,
        segments: segments
            .iter()
            .map(|(name, size)| SegmentRequest {
                name: name.clone(),
                size: *size,
            })
            .collect(),
    })? {
        CommandOutput::SegmentTable(rows) => rows,
        other => bail!("unexpected output {other:?}"),
    };

    for name in free {
        sim.execute(Command::DeallocateSegment { name: name.clone() })?;
    }
    if compact {
        sim.execute(Command::Compact)?;
    }

    let manager = sim.segmentation();
    let output = SegmentsOutput {
        total_size: manager.total_size(),
        table,
        regions: manager.regions().to_vec(),
        fragmentation: manager.fragmentation(),
    };

    let fmt: Format = format.into();
    match fmt {
        Format::Json => output::print_json(&output, quiet)?,
        Format::Table => {
            let mut table = output::create_table();
            output::add_header(&mut table, &["Segment", "Base", "Limit", "Protection"]);
            for row in &output.table {
                table.add_row(vec![
                    Cell::new(&row.segment),
                    match row.base {
                        Some(base) => Cell::new(base),
                        None => output::flag_cell(row.error.as_deref().unwrap_or("unplaced"), false),
                    },
                    Cell::new(row.limit),
                    Cell::new(row.protection.map_or_else(|| "-".to_string(), |p| p.to_string())),
                ]);
            }
            output::print_table("Segment table", &table, quiet);

            let mut table = output::create_table();
            output::add_header(&mut table, &["Region", "Base", "End", "Size"]);
            for region in &output.regions {
                table.add_row(vec![
                    output::flag_cell(region.name().unwrap_or("free"), region.is_free()),
                    Cell::new(region.base()),
                    Cell::new(region.end()),
                    Cell::new(region.size()),
                ]);
            }
            output::print_table(&format!("Address space ({} units)", output.total_size), &table, quiet);

            let stats = &output.fragmentation;
            output::print_key_value_table(
                &[
                    ("Free", stats.total_free.to_string()),
                    ("Holes", stats.free_blocks.to_string()),
                    ("Largest Hole", stats.largest_free.to_string()),
                    (
                        "External Fragmentation",
                        format!("{:.1}%", stats.external_fragmentation),
                    ),
                ],
                quiet,
            );
        }
    }

    Ok(())
}
