//! Scriptable commands.
//!
//! A [`Command`] names one mutating operation (or the read-only
//! [`Command::Snapshot`]) in serialisable form, so whole scenarios can be
//! stored as JSON and replayed through [`Simulator::run_script`].
//!
//! ```json
//! [
//!   { "op": "add_block", "size": 200 },
//!   { "op": "allocate_block", "size": 120, "process_id": "P1", "strategy": "best-fit" },
//!   { "op": "run_scheduler", "algorithm": "rr", "quantum": 2 }
//! ]
//! ```
//!
//! [`Simulator::run_script`]: crate::Simulator::run_script

use ossim_common::{PageId, ProcessId, Protection, ReplacementPolicy, Tick};
use ossim_core::memory::{FragmentationStats, HoleStats, MemoryUsage, Placement};
use ossim_core::paging::{AccessOutcome, MemoryState, PageAccess, PageTableEntry, SimulationReport};
use ossim_core::scheduling::{ProcessDescriptor, ScheduleReport};
use ossim_core::segmentation::SegmentTableRow;
use ossim_core::{MemoryBlock, Region};
use serde::{Deserialize, Serialize};

/// One named segment request of a batch allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRequest {
    /// Segment name.
    pub name: String,
    /// Segment size.
    pub size: u64,
}

/// A simulator operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Re-initialises every component from the config.
    Reset,

    /// Appends a free fixed-size block.
    AddBlock { size: u64 },
    /// Allocates a block; the configured strategy applies if none is given.
    ///
    /// The strategy name is parsed when the command runs, so an unknown
    /// name fails this command alone with `UNKNOWN_POLICY`.
    AllocateBlock {
        size: u64,
        process_id: ProcessId,
        #[serde(default)]
        strategy: Option<String>,
    },
    /// Frees the block owned by a process.
    DeallocateBlock { process_id: ProcessId },
    /// Removes every block.
    ClearBlocks,

    /// Resets physical memory.
    InitializePaging { memory_size: u64, page_size: u64 },
    /// Builds a page table; the current page size applies if none is given.
    CreatePageTable {
        process_id: ProcessId,
        process_size: u64,
        #[serde(default)]
        page_size: Option<u64>,
    },
    /// Switches the replacement policy by name.
    SetReplacementPolicy { policy: String },
    /// Accesses a single page.
    AccessPage {
        page_id: PageId,
        #[serde(default)]
        is_write: bool,
    },
    /// Generates a reference string with the simulator's RNG.
    GenerateAccessPattern {
        page_count: u32,
        access_count: usize,
        #[serde(default)]
        locality: Option<f64>,
    },
    /// Replays a reference string, drawing write flags from the RNG.
    SimulateAccessPattern {
        sequence: Vec<PageId>,
        #[serde(default)]
        write_ratio: Option<f64>,
    },
    /// Replays accesses with explicit write flags.
    Simulate { accesses: Vec<PageAccess> },

    /// Resets the segmented address space.
    InitializeSegments { total_size: u64 },
    /// Places one segment.
    AllocateSegment {
        name: String,
        size: u64,
        #[serde(default)]
        protection: Option<Protection>,
    },
    /// Frees a segment by name.
    DeallocateSegment { name: String },
    /// Re-initialises the space and places every request in turn.
    AllocateSegments {
        total_size: u64,
        segments: Vec<SegmentRequest>,
    },
    /// Compacts the address space.
    Compact,

    /// Submits a process to the scheduler queue.
    AddProcess {
        process_id: ProcessId,
        burst_time: Tick,
        #[serde(default)]
        arrival_time: Tick,
    },
    /// Empties the scheduler queue.
    ClearProcesses,
    /// Runs one policy by name (`fcfs`, `sjf`, `rr`).
    RunScheduler {
        algorithm: String,
        #[serde(default)]
        quantum: Option<Tick>,
    },
    /// Runs all three policies over the queue.
    CompareSchedulers {
        #[serde(default)]
        quantum: Option<Tick>,
    },

    /// Captures every component's state without changing it.
    Snapshot,
}

impl Command {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::AddBlock { .. } => "add_block",
            Self::AllocateBlock { .. } => "allocate_block",
            Self::DeallocateBlock { .. } => "deallocate_block",
            Self::ClearBlocks => "clear_blocks",
            Self::InitializePaging { .. } => "initialize_paging",
            Self::CreatePageTable { .. } => "create_page_table",
            Self::SetReplacementPolicy { .. } => "set_replacement_policy",
            Self::AccessPage { .. } => "access_page",
            Self::GenerateAccessPattern { .. } => "generate_access_pattern",
            Self::SimulateAccessPattern { .. } => "simulate_access_pattern",
            Self::Simulate { .. } => "simulate",
            Self::InitializeSegments { .. } => "initialize_segments",
            Self::AllocateSegment { .. } => "allocate_segment",
            Self::DeallocateSegment { .. } => "deallocate_segment",
            Self::AllocateSegments { .. } => "allocate_segments",
            Self::Compact => "compact",
            Self::AddProcess { .. } => "add_process",
            Self::ClearProcesses => "clear_processes",
            Self::RunScheduler { .. } => "run_scheduler",
            Self::CompareSchedulers { .. } => "compare_schedulers",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Contiguous allocator view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContiguousSnapshot {
    /// Blocks in physical order.
    pub blocks: Vec<MemoryBlock>,
    /// Internal and external fragmentation.
    pub fragmentation: FragmentationStats,
    /// Usage summary.
    pub usage: MemoryUsage,
}

/// Segmentation view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSnapshot {
    /// Regions in address order.
    pub regions: Vec<Region>,
    /// Hole statistics.
    pub fragmentation: HoleStats,
}

/// State of every component at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Contiguous allocator.
    pub contiguous: ContiguousSnapshot,
    /// Frames, page table and counters.
    pub paging: MemoryState,
    /// Segmented address space.
    pub segmentation: SegmentSnapshot,
    /// Scheduler queue in submission order.
    pub processes: Vec<ProcessDescriptor>,
}

/// Payload of a successful command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandOutput {
    /// Nothing to report.
    Done,
    /// Index of a new or freed block.
    BlockIndex(usize),
    /// Where an allocation landed.
    Placement(Placement),
    /// Number of frames after initialisation.
    FrameCount(usize),
    /// Freshly built page table.
    PageTable(Vec<PageTableEntry>),
    /// Active replacement policy.
    Policy(ReplacementPolicy),
    /// Outcome of one page access.
    Access(AccessOutcome),
    /// Generated reference string.
    Pattern(Vec<PageId>),
    /// Batch paging report.
    Simulation(SimulationReport),
    /// Placed segment or resulting hole.
    Region(Region),
    /// Hole statistics after compaction.
    Fragmentation(HoleStats),
    /// Batch segment table.
    SegmentTable(Vec<SegmentTableRow>),
    /// Queued process.
    Process(ProcessDescriptor),
    /// One scheduling run.
    Schedule(Box<ScheduleReport>),
    /// FCFS, SJF and round robin over the same queue.
    Comparison(Vec<ScheduleReport>),
    /// Full state capture.
    Snapshot(Box<Snapshot>),
}
