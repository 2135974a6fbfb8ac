//! Demand paging.
//!
//! A [`PagingManager`] owns the physical frames and the page table of one
//! process. Every access either hits a resident page or faults; a fault fills
//! an empty frame if there is one and otherwise evicts a page chosen by the
//! active [`ReplacementPolicy`].
//!
//! Time is a logical clock that advances once per access. Load and use stamps
//! are therefore strictly ordered, which keeps FIFO and LRU deterministic.
//!
//! Optimal replacement needs the rest of the reference string, so it only runs
//! through [`PagingManager::simulate`] and [`PagingManager::simulate_access_pattern`];
//! a single [`PagingManager::access_page`] under Optimal is rejected.

mod frame;
pub mod pattern;
mod replacement;
mod table;

pub use frame::Frame;
pub use pattern::{StaticLayout, generate_access_pattern, static_layout};
pub use table::PageTableEntry;

use ossim_common::utils::error::{ensure_positive, ensure_ratio, ensure_u32};
use ossim_common::{Error, FrameId, PageId, ProcessId, ReplacementPolicy, Result, Tick};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Physical memory size used by [`PagingManager::default`].
pub const DEFAULT_MEMORY_SIZE: u64 = 4096;
/// Page size used by [`PagingManager::default`].
pub const DEFAULT_PAGE_SIZE: u64 = 1024;

/// Result of a single page access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessOutcome {
    /// The accessed page.
    pub page_id: PageId,
    /// Frame holding the page after the access.
    pub frame_id: FrameId,
    /// True if the page was not resident.
    pub fault: bool,
    /// Page evicted to make room, if any.
    pub evicted: Option<PageId>,
}

impl AccessOutcome {
    /// Returns true if the page was already resident.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        !self.fault
    }
}

/// One access of a reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAccess {
    /// Page to touch.
    pub page_id: PageId,
    /// Whether the access writes the page.
    #[serde(default)]
    pub is_write: bool,
}

impl PageAccess {
    /// A read access.
    #[must_use]
    pub fn read(page: u32) -> Self {
        Self {
            page_id: PageId::new(page),
            is_write: false,
        }
    }

    /// A write access.
    #[must_use]
    pub fn write(page: u32) -> Self {
        Self {
            page_id: PageId::new(page),
            is_write: true,
        }
    }
}

/// An access together with its position in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    /// Position in the reference string.
    pub access_index: usize,
    /// Whether the access wrote the page.
    pub is_write: bool,
    /// What happened.
    pub outcome: AccessOutcome,
}

/// Aggregate figures of a batch simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Number of accesses replayed.
    pub total_accesses: usize,
    /// Faults among them.
    pub page_faults: usize,
    /// Hits among them.
    pub page_hits: usize,
    /// `page_faults / total_accesses`, 0 for an empty batch.
    pub fault_rate: f64,
    /// `page_hits / total_accesses`, 0 for an empty batch.
    pub hit_rate: f64,
}

/// Per-access outcomes and totals of a batch simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Policy the batch ran under.
    pub policy: ReplacementPolicy,
    /// One record per access, in order.
    pub results: Vec<AccessRecord>,
    /// Totals over `results`.
    pub summary: SimulationSummary,
}

/// Lifetime counters of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PagingStats {
    /// Faults since the last initialisation.
    pub page_faults: u64,
    /// Hits since the last initialisation.
    pub page_hits: u64,
    /// Faults over recorded accesses, 0 before the first access.
    pub fault_rate: f64,
    /// Occupied frames over total frames.
    pub utilization: f64,
}

/// Snapshot of frames, page table and counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryState {
    /// Active replacement policy.
    pub policy: ReplacementPolicy,
    /// Physical frames in order.
    pub frames: Vec<Frame>,
    /// Page table of the current process.
    pub page_table: Vec<PageTableEntry>,
    /// Counters.
    pub stats: PagingStats,
}

/// Physical frames plus one process's page table.
#[derive(Debug, Clone)]
pub struct PagingManager {
    page_size: u64,
    frames: Vec<Frame>,
    page_table: Vec<PageTableEntry>,
    policy: ReplacementPolicy,
    history: Vec<PageId>,
    page_faults: u64,
    page_hits: u64,
    clock_hand: usize,
    now: Tick,
}

impl Default for PagingManager {
    /// Four 1 KiB frames, FIFO, no page table.
    fn default() -> Self {
        let frame_count = (DEFAULT_MEMORY_SIZE / DEFAULT_PAGE_SIZE) as u32;
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            frames: (0..frame_count).map(|i| Frame::empty(FrameId::new(i))).collect(),
            page_table: Vec::new(),
            policy: ReplacementPolicy::default(),
            history: Vec::new(),
            page_faults: 0,
            page_hits: 0,
            clock_hand: 0,
            now: 0,
        }
    }
}

impl PagingManager {
    /// Creates a manager with `memory_size / page_size` empty frames.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either size is zero or memory is smaller
    /// than one page.
    pub fn new(memory_size: u64, page_size: u64) -> Result<Self> {
        let mut manager = Self::default();
        manager.initialize_physical_memory(memory_size, page_size)?;
        Ok(manager)
    }

    /// Resets physical memory to `floor(memory_size / page_size)` empty frames.
    ///
    /// Counters, access history, the Clock hand and the logical clock are
    /// reset too. The replacement policy and the page table layout are kept;
    /// every page becomes non-resident. Returns the frame count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either size is zero, memory is smaller
    /// than one page, or the frame count does not fit in a `u32`. State is
    /// untouched on error.
    pub fn initialize_physical_memory(&mut self, memory_size: u64, page_size: u64) -> Result<usize> {
        ensure_positive("memory size", memory_size)?;
        ensure_positive("page size", page_size)?;
        let frame_count = memory_size / page_size;
        if frame_count == 0 {
            return Err(Error::invalid(format!(
                "memory size {memory_size} holds no page of size {page_size}"
            )));
        }
        let frame_count = ensure_u32("frame count", frame_count)?;

        self.page_size = page_size;
        self.frames = (0..frame_count)
            .map(|i| Frame::empty(FrameId::new(i)))
            .collect();
        self.page_table.iter_mut().for_each(PageTableEntry::invalidate);
        self.history.clear();
        self.page_faults = 0;
        self.page_hits = 0;
        self.clock_hand = 0;
        self.now = 0;
        Ok(self.frames.len())
    }

    /// Builds a page table of `ceil(process_size / page_size)` invalid entries.
    ///
    /// The new table replaces the previous process's table, so every frame is
    /// emptied: pages of the old process have nothing left to map them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero size, an empty process id, or a page
    /// count that does not fit in a `u32`.
    pub fn create_page_table(
        &mut self,
        process_id: ProcessId,
        process_size: u64,
        page_size: u64,
    ) -> Result<&[PageTableEntry]> {
        ensure_positive("process size", process_size)?;
        ensure_positive("page size", page_size)?;
        if process_id.is_empty() {
            return Err(Error::invalid("process id must not be empty"));
        }

        let page_count = ensure_u32("page count", process_size.div_ceil(page_size))?;
        self.page_table = (0..page_count)
            .map(|i| PageTableEntry::new(process_id.clone(), PageId::new(i)))
            .collect();
        for frame in &mut self.frames {
            *frame = Frame::empty(frame.frame_id);
        }
        self.clock_hand = 0;
        Ok(&self.page_table)
    }

    /// Switches the replacement policy used by subsequent faults.
    pub fn set_policy(&mut self, policy: ReplacementPolicy) {
        self.policy = policy;
    }

    /// Parses and sets a replacement policy by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPolicy` for names outside FIFO, LRU, Optimal, Clock.
    pub fn set_replacement_policy(&mut self, name: &str) -> Result<ReplacementPolicy> {
        let policy = name.parse()?;
        self.set_policy(policy);
        Ok(policy)
    }

    /// Accesses one page, step by step.
    ///
    /// # Errors
    ///
    /// - `PageNotFound` if the page is outside the page table
    /// - `LookaheadRequired` while the Optimal policy is active
    pub fn access_page(&mut self, page_id: PageId, is_write: bool) -> Result<AccessOutcome> {
        self.check_page(page_id)?;
        if self.policy.requires_lookahead() {
            return Err(Error::LookaheadRequired(self.policy));
        }
        self.access(page_id, is_write, None)
    }

    /// Replays a reference string with explicit read/write flags.
    ///
    /// Every page is checked before the first access, so an invalid page
    /// leaves the manager untouched.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` if any page is outside the page table.
    pub fn simulate(&mut self, accesses: &[PageAccess]) -> Result<SimulationReport> {
        for access in accesses {
            self.check_page(access.page_id)?;
        }

        let pages: Vec<PageId> = accesses.iter().map(|a| a.page_id).collect();
        let mut results = Vec::with_capacity(accesses.len());
        for (access_index, access) in accesses.iter().enumerate() {
            let future = &pages[access_index + 1..];
            let outcome = self.access(access.page_id, access.is_write, Some(future))?;
            results.push(AccessRecord {
                access_index,
                is_write: access.is_write,
                outcome,
            });
        }

        let total_accesses = results.len();
        let page_faults = results.iter().filter(|r| r.outcome.fault).count();
        let page_hits = total_accesses - page_faults;
        let rate = |n: usize| {
            if total_accesses == 0 {
                0.0
            } else {
                n as f64 / total_accesses as f64
            }
        };

        Ok(SimulationReport {
            policy: self.policy,
            summary: SimulationSummary {
                total_accesses,
                page_faults,
                page_hits,
                fault_rate: rate(page_faults),
                hit_rate: rate(page_hits),
            },
            results,
        })
    }

    /// Replays a reference string, marking each access as a write with
    /// probability `write_ratio`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `write_ratio` lies outside `[0, 1]`
    /// - `PageNotFound` if any page is outside the page table
    pub fn simulate_access_pattern<R: Rng>(
        &mut self,
        sequence: &[PageId],
        write_ratio: f64,
        rng: &mut R,
    ) -> Result<SimulationReport> {
        ensure_ratio("write ratio", write_ratio)?;
        let accesses: Vec<PageAccess> = sequence
            .iter()
            .map(|&page_id| PageAccess {
                page_id,
                is_write: rng.gen_bool(write_ratio),
            })
            .collect();
        self.simulate(&accesses)
    }

    fn check_page(&self, page_id: PageId) -> Result<()> {
        if page_id.index() < self.page_table.len() {
            Ok(())
        } else {
            Err(Error::PageNotFound(page_id))
        }
    }

    /// Resolves one access. The page must already be known to exist.
    fn access(
        &mut self,
        page_id: PageId,
        is_write: bool,
        future: Option<&[PageId]>,
    ) -> Result<AccessOutcome> {
        let entry = &self.page_table[page_id.index()];

        if let Some(frame_id) = entry.frame_id.filter(|_| entry.valid) {
            self.tick(page_id);
            let now = self.now;
            self.page_hits += 1;
            self.frames[frame_id.index()].touch(is_write, now);
            self.page_table[page_id.index()].touch(is_write, now);
            return Ok(AccessOutcome {
                page_id,
                frame_id,
                fault: false,
                evicted: None,
            });
        }

        // Pick the target before touching any state, so a refused Optimal
        // selection leaves the manager as it was.
        let target = match self.frames.iter().position(Frame::is_empty) {
            Some(index) => index,
            None => replacement::select_victim(
                self.policy,
                &mut self.frames,
                &mut self.clock_hand,
                future,
            )?,
        };

        self.tick(page_id);
        let now = self.now;
        self.page_faults += 1;

        let frame = &mut self.frames[target];
        let evicted = frame.page_id;
        if let Some(old) = evicted {
            self.page_table[old.index()].invalidate();
        }
        frame.load(page_id, is_write, now);
        let frame_id = frame.frame_id;
        self.page_table[page_id.index()].install(frame_id, is_write, now);

        Ok(AccessOutcome {
            page_id,
            frame_id,
            fault: true,
            evicted,
        })
    }

    fn tick(&mut self, page_id: PageId) {
        self.now += 1;
        self.history.push(page_id);
    }

    /// Returns the active replacement policy.
    #[must_use]
    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    /// Returns the page size of physical memory.
    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Returns the frames in order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the page table.
    #[must_use]
    pub fn page_table(&self) -> &[PageTableEntry] {
        &self.page_table
    }

    /// Returns every page accessed since initialisation, in order.
    #[must_use]
    pub fn history(&self) -> &[PageId] {
        &self.history
    }

    /// Returns the pages currently resident, in frame order.
    pub fn resident_pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.frames.iter().filter_map(|f| f.page_id)
    }

    /// Returns the lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PagingStats {
        let accesses = self.history.len();
        let occupied = self.frames.iter().filter(|f| !f.is_empty()).count();
        PagingStats {
            page_faults: self.page_faults,
            page_hits: self.page_hits,
            fault_rate: if accesses > 0 {
                self.page_faults as f64 / accesses as f64
            } else {
                0.0
            },
            utilization: occupied as f64 / self.frames.len() as f64,
        }
    }

    /// Returns a snapshot of frames, page table and counters.
    #[must_use]
    pub fn memory_state(&self) -> MemoryState {
        MemoryState {
            policy: self.policy,
            frames: self.frames.clone(),
            page_table: self.page_table.clone(),
            stats: self.stats(),
        }
    }
}
