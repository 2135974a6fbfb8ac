//! Per-process page table.

use ossim_common::{FrameId, PageId, ProcessId, Tick};
use serde::Serialize;

/// One page of a process and where it currently lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageTableEntry {
    /// Owning process.
    pub process_id: ProcessId,
    /// Page number within the process.
    pub page_id: PageId,
    /// Frame holding the page while it is valid.
    pub frame_id: Option<FrameId>,
    /// True iff the page is resident in `frame_id`.
    pub valid: bool,
    /// Reference bit.
    pub referenced: bool,
    /// Dirty bit.
    pub modified: bool,
    /// Tick of the last access.
    pub last_accessed: Option<Tick>,
    /// Number of times the page has been loaded.
    pub load_count: u32,
}

impl PageTableEntry {
    pub(crate) fn new(process_id: ProcessId, page_id: PageId) -> Self {
        Self {
            process_id,
            page_id,
            frame_id: None,
            valid: false,
            referenced: false,
            modified: false,
            last_accessed: None,
            load_count: 0,
        }
    }

    pub(crate) fn install(&mut self, frame_id: FrameId, is_write: bool, now: Tick) {
        self.frame_id = Some(frame_id);
        self.valid = true;
        self.referenced = true;
        self.modified = is_write;
        self.last_accessed = Some(now);
        self.load_count += 1;
    }

    pub(crate) fn touch(&mut self, is_write: bool, now: Tick) {
        self.referenced = true;
        self.modified |= is_write;
        self.last_accessed = Some(now);
    }

    pub(crate) fn invalidate(&mut self) {
        self.frame_id = None;
        self.valid = false;
    }
}
