//! Physical frames.

use ossim_common::{FrameId, PageId, Tick};
use serde::Serialize;

/// A physical frame and the bookkeeping bits of the page it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Frame number.
    pub frame_id: FrameId,
    /// Resident page, `None` while the frame is empty.
    pub page_id: Option<PageId>,
    /// Tick of the last access to the resident page.
    pub last_used: Option<Tick>,
    /// Reference bit, cleared by the Clock sweep.
    pub referenced: bool,
    /// Dirty bit.
    pub modified: bool,
    /// Tick at which the resident page was loaded.
    pub load_time: Option<Tick>,
}

impl Frame {
    pub(crate) fn empty(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: None,
            last_used: None,
            referenced: false,
            modified: false,
            load_time: None,
        }
    }

    /// Returns true if no page is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page_id.is_none()
    }

    /// Installs `page` as a freshly loaded page.
    pub(crate) fn load(&mut self, page: PageId, is_write: bool, now: Tick) {
        self.page_id = Some(page);
        self.last_used = Some(now);
        self.load_time = Some(now);
        self.referenced = true;
        self.modified = is_write;
    }

    /// Records a hit on the resident page.
    pub(crate) fn touch(&mut self, is_write: bool, now: Tick) {
        self.last_used = Some(now);
        self.referenced = true;
        self.modified |= is_write;
    }
}
