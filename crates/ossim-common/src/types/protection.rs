//! Segment protection flags.

use std::fmt;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Access rights attached to a segment.
///
/// Unspecified flags fall back to read/write, no execute. Flags that are
/// given explicitly, including `false`, are kept as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protection {
    /// Segment may be read.
    #[serde(default = "default_true")]
    pub read: bool,
    /// Segment may be written.
    #[serde(default = "default_true")]
    pub write: bool,
    /// Segment may be executed.
    #[serde(default)]
    pub execute: bool,
}

impl Protection {
    /// Read/write, no execute.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        execute: false,
    };

    /// Read and execute, typical for code segments.
    pub const READ_EXECUTE: Self = Self {
        read: true,
        write: false,
        execute: true,
    };

    /// Read only.
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
        execute: false,
    };
}

impl Default for Protection {
    fn default() -> Self {
        Self::READ_WRITE
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.execute, 'x')
        )
    }
}
