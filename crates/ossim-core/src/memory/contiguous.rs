//! Fixed-block contiguous allocator.
//!
//! Memory is a sequence of blocks whose order is their physical order. A
//! request takes a whole free block; whatever the process does not use stays
//! inside the block as internal fragmentation. Freed blocks are not merged
//! with their neighbours.

use ossim_common::utils::error::ensure_positive;
use ossim_common::{Error, FitStrategy, ProcessId, Result};
use serde::Serialize;

use super::fragmentation::FragmentationStats;

/// Ownership record of an allocated block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Owning process.
    pub process_id: ProcessId,
    /// Size the process asked for (never larger than the block).
    pub process_size: u64,
}

/// A block of memory with a fixed size and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    size: u64,
    allocation: Option<Allocation>,
}

impl MemoryBlock {
    fn free(size: u64) -> Self {
        Self {
            size,
            allocation: None,
        }
    }

    /// Returns the block size.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns true if a process owns the block.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.allocation.is_some()
    }

    /// Returns the ownership record, if any.
    #[must_use]
    pub fn allocation(&self) -> Option<&Allocation> {
        self.allocation.as_ref()
    }

    /// Returns the owning process id, if any.
    #[must_use]
    pub fn process_id(&self) -> Option<&ProcessId> {
        self.allocation.as_ref().map(|a| &a.process_id)
    }

    /// Returns the requested size of the owning process, if any.
    #[must_use]
    pub fn process_size(&self) -> Option<u64> {
        self.allocation.as_ref().map(|a| a.process_size)
    }

    /// Unused space inside the block (0 for free blocks).
    #[must_use]
    pub fn internal_fragmentation(&self) -> u64 {
        self.allocation
            .as_ref()
            .map_or(0, |a| self.size - a.process_size)
    }
}

/// Where an allocation landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Index of the chosen block.
    pub index: usize,
    /// Size of the chosen block.
    pub block_size: u64,
    /// Space left unused inside the block.
    pub internal_fragmentation: u64,
}

/// Usage summary of the whole block list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryUsage {
    /// Sum of all block sizes.
    pub total: u64,
    /// Sum of allocated block sizes.
    pub allocated: u64,
    /// Sum of free block sizes.
    pub free: u64,
    /// `allocated / total` as a percentage, 0 for an empty layout.
    pub allocation_percent: f64,
    /// Number of allocated blocks.
    pub used_blocks: usize,
    /// Number of blocks.
    pub total_blocks: usize,
}

/// Hands out whole fixed-size blocks to processes.
#[derive(Debug, Clone, Default)]
pub struct ContiguousAllocator {
    blocks: Vec<MemoryBlock>,
}

impl ContiguousAllocator {
    /// Creates an allocator with no blocks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator with one free block per given size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any size is zero or the sizes add up past
    /// `u64::MAX`; no blocks are added then.
    pub fn with_blocks<I>(sizes: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut allocator = Self::new();
        for size in sizes {
            allocator.add_block(size)?;
        }
        Ok(allocator)
    }

    /// Removes every block.
    pub fn reset(&mut self) {
        self.blocks.clear();
    }

    /// Appends a free block and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero size, or if the total capacity
    /// would exceed `u64::MAX`.
    pub fn add_block(&mut self, size: u64) -> Result<usize> {
        ensure_positive("block size", size)?;
        if self.total_size().checked_add(size).is_none() {
            return Err(Error::invalid(format!(
                "block of {size} units overflows the total capacity"
            )));
        }
        self.blocks.push(MemoryBlock::free(size));
        Ok(self.blocks.len() - 1)
    }

    /// Gives a free block to `process_id`.
    ///
    /// The block keeps its size; the difference between block and request
    /// becomes internal fragmentation.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a zero size or an empty process id
    /// - `DuplicateProcessId` if the process already owns a block
    /// - `NoFitFound` if no free block satisfies the strategy
    pub fn allocate(
        &mut self,
        size: u64,
        process_id: ProcessId,
        strategy: FitStrategy,
    ) -> Result<Placement> {
        ensure_positive("process size", size)?;
        if process_id.is_empty() {
            return Err(Error::invalid("process id must not be empty"));
        }
        if self.find(&process_id).is_some() {
            return Err(Error::DuplicateProcessId(process_id));
        }

        let free = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.is_allocated())
            .map(|(index, block)| (index, block.size));
        let index = strategy
            .select(size, free)
            .ok_or(Error::NoFitFound { requested: size })?;

        let block = &mut self.blocks[index];
        block.allocation = Some(Allocation {
            process_id,
            process_size: size,
        });

        Ok(Placement {
            index,
            block_size: block.size,
            internal_fragmentation: block.internal_fragmentation(),
        })
    }

    /// Frees the block owned by `process_id` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `ProcessNotFound` if no block belongs to the process.
    pub fn deallocate(&mut self, process_id: &ProcessId) -> Result<usize> {
        let index = self
            .find(process_id)
            .ok_or_else(|| Error::ProcessNotFound(process_id.clone()))?;
        self.blocks[index].allocation = None;
        Ok(index)
    }

    /// Returns the index of the block owned by `process_id`.
    #[must_use]
    pub fn find(&self, process_id: &ProcessId) -> Option<usize> {
        self.blocks
            .iter()
            .position(|block| block.process_id() == Some(process_id))
    }

    /// Returns the blocks in physical order.
    #[must_use]
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Returns the sum of all block sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.blocks.iter().map(MemoryBlock::size).sum()
    }

    /// Returns the fragmentation of the current layout.
    #[must_use]
    pub fn fragmentation(&self) -> FragmentationStats {
        FragmentationStats::of(&self.blocks)
    }

    /// Returns a usage summary of the current layout.
    #[must_use]
    pub fn usage(&self) -> MemoryUsage {
        let total = self.total_size();
        let (allocated, used_blocks) = self
            .blocks
            .iter()
            .filter(|block| block.is_allocated())
            .fold((0, 0), |(sum, count), block| (sum + block.size, count + 1));
        let allocation_percent = if total > 0 {
            allocated as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        MemoryUsage {
            total,
            allocated,
            free: total - allocated,
            allocation_percent,
            used_blocks,
            total_blocks: self.blocks.len(),
        }
    }
}
