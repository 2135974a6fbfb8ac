//! The simulation session.

use ossim_common::Result;
use ossim_core::paging::generate_access_pattern;
use ossim_core::scheduling::Algorithm;
use ossim_core::{ContiguousAllocator, CpuScheduler, PagingManager, SegmentationManager};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::command::{Command, CommandOutput, ContiguousSnapshot, SegmentSnapshot, Snapshot};
use crate::config::Config;
use crate::outcome::Outcome;

/// Owns the four simulated components and the RNG that feeds them.
///
/// Components are independent: no operation on one touches another. All
/// mutation goes through [`Simulator::apply`], which logs the command and
/// wraps the result in an [`Outcome`]; the accessors hand out read-only views.
#[derive(Debug)]
pub struct Simulator {
    /// Start-up configuration, reused by [`Simulator::reset`].
    config: Config,
    contiguous: ContiguousAllocator,
    paging: PagingManager,
    segmentation: SegmentationManager,
    scheduler: CpuScheduler,
    rng: StdRng,
}

impl Simulator {
    /// Creates a simulator with the default configuration and an OS-seeded RNG.
    ///
    /// # Examples
    ///
    /// ```
    /// use ossim_engine::Simulator;
    ///
    /// let sim = Simulator::new();
    /// assert_eq!(sim.paging().frames().len(), 4);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            contiguous: ContiguousAllocator::new(),
            paging: PagingManager::default(),
            segmentation: SegmentationManager::default(),
            scheduler: CpuScheduler::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a simulator from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration does not validate.
    ///
    /// # Examples
    ///
    /// ```
    /// use ossim_engine::{Config, Simulator};
    ///
    /// let config = Config::default().with_blocks([100, 200, 50]).with_seed(7);
    /// let sim = Simulator::with_config(config).unwrap();
    /// assert_eq!(sim.contiguous().blocks().len(), 3);
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let contiguous = ContiguousAllocator::with_blocks(config.initial_blocks.iter().copied())?;
        let mut paging = PagingManager::new(config.memory_size, config.page_size)?;
        paging.set_policy(config.replacement_policy);
        let segmentation = SegmentationManager::new(config.segment_space)?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        tracing::info!(
            "Simulator ready: {} blocks, {} frames, {} segment units",
            contiguous.blocks().len(),
            paging.frames().len(),
            segmentation.total_size()
        );

        Ok(Self {
            config,
            contiguous,
            paging,
            segmentation,
            scheduler: CpuScheduler::new(),
            rng,
        })
    }

    /// Re-initialises every component from the configuration and reseeds
    /// the RNG.
    ///
    /// # Errors
    ///
    /// Returns an error only if the stored configuration became invalid;
    /// state is kept then.
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::with_config(self.config.clone())?;
        Ok(())
    }

    /// Applies one command and reports the result.
    pub fn apply(&mut self, command: Command) -> Outcome<CommandOutput> {
        let name = command.name();
        tracing::debug!("Applying {}", name);

        let result = self.execute(command);
        if let Err(ref e) = result {
            tracing::warn!("Command {} rejected: {}", name, e);
        }
        result.into()
    }

    /// Applies commands in order. A failed command does not stop the script.
    pub fn run_script<I>(&mut self, commands: I) -> Vec<Outcome<CommandOutput>>
    where
        I: IntoIterator<Item = Command>,
    {
        commands.into_iter().map(|c| self.apply(c)).collect()
    }

    /// Runs a command without logging or wrapping.
    ///
    /// # Errors
    ///
    /// Returns the component's error; the component is left unchanged.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutput> {
        match command {
            Command::Reset => self.reset().map(|()| CommandOutput::Done),

            Command::AddBlock { size } => self.contiguous.add_block(size).map(CommandOutput::BlockIndex),
            Command::AllocateBlock {
                size,
                process_id,
                strategy,
            } => {
                let strategy = match strategy {
                    Some(name) => name.parse()?,
                    None => self.config.fit_strategy,
                };
                self.contiguous
                    .allocate(size, process_id, strategy)
                    .map(CommandOutput::Placement)
            }
            Command::DeallocateBlock { process_id } => self
                .contiguous
                .deallocate(&process_id)
                .map(CommandOutput::BlockIndex),
            Command::ClearBlocks => {
                self.contiguous.reset();
                Ok(CommandOutput::Done)
            }

            Command::InitializePaging {
                memory_size,
                page_size,
            } => {
                let frames = self.paging.initialize_physical_memory(memory_size, page_size)?;
                tracing::info!("Physical memory reset to {} frames", frames);
                Ok(CommandOutput::FrameCount(frames))
            }
            Command::CreatePageTable {
                process_id,
                process_size,
                page_size,
            } => {
                let page_size = page_size.unwrap_or_else(|| self.paging.page_size());
                self.paging
                    .create_page_table(process_id, process_size, page_size)
                    .map(|table| CommandOutput::PageTable(table.to_vec()))
            }
            Command::SetReplacementPolicy { policy } => self
                .paging
                .set_replacement_policy(&policy)
                .map(CommandOutput::Policy),
            Command::AccessPage { page_id, is_write } => {
                let outcome = self.paging.access_page(page_id, is_write)?;
                if let Some(evicted) = outcome.evicted {
                    tracing::debug!("Page {} evicted from frame {}", evicted, outcome.frame_id);
                }
                Ok(CommandOutput::Access(outcome))
            }
            Command::GenerateAccessPattern {
                page_count,
                access_count,
                locality,
            } => {
                let locality = locality.unwrap_or(self.config.locality);
                generate_access_pattern(page_count, access_count, locality, &mut self.rng)
                    .map(CommandOutput::Pattern)
            }
            Command::SimulateAccessPattern {
                sequence,
                write_ratio,
            } => {
                let write_ratio = write_ratio.unwrap_or(self.config.write_ratio);
                self.paging
                    .simulate_access_pattern(&sequence, write_ratio, &mut self.rng)
                    .map(CommandOutput::Simulation)
            }
            Command::Simulate { accesses } => self
                .paging
                .simulate(&accesses)
                .map(CommandOutput::Simulation),

            Command::InitializeSegments { total_size } => {
                self.segmentation.initialize(total_size)?;
                tracing::info!("Segment space reset to {} units", total_size);
                Ok(CommandOutput::Done)
            }
            Command::AllocateSegment {
                name,
                size,
                protection,
            } => self
                .segmentation
                .allocate(name, size, protection)
                .map(CommandOutput::Region),
            Command::DeallocateSegment { name } => self
                .segmentation
                .deallocate(&name)
                .map(CommandOutput::Region),
            Command::AllocateSegments {
                total_size,
                segments,
            } => self
                .segmentation
                .allocate_all(total_size, segments.iter().map(|s| (s.name.as_str(), s.size)))
                .map(CommandOutput::SegmentTable),
            Command::Compact => Ok(CommandOutput::Fragmentation(self.segmentation.compact())),

            Command::AddProcess {
                process_id,
                burst_time,
                arrival_time,
            } => self
                .scheduler
                .add_process(process_id, burst_time, arrival_time)
                .map(|p| CommandOutput::Process(p.clone())),
            Command::ClearProcesses => {
                self.scheduler.clear();
                Ok(CommandOutput::Done)
            }
            Command::RunScheduler { algorithm, quantum } => {
                let algorithm = Algorithm::parse(&algorithm, quantum.unwrap_or(self.config.quantum))?;
                self.scheduler
                    .run(algorithm)
                    .map(|report| CommandOutput::Schedule(Box::new(report)))
            }
            Command::CompareSchedulers { quantum } => self
                .scheduler
                .compare(quantum.unwrap_or(self.config.quantum))
                .map(CommandOutput::Comparison),

            Command::Snapshot => Ok(CommandOutput::Snapshot(Box::new(self.snapshot()))),
        }
    }

    /// Captures the state of every component.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            contiguous: ContiguousSnapshot {
                blocks: self.contiguous.blocks().to_vec(),
                fragmentation: self.contiguous.fragmentation(),
                usage: self.contiguous.usage(),
            },
            paging: self.paging.memory_state(),
            segmentation: SegmentSnapshot {
                regions: self.segmentation.regions().to_vec(),
                fragmentation: self.segmentation.fragmentation(),
            },
            processes: self.scheduler.queue().to_vec(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the contiguous allocator.
    #[must_use]
    pub fn contiguous(&self) -> &ContiguousAllocator {
        &self.contiguous
    }

    /// Returns the paging manager.
    #[must_use]
    pub fn paging(&self) -> &PagingManager {
        &self.paging
    }

    /// Returns the segmentation manager.
    #[must_use]
    pub fn segmentation(&self) -> &SegmentationManager {
        &self.segmentation
    }

    /// Returns the CPU scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &CpuScheduler {
        &self.scheduler
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ossim_common::{FitStrategy, PageId, ProcessId, ReplacementPolicy};

    fn seeded() -> Simulator {
        Simulator::with_config(Config::default().with_seed(11)).unwrap()
    }

    #[test]
    fn test_new_matches_default_config() {
        let sim = Simulator::new();
        let configured = seeded();

        assert_eq!(sim.paging().frames().len(), configured.paging().frames().len());
        assert_eq!(sim.segmentation().total_size(), configured.segmentation().total_size());
        assert_eq!(sim.paging().policy(), ReplacementPolicy::Fifo);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let err = Simulator::with_config(Config::default().with_quantum(0))
            .err()
            .unwrap();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_config_strategy_is_default() {
        let config = Config::default()
            .with_blocks([100, 200, 50])
            .with_fit_strategy(FitStrategy::WorstFit);
        let mut sim = Simulator::with_config(config).unwrap();

        let outcome = sim.apply(Command::AllocateBlock {
            size: 40,
            process_id: ProcessId::new("P1"),
            strategy: None,
        });
        assert!(matches!(
            outcome.payload,
            Some(CommandOutput::Placement(p)) if p.index == 1
        ));
    }

    #[test]
    fn test_strategy_names_parsed_per_command() {
        let mut sim = seeded();
        for size in [100, 500, 200] {
            sim.apply(Command::AddBlock { size });
        }
        let before = sim.snapshot();

        let outcome = sim.apply(Command::AllocateBlock {
            size: 50,
            process_id: ProcessId::new("P1"),
            strategy: Some("next-fit".to_string()),
        });
        assert_eq!(outcome.error_code(), Some("UNKNOWN_POLICY"));
        assert_eq!(sim.snapshot(), before);

        let outcome = sim.apply(Command::AllocateBlock {
            size: 150,
            process_id: ProcessId::new("P1"),
            strategy: Some("Best_Fit".to_string()),
        });
        assert!(matches!(
            outcome.payload,
            Some(CommandOutput::Placement(p)) if p.index == 2
        ));
    }

    #[test]
    fn test_failed_command_keeps_state() {
        let mut sim = seeded();
        sim.apply(Command::AddBlock { size: 100 });
        let before = sim.snapshot();

        let outcome = sim.apply(Command::AllocateBlock {
            size: 500,
            process_id: ProcessId::new("P1"),
            strategy: Some("first-fit".to_string()),
        });

        assert!(!outcome.success);
        assert_eq!(outcome.error_code(), Some("NO_FIT_FOUND"));
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn test_optimal_rejected_step_by_step() {
        let mut sim = seeded();
        sim.apply(Command::CreatePageTable {
            process_id: ProcessId::new("P1"),
            process_size: 4096,
            page_size: None,
        });
        sim.apply(Command::SetReplacementPolicy {
            policy: "optimal".to_string(),
        });

        let outcome = sim.apply(Command::AccessPage {
            page_id: PageId::new(0),
            is_write: false,
        });
        assert_eq!(outcome.error_code(), Some("LOOKAHEAD_REQUIRED"));

        let outcome = sim.apply(Command::SimulateAccessPattern {
            sequence: vec![PageId::new(0), PageId::new(1)],
            write_ratio: None,
        });
        assert!(outcome.success);
    }

    #[test]
    fn test_seed_makes_patterns_reproducible() {
        let generate = |sim: &mut Simulator| {
            sim.apply(Command::GenerateAccessPattern {
                page_count: 16,
                access_count: 40,
                locality: None,
            })
            .payload
        };

        let (mut a, mut b) = (seeded(), seeded());
        let first = generate(&mut a);
        assert!(first.is_some());
        assert_eq!(generate(&mut b), first);

        // Reset reseeds, so the sequence starts over.
        a.reset().unwrap();
        assert_eq!(generate(&mut a), first);
    }

    #[test]
    fn test_reset_clears_components() {
        let mut sim = seeded();
        sim.run_script([
            Command::AddBlock { size: 64 },
            Command::AllocateSegment {
                name: "code".to_string(),
                size: 100,
                protection: None,
            },
            Command::AddProcess {
                process_id: ProcessId::new("P1"),
                burst_time: 3,
                arrival_time: 0,
            },
        ]);
        assert!(!sim.scheduler().is_empty());

        let outcome = sim.apply(Command::Reset);
        assert!(outcome.success);
        assert!(sim.contiguous().blocks().is_empty());
        assert!(sim.scheduler().is_empty());
        assert_eq!(sim.segmentation().regions().len(), 1);
    }

    #[test]
    fn test_run_scheduler_uses_config_quantum() {
        let mut sim = Simulator::with_config(Config::default().with_quantum(3)).unwrap();
        sim.apply(Command::AddProcess {
            process_id: ProcessId::new("P1"),
            burst_time: 5,
            arrival_time: 0,
        });

        let outcome = sim.apply(Command::RunScheduler {
            algorithm: "rr".to_string(),
            quantum: None,
        });
        let Some(CommandOutput::Schedule(report)) = outcome.payload else {
            panic!("expected a schedule");
        };
        assert_eq!(report.algorithm, Algorithm::RoundRobin { quantum: 3 });
        assert_eq!(report.gantt[0].end, 3);

        let outcome = sim.apply(Command::RunScheduler {
            algorithm: "lottery".to_string(),
            quantum: None,
        });
        assert_eq!(outcome.error_code(), Some("UNKNOWN_POLICY"));
    }
}
