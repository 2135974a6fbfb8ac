//! ossim CLI - Operating-system resource-management simulator.
//!
//! Replays scenario scripts against the simulation engine and runs one-shot
//! experiments on each component: fixed-block allocation, demand paging,
//! segmentation, and CPU scheduling.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use commands::{ProcessSpec, parse_named_size, parse_process};

/// Operating-system resource-management simulator.
///
/// Simulates memory allocation, paging, segmentation, and CPU scheduling
/// and prints the resulting layouts, timelines, and statistics.
#[derive(Parser)]
#[command(name = "ossim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Suppress progress and info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Output format options.
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table format (default for TTY)
    #[default]
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON scenario of simulator commands
    Run {
        /// Path to the scenario file (JSON array of commands)
        scenario: PathBuf,

        /// Optional JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Exit with an error if any command fails
        #[arg(long)]
        strict: bool,
    },

    /// Allocate processes into fixed-size memory blocks
    Blocks {
        /// Block size (repeatable, in physical order)
        #[arg(long = "block", required = true)]
        blocks: Vec<u64>,

        /// Allocation request as PID:SIZE (repeatable)
        #[arg(long = "request", value_parser = parse_named_size)]
        requests: Vec<(String, u64)>,

        /// Process to free after allocating (repeatable)
        #[arg(long = "free")]
        free: Vec<String>,

        /// Fit strategy (first-fit, best-fit, worst-fit)
        #[arg(long, default_value = "first-fit")]
        strategy: String,
    },

    /// Simulate demand paging over a reference string
    Paging {
        /// Number of pages in the process
        #[arg(long, default_value_t = 8)]
        pages: u32,

        /// Number of accesses to generate
        #[arg(long, default_value_t = 20)]
        accesses: usize,

        /// Number of physical frames
        #[arg(long, default_value_t = 3)]
        frames: u64,

        /// Replacement policy (FIFO, LRU, Optimal, Clock, or all)
        #[arg(long, default_value = "all")]
        policy: String,

        /// Locality degree in [0, 1] for generated patterns
        #[arg(long)]
        locality: Option<f64>,

        /// Fraction of accesses that write, in [0, 1]
        #[arg(long)]
        write_ratio: Option<f64>,

        /// RNG seed for reproducible patterns
        #[arg(long)]
        seed: Option<u64>,

        /// Explicit reference string, e.g. 1,2,3,1
        #[arg(long, value_delimiter = ',')]
        pattern: Option<Vec<u32>>,
    },

    /// Schedule processes on one CPU
    Schedule {
        /// Process as ID:BURST[:ARRIVAL] (repeatable)
        #[arg(long = "process", required = true, value_parser = parse_process)]
        processes: Vec<ProcessSpec>,

        /// Algorithm (fcfs, sjf, rr, or all)
        #[arg(long, default_value = "all")]
        algorithm: String,

        /// Round-robin time quantum
        #[arg(long, default_value_t = 2)]
        quantum: u64,
    },

    /// Lay out segments in a variable-partition address space
    Segments {
        /// Address-space size
        #[arg(long, default_value_t = 1024)]
        size: u64,

        /// Segment as NAME:SIZE (repeatable)
        #[arg(long = "segment", value_parser = parse_named_size)]
        segments: Vec<(String, u64)>,

        /// Segment to free after allocating (repeatable)
        #[arg(long = "free")]
        free: Vec<String>,

        /// Compact the space after freeing
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else if !cli.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Run {
            scenario,
            config,
            strict,
        } => commands::run::run(&scenario, config.as_deref(), strict, cli.format, cli.quiet),
        Commands::Blocks {
            blocks,
            requests,
            free,
            strategy,
        } => commands::blocks::run(&blocks, &requests, &free, &strategy, cli.format, cli.quiet),
        Commands::Paging {
            pages,
            accesses,
            frames,
            policy,
            locality,
            write_ratio,
            seed,
            pattern,
        } => commands::paging::run(
            &commands::paging::PagingArgs {
                pages,
                accesses,
                frames,
                policy,
                locality,
                write_ratio,
                seed,
                pattern,
            },
            cli.format,
            cli.quiet,
        ),
        Commands::Schedule {
            processes,
            algorithm,
            quantum,
        } => commands::schedule::run(&processes, &algorithm, quantum, cli.format, cli.quiet),
        Commands::Segments {
            size,
            segments,
            free,
            compact,
        } => commands::segments::run(size, &segments, &free, compact, cli.format, cli.quiet),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
