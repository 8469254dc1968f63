//! RISC-V cycle-accurate simulator CLI.
//!
//! Single entry point for the two ways the simulator is driven standalone:
//! a bare-metal binary loaded directly at RAM base, or a kernel image booted
//! through the usual firmware/DTB path.

use std::io::Write;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rvsim_core::Simulator;
use rvsim_core::config::Config;
use rvsim_core::core::pipeline::engine::BackendType;
use rvsim_core::sim::loader;
use rvsim_core::soc::System;

#[derive(Parser, Debug)]
#[command(
    name = "sim",
    author,
    version,
    about = "RISC-V cycle-accurate simulator",
    long_about = "Run a bare-metal binary or boot a kernel.\n\nConfiguration defaults to `Config::default()`; pass --config to load overrides from a JSON file.\n\nExamples:\n  sim run -f software/bin/benchmarks/qsort.bin\n  sim run --kernel Image --disk rootfs.img\n  sim run -f qsort.bin --backend out-of-order"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single binary (bare-metal) or kernel (OS boot).
    Run {
        /// Bare-metal binary to execute (direct mode).
        #[arg(short, long)]
        file: Option<String>,

        /// Kernel image for OS boot (disables direct mode).
        #[arg(long)]
        kernel: Option<String>,

        /// Disk image (e.g. rootfs) for OS boot.
        #[arg(long, default_value = "")]
        disk: String,

        /// Device tree blob for OS boot.
        #[arg(long)]
        dtb: Option<String>,

        /// JSON config file; overrides `Config::default()` field-by-field.
        #[arg(long)]
        config: Option<String>,

        /// Pipeline backend to run with, overriding the config file.
        #[arg(long, value_enum)]
        backend: Option<CliBackend>,
    },
}

/// CLI-facing mirror of [`BackendType`] so the core crate doesn't need a
/// `clap` dependency just for this one flag.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliBackend {
    InOrder,
    OutOfOrder,
}

impl From<CliBackend> for BackendType {
    fn from(b: CliBackend) -> Self {
        match b {
            CliBackend::InOrder => BackendType::InOrder,
            CliBackend::OutOfOrder => BackendType::OutOfOrder,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            file,
            kernel,
            disk,
            dtb,
            config,
            backend,
        } => cmd_run(file, kernel, disk, dtb, config, backend),
    }
}

/// Runs the simulator: loads kernel or bare-metal binary, then loops on
/// `tick` until exit or an unhandled trap.
fn cmd_run(
    file: Option<String>,
    kernel: Option<String>,
    disk: String,
    dtb: Option<String>,
    config_path: Option<String>,
    backend: Option<CliBackend>,
) {
    let mut config = match config_path {
        Some(path) => Config::load_from_file(&path).unwrap_or_else(|e| {
            eprintln!("Error loading config {path}: {e}");
            process::exit(1);
        }),
        None => Config::default(),
    };
    if let Some(backend) = backend {
        config.pipeline.backend = backend.into();
    }

    let system = System::new(&config, &disk);
    let mut sim = Simulator::new(system, &config);

    tracing::info!(
        trace = config.general.trace_instructions,
        start_pc = format_args!("{:#x}", config.general.start_pc),
        ram_mb = config.memory.ram_size / 1024 / 1024,
        backend = ?config.pipeline.backend,
        "configuration"
    );

    if let Some(kernel_path) = kernel {
        tracing::info!(kernel = %kernel_path, disk = %disk, dtb = ?dtb, "booting kernel");
        loader::setup_kernel_load(&mut sim.cpu, &config, &disk, dtb, Some(kernel_path));
        sim.cpu.direct_mode = false;
    } else if let Some(bin_path) = file {
        tracing::info!(file = %bin_path, "direct execution");
        let bin_data = loader::load_binary(&bin_path);
        let load_addr = config.system.ram_base;
        sim.cpu.bus.load_binary_at(&bin_data, load_addr);
        sim.cpu.pc = load_addr;
    } else {
        eprintln!("Error: specify --file <binary> or --kernel <Image>");
        eprintln!("  sim run -f software/bin/benchmarks/qsort.bin");
        eprintln!("  sim run --kernel Image [--disk rootfs.img]");
        process::exit(1);
    }

    loop {
        if let Err(e) = sim.tick() {
            eprintln!("\n[!] FATAL TRAP: {e}");
            sim.cpu.dump_state();
            sim.cpu.stats.print();
            process::exit(1);
        }
        if let Some(code) = sim.take_exit() {
            println!("\n[*] Exit code {code}");
            sim.cpu.stats.print();
            std::io::stdout().flush().ok();
            process::exit(code as i32);
        }
    }
}
