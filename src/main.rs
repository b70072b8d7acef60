mod clock;
mod display;
mod emulator;
mod error;
mod instruction;
mod keypad;
mod machine;
mod memory;
mod opcode;
mod snapshot;
mod timer;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::emulator::{Emulator, Settings};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a CHIP-8 program image
    rom: std::path::PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = 700)]
    ips: u64,

    /// Display refresh rate in frames per second
    #[arg(long, default_value_t = 60)]
    frame_rate: u64,

    /// Log a state diff after every instruction (needs RUST_LOG=trace)
    #[arg(long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; the TUI owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings {
        rom: args.rom,
        ips: args.ips,
        frame_rate: args.frame_rate,
        trace: args.trace,
    };

    Emulator::new(settings).run()
}
