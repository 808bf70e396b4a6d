mod adapter;
mod definitions;

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chip::{definitions::cpu, devices::SharedKeyboard, opcode::disassemble, Session, Settings};
use clap::Parser;

use crate::adapter::{DisplayAdapter, KeyboardAdapter};

/// Runs a CHIP-8 program inside of the terminal.
///
/// The keys `1234`, `qwer`, `asdf` and `zxcv` are the chip keyboard, `Esc` quits.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The program to run.
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// The instruction clock rate, the timers always run at 60 hertz.
    #[arg(long, default_value_t = cpu::HERTZ)]
    hertz: u64,

    /// Where the log is written to, the terminal is taken by the display.
    #[arg(long, value_name = "PATH", default_value = definitions::LOG_FILE)]
    log: PathBuf,

    /// Print the listing of the program and exit.
    #[arg(long, default_value_t = false)]
    disassemble: bool,
}

fn setup_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Unable to create the log file {}", path.display()))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("Unable to initialize the logger")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("Unable to read the rom {}", args.rom.display()))?;

    if args.disassemble {
        for line in disassemble(&rom, cpu::PROGRAM_COUNTER) {
            println!("{}", line);
        }
        return Ok(());
    }

    setup_logging(&args.log)?;
    log::info!("Loaded {} with {} bytes.", args.rom.display(), rom.len());

    let keyboard = SharedKeyboard::new();
    let display = DisplayAdapter::new().context("Unable to set up the terminal")?;
    let settings = Settings { hertz: args.hertz };

    let mut session: Session<DisplayAdapter> =
        Session::new(&rom, keyboard.clone(), display, settings).with_context(|| {
            format!("The rom {} does not fit into memory", args.rom.display())
        })?;

    let stop = session.stop_handle();
    let input = KeyboardAdapter::new(keyboard, stop.clone()).spawn();

    let res = session.run();

    stop.stop();
    if input.join().is_err() {
        log::error!("The input thread panicked.");
    }
    session
        .display_mut()
        .restore()
        .context("Unable to restore the terminal")?;

    if let Err(fault) = res {
        eprintln!("{}", fault);
        eprintln!("{}", session.chip());
        return Err(fault.into());
    }
    Ok(())
}
