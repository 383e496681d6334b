#[macro_use]
extern crate log;

mod progress;
mod target;

use std::fs::File;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use ciafile::cia;
use ciafile::titleid::TitleId;
use clap::Parser;
use log::LevelFilter;
use progress::ProgressLog;
use simple_logger::SimpleLogger;

/// Sends a CIA file to a 3DS waiting for it over the network
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address of the console, `ip` or `ip:port` (port defaults to 5000)
    target: String,
    /// CIA file to send
    file: PathBuf,
    /// Log level: NONE, TRACE, DEBUG, INFO, WARN or ERROR
    #[arg(short, long, default_value = "INFO", value_parser = parse_level)]
    log_level: LevelFilter,
    /// Give up when the console doesn't accept data for this many seconds, 0 waits forever
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.to_ascii_uppercase().as_str() {
        "NONE" | "OFF" => Ok(LevelFilter::Off),
        "TRACE" => Ok(LevelFilter::Trace),
        "DEBUG" => Ok(LevelFilter::Debug),
        "INFO" => Ok(LevelFilter::Info),
        "WARN" => Ok(LevelFilter::Warn),
        "ERROR" => Ok(LevelFilter::Error),
        _ => Err(format!("unknown log level {level:?}")),
    }
}

/// Opens the file to send, returning it along with its size
fn open_cia(path: &Path) -> Result<(File, u64)> {
    ensure!(target::is_cia_file(path), "{} is not a cia file", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let meta = file.metadata()
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    if meta.is_dir() {
        bail!("{} is a directory", path.display());
    }
    ensure!(meta.len() > 0, "{} is empty", path.display());

    Ok((file, meta.len()))
}

fn print_metadata(path: &Path) {
    println!("Installing cia file: {}", path.display());

    let decoded = match cia::decode_file(path) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Could not determine metadata: {e}");
            println!("Titleid: unknown, Serial: unknown");
            return;
        }
    };

    for diag in decoded.diagnostics() {
        warn!("{diag}");
    }
    debug!("{:#x?}", decoded.header());
    debug!("{:#x?}", decoded.ticket());

    let meta = decoded.metadata();
    if meta.serial.is_empty() {
        warn!("No serial found at content offset {:#x}", decoded.offsets().content + cia::SERIAL_OFFSET);
    }
    println!("Titleid: {:016x}, Serial: {}", meta.title_id, meta.serial);

    match TitleId::from_u64(meta.title_id) {
        Ok(tid) => info!("Title {:08x}, {:?} {}", tid.id(), tid.plat(), tid.category().describe()),
        Err(e) => debug!("Title id {:016x} not split: {e}", meta.title_id),
    }
}

fn connect(target: &str, timeout: u64) -> Result<TcpStream> {
    let addr = target::with_default_port(target)?;
    let stream = TcpStream::connect(&addr)
        .with_context(|| format!("Failed connecting to {addr}"))?;
    if timeout != 0 {
        stream.set_write_timeout(Some(Duration::from_secs(timeout)))
            .context("Failed to set socket timeout")?;
    }
    info!("Connected to {addr}");
    Ok(stream)
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = SimpleLogger::new().with_level(args.log_level).init() {
        eprintln!("Failed to set up logging: {e}");
    }

    match run(&args) {
        Ok(()) => {
            println!("Send cia file success");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            println!("Send cia file failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let (mut file, size) = open_cia(&args.file)?;
    print_metadata(&args.file);

    let mut stream = connect(&args.target, args.timeout)?;
    let mut progress = ProgressLog::new(size);
    let sent = ciafile::transmit::transmit(&mut file, size, &mut stream, &mut progress)
        .context("Transfer aborted")?;
    debug!("Sent {sent} bytes ({} reported)", progress.done());

    Ok(())
}
