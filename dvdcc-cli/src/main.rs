//! dvdcc command-line interface.
//!
//! Drives the full imaging flow: open the drive, settle it, probe the disc
//! geometry, recover the per-block cipher seeds, show the disc header, and
//! stream the backup into the requested outputs. `--eject` and `--load`
//! are terminal tray commands that skip the pipeline entirely.

mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use dvdcc_core::{DiscDescriptor, DiscMeta};
use dvdcc_drive::{device::DEFAULT_TIMEOUT, Drive};
use dvdcc_lib::{backup, disc_info, keys, BackupOptions};

use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "dvdcc",
    about = "Operate a DVD drive using SCSI commands to back up GameCube/Wii discs"
)]
struct Cli {
    /// Path to the drive (example: /dev/sr0)
    #[arg(short = 'd', long, value_name = "DEVICE")]
    device: PathBuf,

    /// Eject the disc and exit
    #[arg(long, conflicts_with = "load")]
    eject: bool,

    /// Load the disc and exit
    #[arg(long)]
    load: bool,

    /// Write a descrambled 2048-byte-per-sector image
    #[arg(short = 'i', long, value_name = "PATH")]
    iso: Option<PathBuf>,

    /// Write a raw 2064-byte-per-sector image
    #[arg(short = 'r', long, value_name = "PATH")]
    raw: Option<PathBuf>,

    /// Append to existing --iso/--raw outputs
    #[arg(long)]
    resume: bool,

    /// Print full command details
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // Bare invocation prints usage and exits cleanly.
    if std::env::args().len() == 1 {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are clean exits; anything else is
            // invalid usage and exits 1 (not clap's default 2).
            let clean = !err.use_stderr();
            let _ = err.print();
            return if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
    };

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dvdcc: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut drive = Drive::open(&cli.device, DEFAULT_TIMEOUT)?;
    println!(
        "Drive model: {}",
        drive.model().if_supports_color(Stdout, |t| t.cyan())
    );

    if cli.eject {
        drive.prevent_removal(false)?;
        drive.eject()?;
        println!("Disc ejected.");
        return Ok(());
    }
    if cli.load {
        drive.load()?;
        println!("Disc loaded.");
        return Ok(());
    }

    drive.start()?;
    drive.prevent_removal(true)?;

    // Background medium scanning after spin-up corrupts raw cache reads, so
    // wait for the drive to go quiet before touching it.
    println!("Waiting for the drive to settle...");
    drive.wait_for_quiescence()?;

    let disc_type = drive.probe_disc_type()?;
    let sector_count = disc_type.sector_count().ok_or(CliError::UnknownDisc)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .expect("static pattern")
            .tick_chars("/-\\|"),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Recovering per-block cipher seeds...");
    let recovered = keys::recover_cipher_table(&mut drive, keys::DEFAULT_BLOCKS_TO_PROBE);
    spinner.finish_and_clear();
    let recovered = recovered?;

    let meta = disc_info::read_disc_meta(&mut drive, &recovered.table)?;
    let descriptor = DiscDescriptor {
        disc_type,
        sector_count,
        first_sector_id: recovered.first_sector_id,
        cipher_table: recovered.table,
        model: drive.model().to_string(),
    };
    display_disc(&descriptor, &meta);
    if descriptor.disc_type.is_wii() {
        let update = disc_info::wii_needs_update(&mut drive, &descriptor.cipher_table)?;
        println!(
            "  Update:    {}",
            if update { "includes a system update" } else { "no system update" }
        );
    }

    if cli.iso.is_some() || cli.raw.is_some() {
        let options = BackupOptions {
            iso: cli.iso.clone(),
            raw: cli.raw.clone(),
            resume: cli.resume,
        };
        let bar = ProgressBar::new(u64::from(descriptor.sector_count));
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:20} {percent:>3}% | elapsed {elapsed_precise} remaining {eta_precise}",
            )
            .expect("static pattern")
            .progress_chars("=> "),
        );
        backup::run_backup(
            &mut drive,
            descriptor.sector_count,
            &descriptor.cipher_table,
            &options,
            &mut |done, _total| bar.set_position(done),
        )?;
        bar.finish();
        println!("Backup complete.");
    }

    drive.prevent_removal(false)?;
    drive.stop()?;
    Ok(())
}

fn display_disc(descriptor: &DiscDescriptor, meta: &DiscMeta) {
    println!(
        "Disc type:   {} ({} sectors, first id {:#08X})",
        descriptor.disc_type, descriptor.sector_count, descriptor.first_sector_id
    );
    println!("  System:    {}", meta.system_name().unwrap_or("unknown"));
    println!(
        "  Title:     {}",
        meta.title.if_supports_color(Stdout, |t| t.bold())
    );
    println!(
        "  Game ID:   {}{}{}{}",
        meta.system_id, meta.game_id, meta.region_id, meta.publisher_id
    );
    println!("  Region:    {}", meta.region_name().unwrap_or("unknown"));
    println!("  Publisher: {}", meta.publisher_name().unwrap_or("unknown"));
    println!("  Version:   1.{:02}", meta.version);
}
