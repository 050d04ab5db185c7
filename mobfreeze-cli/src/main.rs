use std::path::{Path, PathBuf};

use clap::Parser;
use mobfreeze::{Freezer, World};

#[derive(Parser)]
#[command(
    name = "mobfreeze",
    version,
    about = "Make every mob in a Minecraft world invulnerable, motionless and persistent"
)]
struct Cli {
    /// World save folder, the one containing level.dat
    world_folder: PathBuf,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let world = World::open(&cli.world_folder)?;
    let files = world.region_files()?;
    println!("Found {} region files.", files.len());

    let report = Freezer::default().freeze_files(&files, |i, n, path| {
        println!("Opening region file {i}/{n}: {}", file_name(path));
    })?;

    println!(
        "Done! Updated {} entities over {} chunks.",
        report.totals.entities_updated, report.totals.chunks_updated
    );
    Ok(())
}
