mod link;
mod options;
mod progress;
mod render;

use anyhow::Result;
use clap::Parser;
use log::debug;
use options::{Cli, Command};
use rastergrid::{Dataset, LoadMode};
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let Cli {
        data_dir,
        mem_map,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let mode = if mem_map {
        LoadMode::MemMap
    } else {
        LoadMode::InMem
    };
    let dataset = Dataset::open(&data_dir, mode)?;
    debug!(
        "{:?}: {}x{} cells, {:?}",
        data_dir, dataset.metadata.width, dataset.metadata.height, dataset.metadata.bounds_wgs84
    );

    match cmd {
        Command::Render(render) => render.run(&dataset),
        Command::Link(link) => link.run(&dataset),
    }
}
