#![deny(clippy::all, clippy::perf, clippy::correctness)]

#[macro_use]
extern crate log;

use anyhow::Context;
use sector_state::StoreConfig;

fn run() -> anyhow::Result<()> {
    let config = StoreConfig::default();
    let path = config
        .resolve_ledger_path()
        .context("resolving ledger path")?;

    info!("migrate: {}", "start");

    let store = sector_state::global()
        .initialize(&path)
        .with_context(|| format!("loading ledger {:?}", path))?;

    store
        .persist()
        .with_context(|| format!("persisting ledger {:?}", path))?;

    info!("migrate: {}", "finish");

    Ok(())
}

fn main() {
    pretty_env_logger::init();

    match run() {
        Ok(()) => println!("done ok"),
        Err(err) => {
            error!("{:#}", err);
            eprintln!("{:#}", err);
            std::process::exit(1);
        }
    }
}
