mod cli;
mod logging;
pub mod tui;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use imagedeck_core::CollectionStore;
use std::sync::Arc;
use tokio::runtime::Runtime;

use cli::commands::{open_kv, run_cli};
use cli::opts::{Cli, Command};
use tui::app::TuiApp;

fn main() -> Result<()> {
    let args = Cli::parse();

    match &args.cmd {
        // TUI owns the terminal and drives the runtime from its own loop
        Command::Tui => {
            let log = args
                .log_file
                .clone()
                .unwrap_or_else(imagedeck_json::paths::default_log_file);
            logging::init(Some(&log), "info")?;

            let rt = Arc::new(Runtime::new()?);
            let kv = rt.block_on(open_kv(&args))?;
            let store = {
                let _guard = rt.enter();
                CollectionStore::from_config(kv, &args.store_config())
            };
            let mut app = TuiApp::new(store, rt);
            app.run()
        }
        _ => {
            logging::init(args.log_file.as_deref(), "warn")?;
            let rt = Runtime::new()?;
            rt.block_on(run_cli(args))
        }
    }
}
