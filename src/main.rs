//! quickeda entry point.
//!
//! With a subcommand it runs once on the command line and exits; without one
//! it opens the desktop app.
//!
//! ```bash
//! quickeda profile sales.csv --minimal
//! quickeda
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // CLI output
#![expect(clippy::print_stderr)] // CLI progress and startup failures
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod cli;
mod gui;
mod theme;

use anyhow::Result;
use clap::Parser as _;
use quickeda::config;

fn run_gui(settings: config::AppSettings) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("quickeda")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "quickeda",
        options,
        Box::new(|cc| Ok(Box::new(gui::QuickEdaApp::new(cc, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start the app: {e}"))
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // The app still works without a log file.
    if let Err(e) = quickeda::logging::init() {
        eprintln!("Logging disabled: {e:#}");
    }

    let settings = config::load_settings();

    match cli.command {
        Some(command) => cli::run_command(command, &settings),
        None => run_gui(settings),
    }
}
