// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that tracing output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;

/// A minimal text editor.
#[derive(Parser, Debug)]
#[command(name = "slate", version, about)]
struct Args {
    /// File to open at startup
    file: Option<PathBuf>,

    /// Preferences file (default: <config dir>/Slate/preferences.json)
    #[arg(long, value_name = "PATH")]
    prefs: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let store = slate::prefs::open_store(args.prefs);
    run(store, args.file);
}

#[cfg(windows)]
fn run(store: Box<dyn slate::prefs::PreferenceStore>, file: Option<PathBuf>) {
    use slate::platform::win32::{dialogs, window};

    if let Err(e) = window::run(store, file) {
        // Startup failed before or during the message loop.
        // Show a modal error dialog; it is the only safe output path in a GUI app.
        tracing::error!(error = %e, "fatal");
        dialogs::show_fatal_error(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn run(_store: Box<dyn slate::prefs::PreferenceStore>, _file: Option<PathBuf>) {
    tracing::error!("slate has no window front end for this platform; Windows is required");
    std::process::exit(1);
}
