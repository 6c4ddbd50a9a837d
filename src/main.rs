// Entry point for the Minesweeper TUI application
// Sets up logging, loads configuration and language, then launches the UI

use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};

use mnswpr::mns_config::{load_or_create_config, log_path};
use mnswpr::mns_lang::Lang;
use mnswpr::mns_ui::run as run_ui;

/// Log to a file; the terminal UI owns stdout and stderr.
/// Failure to open the log only disables logging.
fn init_logging() {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .target(Target::Pipe(Box::new(file)))
            .try_init();
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    // Load or create user configuration (difficulty, preferences, records)
    let mut cfg = load_or_create_config();

    // Initialize language resources based on saved or system language
    let mut lang = Lang::new(&cfg.language);

    // Launch the main UI loop
    run_ui(&mut cfg, &mut lang)
}
