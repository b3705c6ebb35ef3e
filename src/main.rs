//! `annotate-cv`: annotate images from the terminal.
//!
//! Reads a session configuration file, resumes from any saved annotations,
//! and runs one command per line from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use annotate_cv::AnnotationController;
use annotate_cv::config::SessionConfig;
use annotate_cv::session::{HELP, Outcome, Session};
use clap::Parser;

#[derive(Parser)]
#[command(name = "annotate-cv")]
#[command(about = "Step through images assigning labels or bounding boxes")]
struct Cli {
    /// Path to the session configuration JSON file
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = SessionConfig::load(&cli.config)?;

    // RUST_LOG takes precedence over the configured level
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.to_level_filter().as_str()),
    )
    .try_init();

    let controller = AnnotationController::new(
        &config.label_source,
        config.image_source.to_source(),
        config.storage.clone(),
        config.options.clone(),
    )?;
    let mut session = Session::new(controller, config.mode);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", HELP)?;
    writeln!(stdout, "labels: {}", session.controller().labels().join(", "))?;
    writeln!(stdout, "{}", session.describe_current())?;

    for line in stdin.lock().lines() {
        match session.handle_line(&line?) {
            Outcome::Continue(feedback) => {
                if !feedback.is_empty() {
                    writeln!(stdout, "{}", feedback)?;
                }
            }
            Outcome::Quit => break,
        }
        stdout.flush()?;
    }

    session.finish()?;
    log::info!("Saved annotations, exiting");
    Ok(())
}
