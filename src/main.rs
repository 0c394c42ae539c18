use anyhow::{Context, Result};
use betterguess::app::App;
use betterguess::config::Config;
use clap::Parser;
use crossterm::event::{
    poll as event_poll, read as event_read, DisableMouseCapture, EnableMouseCapture,
};
use crossterm::execute;
use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// A text editor with inline word-completion suggestions
#[derive(Parser, Debug)]
#[command(name = "betterguess")]
#[command(about = "A text editor with inline word-completion suggestions", long_about = None)]
#[command(version)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the prediction service endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the locale sent with prediction requests
    #[arg(long, value_name = "LOCALE")]
    locale: Option<String>,

    /// Path to log file for editor diagnostics (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// The terminal belongs to the UI, so diagnostics go to a file.
fn init_tracing(path: &PathBuf) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let path = args.config.clone().or_else(Config::default_path);
    let mut config = match path {
        Some(path) => {
            Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.service.endpoint = endpoint.clone();
    }
    if let Some(locale) = &args.locale {
        config.service.locale = locale.clone();
    }
    Ok(config)
}

fn run_event_loop(
    app: &mut App,
    mut terminal: ratatui::Terminal<ratatui::prelude::CrosstermBackend<std::io::Stdout>>,
) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|frame| app.render(frame))?;

        if app.should_quit() {
            return Ok(());
        }

        // Short poll so fetch results arriving while idle still get drawn.
        if event_poll(Duration::from_millis(50))? {
            app.handle_event(event_read()?);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("betterguess.log"));
    init_tracing(&log_path)?;

    let config = load_config(&args)?;
    tracing::info!(
        "Starting editor (service endpoint: {})",
        config.service.endpoint
    );

    let initial_text = match &args.file {
        Some(path) if path.exists() => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => String::new(),
    };

    let mut app = App::new(config, initial_text);

    let terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let result = run_event_loop(&mut app, terminal);
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}
