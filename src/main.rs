use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use simplevi::config::LogSettings;
use simplevi::{load_config, Editor, Settings, Terminal};

/// A very small vi-like editor
#[derive(Parser, Debug)]
#[command(name = "simplevi")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ~/.config/simplevi/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("Not a terminal");
    }

    // Logging needs the settings, so config problems are logged afterwards
    let (settings, config_error) = match load_config(args.config.as_deref()) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    let _log_guard = init_logging(&settings.log, args.verbose)?;
    if let Some(e) = config_error {
        tracing::warn!("{:#}, using defaults", e);
    }
    tracing::info!("Starting simplevi v{}", env!("CARGO_PKG_VERSION"));

    let mut editor = Editor::new(settings.editor);
    let mut terminal = Terminal::new()?;

    let (width, height) = Terminal::size()?;
    editor.set_size(width, height);

    // Main event loop
    loop {
        if let Ok((w, h)) = Terminal::size() {
            editor.set_size(w, h);
        }
        let full = editor.take_redraw();
        terminal.render(&editor, full)?;

        if editor.should_quit() {
            break;
        }

        let Some(byte) = terminal.read_byte()? else {
            tracing::info!("input closed");
            break;
        };
        editor.handle_byte(byte)?;
    }

    tracing::info!("exiting");
    Ok(())
}

/// Send logs to a file; the terminal belongs to the editor
fn init_logging(settings: &LogSettings, verbose: u8) -> anyhow::Result<Option<WorkerGuard>> {
    let Some(path) = settings.file_path() else {
        return Ok(None);
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let Some(file_name) = path.file_name() else {
        anyhow::bail!("Log path {} has no file name", path.display());
    };
    std::fs::create_dir_all(&dir)?;

    let level = match verbose {
        0 => settings.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    Ok(Some(guard))
}
