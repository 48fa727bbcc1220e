//! DrTransfer console entry point

use anyhow::{anyhow, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use drtransfer::{
    api::{RestClient, Services},
    cli::{list_view, Cli, Commands},
    config::Config,
    console::{App, Screen},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "drtransfer=info");
    }

    let config = Config::from_env()?.with_api_url(cli.api_url.clone());
    config.validate()?;

    // The console owns the terminal, so logs go to a file; CLI mode also logs to stderr
    let log_dir = config
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    let log_name = config
        .log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "drtransfer.log".into());
    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = cli.cli.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    info!("Starting DrTransfer console against {}", config.api_url);

    let services = Services::new(RestClient::new(&config)?);

    // Handle CLI mode - print output and exit without the console
    if cli.cli {
        return match cli.command {
            Some(command) => handle_cli_command(command, &services).await,
            None => Err(anyhow!("CLI mode requires a command")),
        };
    }

    let start = Screen::from_path(&cli.page)
        .ok_or_else(|| anyhow!("Unknown page: {}", cli.page))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, services);
    app.set_initial_screen(start);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    match result {
        Ok(()) => {
            info!("DrTransfer console exited successfully");
            Ok(())
        }
        Err(e) => {
            error!("DrTransfer console encountered an error: {}", e);
            Err(e)
        }
    }
}

/// Handle CLI mode commands - print output and exit
async fn handle_cli_command(command: Commands, services: &Services) -> Result<()> {
    match command {
        Commands::List { entity } => {
            let entity = Commands::parse_entity(&entity)?;
            info!("Listing {:?}", entity);
            let view = list_view(entity, services).await?;
            println!("{}", view.to_plain_text());
        }
    }
    Ok(())
}
