use clap::{Arg, Command};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tasktrack::{
    api::{self, AppState},
    cache::LocalCache,
    client::{HttpTaskApi, TaskApi, TaskClient},
    config::{ClientConfig, ServerConfig},
    logging,
    store::TaskStore,
    task::StatusFilter,
    ui,
};
use tokio::net::TcpListener;

fn cli() -> Command {
    Command::new("tasktrack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("In-memory task API and a terminal board that mirrors it")
        .subcommand_required(true)
        .subcommand(Command::new("serve").about("Run the task API"))
        .subcommand(Command::new("board").about("Open the interactive task board"))
        .subcommand(
            Command::new("list").about("Print the server's tasks").arg(
                Arg::new("status")
                    .long("status")
                    .value_parser(["all", "active", "completed"])
                    .default_value("all")
                    .help("Only show tasks with this status"),
            ),
        )
        .subcommand(
            Command::new("add")
                .about("Create a task")
                .arg(Arg::new("title").required(true).help("Task title")),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("serve", _)) => serve().await?,
        Some(("board", _)) => board().await?,
        Some(("list", sub_matches)) => {
            logging::init_stderr(logging::CLIENT_DIRECTIVES);
            let status = sub_matches.get_one::<String>("status").map(String::as_str);
            list(StatusFilter::from_query(status)).await?;
        }
        Some(("add", sub_matches)) => {
            logging::init_stderr(logging::CLIENT_DIRECTIVES);
            let title = sub_matches
                .get_one::<String>("title")
                .map(String::as_str)
                .unwrap_or_default();
            add(title).await?;
        }
        _ => println!("Use --help for available commands."),
    }
    Ok(())
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_stderr(logging::SERVER_DIRECTIVES);
    let config = ServerConfig::from_env()?;

    let store = if config.seed_samples {
        TaskStore::with_samples()
    } else {
        TaskStore::new()
    };
    tracing::info!(tasks = store.len(), "Initial tasks loaded");

    let application = api::app(AppState::new(store.into_shared()), &config);
    let listener = TcpListener::bind(config.address).await?;
    let address = listener.local_addr()?;
    tracing::info!("Server is running on {address}");
    tracing::info!("API available at http://{address}/api");

    axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

async fn board() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();
    logging::init_file(&config.log_path, logging::CLIENT_DIRECTIVES)?;

    let mut client = TaskClient::new(
        HttpTaskApi::new(&config.api_url),
        LocalCache::new(&config.cache_path),
    );
    // A failed first fetch leaves the cached tasks on screen.
    let _ = client.start().await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("{:?}", err);
    }
    Ok(())
}

async fn list(filter: StatusFilter) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();
    let tasks = HttpTaskApi::new(&config.api_url).list(filter).await?;
    for task in &tasks {
        let mark = if task.completed { "x" } else { " " };
        println!("- [{mark}] {} ({}, created {})", task.title, task.id, task.created_at);
    }
    Ok(())
}

async fn add(title: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();
    let task = HttpTaskApi::new(&config.api_url).create(title).await?;
    println!("Created [{}] {}", task.id, task.title);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn list_status_is_restricted() {
        assert!(cli().try_get_matches_from(["tasktrack", "list", "--status", "done"]).is_err());
        let matches = cli()
            .try_get_matches_from(["tasktrack", "list", "--status", "completed"])
            .unwrap();
        let (_, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(
            sub_matches.get_one::<String>("status").map(String::as_str),
            Some("completed")
        );
    }
}
