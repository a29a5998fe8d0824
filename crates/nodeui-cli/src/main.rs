mod commands;

use clap::Parser;
use nodeui_core::ConnectionArgs;
use nodeui_install::NodeUiDirs;
use nodeui_ui::Exit;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_appender::{non_blocking::WorkerGuard, rolling};

#[derive(Parser, Debug)]
#[command(name = "nodeui")]
#[command(about = "Terminal dashboard for an Algorand node")]
#[command(version)]
struct Cli {
    /// Algod REST address, e.g. localhost:8080
    #[arg(short = 'u', long, env = "ALGOD_URL")]
    algod_url: Option<String>,

    /// Algod API token
    #[arg(short = 't', long, env = "ALGOD_TOKEN", hide_env_values = true)]
    algod_token: Option<String>,

    /// Algod admin API token, enables catchup and node shutdown
    #[arg(short = 'a', long, env = "ALGOD_ADMIN_TOKEN", hide_env_values = true)]
    algod_admin_token: Option<String>,

    /// Node data directory; tokens and address are read from it
    #[arg(short = 'd', long, env = "ALGORAND_DATA")]
    algod_data_dir: Option<PathBuf>,

    /// Comma separated account addresses to watch
    #[arg(short = 'w', long, env = "WATCH_LIST", value_delimiter = ',')]
    watch_list: Vec<String>,
}

impl Cli {
    fn connection_args(&self) -> ConnectionArgs {
        ConnectionArgs {
            url: self.algod_url.clone(),
            token: self.algod_token.clone(),
            admin_token: self.algod_admin_token.clone(),
            data_dir: self.algod_data_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    match commands::dashboard(cli.connection_args(), &cli.watch_list).await {
        Ok(Exit::Requested) => {
            println!("UI terminated.");
            ExitCode::SUCCESS
        }
        Ok(Exit::Failed(reason)) => {
            tracing::error!("{reason}");
            eprintln!("{reason}");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    // The terminal belongs to the UI, so logs only go to stderr as a last resort.
    let log_dir = NodeUiDirs::new().map(|dirs| dirs.log_dir());
    if let Ok(log_dir) = log_dir
        && std::fs::create_dir_all(&log_dir).is_ok()
    {
        let log_path = log_dir.join("nodeui.log");
        if std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .is_ok()
        {
            let file_appender = rolling::never(&log_dir, "nodeui.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
    None
}
