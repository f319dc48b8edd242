mod common;
mod config;
mod console;
mod network;
mod ui;

use std::error::Error;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use network::{ChatConnection, ConnectOptions};
use tokio::task::JoinHandle;
use ui::ChatApp;

use config::{AppConfig, Overrides, TransportKind};

/// Thời gian chờ tầng mạng gửi gói disconnect khi đóng cửa sổ
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "chatroom-client",
    version,
    about = "Desktop client for a Socket.IO chat room"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Server host, like the page's document.domain
    #[arg(long, env = "CHAT_HOST")]
    host: Option<String>,
    /// Server port, like the page's location.port
    #[arg(long, env = "CHAT_PORT")]
    port: Option<u16>,
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,
    /// Cookie header sent with the handshake, e.g. `session=...`
    #[arg(long, env = "CHAT_COOKIE", hide_env_values = true)]
    cookie: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Read messages from stdin and print the room to stdout (no window)
    Console,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config).with_overrides(Overrides {
        host: cli.host,
        port: cli.port,
        transport: cli.transport,
        cookie: cli.cookie,
    });
    log::info!(
        "Chat endpoint {} ({:?} transport)",
        app_config.endpoint(),
        app_config.transport
    );

    let (connection, network) = network::spawn(ConnectOptions::from(&app_config));

    if cli.mode == Some(Mode::Console) {
        console::run(connection, network).await?;
        return Ok(());
    }

    run_full_client(&app_config, connection, network).await?;
    Ok(())
}

async fn run_full_client(
    app_config: &AppConfig,
    connection: ChatConnection,
    network: JoinHandle<()>,
) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    let mut connection = Some(connection);
    let title = app_config.window_title.clone();

    let result = eframe::run_native(
        &app_config.window_title,
        options,
        Box::new(move |cc| {
            let connection = connection
                .take()
                .expect("ChatApp should only be initialized once");

            log::info!("Chat window opened");

            Ok(Box::new(ChatApp::new(cc, connection, title.clone())))
        }),
    );

    // ChatApp đã bị drop, widget đã gửi lệnh disconnect
    if tokio::time::timeout(SHUTDOWN_GRACE, network).await.is_err() {
        log::warn!("Network task did not stop within {SHUTDOWN_GRACE:?}");
    }

    result
}
