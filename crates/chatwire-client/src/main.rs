//! chatwire terminal client
//!
//! - Config: `chatwire.yaml` (or the path given as first argument)
//! - Connects to the configured endpoint, prints replies as they arrive
//! - Every stdin line is sent as a chat turn; `!`-prefixed lines are commands

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use chatwire_client::channel::{ChannelOptions, RealtimeChannel};
use chatwire_client::config;
use chatwire_client::session::ChatSession;
use chatwire_client::transport::WsConnector;
use chatwire_core::error::ErrorCode;
use chatwire_core::model::Role;
use chatwire_core::store::InMemoryStore;

const HELP: &str = "\
Commands:
  !help       show this help
  !history    show the conversation so far
  !clear      clear the conversation
  !status     show connection state
  !reconnect  drop and re-open the connection
  !exit       quit (also !quit)
Anything else is sent as a message.";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    History,
    Clear,
    Status,
    Reconnect,
    Exit,
    Unknown(String),
}

impl Command {
    fn parse(input: &str) -> Option<Self> {
        let cmd = input.strip_prefix('!')?.trim().to_lowercase();
        Some(match cmd.as_str() {
            "help" => Command::Help,
            "history" => Command::History,
            "clear" => Command::Clear,
            "status" => Command::Status,
            "reconnect" => Command::Reconnect,
            "exit" | "quit" => Command::Exit,
            _ => Command::Unknown(cmd),
        })
    }
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "chatwire.yaml".into());
    let cfg = config::load_or_default(&path).expect("config load failed");

    let channel = RealtimeChannel::new(ChannelOptions::from(&cfg.channel), Arc::new(WsConnector::new()));
    let session = ChatSession::new(channel.clone(), Arc::new(InMemoryStore::new()));

    channel.on_message(|payload| println!("Assistant: {}", payload.message));

    let mut state_rx = channel.subscribe_state();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow_and_update();
            println!("[connection: {state}]");
        }
    });

    println!("chatwire -> {}", channel.endpoint());
    println!("{HELP}\n");

    if let Err(e) = channel.connect().await {
        println!("! could not connect: {e} (use !reconnect to retry)");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };

        match Command::parse(line.trim()) {
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::History) => {
                for m in session.history() {
                    let who = match m.role {
                        Role::User => "You",
                        Role::Assistant => "Assistant",
                    };
                    println!("{} {who}: {}", m.timestamp.format("%H:%M:%S"), m.content);
                }
            }
            Some(Command::Clear) => {
                session.clear();
                println!("conversation cleared");
            }
            Some(Command::Status) => println!("{} ({})", channel.state(), channel.endpoint()),
            Some(Command::Reconnect) => {
                channel.disconnect();
                if let Err(e) = channel.connect().await {
                    println!("! could not connect: {e}");
                }
            }
            Some(Command::Exit) => break,
            Some(Command::Unknown(cmd)) => println!("unknown command: !{cmd} (try !help)"),
            None => match session.submit(&line) {
                Ok(_) => {}
                Err(e) if e.code() == ErrorCode::NotConnected => {
                    println!("! not connected, message not sent (use !reconnect)");
                }
                Err(e) => println!("! send failed: {e}"),
            },
        }
    }

    channel.disconnect();
    println!("bye");
}
