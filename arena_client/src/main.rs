//! Headless client binary.
//!
//! Usage:
//!   cargo run -p arena_client -- [--addr 127.0.0.1:40000] [--input-hz 20]
//!
//! The client connects, applies server snapshots, and emits intents at the
//! fixed input cadence. Key state is driven from stdin:
//!   hold <key>     - press and hold a key (e.g. `hold w`)
//!   release <key>  - release a key
//!   quit           - tear the session down and exit

use std::env;
use std::io::{BufRead, Write};

use anyhow::Context;
use arena_client::render::LogRender;
use arena_client::session::ClientSession;
use arena_shared::config::ClientConfig;
use tracing::info;

fn parse_args() -> ClientConfig {
    let mut cfg = ClientConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--input-hz" if i + 1 < args.len() => {
                cfg.input_hz = args[i + 1].parse().unwrap_or(cfg.input_hz);
                i += 2;
            }
            "--render-hz" if i + 1 < args.len() => {
                cfg.render_hz = args[i + 1].parse().unwrap_or(cfg.render_hz);
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(server = %cfg.server_addr, input_hz = cfg.input_hz, "starting client");

    let (session, handle) = ClientSession::connect(&cfg).await.context("connect")?;

    // Drive key state from stdin.
    let controls = handle.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
                break;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("hold"), Some(key)) => controls.press(key),
                (Some("release"), Some(key)) => controls.release(key),
                (Some("quit"), _) | (Some("exit"), _) => break,
                (Some(cmd), _) => println!("unknown command: {cmd}"),
                (None, _) => {}
            }
        }
        controls.shutdown();
    });

    println!("Connected. Commands: hold <key>, release <key>, quit.");
    println!();

    let mut render = LogRender::default();
    session.run(&mut render).await
}
