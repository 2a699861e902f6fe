use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pcb_drc::server::handlers::{apply_async_result, dispatch};
use pcb_drc::server::protocol::{error_codes, to_line, Request, Response};
use pcb_drc::server::{ServerEvent, ServerState};

fn init_tracing() {
    // stdout carries the protocol, so diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn spawn_stdin_reader(tx: Sender<ServerEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if tx.send(ServerEvent::Line(l)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("Error reading stdin: {}", e),
            }
        }
        let _ = tx.send(ServerEvent::InputClosed);
    });
}

fn write_line(out: &mut impl Write, line: &str) -> anyhow::Result<()> {
    writeln!(out, "{}", line).context("Failed to write to stdout")?;
    out.flush().context("Failed to flush stdout")
}

fn run(rx: Receiver<ServerEvent>, tx: Sender<ServerEvent>) -> anyhow::Result<()> {
    let mut state = ServerState::new();
    let mut stdout = io::stdout();

    for event in rx {
        match event {
            ServerEvent::InputClosed => break,
            ServerEvent::DrcFinished(result) => {
                let errors = result.report.errors.len();
                if let Some(notification) = apply_async_result(&mut state, result) {
                    info!(errors, "Async DRC completed");
                    write_line(&mut stdout, &to_line(&notification))?;
                }
            }
            ServerEvent::Line(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let response = match serde_json::from_str::<Request>(&line) {
                    Ok(request) => dispatch(&mut state, request, Some(tx.clone())),
                    Err(e) => {
                        warn!("Failed to parse request: {}", e);
                        Response::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", e))
                    }
                };
                write_line(&mut stdout, &to_line(&response))?;
            }
        }
    }
    Ok(())
}

fn main() {
    init_tracing();
    info!("Starting DRC server...");

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx.clone());

    if let Err(e) = run(rx, tx) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    info!("Shutting down...");
}
