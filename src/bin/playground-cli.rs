use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use sgo_playground::execution::{CompileResponse, ExecutionResult};
use sgo_playground::http::page::StatusReport;

#[derive(Parser)]
#[command(name = "playground-cli")]
#[command(about = "Command-line client for the SGo playground", long_about = None)]
struct Cli {
    /// WebSocket endpoint of the playground.
    #[arg(short, long, default_value = "ws://localhost:5600/ws")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format SGo source
    Format {
        /// Source file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Translate SGo source to Go
    Translate { file: Option<PathBuf> },
    /// Translate and run SGo source remotely
    Execute {
        file: Option<PathBuf>,

        /// Print program output with the recorded timing
        #[arg(long)]
        replay: bool,
    },
    /// Show server status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (kind, file, replay) = match cli.command {
        Commands::Format { file } => ("format", file, false),
        Commands::Translate { file } => ("translate", file, false),
        Commands::Execute { file, replay } => ("execute", file, replay),
        Commands::Status => return print_status(&cli.url).await,
    };

    let source = read_source(file)?;
    let (mut socket, _) = connect_async(cli.url.as_str()).await?;
    let request = json!({ "type": kind, "value": source });
    socket.send(Message::text(request.to_string())).await?;

    while let Some(frame) = socket.next().await {
        let text = match frame? {
            Message::Text(text) => text.as_str().to_string(),
            Message::Binary(bytes) => String::from_utf8(bytes.to_vec())?,
            Message::Close(_) => break,
            _ => continue,
        };

        let response: Value = serde_json::from_str(&text)?;
        if response.get("type").and_then(Value::as_str) != Some(kind) {
            continue;
        }
        print_value(response.get("value").unwrap_or(&Value::Null), replay).await?;
        break;
    }

    socket.close(None).await.ok();
    Ok(())
}

fn read_source(file: Option<PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

async fn print_value(value: &Value, replay: bool) -> Result<(), Box<dyn std::error::Error>> {
    match value {
        Value::Null => eprintln!("(no result)"),
        Value::String(text) => println!("{}", text),
        Value::Object(_) => {
            let response = CompileResponse::from_slice(&serde_json::to_vec(value)?)?;
            match response.result() {
                ExecutionResult::Failed { errors } => eprintln!("{}", errors),
                ExecutionResult::Completed { events } => {
                    let mut stdout = std::io::stdout();
                    for event in events {
                        if replay {
                            tokio::time::sleep(event.delay()).await;
                        }
                        if event.kind.as_deref() == Some("stderr") {
                            eprint!("{}", event.message);
                        } else {
                            print!("{}", event.message);
                            stdout.flush()?;
                        }
                    }
                }
            }
        }
        other => println!("{}", other),
    }
    Ok(())
}

async fn print_status(ws_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut url = Url::parse(ws_url)?;
    let scheme = if url.scheme() == "wss" { "https" } else { "http" };
    url.set_scheme(scheme).map_err(|_| "cannot derive status URL")?;
    url.set_path("/status");

    let res = reqwest::get(url).await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        return Ok(());
    }

    let report: StatusReport = res.json().await?;
    println!("version:            {}", report.version);
    println!("status:             {}", report.status);
    println!("active connections: {}", report.active_connections);
    println!("queue depth:        {}", report.queue_depth);
    Ok(())
}
