#![forbid(unsafe_code)]

//! `ceo-inbox-ctl` — operator CLI companion for `ceo-inbox`.
//!
//! Talks to the server's HTTP inbox API to list, create, re-status and
//! remove entries from a terminal.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(
    name = "ceo-inbox-ctl",
    about = "Operator CLI for the ceo-inbox server",
    version,
    long_about = None
)]
struct Cli {
    /// Base URL of the running server.
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List inbox entries, newest first.
    List,

    /// Submit a manual alert.
    Create {
        /// Alert text.
        message: String,
        /// Priority: low, medium or high.
        #[arg(long)]
        priority: Option<String>,
    },

    /// Set the triage status of an entry.
    Status {
        /// Entry ID.
        id: i64,
        /// New status: pending, read or processed.
        status: String,
    },

    /// Remove an entry.
    Remove {
        /// Entry ID.
        id: i64,
    },
}

fn main() {
    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(send_command(&args.url, &args.command)) {
        Ok((true, body)) => {
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
        }
        Ok((false, body)) => {
            let err_msg = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            eprintln!("Error: {err_msg}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Failed to reach server: {err}");
            eprintln!("Is ceo-inbox running at '{}'?", args.url);
            std::process::exit(1);
        }
    }
}

/// Issue the HTTP request for `command` and return `(success, json body)`.
async fn send_command(
    base: &str,
    command: &Command,
) -> std::result::Result<(bool, Value), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let base = base.trim_end_matches('/');

    let request = match command {
        Command::List => client.get(format!("{base}/inbox")),
        Command::Create { message, priority } => client
            .post(format!("{base}/inbox"))
            .json(&json!({ "message": message, "priority": priority })),
        Command::Status { id, status } => client
            .patch(format!("{base}/inbox/{id}"))
            .json(&json!({ "status": status })),
        Command::Remove { id } => client.delete(format!("{base}/inbox/{id}")),
    };

    let response = request.send().await?;
    let ok = response.status().is_success();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    Ok((ok, body))
}
