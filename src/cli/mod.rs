use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod auth;
pub mod check;
pub mod draft;
pub mod scan;
pub mod serve;
pub mod slots;

#[derive(Subcommand)]
enum Command {
    /// Perform Google OAuth and store the refresh token
    Auth {},
    /// Run one inbox triage pass: classify, label, and draft replies
    Scan {},
    /// Check whether the calendar is free for a specific interval
    Check {
        /// Interval start, RFC3339 or a naive local timestamp
        #[arg(long)]
        start: String,

        /// Interval end; omit to use --duration instead
        #[arg(long)]
        end: Option<String>,

        /// Meeting length in minutes when --end is omitted
        #[arg(long)]
        duration: Option<i64>,
    },
    /// Find open slots on the calendar
    Slots {
        /// Days ahead to search
        #[arg(long)]
        horizon_days: Option<i64>,

        /// Meeting length in minutes
        #[arg(long)]
        duration: Option<i64>,

        /// Maximum number of slots to return
        #[arg(long)]
        max: Option<usize>,

        /// Search all hours of every day instead of business hours
        #[arg(long, action, default_value = "false")]
        all_hours: bool,
    },
    /// Draft a reply to a specific thread
    Draft {
        #[arg(long)]
        thread_id: String,
    },
    /// Run the API server with the triage job on a timer
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Some(Command::Auth {}) => {
            auth::run().await?;
        }
        Some(Command::Scan {}) => {
            scan::run().await?;
        }
        Some(Command::Check {
            start,
            end,
            duration,
        }) => {
            check::run(start, end, duration).await?;
        }
        Some(Command::Slots {
            horizon_days,
            duration,
            max,
            all_hours,
        }) => {
            slots::run(horizon_days, duration, max, all_hours).await?;
        }
        Some(Command::Draft { thread_id }) => {
            draft::run(thread_id).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await;
        }
        None => {}
    }

    Ok(())
}
