//! postfeed CLI
//!
//! Command-line tools for a post feed backend.
//!
//! # Commands
//!
//! - `page` - Fetch and display one page of posts
//! - `post` - Create a post, or edit one with `--id`
//! - `delete` - Delete a post
//! - `status` - Update the viewer's status text
//! - `replay` - Replay a scenario file against an in-memory backend

mod commands;

use clap::{Parser, Subcommand};
use postfeed_engine::FeedError;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Post feed command-line tools.
#[derive(Parser)]
#[command(name = "postfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(global = true, short, long, env = "POSTFEED_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Bearer token
    #[arg(global = true, short, long, env = "POSTFEED_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and display one page of posts
    Page {
        /// Page number, from 1
        #[arg(default_value = "1")]
        page: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create a post, or edit an existing one
    Post {
        /// Edit this post instead of creating one
        #[arg(long)]
        id: Option<String>,

        /// Title
        #[arg(long)]
        title: String,

        /// Body text
        #[arg(long, default_value = "")]
        content: String,

        /// Image file to upload
        #[arg(long, conflicts_with = "image_ref")]
        image: Option<PathBuf>,

        /// Existing image reference to keep
        #[arg(long)]
        image_ref: Option<String>,
    },

    /// Delete a post
    Delete {
        /// Post ID
        id: String,
    },

    /// Update the viewer's status text
    Status {
        /// New status
        text: String,
    },

    /// Replay a scenario file against an in-memory backend
    Replay {
        /// Scenario JSON file
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let remote = commands::Remote {
        base_url: cli.base_url,
        token: cli.token,
        timeout: std::time::Duration::from_secs(cli.timeout),
    };

    let result = run(cli.command, &remote);
    if let Err(err) = &result {
        if is_temporary(err.as_ref()) {
            eprintln!("The failure looks temporary; the command can be retried.");
        }
    }
    result
}

fn run(command: Commands, remote: &commands::Remote) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Page { page, format } => {
            commands::page::run(remote, page, &format)?;
        }
        Commands::Post {
            id,
            title,
            content,
            image,
            image_ref,
        } => {
            commands::post::run(remote, id, title, content, image, image_ref)?;
        }
        Commands::Delete { id } => {
            commands::delete::run(remote, &id)?;
        }
        Commands::Status { text } => {
            commands::status::run(remote, text)?;
        }
        Commands::Replay { file, format } => {
            commands::replay::run(&file, &format)?;
        }
        Commands::Version => {
            println!("postfeed CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Returns true if the command failed on a condition that may clear up.
fn is_temporary(err: &(dyn Error + 'static)) -> bool {
    err.downcast_ref::<FeedError>()
        .is_some_and(FeedError::is_retryable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_failures() {
        let offline: Box<dyn Error> = Box::new(FeedError::transport_retryable("connection refused"));
        let unavailable: Box<dyn Error> = Box::new(FeedError::status(503, "Failed to fetch posts."));
        let missing: Box<dyn Error> = Box::new(FeedError::status(404, "Could not find post."));
        let other: Box<dyn Error> = "pages are numbered from 1".into();

        assert!(is_temporary(offline.as_ref()));
        assert!(is_temporary(unavailable.as_ref()));
        assert!(!is_temporary(missing.as_ref()));
        assert!(!is_temporary(other.as_ref()));
    }
}
