//! Delete command implementation.

use super::Remote;
use postfeed_engine::FeedTransport;
use postfeed_protocol::PostId;
use tracing::info;

/// Runs the delete command.
pub fn run(remote: &Remote, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let transport = remote.connect()?;
    let id = PostId::new(id);
    transport.delete_post(&id)?;

    info!(%id, "post deleted");
    println!("Deleted post {}", id);
    Ok(())
}
