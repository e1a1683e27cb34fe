//! Status command implementation.

use super::Remote;
use postfeed_engine::FeedTransport;
use postfeed_protocol::StatusUpdate;

/// Runs the status command.
pub fn run(remote: &Remote, text: String) -> Result<(), Box<dyn std::error::Error>> {
    let transport = remote.connect()?;
    let update = StatusUpdate { status: text };
    transport.update_status(&update)?;

    println!("Status updated: {}", update.status);
    Ok(())
}
