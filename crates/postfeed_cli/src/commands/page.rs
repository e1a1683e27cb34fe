//! Page command implementation.

use super::Remote;
use postfeed_engine::{FeedTransport, ImageResolver, PageCursor, PostRecord};
use serde::Serialize;

/// One fetched page.
#[derive(Debug, Serialize)]
pub struct PageResult {
    /// Page number.
    pub page: u32,
    /// Last page of the collection.
    pub last_page: u32,
    /// Total number of posts.
    pub total: u64,
    /// Posts on the page.
    pub posts: Vec<PostRecord>,
}

/// Runs the page command.
pub fn run(remote: &Remote, page: u32, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if page == 0 {
        return Err("pages are numbered from 1".into());
    }
    let config = remote.config();
    let transport = remote.connect()?;
    let resolver = ImageResolver::new(config.base_directory()?);

    let fetched = transport.fetch_posts(page)?;
    let cursor = PageCursor::new(config.page_size);
    let result = PageResult {
        page,
        last_page: cursor.last_page(fetched.total_items),
        total: fetched.total_items,
        posts: fetched
            .posts
            .into_iter()
            .map(|raw| PostRecord::from_raw(raw, &resolver))
            .collect(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text(&result),
    }
    Ok(())
}

fn print_text(result: &PageResult) {
    println!(
        "Page {} of {} ({} posts total)",
        result.page, result.last_page, result.total
    );
    println!("==================================");
    if result.posts.is_empty() {
        println!("(no posts)");
    }
    for post in &result.posts {
        println!();
        println!("[{}] {}", post.id, post.title);
        println!("  by {} at {}", post.author_name, post.created_at.to_rfc3339());
        if let Some(url) = &post.image_url {
            println!("  image: {}", url);
        }
        if !post.content.is_empty() {
            println!("  {}", post.content);
        }
    }
}
