//! Post command implementation.

use super::Remote;
use postfeed_engine::FeedTransport;
use postfeed_protocol::{ImageField, ImageUpload, PostForm, PostId, SubmitTarget};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs the post command.
pub fn run(
    remote: &Remote,
    id: Option<String>,
    title: String,
    content: String,
    image: Option<PathBuf>,
    image_ref: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = match image {
        Some(path) => ImageField::Upload(load_image(&path)?),
        None => ImageField::Reference(image_ref.unwrap_or_default()),
    };
    let target = match id {
        Some(id) => SubmitTarget::Update(PostId::new(id)),
        None => SubmitTarget::Create,
    };

    let transport = remote.connect()?;
    let post = transport.submit_post(&target, &PostForm::new(title, content, image))?;

    info!(id = ?post.as_ref().map(|p| p.id.as_str()), "post saved");
    let id = match (&post, &target) {
        (Some(post), _) => post.id.to_string(),
        (None, SubmitTarget::Update(id)) => id.to_string(),
        (None, SubmitTarget::Create) => "(id not returned)".to_string(),
    };
    match target {
        SubmitTarget::Create => println!("Created post {}", id),
        SubmitTarget::Update(_) => println!("Updated post {}", id),
    }
    Ok(())
}

fn load_image(path: &Path) -> Result<ImageUpload, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("image path has no file name")?;
    Ok(ImageUpload::new(file_name, data).with_content_type(content_type(path)))
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type(Path::new("a/cat.PNG")), "image/png");
        assert_eq!(content_type(Path::new("dog.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("notes")), "application/octet-stream");
    }
}
