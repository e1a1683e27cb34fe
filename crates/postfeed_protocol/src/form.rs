//! Outbound mutation payloads.

use crate::post::PostId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Which mutation a submitted form performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTarget {
    /// Create a new post.
    Create,
    /// Replace the content of an existing post.
    Update(PostId),
}

impl SubmitTarget {
    /// Returns the target post ID for updates.
    pub fn post_id(&self) -> Option<&PostId> {
        match self {
            SubmitTarget::Create => None,
            SubmitTarget::Update(id) => Some(id),
        }
    }
}

/// A binary image attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl ImageUpload {
    /// Creates an upload.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Sets the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Value of the `image` form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageField {
    /// A new or replacement image.
    Upload(ImageUpload),
    /// The previous image reference kept as-is; empty when there was none.
    Reference(String),
}

/// A single multipart field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormValue<'a> {
    /// Plain text.
    Text(&'a str),
    /// File part.
    File(&'a ImageUpload),
}

/// The multipart payload of a create or update request.
///
/// Always exactly three fields: `title`, `content`, `image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Image part.
    pub image: ImageField,
}

impl PostForm {
    /// Name of the title field.
    pub const TITLE: &'static str = "title";
    /// Name of the content field.
    pub const CONTENT: &'static str = "content";
    /// Name of the image field.
    pub const IMAGE: &'static str = "image";

    /// Creates a form.
    pub fn new(title: impl Into<String>, content: impl Into<String>, image: ImageField) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image,
        }
    }

    /// Returns the fields in submission order.
    pub fn fields(&self) -> [(&'static str, FormValue<'_>); 3] {
        let image = match &self.image {
            ImageField::Upload(upload) => FormValue::File(upload),
            ImageField::Reference(reference) => FormValue::Text(reference),
        };
        [
            (Self::TITLE, FormValue::Text(&self.title)),
            (Self::CONTENT, FormValue::Text(&self.content)),
            (Self::IMAGE, image),
        ]
    }
}

/// Body of a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// New status text.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_has_three_fields_in_order() {
        let form = PostForm::new("t", "c", ImageField::Reference(String::new()));
        let fields = form.fields();

        let names: Vec<_> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["title", "content", "image"]);
        assert_eq!(fields[2].1, FormValue::Text(""));
    }

    #[test]
    fn upload_is_a_file_part() {
        let upload = ImageUpload::new("cat.png", &b"\x89PNG"[..]).with_content_type("image/png");
        let form = PostForm::new("t", "c", ImageField::Upload(upload.clone()));

        assert_eq!(form.fields()[2].1, FormValue::File(&upload));
    }

    #[test]
    fn status_body_shape() {
        let body = serde_json::to_string(&StatusUpdate {
            status: "busy".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"status":"busy"}"#);
    }

    #[test]
    fn submit_target_id() {
        assert_eq!(SubmitTarget::Create.post_id(), None);
        let id = PostId::new("7");
        assert_eq!(SubmitTarget::Update(id.clone()).post_id(), Some(&id));
    }
}
