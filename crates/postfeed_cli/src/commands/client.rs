//! Blocking HTTP client backed by ureq.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use postfeed_engine::{FeedConfig, HttpBody, HttpClient, HttpRequest, HttpResponse};
use postfeed_protocol::{FormValue, PostForm};
use std::io::Read;
use uuid::Uuid;

/// Characters percent-encoded in a part's `filename` parameter (RFC 7578 4.2).
const FILENAME_SET: &AsciiSet = &CONTROLS.add(b'"').add(b'%');

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// [`HttpClient`] over a ureq agent.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Creates a client honouring the configured timeout.
    pub fn new(config: &FeedConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let mut call = self
            .agent
            .request(request.method.as_str(), &request.url)
            .set("Accept", "application/json");
        if let Some(token) = &request.bearer_token {
            call = call.set("Authorization", &format!("Bearer {}", token));
        }

        let response = match &request.body {
            HttpBody::Empty => call.call(),
            HttpBody::Json(body) => call
                .set("Content-Type", "application/json")
                .send_bytes(body),
            HttpBody::Multipart(form) => {
                let boundary = format!("postfeed-{}", Uuid::new_v4().simple());
                let body = encode_multipart(form, &boundary);
                call.set(
                    "Content-Type",
                    &format!("multipart/form-data; boundary={}", boundary),
                )
                .send_bytes(&body)
            }
        };

        match response {
            Ok(resp) => read_response(resp),
            Err(ureq::Error::Status(_, resp)) => read_response(resp),
            Err(ureq::Error::Transport(err)) => Err(err.to_string()),
        }
    }
}

fn read_response(response: ureq::Response) -> Result<HttpResponse, String> {
    let status = response.status();
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| format!("failed to read response body: {}", e))?;
    Ok(HttpResponse { status, body })
}

/// Encodes the three post fields as `multipart/form-data`.
pub fn encode_multipart(form: &PostForm, boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in form.fields() {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match value {
            FormValue::Text(text) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
            }
            FormValue::File(upload) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name,
                        utf8_percent_encode(&upload.file_name, FILENAME_SET)
                    )
                    .as_bytes(),
                );
                let content_type = upload
                    .content_type
                    .as_deref()
                    .filter(|t| !t.chars().any(|c| c.is_control()))
                    .unwrap_or(FALLBACK_CONTENT_TYPE);
                body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
                body.extend_from_slice(&upload.data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use postfeed_protocol::{ImageField, ImageUpload};

    #[test]
    fn multipart_text_fields() {
        let form = PostForm::new("Hi", "there", ImageField::Reference("images/a.png".into()));
        let body = String::from_utf8(encode_multipart(&form, "b")).unwrap();

        assert_eq!(
            body,
            "--b\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHi\r\n\
             --b\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\nthere\r\n\
             --b\r\nContent-Disposition: form-data; name=\"image\"\r\n\r\nimages/a.png\r\n\
             --b--\r\n"
        );
    }

    #[test]
    fn multipart_file_part() {
        let upload = ImageUpload::new("cat.png", vec![0x89u8, b'P']).with_content_type("image/png");
        let form = PostForm::new("t", "c", ImageField::Upload(upload));
        let body = encode_multipart(&form, "b");
        let text = String::from_utf8_lossy(&body);

        assert!(text.contains("name=\"image\"; filename=\"cat.png\"\r\nContent-Type: image/png\r\n\r\n"));
        assert!(body.windows(2).any(|w| w == [0x89, b'P']));
    }

    fn part_headers(body: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(body);
        let start = text.find("name=\"image\"").unwrap();
        let end = start + text[start..].find("\r\n\r\n").unwrap();
        let line_start = text[..start].rfind("\r\n").unwrap() + 2;
        text[line_start..end].split("\r\n").map(str::to_string).collect()
    }

    #[test]
    fn file_name_cannot_add_header_lines() {
        let upload = ImageUpload::new("a.png\r\nX-Injected: yes", vec![1u8])
            .with_content_type("image/png");
        let form = PostForm::new("t", "c", ImageField::Upload(upload));

        let headers = part_headers(&encode_multipart(&form, "b"));
        assert_eq!(
            headers,
            [
                "Content-Disposition: form-data; name=\"image\"; filename=\"a.png%0D%0AX-Injected: yes\"",
                "Content-Type: image/png",
            ]
        );
    }

    #[test]
    fn file_name_quotes_are_encoded() {
        let upload = ImageUpload::new("say \"hi\" 100%.png", vec![1u8]);
        let form = PostForm::new("t", "c", ImageField::Upload(upload));

        let headers = part_headers(&encode_multipart(&form, "b"));
        assert_eq!(
            headers[0],
            "Content-Disposition: form-data; name=\"image\"; filename=\"say %22hi%22 100%25.png\""
        );
        assert_eq!(headers[1], "Content-Type: application/octet-stream");
    }

    #[test]
    fn content_type_with_line_breaks_is_replaced() {
        let upload =
            ImageUpload::new("a.png", vec![1u8]).with_content_type("image/png\r\nX-Injected: yes");
        let form = PostForm::new("t", "c", ImageField::Upload(upload));

        let headers = part_headers(&encode_multipart(&form, "b"));
        assert_eq!(headers[1], "Content-Type: application/octet-stream");
        assert_eq!(headers.len(), 2);
    }
}
