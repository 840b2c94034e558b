//! Text extraction boundary
//!
//! Heavy parsing codecs (PDF, DOCX) live outside this crate; the core only
//! sees `extract(bytes, content_type) -> String`.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for extracting plain text from uploaded file bytes
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text, keyed by MIME content type
    async fn extract(&self, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Extractor name for logging
    fn name(&self) -> &str;
}

/// Extractor for plain-text formats (txt, markdown, csv)
///
/// Anything that is not valid UTF-8 text is an extraction error; binary
/// formats must be routed to an external codec instead.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim();

        match essence {
            "text/plain" | "text/markdown" | "text/csv" => {
                String::from_utf8(bytes.to_vec()).map_err(|e| {
                    Error::extraction("<upload>", format!("invalid UTF-8: {}", e))
                })
            }
            other => Err(Error::extraction(
                "<upload>",
                format!("no codec for content type '{}'", other),
            )),
        }
    }

    fn name(&self) -> &str {
        "plain_text"
    }
}
