//! PDF download and extraction.
//!
//! Text comes from every page in order, separated by a blank line. Embedded
//! images are returned base64-encoded, numbered from 1 per page, with their
//! format derived from the image stream's compression filter.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lopdf::Document;
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::client::{build_http_client, check_status};
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::PaperImage;

/// Text and images extracted from one PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfExtraction {
    /// All pages joined with `"\n\n"`.
    pub text: String,
    /// Embedded images ordered by page, then position on the page.
    pub images: Vec<PaperImage>,
}

/// Downloads PDFs and pulls out their text and images.
#[derive(Clone)]
pub struct PdfExtractor {
    client: ClientWithMiddleware,
    max_bytes: usize,
}

impl PdfExtractor {
    /// Create an extractor with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Create an extractor that shares an existing HTTP client.
    #[must_use]
    pub fn with_client(client: ClientWithMiddleware, config: &Config) -> Self {
        Self { client, max_bytes: config.max_pdf_bytes }
    }

    /// Download and extract a PDF. Any failure is logged and yields `None`.
    pub async fn extract(&self, url: &str) -> Option<PdfExtraction> {
        match self.try_extract(url).await {
            Ok(extraction) => {
                tracing::debug!(
                    url = %url,
                    chars = extraction.text.len(),
                    images = extraction.images.len(),
                    "PDF extracted"
                );
                Some(extraction)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "PDF extraction failed");
                None
            }
        }
    }

    /// Download and extract a PDF, reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, oversize body or
    /// a document lopdf cannot read.
    pub async fn try_extract(&self, url: &str) -> ClientResult<PdfExtraction> {
        let bytes = self.download(url).await?;
        tokio::task::spawn_blocking(move || parse_pdf(&bytes))
            .await
            .map_err(|e| ClientError::malformed(format!("PDF parser task failed: {e}")))?
    }

    async fn download(&self, url: &str) -> ClientResult<Vec<u8>> {
        let url = Url::parse(url)
            .map_err(|e| ClientError::bad_request(format!("invalid PDF URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::bad_request(format!(
                "unsupported PDF URL scheme '{}'",
                url.scheme()
            )));
        }

        let response = self.client.get(url).send().await?;
        let mut response = check_status(response).await?;

        if let Some(declared) = response.content_length() {
            let declared = usize::try_from(declared).unwrap_or(usize::MAX);
            if declared > self.max_bytes {
                return Err(ClientError::TooLarge { size: declared, limit: self.max_bytes });
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(ClientError::TooLarge {
                    size: bytes.len() + chunk.len(),
                    limit: self.max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for PdfExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfExtractor").field("max_bytes", &self.max_bytes).finish()
    }
}

/// Parse an in-memory PDF.
///
/// Pages whose text cannot be decoded contribute nothing; a document that
/// cannot be loaded at all is an error.
///
/// # Errors
///
/// Returns [`ClientError::Malformed`] if the bytes are not a readable PDF.
pub fn parse_pdf(bytes: &[u8]) -> ClientResult<PdfExtraction> {
    let document = Document::load_mem(bytes)
        .map_err(|e| ClientError::malformed(format!("unreadable PDF: {e}")))?;

    let mut pages_text = Vec::new();
    let mut images = Vec::new();

    for (page_number, page_id) in document.get_pages() {
        match document.extract_text(&[page_number]) {
            Ok(text) => pages_text.push(text.trim_end().to_string()),
            Err(e) => tracing::debug!(page = page_number, error = %e, "Skipping page text"),
        }

        let Ok(page_images) = document.get_page_images(page_id) else {
            continue;
        };
        for (position, image) in page_images.iter().enumerate() {
            images.push(PaperImage {
                page: page_number,
                index: u32::try_from(position + 1).unwrap_or(u32::MAX),
                kind: image_kind(image.filters.as_deref()).to_string(),
                data: STANDARD.encode(image.content),
            });
        }
    }

    Ok(PdfExtraction { text: pages_text.join("\n\n"), images })
}

/// Image format implied by a stream's filter chain.
///
/// Streams without an image codec filter hold decoded samples, labelled `raw`.
#[must_use]
pub fn image_kind(filters: Option<&[String]>) -> &'static str {
    let Some(filters) = filters else {
        return "raw";
    };
    for filter in filters {
        match filter.as_str() {
            "DCTDecode" => return "jpeg",
            "JPXDecode" => return "jpx",
            "JBIG2Decode" => return "jb2",
            "CCITTFaxDecode" => return "tiff",
            _ => {}
        }
    }
    "raw"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_from_filters() {
        let dct = vec!["DCTDecode".to_string()];
        assert_eq!(image_kind(Some(dct.as_slice())), "jpeg");

        let chain = vec!["FlateDecode".to_string(), "JPXDecode".to_string()];
        assert_eq!(image_kind(Some(chain.as_slice())), "jpx");

        let flate = vec!["FlateDecode".to_string()];
        assert_eq!(image_kind(Some(flate.as_slice())), "raw");
        assert_eq!(image_kind(None), "raw");
    }

    #[test]
    fn test_fax_and_jbig2() {
        assert_eq!(image_kind(Some(&["CCITTFaxDecode".to_string()][..])), "tiff");
        assert_eq!(image_kind(Some(&["JBIG2Decode".to_string()][..])), "jb2");
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let extractor = PdfExtractor::new(&Config::for_testing("http://127.0.0.1:1")).unwrap();
        let err = extractor.try_extract("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, ClientError::BadRequest { .. }));
        assert!(extractor.extract("not a url").await.is_none());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_pdf(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }
}
