//! Paper data model shared by the store, orchestrators and API.

use serde::{Deserialize, Serialize};

/// A research paper.
///
/// `id` is the external source identifier (the arXiv id for searched papers) and is
/// the store's upsert key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Stable external identifier.
    pub id: String,

    /// Paper title.
    #[serde(default)]
    pub title: String,

    /// Author names in publication order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Abstract text.
    #[serde(default)]
    pub r#abstract: String,

    /// Publication year.
    #[serde(default)]
    pub year: i32,

    /// PDF retrieval URL.
    #[serde(default)]
    pub url: String,

    /// Full extracted text, when the PDF was processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,

    /// Embedded images, when the PDF was processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<PaperImage>>,

    /// Free-text keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Paper {
    /// Whether non-empty extracted text is attached.
    #[must_use]
    pub fn has_full_text(&self) -> bool {
        self.full_text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Whether at least one embedded image is attached.
    #[must_use]
    pub fn has_images(&self) -> bool {
        self.images.as_ref().is_some_and(|i| !i.is_empty())
    }

    /// The text QA should read: full text when present, otherwise the abstract.
    #[must_use]
    pub fn content(&self) -> &str {
        match self.full_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.r#abstract,
        }
    }

    /// Attached images, or an empty slice.
    #[must_use]
    pub fn image_list(&self) -> &[PaperImage] {
        self.images.as_deref().unwrap_or_default()
    }

    /// Build the wire summary returned by `/search`.
    #[must_use]
    pub fn summary(&self) -> PaperSummary {
        PaperSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            authors: self.authors.clone(),
            r#abstract: self.r#abstract.clone(),
            year: self.year,
            url: self.url.clone(),
            has_full_text: self.has_full_text(),
            has_images: self.has_images(),
        }
    }
}

/// An image embedded in a paper's PDF.
///
/// Identity is structural: `(page, index, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperImage {
    /// 1-based page number.
    pub page: u32,

    /// 1-based position of the image on its page.
    pub index: u32,

    /// Image format (`jpeg`, `png`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Base64-encoded image bytes.
    #[serde(default)]
    pub data: String,
}

impl PaperImage {
    /// Structural identity used by the store to merge image nodes.
    #[must_use]
    pub fn key(&self) -> ImageKey {
        ImageKey { page: self.page, index: self.index, kind: self.kind.clone() }
    }
}

/// Structural identity of an image node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageKey {
    /// 1-based page number.
    pub page: u32,
    /// 1-based position on the page.
    pub index: u32,
    /// Image format.
    pub kind: String,
}

/// Paper metadata with derived content flags, as listed by `/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    /// Stable external identifier.
    pub id: String,
    /// Paper title.
    pub title: String,
    /// Author names in publication order.
    pub authors: Vec<String>,
    /// Abstract text.
    pub r#abstract: String,
    /// Publication year.
    pub year: i32,
    /// PDF retrieval URL.
    pub url: String,
    /// Whether full text was extracted.
    pub has_full_text: bool,
    /// Whether images were extracted.
    pub has_images: bool,
}

/// A paper returned by a related-papers query together with its overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPaper {
    /// The related paper.
    pub paper: Paper,
    /// Number of keywords shared with the source paper.
    pub shared_keywords: u64,
}
