//! Figure captioning for image-related questions.

use std::sync::Arc;

use async_trait::async_trait;

use super::{GenerationOptions, GenerationRequest, TextGenerator};
use crate::error::ClientResult;
use crate::models::PaperImage;

const CHART_PROMPT: &str = "This image is a chart from a research paper. \
Describe the chart type, the axes, the plotted series and the main trend or comparison it shows.";

const GRAPH_PROMPT: &str = "This image is a graph from a research paper. \
Describe the nodes, the edges or curves, and what relationship the graph illustrates.";

const IMAGE_PROMPT: &str = "This image is a figure from a research paper. \
Describe what it shows, including any text, labels or numbers you can read.";

/// Trait for figure description engines.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// A short textual description of the image.
    async fn describe(&self, image: &PaperImage) -> ClientResult<String>;
}

/// Describes figures with a multimodal generation model.
pub struct VisionDescriber {
    generator: Arc<dyn TextGenerator>,
}

impl VisionDescriber {
    /// Wrap a generator whose model accepts images.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Prompt for the image, chosen from its declared type.
    #[must_use]
    pub fn prompt_for(kind: &str) -> &'static str {
        let kind = kind.to_lowercase();
        if kind.contains("chart") {
            CHART_PROMPT
        } else if kind.contains("graph") {
            GRAPH_PROMPT
        } else {
            IMAGE_PROMPT
        }
    }
}

#[async_trait]
impl ImageDescriber for VisionDescriber {
    async fn describe(&self, image: &PaperImage) -> ClientResult<String> {
        let request = GenerationRequest::new(Self::prompt_for(&image.kind), GenerationOptions::CAPTION)
            .with_image(image.data.clone());
        self.generator.generate(&request).await
    }
}

impl std::fmt::Debug for VisionDescriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionDescriber").field("model", &self.generator.model_name()).finish()
    }
}

/// Describes figures from their metadata when no vision model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataDescriber;

#[async_trait]
impl ImageDescriber for MetadataDescriber {
    async fn describe(&self, image: &PaperImage) -> ClientResult<String> {
        // base64 inflates by 4/3
        let approx_bytes = image.data.len() / 4 * 3;
        Ok(format!(
            "{} image of about {} KB (no visual description available)",
            image.kind,
            approx_bytes.div_ceil(1024)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_selection() {
        assert_eq!(VisionDescriber::prompt_for("Bar-Chart"), CHART_PROMPT);
        assert_eq!(VisionDescriber::prompt_for("graph"), GRAPH_PROMPT);
        assert_eq!(VisionDescriber::prompt_for("jpeg"), IMAGE_PROMPT);
    }

    #[tokio::test]
    async fn test_metadata_description() {
        let image = PaperImage {
            page: 2,
            index: 1,
            kind: "png".to_string(),
            data: "A".repeat(4096),
        };
        let text = MetadataDescriber.describe(&image).await.unwrap();
        assert_eq!(text, "png image of about 3 KB (no visual description available)");
    }
}
