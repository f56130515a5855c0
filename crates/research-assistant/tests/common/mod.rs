//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use research_assistant::error::{ClientError, ClientResult};
use research_assistant::generation::{GenerationRequest, ImageDescriber, TextGenerator};
use research_assistant::models::{Paper, PaperImage};
use research_assistant::ranking::Embedder;

/// Generator that records prompts and replies with a fixed text, or fails.
pub struct FakeGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { reply: None, prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ClientResult<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.reply.clone().ok_or_else(|| ClientError::server(503, "engine offline"))
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

/// Describer that counts calls and echoes the image type.
#[derive(Default)]
pub struct CountingDescriber {
    calls: AtomicUsize,
}

impl CountingDescriber {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageDescriber for CountingDescriber {
    async fn describe(&self, image: &PaperImage) -> ClientResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("a {} showing accuracy over epochs", image.kind))
    }
}

/// Embedder that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[&str]) -> ClientResult<Vec<Vec<f32>>> {
        Err(ClientError::server(500, "embedding backend down"))
    }

    fn dimension(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

pub fn paper(id: &str, title: &str, year: i32) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        authors: vec!["Ada Lovelace".to_string()],
        r#abstract: format!("{title} abstract."),
        year,
        url: format!("https://arxiv.org/pdf/{id}"),
        ..Paper::default()
    }
}

pub fn image(page: u32, index: u32, kind: &str) -> PaperImage {
    PaperImage { page, index, kind: kind.to_string(), data: "aGVsbG8=".to_string() }
}

/// Atom entry pointing its PDF link at `pdf_url`.
pub fn atom_entry(id: &str, title: &str, year: i32, pdf_url: &str, categories: &[&str]) -> String {
    let categories: String = categories
        .iter()
        .map(|c| format!(r#"<category term="{c}" scheme="http://arxiv.org/schemas/atom"/>"#))
        .collect();
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/{id}</id>
    <published>{year}-03-01T12:00:00Z</published>
    <title>{title}</title>
    <summary>Summary of {title}.</summary>
    <author><name>Grace Hopper</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/{id}" rel="alternate" type="text/html"/>
    <link title="pdf" href="{pdf_url}" rel="related" type="application/pdf"/>
    {categories}
  </entry>"#
    )
}

pub fn atom_feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query</title>
  {}
</feed>"#,
        entries.join("\n  ")
    )
}

/// A one-page PDF whose page shows `text`.
pub fn build_pdf(text: &str) -> Vec<u8> {
    build_pdf_pages(&[(text, &[])])
}

/// Image stream on a page: optional filter name and raw stream bytes.
pub type PageImage<'a> = (Option<&'a str>, &'a [u8]);

/// Multi-page document; each page draws one line of text and carries the
/// given 1x1 image XObjects in its resources, in order.
pub fn build_pdf_pages(pages: &[(&str, &[PageImage<'_>])]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for (text, images) in pages {
        let mut xobjects = lopdf::Dictionary::new();
        for (position, (filter, data)) in images.iter().enumerate() {
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            };
            if let Some(filter) = filter {
                dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
            }
            let image_id = doc.add_object(Stream::new(dict, data.to_vec()));
            xobjects.set(format!("Im{}", position + 1), image_id);
        }

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };
        if !images.is_empty() {
            resources.set("XObject", xobjects);
        }

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
