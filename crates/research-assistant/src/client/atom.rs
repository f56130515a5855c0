//! arXiv Atom feed parsing.

use chrono::{DateTime, Datelike};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::ArxivEntry;
use crate::error::{ClientError, ClientResult};

/// Parse an arXiv Atom response into entries, in feed order.
///
/// arXiv reports query errors as a feed containing a single entry whose id points at
/// `/api/errors`; that case is returned as [`ClientError::BadRequest`].
pub fn parse_feed(xml: &str) -> ClientResult<Vec<ArxivEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut in_author = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                text.clear();
                match e.local_name().as_ref() {
                    b"entry" => current = Some(EntryBuilder::default()),
                    b"author" => in_author = true,
                    _ => {
                        if let Some(entry) = current.as_mut() {
                            entry.read_attributes(&e);
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    entry.read_attributes(&e);
                }
            }
            Ok(Event::Text(t)) => {
                let chunk = t
                    .unescape()
                    .map_err(|e| ClientError::malformed(format!("bad text in Atom feed: {e}")))?;
                text.push_str(&chunk);
            }
            Ok(Event::CData(c)) => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"entry" {
                    if let Some(done) = current.take() {
                        entries.push(done.finish()?);
                    }
                } else if let Some(entry) = current.as_mut() {
                    match name.as_ref() {
                        b"id" => entry.id_url = normalize_ws(&text),
                        b"title" => entry.title = normalize_ws(&text),
                        b"summary" => entry.summary = normalize_ws(&text),
                        b"published" => entry.published = normalize_ws(&text),
                        b"name" if in_author => entry.authors.push(normalize_ws(&text)),
                        b"author" => in_author = false,
                        _ => {}
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ClientError::malformed(format!(
                    "invalid Atom feed at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(entries)
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id_url: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    categories: Vec<String>,
    pdf_url: Option<String>,
}

impl EntryBuilder {
    /// Pick up `<link>` and `<category>` attributes.
    fn read_attributes(&mut self, e: &BytesStart<'_>) {
        let mut href = None;
        let mut title = None;
        let mut kind = None;
        let mut term = None;

        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().map(|v| v.into_owned()).unwrap_or_default();
            match attr.key.as_ref() {
                b"href" => href = Some(value),
                b"title" => title = Some(value),
                b"type" => kind = Some(value),
                b"term" => term = Some(value),
                _ => {}
            }
        }

        match e.local_name().as_ref() {
            b"link" => {
                let is_pdf = title.as_deref() == Some("pdf")
                    || kind.as_deref() == Some("application/pdf");
                if is_pdf && self.pdf_url.is_none() {
                    self.pdf_url = href;
                }
            }
            b"category" | b"primary_category" => {
                if let Some(term) = term.filter(|t| !t.trim().is_empty()) {
                    if !self.categories.contains(&term) {
                        self.categories.push(term);
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> ClientResult<ArxivEntry> {
        if self.id_url.contains("/api/errors") {
            return Err(ClientError::bad_request(self.summary));
        }

        let id = self
            .id_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        if id.is_empty() {
            return Err(ClientError::malformed("Atom entry without an id"));
        }

        let pdf_url = self.pdf_url.unwrap_or_else(|| self.id_url.replacen("/abs/", "/pdf/", 1));

        Ok(ArxivEntry {
            id,
            title: self.title,
            summary: self.summary,
            authors: self.authors,
            year: parse_year(&self.published),
            pdf_url,
            categories: self.categories,
        })
    }
}

fn parse_year(published: &str) -> Option<i32> {
    DateTime::parse_from_rfc3339(published)
        .map(|dt| dt.year())
        .ok()
        .or_else(|| published.get(0..4)?.parse().ok())
}

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
