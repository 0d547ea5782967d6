//! Printable document generation.
//!
//! A record is first laid out into draw operations ([`layout`], [`render`])
//! and then serialized as PDF ([`pdf`]). The layout step knows nothing about
//! PDF, which keeps the section geometry testable on its own.

pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod render;

use chrono::Utc;

use crate::models::DiariaRecord;
use layout::Layout;
use pdf::{write_pdf, PdfMetadata};

/// A generated document ready to be downloaded.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub layout: Layout,
}

/// Render `record` into a single-page PDF.
pub fn render_document(record: &DiariaRecord) -> RenderedDocument {
    let filename = document_filename(record);
    let layout = render::layout_record(record);

    if layout.overflowed {
        tracing::warn!(
            "Document {} runs past the bottom of the page; content below the edge is clipped",
            filename
        );
    }

    let metadata = PdfMetadata {
        title: filename.trim_end_matches(".pdf").to_string(),
        created_at: Utc::now(),
    };
    let bytes = write_pdf(&layout, &metadata);

    tracing::debug!("Rendered {} ({} bytes)", filename, bytes.len());

    RenderedDocument {
        filename,
        bytes,
        layout,
    }
}

/// `Allowance_<name>_<date>.pdf`, with whitespace runs in the name turned into
/// `_` and slashes in the departure date turned into `-`.
pub fn document_filename(record: &DiariaRecord) -> String {
    format!(
        "Allowance_{}_{}.pdf",
        collapse_whitespace(&record.servant.name, "_"),
        record.trip.departure_date.replace('/', "-")
    )
}

fn collapse_whitespace(s: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push_str(replacement);
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
