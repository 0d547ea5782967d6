//! Single-page PDF serialization of a [`Layout`].
//!
//! Uses the standard Helvetica faces, which every viewer ships, so no font
//! program is embedded.

use chrono::{DateTime, Utc};

use super::layout::{Align, DrawOp, Font, Layout, PAGE_HEIGHT, PAGE_WIDTH, STROKE_WIDTH};
use super::metrics::{text_width, win_ansi_byte, MM_PER_PT};

/// Document information dictionary entries.
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Serialize `layout` as a one-page A4 PDF.
pub fn write_pdf(layout: &Layout, metadata: &PdfMetadata) -> Vec<u8> {
    let content = content_stream(layout);
    let mut pdf = PdfWriter::default();

    pdf.raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    pdf.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    let page = format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
         /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>",
        num(to_pt(PAGE_WIDTH)),
        num(to_pt(PAGE_HEIGHT))
    );
    pdf.object(3, page.as_bytes());
    pdf.object(
        4,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    pdf.object(
        5,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    stream.extend_from_slice(&content);
    stream.extend_from_slice(b"\nendstream");
    pdf.object(6, &stream);

    let mut info = b"<< /Producer (diaria-backend) /Title ".to_vec();
    info.extend_from_slice(&pdf_string(&metadata.title));
    info.extend_from_slice(b" /CreationDate ");
    let date = metadata.created_at.format("D:%Y%m%d%H%M%SZ").to_string();
    info.extend_from_slice(&pdf_string(&date));
    info.extend_from_slice(b" >>");
    pdf.object(7, &info);

    pdf.finish(1, 7)
}

fn content_stream(layout: &Layout) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("{} w\n", num(to_pt(STROKE_WIDTH))).as_bytes());

    for op in &layout.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
                align,
            } => {
                if text.is_empty() {
                    continue;
                }
                let left = match align {
                    Align::Left => *x,
                    Align::Center => x - text_width(text, *font, *size) / 2.0,
                };
                let resource = match font {
                    Font::Regular => "F1",
                    Font::Bold => "F2",
                };
                out.extend_from_slice(
                    format!(
                        "BT /{} {} Tf {} {} Td ",
                        resource,
                        num(*size),
                        num(to_pt(left)),
                        num(flip(*y))
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&pdf_string(text));
                out.extend_from_slice(b" Tj ET\n");
            }
            DrawOp::Line { x1, y1, x2, y2 } => {
                out.extend_from_slice(
                    format!(
                        "{} {} m {} {} l S\n",
                        num(to_pt(*x1)),
                        num(flip(*y1)),
                        num(to_pt(*x2)),
                        num(flip(*y2))
                    )
                    .as_bytes(),
                );
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
            } => {
                out.extend_from_slice(
                    format!(
                        "{} {} {} {} re S\n",
                        num(to_pt(*x)),
                        num(flip(y + height)),
                        num(to_pt(*width)),
                        num(to_pt(*height))
                    )
                    .as_bytes(),
                );
            }
        }
    }

    out
}

fn to_pt(mm: f64) -> f64 {
    mm / MM_PER_PT
}

/// Layout `y` (down from the top, mm) to PDF user space (up from the bottom, pt).
fn flip(y: f64) -> f64 {
    to_pt(PAGE_HEIGHT - y)
}

/// Compact decimal with at most two fractional digits.
fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Literal string in WinAnsi bytes with delimiters escaped.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for ch in text.chars() {
        match win_ansi_byte(ch) {
            b @ (b'(' | b')' | b'\\') => {
                out.push(b'\\');
                out.push(b);
            }
            b => out.push(b),
        }
    }
    out.push(b')');
    out
}

#[derive(Default)]
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, id: usize, body: &[u8]) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.buf.len());
        self.raw(format!("{} 0 obj\n", id).as_bytes());
        self.raw(body);
        self.raw(b"\nendobj\n");
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;
        self.raw(format!("xref\n0 {}\n0000000000 65535 f \n", count).as_bytes());
        let entries: Vec<String> = self
            .offsets
            .iter()
            .map(|offset| format!("{:010} 00000 n \n", offset))
            .collect();
        for entry in entries {
            self.raw(entry.as_bytes());
        }
        self.raw(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                count, root, info, xref_offset
            )
            .as_bytes(),
        );
        self.buf
    }
}
