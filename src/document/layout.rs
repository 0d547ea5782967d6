//! Page geometry, draw operations, text wrapping and table layout.
//!
//! All coordinates are millimetres measured from the top-left corner of an
//! A4 page. Text `y` values are baselines.

use super::metrics::{text_width, MM_PER_PT};

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 20.0;
pub const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

/// Stroke width for rules and table borders.
pub const STROKE_WIDTH: f64 = 0.2;

/// Line spacing of cell text relative to the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.15;
/// Share of the font size that sits above the baseline.
const ASCENT_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        font: Font,
        size: f64,
        align: Align,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// Everything drawn on the single page of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub ops: Vec<DrawOp>,
    /// Set when something was placed below the bottom edge of the page.
    pub overflowed: bool,
}

impl Layout {
    pub fn text(&mut self, x: f64, y: f64, text: impl Into<String>, font: Font, size: f64) {
        self.push_text(x, y, text.into(), font, size, Align::Left);
    }

    pub fn centered_text(&mut self, x: f64, y: f64, text: impl Into<String>, font: Font, size: f64) {
        self.push_text(x, y, text.into(), font, size, Align::Center);
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.track(y1.max(y2));
        self.ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.track(y + height);
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
        });
    }

    /// Draw pre-wrapped lines starting at baseline `y`, `line_height` apart.
    pub fn lines(&mut self, x: f64, y: f64, lines: &[String], font: Font, size: f64, line_height: f64) {
        for (i, line) in lines.iter().enumerate() {
            self.text(x, y + i as f64 * line_height, line.clone(), font, size);
        }
    }

    /// Text content in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn push_text(&mut self, x: f64, y: f64, text: String, font: Font, size: f64, align: Align) {
        self.track(y);
        self.ops.push(DrawOp::Text {
            x,
            y,
            text,
            font,
            size,
            align,
        });
    }

    fn track(&mut self, y: f64) {
        if y > PAGE_HEIGHT {
            self.overflowed = true;
        }
    }
}

/// Greedy word wrap of `text` into lines no wider than `max_width`.
///
/// Newlines always break. A word wider than a whole line is split between
/// characters. Empty input produces a single empty line.
pub fn wrap_text(text: &str, max_width: f64, font: Font, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph.trim_end_matches('\r'), max_width, font, size, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, max_width: f64, font: Font, size: f64, lines: &mut Vec<String>) {
    let fits = |s: &str| text_width(s, font, size) <= max_width;
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        if !fits(word) {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if fits(&candidate) {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    lines.push(current);
}

/// Height in millimetres of one line of cell text at `size` points.
pub fn cell_line_height(size: f64) -> f64 {
    size * LINE_HEIGHT_FACTOR * MM_PER_PT
}

/// Column of a [`Table`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Column {
    /// Fixed width; columns without one share the remaining width evenly.
    pub width: Option<f64>,
    pub bold: bool,
}

/// Rows of text cells laid out with fixed column widths.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub font_size: f64,
    pub padding: f64,
    /// Draw a border around every cell.
    pub bordered: bool,
    pub width: f64,
}

impl Table {
    /// Borderless key/value grid.
    pub fn plain(rows: Vec<Vec<String>>, columns: usize) -> Self {
        Self {
            columns: vec![Column::default(); columns],
            rows,
            font_size: 9.0,
            padding: 1.0,
            bordered: false,
            width: CONTENT_WIDTH,
        }
    }

    /// Table with a border around each cell.
    pub fn grid(rows: Vec<Vec<String>>, columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows,
            font_size: 9.0,
            padding: 1.76,
            bordered: true,
            width: CONTENT_WIDTH,
        }
    }

    pub fn column_widths(&self) -> Vec<f64> {
        let fixed: f64 = self.columns.iter().filter_map(|c| c.width).sum();
        let auto = self.columns.iter().filter(|c| c.width.is_none()).count();
        let shared = if auto > 0 {
            ((self.width - fixed) / auto as f64).max(0.0)
        } else {
            0.0
        };
        self.columns
            .iter()
            .map(|c| c.width.unwrap_or(shared))
            .collect()
    }

    /// Lay the table out with its top-left corner at (`x`, `y`).
    ///
    /// Returns the `y` of the table's bottom edge.
    pub fn draw(&self, layout: &mut Layout, x: f64, y: f64) -> f64 {
        let widths = self.column_widths();
        let line_height = cell_line_height(self.font_size);
        let ascent = self.font_size * MM_PER_PT * ASCENT_FACTOR;
        let mut top = y;

        for row in &self.rows {
            let cells: Vec<(Vec<String>, Font)> = widths
                .iter()
                .enumerate()
                .map(|(i, width)| {
                    let font = if self.columns[i].bold {
                        Font::Bold
                    } else {
                        Font::Regular
                    };
                    let text = row.get(i).map(String::as_str).unwrap_or("");
                    let inner = (width - 2.0 * self.padding).max(0.0);
                    (wrap_text(text, inner, font, self.font_size), font)
                })
                .collect();

            let max_lines = cells.iter().map(|(lines, _)| lines.len()).max().unwrap_or(1);
            let row_height = max_lines as f64 * line_height + 2.0 * self.padding;

            let mut left = x;
            for ((lines, font), width) in cells.iter().zip(&widths) {
                if self.bordered {
                    layout.rect(left, top, *width, row_height);
                }
                layout.lines(
                    left + self.padding,
                    top + self.padding + ascent,
                    lines,
                    *font,
                    self.font_size,
                    line_height,
                );
                left += width;
            }

            top += row_height;
        }

        top
    }
}
