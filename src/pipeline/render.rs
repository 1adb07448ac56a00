//! PDF rendering: lay the report out on A4 pages, then emit it with printpdf.
//!
//! Rendering is split in two so the page geometry can be tested without
//! parsing PDF bytes:
//!
//! 1. [`plan_layout`] walks the [`StructuredReport`] and produces a
//!    [`DocumentLayout`]: every line of text with its position, size and
//!    [`TextRole`], plus the horizontal rules under headings and table rows.
//! 2. [`emit_pdf`] replays that plan onto a `printpdf` document.
//!
//! Geometry follows the HTML stylesheet in [`super::template`]: A4, 2.5 cm
//! margins, a cover page, then sections flowing across pages. Text width is
//! estimated from the font size (Helvetica averages about half an em per
//! glyph), which is close enough for wrapping.
//!
//! ## Fonts
//!
//! Text is set in the PDF builtin Helvetica faces, which only cover the
//! WinAnsi (Latin) character set. Characters outside it, such as Arabic or
//! CJK script, are written as `?` in the PDF. The HTML rendition
//! (`report.html`) keeps them intact.
//!
//! ## Why spawn_blocking?
//!
//! Layout and PDF serialisation are CPU-bound and can take tens of
//! milliseconds for a long report. [`render_pdf`] moves both onto the
//! blocking pool so the server's worker threads keep serving requests.

use crate::error::ReportError;
use crate::pipeline::template::HEADER_TEXT;
use crate::report::{Section, StructuredReport, Table};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, Point, Rgb};
use std::borrow::Cow;
use std::io::BufWriter;
use tracing::debug;

// ── Page geometry (mm) ───────────────────────────────────────────────────

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 25.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const CONTENT_TOP_MM: f32 = PAGE_HEIGHT_MM - MARGIN_MM;
const CONTENT_BOTTOM_MM: f32 = MARGIN_MM;

const PT_TO_MM: f32 = 0.3528;

// ── Type scale (pt) ──────────────────────────────────────────────────────

const TITLE_PT: f32 = 36.0;
const SUBTITLE_PT: f32 = 16.0;
const AUTHOR_PT: f32 = 14.0;
const HEADING_PT: f32 = 16.0;
const BODY_PT: f32 = 11.0;
const TABLE_PT: f32 = 10.0;
const HEADER_PT: f32 = 8.0;
const FOOTER_PT: f32 = 9.0;

const BODY_LINE_HEIGHT: f32 = 1.6;
const TIGHT_LINE_HEIGHT: f32 = 1.25;

const CELL_PAD_X_MM: f32 = 3.0;
const CELL_PAD_Y_MM: f32 = 2.5;

// ── Colours ──────────────────────────────────────────────────────────────

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

const INK: Rgb8 = Rgb8(0x33, 0x33, 0x33);
const NAVY: Rgb8 = Rgb8(0x2c, 0x3e, 0x50);
const BLUE: Rgb8 = Rgb8(0x29, 0x80, 0xb9);
const GREY: Rgb8 = Rgb8(0x7f, 0x8c, 0x8d);
const RULE_LIGHT: Rgb8 = Rgb8(0xee, 0xee, 0xee);
const RULE_CELL: Rgb8 = Rgb8(0xdd, 0xdd, 0xdd);

impl Rgb8 {
    fn to_color(self) -> Color {
        Color::Rgb(Rgb::new(
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
            None,
        ))
    }
}

// ── Layout plan ──────────────────────────────────────────────────────────

/// What a line of text is, for tests and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Header,
    Footer,
    Title,
    Subtitle,
    Author,
    Date,
    SectionHeading { section: usize },
    Body { section: usize },
    TableHeaderCell { section: usize, column: usize },
    TableCell { section: usize, row: usize, column: usize },
}

/// One line of text at an absolute position. `y_mm` is the baseline,
/// measured from the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
    pub bold: bool,
    pub color: Rgb8,
    pub role: TextRole,
}

/// A horizontal rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1_mm: f32,
    pub x2_mm: f32,
    pub y_mm: f32,
    pub thickness_pt: f32,
    pub color: Rgb8,
}

/// Everything drawn on one page. `number` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub number: usize,
    pub items: Vec<TextItem>,
    pub rules: Vec<Rule>,
}

impl PageLayout {
    fn new(number: usize) -> Self {
        Self {
            number,
            items: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Text of every item on the page with the given role filter.
    pub fn texts_where(&self, pred: impl Fn(TextRole) -> bool) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| pred(i.role))
            .map(|i| i.text.as_str())
            .collect()
    }
}

/// The full paginated plan for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub title: String,
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// All items across all pages, in page order.
    pub fn items(&self) -> impl Iterator<Item = &TextItem> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }
}

/// PDF bytes plus the page count they were laid out with.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Lay the report out and emit the PDF on the blocking pool.
pub async fn render_pdf(report: &StructuredReport) -> Result<RenderedPdf, ReportError> {
    let report = report.clone();
    tokio::task::spawn_blocking(move || {
        let layout = plan_layout(&report);
        let page_count = layout.pages.len();
        let bytes = emit_pdf(&layout)?;
        Ok(RenderedPdf { bytes, page_count })
    })
    .await
    .map_err(|e| ReportError::Internal(format!("Render task panicked: {}", e)))?
}

/// Produce the page plan for `report`.
pub fn plan_layout(report: &StructuredReport) -> DocumentLayout {
    let mut cursor = Cursor::new();

    // ── Step 1: Cover page ───────────────────────────────────────────────
    layout_cover(&mut cursor, report);

    // ── Step 2: Sections flow from page 2 ────────────────────────────────
    if !report.sections.is_empty() {
        cursor.new_page();
    }
    for (idx, section) in report.sections.iter().enumerate() {
        layout_section(&mut cursor, idx, section);
    }

    // ── Step 3: Running header and footer ────────────────────────────────
    let mut pages = cursor.finish();
    for page in &mut pages {
        decorate_page(page);
    }

    debug!(
        "Planned layout for '{}': {} pages",
        report.meta.title,
        pages.len()
    );

    DocumentLayout {
        title: report.meta.title.clone(),
        pages,
    }
}

/// Serialise a layout plan to PDF bytes.
pub fn emit_pdf(layout: &DocumentLayout) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        &layout.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| pdf_error("font", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| pdf_error("font", e))?;

    for (i, page) in layout.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        for rule in &page.rules {
            layer.set_outline_color(rule.color.to_color());
            layer.set_outline_thickness(rule.thickness_pt);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(rule.x1_mm), Mm(rule.y_mm)), false),
                    (Point::new(Mm(rule.x2_mm), Mm(rule.y_mm)), false),
                ],
                is_closed: false,
            });
        }

        for item in &page.items {
            let font: &IndirectFontRef = if item.bold { &bold } else { &regular };
            layer.set_fill_color(item.color.to_color());
            layer.use_text(
                winansi_text(&item.text),
                item.size_pt,
                Mm(item.x_mm),
                Mm(item.y_mm),
                font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(|e| pdf_error("save", e))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| pdf_error("buffer", e.into_error()))?;
    debug!("Emitted PDF: {} pages, {} bytes", layout.pages.len(), bytes.len());
    Ok(bytes)
}

/// Characters above U+00FF that WinAnsi still encodes.
const WINANSI_EXTRA: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

fn is_winansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}') || WINANSI_EXTRA.contains(c)
}

/// Replace characters the builtin fonts cannot show with `?`.
fn winansi_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_winansi) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(
            text.chars()
                .map(|c| if is_winansi(c) { c } else { '?' })
                .collect(),
        )
    }
}

fn pdf_error(what: &str, e: impl std::fmt::Display) -> ReportError {
    ReportError::RenderFailed {
        detail: format!("PDF {what} error: {e}"),
    }
}

// ── Cursor ───────────────────────────────────────────────────────────────

/// Tracks the write position and collects finished pages.
struct Cursor {
    done: Vec<PageLayout>,
    current: PageLayout,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: PageLayout::new(1),
            y: CONTENT_TOP_MM,
        }
    }

    fn new_page(&mut self) {
        let next = PageLayout::new(self.current.number + 1);
        self.done.push(std::mem::replace(&mut self.current, next));
        self.y = CONTENT_TOP_MM;
    }

    fn at_page_top(&self) -> bool {
        self.y >= CONTENT_TOP_MM
    }

    /// Start a new page unless `height_mm` still fits on this one.
    fn ensure(&mut self, height_mm: f32) {
        if self.y - height_mm < CONTENT_BOTTOM_MM && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Vertical gap, dropped at the top of a page.
    fn gap(&mut self, mm: f32) {
        if !self.at_page_top() {
            self.y -= mm;
        }
    }

    fn rule(&mut self, thickness_pt: f32, color: Rgb8) {
        self.current.rules.push(Rule {
            x1_mm: MARGIN_MM,
            x2_mm: PAGE_WIDTH_MM - MARGIN_MM,
            y_mm: self.y,
            thickness_pt,
            color,
        });
    }

    /// Place wrapped text left-aligned at the margin, one item per line.
    fn paragraph(&mut self, text: &str, style: Style, role: TextRole) {
        let max = chars_per_line(CONTENT_WIDTH_MM, style.size_pt, style.bold);
        for line in wrap_text(text, max) {
            self.line(line, MARGIN_MM, style, role);
        }
    }

    /// Like [`Cursor::paragraph`], but blank text still takes one line.
    fn heading(&mut self, text: &str, style: Style, role: TextRole) {
        let max = chars_per_line(CONTENT_WIDTH_MM, style.size_pt, style.bold);
        let mut lines = wrap_text(text, max);
        if lines.is_empty() {
            lines.push(String::new());
        }
        for line in lines {
            self.line(line, MARGIN_MM, style, role);
        }
    }

    /// Place wrapped text centred on the page.
    fn centred(&mut self, text: &str, style: Style, role: TextRole) {
        let max = chars_per_line(CONTENT_WIDTH_MM, style.size_pt, style.bold);
        for line in wrap_text(text, max) {
            let width = text_width_mm(&line, style.size_pt, style.bold);
            let x = ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM);
            self.line(line, x, style, role);
        }
    }

    fn line(&mut self, text: String, x_mm: f32, style: Style, role: TextRole) {
        let height = style.line_height_mm();
        self.ensure(height);
        self.current.items.push(TextItem {
            text,
            x_mm,
            y_mm: self.y - style.size_pt * PT_TO_MM,
            size_pt: style.size_pt,
            bold: style.bold,
            color: style.color,
            role,
        });
        self.y -= height;
    }

    fn finish(mut self) -> Vec<PageLayout> {
        self.done.push(self.current);
        self.done
    }
}

#[derive(Debug, Clone, Copy)]
struct Style {
    size_pt: f32,
    bold: bool,
    color: Rgb8,
    line_height: f32,
}

impl Style {
    const fn new(size_pt: f32, bold: bool, color: Rgb8, line_height: f32) -> Self {
        Self {
            size_pt,
            bold,
            color,
            line_height,
        }
    }

    fn line_height_mm(&self) -> f32 {
        self.size_pt * PT_TO_MM * self.line_height
    }
}

const TITLE: Style = Style::new(TITLE_PT, true, NAVY, TIGHT_LINE_HEIGHT);
const SUBTITLE: Style = Style::new(SUBTITLE_PT, false, GREY, TIGHT_LINE_HEIGHT);
const AUTHOR: Style = Style::new(AUTHOR_PT, true, BLUE, TIGHT_LINE_HEIGHT);
const HEADING: Style = Style::new(HEADING_PT, true, BLUE, TIGHT_LINE_HEIGHT);
const BODY: Style = Style::new(BODY_PT, false, INK, BODY_LINE_HEIGHT);
const CELL: Style = Style::new(TABLE_PT, false, INK, TIGHT_LINE_HEIGHT);
const HEAD_CELL: Style = Style::new(TABLE_PT, true, NAVY, TIGHT_LINE_HEIGHT);

// ── Blocks ───────────────────────────────────────────────────────────────

fn layout_cover(cursor: &mut Cursor, report: &StructuredReport) {
    let meta = &report.meta;
    cursor.y = CONTENT_TOP_MM - 0.35 * (CONTENT_TOP_MM - CONTENT_BOTTOM_MM);

    cursor.centred(&meta.title, TITLE, TextRole::Title);
    cursor.y -= 5.0;
    cursor.centred(
        &format!("Prepared for: {}", meta.client),
        SUBTITLE,
        TextRole::Subtitle,
    );
    cursor.y -= 4.0;
    cursor.centred(
        &format!("Report Author: {}", meta.author),
        AUTHOR,
        TextRole::Author,
    );
    cursor.y -= 16.0;
    cursor.centred(&format!("Date: {}", meta.date), BODY, TextRole::Date);
}

fn layout_section(cursor: &mut Cursor, idx: usize, section: &Section) {
    cursor.gap(9.0);
    // Keep the heading with its rule and the first body line.
    cursor.ensure(HEADING.line_height_mm() + 4.0 + BODY.line_height_mm());
    cursor.heading(
        &section.heading,
        HEADING,
        TextRole::SectionHeading { section: idx },
    );
    cursor.y -= 1.0;
    cursor.rule(2.0, RULE_LIGHT);
    cursor.y -= 3.0;

    for (i, para) in section
        .content
        .split('\n')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        if i > 0 {
            cursor.gap(2.0);
        }
        cursor.paragraph(para, BODY, TextRole::Body { section: idx });
    }

    if let Some(ref table) = section.table_data {
        layout_table(cursor, idx, table);
    }
}

fn layout_table(cursor: &mut Cursor, section: usize, table: &Table) {
    let ncols = table.columns.len();
    if ncols == 0 {
        return;
    }
    let col_width = CONTENT_WIDTH_MM / ncols as f32;

    let header = wrap_row(&table.columns, col_width, HEAD_CELL);
    let rows: Vec<Vec<Vec<String>>> = table
        .rows
        .iter()
        .map(|r| wrap_row(r, col_width, CELL))
        .collect();

    cursor.gap(6.0);
    let first_row_h = rows.first().map_or(0.0, |r| row_height(r, CELL));
    cursor.ensure(row_height(&header, HEAD_CELL) + first_row_h);

    cursor.rule(0.75, RULE_LIGHT);
    place_row(cursor, &header, col_width, HEAD_CELL, |column| {
        TextRole::TableHeaderCell { section, column }
    });
    cursor.rule(1.5, NAVY);

    let last = rows.len().saturating_sub(1);
    for (row_idx, cells) in rows.iter().enumerate() {
        cursor.ensure(row_height(cells, CELL));
        place_row(cursor, cells, col_width, CELL, |column| TextRole::TableCell {
            section,
            row: row_idx,
            column,
        });
        if row_idx == last {
            cursor.rule(1.5, NAVY);
        } else {
            cursor.rule(0.5, RULE_CELL);
        }
    }
    cursor.y -= 6.0;
}

fn wrap_row(cells: &[String], col_width: f32, style: Style) -> Vec<Vec<String>> {
    let max = chars_per_line(col_width - 2.0 * CELL_PAD_X_MM, style.size_pt, style.bold);
    cells.iter().map(|c| wrap_text(c, max)).collect()
}

fn row_height(cells: &[Vec<String>], style: Style) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
    lines as f32 * style.line_height_mm() + 2.0 * CELL_PAD_Y_MM
}

/// Place one table row. A row taller than the space left on the page
/// continues on the next page with its remaining lines.
fn place_row(
    cursor: &mut Cursor,
    cells: &[Vec<String>],
    col_width: f32,
    style: Style,
    role: impl Fn(usize) -> TextRole,
) {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let line_h = style.line_height_mm();
    let mut top = cursor.y - CELL_PAD_Y_MM;
    let mut on_page = 0usize;

    for j in 0..lines {
        let bottom = top - (on_page + 1) as f32 * line_h;
        if bottom < CONTENT_BOTTOM_MM && (on_page > 0 || !cursor.at_page_top()) {
            cursor.new_page();
            top = cursor.y - CELL_PAD_Y_MM;
            on_page = 0;
        }
        let y = top - style.size_pt * PT_TO_MM - on_page as f32 * line_h;
        for (column, cell) in cells.iter().enumerate() {
            let Some(line) = cell.get(j) else { continue };
            cursor.current.items.push(TextItem {
                text: line.clone(),
                x_mm: MARGIN_MM + column as f32 * col_width + CELL_PAD_X_MM,
                y_mm: y,
                size_pt: style.size_pt,
                bold: style.bold,
                color: style.color,
                role: role(column),
            });
        }
        on_page += 1;
    }
    cursor.y = top - on_page as f32 * line_h - CELL_PAD_Y_MM;
}

fn decorate_page(page: &mut PageLayout) {
    let header_x =
        PAGE_WIDTH_MM - MARGIN_MM - text_width_mm(HEADER_TEXT, HEADER_PT, false);
    page.items.push(TextItem {
        text: HEADER_TEXT.to_string(),
        x_mm: header_x,
        y_mm: PAGE_HEIGHT_MM - 15.0,
        size_pt: HEADER_PT,
        bold: false,
        color: GREY,
        role: TextRole::Header,
    });

    let footer = format!("Page {}", page.number);
    let footer_x = (PAGE_WIDTH_MM - text_width_mm(&footer, FOOTER_PT, false)) / 2.0;
    page.items.push(TextItem {
        text: footer,
        x_mm: footer_x,
        y_mm: 12.0,
        size_pt: FOOTER_PT,
        bold: false,
        color: GREY,
        role: TextRole::Footer,
    });
}

// ── Text measurement ─────────────────────────────────────────────────────

fn glyph_width_mm(size_pt: f32, bold: bool) -> f32 {
    let em = if bold { 0.55 } else { 0.5 };
    size_pt * PT_TO_MM * em
}

fn text_width_mm(text: &str, size_pt: f32, bold: bool) -> f32 {
    text.chars().count() as f32 * glyph_width_mm(size_pt, bold)
}

fn chars_per_line(width_mm: f32, size_pt: f32, bold: bool) -> usize {
    ((width_mm / glyph_width_mm(size_pt, bold)).floor() as usize).max(1)
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are split. Empty or blank text yields no lines.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        if current_len > 0 && current_len + 1 + chars.len() > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += chars.len();
        current.extend(chars);
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportMeta;

    fn jane_doe_report() -> StructuredReport {
        StructuredReport {
            meta: ReportMeta {
                title: "Strategic Overview".into(),
                client: "Internal Report".into(),
                author: "Jane Doe".into(),
                date: "2026-01-06".into(),
            },
            sections: vec![
                Section {
                    heading: "Executive Summary".into(),
                    content: "Revenue exceeds costs.".into(),
                    table_data: None,
                },
                Section {
                    heading: "Financials".into(),
                    content: "Key figures for the period.".into(),
                    table_data: Table::new(
                        vec!["Metric".into(), "Value".into()],
                        vec![
                            vec!["Costs".into(), "50000".into()],
                            vec!["Revenue".into(), "120000".into()],
                        ],
                    ),
                },
            ],
        }
    }

    #[test]
    fn cover_page_shows_author_line() {
        let layout = plan_layout(&jane_doe_report());
        let cover = &layout.pages[0];
        assert!(cover
            .texts_where(|r| r == TextRole::Author)
            .contains(&"Report Author: Jane Doe"));
        assert_eq!(
            cover.texts_where(|r| r == TextRole::Subtitle),
            ["Prepared for: Internal Report"]
        );
        assert_eq!(cover.texts_where(|r| r == TextRole::Date), ["Date: 2026-01-06"]);
        assert_eq!(cover.texts_where(|r| r == TextRole::Title), ["Strategic Overview"]);
    }

    #[test]
    fn sections_start_after_cover() {
        let layout = plan_layout(&jane_doe_report());
        assert!(layout.pages.len() >= 2);
        assert!(layout.pages[0]
            .texts_where(|r| matches!(r, TextRole::SectionHeading { .. }))
            .is_empty());
    }

    #[test]
    fn headings_keep_section_order() {
        let mut report = jane_doe_report();
        report.sections.push(Section {
            heading: "Outlook".into(),
            content: String::new(),
            table_data: None,
        });
        let layout = plan_layout(&report);
        let headings: Vec<(usize, &str)> = layout
            .items()
            .filter_map(|i| match i.role {
                TextRole::SectionHeading { section } => Some((section, i.text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            [(0, "Executive Summary"), (1, "Financials"), (2, "Outlook")]
        );
    }

    #[test]
    fn table_has_header_cells_and_rows_in_order() {
        let layout = plan_layout(&jane_doe_report());
        let header: Vec<&str> = layout
            .items()
            .filter(|i| matches!(i.role, TextRole::TableHeaderCell { section: 1, .. }))
            .map(|i| i.text.as_str())
            .collect();
        assert_eq!(header, ["Metric", "Value"]);

        let mut cells: Vec<(usize, usize, &str)> = layout
            .items()
            .filter_map(|i| match i.role {
                TextRole::TableCell {
                    section: 1,
                    row,
                    column,
                } => Some((row, column, i.text.as_str())),
                _ => None,
            })
            .collect();
        cells.sort();
        assert_eq!(
            cells,
            [
                (0, 0, "Costs"),
                (0, 1, "50000"),
                (1, 0, "Revenue"),
                (1, 1, "120000")
            ]
        );

        // Rows run top to bottom.
        let y_of = |text: &str| layout.items().find(|i| i.text == text).unwrap().y_mm;
        assert!(y_of("Costs") > y_of("Revenue"));
    }

    #[test]
    fn every_page_has_header_and_numbered_footer() {
        let mut report = jane_doe_report();
        report.sections[0].content = "Lorem ipsum dolor sit amet. ".repeat(400);
        let layout = plan_layout(&report);
        assert!(layout.pages.len() > 3, "long content should paginate");
        for page in &layout.pages {
            assert_eq!(page.texts_where(|r| r == TextRole::Header), [HEADER_TEXT]);
            let footer = format!("Page {}", page.number);
            assert_eq!(page.texts_where(|r| r == TextRole::Footer), [footer.as_str()]);
        }
    }

    #[test]
    fn body_text_stays_inside_margins() {
        let mut report = jane_doe_report();
        report.sections[0].content = "word ".repeat(2000);
        report.sections[1].table_data = Table::new(
            vec!["Metric".into(), "Commentary".into()],
            vec![
                vec!["Costs".into(), "lorem ipsum ".repeat(400)],
                vec!["Revenue".into(), "dolor sit amet ".repeat(300)],
            ],
        );
        let layout = plan_layout(&report);
        assert!(layout
            .items()
            .any(|i| matches!(i.role, TextRole::TableCell { .. })));
        for item in layout
            .items()
            .filter(|i| !matches!(i.role, TextRole::Header | TextRole::Footer))
        {
            assert!(item.y_mm >= CONTENT_BOTTOM_MM - 0.01, "{item:?}");
            assert!(item.y_mm <= CONTENT_TOP_MM, "{item:?}");
            assert!(item.x_mm >= MARGIN_MM - 0.01, "{item:?}");
        }
    }

    fn section(heading: &str, content: &str, table_data: Option<Table>) -> Section {
        Section {
            heading: heading.into(),
            content: content.into(),
            table_data,
        }
    }

    fn heading_sections(layout: &DocumentLayout) -> Vec<usize> {
        layout
            .items()
            .filter_map(|i| match i.role {
                TextRole::SectionHeading { section } => Some(section),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn blank_heading_keeps_its_slot() {
        let mut report = jane_doe_report();
        report.sections = vec![
            section("One", "a", None),
            section("", "b", None),
            section("Three", "c", None),
        ];
        let layout = plan_layout(&report);
        assert_eq!(heading_sections(&layout), [0, 1, 2]);

        let blank = layout
            .items()
            .find(|i| i.role == TextRole::SectionHeading { section: 1 })
            .unwrap();
        assert_eq!(blank.text, "");
        let y_of = |section: usize| {
            layout
                .items()
                .find(|i| i.role == TextRole::Body { section })
                .unwrap()
                .y_mm
        };
        assert!(y_of(0) > y_of(1) && y_of(1) > y_of(2));
    }

    #[test]
    fn edge_sections_render_one_heading_each() {
        let mut report = jane_doe_report();
        report.sections = vec![
            section("No body", "", None),
            section("   ", "  \n ", None),
            section(
                "Empty table",
                "",
                Table::new(vec!["A".into(), "B".into()], vec![]),
            ),
            section("After", "tail", None),
        ];
        let layout = plan_layout(&report);
        assert_eq!(heading_sections(&layout), [0, 1, 2, 3]);

        assert!(layout
            .items()
            .all(|i| !matches!(i.role, TextRole::Body { section: 0 | 1 | 2 })));
        let header: Vec<&str> = layout
            .items()
            .filter(|i| matches!(i.role, TextRole::TableHeaderCell { section: 2, .. }))
            .map(|i| i.text.as_str())
            .collect();
        assert_eq!(header, ["A", "B"]);
        assert!(layout
            .items()
            .all(|i| !matches!(i.role, TextRole::TableCell { .. })));
    }

    #[test]
    fn row_taller_than_a_page_continues_on_next_page() {
        let long = "lorem ipsum ".repeat(400);
        let mut report = jane_doe_report();
        report.sections[1].table_data = Table::new(
            vec!["Item".into(), "Notes".into()],
            vec![
                vec!["First".into(), long.clone()],
                vec!["Second".into(), "short".into()],
            ],
        );
        let layout = plan_layout(&report);

        let col_width = CONTENT_WIDTH_MM / 2.0;
        let expected = wrap_text(
            &long,
            chars_per_line(col_width - 2.0 * CELL_PAD_X_MM, TABLE_PT, false),
        );
        let placed: Vec<&str> = layout
            .items()
            .filter(|i| {
                i.role
                    == TextRole::TableCell {
                        section: 1,
                        row: 0,
                        column: 1,
                    }
            })
            .map(|i| i.text.as_str())
            .collect();
        assert_eq!(placed, expected);

        let pages_with_row: Vec<usize> = layout
            .pages
            .iter()
            .filter(|p| {
                p.items
                    .iter()
                    .any(|i| matches!(i.role, TextRole::TableCell { row: 0, .. }))
            })
            .map(|p| p.number)
            .collect();
        assert!(pages_with_row.len() > 1, "{pages_with_row:?}");

        // The next row follows the continued one.
        let second_row_page = layout
            .pages
            .iter()
            .find(|p| {
                p.texts_where(|r| matches!(r, TextRole::TableCell { row: 1, .. }))
                    .contains(&"Second")
            })
            .unwrap()
            .number;
        assert!(second_row_page >= *pages_with_row.last().unwrap());
    }

    #[test]
    fn empty_report_is_cover_only() {
        let report = StructuredReport {
            meta: jane_doe_report().meta,
            sections: vec![],
        };
        assert_eq!(plan_layout(&report).pages.len(), 1);
    }

    #[test]
    fn emit_pdf_produces_pdf_bytes() {
        let layout = plan_layout(&jane_doe_report());
        let bytes = emit_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn non_latin_text_is_substituted_for_builtin_fonts() {
        assert_eq!(winansi_text("Café – “Q3”"), "Café – “Q3”");
        assert_eq!(winansi_text("Jane 李雷"), "Jane ??");
        assert_eq!(winansi_text("محمد"), "????");

        let mut report = jane_doe_report();
        report.meta.author = "李雷 محمد".into();
        let layout = plan_layout(&report);
        assert!(layout.pages[0]
            .texts_where(|r| r == TextRole::Author)
            .contains(&"Report Author: 李雷 محمد"));
        assert!(emit_pdf(&layout).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn render_pdf_reports_page_count() {
        let report = jane_doe_report();
        let rendered = render_pdf(&report).await.unwrap();
        assert_eq!(rendered.page_count, plan_layout(&report).pages.len());
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            ["the quick", "brown fox"]
        );
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn wrap_text_splits_long_words() {
        assert_eq!(wrap_text("abcdefghij xy", 4), ["abcd", "efgh", "ij", "xy"]);
    }
}
