#[cfg(feature = "pdf")]
use std::io::BufWriter;

#[cfg(feature = "pdf")]
use printpdf::*;

#[cfg(feature = "pdf")]
use crate::error::{KpiError, Result};
use crate::export::SummaryDocument;
use crate::kpi::KpiLine;

// US Letter dimensions (mm)
#[cfg(feature = "pdf")]
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const INCH: f32 = 25.4;
const MARGIN_TOP: f32 = 0.9 * INCH;
const MARGIN_BOTTOM: f32 = 1.2 * INCH;
const MARGIN_LEFT: f32 = 0.75 * INCH;
const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const KPI_ROW_H: f32 = 0.18 * INCH;
const INSIGHT_ROW_H: f32 = 0.16 * INCH;

/// Greedy word fill width for the insights paragraph, in characters.
pub const WRAP_CHARS: usize = 95;

/// One line of text at a fixed position, `y` measured down from the page top.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

pub type Page = Vec<PlacedLine>;

pub fn kpi_line_text(line: &KpiLine) -> String {
    format!("{}: {}   (\u{0394} {})", line.name, line.value, line.delta)
}

pub fn wrap_insights(text: &str) -> Vec<String> {
    let options = textwrap::Options::new(WRAP_CHARS)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit)
        .word_splitter(textwrap::WordSplitter::NoHyphenation)
        .break_words(false);
    textwrap::wrap(text.trim(), &options)
        .into_iter()
        .map(|l| l.into_owned())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Single-pass pagination: a line that would sit below the bottom margin
/// starts a new page at the top margin.
struct Layout {
    pages: Vec<Page>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: MARGIN_TOP,
        }
    }

    fn ensure_space(&mut self) {
        if self.y > PAGE_H - MARGIN_BOTTOM {
            self.pages.push(Vec::new());
            self.y = MARGIN_TOP;
        }
    }

    fn line(&mut self, text: impl Into<String>, size: f32, bold: bool, advance: f32) {
        self.ensure_space();
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.push(PlacedLine {
                text: text.into(),
                y,
                size,
                bold,
            });
        }
        self.y += advance;
    }

    fn gap(&mut self, advance: f32) {
        self.y += advance;
    }
}

pub fn layout_summary(doc: &SummaryDocument) -> Vec<Page> {
    let mut l = Layout::new();
    l.line(&doc.title, TITLE_SIZE, true, 0.35 * INCH);
    l.line(format!("Department: {}", doc.department), SUBTITLE_SIZE, false, 0.2 * INCH);
    l.line(format!("Date Range: {}", doc.date_range), SUBTITLE_SIZE, false, 0.2 * INCH);
    match &doc.waterfall_month {
        Some(month) => {
            l.line(format!("Waterfall Month: {month}"), SUBTITLE_SIZE, false, 0.25 * INCH)
        }
        None => l.gap(0.1 * INCH),
    }

    l.line("Key KPIs (Actual vs Budget)", HEADING_SIZE, true, 0.25 * INCH);
    for kpi in &doc.kpis {
        l.line(kpi_line_text(kpi), BODY_SIZE, false, KPI_ROW_H);
    }

    l.gap(0.2 * INCH);
    l.line("Key Insights", HEADING_SIZE, true, 0.25 * INCH);
    for text in wrap_insights(&doc.insights) {
        l.line(text, BODY_SIZE, false, INSIGHT_ROW_H);
    }
    l.pages
}

/// The builtin Helvetica encoding has no Greek, so spell out the delta sign.
#[cfg(feature = "pdf")]
fn builtin_safe(text: &str) -> String {
    text.replace('\u{0394}', "Delta")
}

#[cfg(feature = "pdf")]
pub fn render_summary(doc: &SummaryDocument) -> Result<Vec<u8>> {
    let pages = layout_summary(doc);
    let (pdf, first_page, first_layer) =
        PdfDocument::new(doc.title.as_str(), Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| KpiError::Pdf(format!("{e:?}")))?;
    let font_bold = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| KpiError::Pdf(format!("{e:?}")))?;

    for (i, page) in pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer")
        };
        let layer = pdf.get_page(page_idx).get_layer(layer_idx);
        for line in page {
            let f = if line.bold { &font_bold } else { &font };
            layer.use_text(
                builtin_safe(&line.text),
                line.size,
                Mm(MARGIN_LEFT),
                Mm(PAGE_H - line.y),
                f,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    pdf.save(&mut buf)
        .map_err(|e| KpiError::Pdf(format!("{e:?}")))?;
    buf.into_inner().map_err(|e| KpiError::Pdf(e.to_string()))
}
