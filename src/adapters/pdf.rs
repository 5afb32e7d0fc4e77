use crate::core::layout::{
    self, Block, FontFamily, PageFormat, ResolvedStyle, RgbColor, BODY_SIZE, HEADING_SIZE,
    REFERENCE_SIZE,
};
use crate::domain::model::{FormattedReport, RenderedDocument, SectionOutline};
use crate::domain::ports::DocumentRenderer;
use crate::utils::error::RenderError;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    PdfPageIndex, Rgb,
};

const DOCUMENT_TITLE: &str = "Marketing Strategy Report";
const LAYER_NAME: &str = "Layer 1";

/// 以 printpdf 內建字型輸出 PDF，不需要字型檔
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    title: Option<String>,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// PDF metadata 中的文件標題
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, report: &FormattedReport) -> Result<RenderedDocument, RenderError> {
        let style = ResolvedStyle::from_hints(&report.styling);
        let blocks = layout::plan(report, &style);
        tracing::debug!(
            "Rendering {} sections as {} blocks ({:?}, {:.1}mm margins)",
            report.sections.len(),
            blocks.len(),
            style.family,
            style.margin_mm
        );

        let title = self.title.as_deref().unwrap_or(DOCUMENT_TITLE);
        let mut canvas = Canvas::new(title, &style)?;
        let mut sections = Vec::with_capacity(report.sections.len());

        for block in &blocks {
            match block {
                Block::Heading {
                    section,
                    text,
                    lines,
                } => {
                    let page_number = canvas.heading(text, lines);
                    let source = &report.sections[*section];
                    sections.push(SectionOutline {
                        title: source.title.clone(),
                        first_page: page_number,
                        visualizations: source.visualizations.clone(),
                        tables: source.tables.clone(),
                    });
                }
                Block::BodyLine { text, justify } => canvas.body_line(text, *justify),
                Block::Reference { kind, name } => {
                    canvas.reference(&format!("[{}: {}]", kind.label(), name))
                }
                Block::Spacer { height_mm } => canvas.cursor_mm -= height_mm,
                Block::PageBreak => canvas.new_page(),
            }
        }

        let page_count = canvas.pages;
        let bytes = canvas.finish()?;
        tracing::info!(
            "Rendered PDF: {} pages, {} bytes",
            page_count,
            bytes.len()
        );

        Ok(RenderedDocument {
            bytes,
            page_count,
            sections,
        })
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, family: FontFamily) -> Result<Self, RenderError> {
        let (regular, bold, oblique) = match family {
            FontFamily::Helvetica => (
                BuiltinFont::Helvetica,
                BuiltinFont::HelveticaBold,
                BuiltinFont::HelveticaOblique,
            ),
            FontFamily::Times => (
                BuiltinFont::TimesRoman,
                BuiltinFont::TimesBold,
                BuiltinFont::TimesItalic,
            ),
            FontFamily::Courier => (
                BuiltinFont::Courier,
                BuiltinFont::CourierBold,
                BuiltinFont::CourierOblique,
            ),
        };
        let load = |font: BuiltinFont| {
            let name = format!("{:?}", font);
            doc.add_builtin_font(font)
                .map_err(|e| RenderError::Font(format!("{}: {:?}", name, e)))
        };
        Ok(Self {
            regular: load(regular)?,
            bold: load(bold)?,
            oblique: load(oblique)?,
        })
    }
}

/// 目前頁面與游標；游標以 mm 由頁面底部量起
struct Canvas<'a> {
    doc: PdfDocumentReference,
    style: &'a ResolvedStyle,
    fonts: Fonts,
    page: PdfPageIndex,
    layer: PdfLayerReference,
    pages: usize,
    cursor_mm: f32,
}

impl<'a> Canvas<'a> {
    fn new(title: &str, style: &'a ResolvedStyle) -> Result<Self, RenderError> {
        let PageFormat {
            width_mm,
            height_mm,
        } = style.page;
        let (doc, page, layer) = PdfDocument::new(title, Mm(width_mm), Mm(height_mm), LAYER_NAME);
        let fonts = Fonts::load(&doc, style.family)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            style,
            fonts,
            page,
            layer,
            pages: 1,
            cursor_mm: height_mm - style.margin_mm,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.style.page.width_mm),
            Mm(self.style.page.height_mm),
            LAYER_NAME,
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page = page;
        self.pages += 1;
        self.cursor_mm = self.style.page.height_mm - self.style.margin_mm;
    }

    /// 剩餘空間不足一行時換頁；此換頁不是章節分隔
    fn ensure_room(&mut self, line_height_mm: f32) {
        if self.cursor_mm - line_height_mm < self.style.margin_mm {
            self.new_page();
        }
    }

    fn set_color(&self, color: RgbColor) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(color.r, color.g, color.b, None)));
    }

    fn usable_height_mm(&self) -> f32 {
        self.style.page.height_mm - 2.0 * self.style.margin_mm
    }

    /// 回傳標題第一行所在頁碼 (從 1 起算)
    fn heading(&mut self, text: &str, lines: &[String]) -> usize {
        let line_height = ResolvedStyle::line_height_mm(HEADING_SIZE);

        // 放得進一頁的標題不拆開；更長的標題逐行換頁
        let total = line_height * lines.len().max(1) as f32;
        if total <= self.usable_height_mm() {
            self.ensure_room(total);
        } else {
            self.ensure_room(line_height);
        }
        let page_number = self.pages;
        self.doc.add_bookmark(text, self.page);

        for line in lines {
            self.ensure_room(line_height);
            self.set_color(self.style.heading_color);
            self.cursor_mm -= line_height;
            self.layer.use_text(
                line.as_str(),
                HEADING_SIZE,
                Mm(self.style.margin_mm),
                Mm(self.cursor_mm),
                &self.fonts.bold,
            );
        }
        page_number
    }

    fn body_line(&mut self, text: &str, justify: bool) {
        let line_height = ResolvedStyle::line_height_mm(BODY_SIZE);
        self.ensure_room(line_height);
        self.cursor_mm -= line_height;

        let spacing = if justify {
            self.style.justify_spacing(text, BODY_SIZE)
        } else {
            0.0
        };

        self.set_color(self.style.body_color);
        self.layer.begin_text_section();
        self.layer.set_font(&self.fonts.regular, BODY_SIZE);
        self.layer
            .set_text_cursor(Mm(self.style.margin_mm), Mm(self.cursor_mm));
        self.layer.set_word_spacing(spacing);
        self.layer.write_text(text, &self.fonts.regular);
        self.layer.set_word_spacing(0.0);
        self.layer.end_text_section();
    }

    fn reference(&mut self, text: &str) {
        let line_height = ResolvedStyle::line_height_mm(REFERENCE_SIZE);
        self.ensure_room(line_height);
        self.cursor_mm -= line_height;

        self.set_color(self.style.accent_color);
        self.layer.use_text(
            text,
            REFERENCE_SIZE,
            Mm(self.style.margin_mm),
            Mm(self.cursor_mm),
            &self.fonts.oblique,
        );
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| RenderError::Backend(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::Weight;
    use crate::domain::model::{ReportSection, ReportStyling};

    fn report() -> FormattedReport {
        serde_json::from_str(include_str!("../../tests/fixtures/formatted_report.json")).unwrap()
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_render_produces_pdf_with_one_page_break_per_section() {
        let report = report();
        let document = PdfRenderer::new().render(&report).unwrap();

        assert!(document.bytes.starts_with(b"%PDF"));
        // 每個章節後分頁，最後留下一頁空白頁
        assert_eq!(document.page_count, report.sections.len() + 1);

        let titles: Vec<&str> = document.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Executive Summary",
                "Business Analysis",
                "Marketing Strategy",
                "Implementation Plan",
                "ROI Projections"
            ]
        );
        let pages: Vec<usize> = document.sections.iter().map(|s| s.first_page).collect();
        assert_eq!(pages, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_section_titles_are_bookmarked() {
        let document = PdfRenderer::new().render(&report()).unwrap();
        for title in ["Executive Summary", "ROI Projections"] {
            assert!(contains(&document.bytes, title), "missing {}", title);
        }
    }

    #[test]
    fn test_references_are_kept_in_outline() {
        let document = PdfRenderer::new().render(&report()).unwrap();
        assert_eq!(document.sections[0].visualizations, vec!["lead-funnel-chart"]);
        assert_eq!(document.sections[1].tables, vec!["competitor-matrix"]);
    }

    #[test]
    fn test_long_section_overflows_without_extra_outline_entries() {
        let paragraph = "Quarterly pipeline reviews keep the channel mix honest. ".repeat(40);
        let report = FormattedReport {
            sections: vec![ReportSection {
                title: "Implementation Plan".to_string(),
                content: vec![paragraph; 8].join("\n"),
                visualizations: vec![],
                tables: vec![],
            }],
            styling: ReportStyling {
                fonts: vec!["Courier".to_string()],
                colors: vec![],
                layouts: vec!["letter".to_string()],
            },
        };

        let document = PdfRenderer::new().render(&report).unwrap();
        assert!(document.page_count > 2);
        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.sections[0].first_page, 1);
    }

    #[test]
    fn test_heading_taller_than_a_page_continues_on_next_page() {
        let style = ResolvedStyle::default();
        let lines = style.wrap(&"Growth ".repeat(300), Weight::Bold, HEADING_SIZE);
        let line_height = ResolvedStyle::line_height_mm(HEADING_SIZE);

        let mut canvas = Canvas::new("Long heading", &style).unwrap();
        assert!(line_height * lines.len() as f32 > canvas.usable_height_mm());

        let first_page = canvas.heading("Growth", &lines);
        assert_eq!(first_page, 1);
        assert!(canvas.pages >= 2);
        assert!(canvas.cursor_mm >= style.margin_mm);
    }

    #[test]
    fn test_short_heading_is_kept_together() {
        let style = ResolvedStyle::default();
        let mut canvas = Canvas::new("Headings", &style).unwrap();
        canvas.cursor_mm = style.margin_mm + ResolvedStyle::line_height_mm(HEADING_SIZE) * 1.5;

        let lines = vec!["Marketing".to_string(), "Strategy".to_string()];
        assert_eq!(canvas.heading("Marketing Strategy", &lines), 2);
        assert_eq!(canvas.pages, 2);
    }

    #[test]
    fn test_very_long_title_renders() {
        let mut report = report();
        report.sections.truncate(1);
        report.sections[0].title = "Positioning ".repeat(170);

        let document = PdfRenderer::new().render(&report).unwrap();
        assert!(document.page_count >= 3);
        assert_eq!(document.sections[0].first_page, 1);
    }

    #[test]
    fn test_empty_report_renders_single_blank_page() {
        let mut report = report();
        report.sections.clear();
        let document = PdfRenderer::new()
            .with_title("Empty")
            .render(&report)
            .unwrap();
        assert!(document.bytes.starts_with(b"%PDF"));
        assert_eq!(document.page_count, 1);
        assert!(document.sections.is_empty());
    }
}
