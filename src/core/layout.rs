//! 報告版面規劃：把已驗證的報告轉成一串繪製區塊。
//!
//! 這裡不碰 PDF，只決定字型、顏色、頁面尺寸、換行與分頁點，
//! 後端 (`adapters::pdf`) 逐一繪製區塊。

use crate::core::metrics::{self, Weight};
use crate::domain::model::{FormattedReport, ReportStyling};
use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;

pub const PT_TO_MM: f32 = 0.352_778;
pub const HEADING_SIZE: f32 = 24.0;
pub const BODY_SIZE: f32 = 12.0;
pub const REFERENCE_SIZE: f32 = 10.0;
pub const LINE_SPACING: f32 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.to_ascii_lowercase();
        if hint.contains("courier") || hint.contains("mono") {
            Some(FontFamily::Courier)
        } else if hint.contains("times") || hint.contains("serif") && !hint.contains("sans") {
            Some(FontFamily::Times)
        } else if ["helvetica", "arial", "sans", "inter", "roboto"]
            .iter()
            .any(|name| hint.contains(name))
        {
            Some(FontFamily::Helvetica)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const TEXT: RgbColor = RgbColor {
        r: 0.1,
        g: 0.1,
        b: 0.1,
    };

    /// 解析 `#rrggbb`、`#rgb` (井號可省略)
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some(RgbColor {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFormat {
    pub const A4: PageFormat = PageFormat {
        width_mm: 210.0,
        height_mm: 297.0,
    };
    pub const LETTER: PageFormat = PageFormat {
        width_mm: 215.9,
        height_mm: 279.4,
    };
}

/// 由報告 styling 提示解析出的實際樣式
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub family: FontFamily,
    pub heading_color: RgbColor,
    pub body_color: RgbColor,
    pub accent_color: RgbColor,
    pub page: PageFormat,
    pub margin_mm: f32,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            family: FontFamily::Helvetica,
            heading_color: RgbColor::TEXT,
            body_color: RgbColor::TEXT,
            accent_color: RgbColor::TEXT,
            page: PageFormat::A4,
            margin_mm: 50.0 * PT_TO_MM,
        }
    }
}

impl ResolvedStyle {
    /// 只採用認得的提示，其餘忽略
    pub fn from_hints(styling: &ReportStyling) -> Self {
        let mut style = Self::default();

        if let Some(family) = styling.fonts.iter().find_map(|f| FontFamily::from_hint(f)) {
            style.family = family;
        }

        let colors: Vec<RgbColor> = styling
            .colors
            .iter()
            .filter_map(|c| RgbColor::parse_hex(c))
            .collect();
        if let Some(first) = colors.first() {
            style.heading_color = *first;
            style.accent_color = colors.get(1).copied().unwrap_or(*first);
        }

        for layout in &styling.layouts {
            let layout = layout.to_ascii_lowercase();
            if layout.contains("letter") {
                style.page = PageFormat::LETTER;
            }
            if layout.contains("compact") {
                style.margin_mm = 12.7;
            } else if layout.contains("spacious") || layout.contains("wide-margin") {
                style.margin_mm = 25.4;
            }
        }

        style
    }

    pub fn content_width_mm(&self) -> f32 {
        self.page.width_mm - 2.0 * self.margin_mm
    }

    pub fn line_height_mm(font_size: f32) -> f32 {
        font_size * PT_TO_MM * LINE_SPACING
    }

    pub fn measure_mm(&self, weight: Weight, text: &str, font_size: f32) -> f32 {
        metrics::text_width_mm(self.family, weight, text, font_size)
    }

    /// 依實際字寬換行，每行不超過內容寬度；放不下一行的單字按字元切開
    pub fn wrap(&self, text: &str, weight: Weight, font_size: f32) -> Vec<String> {
        let max_width = f64::from(self.content_width_mm() / PT_TO_MM);
        let width_of =
            |s: &str| f64::from(metrics::text_width_pt(self.family, weight, s, font_size));
        let advance_of = |c: char| {
            f64::from(metrics::advance(self.family, weight, c)) * f64::from(font_size) / 1000.0
        };
        let space = width_of(" ");

        let mut pieces = Vec::new();
        for word in text.split(' ').filter(|w| !w.is_empty()) {
            let width = width_of(word);
            if width <= max_width {
                pieces.push(Piece {
                    text: word,
                    width,
                    space,
                });
                continue;
            }
            let (mut start, mut acc) = (0, 0.0);
            for (i, c) in word.char_indices() {
                let advance = advance_of(c);
                if acc + advance > max_width && i > start {
                    pieces.push(Piece {
                        text: &word[start..i],
                        width: acc,
                        space: 0.0,
                    });
                    start = i;
                    acc = 0.0;
                }
                acc += advance;
            }
            pieces.push(Piece {
                text: &word[start..],
                width: acc,
                space,
            });
        }

        wrap_first_fit(&pieces, &[max_width])
            .into_iter()
            .map(|line| {
                let mut out = String::new();
                for (i, piece) in line.iter().enumerate() {
                    out.push_str(piece.text);
                    if piece.space > 0.0 && i + 1 < line.len() {
                        out.push(' ');
                    }
                }
                out
            })
            .collect()
    }

    /// 左右對齊所需的字距 (pt)：剩餘寬度平均分給每個空白
    pub fn justify_spacing(&self, line: &str, font_size: f32) -> f32 {
        let gaps = line.matches(' ').count();
        if gaps == 0 {
            return 0.0;
        }
        let natural_pt = metrics::text_width_pt(self.family, Weight::Regular, line, font_size);
        (self.content_width_mm() / PT_TO_MM - natural_pt) / gaps as f32
    }
}

/// 換行用的單字片段，寬度以 pt 計
#[derive(Debug)]
struct Piece<'a> {
    text: &'a str,
    width: f64,
    space: f64,
}

impl Fragment for Piece<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.space
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Visualization,
    Table,
}

impl ReferenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Visualization => "Visualization",
            ReferenceKind::Table => "Table",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// 章節標題 (粗體)，`section` 為章節索引，`lines` 為換行後的各行
    Heading {
        section: usize,
        text: String,
        lines: Vec<String>,
    },
    /// 一行內文；段落最後一行與沒有空白的行不對齊
    BodyLine { text: String, justify: bool },
    /// 圖表/表格的引用，只輸出佔位文字
    Reference { kind: ReferenceKind, name: String },
    Spacer { height_mm: f32 },
    PageBreak,
}

/// 每個章節：標題 → 內文 → 引用 → 分頁
pub fn plan(report: &FormattedReport, style: &ResolvedStyle) -> Vec<Block> {
    let mut blocks = Vec::new();

    for (index, section) in report.sections.iter().enumerate() {
        let title = sanitize(&section.title);
        blocks.push(Block::Heading {
            section: index,
            lines: style.wrap(&title, Weight::Bold, HEADING_SIZE),
            text: title,
        });
        blocks.push(Block::Spacer {
            height_mm: ResolvedStyle::line_height_mm(BODY_SIZE),
        });

        for paragraph in section.content.lines().map(str::trim).filter(|p| !p.is_empty()) {
            let paragraph = sanitize(paragraph);
            let lines = style.wrap(&paragraph, Weight::Regular, BODY_SIZE);
            let last = lines.len().saturating_sub(1);
            for (i, line) in lines.into_iter().enumerate() {
                let justify = i < last && line.contains(' ');
                blocks.push(Block::BodyLine { text: line, justify });
            }
            blocks.push(Block::Spacer {
                height_mm: ResolvedStyle::line_height_mm(BODY_SIZE) * 0.5,
            });
        }

        let references = section
            .visualizations
            .iter()
            .map(|name| (ReferenceKind::Visualization, name))
            .chain(section.tables.iter().map(|name| (ReferenceKind::Table, name)));
        for (kind, name) in references {
            blocks.push(Block::Reference {
                kind,
                name: sanitize(name),
            });
        }

        blocks.push(Block::PageBreak);
    }

    blocks
}

/// 內建 PDF 字型只支援 Latin-1，常見的排版符號換成 ASCII
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2009}' | '\u{202F}' | '\t' => out.push(' '),
            c if (c as u32) < 0x20 || ('\u{7F}'..='\u{9F}').contains(&c) => {}
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
