use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, Pt, Rgb};

use crate::documents::{
    layout::{Block, Layout, Run},
    metrics::text_width,
    style::{Alignment, HexColor, StyleSheet, TextStyle},
    DocumentError,
};

/// US letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
const FRAME_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Turns a laid-out document into file bytes.
pub trait Renderer: Send + Sync {
    fn render(&self, layout: &Layout, styles: &StyleSheet) -> Result<Vec<u8>, DocumentError>;
}

/// One positioned text segment; coordinates are PDF points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub bold: bool,
    pub font_size: f32,
    pub color: HexColor,
}

#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    bold: bool,
}

fn split_words(runs: &[Run], force_bold: bool) -> Vec<Word<'_>> {
    runs.iter()
        .flat_map(|run| {
            run.text.split_whitespace().map(move |text| Word {
                text,
                bold: force_bold || run.bold,
            })
        })
        .collect()
}

fn word_width(word: &Word<'_>, font_size: f32) -> f32 {
    text_width(word.text, word.bold, font_size)
}

/// Greedy word wrap. A word wider than the frame gets a line of its own.
fn wrap<'a>(words: &[Word<'a>], font_size: f32, max_width: f32) -> Vec<Vec<Word<'a>>> {
    let space = text_width(" ", false, font_size);
    let mut lines = Vec::new();
    let mut line: Vec<Word<'a>> = Vec::new();
    let mut width = 0.0;

    for word in words {
        let w = word_width(word, font_size);
        if !line.is_empty() && width + space + w > max_width {
            lines.push(std::mem::take(&mut line));
            width = 0.0;
        }
        if !line.is_empty() {
            width += space;
        }
        width += w;
        line.push(*word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Merge neighbouring words of the same weight and position them on the baseline.
fn place_line(line: &[Word<'_>], style: &TextStyle, y: f32) -> Vec<PlacedText> {
    let space = text_width(" ", false, style.font_size);
    let line_width: f32 = line.iter().map(|w| word_width(w, style.font_size)).sum::<f32>()
        + space * line.len().saturating_sub(1) as f32;
    let mut x = match style.alignment {
        Alignment::Left => MARGIN,
        Alignment::Center => MARGIN + ((FRAME_WIDTH - line_width) / 2.0).max(0.0),
    };

    let mut placed: Vec<PlacedText> = Vec::new();
    for word in line {
        if let Some(segment) = placed.last_mut().filter(|s| s.bold == word.bold) {
            segment.text.push(' ');
            segment.text.push_str(word.text);
            continue;
        }
        if let Some(prev) = placed.last() {
            x = prev.x + text_width(&prev.text, prev.bold, style.font_size) + space;
        }
        placed.push(PlacedText {
            x,
            y,
            text: word.text.to_string(),
            bold: word.bold,
            font_size: style.font_size,
            color: style.color,
        });
    }
    placed
}

/// Flow the blocks down US-letter pages. Always yields at least one page.
pub fn paginate(layout: &Layout, styles: &StyleSheet) -> Vec<Vec<PlacedText>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages: Vec<Vec<PlacedText>> = vec![Vec::new()];
    let mut y = top;

    for block in &layout.blocks {
        match block {
            Block::Spacer(height) => {
                y -= height;
                if y < MARGIN {
                    pages.push(Vec::new());
                    y = top;
                }
            }
            Block::Paragraph(paragraph) => {
                let style = styles.get(paragraph.style);
                let words = split_words(&paragraph.runs, style.bold);
                for line in wrap(&words, style.font_size, FRAME_WIDTH) {
                    if y - style.leading < MARGIN {
                        pages.push(Vec::new());
                        y = top;
                    }
                    y -= style.leading;
                    if let Some(page) = pages.last_mut() {
                        page.extend(place_line(&line, style, y));
                    }
                }
                y -= style.space_after;
            }
        }
    }
    pages
}

fn points(value: f32) -> Mm {
    Mm::from(Pt(value))
}

fn render_error(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::Rendering(e.to_string())
}

/// Renders with the built-in Helvetica faces, so no font files are needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn render(&self, layout: &Layout, styles: &StyleSheet) -> Result<Vec<u8>, DocumentError> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            layout.title.as_str(),
            points(PAGE_WIDTH),
            points(PAGE_HEIGHT),
            "Layer 1",
        );
        let regular: IndirectFontRef = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;
        let bold: IndirectFontRef = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;

        for (index, page) in paginate(layout, styles).into_iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) =
                    doc.add_page(points(PAGE_WIDTH), points(PAGE_HEIGHT), "Layer 1");
                doc.get_page(page_index).get_layer(layer_index)
            };

            for text in page {
                let (r, g, b) = text.color.rgb();
                layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
                let font = if text.bold { &bold } else { &regular };
                layer.use_text(text.text, text.font_size, points(text.x), points(text.y), font);
            }
        }

        doc.save_to_bytes().map_err(render_error)
    }
}
