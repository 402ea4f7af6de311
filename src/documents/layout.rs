use crate::documents::style::StyleName;

pub const INCH: f32 = 72.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: StyleName,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    /// Vertical gap in points.
    Spacer(f32),
}

/// Ordered content of one document, independent of how it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Layout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn spacer(&mut self, points: f32) -> &mut Self {
        self.blocks.push(Block::Spacer(points));
        self
    }

    pub fn paragraph(&mut self, style: StyleName, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(Paragraph {
            style,
            runs: vec![Run {
                text: text.into(),
                bold: false,
            }],
        }));
        self
    }

    /// Bold label followed by a regular value.
    pub fn field(&mut self, style: StyleName, label: &str, value: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(Paragraph {
            style,
            runs: vec![
                Run {
                    text: format!("{label}:"),
                    bold: true,
                },
                Run {
                    text: value.into(),
                    bold: false,
                },
            ],
        }));
        self
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Spacer(_) => None,
        })
    }

    /// One line per paragraph; handy for assertions and logging.
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
