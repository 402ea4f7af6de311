//! Presentation styles, kept apart from the code that assembles document content.

/// 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub u32);

impl HexColor {
    pub fn rgb(self) -> (f32, f32, f32) {
        let channel = |shift: u32| ((self.0 >> shift) & 0xff) as f32 / 255.0;
        (channel(16), channel(8), channel(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleName {
    Title,
    Heading,
    Body,
    Footer,
}

/// Sizes are in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub leading: f32,
    pub color: HexColor,
    pub alignment: Alignment,
    pub bold: bool,
    pub space_after: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub title: TextStyle,
    pub heading: TextStyle,
    pub body: TextStyle,
    pub footer: TextStyle,
}

impl StyleSheet {
    pub fn get(&self, name: StyleName) -> &TextStyle {
        match name {
            StyleName::Title => &self.title,
            StyleName::Heading => &self.heading,
            StyleName::Body => &self.body,
            StyleName::Footer => &self.footer,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            title: TextStyle {
                font_size: 24.0,
                leading: 28.8,
                color: HexColor(0x1a1a1a),
                alignment: Alignment::Center,
                bold: true,
                space_after: 30.0,
            },
            heading: TextStyle {
                font_size: 16.0,
                leading: 19.2,
                color: HexColor(0x333333),
                alignment: Alignment::Left,
                bold: true,
                space_after: 12.0,
            },
            body: TextStyle {
                font_size: 12.0,
                leading: 16.0,
                color: HexColor(0x555555),
                alignment: Alignment::Left,
                bold: false,
                space_after: 12.0,
            },
            footer: TextStyle {
                font_size: 10.0,
                leading: 12.0,
                color: HexColor(0x888888),
                alignment: Alignment::Center,
                bold: false,
                space_after: 0.0,
            },
        }
    }
}
