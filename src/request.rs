//! Document edit operations and their batch-update wire form.

use serde::{Deserialize, Serialize, Serializer};

/// A single insertion point in the target document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

/// A half-open `[start_index, end_index)` range in the target document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

impl Range {
    pub fn new(start_index: usize, end_index: usize, tab_id: Option<String>) -> Self {
        Self {
            start_index,
            end_index,
            tab_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_index <= self.start_index
    }
}

/// RGB color with components in `[0, 1]`.
///
/// Deserializes from a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// Parse a `#RRGGBB` hex string.
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{hex}' must start with '#'"))?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{hex}' must have the form #RRGGBB"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|e| format!("color '{hex}': {e}"))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

/// Character-level style. Only fields that are `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_family: Option<String>,
    pub foreground_color: Option<Color>,
    pub background_color: Option<Color>,
    pub link_url: Option<String>,
}

impl TextStyle {
    /// Field mask naming exactly the fields this style sets.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.bold.is_some() {
            fields.push("bold");
        }
        if self.italic.is_some() {
            fields.push("italic");
        }
        if self.strikethrough.is_some() {
            fields.push("strikethrough");
        }
        if self.font_family.is_some() {
            fields.push("weightedFontFamily");
        }
        if self.foreground_color.is_some() {
            fields.push("foregroundColor");
        }
        if self.background_color.is_some() {
            fields.push("backgroundColor");
        }
        if self.link_url.is_some() {
            fields.push("link");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Named paragraph style applied to headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedStyle {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
}

impl NamedStyle {
    pub fn for_heading_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(NamedStyle::Heading1),
            2 => Some(NamedStyle::Heading2),
            3 => Some(NamedStyle::Heading3),
            4 => Some(NamedStyle::Heading4),
            5 => Some(NamedStyle::Heading5),
            6 => Some(NamedStyle::Heading6),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NamedStyle::Heading1 => "HEADING_1",
            NamedStyle::Heading2 => "HEADING_2",
            NamedStyle::Heading3 => "HEADING_3",
            NamedStyle::Heading4 => "HEADING_4",
            NamedStyle::Heading5 => "HEADING_5",
            NamedStyle::Heading6 => "HEADING_6",
        }
    }
}

/// Visual list marker category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletKind {
    Plain,
    Numbered,
    Checkbox,
}

impl BulletKind {
    pub fn preset(self) -> &'static str {
        match self {
            BulletKind::Plain => "BULLET_DISC_CIRCLE_SQUARE",
            BulletKind::Numbered => "NUMBERED_DECIMAL_ALPHA_ROMAN",
            BulletKind::Checkbox => "BULLET_CHECKBOX",
        }
    }
}

/// Bottom border drawn under horizontal-rule paragraphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub color: Color,
    pub width_pt: f32,
    pub padding_pt: f32,
}

pub const RULE_BORDER: Border = Border {
    color: Color::rgb(0.8, 0.8, 0.8),
    width_pt: 1.0,
    padding_pt: 6.0,
};

/// One unit of compiler output.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    InsertText { location: Location, text: String },
    UpdateTextStyle { range: Range, style: TextStyle },
    UpdateParagraphStyle { range: Range, named_style: NamedStyle },
    UpdateParagraphBorder { range: Range },
    CreateParagraphBullets { range: Range, kind: BulletKind },
    DeleteContentRange { range: Range },
}

impl Operation {
    /// Deletion of `[start, end)`, issued ahead of a conversion's requests.
    pub fn delete_range(start: usize, end: usize, tab_id: Option<String>) -> Self {
        Operation::DeleteContentRange {
            range: Range::new(start, end, tab_id),
        }
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, Operation::InsertText { .. })
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, Operation::DeleteContentRange { .. })
    }

    /// The addressed range, for every operation except insertions.
    pub fn range(&self) -> Option<&Range> {
        match self {
            Operation::InsertText { .. } => None,
            Operation::UpdateTextStyle { range, .. }
            | Operation::UpdateParagraphStyle { range, .. }
            | Operation::UpdateParagraphBorder { range }
            | Operation::CreateParagraphBullets { range, .. }
            | Operation::DeleteContentRange { range } => Some(range),
        }
    }
}

// Wire shapes of the batch-update request body.

#[derive(Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
enum WireRequest<'a> {
    InsertText {
        location: &'a Location,
        text: &'a str,
    },
    UpdateTextStyle {
        range: &'a Range,
        text_style: WireTextStyle<'a>,
        fields: String,
    },
    UpdateParagraphStyle {
        range: &'a Range,
        paragraph_style: WireParagraphStyle,
        fields: &'static str,
    },
    CreateParagraphBullets {
        range: &'a Range,
        bullet_preset: &'static str,
    },
    DeleteContentRange {
        range: &'a Range,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTextStyle<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weighted_font_family: Option<WireFontFamily<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    foreground_color: Option<WireOptionalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<WireOptionalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<WireLink<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFontFamily<'a> {
    font_family: &'a str,
}

#[derive(Serialize)]
struct WireLink<'a> {
    url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOptionalColor {
    color: WireColor,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireColor {
    rgb_color: WireRgb,
}

#[derive(Serialize)]
struct WireRgb {
    red: f32,
    green: f32,
    blue: f32,
}

impl From<Color> for WireOptionalColor {
    fn from(color: Color) -> Self {
        WireOptionalColor {
            color: WireColor {
                rgb_color: WireRgb {
                    red: color.red,
                    green: color.green,
                    blue: color.blue,
                },
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireParagraphStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    named_style_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    border_bottom: Option<WireBorder>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBorder {
    color: WireOptionalColor,
    width: WireDimension,
    padding: WireDimension,
    dash_style: &'static str,
}

#[derive(Serialize)]
struct WireDimension {
    magnitude: f32,
    unit: &'static str,
}

impl From<Border> for WireBorder {
    fn from(border: Border) -> Self {
        WireBorder {
            color: border.color.into(),
            width: WireDimension {
                magnitude: border.width_pt,
                unit: "PT",
            },
            padding: WireDimension {
                magnitude: border.padding_pt,
                unit: "PT",
            },
            dash_style: "SOLID",
        }
    }
}

impl<'a> From<&'a TextStyle> for WireTextStyle<'a> {
    fn from(style: &'a TextStyle) -> Self {
        WireTextStyle {
            bold: style.bold,
            italic: style.italic,
            strikethrough: style.strikethrough,
            weighted_font_family: style
                .font_family
                .as_deref()
                .map(|font_family| WireFontFamily { font_family }),
            foreground_color: style.foreground_color.map(Into::into),
            background_color: style.background_color.map(Into::into),
            link: style.link_url.as_deref().map(|url| WireLink { url }),
        }
    }
}

impl<'a> From<&'a Operation> for WireRequest<'a> {
    fn from(op: &'a Operation) -> Self {
        match op {
            Operation::InsertText { location, text } => WireRequest::InsertText { location, text },
            Operation::UpdateTextStyle { range, style } => WireRequest::UpdateTextStyle {
                range,
                text_style: style.into(),
                fields: style.fields().join(","),
            },
            Operation::UpdateParagraphStyle { range, named_style } => {
                WireRequest::UpdateParagraphStyle {
                    range,
                    paragraph_style: WireParagraphStyle {
                        named_style_type: Some(named_style.as_str()),
                        border_bottom: None,
                    },
                    fields: "namedStyleType",
                }
            }
            Operation::UpdateParagraphBorder { range } => WireRequest::UpdateParagraphStyle {
                range,
                paragraph_style: WireParagraphStyle {
                    named_style_type: None,
                    border_bottom: Some(RULE_BORDER.into()),
                },
                fields: "borderBottom",
            },
            Operation::CreateParagraphBullets { range, kind } => {
                WireRequest::CreateParagraphBullets {
                    range,
                    bullet_preset: kind.preset(),
                }
            }
            Operation::DeleteContentRange { range } => WireRequest::DeleteContentRange { range },
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRequest::from(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_colors() {
        let color = Color::from_hex("#FF0080").unwrap();
        assert_eq!(color.red, 1.0);
        assert_eq!(color.green, 0.0);
        assert!((color.blue - 128.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_bad_hex_colors() {
        assert!(Color::from_hex("FF0080").is_err());
        assert!(Color::from_hex("#FF008").is_err());
        assert!(Color::from_hex("#GG0080").is_err());
    }

    #[test]
    fn insert_text_wire_shape() {
        let op = Operation::InsertText {
            location: Location {
                index: 1,
                tab_id: Some("t.0".into()),
            },
            text: "hi".into(),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"insertText": {"location": {"index": 1, "tabId": "t.0"}, "text": "hi"}})
        );
    }

    #[test]
    fn text_style_fields_list_only_present_fields() {
        let op = Operation::UpdateTextStyle {
            range: Range::new(1, 5, None),
            style: TextStyle {
                bold: Some(true),
                link_url: None,
                ..TextStyle::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"updateTextStyle": {
                "range": {"startIndex": 1, "endIndex": 5},
                "textStyle": {"bold": true},
                "fields": "bold"
            }})
        );
    }

    #[test]
    fn link_and_font_wire_shape() {
        let style = TextStyle {
            font_family: Some("Roboto Mono".into()),
            link_url: Some("https://example.com".into()),
            ..TextStyle::default()
        };
        assert_eq!(style.fields(), vec!["weightedFontFamily", "link"]);
        let value = serde_json::to_value(WireTextStyle::from(&style)).unwrap();
        assert_eq!(
            value,
            json!({
                "weightedFontFamily": {"fontFamily": "Roboto Mono"},
                "link": {"url": "https://example.com"}
            })
        );
    }

    #[test]
    fn border_and_bullets_wire_shape() {
        let border = Operation::UpdateParagraphBorder {
            range: Range::new(3, 4, None),
        };
        let value = serde_json::to_value(&border).unwrap();
        assert_eq!(value["updateParagraphStyle"]["fields"], "borderBottom");
        assert_eq!(
            value["updateParagraphStyle"]["paragraphStyle"]["borderBottom"]["dashStyle"],
            "SOLID"
        );

        let bullets = Operation::CreateParagraphBullets {
            range: Range::new(1, 4, None),
            kind: BulletKind::Checkbox,
        };
        assert_eq!(
            serde_json::to_value(&bullets).unwrap(),
            json!({"createParagraphBullets": {
                "range": {"startIndex": 1, "endIndex": 4},
                "bulletPreset": "BULLET_CHECKBOX"
            }})
        );
    }

    #[test]
    fn heading_named_styles() {
        assert_eq!(NamedStyle::for_heading_level(1), Some(NamedStyle::Heading1));
        assert_eq!(NamedStyle::for_heading_level(6).map(NamedStyle::as_str), Some("HEADING_6"));
        assert_eq!(NamedStyle::for_heading_level(7), None);
    }
}
