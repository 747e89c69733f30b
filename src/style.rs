//! Inline formatting stack and its flattening into a merged style.
//!
//! Fragments are pushed as inline containers open and removed as they close.
//! Closes remove the nearest fragment with the same key from the top, not
//! necessarily the top itself, so out-of-order closes never corrupt the stack.

use crate::config::CodeConfig;
use crate::request::TextStyle;

/// One active inline style, pushed when its container opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleFragment {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Link(String),
}

/// The style field a fragment writes, used to match closes to opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKey {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Link,
}

impl StyleFragment {
    pub fn key(&self) -> StyleKey {
        match self {
            StyleFragment::Bold => StyleKey::Bold,
            StyleFragment::Italic => StyleKey::Italic,
            StyleFragment::Strikethrough => StyleKey::Strikethrough,
            StyleFragment::Code => StyleKey::Code,
            StyleFragment::Link(_) => StyleKey::Link,
        }
    }
}

/// Flattened style attributed to a run of literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: Option<String>,
}

impl MergedStyle {
    /// Fold the stack oldest to newest; later fragments overwrite the fields they set.
    pub fn from_stack(stack: &[StyleFragment]) -> Self {
        stack.iter().fold(MergedStyle::default(), |mut merged, fragment| {
            match fragment {
                StyleFragment::Bold => merged.bold = true,
                StyleFragment::Italic => merged.italic = true,
                StyleFragment::Strikethrough => merged.strikethrough = true,
                StyleFragment::Code => merged.code = true,
                StyleFragment::Link(url) => merged.link = Some(url.clone()),
            }
            merged
        })
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.strikethrough && !self.code && self.link.is_none()
    }

    /// Split into at most two character styles: the visual fields, then the link.
    pub fn to_text_styles(&self, code: &CodeConfig) -> Vec<TextStyle> {
        let mut styles = Vec::with_capacity(2);

        let mut visual = TextStyle::default();
        if self.bold {
            visual.bold = Some(true);
        }
        if self.italic {
            visual.italic = Some(true);
        }
        if self.strikethrough {
            visual.strikethrough = Some(true);
        }
        if self.code {
            code.apply(&mut visual);
        }
        if !visual.is_empty() {
            styles.push(visual);
        }

        if let Some(url) = &self.link {
            styles.push(TextStyle {
                link_url: Some(url.clone()),
                ..TextStyle::default()
            });
        }

        styles
    }
}

/// Remove the fragment nearest the top of the stack carrying `key`.
///
/// Returns false when no such fragment is open.
pub fn remove_nearest(stack: &mut Vec<StyleFragment>, key: StyleKey) -> bool {
    match stack.iter().rposition(|fragment| fragment.key() == key) {
        Some(pos) => {
            stack.remove(pos);
            true
        }
        None => false,
    }
}
