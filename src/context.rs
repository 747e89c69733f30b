//! Mutable state owned by one conversion call.

use crate::request::{BulletKind, NamedStyle};
use crate::style::{MergedStyle, StyleFragment};

pub(crate) const NEWLINE: &str = "\n";
pub(crate) const INDENT_MARKER: &str = "\t";

/// Length of `text` in document index units (UTF-16 code units).
pub(crate) fn doc_len(text: &str) -> usize {
    text.encode_utf16().count()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Insertion {
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StyledSpan {
    pub start: usize,
    pub end: usize,
    pub style: MergedStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenList {
    pub kind: ListKind,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingListItem {
    pub start: usize,
    pub end: Option<usize>,
    pub level: usize,
    pub kind: BulletKind,
    pub task_prefix_checked: bool,
    /// A nested list opened inside this item; its close must not swallow the children.
    pub has_nested_list: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParagraphRange {
    pub start: usize,
    pub end: usize,
    pub style: NamedStyle,
}

#[derive(Debug)]
pub(crate) struct ConversionContext {
    pub start_index: usize,
    pub tab_id: Option<String>,
    pub current_offset: usize,
    pub insertions: Vec<Insertion>,
    /// Number of newlines the emitted text currently ends with.
    trailing_newlines: usize,
    pub formatting_stack: Vec<StyleFragment>,
    pub styled_spans: Vec<StyledSpan>,
    pub open_lists: Vec<OpenList>,
    pub pending_list_items: Vec<PendingListItem>,
    pub open_list_items: Vec<usize>,
    pub paragraph_ranges: Vec<ParagraphRange>,
    pub rule_ranges: Vec<(usize, usize)>,
    /// Offset where the open heading or top-level paragraph began. Headings
    /// style from here; plain paragraphs only trace it.
    pub paragraph_start: Option<usize>,
    pub heading_level: Option<u8>,
    /// Buffered content of the code block being read.
    pub code_block: Option<String>,
    /// Depth inside an unsupported container whose events are dropped.
    pub skip_depth: usize,
}

impl ConversionContext {
    pub fn new(start_index: usize, tab_id: Option<String>) -> Self {
        Self {
            start_index,
            tab_id,
            current_offset: start_index,
            insertions: Vec::new(),
            trailing_newlines: 0,
            formatting_stack: Vec::new(),
            styled_spans: Vec::new(),
            open_lists: Vec::new(),
            pending_list_items: Vec::new(),
            open_list_items: Vec::new(),
            paragraph_ranges: Vec::new(),
            rule_ranges: Vec::new(),
            paragraph_start: None,
            heading_level: None,
            code_block: None,
            skip_depth: 0,
        }
    }

    /// Append an insertion at the current offset and advance past it.
    pub fn insert(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.insertions.push(Insertion {
            offset: self.current_offset,
            text: text.to_string(),
        });
        self.current_offset += doc_len(text);

        let trailing = text.len() - text.trim_end_matches('\n').len();
        if trailing == text.len() {
            self.trailing_newlines += trailing;
        } else {
            self.trailing_newlines = trailing;
        }
    }

    /// Insert literal text, recording a styled span if formatting is active.
    pub fn insert_styled(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let start = self.current_offset;
        self.insert(text);

        let style = MergedStyle::from_stack(&self.formatting_stack);
        if !style.is_plain() {
            self.styled_spans.push(StyledSpan {
                start,
                end: self.current_offset,
                style,
            });
        }
    }

    pub fn has_content(&self) -> bool {
        !self.insertions.is_empty()
    }

    pub fn ends_with_newline(&self) -> bool {
        self.trailing_newlines >= 1
    }

    pub fn ends_with_blank_line(&self) -> bool {
        self.trailing_newlines >= 2
    }

    /// Terminate the emitted text unless it already ends in a newline.
    ///
    /// Returns true if a newline was inserted.
    pub fn ensure_newline(&mut self) -> bool {
        if self.has_content() && !self.ends_with_newline() {
            self.insert(NEWLINE);
            true
        } else {
            false
        }
    }

    /// The innermost open list item.
    pub fn current_item_mut(&mut self) -> Option<&mut PendingListItem> {
        let index = *self.open_list_items.last()?;
        self.pending_list_items.get_mut(index)
    }

    /// Move the innermost open item's end forward to `end`, never backward.
    pub fn extend_current_item(&mut self, end: usize) {
        if let Some(item) = self.current_item_mut() {
            if end > item.start && item.end.is_none_or(|current| end > current) {
                item.end = Some(end);
            }
        }
    }
}
