use std::sync::LazyLock;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;
use tracing::trace;

use crate::context::{
    ConversionContext, INDENT_MARKER, ListKind, NEWLINE, OpenList, ParagraphRange,
    PendingListItem, StyledSpan,
};
use crate::error::ConvertError;
use crate::request::{BulletKind, NamedStyle};
use crate::style::{self, MergedStyle, StyleFragment, StyleKey};

/// `[ ]`, `[x]` or `[X]` followed by whitespace at the start of an item.
static TASK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[ xX]\]\s+").expect("task prefix pattern is valid"));

fn tokenizer_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options
}

/// Walk the markdown token stream once, recording insertions and ranges in `ctx`.
pub(crate) fn walk(markdown: &str, ctx: &mut ConversionContext) -> Result<(), ConvertError> {
    let parser = TextMergeStream::new(Parser::new_ext(markdown, tokenizer_options()));
    for event in parser {
        process_event(event, ctx)?;
    }
    Ok(())
}

pub(crate) fn process_event(event: Event<'_>, ctx: &mut ConversionContext) -> Result<(), ConvertError> {
    // Inside an unsupported container, only track nesting until it closes.
    if ctx.skip_depth > 0 {
        match event {
            Event::Start(_) => ctx.skip_depth += 1,
            Event::End(_) => ctx.skip_depth -= 1,
            _ => {}
        }
        return Ok(());
    }

    if ctx.code_block.is_some() {
        match event {
            Event::Text(text) => {
                if let Some(buffer) = ctx.code_block.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(content) = ctx.code_block.take() {
                    emit_code_block(ctx, &content);
                }
            }
            _ => {}
        }
        return Ok(());
    }

    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            ctx.heading_level = Some(heading_level_to_u8(level));
            ctx.paragraph_start = Some(ctx.current_offset);
        }
        Event::End(TagEnd::Heading(_)) => close_heading(ctx),

        // Paragraphs
        Event::Start(Tag::Paragraph) => {
            if ctx.open_lists.is_empty() {
                ctx.paragraph_start = Some(ctx.current_offset);
            }
        }
        Event::End(TagEnd::Paragraph) => close_paragraph(ctx),

        // Text content
        Event::Text(text) => emit_text(ctx, &text),
        Event::Code(code) => {
            ctx.formatting_stack.push(StyleFragment::Code);
            emit_text(ctx, &code);
            style::remove_nearest(&mut ctx.formatting_stack, StyleKey::Code);
        }

        // Code blocks
        Event::Start(Tag::CodeBlock(_)) => {
            terminate_open_item(ctx);
            ctx.code_block = Some(String::new());
        }

        // Inline formatting
        Event::Start(Tag::Strong) => ctx.formatting_stack.push(StyleFragment::Bold),
        Event::Start(Tag::Emphasis) => ctx.formatting_stack.push(StyleFragment::Italic),
        Event::Start(Tag::Strikethrough) => {
            ctx.formatting_stack.push(StyleFragment::Strikethrough)
        }
        Event::Start(Tag::Link { dest_url, .. }) => {
            if !dest_url.is_empty() {
                ctx.formatting_stack
                    .push(StyleFragment::Link(dest_url.into_string()));
            }
        }
        Event::End(TagEnd::Strong) => close_inline(ctx, StyleKey::Bold),
        Event::End(TagEnd::Emphasis) => close_inline(ctx, StyleKey::Italic),
        Event::End(TagEnd::Strikethrough) => close_inline(ctx, StyleKey::Strikethrough),
        Event::End(TagEnd::Link) => close_inline(ctx, StyleKey::Link),

        // Soft/hard breaks
        Event::SoftBreak => ctx.insert(" "),
        Event::HardBreak => ctx.insert(NEWLINE),

        // Lists
        Event::Start(Tag::List(first_number)) => {
            let kind = if first_number.is_some() {
                ListKind::Ordered
            } else {
                ListKind::Bullet
            };
            open_list(ctx, kind);
        }
        Event::End(TagEnd::List(_)) => {
            if ctx.open_lists.pop().is_none() {
                trace!("ignoring unmatched list close");
            }
        }
        Event::Start(Tag::Item) => open_list_item(ctx)?,
        Event::End(TagEnd::Item) => close_list_item(ctx),

        // Horizontal rule
        Event::Rule => emit_rule(ctx),

        // Containers dropped together with everything inside them
        Event::Start(
            tag @ (Tag::Table(_)
            | Tag::Image { .. }
            | Tag::HtmlBlock
            | Tag::FootnoteDefinition(_)
            | Tag::MetadataBlock(_)),
        ) => {
            trace!(?tag, "skipping unsupported container");
            ctx.skip_depth = 1;
        }

        // Block quotes and everything else pass through without effect
        other => trace!(?other, "ignoring markdown event"),
    }

    Ok(())
}

fn close_heading(ctx: &mut ConversionContext) {
    let Some(level) = ctx.heading_level.take() else {
        trace!("ignoring heading close without an open heading");
        return;
    };
    let start = ctx.paragraph_start.take().unwrap_or(ctx.current_offset);
    let end = ctx.current_offset;
    match NamedStyle::for_heading_level(level) {
        Some(style) if end > start => ctx.paragraph_ranges.push(ParagraphRange { start, end, style }),
        _ => trace!(level, start, end, "heading without styleable content"),
    }
    ctx.insert(NEWLINE);
}

fn close_paragraph(ctx: &mut ConversionContext) {
    if ctx.open_lists.is_empty() {
        let start = ctx.paragraph_start.take();
        trace!(?start, end = ctx.current_offset, "paragraph");
        ctx.insert("\n\n");
        ctx.extend_current_item(ctx.current_offset - 2);
    } else {
        let emitted = ctx.ensure_newline();
        let end = if emitted {
            ctx.current_offset - 1
        } else {
            ctx.current_offset
        };
        ctx.extend_current_item(end);
    }
}

/// Close the text of the innermost open item before a nested block starts.
///
/// Tight list items carry no paragraph events, so nothing else would terminate
/// the item's own line before its children are emitted.
fn terminate_open_item(ctx: &mut ConversionContext) {
    if ctx.open_list_items.is_empty() || !ctx.has_content() {
        return;
    }
    // Content that already ends a line (a heading, a code block) still bounds the item.
    ctx.ensure_newline();
    ctx.extend_current_item(ctx.current_offset - 1);
}

fn emit_text(ctx: &mut ConversionContext, text: &str) {
    let text = strip_task_prefix(ctx, text);
    ctx.insert_styled(text);
}

/// Strip a task-list prefix from the first text of a freshly opened item.
fn strip_task_prefix<'t>(ctx: &mut ConversionContext, text: &'t str) -> &'t str {
    let Some(item) = ctx.current_item_mut() else {
        return text;
    };
    if item.task_prefix_checked {
        return text;
    }
    item.task_prefix_checked = true;

    match TASK_PREFIX.find(text) {
        Some(prefix) => {
            item.kind = BulletKind::Checkbox;
            &text[prefix.end()..]
        }
        None => text,
    }
}

fn close_inline(ctx: &mut ConversionContext, key: StyleKey) {
    if !style::remove_nearest(&mut ctx.formatting_stack, key) {
        trace!(?key, "ignoring unmatched inline close");
    }
}

fn emit_code_block(ctx: &mut ConversionContext, content: &str) {
    let body = content.strip_suffix('\n').unwrap_or(content);
    let code = MergedStyle {
        code: true,
        ..MergedStyle::default()
    };

    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        // Empty lines become a space so they stay visible and styleable.
        let line = if line.is_empty() { " " } else { line };
        let start = ctx.current_offset;
        ctx.insert(line);
        ctx.styled_spans.push(StyledSpan {
            start,
            end: ctx.current_offset,
            style: code.clone(),
        });
        ctx.insert(NEWLINE);
    }

    if !ctx.ends_with_blank_line() {
        ctx.insert(NEWLINE);
    }
}

fn open_list(ctx: &mut ConversionContext, kind: ListKind) {
    if let Some(item) = ctx.current_item_mut() {
        item.has_nested_list = true;
    }
    terminate_open_item(ctx);

    let level = ctx.open_lists.len();
    ctx.open_lists.push(OpenList { kind, level });
}

fn open_list_item(ctx: &mut ConversionContext) -> Result<(), ConvertError> {
    let Some(list) = ctx.open_lists.last().copied() else {
        return Err(ConvertError::MalformedMarkdown(format!(
            "list item at index {} is not inside a list",
            ctx.current_offset
        )));
    };

    // The bullet range starts at the indent markers, which set the nesting level.
    let start = ctx.current_offset;
    if list.level > 0 {
        ctx.insert(&INDENT_MARKER.repeat(list.level));
    }

    let kind = match list.kind {
        ListKind::Ordered => BulletKind::Numbered,
        ListKind::Bullet => BulletKind::Plain,
    };
    ctx.pending_list_items.push(PendingListItem {
        start,
        end: None,
        level: list.level,
        kind,
        task_prefix_checked: false,
        has_nested_list: false,
    });
    ctx.open_list_items.push(ctx.pending_list_items.len() - 1);
    Ok(())
}

fn close_list_item(ctx: &mut ConversionContext) {
    let Some(index) = ctx.open_list_items.pop() else {
        trace!("ignoring unmatched list item close");
        return;
    };

    let end = if ctx.ends_with_newline() {
        ctx.current_offset - 1
    } else {
        ctx.current_offset
    };
    if let Some(item) = ctx.pending_list_items.get_mut(index) {
        if item.end.is_none() && !item.has_nested_list && end > item.start {
            item.end = Some(end);
        }
    }

    ctx.ensure_newline();
}

fn emit_rule(ctx: &mut ConversionContext) {
    ctx.ensure_newline();
    let start = ctx.current_offset;
    ctx.insert(NEWLINE);
    ctx.rule_ranges.push((start, ctx.current_offset));
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn walked(markdown: &str) -> ConversionContext {
        let mut ctx = ConversionContext::new(1, None);
        walk(markdown, &mut ctx).unwrap();
        ctx
    }

    fn text_of(ctx: &ConversionContext) -> String {
        ctx.insertions.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let ctx = walked("one\n\ntwo");
        assert_eq!(text_of(&ctx), "one\n\ntwo\n\n");
    }

    #[test]
    fn soft_break_becomes_space() {
        let ctx = walked("one\ntwo");
        assert_eq!(text_of(&ctx), "one two\n\n");
    }

    #[test]
    fn hard_break_becomes_newline() {
        let ctx = walked("one  \ntwo");
        assert_eq!(text_of(&ctx), "one\ntwo\n\n");
    }

    #[test]
    fn nested_items_are_indented_and_ranged_from_the_indent() {
        let ctx = walked("- a\n  - b\n- c");
        assert_eq!(text_of(&ctx), "a\n\tb\nc\n");
        let ranges: Vec<_> = ctx
            .pending_list_items
            .iter()
            .map(|item| (item.start, item.end, item.level))
            .collect();
        assert_eq!(
            ranges,
            vec![(1, Some(2), 0), (3, Some(5), 1), (6, Some(7), 0)]
        );
    }

    fn item_bounds(ctx: &ConversionContext) -> Vec<(usize, Option<usize>)> {
        ctx.pending_list_items
            .iter()
            .map(|item| (item.start, item.end))
            .collect()
    }

    #[test]
    fn heading_item_with_nested_list_keeps_its_range() {
        let ctx = walked("- # Title\n  - child");
        assert_eq!(text_of(&ctx), "Title\n\tchild\n");
        assert_eq!(item_bounds(&ctx), vec![(1, Some(6)), (7, Some(13))]);
    }

    #[test]
    fn code_first_item_with_nested_list_keeps_its_range() {
        let ctx = walked("- ```\n  x\n  ```\n  - child");
        assert_eq!(text_of(&ctx), "x\n\n\tchild\n");
        assert_eq!(item_bounds(&ctx), vec![(1, Some(3)), (4, Some(10))]);
    }

    #[test]
    fn code_block_after_text_in_tight_item() {
        let ctx = walked("- a\n  ```\n  x\n  ```\n- b");
        assert_eq!(text_of(&ctx), "a\nx\n\nb\n");
        assert_eq!(item_bounds(&ctx), vec![(1, Some(2)), (6, Some(7))]);
    }

    #[test]
    fn code_block_after_paragraph_in_loose_item() {
        let ctx = walked("- a\n\n  ```\n  x\n  ```\n- b");
        assert_eq!(text_of(&ctx), "a\nx\n\nb\n");
        assert_eq!(item_bounds(&ctx), vec![(1, Some(2)), (6, Some(7))]);
    }

    #[test]
    fn loose_list_does_not_double_terminate() {
        let ctx = walked("- a\n\n- b\n");
        assert_eq!(text_of(&ctx), "a\nb\n");
        assert_eq!(ctx.pending_list_items[0].end, Some(2));
        assert_eq!(ctx.pending_list_items[1].end, Some(4));
    }

    #[test]
    fn task_prefix_is_stripped_once() {
        let ctx = walked("- [x] done [ ] literal");
        assert_eq!(text_of(&ctx), "done [ ] literal\n");
        assert_eq!(ctx.pending_list_items[0].kind, BulletKind::Checkbox);
    }

    #[test]
    fn task_prefix_only_item_emits_nothing() {
        let mut ctx = ConversionContext::new(1, None);
        for event in [
            Event::Start(Tag::List(None)),
            Event::Start(Tag::Item),
            Event::Text("[x] ".into()),
            Event::Text("kept".into()),
            Event::End(TagEnd::Item),
        ] {
            process_event(event, &mut ctx).unwrap();
        }
        assert_eq!(ctx.pending_list_items[0].kind, BulletKind::Checkbox);
        assert_eq!(text_of(&ctx), "kept\n");
    }

    #[test]
    fn prefix_without_trailing_whitespace_stays_literal() {
        let ctx = walked("- [ ]\n- next");
        assert_eq!(ctx.pending_list_items[0].kind, BulletKind::Plain);
        assert_eq!(text_of(&ctx), "[ ]\nnext\n");
    }

    #[test]
    fn code_block_lines_are_styled_without_terminators() {
        let ctx = walked("```\nlet a;\n\nlet b;\n```");
        assert_eq!(text_of(&ctx), "let a;\n \nlet b;\n\n");
        let spans: Vec<_> = ctx.styled_spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(spans, vec![(1, 7), (8, 9), (10, 16)]);
        assert!(ctx.styled_spans.iter().all(|s| s.style.code));
    }

    #[test]
    fn rule_after_unterminated_text_adds_newline_first() {
        let mut ctx = ConversionContext::new(1, None);
        ctx.insert("tail");
        process_event(Event::Rule, &mut ctx).unwrap();
        assert_eq!(text_of(&ctx), "tail\n\n");
        assert_eq!(ctx.rule_ranges, vec![(6, 7)]);
    }

    #[test]
    fn tables_and_images_are_dropped_whole() {
        let ctx = walked("| a | b |\n|---|---|\n| 1 | 2 |\n\n![alt](x.png) after");
        assert_eq!(text_of(&ctx), " after\n\n");
    }

    #[test]
    fn block_quote_content_passes_through() {
        let ctx = walked("> quoted");
        assert_eq!(text_of(&ctx), "quoted\n\n");
    }

    #[test]
    fn item_outside_list_is_malformed() {
        let mut ctx = ConversionContext::new(1, None);
        let err = process_event(Event::Start(Tag::Item), &mut ctx).unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn unmatched_closes_are_absorbed() {
        let mut ctx = ConversionContext::new(1, None);
        for event in [
            Event::End(TagEnd::Item),
            Event::End(TagEnd::Strong),
            Event::End(TagEnd::Link),
            Event::End(TagEnd::Heading(HeadingLevel::H2)),
            Event::End(TagEnd::List(false)),
        ] {
            process_event(event, &mut ctx).unwrap();
        }
        assert!(ctx.insertions.is_empty());
    }

    #[test]
    fn out_of_order_inline_closes_keep_remaining_styles() {
        let mut ctx = ConversionContext::new(1, None);
        for event in [
            Event::Start(Tag::Strong),
            Event::Start(Tag::Emphasis),
            Event::End(TagEnd::Strong),
            Event::Text("x".into()),
            Event::End(TagEnd::Emphasis),
        ] {
            process_event(event, &mut ctx).unwrap();
        }
        let style = &ctx.styled_spans[0].style;
        assert!(style.italic);
        assert!(!style.bold);
        assert!(ctx.formatting_stack.is_empty());
    }
}
