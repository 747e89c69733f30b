//! Assembly of the final, ordered request list.
//!
//! Order: insertions in emission order, then character styles, heading
//! styles and rule borders, then list bullets (see [`crate::lists`]).

use crate::config::CodeConfig;
use crate::context::ConversionContext;
use crate::error::ConvertError;
use crate::lists;
use crate::request::{Location, Operation, Range};

pub(crate) fn finalize(
    ctx: ConversionContext,
    code: &CodeConfig,
) -> Result<Vec<Operation>, ConvertError> {
    check_invariants(&ctx)?;

    let tab_id = ctx.tab_id.as_deref();
    let range = |start: usize, end: usize| Range::new(start, end, tab_id.map(str::to_string));

    let mut ops: Vec<Operation> = ctx
        .insertions
        .iter()
        .map(|insertion| Operation::InsertText {
            location: Location {
                index: insertion.offset,
                tab_id: tab_id.map(str::to_string),
            },
            text: insertion.text.clone(),
        })
        .collect();

    for span in &ctx.styled_spans {
        for style in span.style.to_text_styles(code) {
            ops.push(Operation::UpdateTextStyle {
                range: range(span.start, span.end),
                style,
            });
        }
    }

    ops.extend(ctx.paragraph_ranges.iter().map(|paragraph| {
        Operation::UpdateParagraphStyle {
            range: range(paragraph.start, paragraph.end),
            named_style: paragraph.style,
        }
    }));

    ops.extend(
        ctx.rule_ranges
            .iter()
            .map(|&(start, end)| Operation::UpdateParagraphBorder {
                range: range(start, end),
            }),
    );

    ops.extend(lists::bullet_operations(&ctx.pending_list_items, tab_id));

    Ok(ops)
}

fn check_invariants(ctx: &ConversionContext) -> Result<(), ConvertError> {
    if !ctx.formatting_stack.is_empty() {
        return Err(ConvertError::Internal(format!(
            "{} inline style(s) still open at end of input",
            ctx.formatting_stack.len()
        )));
    }

    let (low, high) = (ctx.start_index, ctx.current_offset);
    let in_bounds = |start: usize, end: usize| low <= start && start <= end && end <= high;

    let spans = ctx.styled_spans.iter().map(|s| (s.start, s.end));
    let headings = ctx.paragraph_ranges.iter().map(|p| (p.start, p.end));
    let rules = ctx.rule_ranges.iter().copied();
    let items = ctx
        .pending_list_items
        .iter()
        .filter_map(|item| item.end.map(|end| (item.start, end)));

    if let Some((start, end)) = spans
        .chain(headings)
        .chain(rules)
        .chain(items)
        .find(|&(start, end)| !in_bounds(start, end))
    {
        return Err(ConvertError::Internal(format!(
            "range [{start}, {end}) outside of written text [{low}, {high})"
        )));
    }

    Ok(())
}
