//! Bullet assignment for reconstructed list items.

use tracing::trace;

use crate::context::PendingListItem;
use crate::request::{Operation, Range};

/// One bullet request per item with a non-empty range, highest start first.
///
/// Bullet creation strips the leading indent markers it reads nesting from,
/// which shifts everything after the addressed paragraph; issuing the
/// highest ranges first keeps earlier ranges valid.
pub(crate) fn bullet_operations(items: &[PendingListItem], tab_id: Option<&str>) -> Vec<Operation> {
    let mut complete: Vec<(&PendingListItem, usize)> = items
        .iter()
        .filter_map(|item| match item.end {
            Some(end) if end > item.start => Some((item, end)),
            _ => {
                trace!(start = item.start, level = item.level, "skipping empty list item");
                None
            }
        })
        .collect();
    complete.sort_by(|(a, _), (b, _)| b.start.cmp(&a.start));

    complete
        .into_iter()
        .map(|(item, end)| Operation::CreateParagraphBullets {
            range: Range::new(item.start, end, tab_id.map(str::to_string)),
            kind: item.kind,
        })
        .collect()
}
