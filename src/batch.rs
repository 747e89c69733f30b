//! Splitting requests into ordered batch-update bodies.

use serde::Serialize;

use crate::request::Operation;

/// One batch-update request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    pub requests: Vec<Operation>,
}

/// Order deletions, then insertions, then everything else, and chunk the
/// result into batches of at most `max_requests`.
///
/// Relative order inside each group is preserved, so a compiled request list
/// can be handed over as is.
pub fn plan_batches(
    deletions: Vec<Operation>,
    operations: Vec<Operation>,
    max_requests: usize,
) -> Vec<Batch> {
    let max_requests = max_requests.max(1);
    let (insertions, styling): (Vec<Operation>, Vec<Operation>) =
        operations.into_iter().partition(Operation::is_insertion);

    let ordered: Vec<Operation> = deletions
        .into_iter()
        .chain(insertions)
        .chain(styling)
        .collect();

    ordered
        .chunks(max_requests)
        .map(|chunk| Batch {
            requests: chunk.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BulletKind, Location, Range};

    fn insert(index: usize) -> Operation {
        Operation::InsertText {
            location: Location { index, tab_id: None },
            text: "x".into(),
        }
    }

    fn bullets(start: usize) -> Operation {
        Operation::CreateParagraphBullets {
            range: Range::new(start, start + 1, None),
            kind: BulletKind::Plain,
        }
    }

    #[test]
    fn empty_input_plans_nothing() {
        assert!(plan_batches(Vec::new(), Vec::new(), 10).is_empty());
    }

    #[test]
    fn deletions_then_insertions_then_styles() {
        let ops = vec![bullets(3), insert(1), bullets(1), insert(2)];
        let batches = plan_batches(vec![Operation::delete_range(1, 40, None)], ops, 100);
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].requests,
            vec![
                Operation::delete_range(1, 40, None),
                insert(1),
                insert(2),
                bullets(3),
                bullets(1),
            ]
        );
    }

    #[test]
    fn chunks_respect_the_ceiling() {
        let ops: Vec<Operation> = (1..=5).map(insert).collect();
        let sizes: Vec<usize> = plan_batches(Vec::new(), ops, 2)
            .iter()
            .map(|b| b.requests.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn zero_ceiling_is_treated_as_one() {
        assert_eq!(plan_batches(Vec::new(), vec![insert(1), insert(2)], 0).len(), 2);
    }

    #[test]
    fn batch_serializes_as_request_body() {
        let batch = Batch {
            requests: vec![Operation::delete_range(2, 5, Some("t.2".into()))],
        };
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            serde_json::json!({"requests": [{"deleteContentRange": {
                "range": {"startIndex": 2, "endIndex": 5, "tabId": "t.2"}
            }}]})
        );
    }
}
