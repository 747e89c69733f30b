//! Compile Markdown into ordered document batch-update requests.
//!
//! The markdown is tokenized once and walked in a single pass that tracks the
//! absolute insertion index as text is emitted. The result is a list of
//! insertions followed by range-based styling: character styles, heading
//! styles, horizontal-rule borders and, last, list bullets.

mod batch;
mod config;
mod context;
mod convert;
mod error;
mod finalize;
mod lists;
mod request;
mod style;

pub use batch::{Batch, plan_batches};
pub use config::{BatchConfig, CodeConfig, Config};
pub use error::{ConfigError, ConvertError};
pub use request::{
    Border, BulletKind, Color, Location, NamedStyle, Operation, RULE_BORDER, Range, TextStyle,
};

use context::ConversionContext;
use tracing::debug;

/// Convert markdown to requests inserting at `start_index` (1-based) using default config.
pub fn markdown_to_requests(
    markdown: &str,
    start_index: usize,
    tab_id: Option<&str>,
) -> Result<Vec<Operation>, ConvertError> {
    markdown_to_requests_with_config(markdown, start_index, tab_id, &Config::compiled_default())
}

/// Convert markdown to requests inserting at `start_index` (1-based) with custom config.
///
/// `tab_id`, when given, is copied onto every location and range.
pub fn markdown_to_requests_with_config(
    markdown: &str,
    start_index: usize,
    tab_id: Option<&str>,
    config: &Config,
) -> Result<Vec<Operation>, ConvertError> {
    if start_index == 0 {
        return Err(ConvertError::MalformedMarkdown(
            "start index must be at least 1".to_string(),
        ));
    }
    if markdown.trim().is_empty() {
        debug!("empty markdown, nothing to convert");
        return Ok(Vec::new());
    }

    debug!(len = markdown.len(), start_index, ?tab_id, "converting markdown");
    let mut ctx = ConversionContext::new(start_index, tab_id.map(str::to_string));
    convert::walk(markdown, &mut ctx)?;
    let ops = finalize::finalize(ctx, &config.code)?;
    debug!(requests = ops.len(), "markdown converted");

    Ok(ops)
}

/// Convert markdown and split the requests into batch-update bodies,
/// preceded by `deletions`.
pub fn markdown_to_batches(
    markdown: &str,
    start_index: usize,
    tab_id: Option<&str>,
    deletions: Vec<Operation>,
    config: &Config,
) -> Result<Vec<Batch>, ConvertError> {
    let ops = markdown_to_requests_with_config(markdown, start_index, tab_id, config)?;
    Ok(plan_batches(deletions, ops, config.batch.ceiling()))
}
