//! Path template interpolation
//!
//! Stream paths carry `{placeholder}` segments that are filled from the
//! partition context, e.g. `ad_accounts/{ad_account_id}/campaigns`.

use crate::error::{Error, Result};
use crate::partition::PartitionContext;
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching path placeholders: {name}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}").unwrap());

/// Render a path template with values from the partition context
///
/// Every placeholder must resolve; missing keys are reported together.
pub fn render(template: &str, ctx: &PartitionContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match ctx.get(name) {
            Some(value) => value.to_string(),
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}
