//! The loadplan template language.
//!
//! A template is a sequence of `[Type: Name]` blocks, each followed by
//! `key = value` entries:
//!
//! ```text
//! [TestPlan: Checkout]
//! comments = nightly run
//!
//! [ThreadGroup: Shoppers]
//! numThreads = 20
//!
//! [HttpRequest: Add to cart]
//! method = POST
//! path = /cart
//! body = """
//! {"sku": "A-1"}
//! """
//! ```
//!
//! Parsing runs in four passes: tokenizing, parent resolution, assertion
//! hoisting and folding into a [`GenerationContext`].

pub mod error;
pub mod fold;
pub mod lexer;
pub mod resolve;

pub use error::TemplateParseError;
pub use lexer::{Tokens, block_kind, tokenize};
pub use resolve::{Resolution, hoist_assertions, resolve};

use loadplan_types::{GenerationContext, Warning};

/// A parsed template. Data sets are not yet joined with their files.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub context: GenerationContext,
    pub warnings: Vec<Warning>,
}

/// Parses template text into a [`GenerationContext`].
///
/// Structural problems that can be worked around are reported as warnings;
/// anything else is a [`TemplateParseError`].
pub fn parse_template(src: &str) -> Result<ParsedTemplate, TemplateParseError> {
    let tokens = tokenize(src)?;
    let (resolution, resolve_warnings) = resolve(&tokens.components);
    let (attached, hoist_warnings) = hoist_assertions(&tokens.components, &resolution);
    let (context, fold_warnings) = fold::fold(&tokens.components, &resolution, &attached)?;

    let mut warnings = tokens.warnings;
    warnings.extend(resolve_warnings);
    warnings.extend(hoist_warnings);
    warnings.extend(fold_warnings);

    log::info!(
        "parsed template '{}': {} thread groups, {} requests, {} warnings",
        context.test_plan_name,
        context.thread_groups.len(),
        context.request_count(),
        warnings.len()
    );
    Ok(ParsedTemplate { context, warnings })
}
