//! KCL output normalization.
//!
//! Quoted `-D` values can come back from KCL wrapped in triple single quotes
//! (`'''4'''`). This rewrites them to plain single-quoted scalars.

use std::sync::LazyLock;

use regex::Regex;

static TRIPLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'''([^']*)'''").expect("valid triple-quote regex"));

/// Replace every `'''value'''` span with `'value'`.
///
/// Purely textual. Unterminated spans are left as they are.
pub fn replace_triple_quotes(input: &str) -> String {
    TRIPLE_QUOTED.replace_all(input, "'$1'").into_owned()
}
