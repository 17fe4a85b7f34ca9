//! Deriving symbol and file names from box names.

use once_cell::sync::Lazy;
use regex::Regex;

static SYMBOL_REPLACER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

/// Prefix of the symbol marking the first byte of a blob.
pub const BEGIN_SYMBOL_PREFIX: &str = "_bricebox_";

/// Prefix of the symbol marking one past the end of a blob and its padding.
pub const END_SYMBOL_PREFIX: &str = "_ericebox_";

/// The identifier used to name a box's symbols.
///
/// Every character outside `[a-z0-9_]` becomes `_`. Uppercase letters are not
/// folded, so `Foo` becomes `_oo`.
pub fn symbol_stem(box_name: &str) -> String {
    SYMBOL_REPLACER.replace_all(box_name, "_").into_owned()
}

pub fn begin_symbol(stem: &str) -> String {
    format!("{}{}", BEGIN_SYMBOL_PREFIX, stem)
}

pub fn end_symbol(stem: &str) -> String {
    format!("{}{}", END_SYMBOL_PREFIX, stem)
}

/// A single path segment derived from a box name, used to name generated files.
///
/// `..` is replaced with `back` first, then `/` with `-`.
pub fn box_filename(box_name: &str) -> String {
    box_name.replace("..", "back").replace('/', "-")
}
