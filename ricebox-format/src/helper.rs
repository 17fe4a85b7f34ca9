//! Generating the Go source file that registers an embedded box at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use once_cell::sync::Lazy;

use crate::{
    header::{MAGIC_BYTES, VERSION},
    names::{begin_symbol, end_symbol},
    record::{RECORD_DIRECTORY, RECORD_FILE},
};

/// Extension of the generated helper source files.
pub const HELPER_EXTENSION: &str = "rice-box.go";

const HELPER_TEMPLATE: &str = "embedded-syso-helper.go";

static HANDLEBARS: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string(
            HELPER_TEMPLATE,
            include_str!("templates/embedded-syso-helper.go.hbs"),
        )
        .unwrap();
    handlebars
});

#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("Rendering helper source failed. Symbol: '{1}'")]
    Render(#[source] handlebars::RenderError, String),

    #[error("Writing helper source failed. Path: '{}'", .1.display())]
    Write(#[source] std::io::Error, PathBuf),
}

/// `<box_filename>.rice-box.go`
pub fn helper_filename(box_filename: &str) -> String {
    format!("{}.{}", box_filename, HELPER_EXTENSION)
}

/// Contents of a Go interpreted string literal holding `bytes`, without quotes.
fn go_string_contents(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| match *b {
            b'"' | b'\\' => format!("\\{}", *b as char),
            0x20..=0x7e => (*b as char).to_string(),
            _ => format!("\\x{:02x}", b),
        })
        .collect()
}

/// Render the helper source for the box whose symbols use `stem`.
///
/// At startup the generated code reads the bytes between `_bricebox_<stem>`
/// and `_ericebox_<stem>`, decodes them with a blob decoder emitted into the
/// same file, links the box, and registers it by name. A decoding failure
/// panics.
pub fn render(package: &str, stem: &str) -> Result<String, HelperError> {
    let mut data = BTreeMap::new();
    data.insert("package", package.to_string());
    data.insert("symbol", stem.to_string());
    data.insert("begin_symbol", begin_symbol(stem));
    data.insert("end_symbol", end_symbol(stem));
    data.insert("magic", go_string_contents(MAGIC_BYTES));
    data.insert("version", VERSION.to_string());
    data.insert("file_tag", RECORD_FILE.to_string());
    data.insert("dir_tag", RECORD_DIRECTORY.to_string());

    HANDLEBARS
        .render(HELPER_TEMPLATE, &data)
        .map_err(|e| HelperError::Render(e, stem.to_string()))
}

pub fn emit<P: AsRef<Path>>(package: &str, stem: &str, output: P) -> Result<(), HelperError> {
    let output = output.as_ref();
    let source = render(package, stem)?;
    std::fs::write(output, source).map_err(|e| HelperError::Write(e, output.to_path_buf()))?;
    tracing::debug!(path = %output.display(), package, symbol = stem, "wrote helper source");
    Ok(())
}
