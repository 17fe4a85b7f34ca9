//! Finding the package name and the boxes a Go package looks up.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use ricebox_format::helper::HELPER_EXTENSION;

use crate::error::{Error, Result};

static PACKAGE_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());

// Interpreted ("...") or raw (`...`) string literal argument.
static FIND_BOX_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"rice\.(?:Must)?FindBox\(\s*(?:"((?:[^"\\\n]|\\.)*)"|`([^`]*)`)\s*\)"#).unwrap()
});

/// What a scan of a package directory found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scan {
    /// Name from the first package clause, if any file had one.
    pub name: Option<String>,

    pub box_names: BTreeSet<String>,

    /// The `.go` files that were read.
    pub files: Vec<PathBuf>,
}

fn is_source_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|x| x.to_str()) {
        Some(name) => name,
        None => return false,
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.ends_with(&format!(".{}", HELPER_EXTENSION))
}

/// Take `n` digits of `radix` from `chars`.
fn take_digits<I: Iterator<Item = char>>(chars: &mut I, n: usize, radix: u32) -> Option<u32> {
    let digits = chars.take(n).collect::<String>();
    if digits.chars().count() != n || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(&digits, radix).ok()
}

/// Decode the body of a Go interpreted string literal.
///
/// `None` when an escape is malformed or the result is not valid UTF-8.
fn unquote(literal: &str) -> Option<String> {
    let mut out = Vec::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
            continue;
        }
        match chars.next()? {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '"' => out.push(b'"'),
            'x' => out.push(take_digits(&mut chars, 2, 16)? as u8),
            'u' => {
                let c = char::from_u32(take_digits(&mut chars, 4, 16)?)?;
                out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
            }
            'U' => {
                let c = char::from_u32(take_digits(&mut chars, 8, 16)?)?;
                out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
            }
            first @ '0'..='7' => {
                let rest = take_digits(&mut chars, 2, 8)?;
                let value = (first as u32 - '0' as u32) * 64 + rest;
                out.push(u8::try_from(value).ok()?);
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

/// Collect package name and box names from Go source text.
fn scan_source(source: &str, scan: &mut Scan) {
    if scan.name.is_none() {
        scan.name = PACKAGE_CLAUSE
            .captures(source)
            .map(|x| x[1].to_string());
    }

    for captures in FIND_BOX_CALL.captures_iter(source) {
        let name = match (captures.get(1), captures.get(2)) {
            (Some(quoted), _) => match unquote(quoted.as_str()) {
                Some(name) => name,
                None => {
                    tracing::debug!(
                        literal = quoted.as_str(),
                        "skipped box name with invalid escape"
                    );
                    continue;
                }
            },
            (None, Some(raw)) => raw.as_str().to_string(),
            (None, None) => continue,
        };
        tracing::debug!(name = %name, "found box");
        scan.box_names.insert(name);
    }
}

/// Scan the `.go` files directly inside `dir`, skipping tests and generated helpers.
pub fn scan(dir: &Path) -> Result<Scan> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| Error::ReadPackageDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = vec![];
    for entry in read_dir {
        let entry = entry.map_err(|source| Error::ReadPackageDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_source_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut scan = Scan::default();
    for path in files.iter() {
        let source = std::fs::read_to_string(path).map_err(|source| Error::ReadSource {
            path: path.clone(),
            source,
        })?;
        scan_source(&source, &mut scan);
    }
    scan.files = files;

    tracing::debug!(
        dir = %dir.display(),
        files = scan.files.len(),
        boxes = scan.box_names.len(),
        "scanned package"
    );

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_package_and_boxes() {
        let mut scan = Scan::default();
        scan_source(
            r#"// Package main serves files.
package main

import rice "github.com/GeertJohan/go.rice"

func main() {
	a := rice.MustFindBox("my.assets/v2")
	b, _ := rice.FindBox( "../shared" )
	c := rice.MustFindBox(`raw\name`)
	d := rice.MustFindBox("quote\"d")
	e := rice.FindBox(name)
}
"#,
            &mut scan,
        );

        assert_eq!(scan.name.as_deref(), Some("main"));
        assert_eq!(
            scan.box_names.iter().map(|x| x.as_str()).collect::<Vec<_>>(),
            vec!["../shared", "my.assets/v2", "quote\"d", "raw\\name"]
        );
    }

    #[test]
    fn unquotes_go_escapes() {
        assert_eq!(unquote(r"\x41ssets").as_deref(), Some("Assets"));
        assert_eq!(unquote(r"caf\u00e9").as_deref(), Some("café"));
        assert_eq!(unquote(r"\U0001F600").as_deref(), Some("\u{1F600}"));
        assert_eq!(unquote(r"\101\142c").as_deref(), Some("Abc"));
        assert_eq!(unquote(r"caf\xc3\xa9").as_deref(), Some("café"));
        assert_eq!(unquote(r"tab\there").as_deref(), Some("tab\there"));

        assert_eq!(unquote(r"\q"), None);
        assert_eq!(unquote(r"\x4"), None);
        assert_eq!(unquote(r"\x+1"), None);
        assert_eq!(unquote(r"\400"), None);
        assert_eq!(unquote(r"\xff"), None);
        assert_eq!(unquote(r"\uD800"), None);
        assert_eq!(unquote("trailing\\"), None);
    }

    #[test]
    fn skips_names_with_invalid_escapes() {
        let mut scan = Scan::default();
        scan_source(
            r#"package main
var a = rice.MustFindBox("\x61ssets")
var b = rice.MustFindBox("bad\q")
"#,
            &mut scan,
        );
        assert_eq!(
            scan.box_names.into_iter().collect::<Vec<_>>(),
            vec!["assets".to_string()]
        );
    }

    #[test]
    fn first_package_clause_wins() {
        let mut scan = Scan::default();
        scan_source("package alpha\n", &mut scan);
        scan_source("package beta\n", &mut scan);
        assert_eq!(scan.name.as_deref(), Some("alpha"));
    }

    #[test]
    fn skips_tests_and_generated_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(
            dir.join("main.go"),
            "package webapp\nvar b = rice.MustFindBox(\"assets\")\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("main_test.go"),
            "package webapp\nvar b = rice.MustFindBox(\"fixtures\")\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("assets.rice-box.go"),
            "package webapp\nvar b = rice.MustFindBox(\"generated\")\n",
        )
        .unwrap();
        std::fs::write(dir.join("notes.txt"), "rice.MustFindBox(\"notes\")").unwrap();

        let scan = scan(dir).unwrap();
        assert_eq!(scan.name.as_deref(), Some("webapp"));
        assert_eq!(scan.files, vec![dir.join("main.go")]);
        assert_eq!(
            scan.box_names.into_iter().collect::<Vec<_>>(),
            vec!["assets".to_string()]
        );
    }

    #[test]
    fn missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            scan(&temp_dir.path().join("nope")),
            Err(Error::ReadPackageDir { .. })
        ));
    }
}
