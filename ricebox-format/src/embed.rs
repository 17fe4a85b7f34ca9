//! Embedding every box of a package as COFF objects plus a helper source file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{
    coff::{self, Arch, EmitError},
    fs::{BuildError, TreeBuilder},
    helper::{self, HelperError},
    names::{box_filename, symbol_stem},
    ser::EncodeError,
};

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Building box '{1}' failed.")]
    Build(#[source] BuildError, String),

    #[error("Encoding box '{1}' failed.")]
    Encode(#[source] EncodeError, String),

    #[error("Emitting object for box '{1}' failed.")]
    Emit(#[source] EmitError, String),

    #[error("Emitting helper source for box '{1}' failed.")]
    Helper(#[source] HelperError, String),
}

/// A Go package and the boxes it looks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Directory holding the package sources. Box names are relative to it.
    pub dir: PathBuf,

    /// The package identifier, written verbatim into the helper source.
    pub name: String,

    pub box_names: BTreeSet<String>,
}

impl Package {
    pub fn new<P: AsRef<Path>, S: Into<String>>(dir: P, name: S) -> Package {
        Package {
            dir: dir.as_ref().to_path_buf(),
            name: name.into(),
            box_names: BTreeSet::new(),
        }
    }

    pub fn with_box<S: Into<String>>(mut self, box_name: S) -> Package {
        self.box_names.insert(box_name.into());
        self
    }
}

/// The files written for one box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedBox {
    pub name: String,
    pub symbol: String,
    pub objects: Vec<(Arch, PathBuf)>,
    pub helper: PathBuf,
    pub blob_len: usize,
}

/// The directory a box is built from.
///
/// The name is joined one segment at a time, so a leading `/` stays inside the
/// package directory and `..` segments are kept.
pub fn box_root(package_dir: &Path, box_name: &str) -> PathBuf {
    box_name
        .split('/')
        .filter(|x| !x.is_empty() && *x != ".")
        .fold(package_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Embed a single box of `package`.
///
/// The box is built from [`box_root`], encoded once, and written
/// as one object per [`Arch::ALL`] entry followed by the helper source.
pub fn embed_box(
    package: &Package,
    box_name: &str,
    created_at: Option<SystemTime>,
) -> Result<EmbeddedBox, EmbedError> {
    let filename = box_filename(box_name);
    let symbol = symbol_stem(box_name);

    let mut builder = TreeBuilder::new(box_name, box_root(&package.dir, box_name));
    if let Some(created_at) = created_at {
        builder = builder.created_at(created_at);
    }
    let rbox = builder
        .build()
        .map_err(|e| EmbedError::Build(e, box_name.to_string()))?;

    let blob = crate::encode(&rbox).map_err(|e| EmbedError::Encode(e, box_name.to_string()))?;

    let mut objects = Vec::with_capacity(Arch::ALL.len());
    for arch in Arch::ALL {
        let path = package.dir.join(arch.syso_filename(&filename));
        coff::emit(&blob, &symbol, arch)
            .and_then(|obj| obj.write_file(&path))
            .map_err(|e| EmbedError::Emit(e, box_name.to_string()))?;
        objects.push((arch, path));
    }

    let helper_path = package.dir.join(helper::helper_filename(&filename));
    helper::emit(&package.name, &symbol, &helper_path)
        .map_err(|e| EmbedError::Helper(e, box_name.to_string()))?;

    tracing::info!(
        name = box_name,
        symbol = %symbol,
        blob = blob.len(),
        helper = %helper_path.display(),
        "embedded box"
    );

    Ok(EmbeddedBox {
        name: box_name.to_string(),
        symbol,
        objects,
        helper: helper_path,
        blob_len: blob.len(),
    })
}

/// Embed every box of `package` in name order, stopping at the first failure.
///
/// Returns an empty list when the package uses no boxes; nothing is written in
/// that case.
pub fn embed_package(
    package: &Package,
    created_at: Option<SystemTime>,
) -> Result<Vec<EmbeddedBox>, EmbedError> {
    package
        .box_names
        .iter()
        .map(|name| embed_box(package, name, created_at))
        .collect()
}
