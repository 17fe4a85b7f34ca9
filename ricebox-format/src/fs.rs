//! Building a [`ResourceBox`] from a directory on disk.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::{
    path::{IntoResourcePathError, ResourcePath},
    resource::LinkError,
    ResourceBox, ResourceDir, ResourceFile,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Box root is not a directory. Path: '{}'", .0.display())]
    NotADirectory(PathBuf),

    #[error("Walking box directory failed. Path: '{}'", .1.display())]
    Walk(#[source] walkdir::Error, PathBuf),

    #[error("Reading metadata failed. Path: '{}'", .1.display())]
    Metadata(#[source] std::io::Error, PathBuf),

    #[error("Reading file failed. Path: '{}'", .1.display())]
    Read(#[source] std::io::Error, PathBuf),

    #[error("Could not convert to a valid box path. Path: '{}'", .1.display())]
    InvalidPath(#[source] IntoResourcePathError, PathBuf),

    #[error("Inconsistent box tree. Path: '{}'", .1.display())]
    Tree(#[source] LinkError, PathBuf),
}

/// Walks a directory into a [`ResourceBox`].
///
/// The walk is depth-first and pre-order, so every directory is inserted before
/// anything inside it. Entries are not sorted: a directory's `child_dirs` keep
/// the order the filesystem reported them in.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    name: String,
    root: PathBuf,
    created_at: Option<SystemTime>,
    follow_links: bool,
}

impl TreeBuilder {
    pub fn new<S: Into<String>, P: AsRef<Path>>(name: S, root: P) -> TreeBuilder {
        TreeBuilder {
            name: name.into(),
            root: root.as_ref().to_path_buf(),
            created_at: None,
            follow_links: true,
        }
    }

    /// Use a fixed creation time instead of the current time.
    pub fn created_at(mut self, time: SystemTime) -> TreeBuilder {
        self.created_at = Some(time);
        self
    }

    /// Whether symbolic links are followed. Defaults to `true`.
    ///
    /// When disabled, links are not descended into: a link to a file is stored
    /// as a file with the target's content, a link to a directory is skipped,
    /// and a dangling link fails with [`BuildError::Read`].
    pub fn follow_links(mut self, follow: bool) -> TreeBuilder {
        self.follow_links = follow;
        self
    }

    pub fn build(self) -> Result<ResourceBox, BuildError> {
        let root = self.root.as_path();
        let root_meta =
            std::fs::metadata(root).map_err(|e| BuildError::Metadata(e, root.to_path_buf()))?;
        if !root_meta.is_dir() {
            return Err(BuildError::NotADirectory(root.to_path_buf()));
        }

        let created_at = self.created_at.unwrap_or_else(SystemTime::now);
        let mut rbox = ResourceBox::new(self.name.clone(), created_at);

        for entry in WalkDir::new(root).follow_links(self.follow_links) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                BuildError::Walk(e, path)
            })?;
            let fs_path = entry.path();

            let path = ResourcePath::from_fs(root, fs_path)
                .map_err(|e| BuildError::InvalidPath(e, fs_path.to_path_buf()))?;
            let meta = entry
                .metadata()
                .map_err(|e| BuildError::Walk(e, fs_path.to_path_buf()))?;
            let mod_time = meta
                .modified()
                .map_err(|e| BuildError::Metadata(e, fs_path.to_path_buf()))?;

            if entry.file_type().is_dir() {
                tracing::debug!(path = %path, "includes dir");
                rbox.insert_dir(ResourceDir::new(path, mod_time))
                    .map_err(|e| BuildError::Tree(e, fs_path.to_path_buf()))?;
            } else if entry.path_is_symlink() && fs_path.is_dir() {
                tracing::debug!(path = %path, "skipped directory link");
            } else {
                let content = std::fs::read(fs_path)
                    .map_err(|e| BuildError::Read(e, fs_path.to_path_buf()))?;
                tracing::debug!(path = %path, bytes = content.len(), "includes file");
                rbox.insert_file(ResourceFile {
                    path,
                    mod_time,
                    content,
                })
                .map_err(|e| BuildError::Tree(e, fs_path.to_path_buf()))?;
            }
        }

        rbox.link()
            .map_err(|e| BuildError::Tree(e, root.to_path_buf()))?;

        tracing::info!(
            name = %rbox.name,
            dirs = rbox.dirs.len(),
            files = rbox.files.len(),
            bytes = rbox.content_len(),
            "built box"
        );

        Ok(rbox)
    }
}

/// Build the box `name` from the directory at `root`, stamped with the current time.
pub fn build<S: Into<String>, P: AsRef<Path>>(name: S, root: P) -> Result<ResourceBox, BuildError> {
    TreeBuilder::new(name, root).build()
}
