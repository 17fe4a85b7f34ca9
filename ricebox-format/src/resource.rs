use std::collections::{BTreeMap, HashSet};
use std::time::SystemTime;

use crate::{
    path::ResourcePath,
    record::{EmbedKind, Record, ResourceDir, ResourceFile},
};

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Box has no root directory.")]
    MissingRoot,

    #[error("Parent directory is missing. Path: '{0}'")]
    MissingParent(ResourcePath),

    #[error("Path is already present in the box. Path: '{0}'")]
    DuplicatePath(ResourcePath),

    #[error("Directory '{0}' links to unknown child directory '{1}'")]
    UnknownChild(ResourcePath, ResourcePath),

    #[error("Directory '{0}' links to child directory '{1}' more than once")]
    DuplicateChild(ResourcePath, ResourcePath),

    #[error("Directory '{0}' links to '{1}', which is not a direct child")]
    MisplacedChild(ResourcePath, ResourcePath),

    #[error("Directory is not linked from its parent. Path: '{0}'")]
    UnlistedDir(ResourcePath),
}

/// A named directory tree, ready to be serialized or looked up at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBox {
    /// The name the program uses to find this box.
    pub name: String,

    /// When the box was built.
    pub created_at: SystemTime,

    pub embed_kind: EmbedKind,

    pub files: BTreeMap<ResourcePath, ResourceFile>,

    /// Keyed by path; the root directory has the empty path.
    pub dirs: BTreeMap<ResourcePath, ResourceDir>,
}

impl ResourceBox {
    /// An empty box with no root directory yet.
    pub fn new<S: Into<String>>(name: S, created_at: SystemTime) -> ResourceBox {
        ResourceBox {
            name: name.into(),
            created_at,
            embed_kind: EmbedKind::Syso,
            files: BTreeMap::new(),
            dirs: BTreeMap::new(),
        }
    }

    /// Insert a directory and append it to its parent's child links.
    pub fn insert_dir(&mut self, dir: ResourceDir) -> Result<(), LinkError> {
        let path = dir.path.clone();
        if self.dirs.contains_key(&path) || self.files.contains_key(&path) {
            return Err(LinkError::DuplicatePath(path));
        }

        if let Some(parent_path) = path.parent() {
            let parent = self
                .dirs
                .get_mut(&parent_path)
                .ok_or_else(|| LinkError::MissingParent(path.clone()))?;
            parent.child_dirs.push(path.clone());
        }

        tracing::debug!(path = %path, "inserted dir");
        self.dirs.insert(path, dir);
        Ok(())
    }

    pub fn insert_file(&mut self, file: ResourceFile) -> Result<(), LinkError> {
        let path = file.path.clone();
        if path.is_root() || self.dirs.contains_key(&path) || self.files.contains_key(&path) {
            return Err(LinkError::DuplicatePath(path));
        }

        let parent_path = path.parent().unwrap_or_default();
        if !self.dirs.contains_key(&parent_path) {
            return Err(LinkError::MissingParent(path));
        }

        tracing::debug!(path = %path, bytes = file.len(), "inserted file");
        self.files.insert(path, file);
        Ok(())
    }

    #[inline(always)]
    pub fn root(&self) -> Option<&ResourceDir> {
        self.dirs.get("")
    }

    #[inline(always)]
    pub fn file(&self, path: &str) -> Option<&ResourceFile> {
        self.files.get(path)
    }

    #[inline(always)]
    pub fn dir(&self, path: &str) -> Option<&ResourceDir> {
        self.dirs.get(path)
    }

    /// The directory containing `path`, if there is one.
    pub fn parent(&self, path: &ResourcePath) -> Option<&ResourceDir> {
        path.parent().and_then(|x| self.dirs.get(&x))
    }

    pub fn child_dirs<'a>(&'a self, dir: &'a ResourceDir) -> impl Iterator<Item = &'a ResourceDir> {
        dir.child_dirs.iter().filter_map(move |x| self.dirs.get(x))
    }

    /// Only populated once the box has been linked.
    pub fn child_files<'a>(
        &'a self,
        dir: &'a ResourceDir,
    ) -> impl Iterator<Item = &'a ResourceFile> {
        dir.child_files.iter().filter_map(move |x| self.files.get(x))
    }

    /// Every node as a wire record: directories first, then files, each sorted by path.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.dirs
            .values()
            .cloned()
            .map(Record::Directory)
            .chain(self.files.values().cloned().map(Record::File))
    }

    /// Total size of all file contents in bytes.
    pub fn content_len(&self) -> u64 {
        self.files.values().map(|x| x.len()).sum()
    }

    /// Check the tree structure and rebuild the links that are not serialized.
    ///
    /// After linking, every directory's `child_files` lists the files directly
    /// inside it, sorted by path.
    pub fn link(&mut self) -> Result<(), LinkError> {
        if self.root().is_none() {
            return Err(LinkError::MissingRoot);
        }

        if let Some(path) = self.files.keys().find(|x| self.dirs.contains_key(*x)) {
            return Err(LinkError::DuplicatePath(path.clone()));
        }

        for dir in self.dirs.values() {
            let mut seen = HashSet::with_capacity(dir.child_dirs.len());
            for child in dir.child_dirs.iter() {
                if !self.dirs.contains_key(child) {
                    return Err(LinkError::UnknownChild(dir.path.clone(), child.clone()));
                }
                if child.parent().as_ref() != Some(&dir.path) {
                    return Err(LinkError::MisplacedChild(dir.path.clone(), child.clone()));
                }
                if !seen.insert(child) {
                    return Err(LinkError::DuplicateChild(dir.path.clone(), child.clone()));
                }
            }

            if let Some(parent_path) = dir.path.parent() {
                let parent = self
                    .dirs
                    .get(&parent_path)
                    .ok_or_else(|| LinkError::MissingParent(dir.path.clone()))?;
                if !parent.child_dirs.contains(&dir.path) {
                    return Err(LinkError::UnlistedDir(dir.path.clone()));
                }
            }
        }

        for dir in self.dirs.values_mut() {
            dir.child_files.clear();
        }

        for path in self.files.keys() {
            let parent_path = path.parent().unwrap_or_default();
            let parent = self
                .dirs
                .get_mut(&parent_path)
                .ok_or_else(|| LinkError::MissingParent(path.clone()))?;
            parent.child_files.push(path.clone());
        }

        tracing::debug!(
            name = %self.name,
            dirs = self.dirs.len(),
            files = self.files.len(),
            "linked box"
        );

        Ok(())
    }
}
