use std::time::SystemTime;

use crate::path::ResourcePath;

/// A node of a box tree as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    File(ResourceFile),
    Directory(ResourceDir),
}

impl Record {
    #[inline(always)]
    pub fn as_file(&self) -> Option<&ResourceFile> {
        match self {
            Record::File(file) => Some(file),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_directory(&self) -> Option<&ResourceDir> {
        match self {
            Record::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &ResourcePath {
        match self {
            Record::File(file) => &file.path,
            Record::Directory(dir) => &dir.path,
        }
    }

    #[inline(always)]
    pub fn mod_time(&self) -> SystemTime {
        match self {
            Record::File(file) => file.mod_time,
            Record::Directory(dir) => dir.mod_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    /// The path of the file relative to the box root. Never the root itself.
    pub path: ResourcePath,

    /// Last modification time as reported by the filesystem.
    pub mod_time: SystemTime,

    /// The full contents of the file.
    pub content: Vec<u8>,
}

impl ResourceFile {
    #[inline(always)]
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDir {
    /// The path of the directory relative to the box root. Empty for the root.
    pub path: ResourcePath,

    /// Last modification time as reported by the filesystem.
    pub mod_time: SystemTime,

    /// Direct subdirectories, in the order the filesystem reported them.
    pub child_dirs: Vec<ResourcePath>,

    /// Direct child files. Not serialized; filled in by [`ResourceBox::link`](crate::ResourceBox::link).
    pub child_files: Vec<ResourcePath>,
}

impl ResourceDir {
    pub fn new(path: ResourcePath, mod_time: SystemTime) -> ResourceDir {
        ResourceDir {
            path,
            mod_time,
            child_dirs: vec![],
            child_files: vec![],
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }
}

/// How a box was embedded into the final binary.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EmbedKind {
    /// The box is a generated source file literal.
    Go,
    /// The box is a data symbol in a native object file.
    Syso,
    Unknown(u8),
}

/// Wire tag of a file record.
pub(crate) const RECORD_FILE: u8 = 0x0;
/// Wire tag of a directory record.
pub(crate) const RECORD_DIRECTORY: u8 = 0x1;

pub(crate) const EMBED_KIND_GO: u8 = 1;
pub(crate) const EMBED_KIND_SYSO: u8 = 2;

impl EmbedKind {
    pub fn id(self) -> u8 {
        match self {
            EmbedKind::Go => EMBED_KIND_GO,
            EmbedKind::Syso => EMBED_KIND_SYSO,
            EmbedKind::Unknown(id) => id,
        }
    }

    pub fn from_id(id: u8) -> EmbedKind {
        match id {
            EMBED_KIND_GO => EmbedKind::Go,
            EMBED_KIND_SYSO => EmbedKind::Syso,
            id => EmbedKind::Unknown(id),
        }
    }
}
