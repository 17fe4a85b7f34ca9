use std::{
    borrow::Borrow,
    fmt,
    path::{Component, Path, PathBuf},
};

mod error;

pub use self::error::IntoResourcePathError;

/// The separator used in `ResourcePath` type paths, regardless of platform.
pub const PATH_RESOURCE_SEP: &str = "/";

/// A path relative to the root of a box.
///
/// Segments are always delimited by `/`, there is never a leading or trailing
/// separator, and no segment is empty, `.` or `..`. The empty path is the root
/// directory of the box.
#[derive(Debug, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ResourcePath(pub(crate) String);

impl ResourcePath {
    pub fn root() -> ResourcePath {
        ResourcePath(String::new())
    }

    pub fn new<S: AsRef<str>>(path: S) -> Result<ResourcePath, IntoResourcePathError> {
        let path = path.as_ref();
        if path.is_empty() {
            return Ok(ResourcePath::root());
        }

        if path
            .split(PATH_RESOURCE_SEP)
            .any(|x| x.is_empty() || x == "." || x == "..")
        {
            return Err(IntoResourcePathError::InvalidSegment);
        }

        Ok(ResourcePath(path.to_string()))
    }

    /// Derive the box-relative path of `path`, an entry found while walking `root`.
    ///
    /// Platform separators are normalised to `/`, and `root` itself yields the root path.
    pub fn from_fs<R: AsRef<Path>, P: AsRef<Path>>(
        root: R,
        path: P,
    ) -> Result<ResourcePath, IntoResourcePathError> {
        let relative = path
            .as_ref()
            .strip_prefix(root.as_ref())
            .map_err(|_| IntoResourcePathError::NotUnderRoot)?;

        let mut out = vec![];
        for component in relative.components() {
            match component {
                Component::Normal(os_str) => {
                    out.push(
                        os_str
                            .to_str()
                            .ok_or(IntoResourcePathError::UnrepresentableStr)?,
                    );
                }
                Component::CurDir => {}
                _ => return Err(IntoResourcePathError::InvalidSegment),
            }
        }

        Ok(ResourcePath(out.join(PATH_RESOURCE_SEP)))
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The containing directory. Top-level entries have the root as parent; the root has none.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind(PATH_RESOURCE_SEP) {
            Some(idx) => Some(ResourcePath(self.0[..idx].to_string())),
            None => Some(ResourcePath::root()),
        }
    }

    pub fn filename(&self) -> &str {
        match self.0.rfind(PATH_RESOURCE_SEP) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    /// All strict prefixes of this path, starting with the root.
    pub fn ancestors(&self) -> Vec<ResourcePath> {
        let mut out = vec![];
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            out.push(path);
        }
        out.reverse();
        out
    }

    pub fn join<S: AsRef<str>>(&self, tail: S) -> Result<ResourcePath, IntoResourcePathError> {
        if self.is_root() {
            return Self::new(tail);
        }
        Self::new(format!("{}{}{}", self.0, PATH_RESOURCE_SEP, tail.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_RESOURCE_SEP).filter(|x| !x.is_empty())
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.iter().collect()
    }
}

impl Borrow<str> for ResourcePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent() {
        let root = ResourcePath::new("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.depth(), 0);
        assert!(root.ancestors().is_empty());
    }

    #[test]
    fn parent_of_top_level_is_root() {
        let path = ResourcePath::new("hello.txt").unwrap();
        assert_eq!(path.parent(), Some(ResourcePath::root()));
        assert_eq!(path.filename(), "hello.txt");
    }

    #[test]
    fn nested_parents_and_ancestors() {
        let path = ResourcePath::new("a/b/c.txt").unwrap();
        assert_eq!(path.parent().unwrap().as_str(), "a/b");
        assert_eq!(path.filename(), "c.txt");
        assert_eq!(path.depth(), 3);

        let ancestors = path
            .ancestors()
            .into_iter()
            .map(|x| x.0)
            .collect::<Vec<_>>();
        assert_eq!(ancestors, vec!["", "a", "a/b"]);
    }

    #[test]
    fn rejects_bad_segments() {
        assert_eq!(
            ResourcePath::new("/leading"),
            Err(IntoResourcePathError::InvalidSegment)
        );
        assert_eq!(
            ResourcePath::new("a//b"),
            Err(IntoResourcePathError::InvalidSegment)
        );
        assert_eq!(
            ResourcePath::new("a/../b"),
            Err(IntoResourcePathError::InvalidSegment)
        );
        assert_eq!(
            ResourcePath::new("trailing/"),
            Err(IntoResourcePathError::InvalidSegment)
        );
    }

    #[test]
    fn from_fs_strips_root() {
        let root = Path::new("pkg").join("assets");
        assert!(ResourcePath::from_fs(&root, &root).unwrap().is_root());

        let nested = root.join("a").join("b").join("c.txt");
        assert_eq!(
            ResourcePath::from_fs(&root, &nested).unwrap().as_str(),
            "a/b/c.txt"
        );

        assert_eq!(
            ResourcePath::from_fs(&root, Path::new("elsewhere")),
            Err(IntoResourcePathError::NotUnderRoot)
        );
    }

    #[test]
    fn join_from_root() {
        let root = ResourcePath::root();
        let a = root.join("a").unwrap();
        assert_eq!(a.as_str(), "a");
        assert_eq!(a.join("b").unwrap().as_str(), "a/b");
        assert_eq!(a.to_path_buf(), PathBuf::from("a"));
    }
}
