//! Splitting and walking absolute paths.
//!
//! Mirrors `TFS_Path_Init`/`TFS_Path_TraverseSlice`: a path is a sequence of
//! non-empty components obtained by splitting on `/`, and is only valid if
//! the source string starts with `/`. The source reports both failure modes
//! (missing leading slash, too many components) as `TFS_ENOENT`; this crate
//! keeps that mapping rather than inventing a separate `InvalidPath` code.

use crate::consts::PATH_MAX_COMPONENTS;
use crate::block_device::BlockDevice;
use crate::error::{Result, TfsError};
use crate::inode::{Inode, InodeKind};
use crate::inode_store::InodeStore;
use std::io::{Read, Seek, Write};

/// An absolute path, split into its non-empty components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    components: Vec<String>,
}

impl Path {
    /// Parses an absolute path string. `/` yields a zero-component path.
    pub fn parse(s: &str) -> Result<Self> {
        if !s.starts_with('/') {
            return Err(TfsError::NotFound);
        }
        let components: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        if components.len() > PATH_MAX_COMPONENTS {
            return Err(TfsError::NotFound);
        }
        Ok(Self { components })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The final component, e.g. the name to create or the name being
    /// renamed to. `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// All but the final component — the parent directory's path.
    pub fn parent_components(&self) -> &[String] {
        if self.components.is_empty() {
            &[]
        } else {
            &self.components[..self.components.len() - 1]
        }
    }
}

/// Walks components `[begin, end)` of `path`, starting at `start`, and
/// returns the terminal inode. At each step the current inode must be a
/// directory; a missing entry or a non-directory mid-path both fail with
/// [`TfsError::NotFound`], matching `TFS_Path_TraverseSlice`.
pub fn traverse<S: Read + Write + Seek>(
    path: &Path,
    start: Inode,
    begin: usize,
    end: usize,
    store: &InodeStore,
    dev: &mut BlockDevice<S>,
) -> Result<Inode> {
    debug_assert!(begin <= end && end <= path.len());
    let mut inode = start;
    for component in &path.components()[begin..end] {
        let children = match &inode.kind {
            InodeKind::Directory { children } => children,
            _ => return Err(TfsError::NotFound),
        };
        let entry = children
            .iter()
            .find(|e| &e.name == component)
            .ok_or(TfsError::NotFound)?;
        inode = store.get(dev, entry.inode_idx)?;
    }
    Ok(inode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_components() {
        let p = Path::parse("/usr/lib/baka/bakalib.so.7").unwrap();
        assert_eq!(
            p.components(),
            &["usr", "lib", "baka", "bakalib.so.7"]
        );
    }

    #[test]
    fn root_is_empty() {
        let p = Path::parse("/").unwrap();
        assert_eq!(p.len(), 0);
        assert!(p.is_empty());
    }

    #[test]
    fn relative_rejected() {
        assert!(matches!(Path::parse("relative"), Err(TfsError::NotFound)));
    }

    #[test]
    fn too_many_components_rejected() {
        let long: String = (0..PATH_MAX_COMPONENTS + 1)
            .map(|i| format!("/{i}"))
            .collect();
        assert!(matches!(Path::parse(&long), Err(TfsError::NotFound)));
    }

    #[test]
    fn collapses_repeated_slashes() {
        let p = Path::parse("//a//b/").unwrap();
        assert_eq!(p.components(), &["a", "b"]);
    }
}
