use crate::path::child_name;
use crate::{FileSink, MAX_FILES, MAX_NODES, PathError, RamPath};
use log::{debug, warn};

/// Why the store refused an operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RamFsError {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("file has no contents")]
    Empty,
    #[error("file of {0} bytes exceeds the 4 GiB size limit")]
    TooLarge(usize),
    #[error("table is full")]
    TableFull,
    #[error("path already exists")]
    AlreadyExists,
    #[error("no such file")]
    NotFound,
    #[error("size {size} exceeds the {available} bytes backing the file")]
    SizeExceedsData { size: usize, available: usize },
}

/// A file in the store.
#[derive(Debug, Copy, Clone)]
pub struct FileEntry<'a> {
    pub path: RamPath,
    data: &'a [u8],
    size: u32,
}

impl<'a> FileEntry<'a> {
    /// The file's visible contents.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        &self.data[..self.size as usize]
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }
}

/// Kind of a directory-table node.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeType {
    Directory,
    BlockDevice,
    CharDevice,
}

/// A directory or device node.
#[derive(Debug, Copy, Clone)]
pub struct NodeEntry {
    pub path: RamPath,
    pub node_type: NodeType,
    pub major: u32,
    pub minor: u32,
}

/// Fixed-capacity file store borrowing file contents for `'a`.
pub struct RamFs<'a, const FILES: usize = MAX_FILES, const NODES: usize = MAX_NODES> {
    files: [Option<FileEntry<'a>>; FILES],
    nodes: [Option<NodeEntry>; NODES],
}

impl<const FILES: usize, const NODES: usize> Default for RamFs<'_, FILES, NODES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const FILES: usize, const NODES: usize> RamFs<'a, FILES, NODES> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            files: [const { None }; FILES],
            nodes: [const { None }; NODES],
        }
    }

    fn find(&self, path: &str) -> Option<usize> {
        self.files
            .iter()
            .position(|f| f.as_ref().is_some_and(|f| f.path == *path))
    }

    fn find_mut(&mut self, path: &str) -> Result<&mut FileEntry<'a>, RamFsError> {
        self.files
            .iter_mut()
            .flatten()
            .find(|f| f.path == *path)
            .ok_or(RamFsError::NotFound)
    }

    /// Register `data` under `path`.
    ///
    /// Duplicate paths are refused; the existing entry is left untouched.
    ///
    /// # Errors
    /// [`RamFsError::InvalidPath`], [`RamFsError::Empty`], [`RamFsError::TooLarge`],
    /// [`RamFsError::TableFull`] or [`RamFsError::AlreadyExists`].
    pub fn add(&mut self, path: &str, data: &'a [u8]) -> Result<(), RamFsError> {
        let result = self.try_add(path, data);
        match result {
            Ok(()) => debug!("ramfs: added {path} ({} bytes)", data.len()),
            Err(e) => warn!("ramfs: cannot add {path}: {e}"),
        }
        result
    }

    fn try_add(&mut self, path: &str, data: &'a [u8]) -> Result<(), RamFsError> {
        let path = RamPath::new(path)?;
        if data.is_empty() {
            return Err(RamFsError::Empty);
        }
        let size = u32::try_from(data.len()).map_err(|_| RamFsError::TooLarge(data.len()))?;
        if self.find(path.as_str()).is_some() {
            return Err(RamFsError::AlreadyExists);
        }
        let slot = self
            .files
            .iter_mut()
            .find(|f| f.is_none())
            .ok_or(RamFsError::TableFull)?;
        *slot = Some(FileEntry { path, data, size });
        Ok(())
    }

    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Contents of the file at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&'a [u8]> {
        self.find(path)
            .and_then(|i| self.files[i].as_ref())
            .map(FileEntry::data)
    }

    /// Shrink or grow the visible size of a file within its backing data.
    ///
    /// # Errors
    /// [`RamFsError::NotFound`] or [`RamFsError::SizeExceedsData`].
    pub fn set_size(&mut self, path: &str, size: usize) -> Result<(), RamFsError> {
        let entry = self.find_mut(path)?;
        if size > entry.data.len() {
            return Err(RamFsError::SizeExceedsData {
                size,
                available: entry.data.len(),
            });
        }
        // Backing data was at most u32::MAX bytes when added or set.
        entry.size = u32::try_from(size).map_err(|_| RamFsError::TooLarge(size))?;
        Ok(())
    }

    /// Point an existing file at new contents.
    ///
    /// # Errors
    /// [`RamFsError::NotFound`] or [`RamFsError::TooLarge`].
    pub fn set_data(&mut self, path: &str, data: &'a [u8]) -> Result<(), RamFsError> {
        let size = u32::try_from(data.len()).map_err(|_| RamFsError::TooLarge(data.len()))?;
        let entry = self.find_mut(path)?;
        entry.data = data;
        entry.size = size;
        Ok(())
    }

    /// Number of files in the store.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.iter().flatten().count()
    }

    /// The `index`-th file in insertion order.
    #[must_use]
    pub fn file_at(&self, index: usize) -> Option<&FileEntry<'a>> {
        self.files.iter().flatten().nth(index)
    }

    /// All files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry<'a>> {
        self.files.iter().flatten()
    }

    /// All directory and device nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntry> {
        self.nodes.iter().flatten()
    }

    fn push_node(&mut self, node: NodeEntry) -> Result<(), RamFsError> {
        let slot = self
            .nodes
            .iter_mut()
            .find(|n| n.is_none())
            .ok_or(RamFsError::TableFull)?;
        *slot = Some(node);
        Ok(())
    }

    /// Create a directory. Creating an existing directory succeeds.
    ///
    /// # Errors
    /// [`RamFsError::InvalidPath`], [`RamFsError::TableFull`], or
    /// [`RamFsError::AlreadyExists`] if a file occupies the path.
    pub fn mkdir(&mut self, path: &str) -> Result<(), RamFsError> {
        let path = RamPath::new(path)?;
        if self.dir_exists(path.as_str()) {
            return Ok(());
        }
        if self.exists(path.as_str()) {
            warn!("ramfs: mkdir {path}: a file has that name");
            return Err(RamFsError::AlreadyExists);
        }
        self.push_node(NodeEntry {
            path,
            node_type: NodeType::Directory,
            major: 0,
            minor: 0,
        })
        .inspect_err(|e| warn!("ramfs: mkdir {path}: {e}"))
    }

    /// Append a node. Existing nodes at `path` are not checked.
    ///
    /// # Errors
    /// [`RamFsError::InvalidPath`] or [`RamFsError::TableFull`].
    pub fn mknod(
        &mut self,
        path: &str,
        node_type: NodeType,
        major: u32,
        minor: u32,
    ) -> Result<(), RamFsError> {
        let path = RamPath::new(path)?;
        self.push_node(NodeEntry {
            path,
            node_type,
            major,
            minor,
        })
        .inspect_err(|e| warn!("ramfs: mknod {path}: {e}"))
    }

    #[must_use]
    pub fn dir_exists(&self, path: &str) -> bool {
        self.node(path)
            .is_some_and(|n| n.node_type == NodeType::Directory)
    }

    /// First node registered at `path`.
    #[must_use]
    pub fn node(&self, path: &str) -> Option<&NodeEntry> {
        self.nodes().find(|n| n.path == *path)
    }

    /// Names of the direct children of `parent`: files first, then nodes.
    pub fn children<'s>(&'s self, parent: &'s str) -> impl Iterator<Item = &'s str> + 's {
        let files = self.files().map(|f| f.path.as_str());
        let nodes = self.nodes().map(|n| n.path.as_str());
        files
            .chain(nodes)
            .filter_map(move |p| child_name(p, parent))
    }

    #[must_use]
    pub fn list_children(&self, parent: &str) -> usize {
        self.children(parent).count()
    }

    #[must_use]
    pub fn child_at<'s>(&'s self, parent: &'s str, index: usize) -> Option<&'s str> {
        self.children(parent).nth(index)
    }
}

impl<'a, const FILES: usize, const NODES: usize> FileSink<'a> for RamFs<'a, FILES, NODES> {
    fn add_file(&mut self, path: &str, data: &'a [u8]) -> Result<(), RamFsError> {
        self.add(path, data)
    }

    fn add_directory(&mut self, path: &str) -> Result<(), RamFsError> {
        self.mkdir(path)
    }

    fn contains(&self, path: &str) -> bool {
        self.exists(path)
    }
}
