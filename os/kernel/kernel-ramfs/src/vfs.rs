use crate::RamFs;

/// Size of the descriptor table.
pub const MAX_OPEN_FILES: usize = 16;

/// An open file descriptor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Fd(usize);

impl Fd {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum VfsError {
    #[error("no such file")]
    NotFound,
    #[error("all {MAX_OPEN_FILES} descriptors are in use")]
    TooManyOpenFiles,
    #[error("descriptor is not open")]
    BadDescriptor,
    #[error("offset {offset} is beyond the end of a {size} byte file")]
    SeekOutOfRange { offset: usize, size: usize },
}

#[derive(Copy, Clone)]
struct OpenFile<'a> {
    data: &'a [u8],
    position: usize,
}

/// Descriptor-based read access to a [`RamFs`].
///
/// A descriptor captures the file's contents at `open` time.
pub struct Vfs<'r, 'a, const FILES: usize, const NODES: usize> {
    fs: &'r RamFs<'a, FILES, NODES>,
    open: [Option<OpenFile<'a>>; MAX_OPEN_FILES],
}

impl<'r, 'a, const FILES: usize, const NODES: usize> Vfs<'r, 'a, FILES, NODES> {
    #[must_use]
    pub const fn new(fs: &'r RamFs<'a, FILES, NODES>) -> Self {
        Self {
            fs,
            open: [None; MAX_OPEN_FILES],
        }
    }

    fn file(&mut self, fd: Fd) -> Result<&mut OpenFile<'a>, VfsError> {
        self.open
            .get_mut(fd.0)
            .and_then(Option::as_mut)
            .ok_or(VfsError::BadDescriptor)
    }

    /// Open `path` for reading at offset 0 in the lowest free slot.
    ///
    /// # Errors
    /// [`VfsError::NotFound`] or [`VfsError::TooManyOpenFiles`].
    pub fn open(&mut self, path: &str) -> Result<Fd, VfsError> {
        let slot = self
            .open
            .iter()
            .position(Option::is_none)
            .ok_or(VfsError::TooManyOpenFiles)?;
        let data = self.fs.get(path).ok_or(VfsError::NotFound)?;
        self.open[slot] = Some(OpenFile { data, position: 0 });
        Ok(Fd(slot))
    }

    /// Read up to `buf.len()` bytes from the current position.
    ///
    /// # Errors
    /// [`VfsError::BadDescriptor`].
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize, VfsError> {
        let file = self.file(fd)?;
        let remaining = &file.data[file.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        file.position += n;
        Ok(n)
    }

    /// Move to absolute `offset`; the end of the file is a valid position.
    ///
    /// # Errors
    /// [`VfsError::BadDescriptor`] or [`VfsError::SeekOutOfRange`].
    pub fn seek(&mut self, fd: Fd, offset: usize) -> Result<(), VfsError> {
        let file = self.file(fd)?;
        if offset > file.data.len() {
            return Err(VfsError::SeekOutOfRange {
                offset,
                size: file.data.len(),
            });
        }
        file.position = offset;
        Ok(())
    }

    /// # Errors
    /// [`VfsError::BadDescriptor`].
    pub fn close(&mut self, fd: Fd) -> Result<(), VfsError> {
        self.file(fd)?;
        self.open[fd.0] = None;
        Ok(())
    }

    /// # Errors
    /// [`VfsError::BadDescriptor`].
    pub fn file_size(&mut self, fd: Fd) -> Result<usize, VfsError> {
        self.file(fd).map(|f| f.data.len())
    }

    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.fs.exists(path)
    }

    #[must_use]
    pub fn list_count(&self, path: &str) -> usize {
        self.fs.list_children(path)
    }

    #[must_use]
    pub fn list_at(&self, path: &'r str, index: usize) -> Option<&'r str> {
        self.fs.child_at(path, index)
    }
}
