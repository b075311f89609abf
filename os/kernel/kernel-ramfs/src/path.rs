use crate::MAX_PATH;
use core::fmt;

/// Why a string is not an acceptable store path.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path does not start with '/'")]
    NotAbsolute,
    #[error("path is {0} bytes long")]
    TooLong(usize),
    #[error("path contains a NUL byte")]
    ContainsNul,
}

/// An absolute path of at most [`MAX_PATH`] bytes stored inline.
#[derive(Copy, Clone)]
pub struct RamPath {
    buf: [u8; MAX_PATH],
    len: u8,
}

impl RamPath {
    /// Validate and copy `path`.
    ///
    /// # Errors
    /// See [`PathError`].
    pub fn new(path: &str) -> Result<Self, PathError> {
        let bytes = path.as_bytes();
        if bytes.is_empty() {
            return Err(PathError::Empty);
        }
        if bytes[0] != b'/' {
            return Err(PathError::NotAbsolute);
        }
        if bytes.contains(&0) {
            return Err(PathError::ContainsNul);
        }
        let len = u8::try_from(bytes.len()).map_err(|_| PathError::TooLong(bytes.len()))?;

        let mut buf = [0u8; MAX_PATH];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { buf, len })
    }

    /// Like [`RamPath::new`], but a relative `path` gets a leading `/`.
    ///
    /// # Errors
    /// See [`PathError`]; the added `/` counts towards the length limit.
    pub fn absolute(path: &str) -> Result<Self, PathError> {
        if path.starts_with('/') {
            return Self::new(path);
        }
        let bytes = path.as_bytes();
        if bytes.is_empty() {
            return Err(PathError::Empty);
        }
        if bytes.contains(&0) {
            return Err(PathError::ContainsNul);
        }
        let total = bytes.len() + 1;
        let len = u8::try_from(total).map_err(|_| PathError::TooLong(total))?;

        let mut buf = [0u8; MAX_PATH];
        buf[0] = b'/';
        buf[1..total].copy_from_slice(bytes);
        Ok(Self { buf, len })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever filled from a `&str`.
        core::str::from_utf8(&self.buf[..usize::from(self.len)]).unwrap_or_default()
    }

    /// The last path component (empty for `/`).
    #[must_use]
    pub fn file_name(&self) -> &str {
        let s = self.as_str();
        s.rsplit('/').next().unwrap_or(s)
    }
}

impl PartialEq for RamPath {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RamPath {}

impl PartialEq<str> for RamPath {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Debug for RamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for RamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name of `path` relative to `parent` if `path` is a direct child.
pub fn child_name<'p>(path: &'p str, parent: &str) -> Option<&'p str> {
    let parent = parent.trim_end_matches('/');
    let rest = path.strip_prefix(parent)?.strip_prefix('/')?;
    (!rest.is_empty() && !rest.contains('/')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_paths() {
        let p = RamPath::new("/bin/sh").unwrap();
        assert_eq!(p.as_str(), "/bin/sh");
        assert_eq!(p.file_name(), "sh");
        assert_eq!(RamPath::new("/").unwrap().file_name(), "");
    }

    #[test]
    fn rejects_bad_paths() {
        assert_eq!(RamPath::new("").unwrap_err(), PathError::Empty);
        assert_eq!(RamPath::new("init").unwrap_err(), PathError::NotAbsolute);
        assert_eq!(RamPath::new("/a\0b").unwrap_err(), PathError::ContainsNul);

        let long = format!("/{}", "x".repeat(MAX_PATH));
        assert_eq!(
            RamPath::new(&long).unwrap_err(),
            PathError::TooLong(MAX_PATH + 1)
        );
        assert!(RamPath::new(&long[..MAX_PATH]).is_ok());
    }

    #[test]
    fn absolute_prefixes_relative_paths() {
        assert_eq!(RamPath::absolute("init").unwrap().as_str(), "/init");
        assert_eq!(RamPath::absolute("/bin/sh").unwrap().as_str(), "/bin/sh");
        assert_eq!(RamPath::absolute("").unwrap_err(), PathError::Empty);
        assert_eq!(
            RamPath::absolute(&"x".repeat(MAX_PATH)).unwrap_err(),
            PathError::TooLong(MAX_PATH + 1)
        );
        assert!(RamPath::absolute(&"x".repeat(MAX_PATH - 1)).is_ok());
    }

    #[test]
    fn direct_children_only() {
        assert_eq!(child_name("/init", "/"), Some("init"));
        assert_eq!(child_name("/bin/sh", "/"), None);
        assert_eq!(child_name("/bin/sh", "/bin"), Some("sh"));
        assert_eq!(child_name("/bin/sh", "/bin/"), Some("sh"));
        assert_eq!(child_name("/binary", "/bin"), None);
        assert_eq!(child_name("/bin", "/bin"), None);
    }
}
