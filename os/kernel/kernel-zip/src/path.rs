use crate::ZipError;
use kernel_ramfs::{MAX_PATH, RamPath};

/// A store path derived from an archive entry name.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EntryName {
    pub path: RamPath,
    /// The archive name ended in a separator.
    pub is_dir: bool,
}

/// Map an archive entry name to an absolute store path.
///
/// Leading `./` runs are dropped, `\` becomes `/`, a leading `/` is added,
/// repeated separators collapse and a trailing separator is removed (and
/// reported through [`EntryName::is_dir`]).
///
/// # Errors
/// [`ZipError::EmptyName`] for a zero-length name, [`ZipError::InvalidName`]
/// if nothing but separators remains or the result is not a valid path.
pub fn normalize_entry_name(name: &[u8]) -> Result<EntryName, ZipError> {
    if name.is_empty() {
        return Err(ZipError::EmptyName);
    }

    let mut rest = name;
    while let Some(r) = rest.strip_prefix(b"./") {
        rest = r;
    }

    let mut buf = [0u8; MAX_PATH + 1];
    buf[0] = b'/';
    let mut len = 1;
    for &b in rest {
        let b = if b == b'\\' { b'/' } else { b };
        if b == b'/' && buf[len - 1] == b'/' {
            continue;
        }
        *buf.get_mut(len).ok_or(ZipError::InvalidName)? = b;
        len += 1;
    }

    let is_dir = len > 1 && buf[len - 1] == b'/';
    if is_dir {
        len -= 1;
    }
    if len == 1 {
        return Err(ZipError::InvalidName);
    }

    let s = core::str::from_utf8(&buf[..len]).map_err(|_| ZipError::InvalidName)?;
    let path = RamPath::new(s).map_err(|_| ZipError::InvalidName)?;
    Ok(EntryName { path, is_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(name: &str) -> Result<(String, bool), ZipError> {
        normalize_entry_name(name.as_bytes()).map(|n| (n.path.as_str().to_owned(), n.is_dir))
    }

    #[test]
    fn adds_leading_slash() {
        assert_eq!(norm("init"), Ok(("/init".into(), false)));
        assert_eq!(norm("bin/sh"), Ok(("/bin/sh".into(), false)));
        assert_eq!(norm("/etc/motd"), Ok(("/etc/motd".into(), false)));
    }

    #[test]
    fn strips_dot_slash_runs() {
        assert_eq!(norm("./init"), Ok(("/init".into(), false)));
        assert_eq!(norm("././bin/sh"), Ok(("/bin/sh".into(), false)));
        // Only leading runs.
        assert_eq!(norm("a/./b"), Ok(("/a/./b".into(), false)));
    }

    #[test]
    fn converts_backslashes_and_collapses_separators() {
        assert_eq!(norm("bin\\sh"), Ok(("/bin/sh".into(), false)));
        assert_eq!(norm("usr//lib\\\\x"), Ok(("/usr/lib/x".into(), false)));
    }

    #[test]
    fn trailing_separator_marks_a_directory() {
        assert_eq!(norm("bin/"), Ok(("/bin".into(), true)));
        assert_eq!(norm("./usr/lib//"), Ok(("/usr/lib".into(), true)));
    }

    #[test]
    fn rejects_degenerate_names() {
        assert_eq!(normalize_entry_name(b""), Err(ZipError::EmptyName));
        assert_eq!(norm("./"), Err(ZipError::InvalidName));
        assert_eq!(norm("//"), Err(ZipError::InvalidName));
        assert_eq!(
            normalize_entry_name(&[b'a', 0xFF]),
            Err(ZipError::InvalidName)
        );
    }

    #[test]
    fn bounds_the_path_length() {
        let ok = "x".repeat(MAX_PATH - 1);
        assert!(norm(&ok).is_ok());
        let long = "x".repeat(MAX_PATH);
        assert_eq!(norm(&long), Err(ZipError::InvalidName));
    }
}
