use crate::{FilesystemStagingContext, StagingState};
use kernel_ramfs::{PathError, RamFsError, RamPath};
use kernel_zip::extract_to_store;
use log::{debug, info, warn};

/// A file the loader placed in memory next to the kernel.
#[derive(Debug, Copy, Clone)]
pub struct BootModule<'a> {
    pub data: &'a [u8],
    pub cmdline: Option<&'a str>,
}

impl<'a> BootModule<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8], cmdline: Option<&'a str>) -> Self {
        Self { data, cmdline }
    }
}

/// What a boot module contains, judged by its first bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ModuleKind {
    /// Starts with the `PK` signature of a ZIP archive.
    Zip,
    /// Anything else; registered as a single file.
    RawBinary,
    Empty,
}

#[must_use]
pub fn classify_module(data: &[u8]) -> ModuleKind {
    if data.is_empty() {
        ModuleKind::Empty
    } else if data.starts_with(b"PK") {
        ModuleKind::Zip
    } else {
        ModuleKind::RawBinary
    }
}

/// The path a raw module is registered under.
///
/// The first word of the command line, made absolute. Everything after it is
/// ignored, so a loader may pass arguments (`/bin/hello -v`) without them
/// ending up in the file name. Without a command line, or with a blank one,
/// the module is `default` (the init program).
///
/// # Errors
/// If the name is not a valid store path.
pub fn module_path(cmdline: Option<&str>, default: &str) -> Result<RamPath, PathError> {
    match cmdline.and_then(|c| c.split_ascii_whitespace().next()) {
        Some(name) => RamPath::absolute(name),
        None => RamPath::new(default),
    }
}

/// Counts from scanning the module list.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ModuleScanSummary {
    pub zip_modules: usize,
    pub raw_modules: usize,
    pub empty_modules: usize,
    /// Files added to the store, from archives and raw modules.
    pub files_loaded: usize,
    /// Raw modules the store refused.
    pub rejected: usize,
}

impl ModuleScanSummary {
    /// The module phase outcome these counts describe.
    #[must_use]
    pub const fn outcome(&self) -> StagingState {
        if self.zip_modules > 0 {
            StagingState::ZipFound
        } else if self.raw_modules > 0 {
            StagingState::RawFound
        } else {
            StagingState::ModuleEmpty
        }
    }
}

impl<'a> FilesystemStagingContext<'a> {
    /// Stage every boot module: archives are extracted, anything else is
    /// registered as one file.
    pub fn scan_modules(&mut self, modules: &[BootModule<'a>]) -> ModuleScanSummary {
        let mut summary = ModuleScanSummary::default();
        if modules.is_empty() {
            info!("modules: none from the loader");
            return summary;
        }
        info!("modules: {} from the loader", modules.len());

        for (i, module) in modules.iter().enumerate() {
            match classify_module(module.data) {
                ModuleKind::Zip => {
                    summary.zip_modules += 1;
                    info!("modules: #{i} is a ZIP archive ({} bytes)", module.data.len());
                    summary.files_loaded +=
                        extract_to_store(module.data, &mut self.heap, &mut self.ramfs);
                }
                ModuleKind::RawBinary => {
                    summary.raw_modules += 1;
                    match self.add_raw(module) {
                        Ok(path) => {
                            summary.files_loaded += 1;
                            info!("modules: #{i} -> {path} ({} bytes)", module.data.len());
                        }
                        Err(e) => {
                            summary.rejected += 1;
                            warn!("modules: #{i} not staged: {e}");
                        }
                    }
                }
                ModuleKind::Empty => {
                    summary.empty_modules += 1;
                    debug!("modules: #{i} is empty");
                }
            }
        }

        info!(
            "modules: {} file(s) staged from {} archive(s) and {} raw module(s)",
            summary.files_loaded, summary.zip_modules, summary.raw_modules
        );
        summary
    }

    fn add_raw(&mut self, module: &BootModule<'a>) -> Result<RamPath, RamFsError> {
        let path = module_path(module.cmdline, self.options.init_path)?;
        self.ramfs.add(path.as_str(), module.data)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_zip_magic() {
        assert_eq!(classify_module(b"PK\x03\x04rest"), ModuleKind::Zip);
        assert_eq!(classify_module(b"PK"), ModuleKind::Zip);
        assert_eq!(classify_module(b"P"), ModuleKind::RawBinary);
        assert_eq!(classify_module(b"\x7FELF"), ModuleKind::RawBinary);
        assert_eq!(classify_module(b""), ModuleKind::Empty);
    }

    #[test]
    fn names_come_from_the_command_line() {
        let path = |c| module_path(c, "/init").map(|p| p.as_str().to_owned());
        assert_eq!(path(None).unwrap(), "/init");
        assert_eq!(path(Some("")).unwrap(), "/init");
        assert_eq!(path(Some("  \t")).unwrap(), "/init");
        assert_eq!(path(Some("/bin/sh")).unwrap(), "/bin/sh");
        assert_eq!(path(Some("motd.txt")).unwrap(), "/motd.txt");
        assert_eq!(path(Some("/boot/hello arg1 arg2")).unwrap(), "/boot/hello");
    }

    #[test]
    fn outcome_prefers_archives() {
        let mut s = ModuleScanSummary::default();
        assert_eq!(s.outcome(), StagingState::ModuleEmpty);
        s.raw_modules = 1;
        assert_eq!(s.outcome(), StagingState::RawFound);
        s.zip_modules = 1;
        assert_eq!(s.outcome(), StagingState::ZipFound);
    }
}
