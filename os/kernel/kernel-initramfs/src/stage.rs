use crate::state::StateMachine;
use crate::{
    BootModule, DiskScanOutcome, FilesystemStagingContext, ModuleScanSummary, StagingState,
};
use kernel_block::DiskController;
use log::{info, warn};

/// What one staging run did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StagingReport {
    pub modules: ModuleScanSummary,
    /// [`StagingState::ZipFound`], [`StagingState::RawFound`] or
    /// [`StagingState::ModuleEmpty`].
    pub module_state: StagingState,
    pub disk: DiskScanOutcome,
    /// Files in the store once staging finished.
    pub files: usize,
    pub init_found: bool,
}

impl<'a> FilesystemStagingContext<'a> {
    /// Stage the root filesystem: boot modules first, then, if they did not
    /// provide the init program, the disks behind `controller`.
    ///
    /// Never fails; a missing init program is reported in
    /// [`StagingReport::init_found`] and left for the caller to judge.
    pub fn stage<C: DiskController + ?Sized>(
        &mut self,
        modules: &[BootModule<'a>],
        controller: &mut C,
    ) -> StagingReport {
        let mut machine = StateMachine::new();

        machine.enter(StagingState::ModuleScan);
        let summary = self.scan_modules(modules);
        let module_state = summary.outcome();
        machine.enter(module_state);

        let disk = match self.disk_skip_reason() {
            Some(reason) => {
                info!("staging: disk scan skipped: {reason:?}");
                DiskScanOutcome::Skipped(reason)
            }
            None => self.scan_drives(controller, &mut machine),
        };
        machine.enter(StagingState::Done);

        let report = StagingReport {
            modules: summary,
            module_state,
            disk,
            files: self.ramfs.file_count(),
            init_found: self.has_init(),
        };
        if report.init_found {
            info!(
                "staging: done, {} file(s), {} present",
                report.files, self.options.init_path
            );
        } else {
            warn!(
                "staging: done, {} file(s), no {}",
                report.files, self.options.init_path
            );
        }
        report
    }
}
