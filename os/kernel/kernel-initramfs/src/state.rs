use log::debug;

/// Phases of staging the root filesystem.
///
/// ```text
/// NoSource ─► ModuleScan ─┬─► ZipFound ────┐
///                         ├─► RawFound ────┼─► DiskScan ─┬─► MbrFound ─► PartitionProbe ─┐
///                         └─► ModuleEmpty ─┘      ▲      └─► NoMbr ────► RawFatProbe ────┤
///                                   │             └──────────────────────────────────────┤
///                                   └──────────────────────────────────────────────────► Done
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StagingState {
    NoSource,
    ModuleScan,
    /// At least one module was a ZIP archive.
    ZipFound,
    /// Modules were present, none of them a ZIP archive.
    RawFound,
    /// No usable module.
    ModuleEmpty,
    DiskScan,
    MbrFound,
    PartitionProbe,
    NoMbr,
    RawFatProbe,
    Done,
}

impl StagingState {
    /// Whether `next` may follow `self`.
    #[must_use]
    pub const fn can_enter(self, next: Self) -> bool {
        use StagingState::{
            DiskScan, Done, MbrFound, ModuleEmpty, ModuleScan, NoMbr, NoSource, PartitionProbe,
            RawFatProbe, RawFound, ZipFound,
        };
        matches!(
            (self, next),
            (NoSource, ModuleScan)
                | (ModuleScan, ZipFound | RawFound | ModuleEmpty)
                | (ZipFound | RawFound | ModuleEmpty, DiskScan | Done)
                | (DiskScan, DiskScan | MbrFound | NoMbr | Done)
                | (MbrFound, PartitionProbe | RawFatProbe)
                | (PartitionProbe, PartitionProbe | RawFatProbe | DiskScan | Done)
                | (NoMbr, RawFatProbe)
                | (RawFatProbe, DiskScan | Done)
        )
    }

    /// Whether this is the outcome of the module phase.
    #[must_use]
    pub const fn is_module_outcome(self) -> bool {
        matches!(self, Self::ZipFound | Self::RawFound | Self::ModuleEmpty)
    }
}

/// The current [`StagingState`] of one staging run.
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: StagingState,
}

impl StateMachine {
    pub const fn new() -> Self {
        Self {
            state: StagingState::NoSource,
        }
    }

    /// Continue from `state`, for phases run on their own.
    pub const fn resume(state: StagingState) -> Self {
        Self { state }
    }

    pub const fn state(&self) -> StagingState {
        self.state
    }

    pub fn enter(&mut self, next: StagingState) {
        debug_assert!(
            self.state.can_enter(next),
            "invalid staging transition {:?} -> {next:?}",
            self.state
        );
        debug!("staging: {:?} -> {next:?}", self.state);
        self.state = next;
    }
}
