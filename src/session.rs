//! Patch session state machine
//!
//! ```text
//! Idle --locate--> ModuleLocated --scan--> Scanned --patch--> Done
//!   \_______________\___________________\____________> Error(kind)
//! ```
//!
//! `scan` encodes both versions and searches the module for the current
//! one; an empty result moves the session to `Error(OffsetsNotFound)`.
//! `Error` absorbs: every further step fails with `InvalidState`.

use crate::codec::VersionSpec;
use crate::core::types::{
    ErrorKind, ModuleInfo, Offset, PatchError, PatchResult, VersionValue,
};
use crate::memory::{ChunkedScanner, ScanOptions, ValidatingPatcher};
use crate::process::{find_module, ProcessMemory};
use std::fmt;
use tracing::info;

/// What to patch and how
#[derive(Debug, Clone)]
pub struct PatchRequest {
    /// Path suffix of the module holding the version stamp
    pub module_suffix: String,
    /// Version the target currently reports
    pub current: VersionSpec,
    /// Version to write
    pub target: VersionSpec,
    pub scan: ScanOptions,
    pub verify_writes: bool,
    pub dry_run: bool,
}

impl PatchRequest {
    pub fn new(module_suffix: impl Into<String>, current: VersionSpec, target: VersionSpec) -> Self {
        PatchRequest {
            module_suffix: module_suffix.into(),
            current,
            target,
            scan: ScanOptions::default(),
            verify_writes: true,
            dry_run: false,
        }
    }

    pub fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Current position of a [`PatchSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchState {
    Idle,
    ModuleLocated(ModuleInfo),
    Scanned {
        module: ModuleInfo,
        default: VersionValue,
        target: VersionValue,
        offsets: Vec<Offset>,
    },
    Done {
        module: ModuleInfo,
        offsets: Vec<Offset>,
        written: usize,
    },
    Error(ErrorKind),
}

impl PatchState {
    fn name(&self) -> &'static str {
        match self {
            PatchState::Idle => "Idle",
            PatchState::ModuleLocated(_) => "ModuleLocated",
            PatchState::Scanned { .. } => "Scanned",
            PatchState::Done { .. } => "Done",
            PatchState::Error(_) => "Error",
        }
    }
}

impl fmt::Display for PatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchState::Error(kind) => write!(f, "Error({kind})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Summary of a completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub module: ModuleInfo,
    pub offsets: Vec<Offset>,
    pub written: usize,
}

/// Drives one locate / scan / patch run against a process
pub struct PatchSession<'a, P: ProcessMemory + ?Sized> {
    process: &'a P,
    request: PatchRequest,
    state: PatchState,
}

impl<'a, P: ProcessMemory + ?Sized> PatchSession<'a, P> {
    pub fn new(process: &'a P, request: PatchRequest) -> Self {
        PatchSession {
            process,
            request,
            state: PatchState::Idle,
        }
    }

    pub fn state(&self) -> &PatchState {
        &self.state
    }

    /// `Idle -> ModuleLocated`
    pub fn locate(&mut self) -> PatchResult<&ModuleInfo> {
        self.expect_state("locate", |s| matches!(s, PatchState::Idle))?;

        let module = self.guard(find_module(self.process, &self.request.module_suffix))?;
        info!(pid = self.process.pid(), %module, "module located");
        self.state = PatchState::ModuleLocated(module);

        match &self.state {
            PatchState::ModuleLocated(module) => Ok(module),
            _ => unreachable!("state was just set to ModuleLocated"),
        }
    }

    /// `ModuleLocated -> Scanned`, or `Error(OffsetsNotFound)` on an empty scan
    pub fn scan(&mut self) -> PatchResult<&[Offset]> {
        let module = match &self.state {
            PatchState::ModuleLocated(module) => module.clone(),
            other => return Err(invalid("scan", other)),
        };

        let default = self.guard(self.request.current.encode())?;
        let target = self.guard(self.request.target.encode())?;
        info!(
            current = %self.request.current,
            %default,
            target_version = %self.request.target,
            %target,
            "versions encoded"
        );

        let scanner = ChunkedScanner::new(self.process, self.request.scan);
        let offsets = self.guard(scanner.scan(module.base_address, &default.to_le_bytes()))?;

        if offsets.is_empty() {
            return Err(self.fail(PatchError::OffsetsNotFound {
                module: module.name.clone(),
                needle: default,
            }));
        }

        info!(
            offsets = ?offsets.iter().map(|o| format!("{o:#x}")).collect::<Vec<_>>(),
            "candidate offsets found"
        );
        self.state = PatchState::Scanned {
            module,
            default,
            target,
            offsets,
        };

        match &self.state {
            PatchState::Scanned { offsets, .. } => Ok(offsets),
            _ => unreachable!("state was just set to Scanned"),
        }
    }

    /// `Scanned -> Done`
    pub fn patch(&mut self) -> PatchResult<usize> {
        let (module, default, target, offsets) = match &self.state {
            PatchState::Scanned {
                module,
                default,
                target,
                offsets,
            } => (module.clone(), *default, *target, offsets.clone()),
            other => return Err(invalid("patch", other)),
        };

        let mut patcher = ValidatingPatcher::new(self.process, default, target);
        patcher.set_verify_writes(self.request.verify_writes);
        patcher.set_dry_run(self.request.dry_run);

        let written = self.guard(patcher.patch(module.base_address, &offsets))?;
        self.state = PatchState::Done {
            module,
            offsets,
            written,
        };
        Ok(written)
    }

    /// Runs every step from `Idle` to `Done`
    pub fn run(mut self) -> PatchResult<PatchReport> {
        self.locate()?;
        self.scan()?;
        self.patch()?;

        match self.state {
            PatchState::Done {
                module,
                offsets,
                written,
            } => Ok(PatchReport {
                module,
                offsets,
                written,
            }),
            other => Err(invalid("report", &other)),
        }
    }

    fn expect_state(&self, op: &str, ok: impl Fn(&PatchState) -> bool) -> PatchResult<()> {
        if ok(&self.state) {
            Ok(())
        } else {
            Err(invalid(op, &self.state))
        }
    }

    /// Moves to `Error(kind)` if `result` failed
    fn guard<T>(&mut self, result: PatchResult<T>) -> PatchResult<T> {
        result.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, error: PatchError) -> PatchError {
        self.state = PatchState::Error(error.kind());
        error
    }
}

fn invalid(op: &str, state: &PatchState) -> PatchError {
    PatchError::InvalidState(format!("cannot {op} from state {state}"))
}
