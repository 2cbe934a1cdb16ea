//! Validate-then-write patching of candidate offsets
//!
//! Each candidate is re-read and classified before anything is written:
//! cells already holding the target are skipped, cells holding the default
//! are rewritten, and any other value aborts the run. Offsets written before
//! an abort stay written.

use crate::core::types::{Address, Offset, PatchError, PatchResult, VersionValue};
use crate::process::ProcessMemory;
use tracing::{debug, info, warn};

/// Classification of a single candidate cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Already holds the target value
    AlreadyTarget,
    /// Holds the default value and will be rewritten
    StillDefault,
    /// Holds neither value
    Unexpected(VersionValue),
}

/// Classifies a value read from a candidate cell
pub fn classify(found: VersionValue, default: VersionValue, target: VersionValue) -> PatchOutcome {
    if found == target {
        PatchOutcome::AlreadyTarget
    } else if found == default {
        PatchOutcome::StillDefault
    } else {
        PatchOutcome::Unexpected(found)
    }
}

/// Rewrites candidate cells from a default version stamp to a target one
pub struct ValidatingPatcher<'a, P: ProcessMemory + ?Sized> {
    process: &'a P,
    default: VersionValue,
    target: VersionValue,
    verify_writes: bool,
    dry_run: bool,
}

impl<'a, P: ProcessMemory + ?Sized> ValidatingPatcher<'a, P> {
    pub fn new(process: &'a P, default: VersionValue, target: VersionValue) -> Self {
        ValidatingPatcher {
            process,
            default,
            target,
            verify_writes: true,
            dry_run: false,
        }
    }

    /// Enable or disable read-back after each write
    pub fn set_verify_writes(&mut self, verify: bool) {
        self.verify_writes = verify;
    }

    /// Classify only; never write
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Reads and classifies the cell at `base + offset`
    pub fn inspect(&self, base: Address, offset: Offset) -> PatchResult<PatchOutcome> {
        let address = base.add(offset);
        let found = self.process.read_version(address)?;
        Ok(classify(found, self.default, self.target))
    }

    /// Processes `offsets` in order and returns how many cells were newly
    /// written (or, in dry-run mode, would have been written).
    ///
    /// Fails with `VersionMismatch` at the first cell holding neither value;
    /// later offsets are not touched.
    pub fn patch(&self, base: Address, offsets: &[Offset]) -> PatchResult<usize> {
        let mut written = 0;

        for &offset in offsets {
            let address = base.add(offset);
            match self.inspect(base, offset)? {
                PatchOutcome::AlreadyTarget => {
                    debug!(%address, offset = format_args!("{offset:#x}"), "already patched");
                }
                PatchOutcome::StillDefault => {
                    if !self.dry_run {
                        self.write_target(address)?;
                    }
                    written += 1;
                    debug!(
                        %address,
                        offset = format_args!("{offset:#x}"),
                        dry_run = self.dry_run,
                        "patched"
                    );
                }
                PatchOutcome::Unexpected(found) => {
                    warn!(
                        %address,
                        %found,
                        expected = %self.default,
                        written,
                        "unexpected value, aborting"
                    );
                    return Err(PatchError::VersionMismatch {
                        address,
                        offset,
                        found,
                        expected: self.default,
                        target: self.target,
                    });
                }
            }
        }

        info!(
            written,
            candidates = offsets.len(),
            default = %self.default,
            target = %self.target,
            "patch complete"
        );
        Ok(written)
    }

    fn write_target(&self, address: Address) -> PatchResult<()> {
        self.process.write_u32_le(address, self.target.get())?;

        if self.verify_writes {
            let read_back = self.process.read_version(address)?;
            if read_back != self.target {
                return Err(PatchError::write_protected(
                    address,
                    format!("write not applied: read back {read_back}"),
                ));
            }
        }

        Ok(())
    }
}

/// Convenience wrapper around [`ValidatingPatcher::patch`]
pub fn patch<P: ProcessMemory + ?Sized>(
    process: &P,
    offsets: &[Offset],
    base: Address,
    default: VersionValue,
    target: VersionValue,
) -> PatchResult<usize> {
    ValidatingPatcher::new(process, default, target).patch(base, offsets)
}
