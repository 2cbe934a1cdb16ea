//! In-memory process backend
//!
//! `SimulatedProcess` serves reads and writes from byte images placed at
//! fixed addresses. Ranges can be marked unreadable (like unmapped pages),
//! write protected, or write-ignoring (the write reports success but the
//! bytes never change). Every read and write is logged.

use super::ProcessMemory;
use crate::core::types::{Address, ModuleInfo, PatchError, PatchResult, ProcessId};
use std::cell::RefCell;
use std::ops::Range;

#[derive(Debug, Clone)]
struct Region {
    base: usize,
    bytes: Vec<u8>,
}

impl Region {
    fn span(&self, address: usize, len: usize) -> Option<Range<usize>> {
        let start = address.checked_sub(self.base)?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

fn overlaps(ranges: &[Range<usize>], address: usize, len: usize) -> bool {
    let end = address.saturating_add(len);
    ranges.iter().any(|r| address < r.end && r.start < end)
}

/// A process whose memory lives in this process
#[derive(Debug)]
pub struct SimulatedProcess {
    pid: ProcessId,
    modules: Vec<ModuleInfo>,
    regions: RefCell<Vec<Region>>,
    unreadable: Vec<Range<usize>>,
    write_protected: Vec<Range<usize>>,
    ignore_writes: Vec<Range<usize>>,
    reads: RefCell<Vec<(Address, usize)>>,
    writes: RefCell<Vec<(Address, Vec<u8>)>>,
}

impl SimulatedProcess {
    /// Start building a simulated process
    pub fn builder() -> SimulatedProcessBuilder {
        SimulatedProcessBuilder::default()
    }

    /// Every read issued so far, in order
    pub fn reads(&self) -> Vec<(Address, usize)> {
        self.reads.borrow().clone()
    }

    /// Every successful write issued so far, in order
    pub fn writes(&self) -> Vec<(Address, Vec<u8>)> {
        self.writes.borrow().clone()
    }
}

impl ProcessMemory for SimulatedProcess {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn list_modules(&self) -> PatchResult<Vec<ModuleInfo>> {
        Ok(self.modules.clone())
    }

    fn read_bytes(&self, address: Address, len: usize) -> PatchResult<Vec<u8>> {
        self.reads.borrow_mut().push((address, len));

        let addr = address.as_usize();
        if overlaps(&self.unreadable, addr, len) {
            return Err(PatchError::unreadable(address, len, "page not accessible"));
        }

        let regions = self.regions.borrow();
        regions
            .iter()
            .find_map(|region| region.span(addr, len).map(|span| region.bytes[span].to_vec()))
            .ok_or_else(|| PatchError::unreadable(address, len, "unmapped"))
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> PatchResult<()> {
        let addr = address.as_usize();
        if overlaps(&self.write_protected, addr, data.len()) {
            return Err(PatchError::write_protected(address, "page is read-only"));
        }

        if !overlaps(&self.ignore_writes, addr, data.len()) {
            let mut regions = self.regions.borrow_mut();
            let region = regions
                .iter_mut()
                .find(|region| region.span(addr, data.len()).is_some())
                .ok_or_else(|| PatchError::write_protected(address, "unmapped"))?;
            let start = addr - region.base;
            region.bytes[start..start + data.len()].copy_from_slice(data);
        }

        self.writes.borrow_mut().push((address, data.to_vec()));
        Ok(())
    }
}

/// Builder for [`SimulatedProcess`]
#[derive(Debug, Default)]
pub struct SimulatedProcessBuilder {
    pid: ProcessId,
    modules: Vec<ModuleInfo>,
    regions: Vec<Region>,
    unreadable: Vec<Range<usize>>,
    write_protected: Vec<Range<usize>>,
    ignore_writes: Vec<Range<usize>>,
}

impl SimulatedProcessBuilder {
    pub fn pid(mut self, pid: ProcessId) -> Self {
        self.pid = pid;
        self
    }

    /// Registers a loaded module without backing memory
    pub fn module(mut self, path: &str, base: Address, size: usize) -> Self {
        self.modules.push(ModuleInfo::new(path, base, size));
        self
    }

    /// Maps `bytes` at `base`
    pub fn region(mut self, base: Address, bytes: Vec<u8>) -> Self {
        self.regions.push(Region {
            base: base.as_usize(),
            bytes,
        });
        self
    }

    /// Registers a module and maps its image
    pub fn module_image(self, path: &str, base: Address, image: Vec<u8>) -> Self {
        let size = image.len();
        self.module(path, base, size).region(base, image)
    }

    /// Makes `len` bytes starting at `start` fail to read
    pub fn unreadable(mut self, start: Address, len: usize) -> Self {
        self.unreadable.push(start.as_usize()..start.as_usize() + len);
        self
    }

    /// Makes `len` bytes starting at `start` reject writes
    pub fn write_protected(mut self, start: Address, len: usize) -> Self {
        self.write_protected
            .push(start.as_usize()..start.as_usize() + len);
        self
    }

    /// Makes writes to `len` bytes starting at `start` succeed without effect
    pub fn ignore_writes(mut self, start: Address, len: usize) -> Self {
        self.ignore_writes
            .push(start.as_usize()..start.as_usize() + len);
        self
    }

    pub fn build(self) -> SimulatedProcess {
        SimulatedProcess {
            pid: self.pid,
            modules: self.modules,
            regions: RefCell::new(self.regions),
            unreadable: self.unreadable,
            write_protected: self.write_protected,
            ignore_writes: self.ignore_writes,
            reads: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
        }
    }
}
