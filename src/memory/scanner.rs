//! Chunked scanning for a fixed byte needle
//!
//! The scan range `[0, total_size)` relative to a base address is read in
//! windows of `chunk_size` bytes. The last `needle.len() - 1` bytes of each
//! successfully read window are carried into the next one so that matches
//! crossing a window boundary are still found. A window that cannot be read
//! is skipped and resets the carried bytes, so a match straddling the edge
//! of a skipped window is not reported.

use crate::core::types::{Address, Offset, PatchError, PatchResult};
use crate::process::ProcessMemory;
use tracing::{debug, info, warn};

/// Default scan span: 256 MiB
pub const DEFAULT_TOTAL_SIZE: usize = 0x1000_0000;

/// Default window size: 16 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 0x100_0000;

/// Options for a chunked scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Bytes to cover, starting at the base address
    pub total_size: usize,
    /// Bytes read per window
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            total_size: DEFAULT_TOTAL_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ScanOptions {
    pub fn new(total_size: usize, chunk_size: usize) -> Self {
        ScanOptions {
            total_size,
            chunk_size,
        }
    }

    /// Consecutive windows covering `[0, total_size)`; the last one is
    /// truncated to the remaining length
    pub fn windows(&self) -> impl Iterator<Item = ScanWindow> {
        let total = self.total_size;
        let chunk = self.chunk_size.max(1);
        (0..total).step_by(chunk).map(move |chunk_start| ScanWindow {
            chunk_start,
            chunk_size: chunk.min(total - chunk_start),
        })
    }
}

/// One window of the scan range, relative to the base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub chunk_start: Offset,
    pub chunk_size: usize,
}

/// Outcome of reading a single window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkRead {
    Data(Vec<u8>),
    /// The window is not readable; scanning continues with the next one
    Unreadable,
}

/// Scans a process's memory window by window
pub struct ChunkedScanner<'a, P: ProcessMemory + ?Sized> {
    process: &'a P,
    options: ScanOptions,
}

impl<'a, P: ProcessMemory + ?Sized> ChunkedScanner<'a, P> {
    pub fn new(process: &'a P, options: ScanOptions) -> Self {
        ChunkedScanner { process, options }
    }

    /// Returns every offset from `base` at which `needle` occurs, ascending
    pub fn scan(&self, base: Address, needle: &[u8]) -> PatchResult<Vec<Offset>> {
        if self.options.chunk_size == 0 {
            return Err(PatchError::Config("scan chunk size must be non-zero".to_string()));
        }

        let mut offsets = Vec::new();
        if needle.is_empty() {
            return Ok(offsets);
        }

        let overlap_len = needle.len() - 1;
        let mut tail: Vec<u8> = Vec::with_capacity(overlap_len);
        let mut skipped = 0usize;

        for window in self.options.windows() {
            let address = base.add(window.chunk_start);

            let bytes = match self.read_window(address, window.chunk_size)? {
                ChunkRead::Data(bytes) => bytes,
                ChunkRead::Unreadable => {
                    warn!(
                        chunk_start = format_args!("{:08x}", window.chunk_start),
                        %address,
                        "window unreadable, skipping"
                    );
                    skipped += 1;
                    tail.clear();
                    continue;
                }
            };

            let prefix = tail.len();
            let mut combined = std::mem::take(&mut tail);
            combined.extend_from_slice(&bytes);

            for index in find_all(&combined, needle) {
                // Entirely inside the carried bytes: already reported with the previous window.
                if index + needle.len() <= prefix {
                    continue;
                }
                offsets.push(window.chunk_start - prefix + index);
            }

            let keep_from = combined.len().saturating_sub(overlap_len);
            tail = combined.split_off(keep_from);

            debug!(
                chunk_start = format_args!("{:08x}", window.chunk_start),
                %address,
                found = offsets.len(),
                "scanned window"
            );
        }

        info!(
            found = offsets.len(),
            skipped_windows = skipped,
            %base,
            "scan complete"
        );
        Ok(offsets)
    }

    /// Reads one window; unreadable memory becomes [`ChunkRead::Unreadable`],
    /// any other failure is returned as an error
    fn read_window(&self, address: Address, len: usize) -> PatchResult<ChunkRead> {
        match self.process.read_bytes(address, len) {
            Ok(bytes) => Ok(ChunkRead::Data(bytes)),
            Err(e) if e.is_recoverable() => Ok(ChunkRead::Unreadable),
            Err(e) => Err(e),
        }
    }
}

/// Convenience wrapper around [`ChunkedScanner::scan`]
pub fn scan<P: ProcessMemory + ?Sized>(
    process: &P,
    base: Address,
    needle: &[u8],
    options: ScanOptions,
) -> PatchResult<Vec<Offset>> {
    ChunkedScanner::new(process, options).scan(base, needle)
}

/// Start indices of every exact occurrence of `needle` in `haystack`
fn find_all<'h>(haystack: &'h [u8], needle: &'h [u8]) -> impl Iterator<Item = usize> + 'h {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, candidate)| *candidate == needle)
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SimulatedProcess;

    const BASE: Address = Address::new(0x7FF0_0000_0000);
    const NEEDLE: [u8; 4] = [0x21, 0x06, 0x09, 0x63];

    fn image_with(size: usize, offsets: &[usize]) -> Vec<u8> {
        let mut image = vec![0u8; size];
        for &offset in offsets {
            image[offset..offset + NEEDLE.len()].copy_from_slice(&NEEDLE);
        }
        image
    }

    #[test]
    fn test_windows_cover_range() {
        let windows: Vec<ScanWindow> = ScanOptions::new(40, 16).windows().collect();
        assert_eq!(
            windows,
            vec![
                ScanWindow { chunk_start: 0, chunk_size: 16 },
                ScanWindow { chunk_start: 16, chunk_size: 16 },
                ScanWindow { chunk_start: 32, chunk_size: 8 },
            ]
        );
        assert_eq!(ScanOptions::new(0, 16).windows().count(), 0);
    }

    #[test]
    fn test_default_options() {
        let opts = ScanOptions::default();
        assert_eq!(opts.total_size, 256 * 1024 * 1024);
        assert_eq!(opts.chunk_size, 16 * 1024 * 1024);
    }

    #[test]
    fn test_find_all_overlapping() {
        let hits: Vec<usize> = find_all(&[1, 1, 1, 1], &[1, 1]).collect();
        assert_eq!(hits, vec![0, 1, 2]);
        assert_eq!(find_all(&[1, 2], &[1, 2, 3]).count(), 0);
    }

    #[test]
    fn test_scan_within_windows() {
        let process = SimulatedProcess::builder()
            .region(BASE, image_with(64, &[0, 20, 60]))
            .build();

        let offsets = scan(&process, BASE, &NEEDLE, ScanOptions::new(64, 16)).unwrap();
        assert_eq!(offsets, vec![0, 20, 60]);
    }

    #[test]
    fn test_scan_straddling_every_split() {
        for split in 1..NEEDLE.len() {
            let offset = 16 - split;
            let process = SimulatedProcess::builder()
                .region(BASE, image_with(48, &[offset]))
                .build();

            let offsets = scan(&process, BASE, &NEEDLE, ScanOptions::new(48, 16)).unwrap();
            assert_eq!(offsets, vec![offset], "split {split}");
        }
    }

    #[test]
    fn test_match_at_window_start_reported_once() {
        let process = SimulatedProcess::builder()
            .region(BASE, image_with(32, &[12, 16]))
            .build();

        let offsets = scan(&process, BASE, &NEEDLE, ScanOptions::new(32, 16)).unwrap();
        assert_eq!(offsets, vec![12, 16]);
    }

    #[test]
    fn test_unreadable_window_is_skipped() {
        let process = SimulatedProcess::builder()
            .region(BASE, image_with(64, &[4, 20, 40]))
            .unreadable(BASE.add(16), 16)
            .build();

        let offsets = scan(&process, BASE, &NEEDLE, ScanOptions::new(64, 16)).unwrap();
        assert_eq!(offsets, vec![4, 40]);
        assert_eq!(process.reads().len(), 4);
    }

    #[test]
    fn test_overlap_reset_after_skipped_window() {
        // Needle straddles the boundary between a skipped window and the next.
        let process = SimulatedProcess::builder()
            .region(BASE, image_with(48, &[30]))
            .unreadable(BASE.add(16), 16)
            .build();

        let offsets = scan(&process, BASE, &NEEDLE, ScanOptions::new(48, 16)).unwrap();
        assert!(offsets.is_empty());
    }

    #[test]
    fn test_range_past_mapping_is_tolerated() {
        let process = SimulatedProcess::builder()
            .region(BASE, image_with(32, &[8]))
            .build();

        let offsets = scan(&process, BASE, &NEEDLE, ScanOptions::new(128, 32)).unwrap();
        assert_eq!(offsets, vec![8]);
    }

    #[test]
    fn test_empty_needle_and_zero_chunk() {
        let process = SimulatedProcess::builder().region(BASE, vec![0; 16]).build();
        assert!(scan(&process, BASE, &[], ScanOptions::new(16, 4))
            .unwrap()
            .is_empty());
        assert!(scan(&process, BASE, &NEEDLE, ScanOptions::new(16, 0)).is_err());
    }

    #[test]
    fn test_read_window_classification() {
        let process = SimulatedProcess::builder().region(BASE, vec![1; 8]).build();
        let scanner = ChunkedScanner::new(&process, ScanOptions::new(8, 8));

        assert_eq!(
            scanner.read_window(BASE, 8).unwrap(),
            ChunkRead::Data(vec![1; 8])
        );
        assert_eq!(
            scanner.read_window(BASE.add(0x1000), 8).unwrap(),
            ChunkRead::Unreadable
        );
    }
}
