//! Linux process backend over procfs
//!
//! Modules come from `/proc/<pid>/maps`, memory access goes through
//! positioned I/O on `/proc/<pid>/mem`. Writing requires ptrace access to
//! the target (same user with `ptrace_scope` 0, or `CAP_SYS_PTRACE`).

use crate::core::types::{Address, ModuleInfo, PatchError, PatchResult, ProcessId, ProcessInfo};
use crate::process::ProcessMemory;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;
use tracing::{debug, trace};

/// A process opened through `/proc/<pid>/mem`
#[derive(Debug)]
pub struct LinuxProcess {
    pid: ProcessId,
    mem: File,
    writable: bool,
}

impl LinuxProcess {
    /// Opens the process for reading and writing, falling back to
    /// read-only when writing is not permitted
    pub fn open(pid: ProcessId) -> PatchResult<Self> {
        let path = format!("/proc/{pid}/mem");
        if !Path::new(&path).exists() {
            return Err(PatchError::ProcessNotFound(format!("PID: {pid}")));
        }

        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(mem) => Ok(LinuxProcess {
                pid,
                mem,
                writable: true,
            }),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(pid, "opening {path} read-only: {e}");
                Ok(LinuxProcess {
                    pid,
                    mem: File::open(&path)?,
                    writable: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

impl ProcessMemory for LinuxProcess {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn list_modules(&self) -> PatchResult<Vec<ModuleInfo>> {
        let maps = fs::read_to_string(format!("/proc/{}/maps", self.pid))?;
        Ok(parse_maps(&maps))
    }

    fn read_bytes(&self, address: Address, len: usize) -> PatchResult<Vec<u8>> {
        let mut buffer = vec![0u8; len];
        self.mem
            .read_exact_at(&mut buffer, address.as_usize() as u64)
            .map_err(|e| PatchError::unreadable(address, len, e.to_string()))?;
        Ok(buffer)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> PatchResult<()> {
        if !self.writable {
            return Err(PatchError::write_protected(
                address,
                format!("/proc/{}/mem is open read-only", self.pid),
            ));
        }
        self.mem
            .write_all_at(data, address.as_usize() as u64)
            .map_err(|e| PatchError::write_protected(address, e.to_string()))
    }
}

/// Parses `/proc/<pid>/maps` into one module per mapped file.
///
/// A file mapped in several segments becomes a single module spanning
/// from its lowest start to its highest end. Anonymous and pseudo mappings
/// (`[heap]`, `[stack]`, ...) are ignored. Modules are returned in order of
/// first appearance.
pub fn parse_maps(maps: &str) -> Vec<ModuleInfo> {
    let mut order: Vec<String> = Vec::new();
    let mut spans: HashMap<String, (usize, usize)> = HashMap::new();

    for line in maps.lines() {
        // start-end perms offset dev inode pathname; the pathname may
        // itself contain spaces
        let mut rest = line;
        let mut fields = [""; 5];
        for field in fields.iter_mut() {
            rest = rest.trim_start();
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            *field = &rest[..end];
            rest = &rest[end..];
        }
        let range = fields[0];
        let pathname = rest.trim();
        if !pathname.starts_with('/') {
            continue;
        }

        let Some((start, end)) = range.split_once('-') else {
            trace!(line, "malformed maps line");
            continue;
        };
        let (Ok(start), Ok(end)) = (
            usize::from_str_radix(start, 16),
            usize::from_str_radix(end, 16),
        ) else {
            trace!(line, "malformed maps range");
            continue;
        };

        spans
            .entry(pathname.to_string())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(start);
                *hi = (*hi).max(end);
            })
            .or_insert_with(|| {
                order.push(pathname.to_string());
                (start, end)
            });
    }

    order
        .into_iter()
        .filter_map(|path| {
            let (start, end) = spans.get(&path).copied()?;
            Some(ModuleInfo::new(path, Address::new(start), end - start))
        })
        .collect()
}

/// Finds the first process whose executable name matches (case-insensitive).
///
/// Both the basename of the `/proc/<pid>/exe` link and `/proc/<pid>/comm`
/// are tried. Under Wine the link names the loader and only `comm` carries
/// the Windows executable name.
pub fn find_process_by_name(name: &str) -> PatchResult<Option<ProcessInfo>> {
    let mut pids: Vec<ProcessId> = fs::read_dir("/proc")?
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
        .collect();
    pids.sort_unstable();

    for pid in pids {
        let exe = fs::read_link(format!("/proc/{pid}/exe"))
            .ok()
            .and_then(|path| Some(path.file_name()?.to_string_lossy().into_owned()));
        let comm = fs::read_to_string(format!("/proc/{pid}/comm")).ok();

        if let Some(info) = match_process(pid, name, exe, comm.as_deref()) {
            return Ok(Some(info));
        }
    }
    Ok(None)
}

fn match_process(
    pid: ProcessId,
    name: &str,
    exe: Option<String>,
    comm: Option<&str>,
) -> Option<ProcessInfo> {
    let comm = comm.map(|comm| comm.trim_end().to_string());
    [exe, comm]
        .into_iter()
        .flatten()
        .map(|candidate| ProcessInfo::new(pid, candidate))
        .find(|info| info.name_matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a02000 r--p 00000000 08:01 131 /usr/bin/cat
55d0c0a02000-55d0c0a07000 r-xp 00002000 08:01 131 /usr/bin/cat
55d0c1f00000-55d0c1f21000 rw-p 00000000 00:00 0   [heap]
7f1c2a000000-7f1c2a028000 r--p 00000000 08:01 2048 /opt/wine prefix/WeChatWin.dll
7f1c2a028000-7f1c2a1bd000 r-xp 00028000 08:01 2048 /opt/wine prefix/WeChatWin.dll
7f1c2a1bd000-7f1c2a215000 r--p 001bc000 08:01 2048 /opt/wine prefix/WeChatWin.dll
7ffd5e9d0000-7ffd5e9f1000 rw-p 00000000 00:00 0   [stack]
7f1c2a300000-7f1c2a301000 rw-p 00000000 00:00 0
";

    #[test]
    fn test_parse_maps_groups_segments() {
        let modules = parse_maps(MAPS);
        assert_eq!(modules.len(), 2);

        assert_eq!(modules[0].path, "/usr/bin/cat");
        assert_eq!(modules[0].base_address, Address::new(0x55d0_c0a0_0000));
        assert_eq!(modules[0].size, 0x7000);

        let dll = &modules[1];
        assert_eq!(dll.name, "WeChatWin.dll");
        assert_eq!(dll.path, "/opt/wine prefix/WeChatWin.dll");
        assert_eq!(dll.base_address, Address::new(0x7f1c_2a00_0000));
        assert_eq!(dll.size, 0x21_5000);
    }

    #[test]
    fn test_parse_maps_skips_garbage() {
        assert!(parse_maps("not a maps line\nzz-yy r--p 0 0:0 1 /x\n").is_empty());
        assert!(parse_maps("").is_empty());
    }

    #[test]
    fn test_own_process() {
        let value: u32 = 0x6309_0C33;
        let address = Address::new(&value as *const u32 as usize);

        let process = LinuxProcess::open(std::process::id()).unwrap();
        assert_eq!(process.read_u32_le(address).unwrap(), 0x6309_0C33);
        assert!(!process.list_modules().unwrap().is_empty());

        let err = process.read_bytes(Address::new(0x10), 4).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_find_own_process() {
        let found = find_process_by_name("no-such-process-verpatch").unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_match_by_exe_or_comm() {
        let wine = match_process(
            10,
            "WeChat.exe",
            Some("wine64-preloader".to_string()),
            Some("WeChat.exe\n"),
        )
        .unwrap();
        assert_eq!(wine.pid, 10);
        assert_eq!(wine.name, "WeChat.exe");

        let native = match_process(11, "cat", Some("cat".to_string()), Some("cat\n")).unwrap();
        assert_eq!(native.name, "cat");

        let no_exe = match_process(12, "wechat.exe", None, Some("WeChat.exe\n"));
        assert!(no_exe.is_some());

        assert!(match_process(13, "WeChat.exe", Some("bash".to_string()), Some("bash\n")).is_none());
        assert!(match_process(14, "WeChat.exe", None, None).is_none());
    }

    #[test]
    fn test_find_process_renamed_through_comm() {
        use std::process::{Command, Stdio};
        use std::thread;
        use std::time::Duration;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg("printf vp-renamed.exe > /proc/$$/comm; sleep 10")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let mut found = None;
        for _ in 0..100 {
            found = find_process_by_name("vp-renamed.exe").unwrap();
            if found.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        let _ = child.kill();
        let _ = child.wait();

        let info = found.unwrap();
        assert_eq!(info.pid, child.id());
        assert_eq!(info.name, "vp-renamed.exe");
    }

    #[test]
    fn test_missing_pid() {
        let err = LinuxProcess::open(u32::MAX).unwrap_err();
        assert!(matches!(err, PatchError::ProcessNotFound(_)));
    }
}
