//! Starting the target and waiting for it to appear in the process list

use super::find_process;
use crate::core::types::{PatchError, PatchResult, ProcessInfo};
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Polling parameters for [`launch_and_wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        LaunchOptions {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Polls `lookup` until it yields a process or `timeout` elapses.
///
/// Lookup errors are logged and retried; they never end the wait early.
pub fn poll_until<F>(name: &str, options: LaunchOptions, mut lookup: F) -> PatchResult<ProcessInfo>
where
    F: FnMut(&str) -> PatchResult<Option<ProcessInfo>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match lookup(name) {
            Ok(Some(process)) => {
                info!(%process, attempts, "process found");
                return Ok(process);
            }
            Ok(None) => debug!(name, attempts, "process not running yet"),
            Err(e) => warn!(name, attempts, error = %e, "process lookup failed"),
        }

        if started.elapsed() + options.poll_interval > options.timeout {
            return Err(PatchError::LaunchFailed {
                program: name.to_string(),
                reason: format!(
                    "process did not appear within {} ms",
                    options.timeout.as_millis()
                ),
            });
        }
        thread::sleep(options.poll_interval);
    }
}

/// Starts `executable` unless `name` is already running, then waits for it.
///
/// When the executable is missing nothing is launched and nothing is
/// awaited: the result is whatever is running right now, else
/// `ProcessNotFound`.
pub fn launch_and_wait(
    executable: &Path,
    name: &str,
    options: LaunchOptions,
) -> PatchResult<ProcessInfo> {
    launch_with(executable, name, options, find_process)
}

fn launch_with<F>(
    executable: &Path,
    name: &str,
    options: LaunchOptions,
    mut lookup: F,
) -> PatchResult<ProcessInfo>
where
    F: FnMut(&str) -> PatchResult<Option<ProcessInfo>>,
{
    if let Some(process) = lookup(name)? {
        info!(%process, "already running");
        return Ok(process);
    }

    if !executable.exists() {
        warn!(path = %executable.display(), "executable not found, not launching");
        return lookup(name)?.ok_or_else(|| PatchError::ProcessNotFound(name.to_string()));
    }

    info!(path = %executable.display(), "launching");
    Command::new(executable)
        .spawn()
        .map_err(|e| PatchError::LaunchFailed {
            program: executable.display().to_string(),
            reason: e.to_string(),
        })?;

    poll_until(name, options, lookup)
}
