//! Synchronous shell-command capture helper.
//!
//! Standalone collaborator for callers that need to poke the system around a
//! capture session (probing devices, toggling modules). The capture path
//! never calls into this module.

use std::process::Command;

/// Ceiling on captured output in bytes; anything beyond is silently dropped.
pub const OUTPUT_CEILING: usize = 4096;

/// Fixed message returned when the process cannot be launched at all.
pub const LAUNCH_FAILED: &str = "command launch failed";

/// Run `command` through `sh -c` and return its captured stdout.
///
/// Blocks until the command exits. Output is truncated at [`OUTPUT_CEILING`]
/// bytes; a non-zero exit status is not an error (whatever stdout was
/// produced is returned). If the shell itself cannot be spawned the fixed
/// [`LAUNCH_FAILED`] string is returned instead.
#[must_use]
pub fn execute_command(command: &str) -> String {
    capture_stdout("sh", command)
}

fn capture_stdout(shell: &str, command: &str) -> String {
    let Ok(output) = Command::new(shell).arg("-c").arg(command).output() else {
        return LAUNCH_FAILED.to_owned();
    };

    let mut stdout = output.stdout;
    stdout.truncate(OUTPUT_CEILING);
    String::from_utf8_lossy(&stdout).into_owned()
}
