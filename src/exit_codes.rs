//! Exit code constants for the envlaunch CLI.
//!
//! - 0: Success
//! - 1: User error (bad config file reference or unparsable document)
//! - 2: Configuration error (missing base, empty merge, unknown profile)
//! - 3: Environment resolution failure
//! - 4: Command execution failure
//!
//! `envlaunch run` passes the child's own exit code through on success.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad path, unsupported format, or malformed document.
pub const USER_ERROR: i32 = 1;

/// Configuration error: the override chain could not produce the requested profile.
pub const CONFIG_FAILURE: i32 = 2;

/// The package resolver failed or reported an unresolvable request.
pub const RESOLVE_FAILURE: i32 = 3;

/// The command could not be parsed or launched inside the environment.
pub const EXEC_FAILURE: i32 = 4;

/// Map a child exit code onto a process exit status byte.
///
/// Signal terminations (negative codes) become `128 + signal`, the shell convention.
/// A nonzero code never maps to 0.
pub fn status_byte(code: i32) -> u8 {
    let wide = if code < 0 { 128 + code.unsigned_abs() } else { code as u32 };
    match (wide & 0xff) as u8 {
        0 if code != 0 => USER_ERROR as u8,
        byte => byte,
    }
}
