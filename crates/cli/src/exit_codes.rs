//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success                                        |
//! | 2    | Usage error (bad args, funder not configured)  |
//! | 3    | Config failed to parse or validate             |
//! | 4    | Runtime failure (unreadable input, bad column) |

/// Success - reconciliation completed.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, or a requested funder with no config entry.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Runtime failure - unreadable input, missing column, write error.
pub const EXIT_RUNTIME: u8 = 4;
