//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                        |
//! |------|----------------------------------------------------------------|
//! | 0    | Success                                                        |
//! | 1    | Deviations found (`check --strict-exit`)                       |
//! | 2    | CLI usage error (bad args, bad delimiter)                      |
//! | 3    | Input rejected (structure, empty data, non-numeric tax figure) |
//! | 4    | Source file unreadable (missing, not a spreadsheet, too large) |
//! | 5    | Report could not be written                                    |
//! | 6    | Config file missing or invalid                                 |
//!
//! Codes 3 and 5 mirror the client-error / server-error split an upload
//! handler would make: 3 means fix the file, 5 means fix the machine.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// At least one record's reported tax differs from the recomputed one.
/// Like `diff(1)`, exit 1 means "figures differ."
pub const EXIT_DEVIATIONS: u8 = 1;

/// Usage error - bad arguments. clap uses the same code for parse failures.
pub const EXIT_USAGE: u8 = 2;

/// The file was read but its content was rejected. The message is shown verbatim.
pub const EXIT_REJECTED: u8 = 3;

/// The source file could not be read as a grid.
pub const EXIT_UNREADABLE: u8 = 4;

/// The report workbook could not be produced or saved.
pub const EXIT_WRITE_FAILED: u8 = 5;

/// Config file unreadable, unparsable or out of range.
pub const EXIT_INVALID_CONFIG: u8 = 6;
