//! CLI Exit Code Registry
//!
//! Single source of truth for `pokedex` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error (unspecified)                       |
//! | 2    | Usage error (bad args, bad config file)           |
//! | 3    | Lookup miss (name, number or type not in index)   |
//! | 4    | CSV source rejected (missing column, bad number)  |
//! | 5    | Index database error                              |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (IO, image viewer, ...).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid config file.
pub const EXIT_USAGE: u8 = 2;

/// The requested Pokemon or type is not in the index.
pub const EXIT_NOT_FOUND: u8 = 3;

/// The CSV source could not be loaded; the index was left unchanged.
pub const EXIT_MALFORMED_SOURCE: u8 = 4;

/// SQLite failure opening or querying the index.
pub const EXIT_DATABASE: u8 = 5;
