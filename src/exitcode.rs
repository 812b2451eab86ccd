//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Key has no value (`store get` on an unknown key)
pub const NOT_FOUND: i32 = 1;

/// Data format error (malformed store, invalid catalogue)
pub const DATAERR: i32 = 65;

/// Cannot open input (unresolved page path)
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
