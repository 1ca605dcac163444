//! Store result codes carried by [`crate::Error::Server`].
//!
//! Values follow the store's wire result codes.

/// Generic server failure.
pub const SERVER_ERROR: i32 = 1;
/// Operation not applicable to the bin's current type.
pub const BIN_TYPE_ERROR: i32 = 12;
/// Request parameters were rejected.
pub const PARAMETER_ERROR: i32 = 4;
/// A UDF raised an error while running.
pub const UDF_BAD_RESPONSE: i32 = 100;
