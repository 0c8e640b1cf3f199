//! Per-service argument files
//!
//! Every managed daemon reads its command-line flags from a plain text file
//! at `$SNAP_DATA/args/<service>`, one directive per line. The store reads
//! and rewrites those files; the codec knows the line format.

pub mod codec;
pub mod store;

pub use store::{ArgumentStore, ServiceArgument};
