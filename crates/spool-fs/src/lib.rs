//! Filesystem layer for spoolsync
//!
//! Everything the synchronization engine does on disk goes through this
//! crate: atomic file writes, content digests for change detection, and
//! suffix-filtered output directory listings.

pub mod digest;
pub mod error;
pub mod io;

pub use digest::{content_digest, file_digest};
pub use error::{Error, Result};
pub use io::{list_files_with_suffixes, read_text, remove_file, write_atomic};
