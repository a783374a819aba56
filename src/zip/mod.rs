//! Minimal ZIP archive writing, built from the format itself.
//!
//! This module produces archives whose entries are STORED (uncompressed),
//! which is all an archive of already-compressed PNG icons needs. No
//! archiving or checksum crate is involved; every header is written field
//! by field.
//!
//! ## Architecture
//!
//! - [`crc32`]: Table-driven CRC-32 with a lazily built, shared table
//! - [`structures`]: ZIP format records (local header, central header, EOCD)
//! - [`writer`]: Entry builder and the streaming [`ZipWriter`]
//! - [`parser`]: Reader used to verify archives after writing
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Limitations
//!
//! - No compression
//! - No ZIP64 extensions (archives and entries stay below 4 GiB)
//! - No multi-disk archives, comments or timestamps

pub mod crc32;
mod parser;
mod structures;
mod writer;

pub use parser::ZipParser;
pub use structures::*;
pub use writer::{
    ArchiveEntry, ArchiveLimits, EntryRecords, ZipWriter, assemble, assemble_with_limits,
    build_entry,
};
