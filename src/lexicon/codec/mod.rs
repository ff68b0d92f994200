//! Codec layer for record compression and gzip-compressed dumps.
//!
//! # Submodules
//!
//! - [`compression`][]: per-record zlib compression and decompression

pub mod compression;
