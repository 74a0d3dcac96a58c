//! # Variable-Length Number Encoding
//!
//! This module provides the byte-level integer codecs underlying soadb's
//! compact binary serialization format. Four encodings are supported, each
//! exactly invertible over the full unsigned 32-bit range:
//!
//! | Encoding | Layout |
//! |----------|--------|
//! | Seven-bit terminated | `byte = (group & 0x7F) \| (more ? 0x80 : 0)`, LSB group first |
//! | Six-bit terminated | same scheme with 6-bit groups |
//! | Seven-bit fixed | exactly N bytes, 7 payload bits each, no continuation bit |
//! | Int block | `[varint count][count x seven-bit-terminated values]`, count <= 128 |
//!
//! Zero always encodes to a single terminal byte. The six-bit variant exists
//! for byte layouts that reserve the seventh payload bit; it is kept as an
//! independent codec rather than folded into the seven-bit one.
//!
//! [`NumberWriter`] and [`NumberReader`] wrap any `std::io` stream and track
//! `bytes_written` / `bytes_read`, so callers can verify that a round trip
//! consumed exactly what was produced.

pub mod number;

pub use number::{NumberReader, NumberWriter, INT_BLOCK_MAX};
