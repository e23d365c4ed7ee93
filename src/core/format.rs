//! Purpose: Centralize the dataset format magic and the layout sizes of fixed records.
//! Exports: `FORMAT_MAGIC`, `SUPPORTED_FORMAT_MAGICS`, record length constants, `format_magic_error`.
//! Role: Shared policy for gating on-disk compatibility in the header decoders.
//! Invariants: The supported list is additive; older magics are rejected, never guessed at.
//! Invariants: Record lengths mirror the little-endian layout written by producers.

use crate::core::error::{Error, ErrorKind};

pub const FORMAT_MAGIC: u32 = 0x0400_0000;
pub const SUPPORTED_FORMAT_MAGICS: &[u32] = &[FORMAT_MAGIC];

pub const MAGIC_LEN: usize = 4;
pub const FILE_HEADER_LEN: usize = 56;
pub const TABLE_INDEX_ENTRY_LEN: usize = 16;
pub const TABLE_HEADER_LEN: usize = 56;
pub const TABLE_INFO_LEN: usize = 16;
pub const COLUMN_RECORD_LEN: usize = 12;
pub const FIELD_OFFSET_LEN: usize = 4;

pub fn is_supported_magic(magic: u32) -> bool {
    SUPPORTED_FORMAT_MAGICS.contains(&magic)
}

pub fn format_magic_error(detected: u32) -> Error {
    let supported = SUPPORTED_FORMAT_MAGICS
        .iter()
        .map(|magic| format!("{magic:#010x}"))
        .collect::<Vec<_>>()
        .join(", ");
    Error::new(ErrorKind::UnsupportedFormat)
        .with_message(format!(
            "unsupported dataset magic {detected:#010x} (supported: {supported})"
        ))
        .with_hint("Export the dataset again with a binary serializer that writes format 0x04000000.")
        .with_offset(0)
}
