//! Serialization of mapped rows into the tab-separated bulk-load wire format.
//!
//! The store's bulk-load parser consumes rows separated by newlines, with fields
//! separated by tabs. Delimiter characters appearing inside field data are escaped with a
//! backslash so the framing survives arbitrary values. Substitutions happen in a single
//! pass over the input bytes, which keeps them order-stable: an emitted backslash is
//! never re-examined by a later substitution.

use bytes::{BufMut, BytesMut};

use crate::types::MappedRow;

/// Separator written between the fields of one row.
pub const FIELD_DELIMITER: u8 = b'\t';

/// Terminator written after every row.
pub const ROW_DELIMITER: u8 = b'\n';

/// Appends the escaped wire form of `row` to `buf`.
///
/// Fields are written in order, separated by [`FIELD_DELIMITER`], and the row is
/// terminated with [`ROW_DELIMITER`].
pub fn escape_row_into(buf: &mut BytesMut, row: &MappedRow) {
    for (index, value) in row.values().iter().enumerate() {
        if index > 0 {
            buf.put_u8(FIELD_DELIMITER);
        }
        escape_field_into(buf, value);
    }
    buf.put_u8(ROW_DELIMITER);
}

/// Appends the escaped form of a single field value to `buf`.
///
/// UTF-8 continuation bytes can never collide with the escaped ASCII values, so the
/// byte-wise pass is safe for multi-byte characters.
fn escape_field_into(buf: &mut BytesMut, value: &str) {
    for byte in value.bytes() {
        match byte {
            b'\\' => buf.put_slice(b"\\\\"),
            b'\n' => buf.put_slice(b"\\n"),
            b'\t' => buf.put_slice(b"\\t"),
            _ => buf.put_u8(byte),
        }
    }
}

/// Reverses the escaping applied by [`escape_row_into`] on one field.
///
/// Unknown escape sequences are preserved verbatim, matching the leniency of the store's
/// parser.
pub fn unescape_field(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            unescaped.push(ch);
            continue;
        }

        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some('t') => unescaped.push('\t'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }

    unescaped
}
