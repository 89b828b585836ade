//! Decoding of raw store values

use crate::traits::RawFields;
use crate::types::Fields;

/// Decode a raw field mapping into text
///
/// Invalid UTF-8 is replaced rather than rejected, a record with one bad
/// byte should still be listable and deletable.
pub fn decode_fields(raw: RawFields) -> Fields {
    raw.into_iter()
        .map(|(name, value)| {
            (
                String::from_utf8_lossy(&name).into_owned(),
                String::from_utf8_lossy(&value).into_owned(),
            )
        })
        .collect()
}
