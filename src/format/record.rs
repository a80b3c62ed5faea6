//! Record Resolution and Field Decoding
//!
//! A terminal pointer `p` from the search tree maps to byte offset
//! `p - node_count + node_count * 8` of the post-metadata region. The record
//! there is a u16 big-endian length followed by tab-separated UTF-8 text:
//! `fields.len()` values per language, language blocks back to back.

use super::types::{read_u16_be, FIELD_SEPARATOR, NODE_BYTES, RECORD_LENGTH_BYTES};
use crate::error::{IpdbError, Result};

/// Resolve a terminal pointer to its raw record payload
///
/// Every offset is checked against `payload` before use; a pointer that lands
/// outside the record region is a `Database` error.
pub fn resolve(payload: &[u8], node_count: u32, pointer: u32) -> Result<&[u8]> {
    let relative = pointer.checked_sub(node_count).ok_or_else(|| {
        IpdbError::Database(format!(
            "pointer {} is below node count {}",
            pointer, node_count
        ))
    })? as usize;

    let resolved = (node_count as usize)
        .checked_mul(NODE_BYTES)
        .and_then(|index_size| index_size.checked_add(relative))
        .ok_or_else(|| IpdbError::Database(format!("pointer {} overflows", pointer)))?;

    let size = read_u16_be(payload, resolved).ok_or_else(|| {
        IpdbError::Database(format!(
            "record offset {} outside data of {} bytes",
            resolved,
            payload.len()
        ))
    })? as usize;

    let start = resolved + RECORD_LENGTH_BYTES;
    let end = start.checked_add(size).ok_or_else(|| {
        IpdbError::Database(format!("record length {} overflows", size))
    })?;

    payload.get(start..end).ok_or_else(|| {
        IpdbError::Database(format!(
            "record [{}, {}) outside data of {} bytes",
            start,
            end,
            payload.len()
        ))
    })
}

/// Select one language's fields out of a record payload
///
/// Splits on tabs and returns tokens `[offset, offset + field_count)`. A record
/// with fewer tokens than the schema declares is a `Database` error.
pub fn decode_fields(record: &[u8], offset: usize, field_count: usize) -> Result<Vec<String>> {
    let wanted_end = offset + field_count;
    let mut values = Vec::with_capacity(field_count);

    let mut token_start = 0usize;
    let mut token_index = 0usize;
    let separators = memchr::memchr_iter(FIELD_SEPARATOR, record).chain(Some(record.len()));

    for token_end in separators {
        if token_index >= wanted_end {
            break;
        }
        if token_index >= offset {
            let token = std::str::from_utf8(&record[token_start..token_end]).map_err(|e| {
                IpdbError::Database(format!("field {} is not valid UTF-8: {}", token_index, e))
            })?;
            values.push(token.to_owned());
        }
        token_start = token_end + 1;
        token_index += 1;
    }

    if values.len() < field_count {
        return Err(IpdbError::Database(format!(
            "record has {} fields, schema needs {}",
            token_index, wanted_end
        )));
    }

    Ok(values)
}
