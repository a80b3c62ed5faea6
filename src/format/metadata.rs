//! IPDB Header Parsing
//!
//! The file starts with a 4-byte big-endian length `L` followed by `L` bytes of
//! JSON metadata. Everything after that (the trie index and the record region)
//! stays in the caller's buffer; parsing only borrows it.
//!
//! ```text
//! [0:4]        u32 metadata length L
//! [4:4+L]      {"build":..,"ip_version":..,"languages":{..},"node_count":..,
//!               "total_size":..,"fields":[..]}
//! [4+L:]       index region + record region (total_size bytes)
//! ```

use super::types::{read_u32_be, IpSupport, METADATA_LENGTH_BYTES, NODE_BYTES};
use crate::error::{IpdbError, Result};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parsed database metadata
///
/// Immutable once loaded. `languages` maps a language code to the index of the
/// first field of that language's block inside every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Build time, seconds since the Unix epoch
    pub build: i64,
    /// Bitmask of supported IP versions (bit 0 = IPv4, bit 1 = IPv6)
    pub ip_version: u16,
    /// Language code -> field offset
    pub languages: BTreeMap<String, usize>,
    /// Number of nodes in the index region
    pub node_count: u32,
    /// Byte length of index region + record region
    pub total_size: usize,
    /// Field names, in record order
    pub fields: Vec<String>,
}

impl Metadata {
    /// Parse the header of a database buffer
    ///
    /// Returns the metadata and a borrowed view of the bytes that follow it
    /// (index region + record region).
    pub fn parse(data: &[u8]) -> Result<(Metadata, &[u8])> {
        let file_size = data.len();
        let meta_len = read_u32_be(data, 0).ok_or(IpdbError::FileSize {
            expected: METADATA_LENGTH_BYTES,
            actual: file_size,
        })? as usize;

        let meta_end = METADATA_LENGTH_BYTES
            .checked_add(meta_len)
            .ok_or_else(|| IpdbError::Metadata(format!("metadata length {} overflows", meta_len)))?;
        if file_size < meta_end {
            return Err(IpdbError::FileSize {
                expected: meta_end,
                actual: file_size,
            });
        }

        let metadata: Metadata = serde_json::from_slice(&data[METADATA_LENGTH_BYTES..meta_end])
            .map_err(|e| IpdbError::Metadata(format!("failed to decode metadata: {}", e)))?;

        if metadata.languages.is_empty() {
            return Err(IpdbError::Metadata("no languages declared".to_string()));
        }
        if metadata.fields.is_empty() {
            return Err(IpdbError::Metadata("no fields declared".to_string()));
        }

        let expected = meta_end
            .checked_add(metadata.total_size)
            .ok_or_else(|| {
                IpdbError::Metadata(format!("total_size {} overflows", metadata.total_size))
            })?;
        if file_size != expected {
            return Err(IpdbError::FileSize {
                expected,
                actual: file_size,
            });
        }

        metadata.validate()?;

        Ok((metadata, &data[meta_end..]))
    }

    /// Structural checks beyond the size invariant
    fn validate(&self) -> Result<()> {
        let index_size = (self.node_count as usize)
            .checked_mul(NODE_BYTES)
            .ok_or_else(|| IpdbError::Metadata("node_count overflows".to_string()))?;
        if index_size > self.total_size {
            return Err(IpdbError::Metadata(format!(
                "index region of {} nodes ({} bytes) exceeds total_size {}",
                self.node_count, index_size, self.total_size
            )));
        }

        let mut seen = FxHashSet::default();
        for field in &self.fields {
            if !seen.insert(field.as_str()) {
                return Err(IpdbError::Metadata(format!("duplicate field '{}'", field)));
            }
        }

        // Language blocks are laid out back to back: 0, F, 2F, ...
        let field_count = self.fields.len();
        let mut offsets: Vec<usize> = self.languages.values().copied().collect();
        offsets.sort_unstable();
        for (block, offset) in offsets.into_iter().enumerate() {
            if offset != block * field_count {
                return Err(IpdbError::Metadata(format!(
                    "language offset {} does not start field block {} (block size {})",
                    offset, block, field_count
                )));
            }
        }

        Ok(())
    }

    /// Supported IP families
    pub fn ip_support(&self) -> IpSupport {
        IpSupport::from_bits(self.ip_version)
    }

    /// Build time as a UTC timestamp (epoch if out of range)
    pub fn build_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.build, 0).unwrap_or_default()
    }

    /// Size of the index region in bytes
    pub fn index_size(&self) -> usize {
        self.node_count as usize * NODE_BYTES
    }
}

/// A supported language: its dense id (used for cache keys) and field offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageSlot {
    /// Position in offset order
    pub id: u16,
    /// Index of the first field of this language inside a record
    pub offset: usize,
}

/// Language lookup table derived from metadata once per load
#[derive(Debug, Clone)]
pub struct LanguageTable {
    slots: FxHashMap<String, LanguageSlot>,
    ordered: Vec<String>,
}

impl LanguageTable {
    /// Build the table, ordering languages by field offset
    ///
    /// Language ids are u16; more than 65,536 languages is a `Metadata` error.
    pub fn new(metadata: &Metadata) -> Result<Self> {
        let mut entries: Vec<(&String, usize)> = metadata
            .languages
            .iter()
            .map(|(code, &offset)| (code, offset))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let mut slots = FxHashMap::default();
        let mut ordered = Vec::with_capacity(entries.len());
        for (id, (code, offset)) in entries.into_iter().enumerate() {
            let id = u16::try_from(id).map_err(|_| {
                IpdbError::Metadata(format!(
                    "{} languages exceed the {} supported",
                    metadata.languages.len(),
                    u16::MAX as usize + 1
                ))
            })?;
            slots.insert(code.clone(), LanguageSlot { id, offset });
            ordered.push(code.clone());
        }

        Ok(Self { slots, ordered })
    }

    /// Look up a language code
    pub fn get(&self, code: &str) -> Option<LanguageSlot> {
        self.slots.get(code).copied()
    }

    /// Language codes ordered by field offset
    pub fn codes(&self) -> &[String] {
        &self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(meta_json: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(meta_json.len() as u32).to_be_bytes());
        out.extend_from_slice(meta_json.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_parse_valid_header() {
        let json = r#"{"build":1700000000,"ip_version":1,"languages":{"CN":0,"EN":2},"node_count":1,"total_size":10,"fields":["country_name","city_name"]}"#;
        let data = encode(json, &[0u8; 10]);

        let (meta, rest) = Metadata::parse(&data).unwrap();
        assert_eq!(meta.node_count, 1);
        assert_eq!(meta.fields, vec!["country_name", "city_name"]);
        assert_eq!(meta.languages["EN"], 2);
        assert_eq!(rest.len(), 10);
        assert!(meta.ip_support().ipv4());
        assert!(!meta.ip_support().ipv6());
        assert_eq!(meta.build_time().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_too_short_for_length_prefix() {
        let err = Metadata::parse(&[0, 0, 1]).unwrap_err();
        assert!(matches!(err, IpdbError::FileSize { .. }));
    }

    #[test]
    fn test_metadata_length_past_end() {
        let mut data = vec![0, 0, 0, 200];
        data.extend_from_slice(b"{}");
        let err = Metadata::parse(&data).unwrap_err();
        assert!(matches!(err, IpdbError::FileSize { expected: 204, .. }));
    }

    #[test]
    fn test_malformed_json() {
        let data = encode("{not json", &[]);
        assert!(matches!(
            Metadata::parse(&data).unwrap_err(),
            IpdbError::Metadata(_)
        ));
    }

    #[test]
    fn test_empty_languages_or_fields() {
        let json = r#"{"build":0,"ip_version":1,"languages":{},"node_count":0,"total_size":0,"fields":["a"]}"#;
        assert!(matches!(
            Metadata::parse(&encode(json, &[])).unwrap_err(),
            IpdbError::Metadata(_)
        ));

        let json = r#"{"build":0,"ip_version":1,"languages":{"CN":0},"node_count":0,"total_size":0,"fields":[]}"#;
        assert!(matches!(
            Metadata::parse(&encode(json, &[])).unwrap_err(),
            IpdbError::Metadata(_)
        ));
    }

    #[test]
    fn test_missing_key_rejected() {
        let json = r#"{"build":0,"languages":{"CN":0},"node_count":0,"total_size":0,"fields":["a"]}"#;
        assert!(matches!(
            Metadata::parse(&encode(json, &[])).unwrap_err(),
            IpdbError::Metadata(_)
        ));
    }

    #[test]
    fn test_total_size_mismatch() {
        let json = r#"{"build":0,"ip_version":1,"languages":{"CN":0},"node_count":0,"total_size":8,"fields":["a"]}"#;
        let err = Metadata::parse(&encode(json, &[0u8; 7])).unwrap_err();
        assert!(matches!(err, IpdbError::FileSize { .. }));

        let err = Metadata::parse(&encode(json, &[0u8; 9])).unwrap_err();
        assert!(matches!(err, IpdbError::FileSize { .. }));
    }

    #[test]
    fn test_index_larger_than_payload() {
        let json = r#"{"build":0,"ip_version":1,"languages":{"CN":0},"node_count":4,"total_size":16,"fields":["a"]}"#;
        let err = Metadata::parse(&encode(json, &[0u8; 16])).unwrap_err();
        assert!(matches!(err, IpdbError::Metadata(_)));
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let json = r#"{"build":0,"ip_version":1,"languages":{"CN":0},"node_count":0,"total_size":0,"fields":["a","a"]}"#;
        assert!(matches!(
            Metadata::parse(&encode(json, &[])).unwrap_err(),
            IpdbError::Metadata(_)
        ));
    }

    #[test]
    fn test_language_blocks_must_be_contiguous() {
        let json = r#"{"build":0,"ip_version":1,"languages":{"CN":0,"EN":3},"node_count":0,"total_size":0,"fields":["a","b"]}"#;
        assert!(matches!(
            Metadata::parse(&encode(json, &[])).unwrap_err(),
            IpdbError::Metadata(_)
        ));
    }

    #[test]
    fn test_language_table_order() {
        let json = r#"{"build":0,"ip_version":1,"languages":{"EN":1,"CN":0},"node_count":0,"total_size":0,"fields":["a"]}"#;
        let data = encode(json, &[]);
        let (meta, _) = Metadata::parse(&data).unwrap();
        let table = LanguageTable::new(&meta).unwrap();

        assert_eq!(table.codes(), &["CN".to_string(), "EN".to_string()]);
        assert_eq!(table.get("EN"), Some(LanguageSlot { id: 1, offset: 1 }));
        assert_eq!(table.get("XX"), None);
    }

    #[test]
    fn test_language_ids_must_fit_u16() {
        let languages = |count: usize| -> BTreeMap<String, usize> {
            (0..count).map(|i| (format!("L{:05}", i), i)).collect()
        };
        let mut meta = Metadata {
            build: 0,
            ip_version: 1,
            languages: languages(u16::MAX as usize + 1),
            node_count: 0,
            total_size: 0,
            fields: vec!["a".to_string()],
        };

        let table = LanguageTable::new(&meta).unwrap();
        assert_eq!(table.get("L65535").map(|slot| slot.id), Some(u16::MAX));

        meta.languages = languages(u16::MAX as usize + 2);
        assert!(matches!(
            LanguageTable::new(&meta).unwrap_err(),
            IpdbError::Metadata(_)
        ));
    }
}
