//! Database Builder
//!
//! Writes `.ipdb` files: registers fields and languages, maps networks to
//! per-language values, and serializes the header, search tree and record
//! region in one pass. Identical records are stored once.
//!
//! # Example
//! ```
//! use ipdb::{Database, DatabaseBuilder};
//!
//! let mut builder = DatabaseBuilder::new(&["country_name", "city_name"])
//!     .with_language("CN")
//!     .with_language("EN");
//! builder.insert("1.1.1.0/24", &["澳大利亚", "悉尼", "Australia", "Sydney"])?;
//! let bytes = builder.build()?;
//!
//! let db: Database = Database::from_bytes(bytes)?;
//! assert_eq!(db.find_map("1.1.1.1", "EN")?.get("city_name"), Some("Sydney"));
//! # Ok::<(), ipdb::IpdbError>(())
//! ```

mod tree;

pub use tree::TreeBuilder;

use crate::error::{IpdbError, Result};
use crate::format::types::{FIELD_SEPARATOR, IPV4, IPV6};
use crate::format::Metadata;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// One network and its values, language-major
#[derive(Debug, Clone)]
struct Entry {
    addr: IpAddr,
    prefix_len: u8,
    record: String,
}

/// Builder for `.ipdb` databases
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    fields: Vec<String>,
    languages: Vec<String>,
    build_time: Option<i64>,
    ip_version: Option<u16>,
    entries: Vec<Entry>,
}

/// Counts describing a builder's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderStats {
    /// Networks inserted
    pub networks: usize,
    /// IPv4 networks
    pub ipv4_networks: usize,
    /// IPv6 networks
    pub ipv6_networks: usize,
    /// Distinct records after deduplication
    pub unique_records: usize,
}

impl DatabaseBuilder {
    /// Create a builder for the given field names
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            languages: Vec::new(),
            build_time: None,
            ip_version: None,
            entries: Vec::new(),
        }
    }

    /// Register a language; its block follows the previously registered ones
    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.languages.push(code.into());
        self
    }

    /// Set the build timestamp (seconds since the epoch; default: now)
    pub fn with_build_time(mut self, build: i64) -> Self {
        self.build_time = Some(build);
        self
    }

    /// Override the IP version bitmask (default: derived from inserted networks)
    pub fn with_ip_version(mut self, bits: u16) -> Self {
        self.ip_version = Some(bits);
        self
    }

    /// Registered field names
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Registered language codes
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Map a network (`addr` or `addr/prefix`) to values
    ///
    /// `values` holds every field of the first language, then every field of
    /// the second, and so on. Values may not contain tabs or line breaks.
    /// Inserting a network again replaces its earlier values.
    pub fn insert<S: AsRef<str>>(&mut self, network: &str, values: &[S]) -> Result<()> {
        let (addr, prefix_len) = parse_network(network)?;

        let expected = self.fields.len() * self.languages.len();
        if expected == 0 {
            return Err(IpdbError::InvalidEntry(
                "register fields and languages before inserting".to_string(),
            ));
        }
        if values.len() != expected {
            return Err(IpdbError::InvalidEntry(format!(
                "{}: expected {} values ({} fields x {} languages), got {}",
                network,
                expected,
                self.fields.len(),
                self.languages.len(),
                values.len()
            )));
        }

        let mut record = String::new();
        for (i, value) in values.iter().enumerate() {
            let value = value.as_ref();
            if value
                .bytes()
                .any(|b| b == FIELD_SEPARATOR || b == b'\n' || b == b'\r')
            {
                return Err(IpdbError::InvalidEntry(format!(
                    "{}: value {:?} contains a tab or line break",
                    network, value
                )));
            }
            if i > 0 {
                record.push(FIELD_SEPARATOR as char);
            }
            record.push_str(value);
        }
        if record.len() > u16::MAX as usize {
            return Err(IpdbError::InvalidEntry(format!(
                "{}: record of {} bytes exceeds {}",
                network,
                record.len(),
                u16::MAX
            )));
        }

        self.entries.push(Entry {
            addr,
            prefix_len,
            record,
        });
        Ok(())
    }

    /// Counts of inserted networks
    pub fn stats(&self) -> BuilderStats {
        let ipv4_networks = self.entries.iter().filter(|e| e.addr.is_ipv4()).count();
        let unique: FxHashSet<&str> = self.entries.iter().map(|e| e.record.as_str()).collect();
        BuilderStats {
            networks: self.entries.len(),
            ipv4_networks,
            ipv6_networks: self.entries.len() - ipv4_networks,
            unique_records: unique.len(),
        }
    }

    /// Serialize the database
    pub fn build(&self) -> Result<Vec<u8>> {
        self.validate_schema()?;

        // Record offset 0 would encode as the empty marker, so the region
        // opens with an unused zero-length record.
        let mut records: Vec<u8> = vec![0, 0];
        let mut offsets: FxHashMap<&str, u32> = FxHashMap::default();
        let mut tree = TreeBuilder::new();

        for entry in &self.entries {
            let offset = match offsets.get(entry.record.as_str()) {
                Some(&offset) => offset,
                None => {
                    let offset = u32::try_from(records.len()).map_err(|_| {
                        IpdbError::InvalidEntry("record region exceeds 4 GiB".to_string())
                    })?;
                    records.extend_from_slice(&(entry.record.len() as u16).to_be_bytes());
                    records.extend_from_slice(entry.record.as_bytes());
                    offsets.insert(entry.record.as_str(), offset);
                    offset
                }
            };
            tree.insert(entry.addr, entry.prefix_len, offset)?;
        }

        let (index, node_count) = tree.build()?;

        let field_count = self.fields.len();
        let languages: BTreeMap<String, usize> = self
            .languages
            .iter()
            .enumerate()
            .map(|(i, code)| (code.clone(), i * field_count))
            .collect();

        let metadata = Metadata {
            build: self
                .build_time
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            ip_version: self.ip_version.unwrap_or_else(|| self.derived_ip_version()),
            languages,
            node_count,
            total_size: index.len() + records.len(),
            fields: self.fields.clone(),
        };
        let header = serde_json::to_vec(&metadata)
            .map_err(|e| IpdbError::InvalidEntry(format!("failed to encode metadata: {}", e)))?;
        let header_len = u32::try_from(header.len())
            .map_err(|_| IpdbError::InvalidEntry("metadata exceeds 4 GiB".to_string()))?;

        let mut out = Vec::with_capacity(4 + header.len() + metadata.total_size);
        out.extend_from_slice(&header_len.to_be_bytes());
        out.extend_from_slice(&header);
        out.extend_from_slice(&index);
        out.extend_from_slice(&records);
        Ok(out)
    }

    fn validate_schema(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(IpdbError::InvalidEntry("no fields registered".to_string()));
        }
        if self.languages.is_empty() {
            return Err(IpdbError::InvalidEntry("no languages registered".to_string()));
        }

        let mut seen = FxHashSet::default();
        for field in &self.fields {
            if field.is_empty() || !seen.insert(field.as_str()) {
                return Err(IpdbError::InvalidEntry(format!("bad or duplicate field {:?}", field)));
            }
        }
        let mut seen = FxHashSet::default();
        for code in &self.languages {
            if code.is_empty() || !seen.insert(code.as_str()) {
                return Err(IpdbError::InvalidEntry(format!("bad or duplicate language {:?}", code)));
            }
        }
        Ok(())
    }

    fn derived_ip_version(&self) -> u16 {
        self.entries.iter().fold(0, |bits, e| {
            bits | if e.addr.is_ipv4() { IPV4 } else { IPV6 }
        })
    }
}

/// Parse `addr` or `addr/prefix`; a bare address is a host route
pub fn parse_network(network: &str) -> Result<(IpAddr, u8)> {
    let invalid = || IpdbError::InvalidEntry(format!("invalid network {:?}", network));
    let network = network.trim();

    let (addr, prefix_len) = match network.split_once('/') {
        Some((addr, prefix)) => {
            let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
            let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
            (addr, prefix)
        }
        None => {
            let addr: IpAddr = network.parse().map_err(|_| invalid())?;
            (addr, if addr.is_ipv4() { 32 } else { 128 })
        }
    };

    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix_len > max {
        return Err(invalid());
    }
    Ok((addr, prefix_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::types::read_u32_be;

    fn sample() -> DatabaseBuilder {
        DatabaseBuilder::new(&["country_name", "city_name"])
            .with_language("CN")
            .with_language("EN")
            .with_build_time(1_700_000_000)
    }

    #[test]
    fn test_parse_network() {
        assert_eq!(
            parse_network("10.0.0.0/8").unwrap(),
            ("10.0.0.0".parse().unwrap(), 8)
        );
        assert_eq!(parse_network("8.8.8.8").unwrap().1, 32);
        assert_eq!(parse_network("2001:db8::/32").unwrap().1, 32);
        assert_eq!(parse_network("::1").unwrap().1, 128);
        assert!(parse_network("10.0.0.0/33").is_err());
        assert!(parse_network("example.com").is_err());
        assert!(parse_network("10.0.0.0/x").is_err());
    }

    #[test]
    fn test_build_layout() {
        let mut builder = sample();
        builder
            .insert("1.1.1.0/24", &["澳大利亚", "悉尼", "Australia", "Sydney"])
            .unwrap();
        let bytes = builder.build().unwrap();

        let meta_len = read_u32_be(&bytes, 0).unwrap() as usize;
        let (meta, payload) = Metadata::parse(&bytes).unwrap();
        assert_eq!(bytes.len(), 4 + meta_len + meta.total_size);
        assert_eq!(meta.ip_version, IPV4);
        assert_eq!(meta.languages["CN"], 0);
        assert_eq!(meta.languages["EN"], 2);
        assert_eq!(meta.build, 1_700_000_000);
        assert_eq!(payload.len(), meta.total_size);
    }

    #[test]
    fn test_identical_records_are_shared() {
        let mut builder = sample();
        let values = ["中国", "北京", "China", "Beijing"];
        builder.insert("1.0.1.0/24", &values).unwrap();
        builder.insert("1.0.8.0/21", &values).unwrap();
        builder.insert("240e::/20", &values).unwrap();

        let stats = builder.stats();
        assert_eq!(stats.networks, 3);
        assert_eq!(stats.ipv4_networks, 2);
        assert_eq!(stats.ipv6_networks, 1);
        assert_eq!(stats.unique_records, 1);

        let bytes = builder.build().unwrap();
        let (meta, _) = Metadata::parse(&bytes).unwrap();
        let record_len = "中国\t北京\tChina\tBeijing".len();
        assert_eq!(meta.total_size, meta.index_size() + 2 + 2 + record_len);
        assert_eq!(meta.ip_version, IPV4 | IPV6);
    }

    #[test]
    fn test_duplicate_network_last_insert_wins() {
        let mut builder = DatabaseBuilder::new(&["name"]).with_language("EN");
        builder.insert("10.0.0.0/8", &["A"]).unwrap();
        builder.insert("10.1.0.0/16", &["B"]).unwrap();
        builder.insert("10.0.0.0/8", &["C"]).unwrap();

        let db: crate::Database = crate::Database::from_bytes(builder.build().unwrap()).unwrap();
        assert_eq!(&*db.find("10.0.0.1", "EN").unwrap(), &["C"]);
        assert_eq!(&*db.find("10.1.0.1", "EN").unwrap(), &["B"]);
    }

    #[test]
    fn test_wrong_value_count() {
        let mut builder = sample();
        let err = builder.insert("1.1.1.1", &["only", "three", "values"]).unwrap_err();
        assert!(matches!(err, IpdbError::InvalidEntry(_)));
    }

    #[test]
    fn test_separator_in_value() {
        let mut builder = sample();
        assert!(builder.insert("1.1.1.1", &["a\tb", "", "", ""]).is_err());
        assert!(builder.insert("1.1.1.1", &["a", "b\n", "", ""]).is_err());
    }

    #[test]
    fn test_schema_validation() {
        let no_lang = DatabaseBuilder::new(&["a"]);
        assert!(no_lang.build().is_err());

        let dup = DatabaseBuilder::new(&["a", "a"]).with_language("CN");
        assert!(dup.build().is_err());

        let dup_lang = DatabaseBuilder::new(&["a"]).with_language("CN").with_language("CN");
        assert!(dup_lang.build().is_err());
    }

    #[test]
    fn test_ip_version_override() {
        let mut builder = sample().with_ip_version(IPV6);
        builder.insert("1.1.1.1", &["a", "b", "c", "d"]).unwrap();
        let bytes = builder.build().unwrap();
        let (meta, _) = Metadata::parse(&bytes).unwrap();
        assert_eq!(meta.ip_version, IPV6);
    }
}
