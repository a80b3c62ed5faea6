//! ipdb - Memory-Resident IP Attribute Database
//!
//! Reads `.ipdb` files: a JSON header, a binary search trie over IP address
//! bits, and a region of tab-separated records holding one block of fields
//! per language. A file is loaded once; lookups never touch the disk.
//!
//! # Quick Start
//!
//! ```rust
//! use ipdb::{Database, DatabaseBuilder, CityDatabase};
//!
//! // Build a small database
//! let mut builder = DatabaseBuilder::new(&["country_name", "region_name", "city_name"])
//!     .with_language("CN")
//!     .with_language("EN");
//! builder.insert(
//!     "1.1.1.0/24",
//!     &["澳大利亚", "新南威尔士州", "悉尼", "Australia", "New South Wales", "Sydney"],
//! )?;
//! let bytes = builder.build()?;
//!
//! // Raw field values, in schema order
//! let db: Database = Database::from_bytes(bytes.clone())?;
//! assert_eq!(&*db.find("1.1.1.1", "EN")?, &["Australia", "New South Wales", "Sydney"]);
//!
//! // Typed records
//! let city = CityDatabase::from_bytes(bytes)?;
//! assert_eq!(city.find_typed("1.1.1.1", "CN")?.city_name, "悉尼");
//! # Ok::<(), ipdb::IpdbError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  .ipdb file                          │
//! ├──────────────────────────────────────┤
//! │  u32 header length + JSON metadata   │
//! │  Index: node_count x 8-byte nodes    │
//! │  Records: u16 length + TSV text      │
//! └──────────────────────────────────────┘
//!          ↓ read, gunzip or mmap
//! ┌──────────────────────────────────────┐
//! │  Snapshot (immutable) + LRU cache    │
//! │  swapped atomically on reload        │
//! └──────────────────────────────────────┘
//! ```
//!
//! Lookups check the address, then the language, then IP-version support,
//! then consult the cache before walking the tree.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Database builder (writes `.ipdb` files)
pub mod builder;
/// Query result cache
pub mod cache;
/// Database handle and query API
pub mod database;
/// Error types
pub mod error;
/// Binary format reader
pub mod format;
/// Typed record definitions
pub mod records;
/// Record binding tables
pub mod schema;
mod snapshot;
/// File and memory-map storage
pub mod storage;

// Re-exports for Rust consumers

pub use crate::builder::{parse_network, BuilderStats, DatabaseBuilder};
pub use crate::cache::DEFAULT_CACHE_CAPACITY;
pub use crate::database::{
    parse_address, BatchResult, Database, DatabaseOpener, DatabaseOptions, DatabaseStats,
};
pub use crate::error::{IpdbError, Result};
pub use crate::format::Metadata;
pub use crate::records::{
    AsnInfo, BaseStationDatabase, BaseStationInfo, CityDatabase, CityInfo, DistrictDatabase,
    DistrictInfo, IdcDatabase, IdcInfo, Locality, RiskDatabase, RiskInfo, RISK_LANGUAGE,
};
pub use crate::schema::{FieldBinding, FieldMap, Record};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
