//! IPDB Binary Format Reader
//!
//! An `.ipdb` file is a JSON header followed by a binary trie and a region
//! of length-prefixed, tab-separated records. All integers are big-endian.
//!
//! ```text
//! [0:4]                                u32 metadata length L
//! [4:4+L]                              JSON metadata
//! [4+L : 4+L+node_count*8]             index: node_count x (u32 left, u32 right)
//! [4+L+node_count*8 : 4+L+total_size]  records: {u16 len, len bytes of TSV}
//! ```
//!
//! ## Architecture
//!
//! - **types**: constants and bounds-checked integer reads
//! - **metadata**: header parsing and validation
//! - **tree**: bit-by-bit trie traversal
//! - **record**: pointer resolution and per-language field selection

pub mod metadata;
pub mod record;
pub mod tree;
pub mod types;

pub use metadata::{LanguageSlot, LanguageTable, Metadata};
pub use record::{decode_fields, resolve};
pub use tree::SearchTree;
pub use types::{IpSupport, IPV4, IPV6};
