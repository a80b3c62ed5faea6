//! Loaded Database Snapshot
//!
//! Everything derived from one file load: the bytes, parsed metadata, the
//! IPv4 start node, language table, column map and a private query cache.
//! A snapshot never changes after construction; reload builds a new one.

use crate::cache::{CacheKey, CachedValues, QueryCache};
use crate::error::Result;
use crate::format::{decode_fields, resolve, LanguageSlot, LanguageTable, Metadata, SearchTree};
use crate::schema::{ColumnMap, Record};
use crate::storage::DatabaseStorage;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

pub(crate) struct Snapshot<R: Record> {
    storage: DatabaseStorage,
    metadata: Metadata,
    /// Offset of the index region within `storage`
    payload_start: usize,
    v4_offset: u32,
    languages: LanguageTable,
    columns: ColumnMap<R>,
    cache: QueryCache,
    source: Option<PathBuf>,
}

impl<R: Record> Snapshot<R> {
    /// Parse and validate a database held in `storage`
    pub(crate) fn load(
        storage: DatabaseStorage,
        source: Option<PathBuf>,
        cache_capacity: usize,
    ) -> Result<Self> {
        let data = storage.as_slice();
        let (metadata, payload) = Metadata::parse(data)?;
        let payload_start = data.len() - payload.len();
        let v4_offset = SearchTree::new(payload, metadata.node_count)?.v4_offset();
        let languages = LanguageTable::new(&metadata)?;
        let columns = ColumnMap::new(&metadata.fields);

        info!(
            source = %source.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<memory>".into()),
            build = %metadata.build_time(),
            node_count = metadata.node_count,
            bytes = data.len(),
            mapped = storage.is_mapped(),
            fields = metadata.fields.len(),
            languages = metadata.languages.len(),
            "loaded ipdb database"
        );

        Ok(Self {
            storage,
            metadata,
            payload_start,
            v4_offset,
            languages,
            columns,
            cache: QueryCache::new(cache_capacity),
            source,
        })
    }

    fn payload(&self) -> &[u8] {
        &self.storage.as_slice()[self.payload_start..]
    }

    fn tree(&self) -> SearchTree<'_> {
        SearchTree::with_v4_offset(self.payload(), self.metadata.node_count, self.v4_offset)
    }

    pub(crate) fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    pub(crate) fn columns(&self) -> &ColumnMap<R> {
        &self.columns
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub(crate) fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub(crate) fn v4_offset(&self) -> u32 {
        self.v4_offset
    }

    /// Search, resolve and decode one language block, bypassing the cache
    pub(crate) fn decode(&self, addr: IpAddr, language: LanguageSlot) -> Result<Vec<String>> {
        let pointer = self.tree().lookup(addr)?;
        let record = resolve(self.payload(), self.metadata.node_count, pointer)?;
        decode_fields(record, language.offset, self.metadata.fields.len())
    }

    /// Cached form of [`Snapshot::decode`]; the flag reports a cache hit
    pub(crate) fn values(&self, addr: IpAddr, language: LanguageSlot) -> Result<(CachedValues, bool)> {
        let key = CacheKey {
            addr,
            language: language.id,
        };
        if let Some(values) = self.cache.get(&key) {
            return Ok((values, true));
        }

        let values: CachedValues = self.decode(addr, language)?.into();
        self.cache.insert(key, values.clone());
        Ok((values, false))
    }
}
