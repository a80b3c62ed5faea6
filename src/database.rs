//! Database Handle
//!
//! [`Database`] is the query surface over one `.ipdb` file. It holds the
//! active [`Snapshot`] behind an [`ArcSwap`]: lookups load the pointer without
//! locking, and [`Database::reload`] builds a complete replacement before a
//! single atomic store. Queries already running keep the snapshot they
//! started with.
//!
//! The record type `R` decides what [`Database::find_typed`] returns; the
//! field-value and map forms work for every `R`.
//!
//! # Examples
//!
//! ```no_run
//! use ipdb::{CityDatabase, Database};
//!
//! let db = CityDatabase::open("city.ipdb")?;
//! let city = db.find_typed("1.1.1.1", "CN")?;
//! println!("{} / {}", city.country_name, city.city_name);
//!
//! // Raw access, configured through the opener
//! let raw: Database = Database::opener("city.ipdb")
//!     .cache_capacity(100_000)
//!     .memory_map()
//!     .open()?;
//! let values = raw.find("1.1.1.1", "EN")?;
//! # Ok::<(), ipdb::IpdbError>(())
//! ```

use crate::cache::{CachedValues, DEFAULT_CACHE_CAPACITY};
use crate::error::{IpdbError, Result};
use crate::format::Metadata;
use crate::schema::{FieldMap, Record, Row};
use crate::snapshot::Snapshot;
use crate::storage::DatabaseStorage;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Query and cache counters of a database handle
///
/// Counters survive reloads; they describe the handle, not one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Lookups that reached the search stage
    pub queries: u64,
    /// Lookups that produced a record
    pub found: u64,
    /// Lookups that ended in `DataNotFound`
    pub not_found: u64,
    /// Lookups answered from the cache
    pub cache_hits: u64,
    /// Lookups that had to walk the tree
    pub cache_misses: u64,
}

impl DatabaseStats {
    /// Fraction of cache lookups that hit (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct StatsCounters {
    queries: AtomicU64,
    found: AtomicU64,
    not_found: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StatsCounters {
    fn read(&self) -> DatabaseStats {
        DatabaseStats {
            queries: self.queries.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Options for opening (and later reloading) a database
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Path to the database file (unused when `bytes` is set)
    pub path: PathBuf,
    /// In-memory database bytes
    pub bytes: Option<Vec<u8>>,
    /// LRU capacity per snapshot (0 disables caching)
    pub cache_capacity: usize,
    /// Map plain files instead of reading them
    pub memory_map: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            bytes: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            memory_map: false,
        }
    }
}

/// Builder for opening databases with custom configuration
///
/// Created via [`Database::opener`] or [`Database::from_bytes_builder`].
pub struct DatabaseOpener<R: Record = FieldMap> {
    options: DatabaseOptions,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> DatabaseOpener<R> {
    fn new(options: DatabaseOptions) -> Self {
        Self {
            options,
            _record: PhantomData,
        }
    }

    /// Set LRU cache capacity (default 10,000 entries)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.options.cache_capacity = capacity;
        self
    }

    /// Disable caching entirely
    pub fn no_cache(mut self) -> Self {
        self.options.cache_capacity = 0;
        self
    }

    /// Memory-map the file instead of reading it into the heap
    ///
    /// Ignored for `.gz` files and in-memory bytes.
    ///
    /// The file must not be truncated or modified while any snapshot maps it;
    /// doing so can kill the process with `SIGBUS`. Publish a new version by
    /// writing it elsewhere and renaming it over the old path, then call
    /// [`Database::reload`]. The old snapshot keeps the replaced inode mapped.
    pub fn memory_map(mut self) -> Self {
        self.options.memory_map = true;
        self
    }

    /// Load the database
    pub fn open(self) -> Result<Database<R>> {
        Database::open_with_options(self.options)
    }
}

/// Result of one address in a [`Database::find_batch`] call
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<R> {
    /// Address as given
    pub address: String,
    /// Typed record or the lookup error
    pub result: Result<R>,
}

/// Handle over an atomically replaceable database snapshot
///
/// `Send + Sync`; share it behind an `Arc` or a reference.
pub struct Database<R: Record = FieldMap> {
    current: ArcSwap<Snapshot<R>>,
    options: DatabaseOptions,
    stats: StatsCounters,
}

impl<R: Record> Database<R> {
    /// Open a database file with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::opener(path.as_ref()).open()
    }

    /// Load a database from bytes with default options
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_builder(bytes).open()
    }

    /// Start configuring a database opened from a path
    pub fn opener(path: impl Into<PathBuf>) -> DatabaseOpener<R> {
        DatabaseOpener::new(DatabaseOptions {
            path: path.into(),
            ..Default::default()
        })
    }

    /// Start configuring a database loaded from bytes
    pub fn from_bytes_builder(bytes: Vec<u8>) -> DatabaseOpener<R> {
        DatabaseOpener::new(DatabaseOptions {
            bytes: Some(bytes),
            ..Default::default()
        })
    }

    /// Open with explicit options
    pub fn open_with_options(mut options: DatabaseOptions) -> Result<Self> {
        let snapshot = match options.bytes.take() {
            Some(bytes) => Snapshot::load(DatabaseStorage::Owned(bytes), None, options.cache_capacity)?,
            None => Self::load_path(&options.path, &options)?,
        };

        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            options,
            stats: StatsCounters::default(),
        })
    }

    fn load_path(path: &Path, options: &DatabaseOptions) -> Result<Snapshot<R>> {
        let storage = DatabaseStorage::load(path, options.memory_map)?;
        Snapshot::load(storage, Some(path.to_path_buf()), options.cache_capacity)
    }

    /// Replace the active database with the file at `path`
    ///
    /// The new file is fully loaded and validated before it becomes visible.
    /// On any error the current database, and its cache, stay in place.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let loaded = std::fs::metadata(path)
            .map_err(|e| IpdbError::Read(format!("{}: {}", path.display(), e)))
            .and_then(|_| Self::load_path(path, &self.options));

        match loaded {
            Ok(snapshot) => {
                let build = snapshot.metadata().build_time();
                let previous = self.current.swap(Arc::new(snapshot));
                info!(
                    path = %path.display(),
                    previous_build = %previous.metadata().build_time(),
                    build = %build,
                    "reloaded ipdb database"
                );
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "reload failed, keeping current database");
                Err(e)
            }
        }
    }

    /// Field values of `addr` in `language`, in schema order
    pub fn find(&self, addr: &str, language: &str) -> Result<CachedValues> {
        let ip = parse_address(addr)?;
        let snapshot = self.current.load();
        self.values_in(&snapshot, ip, language)
    }

    /// Field name -> value map of `addr` in `language`
    pub fn find_map(&self, addr: &str, language: &str) -> Result<FieldMap> {
        let ip = parse_address(addr)?;
        let snapshot = self.current.load();
        let values = self.values_in(&snapshot, ip, language)?;
        Ok(FieldMap::from_pairs(&snapshot.metadata().fields, &values))
    }

    /// Typed record of `addr` in `language`
    pub fn find_typed(&self, addr: &str, language: &str) -> Result<R> {
        let ip = parse_address(addr)?;
        let snapshot = self.current.load();
        let values = self.values_in(&snapshot, ip, language)?;
        let row = Row::new(&snapshot.metadata().fields, &values, snapshot.columns());
        Ok(R::from_row(&row))
    }

    /// Typed lookups of many addresses, run on the rayon pool
    ///
    /// Results keep the input order; each address fails independently.
    pub fn find_batch<S>(&self, addrs: &[S], language: &str) -> Vec<BatchResult<R>>
    where
        S: AsRef<str> + Sync,
    {
        addrs
            .par_iter()
            .map(|addr| BatchResult {
                address: addr.as_ref().to_string(),
                result: self.find_typed(addr.as_ref(), language),
            })
            .collect()
    }

    /// Language check, IP-version check, then cached search
    fn values_in(&self, snapshot: &Snapshot<R>, ip: IpAddr, language: &str) -> Result<CachedValues> {
        let slot = snapshot
            .languages()
            .get(language)
            .ok_or_else(|| IpdbError::LanguageNotSupported(language.to_string()))?;

        let support = snapshot.metadata().ip_support();
        match ip {
            IpAddr::V4(_) if !support.ipv4() => return Err(IpdbError::Ipv4NotSupported),
            IpAddr::V6(_) if !support.ipv6() => return Err(IpdbError::Ipv6NotSupported),
            _ => {}
        }

        self.stats.queries.fetch_add(1, Ordering::Relaxed);
        match snapshot.values(ip, slot) {
            Ok((values, hit)) => {
                if snapshot.cache().is_enabled() {
                    let counter = if hit {
                        &self.stats.cache_hits
                    } else {
                        &self.stats.cache_misses
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                self.stats.found.fetch_add(1, Ordering::Relaxed);
                Ok(values)
            }
            Err(e) => {
                if e == IpdbError::DataNotFound {
                    self.stats.not_found.fetch_add(1, Ordering::Relaxed);
                }
                Err(e)
            }
        }
    }

    /// True if the database carries IPv4 data
    pub fn is_ipv4_supported(&self) -> bool {
        self.current.load().metadata().ip_support().ipv4()
    }

    /// True if the database carries IPv6 data
    pub fn is_ipv6_supported(&self) -> bool {
        self.current.load().metadata().ip_support().ipv6()
    }

    /// Supported language codes, ordered by field offset
    pub fn languages(&self) -> Vec<String> {
        self.current.load().languages().codes().to_vec()
    }

    /// Field names in schema order
    pub fn fields(&self) -> Vec<String> {
        self.current.load().metadata().fields.clone()
    }

    /// Build time of the active database
    pub fn build_time(&self) -> DateTime<Utc> {
        self.current.load().metadata().build_time()
    }

    /// Full metadata of the active database
    pub fn metadata(&self) -> Metadata {
        self.current.load().metadata().clone()
    }

    /// Node where IPv4 lookups begin in the active database
    pub fn ipv4_start_node(&self) -> u32 {
        self.current.load().v4_offset()
    }

    /// File the active database was loaded from (`None` for bytes)
    pub fn source_path(&self) -> Option<PathBuf> {
        self.current.load().source().cloned()
    }

    /// Empty the active snapshot's cache
    pub fn clear_cache(&self) {
        let snapshot = self.current.load();
        debug!(entries = snapshot.cache().len(), "clearing query cache");
        snapshot.cache().clear();
    }

    /// Number of cached lookups in the active snapshot
    pub fn cache_len(&self) -> usize {
        self.current.load().cache().len()
    }

    /// Configured cache capacity (0 when disabled)
    pub fn cache_capacity(&self) -> usize {
        self.options.cache_capacity
    }

    /// Query and cache counters since the handle was opened
    pub fn stats(&self) -> DatabaseStats {
        self.stats.read()
    }
}

impl<R: Record> std::fmt::Debug for Database<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("Database")
            .field("source", &snapshot.source())
            .field("build", &snapshot.metadata().build)
            .field("node_count", &snapshot.metadata().node_count)
            .field("cache", snapshot.cache())
            .finish()
    }
}

/// Parse query text, folding IPv4-mapped IPv6 to IPv4
pub fn parse_address(addr: &str) -> Result<IpAddr> {
    let ip: IpAddr = addr
        .parse()
        .map_err(|_| IpdbError::InvalidAddress(addr.to_string()))?;
    Ok(match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    })
}
