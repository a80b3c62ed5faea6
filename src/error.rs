/// Error types for the ipdb library
use std::fmt;

/// Result type alias for ipdb operations
pub type Result<T> = std::result::Result<T, IpdbError>;

/// Main error type for loading and querying databases
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpdbError {
    /// Query address is not a valid IPv4 or IPv6 address
    InvalidAddress(String),

    /// File length disagrees with the sizes declared in its header
    FileSize {
        /// Size implied by the header (0 when the header itself is truncated)
        expected: usize,
        /// Actual number of bytes available
        actual: usize,
    },

    /// Metadata block is missing, malformed, or inconsistent
    Metadata(String),

    /// The database file could not be read
    Read(String),

    /// Requested language is not present in the database
    LanguageNotSupported(String),

    /// Database does not carry IPv4 data
    Ipv4NotSupported,

    /// Database does not carry IPv6 data
    Ipv6NotSupported,

    /// The address is not covered by any record
    DataNotFound,

    /// Internal offsets point outside the loaded data (corrupt or truncated file)
    Database(String),

    /// Invalid input handed to the database builder
    InvalidEntry(String),
}

impl IpdbError {
    /// True for errors raised while loading a file, as opposed to per-query errors
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            IpdbError::FileSize { .. } | IpdbError::Metadata(_) | IpdbError::Read(_)
        )
    }
}

impl fmt::Display for IpdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpdbError::InvalidAddress(addr) => write!(f, "Invalid IP address: {}", addr),
            IpdbError::FileSize { expected, actual } => write!(
                f,
                "Database file size mismatch: expected {} bytes, found {}",
                expected, actual
            ),
            IpdbError::Metadata(msg) => write!(f, "Invalid metadata: {}", msg),
            IpdbError::Read(msg) => write!(f, "Failed to read database: {}", msg),
            IpdbError::LanguageNotSupported(lang) => {
                write!(f, "Language not supported: {}", lang)
            }
            IpdbError::Ipv4NotSupported => write!(f, "Database does not support IPv4"),
            IpdbError::Ipv6NotSupported => write!(f, "Database does not support IPv6"),
            IpdbError::DataNotFound => write!(f, "No data for address"),
            IpdbError::Database(msg) => write!(f, "Database error: {}", msg),
            IpdbError::InvalidEntry(msg) => write!(f, "Invalid entry: {}", msg),
        }
    }
}

impl std::error::Error for IpdbError {}

impl From<std::io::Error> for IpdbError {
    fn from(err: std::io::Error) -> Self {
        IpdbError::Read(err.to_string())
    }
}
