//! IPDB Format Constants and Small Types

/// Size of the big-endian metadata length prefix at the start of the file
pub const METADATA_LENGTH_BYTES: usize = 4;

/// Size of a trie node: two big-endian u32 child pointers
pub const NODE_BYTES: usize = 8;

/// Size of a single child pointer within a node
pub const POINTER_BYTES: usize = 4;

/// Size of the big-endian length prefix in front of each record
pub const RECORD_LENGTH_BYTES: usize = 2;

/// Number of bits walked from the root to reach the IPv4 subtree (`::ffff:0:0/96`)
pub const V4_PREFIX_BITS: usize = 96;

/// Bits 80..96 of the IPv4-mapped prefix are ones; everything before is zero
pub const V4_MAPPED_ONES_FROM: usize = 80;

/// Field separator inside a record payload
pub const FIELD_SEPARATOR: u8 = b'\t';

/// `ip_version` bit for IPv4 support
pub const IPV4: u16 = 0x01;

/// `ip_version` bit for IPv6 support
pub const IPV6: u16 = 0x02;

/// IP families a database can answer for, decoded from the `ip_version` bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpSupport(u16);

impl IpSupport {
    /// Wrap a raw `ip_version` bitmask
    pub fn from_bits(bits: u16) -> Self {
        IpSupport(bits)
    }

    /// Raw bitmask
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Whether IPv4 lookups are supported
    pub fn ipv4(self) -> bool {
        self.0 & IPV4 == IPV4
    }

    /// Whether IPv6 lookups are supported
    pub fn ipv6(self) -> bool {
        self.0 & IPV6 == IPV6
    }
}

/// Read a big-endian u32 at `offset`, or `None` if it would run past the end
#[inline]
pub(crate) fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = data.get(offset..end)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// Read a big-endian u16 at `offset`, or `None` if it would run past the end
#[inline]
pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    let bytes: [u8; 2] = data.get(offset..end)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}
