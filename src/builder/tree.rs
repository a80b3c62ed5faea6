//! Search Tree Builder
//!
//! Arena-allocated binary trie over 128-bit addresses, serialized as 8-byte
//! ipdb nodes. IPv4 networks live under `::ffff:0:0/96`, which is where the
//! reader's IPv4 start node points.
//!
//! Overlapping networks resolve to the most specific prefix regardless of
//! insertion order. Re-inserting the same network replaces its record.

use crate::error::{IpdbError, Result};
use crate::format::types::NODE_BYTES;
use std::net::IpAddr;

/// Prefix of the IPv4-mapped block
const V4_MAPPED_BITS: u128 = 0xffff << 32;

/// Tree builder using arena allocation
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Bit 0 child
    left: Link,
    /// Bit 1 child
    right: Link,
}

/// Child link of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Another node
    Node(u32),
    /// Record at this offset of the record region, from a prefix of this length
    Record(u32, u8),
    /// No data
    Empty,
}

impl Node {
    fn empty() -> Self {
        Self {
            left: Link::Empty,
            right: Link::Empty,
        }
    }

    fn child(&self, bit: u8) -> Link {
        if bit == 0 {
            self.left
        } else {
            self.right
        }
    }

    fn set_child(&mut self, bit: u8, link: Link) {
        if bit == 0 {
            self.left = link;
        } else {
            self.right = link;
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Create a builder holding only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::empty()],
        }
    }

    /// Number of nodes allocated so far
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Map a network to a record offset
    ///
    /// `record_offset` is relative to the start of the record region and must
    /// be non-zero (offset 0 would encode as the empty marker).
    pub fn insert(&mut self, addr: IpAddr, prefix_len: u8, record_offset: u32) -> Result<()> {
        if record_offset == 0 {
            return Err(IpdbError::InvalidEntry(
                "record offset 0 is reserved".to_string(),
            ));
        }

        let (bits, depth) = match addr {
            IpAddr::V4(v4) => {
                if prefix_len > 32 {
                    return Err(IpdbError::InvalidEntry(format!(
                        "IPv4 prefix length {} exceeds 32",
                        prefix_len
                    )));
                }
                (V4_MAPPED_BITS | u128::from(u32::from(v4)), 96 + prefix_len)
            }
            IpAddr::V6(v6) => {
                if prefix_len > 128 {
                    return Err(IpdbError::InvalidEntry(format!(
                        "IPv6 prefix length {} exceeds 128",
                        prefix_len
                    )));
                }
                (u128::from(v6), prefix_len)
            }
        };

        self.insert_bits(bits, depth, record_offset);
        Ok(())
    }

    fn insert_bits(&mut self, bits: u128, prefix_len: u8, record_offset: u32) {
        if prefix_len == 0 {
            self.backfill(0, record_offset, 0);
            return;
        }

        let mut node_id = 0usize;
        for depth in 0..prefix_len {
            let bit = ((bits >> (127 - depth)) & 1) as u8;
            let child = self.nodes[node_id].child(bit);

            if depth + 1 == prefix_len {
                match child {
                    Link::Empty => {
                        self.nodes[node_id].set_child(bit, Link::Record(record_offset, prefix_len));
                    }
                    Link::Record(_, existing_len) => {
                        if prefix_len >= existing_len {
                            self.nodes[node_id]
                                .set_child(bit, Link::Record(record_offset, prefix_len));
                        }
                    }
                    // More specific networks already live below: fill the gaps
                    Link::Node(child_id) => self.backfill(child_id as usize, record_offset, prefix_len),
                }
                return;
            }

            node_id = match child {
                Link::Node(child_id) => child_id as usize,
                Link::Empty => {
                    let new_id = self.allocate();
                    self.nodes[node_id].set_child(bit, Link::Node(new_id));
                    new_id as usize
                }
                Link::Record(offset, existing_len) => {
                    // Split a less specific network so the new one can go deeper
                    let new_id = self.allocate();
                    let inherited = Link::Record(offset, existing_len);
                    self.nodes[new_id as usize] = Node {
                        left: inherited,
                        right: inherited,
                    };
                    self.nodes[node_id].set_child(bit, Link::Node(new_id));
                    new_id as usize
                }
            };
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Node::empty());
        id
    }

    /// Point every empty, less specific or same-prefix leaf below `node_id` at
    /// `record_offset`
    fn backfill(&mut self, node_id: usize, record_offset: u32, prefix_len: u8) {
        for bit in 0..2u8 {
            match self.nodes[node_id].child(bit) {
                Link::Empty => {
                    self.nodes[node_id].set_child(bit, Link::Record(record_offset, prefix_len));
                }
                Link::Record(_, existing_len) if prefix_len >= existing_len => {
                    self.nodes[node_id].set_child(bit, Link::Record(record_offset, prefix_len));
                }
                Link::Record(..) => {}
                Link::Node(child_id) => self.backfill(child_id as usize, record_offset, prefix_len),
            }
        }
    }

    /// Serialize the index region
    ///
    /// Returns `(index_bytes, node_count)`.
    pub fn build(&self) -> Result<(Vec<u8>, u32)> {
        let node_count = u32::try_from(self.nodes.len()).map_err(|_| {
            IpdbError::InvalidEntry(format!("{} nodes exceed u32", self.nodes.len()))
        })?;

        let mut index = Vec::with_capacity(self.nodes.len() * NODE_BYTES);
        for node in &self.nodes {
            index.extend_from_slice(&link_value(node.left, node_count)?.to_be_bytes());
            index.extend_from_slice(&link_value(node.right, node_count)?.to_be_bytes());
        }

        Ok((index, node_count))
    }
}

/// On-disk value of a link: node id, `node_count` for empty, or
/// `node_count + offset` for a record
fn link_value(link: Link, node_count: u32) -> Result<u32> {
    match link {
        Link::Empty => Ok(node_count),
        Link::Node(id) => Ok(id),
        Link::Record(offset, _) => node_count.checked_add(offset).ok_or_else(|| {
            IpdbError::InvalidEntry(format!(
                "record offset {} overflows a 32-bit pointer with {} nodes",
                offset, node_count
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SearchTree;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn lookup(builder: &TreeBuilder, addr: &str) -> Option<u32> {
        let (index, node_count) = builder.build().unwrap();
        let tree = SearchTree::new(&index, node_count).unwrap();
        let ip: IpAddr = addr.parse().unwrap();
        tree.lookup(ip).ok().map(|p| p - node_count)
    }

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_empty_tree() {
        let builder = TreeBuilder::new();
        let (index, node_count) = builder.build().unwrap();
        assert_eq!(node_count, 1);
        assert_eq!(index, [0, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_ipv4_lands_under_mapped_prefix() {
        let mut builder = TreeBuilder::new();
        builder.insert(v4(192, 168, 0, 0), 16, 10).unwrap();

        // 96 mapped-prefix nodes plus 16 for the network
        assert_eq!(builder.node_count(), 96 + 16);
        assert_eq!(lookup(&builder, "192.168.44.1"), Some(10));
        assert_eq!(lookup(&builder, "192.169.0.1"), None);

        let (index, node_count) = builder.build().unwrap();
        let tree = SearchTree::new(&index, node_count).unwrap();
        assert_eq!(tree.v4_offset(), 96);
    }

    #[test]
    fn test_more_specific_wins_either_order() {
        let mut forward = TreeBuilder::new();
        forward.insert(v4(10, 0, 0, 0), 8, 100).unwrap();
        forward.insert(v4(10, 1, 0, 0), 16, 200).unwrap();

        let mut reverse = TreeBuilder::new();
        reverse.insert(v4(10, 1, 0, 0), 16, 200).unwrap();
        reverse.insert(v4(10, 0, 0, 0), 8, 100).unwrap();

        for builder in [&forward, &reverse] {
            assert_eq!(lookup(builder, "10.1.2.3"), Some(200));
            assert_eq!(lookup(builder, "10.2.0.1"), Some(100));
            assert_eq!(lookup(builder, "10.0.0.0"), Some(100));
            assert_eq!(lookup(builder, "11.0.0.0"), None);
        }
    }

    #[test]
    fn test_reinserted_network_replaces_record() {
        let mut direct = TreeBuilder::new();
        direct.insert(v4(10, 0, 0, 0), 8, 100).unwrap();
        direct.insert(v4(10, 0, 0, 0), 8, 300).unwrap();

        // A more specific network splits the /8 before it is replaced
        let mut split = TreeBuilder::new();
        split.insert(v4(10, 0, 0, 0), 8, 100).unwrap();
        split.insert(v4(10, 1, 0, 0), 16, 200).unwrap();
        split.insert(v4(10, 0, 0, 0), 8, 300).unwrap();

        assert_eq!(lookup(&direct, "10.0.0.1"), Some(300));
        assert_eq!(lookup(&split, "10.0.0.1"), Some(300));
        assert_eq!(lookup(&split, "10.200.0.1"), Some(300));
        assert_eq!(lookup(&split, "10.1.0.1"), Some(200));
    }

    #[test]
    fn test_reinserted_default_route() {
        let mut builder = TreeBuilder::new();
        let any = IpAddr::V6(Ipv6Addr::UNSPECIFIED);
        builder.insert(any, 0, 3).unwrap();
        builder.insert(v4(1, 0, 0, 0), 8, 5).unwrap();
        builder.insert(any, 0, 9).unwrap();

        assert_eq!(lookup(&builder, "9.9.9.9"), Some(9));
        assert_eq!(lookup(&builder, "1.2.3.4"), Some(5));
    }

    #[test]
    fn test_ipv6_network() {
        let mut builder = TreeBuilder::new();
        let net = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0));
        builder.insert(net, 32, 7).unwrap();

        assert_eq!(lookup(&builder, "2001:db8::1"), Some(7));
        assert_eq!(lookup(&builder, "2001:db9::1"), None);
        // No IPv4 data: the walk to the mapped prefix ends at the empty marker
        assert_eq!(lookup(&builder, "1.2.3.4"), None);
    }

    #[test]
    fn test_default_route() {
        let mut builder = TreeBuilder::new();
        builder.insert(v4(1, 0, 0, 0), 8, 5).unwrap();
        builder
            .insert(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0, 3)
            .unwrap();

        assert_eq!(lookup(&builder, "1.2.3.4"), Some(5));
        assert_eq!(lookup(&builder, "9.9.9.9"), Some(3));
        assert_eq!(lookup(&builder, "ffff::1"), Some(3));
    }

    #[test]
    fn test_invalid_inserts() {
        let mut builder = TreeBuilder::new();
        assert!(builder.insert(v4(1, 1, 1, 1), 33, 2).is_err());
        assert!(builder
            .insert(IpAddr::V6(Ipv6Addr::LOCALHOST), 129, 2)
            .is_err());
        assert!(matches!(
            builder.insert(v4(1, 1, 1, 1), 32, 0).unwrap_err(),
            IpdbError::InvalidEntry(_)
        ));
    }

    #[test]
    fn test_pointer_overflow_is_reported() {
        assert!(link_value(Link::Record(u32::MAX, 8), 2).is_err());
        assert_eq!(link_value(Link::Record(5, 8), 2).unwrap(), 7);
        assert_eq!(link_value(Link::Empty, 2).unwrap(), 2);
    }
}
