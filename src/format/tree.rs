//! IPDB Search Tree Traversal
//!
//! The index region is an array of 8-byte nodes. Each node holds two
//! big-endian u32 children, one per address bit:
//! - a child `< node_count` is another node
//! - a child `> node_count` points into the record region
//! - a child `== node_count` is the "no data" marker
//!
//! Every address is walked as if it were 128 bits wide. IPv4 lookups start at
//! the node reached through `::ffff:0:0/96`, computed once per load.

use super::types::{
    read_u32_be, NODE_BYTES, POINTER_BYTES, V4_MAPPED_ONES_FROM, V4_PREFIX_BITS,
};
use crate::error::{IpdbError, Result};
use std::net::IpAddr;

/// Search tree over a borrowed index region
#[derive(Debug, Clone, Copy)]
pub struct SearchTree<'a> {
    /// Index region (exactly `node_count * 8` bytes)
    index: &'a [u8],
    node_count: u32,
    v4_offset: u32,
}

impl<'a> SearchTree<'a> {
    /// Create a search tree and locate the IPv4 subtree
    ///
    /// `payload` is the post-metadata region; only its first `node_count * 8`
    /// bytes are used.
    pub fn new(payload: &'a [u8], node_count: u32) -> Result<Self> {
        let index_size = (node_count as usize)
            .checked_mul(NODE_BYTES)
            .ok_or_else(|| IpdbError::Database("node count overflows".to_string()))?;
        let index = payload.get(..index_size).ok_or_else(|| {
            IpdbError::Database(format!(
                "index region of {} bytes exceeds payload of {} bytes",
                index_size,
                payload.len()
            ))
        })?;

        let mut tree = Self {
            index,
            node_count,
            v4_offset: 0,
        };
        tree.v4_offset = tree.compute_v4_offset()?;
        Ok(tree)
    }

    /// Recreate a tree with an already computed IPv4 start node
    pub(crate) fn with_v4_offset(payload: &'a [u8], node_count: u32, v4_offset: u32) -> Self {
        let index_size = node_count as usize * NODE_BYTES;
        Self {
            index: &payload[..index_size.min(payload.len())],
            node_count,
            v4_offset,
        }
    }

    /// Node where IPv4 lookups begin
    pub fn v4_offset(&self) -> u32 {
        self.v4_offset
    }

    /// Number of nodes in the index
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Walk the 96-bit IPv4-mapped prefix from the root
    ///
    /// Stops early if the walk leaves the index; the value reached is kept as
    /// is (every IPv4 address then shares that terminal).
    fn compute_v4_offset(&self) -> Result<u32> {
        let mut node = 0u32;
        for i in 0..V4_PREFIX_BITS {
            if node >= self.node_count {
                break;
            }
            let bit = u8::from(i >= V4_MAPPED_ONES_FROM);
            node = self.read_node(node, bit)?;
        }
        Ok(node)
    }

    /// Look up an address, returning the terminal record pointer
    pub fn lookup(&self, ip: IpAddr) -> Result<u32> {
        match ip {
            IpAddr::V4(addr) => self.search(&addr.octets(), 32),
            IpAddr::V6(addr) => self.search(&addr.octets(), 128),
        }
    }

    /// Walk `bit_count` bits of `address`, most significant first
    ///
    /// Returns the record pointer (strictly greater than `node_count`) or
    /// `DataNotFound`. A pointer equal to `node_count` is the empty marker.
    pub fn search(&self, address: &[u8], bit_count: usize) -> Result<u32> {
        if address.len() * 8 < bit_count {
            return Err(IpdbError::InvalidAddress(format!(
                "{} bytes cannot hold {} bits",
                address.len(),
                bit_count
            )));
        }

        let mut node = if bit_count == 32 { self.v4_offset } else { 0 };

        for i in 0..bit_count {
            if node >= self.node_count {
                break;
            }
            let bit = (address[i >> 3] >> (7 - (i & 7))) & 1;
            node = self.read_node(node, bit)?;
        }

        if node > self.node_count {
            Ok(node)
        } else {
            Err(IpdbError::DataNotFound)
        }
    }

    /// Read one child pointer of a node
    ///
    /// `branch` 0 follows a zero bit, 1 follows a one bit. The caller keeps
    /// `node < node_count`; anything else is reported, never wrapped.
    fn read_node(&self, node: u32, branch: u8) -> Result<u32> {
        let offset = node as usize * NODE_BYTES + branch as usize * POINTER_BYTES;
        read_u32_be(self.index, offset).ok_or_else(|| {
            IpdbError::Database(format!(
                "node {} branch {} outside index of {} nodes",
                node, branch, self.node_count
            ))
        })
    }
}
