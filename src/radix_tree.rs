//! Network radix trie for legacy `.dat` databases
//!
//! A binary trie over the address space. Nodes live in a flat arena and are
//! addressed by their creation index, which is also their position in the
//! serialized node table: the root is node 0 and every new node takes the
//! next index.
//!
//! Unlike a plain prefix trie, a network's leaf is stored one level above the
//! network's last bit: the parent at depth `prefix_len - 1` holds the record
//! directly in its left or right slot.

use crate::dat::format::DatSerializer;
use crate::dat::types::{AddressFamily, DatabaseVariant};
use crate::error::{GeoDatError, Result};
use crate::network::NetworkEntry;
use crate::options::BuildOptions;
use crate::record_pool::{RecordId, RecordPool};
use crate::records::RecordTuple;
use std::io::{self, Write};

/// Index of a node in the arena
pub type NodeIndex = u32;

/// Child slot of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePointer {
    /// No network covers this half of the subtree
    Empty,
    /// Internal node
    Node(NodeIndex),
    /// Record leaf (record id, prefix length of the network that set it)
    ///
    /// The prefix length only matters while building: it decides whether an
    /// overlapping network replaces the leaf. It is not serialized.
    Data(RecordId, u8),
}

/// A node in the trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Child for address bit 0
    pub left: NodePointer,
    /// Child for address bit 1
    pub right: NodePointer,
}

impl Node {
    fn new_empty() -> Self {
        Self {
            left: NodePointer::Empty,
            right: NodePointer::Empty,
        }
    }

    fn child(&self, bit: u8) -> NodePointer {
        if bit == 0 {
            self.left
        } else {
            self.right
        }
    }

    fn set_child(&mut self, bit: u8, pointer: NodePointer) {
        if bit == 0 {
            self.left = pointer;
        } else {
            self.right = pointer;
        }
    }
}

/// Radix trie plus the pool of records its leaves reference
#[derive(Debug, Clone)]
pub struct RadixTree {
    variant: DatabaseVariant,
    /// All nodes in creation order (arena)
    nodes: Vec<Node>,
    pool: RecordPool,
    network_count: u64,
}

impl RadixTree {
    /// Create a tree holding only the root node
    pub fn new(variant: DatabaseVariant) -> Self {
        Self {
            variant,
            nodes: vec![Node::new_empty()],
            pool: RecordPool::new(),
            network_count: 0,
        }
    }

    /// Insert a network with its record
    ///
    /// Re-inserting a network replaces its record. An IPv4 network in an IPv6
    /// tree is stored at `::a.b.c.d/(96 + prefix)`.
    pub fn insert(&mut self, network: &NetworkEntry, record: RecordTuple) -> Result<()> {
        if record.kind() != self.variant.kind() {
            return Err(GeoDatError::RecordKindMismatch {
                record: record.kind().name(),
                variant: self.variant.to_string(),
            });
        }

        let prefix_len = match (network.family(), self.variant.family()) {
            (AddressFamily::V4, AddressFamily::V4) | (AddressFamily::V6, AddressFamily::V6) => {
                network.prefix_len
            }
            (AddressFamily::V4, AddressFamily::V6) => network.prefix_len + 96,
            (AddressFamily::V6, AddressFamily::V4) => {
                return Err(GeoDatError::AddressFamilyMismatch {
                    network: network.to_string(),
                    family: AddressFamily::V4.name(),
                });
            }
        };

        let record_id = self.pool.insert(record);
        self.network_count += 1;
        self.insert_bits(network.bits(), prefix_len, record_id);
        Ok(())
    }

    /// Walk `prefix_len - 1` levels from the seek depth down, then set the leaf
    fn insert_bits(&mut self, bits: u128, prefix_len: u8, record_id: RecordId) {
        let seek_depth = self.variant.seek_depth() as u32;
        let levels = prefix_len.saturating_sub(1) as u32;
        let mut node_id: NodeIndex = 0;

        for level in 0..levels {
            let bit = bit_at(bits, seek_depth - level);
            node_id = match self.nodes[node_id as usize].child(bit) {
                NodePointer::Node(child_id) => child_id,
                NodePointer::Empty => {
                    let new_id = self.allocate_node();
                    self.nodes[node_id as usize].set_child(bit, NodePointer::Node(new_id));
                    new_id
                }
                NodePointer::Data(existing_id, existing_prefix) => {
                    // A less specific network already covers this path: split
                    // its leaf so both halves keep pointing at it.
                    let new_id = self.allocate_node();
                    let existing = NodePointer::Data(existing_id, existing_prefix);
                    self.nodes[new_id as usize] = Node {
                        left: existing,
                        right: existing,
                    };
                    self.nodes[node_id as usize].set_child(bit, NodePointer::Node(new_id));
                    new_id
                }
            };
        }

        // Prefix 0 tests a bit above the address, which is always 0
        let bit = bit_at(bits, seek_depth + 1 - prefix_len as u32);
        let leaf = NodePointer::Data(record_id, prefix_len);
        match self.nodes[node_id as usize].child(bit) {
            NodePointer::Empty => self.nodes[node_id as usize].set_child(bit, leaf),
            NodePointer::Data(_, existing_prefix) => {
                if prefix_len >= existing_prefix {
                    self.nodes[node_id as usize].set_child(bit, leaf);
                }
            }
            NodePointer::Node(child_id) => {
                // More specific networks were inserted first
                self.backfill_less_specific(child_id, record_id, prefix_len);
            }
        }
    }

    /// Allocate a new node and return its index
    fn allocate_node(&mut self) -> NodeIndex {
        let id = self.nodes.len() as NodeIndex;
        self.nodes.push(Node::new_empty());
        id
    }

    /// Fill empty, less specific and same-prefix slots of a subtree with `record_id`
    ///
    /// Same-prefix slots are copies of this network pushed down by a more
    /// specific insert, so overwriting them keeps re-inserts last-write-wins.
    fn backfill_less_specific(&mut self, node_id: NodeIndex, record_id: RecordId, prefix_len: u8) {
        for bit in [0u8, 1] {
            match self.nodes[node_id as usize].child(bit) {
                NodePointer::Empty => {
                    self.nodes[node_id as usize]
                        .set_child(bit, NodePointer::Data(record_id, prefix_len));
                }
                NodePointer::Data(_, existing_prefix) => {
                    if prefix_len >= existing_prefix {
                        self.nodes[node_id as usize]
                            .set_child(bit, NodePointer::Data(record_id, prefix_len));
                    }
                }
                NodePointer::Node(child_id) => {
                    self.backfill_less_specific(child_id, record_id, prefix_len);
                }
            }
        }
    }

    /// Database variant this tree is built for
    pub fn variant(&self) -> DatabaseVariant {
        self.variant
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of `insert` calls that succeeded
    pub fn network_count(&self) -> u64 {
        self.network_count
    }

    /// Deduplicated records referenced by the leaves
    pub fn pool(&self) -> &RecordPool {
        &self.pool
    }

    /// Write one line per node: `index [left, right]`
    ///
    /// Empty children print as `--`, internal children as their index and
    /// data leaves as their serialized value followed by the record.
    pub fn dump<W: Write>(&self, out: &mut W, options: &BuildOptions) -> io::Result<()> {
        let serializer = DatSerializer::new(self, options);
        for (index, node) in self.nodes.iter().enumerate() {
            writeln!(
                out,
                "{} [{}, {}]",
                index,
                self.dump_pointer(&serializer, node.left),
                self.dump_pointer(&serializer, node.right)
            )?;
        }
        Ok(())
    }

    fn dump_pointer(&self, serializer: &DatSerializer<'_>, pointer: NodePointer) -> String {
        match pointer {
            NodePointer::Empty => "--".to_string(),
            NodePointer::Node(id) => id.to_string(),
            NodePointer::Data(id, _) => match self.pool.get(id) {
                Some(record) => format!("{} {:?}", serializer.pointer_value(pointer), record),
                None => serializer.pointer_value(pointer).to_string(),
            },
        }
    }
}

/// Address bit at `depth` (0 = least significant); bits past the top are 0
fn bit_at(bits: u128, depth: u32) -> u8 {
    bits.checked_shr(depth).map_or(0, |v| (v & 1) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country_codes::CountryTable;
    use crate::options::TextEncoding;
    use crate::records::{AsnRecord, CountryRecord};

    fn asn(number: &str) -> RecordTuple {
        AsnRecord::new(TextEncoding::Utf8, number, "Example").into()
    }

    fn net(s: &str) -> NetworkEntry {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree = RadixTree::new(DatabaseVariant::AsnV4);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.nodes()[0], Node::new_empty());
    }

    #[test]
    fn test_bit_at() {
        assert_eq!(bit_at(0x8000_0000, 31), 1);
        assert_eq!(bit_at(0x8000_0000, 30), 0);
        assert_eq!(bit_at(u128::MAX, 127), 1);
        assert_eq!(bit_at(u128::MAX, 128), 0);
    }

    #[test]
    fn test_slash_24_allocates_24_nodes() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("1.0.0.0/24"), asn("1")).unwrap();
        // root + one node for each of the 23 levels below it
        assert_eq!(tree.node_count(), 24);
        let last = tree.nodes()[23];
        assert_eq!(last.left, NodePointer::Data(0, 24));
        assert_eq!(last.right, NodePointer::Empty);
    }

    #[test]
    fn test_node_indices_follow_creation_order() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("128.0.0.0/3"), asn("1")).unwrap();
        // 128 = 100..., descend bits 31 (1) and 30 (0), leaf on bit 29 (0)
        assert_eq!(tree.nodes()[0].right, NodePointer::Node(1));
        assert_eq!(tree.nodes()[1].left, NodePointer::Node(2));
        assert_eq!(tree.nodes()[2].left, NodePointer::Data(0, 3));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut once = RadixTree::new(DatabaseVariant::AsnV4);
        once.insert(&net("10.0.0.0/8"), asn("1")).unwrap();

        let mut twice = RadixTree::new(DatabaseVariant::AsnV4);
        twice.insert(&net("10.0.0.0/8"), asn("1")).unwrap();
        twice.insert(&net("10.0.0.0/8"), asn("1")).unwrap();

        assert_eq!(once.nodes(), twice.nodes());
        assert_eq!(twice.pool().len(), 1);
    }

    #[test]
    fn test_reinsert_last_write_wins() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("10.0.0.0/8"), asn("1")).unwrap();
        let count = tree.node_count();
        tree.insert(&net("10.0.0.0/8"), asn("2")).unwrap();
        assert_eq!(tree.node_count(), count);
        assert_eq!(tree.nodes()[count - 1].left, NodePointer::Data(1, 8));
    }

    #[test]
    fn test_shared_prefix() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("10.0.0.0/8"), asn("1")).unwrap();
        assert_eq!(tree.node_count(), 8);
        tree.insert(&net("10.1.0.0/16"), asn("2")).unwrap();
        // 7 nodes below the root are shared; the /16 adds 8 of its own
        assert_eq!(tree.node_count(), 16);
    }

    #[test]
    fn test_more_specific_splits_leaf() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("10.0.0.0/8"), asn("1")).unwrap();
        tree.insert(&net("10.1.0.0/16"), asn("2")).unwrap();
        // The node replacing the /8 leaf keeps it on its other half
        let split = tree.nodes()[8];
        assert_eq!(split.right, NodePointer::Data(0, 8));
        assert_eq!(split.left, NodePointer::Node(9));
    }

    #[test]
    fn test_less_specific_backfills() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("10.1.0.0/16"), asn("2")).unwrap();
        tree.insert(&net("10.0.0.0/8"), asn("1")).unwrap();
        assert_eq!(tree.node_count(), 16);
        // 10.1/16 ends in bit 16 = 1, so its leaf is on the right of node 15
        let last = tree.nodes()[15];
        assert_eq!(last.right, NodePointer::Data(0, 16));
        assert_eq!(last.left, NodePointer::Data(1, 8));
        assert_eq!(tree.nodes()[8].left, NodePointer::Node(9));
        assert_eq!(tree.nodes()[8].right, NodePointer::Data(1, 8));
    }

    #[test]
    fn test_reinsert_after_split_overwrites_copies() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("10.0.0.0/8"), asn("1")).unwrap();
        tree.insert(&net("10.1.0.0/16"), asn("2")).unwrap();
        tree.insert(&net("10.0.0.0/8"), asn("3")).unwrap();
        assert_eq!(tree.node_count(), 16);
        // Every pushed-down copy of the /8 now carries the new record
        assert_eq!(tree.nodes()[8].right, NodePointer::Data(2, 8));
        assert_eq!(tree.nodes()[15].left, NodePointer::Data(2, 8));
        assert_eq!(tree.nodes()[15].right, NodePointer::Data(1, 16));
        for node in tree.nodes() {
            for child in [node.left, node.right] {
                assert_ne!(child, NodePointer::Data(0, 8));
            }
        }
    }

    #[test]
    fn test_full_length_network() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("0.0.0.1/32"), asn("1")).unwrap();
        assert_eq!(tree.node_count(), 32);
        assert_eq!(tree.nodes()[31].right, NodePointer::Data(0, 32));
    }

    #[test]
    fn test_short_prefixes_land_at_root() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("128.0.0.0/1"), asn("1")).unwrap();
        tree.insert(&net("0.0.0.0/0"), asn("0")).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.nodes()[0].right, NodePointer::Data(0, 1));
        assert_eq!(tree.nodes()[0].left, NodePointer::Data(1, 0));
    }

    #[test]
    fn test_ipv4_in_ipv6_tree() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV6);
        tree.insert(&net("1.0.0.0/24"), asn("1")).unwrap();
        assert_eq!(tree.node_count(), 120);
    }

    #[test]
    fn test_ipv6_in_ipv4_tree_fails() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        let result = tree.insert(&net("2001:db8::/32"), asn("1"));
        assert!(matches!(result, Err(GeoDatError::AddressFamilyMismatch { .. })));
        assert_eq!(tree.network_count(), 0);
        assert!(tree.pool().is_empty());
    }

    #[test]
    fn test_record_kind_must_match() {
        let mut tree = RadixTree::new(DatabaseVariant::CityV4);
        let record = CountryRecord::new(CountryTable::global(), "US").into();
        let result = tree.insert(&net("1.0.0.0/24"), record);
        assert!(matches!(result, Err(GeoDatError::RecordKindMismatch { .. })));
    }

    #[test]
    fn test_dump() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        tree.insert(&net("128.0.0.0/2"), asn("7")).unwrap();
        let mut out = Vec::new();
        tree.dump(&mut out, &BuildOptions::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0 [--, 1]");
        assert!(lines[1].starts_with("1 [3 Asn("), "unexpected dump: {}", lines[1]);
        assert!(lines[1].ends_with(", --]"));
    }
}
