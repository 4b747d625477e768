//! Legacy `.dat` serialization
//!
//! File layout, all integers little-endian:
//!
//! ```text
//! City / ASN                         Country
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ node table (node_count × 6)  │   │ node table (node_count × 6)  │
//! │ separator byte 42            │   │ 00 00 00                     │
//! │ data segment                 │   │ comment                      │
//! │ comment                      │   │ FF FF FF                     │
//! │ FF FF FF                     │   │ edition                      │
//! │ edition                      │   │ node_count (3 bytes)         │
//! │ node_count (3 bytes)         │   └──────────────────────────────┘
//! └──────────────────────────────┘
//! ```
//!
//! Each node is two child records. A child is the index of another node, or
//! one of the leaf encodings below:
//!
//! | child    | City / ASN                | Country                      |
//! |----------|---------------------------|------------------------------|
//! | empty    | `node_count`              | `COUNTRY_BEGIN`              |
//! | data     | `node_count + offset`     | `COUNTRY_BEGIN + country`    |

use super::types::{NodeLayout, COUNTRY_BEGIN, DATA_SEPARATOR, TRAILER_MARKER};
use crate::error::Result;
use crate::options::BuildOptions;
use crate::radix_tree::{NodePointer, RadixTree};
use crate::records::RecordTuple;
use std::io::Write;

/// Append the low `width` bytes of `value` in little-endian order
///
/// Values wider than `width` bytes are truncated.
pub fn push_le(out: &mut Vec<u8>, value: u32, width: usize) {
    debug_assert!(width <= 4);
    out.extend_from_slice(&value.to_le_bytes()[..width]);
}

/// True when `value` fits in `width` bytes
fn fits(value: u64, width: usize) -> bool {
    value < 1u64 << (8 * width)
}

/// Writes a [`RadixTree`] in the legacy layout of its variant
pub struct DatSerializer<'a> {
    tree: &'a RadixTree,
    options: &'a BuildOptions,
    node_count: u32,
}

impl<'a> DatSerializer<'a> {
    /// Prepare to serialize `tree`
    pub fn new(tree: &'a RadixTree, options: &'a BuildOptions) -> Self {
        Self {
            tree,
            options,
            node_count: tree.node_count() as u32,
        }
    }

    /// Number of bytes [`write_to`](Self::write_to) will produce
    pub fn output_len(&self) -> usize {
        let variant = self.tree.variant();
        let nodes = self.tree.node_count() * variant.node_bytes();
        let trailer = self.options.comment.len()
            + TRAILER_MARKER.len()
            + 1
            + variant.segment_record_length();
        match variant.layout() {
            NodeLayout::CountryIndex => nodes + 3 + trailer,
            NodeLayout::DataSegment => nodes + 1 + self.tree.pool().data().len() + trailer,
        }
    }

    /// Numeric value of a child slot
    pub fn pointer_value(&self, pointer: NodePointer) -> u32 {
        match (self.tree.variant().layout(), pointer) {
            (_, NodePointer::Node(id)) => {
                debug_assert!(id < self.node_count, "node {} out of range", id);
                id
            }
            // Same value as country index 0: legacy readers cannot tell
            // "unknown country" from "no data"
            (NodeLayout::CountryIndex, NodePointer::Empty) => COUNTRY_BEGIN,
            (NodeLayout::CountryIndex, NodePointer::Data(id, _)) => {
                let country = match self.tree.pool().get(id) {
                    Some(RecordTuple::Country(record)) => record.country,
                    _ => 0,
                };
                COUNTRY_BEGIN + country as u32
            }
            (NodeLayout::DataSegment, NodePointer::Empty) => self.node_count,
            (NodeLayout::DataSegment, NodePointer::Data(id, _)) => {
                self.node_count.wrapping_add(self.tree.pool().offset(id))
            }
        }
    }

    /// Serialize into a new buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.output_len());
        self.write_nodes(&mut out);
        self.write_tail(&mut out);
        out
    }

    /// Serialize into `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    fn write_nodes(&self, out: &mut Vec<u8>) {
        self.check_widths();

        let width = self.tree.variant().record_length();
        for node in self.tree.nodes() {
            push_le(out, self.pointer_value(node.left), width);
            push_le(out, self.pointer_value(node.right), width);
        }
    }

    /// Everything after the node table
    fn write_tail(&self, out: &mut Vec<u8>) {
        let variant = self.tree.variant();
        match variant.layout() {
            NodeLayout::CountryIndex => {
                out.extend_from_slice(&[0, 0, 0]);
            }
            NodeLayout::DataSegment => {
                out.push(DATA_SEPARATOR);
                out.extend_from_slice(self.tree.pool().data());
            }
        }

        out.extend_from_slice(self.options.comment.as_bytes());
        out.extend_from_slice(&TRAILER_MARKER);
        out.push(variant.edition());
        push_le(out, self.node_count, variant.segment_record_length());
    }

    /// Largest value any child slot can take
    fn max_record_value(&self) -> u64 {
        match self.tree.variant().layout() {
            NodeLayout::CountryIndex => COUNTRY_BEGIN as u64 + u8::MAX as u64,
            NodeLayout::DataSegment => {
                self.node_count as u64 + 1 + self.tree.pool().data().len() as u64
            }
        }
    }

    /// Warn about values that will be truncated on disk
    fn check_widths(&self) {
        let variant = self.tree.variant();
        let node_count = self.node_count as u64;

        if !fits(node_count, variant.segment_record_length()) {
            tracing::warn!(
                node_count,
                segment_record_length = variant.segment_record_length(),
                "too many segments for final segment record size, legacy readers will reject the file"
            );
        }

        let max_value = self.max_record_value();
        if !fits(max_value, variant.record_length()) {
            tracing::warn!(
                max_value,
                record_length = variant.record_length(),
                "record values exceed the node record size and will be truncated"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country_codes::CountryTable;
    use crate::dat::types::DatabaseVariant;
    use crate::network::NetworkEntry;
    use crate::options::TextEncoding;
    use crate::records::{AsnRecord, CountryRecord};

    #[test]
    fn test_push_le_truncates() {
        let mut out = Vec::new();
        push_le(&mut out, 0x0102_0304, 3);
        assert_eq!(out, vec![0x04, 0x03, 0x02]);
    }

    #[test]
    fn test_fits_boundary() {
        assert!(fits((1 << 24) - 1, 3));
        assert!(!fits(1 << 24, 3));
        assert!(fits(u32::MAX as u64, 4));
    }

    #[test]
    fn test_country_values_fit_record_width() {
        for variant in [DatabaseVariant::CountryV4, DatabaseVariant::CountryV6] {
            let tree = RadixTree::new(variant);
            let options = BuildOptions::new();
            let serializer = DatSerializer::new(&tree, &options);
            assert_eq!(serializer.max_record_value(), (1 << 24) - 1);
            assert!(fits(serializer.max_record_value(), variant.record_length()));
        }
    }

    #[test]
    fn test_data_segment_max_value() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        let net: NetworkEntry = "128.0.0.0/1".parse().unwrap();
        tree.insert(&net, AsnRecord::new(TextEncoding::Utf8, "1", "x").into())
            .unwrap();

        let options = BuildOptions::new();
        let serializer = DatSerializer::new(&tree, &options);
        // one node, separator, "AS1 x" + 3 terminator bytes
        assert_eq!(serializer.max_record_value(), 1 + 1 + 8);
        assert!(fits(serializer.max_record_value(), 3));
    }

    #[test]
    fn test_empty_asn_tree() {
        let tree = RadixTree::new(DatabaseVariant::AsnV4);
        let options = BuildOptions::new().with_comment("x");
        let bytes = DatSerializer::new(&tree, &options).to_bytes();
        // root with two empty children (= node_count = 1), separator,
        // comment, marker, edition, node count
        assert_eq!(
            bytes,
            vec![1, 0, 0, 1, 0, 0, 42, b'x', 0xFF, 0xFF, 0xFF, 9, 1, 0, 0]
        );
    }

    #[test]
    fn test_empty_country_tree() {
        let tree = RadixTree::new(DatabaseVariant::CountryV6);
        let options = BuildOptions::new();
        let bytes = DatSerializer::new(&tree, &options).to_bytes();
        // COUNTRY_BEGIN = 0xFFFF00
        assert_eq!(
            bytes,
            vec![0x00, 0xFF, 0xFF, 0x00, 0xFF, 0xFF, 0, 0, 0, 0xFF, 0xFF, 0xFF, 12, 1, 0, 0]
        );
    }

    #[test]
    fn test_pointer_values() {
        let mut tree = RadixTree::new(DatabaseVariant::AsnV4);
        let net: NetworkEntry = "128.0.0.0/1".parse().unwrap();
        let record = AsnRecord::new(TextEncoding::Utf8, "1", "x").into();
        tree.insert(&net, record).unwrap();

        let options = BuildOptions::new();
        let serializer = DatSerializer::new(&tree, &options);
        assert_eq!(serializer.pointer_value(tree.nodes()[0].left), 1);
        assert_eq!(serializer.pointer_value(tree.nodes()[0].right), 2);
        assert_eq!(serializer.output_len(), serializer.to_bytes().len());
    }

    #[test]
    fn test_country_leaf_value() {
        let mut tree = RadixTree::new(DatabaseVariant::CountryV4);
        let net: NetworkEntry = "0.0.0.0/1".parse().unwrap();
        let record = CountryRecord::new(CountryTable::global(), "US").into();
        tree.insert(&net, record).unwrap();

        let options = BuildOptions::new();
        let serializer = DatSerializer::new(&tree, &options);
        assert_eq!(serializer.pointer_value(tree.nodes()[0].left), COUNTRY_BEGIN + 225);
        assert_eq!(serializer.pointer_value(tree.nodes()[0].right), COUNTRY_BEGIN);
    }
}
