//! Legacy database builder
//!
//! Collects `(network, record)` pairs into a [`RadixTree`] and serializes the
//! result in the layout of the selected [`DatabaseVariant`].

use crate::dat::format::DatSerializer;
use crate::dat::types::DatabaseVariant;
use crate::error::Result;
use crate::network::NetworkEntry;
use crate::options::BuildOptions;
use crate::radix_tree::RadixTree;
use crate::records::RecordTuple;
use std::io::{self, Write};

/// One-shot builder for a legacy `.dat` database
pub struct DatBuilder {
    tree: RadixTree,
    options: BuildOptions,
}

impl DatBuilder {
    /// Create a builder, rejecting invalid options up front
    ///
    /// # Example
    /// ```
    /// use geodat::{BuildOptions, DatBuilder, DatabaseVariant};
    /// use geodat::records::AsnRecord;
    ///
    /// let options = BuildOptions::new().with_comment("example");
    /// let mut builder = DatBuilder::new(DatabaseVariant::AsnV4, options)?;
    /// let record = AsnRecord::new(builder.options().encoding, "64496", "Example Net");
    /// builder.add_network("192.0.2.0/24", record.into())?;
    ///
    /// let bytes = builder.build();
    /// assert_eq!(bytes.len(), builder.stats().output_size);
    /// # Ok::<(), geodat::GeoDatError>(())
    /// ```
    pub fn new(variant: DatabaseVariant, options: BuildOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            tree: RadixTree::new(variant),
            options,
        })
    }

    /// Database variant being built
    pub fn variant(&self) -> DatabaseVariant {
        self.tree.variant()
    }

    /// Options in effect
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Insert a parsed network
    pub fn insert(&mut self, network: &NetworkEntry, record: RecordTuple) -> Result<()> {
        self.tree.insert(network, record)
    }

    /// Parse `network` (CIDR or bare address) and insert it
    pub fn add_network(&mut self, network: &str, record: RecordTuple) -> Result<()> {
        let network: NetworkEntry = network.parse()?;
        self.insert(&network, record)
    }

    /// The trie built so far
    pub fn tree(&self) -> &RadixTree {
        &self.tree
    }

    /// Serialize the database
    pub fn build(&self) -> Vec<u8> {
        DatSerializer::new(&self.tree, &self.options).to_bytes()
    }

    /// Serialize the database into `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        DatSerializer::new(&self.tree, &self.options).write_to(writer)
    }

    /// Write a human-readable node table (see [`RadixTree::dump`])
    pub fn dump<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.tree.dump(writer, &self.options)
    }

    /// Get statistics about the builder
    pub fn stats(&self) -> BuilderStats {
        BuilderStats {
            node_count: self.tree.node_count(),
            network_count: self.tree.network_count(),
            distinct_records: self.tree.pool().len(),
            data_size: self.tree.pool().data().len(),
            output_size: DatSerializer::new(&self.tree, &self.options).output_len(),
        }
    }
}

/// Builder statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderStats {
    /// Nodes in the trie, including the root
    pub node_count: usize,
    /// Networks inserted
    pub network_count: u64,
    /// Distinct records after deduplication
    pub distinct_records: usize,
    /// Bytes of encoded records (without the separator)
    pub data_size: usize,
    /// Bytes of the serialized database
    pub output_size: usize,
}
