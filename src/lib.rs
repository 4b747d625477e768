//! geodat - GeoLite2 CSV to legacy GeoIP `.dat` converter
//!
//! Builds the binary radix trie used by legacy GeoIP readers (country, city
//! and ASN editions over IPv4 and IPv6) from network/record pairs, and writes
//! it byte-for-byte in the legacy on-disk layout.
//!
//! # Quick Start
//!
//! ```rust
//! use geodat::{BuildOptions, DatBuilder, DatabaseVariant};
//! use geodat::country_codes::CountryTable;
//! use geodat::records::{CityAttributes, CityRecord};
//!
//! let options = BuildOptions::new().with_comment("example city database");
//! let mut builder = DatBuilder::new(DatabaseVariant::CityV4, options)?;
//!
//! let attrs = CityAttributes {
//!     country_code: "US",
//!     region: "CA",
//!     city: "Mountain View",
//!     postal_code: "94043",
//!     latitude: 37.386,
//!     longitude: -122.0838,
//!     metro_code: 807,
//!     area_code: 0,
//! };
//! let record = CityRecord::new(CountryTable::global(), builder.options().encoding, &attrs);
//! builder.add_network("1.0.0.0/24", record.clone().into())?;
//! builder.add_network("1.0.1.0/24", record.into())?;
//!
//! let bytes = builder.build();
//! assert_eq!(builder.stats().distinct_records, 1);
//! # let tmp_path = std::env::temp_dir().join("geodat_doctest_city.dat");
//! # std::fs::write(&tmp_path, &bytes)?;
//! # let _ = std::fs::remove_file(&tmp_path);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  CSV rows (blocks, locations, FIPS)  │
//! └──────────────────────────────────────┘
//!          ↓ source::RowConverter
//! ┌──────────────────────────────────────┐
//! │  (NetworkEntry, RecordTuple) pairs   │
//! └──────────────────────────────────────┘
//!          ↓ RadixTree::insert + RecordPool
//! ┌──────────────────────────────────────┐
//! │  1. Node table (creation order)      │
//! │  2. Data segment (deduplicated)      │
//! │  3. Comment + edition trailer        │
//! └──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod country_codes;
pub mod dat;
pub mod dat_builder;
pub mod error;
pub mod file_reader;
pub mod network;
pub mod options;
pub mod radix_tree;
pub mod record_pool;
pub mod records;
pub mod source;

// Re-exports for Rust consumers

/// Database builder and its statistics
pub use crate::dat_builder::{BuilderStats, DatBuilder};

/// Database variants
pub use crate::dat::types::{AddressFamily, DatabaseKind, DatabaseVariant};

/// Error type and result alias
pub use crate::error::{GeoDatError, Result};

pub use crate::network::NetworkEntry;
pub use crate::options::{BuildOptions, TextEncoding};
pub use crate::radix_tree::RadixTree;
pub use crate::records::RecordTuple;

/// Version of the geodat library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
