//! Legacy GeoIP `.dat` format
//!
//! - **types**: editions, record widths and database variants
//! - **format**: byte layout and serialization of a built trie

pub mod format;
pub mod types;

pub use format::{push_le, DatSerializer};
pub use types::{
    AddressFamily, DatabaseKind, DatabaseVariant, NodeLayout, COUNTRY_BEGIN, DATA_SEPARATOR,
};
