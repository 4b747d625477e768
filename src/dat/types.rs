//! Legacy GeoIP `.dat` type definitions
//!
//! Edition bytes, record widths and the closed set of database variants this
//! crate can produce.

use crate::error::{GeoDatError, Result};
use std::fmt;
use std::str::FromStr;

/// Edition byte of a country database (IPv4)
pub const COUNTRY_EDITION: u8 = 1;
/// Edition byte of a city (revision 1) database (IPv4)
pub const CITY_EDITION_REV1: u8 = 2;
/// Edition byte of an autonomous-system database (IPv4)
pub const ASNUM_EDITION: u8 = 9;
/// Edition byte of a country database (IPv6)
pub const COUNTRY_EDITION_V6: u8 = 12;
/// Edition byte of an autonomous-system database (IPv6)
pub const ASNUM_EDITION_V6: u8 = 21;
/// Edition byte of a city (revision 1) database (IPv6)
pub const CITY_EDITION_REV1_V6: u8 = 30;

/// Width in bytes of one child pointer in the node table
pub const STANDARD_RECORD_LENGTH: usize = 3;
/// Width in bytes of the node count stored in the trailer
pub const SEGMENT_RECORD_LENGTH: usize = 3;

/// Base value for country leaves: `COUNTRY_BEGIN + index` encodes a country
pub const COUNTRY_BEGIN: u32 = 16_776_960;

/// Byte written between the node table and the data segment
pub const DATA_SEPARATOR: u8 = 42;

/// Bytes introducing the edition byte in the trailer
pub const TRAILER_MARKER: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Kind of database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    /// Country code per network
    Country,
    /// Country, region, city, postal code, coordinates, metro code
    City,
    /// `AS<number> <organization>` label per network
    Asn,
}

impl DatabaseKind {
    /// Name used in GeoLite2 CSV file names
    pub fn name(self) -> &'static str {
        match self {
            DatabaseKind::Country => "Country",
            DatabaseKind::City => "City",
            DatabaseKind::Asn => "ASN",
        }
    }

    /// Whether block rows reference a locations table
    pub fn needs_locations(self) -> bool {
        !matches!(self, DatabaseKind::Asn)
    }
}

impl FromStr for DatabaseKind {
    type Err = GeoDatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "country" => Ok(DatabaseKind::Country),
            "city" => Ok(DatabaseKind::City),
            "asn" | "asnum" => Ok(DatabaseKind::Asn),
            _ => Err(GeoDatError::UnsupportedVariant(format!(
                "unknown database kind '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// 32-bit addresses
    V4,
    /// 128-bit addresses (IPv4 networks are embedded at `::/96`)
    V6,
}

impl AddressFamily {
    /// Address width in bits
    pub fn bits(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    /// Name used in GeoLite2 CSV file names
    pub fn name(self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl FromStr for AddressFamily {
    type Err = GeoDatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ipv4" | "v4" | "4" => Ok(AddressFamily::V4),
            "ipv6" | "v6" | "6" => Ok(AddressFamily::V6),
            _ => Err(GeoDatError::UnsupportedVariant(format!(
                "unknown address family '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How data leaves are represented in the node table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLayout {
    /// Leaves hold `COUNTRY_BEGIN + country index`, no data segment
    CountryIndex,
    /// Leaves hold `node_count + offset` into a data segment
    DataSegment,
}

/// One of the six database flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseVariant {
    /// Country, IPv4
    CountryV4,
    /// Country, IPv6
    CountryV6,
    /// City revision 1, IPv4
    CityV4,
    /// City revision 1, IPv6
    CityV6,
    /// Autonomous system, IPv4
    AsnV4,
    /// Autonomous system, IPv6
    AsnV6,
}

impl DatabaseVariant {
    /// All variants
    pub const ALL: [DatabaseVariant; 6] = [
        DatabaseVariant::CountryV4,
        DatabaseVariant::CountryV6,
        DatabaseVariant::CityV4,
        DatabaseVariant::CityV6,
        DatabaseVariant::AsnV4,
        DatabaseVariant::AsnV6,
    ];

    /// Select the variant for a kind and address family
    pub fn new(kind: DatabaseKind, family: AddressFamily) -> Self {
        match (kind, family) {
            (DatabaseKind::Country, AddressFamily::V4) => DatabaseVariant::CountryV4,
            (DatabaseKind::Country, AddressFamily::V6) => DatabaseVariant::CountryV6,
            (DatabaseKind::City, AddressFamily::V4) => DatabaseVariant::CityV4,
            (DatabaseKind::City, AddressFamily::V6) => DatabaseVariant::CityV6,
            (DatabaseKind::Asn, AddressFamily::V4) => DatabaseVariant::AsnV4,
            (DatabaseKind::Asn, AddressFamily::V6) => DatabaseVariant::AsnV6,
        }
    }

    /// Select the variant from textual names such as `("City", "IPv6")`
    pub fn from_names(kind: &str, family: &str) -> Result<Self> {
        Ok(Self::new(kind.parse()?, family.parse()?))
    }

    /// Database kind
    pub fn kind(self) -> DatabaseKind {
        match self {
            DatabaseVariant::CountryV4 | DatabaseVariant::CountryV6 => DatabaseKind::Country,
            DatabaseVariant::CityV4 | DatabaseVariant::CityV6 => DatabaseKind::City,
            DatabaseVariant::AsnV4 | DatabaseVariant::AsnV6 => DatabaseKind::Asn,
        }
    }

    /// Address family
    pub fn family(self) -> AddressFamily {
        match self {
            DatabaseVariant::CountryV4 | DatabaseVariant::CityV4 | DatabaseVariant::AsnV4 => {
                AddressFamily::V4
            }
            DatabaseVariant::CountryV6 | DatabaseVariant::CityV6 | DatabaseVariant::AsnV6 => {
                AddressFamily::V6
            }
        }
    }

    /// Highest address bit tested while descending the trie
    ///
    /// One less than the address width: the last bit of a full-length
    /// network selects the leaf slot rather than a child node.
    pub fn seek_depth(self) -> u8 {
        self.family().bits() - 1
    }

    /// Edition byte written to the trailer
    pub fn edition(self) -> u8 {
        match self {
            DatabaseVariant::CountryV4 => COUNTRY_EDITION,
            DatabaseVariant::CountryV6 => COUNTRY_EDITION_V6,
            DatabaseVariant::CityV4 => CITY_EDITION_REV1,
            DatabaseVariant::CityV6 => CITY_EDITION_REV1_V6,
            DatabaseVariant::AsnV4 => ASNUM_EDITION,
            DatabaseVariant::AsnV6 => ASNUM_EDITION_V6,
        }
    }

    /// Width in bytes of one child pointer
    pub fn record_length(self) -> usize {
        STANDARD_RECORD_LENGTH
    }

    /// Width in bytes of the trailer's node count
    pub fn segment_record_length(self) -> usize {
        SEGMENT_RECORD_LENGTH
    }

    /// Size in bytes of one node (two child pointers)
    pub fn node_bytes(self) -> usize {
        2 * self.record_length()
    }

    /// Leaf representation
    pub fn layout(self) -> NodeLayout {
        match self.kind() {
            DatabaseKind::Country => NodeLayout::CountryIndex,
            DatabaseKind::City | DatabaseKind::Asn => NodeLayout::DataSegment,
        }
    }

    /// File name legacy readers look for by default
    pub fn default_file_name(self) -> &'static str {
        match self {
            DatabaseVariant::CountryV4 => "GeoIP.dat",
            DatabaseVariant::CountryV6 => "GeoIPv6.dat",
            DatabaseVariant::CityV4 => "GeoIPCity.dat",
            DatabaseVariant::CityV6 => "GeoIPCityv6.dat",
            DatabaseVariant::AsnV4 => "GeoIPASNum.dat",
            DatabaseVariant::AsnV6 => "GeoIPASNumv6.dat",
        }
    }
}

impl fmt::Display for DatabaseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind(), self.family())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_depth() {
        assert_eq!(DatabaseVariant::CityV4.seek_depth(), 31);
        assert_eq!(DatabaseVariant::AsnV6.seek_depth(), 127);
    }

    #[test]
    fn test_editions_are_distinct() {
        let mut editions: Vec<u8> = DatabaseVariant::ALL.iter().map(|v| v.edition()).collect();
        editions.sort_unstable();
        editions.dedup();
        assert_eq!(editions.len(), 6);
    }

    #[test]
    fn test_from_names() {
        assert_eq!(
            DatabaseVariant::from_names("City", "IPv6").unwrap(),
            DatabaseVariant::CityV6
        );
        assert_eq!(
            DatabaseVariant::from_names("asn", "ipv4").unwrap(),
            DatabaseVariant::AsnV4
        );
        assert!(DatabaseVariant::from_names("Enterprise", "IPv4").is_err());
        assert!(DatabaseVariant::from_names("City", "IPv5").is_err());
    }

    #[test]
    fn test_layout() {
        assert_eq!(DatabaseVariant::CountryV6.layout(), NodeLayout::CountryIndex);
        assert_eq!(DatabaseVariant::CityV4.layout(), NodeLayout::DataSegment);
        assert_eq!(DatabaseVariant::AsnV4.layout(), NodeLayout::DataSegment);
    }

    #[test]
    fn test_display() {
        assert_eq!(DatabaseVariant::AsnV6.to_string(), "ASN-IPv6");
        assert_eq!(DatabaseVariant::CountryV4.default_file_name(), "GeoIP.dat");
    }
}
