//! Record tuples and their binary encodings
//!
//! A [`RecordTuple`] holds exactly the values that end up on disk: country
//! codes are already resolved to table indexes, text is already encoded and
//! coordinates are already fixed-point. Two tuples are therefore equal if and
//! only if they encode to the same bytes, which is what makes deduplication in
//! the [`RecordPool`](crate::record_pool::RecordPool) correct.

use crate::country_codes::CountryTable;
use crate::dat::format::push_le;
use crate::dat::types::DatabaseKind;
use crate::options::TextEncoding;

/// Fixed-point scale for coordinates (0.0001 degree resolution)
pub const COORDINATE_SCALE: f64 = 10_000.0;

/// Bytes used by each coordinate and by the metro/area field
const FIXED_FIELD_LEN: usize = 3;

/// Region code used when none is known
pub const DEFAULT_REGION: &str = "00";

/// Convert a latitude or longitude to the unsigned 24-bit on-disk value
///
/// The range [-180, 180] maps to [0, 3_600_000].
pub fn coordinate_to_fixed(value: f64) -> u32 {
    ((value + 180.0) * COORDINATE_SCALE).round() as u32
}

/// Inverse of [`coordinate_to_fixed`]
pub fn fixed_to_coordinate(raw: u32) -> f64 {
    raw as f64 / COORDINATE_SCALE - 180.0
}

/// Country database record: only a country index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountryRecord {
    /// Index into the legacy country table
    pub country: u8,
}

impl CountryRecord {
    /// Resolve `country_code` against the country table
    pub fn new(table: &CountryTable, country_code: &str) -> Self {
        Self {
            country: table.index_or_unknown(country_code),
        }
    }
}

/// Attributes of a city record as they come out of the source tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityAttributes<'a> {
    /// ISO country code, or continent code when the country is unknown
    pub country_code: &'a str,
    /// FIPS 10-4 region code
    pub region: &'a str,
    /// City name
    pub city: &'a str,
    /// Postal code
    pub postal_code: &'a str,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// US metro (DMA) code
    pub metro_code: u32,
    /// US telephone area code
    pub area_code: u32,
}

/// City database record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityRecord {
    country: u8,
    region: Vec<u8>,
    city: Vec<u8>,
    postal_code: Vec<u8>,
    latitude: u32,
    longitude: u32,
    metro_area: u32,
}

impl CityRecord {
    /// Normalise attributes into their on-disk form
    pub fn new(table: &CountryTable, encoding: TextEncoding, attrs: &CityAttributes<'_>) -> Self {
        let is_us = attrs.country_code.eq_ignore_ascii_case("us");
        let metro_area = if is_us && (attrs.metro_code != 0 || attrs.area_code != 0) {
            attrs
                .metro_code
                .wrapping_mul(1000)
                .wrapping_add(attrs.area_code)
        } else {
            0
        };

        Self {
            country: table.index_or_unknown(attrs.country_code),
            region: encoding.encode(attrs.region),
            city: encoding.encode(attrs.city),
            postal_code: encoding.encode(attrs.postal_code),
            latitude: coordinate_to_fixed(attrs.latitude),
            longitude: coordinate_to_fixed(attrs.longitude),
            metro_area,
        }
    }

    /// Country table index
    pub fn country(&self) -> u8 {
        self.country
    }

    /// Fixed-point latitude
    pub fn latitude(&self) -> u32 {
        self.latitude
    }

    /// Fixed-point longitude
    pub fn longitude(&self) -> u32 {
        self.longitude
    }

    /// Combined `metro * 1000 + area` value, zero outside the US
    pub fn metro_area(&self) -> u32 {
        self.metro_area
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.country);
        out.extend_from_slice(&self.region);
        out.push(0);
        out.extend_from_slice(&self.city);
        out.push(0);
        out.extend_from_slice(&self.postal_code);
        out.push(0);
        push_le(out, self.latitude, FIXED_FIELD_LEN);
        push_le(out, self.longitude, FIXED_FIELD_LEN);
        push_le(out, self.metro_area, FIXED_FIELD_LEN);
    }

    fn encoded_len(&self) -> usize {
        1 + self.region.len()
            + self.city.len()
            + self.postal_code.len()
            + 3
            + 3 * FIXED_FIELD_LEN
    }
}

/// Autonomous-system database record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsnRecord {
    label: Vec<u8>,
}

impl AsnRecord {
    /// Build the `AS<number> <organization>` label
    pub fn new(encoding: TextEncoding, number: &str, organization: &str) -> Self {
        Self {
            label: encoding.encode(&format!("AS{} {}", number, organization)),
        }
    }

    /// Encoded label without the terminator
    pub fn label(&self) -> &[u8] {
        &self.label
    }
}

/// Canonical attribute tuple of one network
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordTuple {
    /// Country database record
    Country(CountryRecord),
    /// City database record
    City(CityRecord),
    /// Autonomous-system database record
    Asn(AsnRecord),
}

impl RecordTuple {
    /// Database kind this record belongs to
    pub fn kind(&self) -> DatabaseKind {
        match self {
            RecordTuple::Country(_) => DatabaseKind::Country,
            RecordTuple::City(_) => DatabaseKind::City,
            RecordTuple::Asn(_) => DatabaseKind::Asn,
        }
    }

    /// Append the data-segment encoding to `out`
    ///
    /// Country records live in the node table and encode to nothing.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RecordTuple::Country(_) => {}
            RecordTuple::City(city) => city.encode_into(out),
            RecordTuple::Asn(asn) => {
                out.extend_from_slice(&asn.label);
                out.extend_from_slice(&[0, 0, 0]);
            }
        }
    }

    /// Data-segment encoding as a new buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Length of the data-segment encoding
    pub fn encoded_len(&self) -> usize {
        match self {
            RecordTuple::Country(_) => 0,
            RecordTuple::City(city) => city.encoded_len(),
            RecordTuple::Asn(asn) => asn.label.len() + 3,
        }
    }
}

impl From<CountryRecord> for RecordTuple {
    fn from(record: CountryRecord) -> Self {
        RecordTuple::Country(record)
    }
}

impl From<CityRecord> for RecordTuple {
    fn from(record: CityRecord) -> Self {
        RecordTuple::City(record)
    }
}

impl From<AsnRecord> for RecordTuple {
    fn from(record: AsnRecord) -> Self {
        RecordTuple::Asn(record)
    }
}
