//! GeoLite2 CSV rows and their conversion into records
//!
//! Row types deserialize straight from the GeoLite2 CSV headers (extra
//! columns are ignored, missing ones default to empty). [`RowConverter`]
//! turns block rows into `(network, record)` pairs ready for insertion.

use crate::country_codes::CountryTable;
use crate::dat::types::{AddressFamily, DatabaseKind};
use crate::error::Result;
use crate::network::NetworkEntry;
use crate::options::BuildOptions;
use crate::records::{
    AsnRecord, CityAttributes, CityRecord, CountryRecord, RecordTuple, DEFAULT_REGION,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Continent codes the legacy format spells differently
pub const CONTINENT_REMAP: [(&str, &str); 1] = [("AS", "AP")];

/// Kind and family named by a blocks table stem
///
/// Recognizes `GeoLite2-<Kind>-Blocks-<Family>` and `GeoIP2-<Kind>-Blocks-<Family>`.
///
/// ```
/// use geodat::source::parse_blocks_name;
/// use geodat::{AddressFamily, DatabaseKind};
///
/// assert_eq!(
///     parse_blocks_name("GeoLite2-City-Blocks-IPv6"),
///     Some((DatabaseKind::City, AddressFamily::V6))
/// );
/// assert_eq!(parse_blocks_name("blocks"), None);
/// ```
pub fn parse_blocks_name(stem: &str) -> Option<(DatabaseKind, AddressFamily)> {
    let rest = stem
        .strip_prefix("GeoLite2-")
        .or_else(|| stem.strip_prefix("GeoIP2-"))?;
    let (kind, family) = rest.split_once("-Blocks-")?;
    Some((kind.parse().ok()?, family.parse().ok()?))
}

/// Row of a `*-Locations-<lang>.csv` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocationRow {
    /// Location id referenced by block rows
    pub geoname_id: String,
    /// Two-letter continent code
    pub continent_code: String,
    /// ISO 3166 country code (may be empty)
    pub country_iso_code: String,
    /// First-level subdivision name
    pub subdivision_1_name: String,
    /// City name
    pub city_name: String,
    /// US metro code
    pub metro_code: String,
}

/// Row of a `GeoLite2-Country-Blocks-*.csv` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CountryBlockRow {
    /// CIDR network
    pub network: String,
    /// Location id
    pub geoname_id: String,
}

/// Row of a `GeoLite2-City-Blocks-*.csv` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CityBlockRow {
    /// CIDR network
    pub network: String,
    /// Location id
    pub geoname_id: String,
    /// Postal code
    pub postal_code: String,
    /// Latitude in degrees
    pub latitude: String,
    /// Longitude in degrees
    pub longitude: String,
}

/// Row of a `GeoLite2-ASN-Blocks-*.csv` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AsnBlockRow {
    /// CIDR network
    pub network: String,
    /// AS number
    pub autonomous_system_number: String,
    /// Organization name
    pub autonomous_system_organization: String,
}

/// Row of the `geoname_id,region` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegionRow {
    /// Location id
    pub geoname_id: String,
    /// FIPS 10-4 region code
    pub region: String,
}

/// Locations indexed by `geoname_id`
#[derive(Debug, Clone, Default)]
pub struct Locations {
    by_id: FxHashMap<String, LocationRow>,
}

impl Locations {
    /// Index rows, remapping continent codes on the way
    pub fn from_rows<I: IntoIterator<Item = LocationRow>>(rows: I) -> Self {
        let by_id = rows
            .into_iter()
            .map(|mut row| {
                if let Some((_, legacy)) = CONTINENT_REMAP
                    .iter()
                    .find(|(code, _)| *code == row.continent_code)
                {
                    row.continent_code = legacy.to_string();
                }
                (row.geoname_id.clone(), row)
            })
            .collect();
        Self { by_id }
    }

    /// Location for a `geoname_id`
    pub fn get(&self, geoname_id: &str) -> Option<&LocationRow> {
        self.by_id.get(geoname_id)
    }

    /// Number of locations
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when no location was loaded
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// `geoname_id` to FIPS region code
#[derive(Debug, Clone, Default)]
pub struct RegionCodes {
    by_id: FxHashMap<String, String>,
}

impl RegionCodes {
    /// Index rows
    pub fn from_rows<I: IntoIterator<Item = RegionRow>>(rows: I) -> Self {
        Self {
            by_id: rows.into_iter().map(|r| (r.geoname_id, r.region)).collect(),
        }
    }

    /// Region code for a `geoname_id`
    pub fn get(&self, geoname_id: &str) -> Option<&str> {
        self.by_id.get(geoname_id).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when the table is empty
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Counters for rows that needed a fallback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Block rows whose location is unknown
    pub skipped_rows: u64,
    /// City rows without a region code
    pub missing_regions: u64,
}

/// Converts block rows into `(network, record)` pairs
pub struct RowConverter<'a> {
    table: &'a CountryTable,
    options: &'a BuildOptions,
    locations: &'a Locations,
    regions: &'a RegionCodes,
    stats: ConversionStats,
}

impl<'a> RowConverter<'a> {
    /// Create a converter over the lookup tables
    pub fn new(options: &'a BuildOptions, locations: &'a Locations, regions: &'a RegionCodes) -> Self {
        Self {
            table: CountryTable::global(),
            options,
            locations,
            regions,
            stats: ConversionStats::default(),
        }
    }

    /// Fallback counters so far
    pub fn stats(&self) -> ConversionStats {
        self.stats
    }

    /// Country record for a block row, `None` if its location is unknown
    pub fn country(&mut self, row: &CountryBlockRow) -> Result<Option<(NetworkEntry, RecordTuple)>> {
        let network: NetworkEntry = row.network.parse()?;
        let Some(location) = self.location(&row.geoname_id, &network) else {
            return Ok(None);
        };

        let record = CountryRecord::new(self.table, country_code(location));
        Ok(Some((network, record.into())))
    }

    /// City record for a block row, `None` if its location is unknown
    pub fn city(&mut self, row: &CityBlockRow) -> Result<Option<(NetworkEntry, RecordTuple)>> {
        let network: NetworkEntry = row.network.parse()?;
        let Some(location) = self.location(&row.geoname_id, &network) else {
            return Ok(None);
        };

        let region = match self.regions.get(&location.geoname_id) {
            Some(region) => {
                tracing::debug!(subdivision = %location.subdivision_1_name, region, "fips-10-4 region found");
                region
            }
            None => {
                tracing::debug!(subdivision = %location.subdivision_1_name, "missing fips-10-4 region");
                self.stats.missing_regions += 1;
                DEFAULT_REGION
            }
        };

        let attrs = CityAttributes {
            country_code: country_code(location),
            region,
            city: &location.city_name,
            postal_code: &row.postal_code,
            latitude: parse_number(&row.latitude, "latitude", &network),
            longitude: parse_number(&row.longitude, "longitude", &network),
            metro_code: parse_number(&location.metro_code, "metro_code", &network),
            area_code: 0,
        };
        let record = CityRecord::new(self.table, self.options.encoding, &attrs);
        Ok(Some((network, record.into())))
    }

    /// ASN record for a block row
    pub fn asn(&mut self, row: &AsnBlockRow) -> Result<(NetworkEntry, RecordTuple)> {
        let network: NetworkEntry = row.network.parse()?;
        let record = AsnRecord::new(
            self.options.encoding,
            &row.autonomous_system_number,
            &row.autonomous_system_organization,
        );
        Ok((network, record.into()))
    }

    fn location(&mut self, geoname_id: &str, network: &NetworkEntry) -> Option<&'a LocationRow> {
        let location = self.locations.get(geoname_id);
        if location.is_none() {
            tracing::debug!(%network, geoname_id, "no location for block, skipping");
            self.stats.skipped_rows += 1;
        }
        location
    }
}

/// ISO country code, falling back to the (remapped) continent code
fn country_code(location: &LocationRow) -> &str {
    if location.country_iso_code.is_empty() {
        &location.continent_code
    } else {
        &location.country_iso_code
    }
}

/// Parse an optional numeric column; empty or invalid values become zero
fn parse_number<T: std::str::FromStr + Default>(value: &str, column: &str, network: &NetworkEntry) -> T {
    let value = value.trim();
    if value.is_empty() {
        return T::default();
    }
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(%network, column, value, "invalid number, using 0");
        T::default()
    })
}
