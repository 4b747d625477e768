//! Legacy country code table
//!
//! Legacy databases never store country codes as text. Every country is
//! addressed by its position in this fixed table, so the order below is part
//! of the on-disk format and must never change.

use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Country codes in legacy index order (index 0 is "unknown")
pub const COUNTRY_CODES: [&str; 255] = [
    "",
    "AP", "EU", "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AN", "AO", "AQ",
    "AR", "AS", "AT", "AU", "AW", "AZ", "BA", "BB", "BD", "BE", "BF", "BG",
    "BH", "BI", "BJ", "BM", "BN", "BO", "BR", "BS", "BT", "BV", "BW", "BY",
    "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN",
    "CO", "CR", "CU", "CV", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO",
    "DZ", "EC", "EE", "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM",
    "FO", "FR", "FX", "GA", "GB", "GD", "GE", "GF", "GH", "GI", "GL", "GM",
    "GN", "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM", "HN",
    "HR", "HT", "HU", "ID", "IE", "IL", "IN", "IO", "IQ", "IR", "IS", "IT",
    "JM", "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW",
    "KY", "KZ", "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV",
    "LY", "MA", "MC", "MD", "MG", "MH", "MK", "ML", "MM", "MN", "MO", "MP",
    "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC",
    "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA",
    "PE", "PF", "PG", "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW",
    "PY", "QA", "RE", "RO", "RU", "RW", "SA", "SB", "SC", "SD", "SE", "SG",
    "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "ST", "SV", "SY",
    "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TM", "TN", "TO", "TL",
    "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA",
    "VC", "VE", "VG", "VI", "VN", "VU", "WF", "WS", "YE", "YT", "RS", "ZA",
    "ZM", "ME", "ZW", "A1", "A2", "O1", "AX", "GG", "IM", "JE", "BL", "MF",
    "BQ", "SS",
];

/// Codes missing from the legacy table, mapped onto the entry that replaced
/// (or was replaced by) them
pub const COUNTRY_ALIASES: [(&str, &str); 4] = [
    ("cw", "an"), // Curacao -> Netherlands Antilles
    ("uk", "gb"),
    ("sx", "fx"), // Sint Maarten
    ("xk", "rs"), // Kosovo -> Serbia
];

/// Index used when a code is not in the table
pub const UNKNOWN_COUNTRY: u8 = 0;

/// Case-insensitive lookup from country code to legacy table index
#[derive(Debug)]
pub struct CountryTable {
    index: FxHashMap<String, u8>,
}

impl CountryTable {
    /// Build the table from [`COUNTRY_CODES`] and [`COUNTRY_ALIASES`]
    pub fn new() -> Self {
        let mut index: FxHashMap<String, u8> = COUNTRY_CODES
            .iter()
            .enumerate()
            .map(|(i, code)| (code.to_ascii_lowercase(), i as u8))
            .collect();

        for (alias, target) in COUNTRY_ALIASES {
            let target_index = index[target];
            index.insert(alias.to_string(), target_index);
        }

        Self { index }
    }

    /// Shared, lazily built instance
    pub fn global() -> &'static CountryTable {
        static TABLE: OnceLock<CountryTable> = OnceLock::new();
        TABLE.get_or_init(CountryTable::new)
    }

    /// Look up a code, ignoring case
    pub fn lookup(&self, code: &str) -> Option<u8> {
        if code.bytes().any(|b| b.is_ascii_uppercase()) {
            self.index.get(&code.to_ascii_lowercase()).copied()
        } else {
            self.index.get(code).copied()
        }
    }

    /// Look up a code, falling back to [`UNKNOWN_COUNTRY`] with a warning
    pub fn index_or_unknown(&self, code: &str) -> u8 {
        self.lookup(code).unwrap_or_else(|| {
            tracing::warn!(
                country = code,
                "missing country in legacy country table, using unknown"
            );
            UNKNOWN_COUNTRY
        })
    }

    /// Code stored at `index`
    pub fn code(&self, index: u8) -> Option<&'static str> {
        COUNTRY_CODES.get(index as usize).copied()
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::new()
    }
}
