use anyhow::{bail, Context, Result};
use clap::Args;
use geodat::file_reader::{self, table_stem};
use geodat::source::{
    parse_blocks_name, AsnBlockRow, CityBlockRow, CountryBlockRow, LocationRow, Locations,
    RegionCodes, RegionRow, RowConverter,
};
use geodat::{
    AddressFamily, BuildOptions, DatBuilder, DatabaseKind, DatabaseVariant, TextEncoding,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Input tables and build options shared by all subcommands
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Network blocks table (.csv or .csv.gz)
    #[arg(long, value_name = "CSV")]
    pub blocks: PathBuf,

    /// Locations table, required for country and city databases
    #[arg(long, value_name = "CSV")]
    pub locations: Option<PathBuf>,

    /// geoname_id,region table of FIPS 10-4 region codes (city databases)
    #[arg(long, value_name = "CSV")]
    pub regions: Option<PathBuf>,

    /// Database kind: country, city or asn (default: from the blocks file name)
    #[arg(long)]
    pub kind: Option<DatabaseKind>,

    /// Build an IPv6 database (default: from the blocks file name, else IPv4)
    #[arg(long)]
    pub ipv6: bool,

    /// ASCII comment stored in the database trailer
    #[arg(long)]
    pub comment: Option<String>,

    /// Text encoding for labels: utf-8 or latin-1
    #[arg(long, default_value = "utf-8")]
    pub encoding: TextEncoding,
}

impl InputArgs {
    /// Variant from explicit flags, falling back to the blocks file name
    pub fn variant(&self) -> Result<DatabaseVariant> {
        let inferred = table_stem(&self.blocks)
            .as_deref()
            .and_then(parse_blocks_name);

        let kind = match (self.kind, inferred) {
            (Some(kind), _) => kind,
            (None, Some((kind, _))) => kind,
            (None, None) => bail!(
                "cannot infer the database kind from '{}', pass --kind country|city|asn",
                self.blocks.display()
            ),
        };
        let family = if self.ipv6 {
            AddressFamily::V6
        } else {
            inferred.map_or(AddressFamily::V4, |(_, family)| family)
        };

        Ok(DatabaseVariant::new(kind, family))
    }

    /// Options with the default comment filled in
    pub fn build_options(&self) -> BuildOptions {
        let comment = self.comment.clone().unwrap_or_else(|| {
            let stem = table_stem(&self.blocks)
                .unwrap_or_else(|| self.blocks.display().to_string());
            format!("{} converted to legacy MaxMind DB with geodat", stem)
        });
        BuildOptions::new()
            .with_comment(comment)
            .with_encoding(self.encoding)
    }

    /// Read all tables and build the trie
    pub fn load(&self) -> Result<DatBuilder> {
        let variant = self.variant()?;
        let options = self.build_options();
        let mut builder =
            DatBuilder::new(variant, options.clone()).context("Invalid build options")?;
        tracing::info!(%variant, blocks = %self.blocks.display(), "building database");

        let locations = if variant.kind().needs_locations() {
            let Some(path) = &self.locations else {
                bail!("--locations is required for {} databases", variant.kind());
            };
            let locations = Locations::from_rows(read_table::<LocationRow>(path)?);
            tracing::info!(count = locations.len(), path = %path.display(), "loaded locations");
            locations
        } else {
            Locations::default()
        };

        let regions = match (variant.kind(), &self.regions) {
            (DatabaseKind::City, Some(path)) => {
                let regions = RegionCodes::from_rows(read_table::<RegionRow>(path)?);
                tracing::info!(count = regions.len(), path = %path.display(), "loaded region codes");
                regions
            }
            (DatabaseKind::City, None) => {
                tracing::warn!("no region table given, every region will be \"00\"");
                RegionCodes::default()
            }
            _ => RegionCodes::default(),
        };

        let mut converter = RowConverter::new(&options, &locations, &regions);
        match variant.kind() {
            DatabaseKind::Country => for_each_row(&self.blocks, |row: CountryBlockRow| {
                if let Some((network, record)) = converter.country(&row)? {
                    builder.insert(&network, record)?;
                }
                Ok(())
            })?,
            DatabaseKind::City => for_each_row(&self.blocks, |row: CityBlockRow| {
                if let Some((network, record)) = converter.city(&row)? {
                    builder.insert(&network, record)?;
                }
                Ok(())
            })?,
            DatabaseKind::Asn => for_each_row(&self.blocks, |row: AsnBlockRow| {
                let (network, record) = converter.asn(&row)?;
                builder.insert(&network, record)?;
                Ok(())
            })?,
        }

        let stats = converter.stats();
        if stats.skipped_rows > 0 {
            tracing::warn!(
                skipped_rows = stats.skipped_rows,
                "block rows without a known location were skipped"
            );
        }
        if stats.missing_regions > 0 {
            tracing::warn!(
                missing_regions = stats.missing_regions,
                "city rows without a fips-10-4 region code were written with region \"00\""
            );
        }

        Ok(builder)
    }
}

/// Read a whole (small) lookup table
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    for_each_row(path, |row| {
        rows.push(row);
        Ok(())
    })?;
    Ok(rows)
}

/// Stream the rows of a table through `f`
fn for_each_row<T, F>(path: &Path, mut f: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let reader = file_reader::open(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;
    let mut csv = csv::Reader::from_reader(reader);

    for row in csv.deserialize() {
        let row: T = row.with_context(|| format!("Malformed row in {}", path.display()))?;
        f(row).with_context(|| format!("Failed to convert row in {}", path.display()))?;
    }
    Ok(())
}
