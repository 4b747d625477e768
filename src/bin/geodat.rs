mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use commands::{cmd_convert, cmd_dump, InputArgs};

#[derive(Parser)]
#[command(name = "geodat")]
#[command(
    about = "Convert GeoLite2 CSV tables to legacy GeoIP .dat databases",
    long_about = "geodat - Convert GeoLite2 / GeoIP2 CSV tables to the legacy GeoIP binary format\n\n\
    Builds country, city and ASN databases for IPv4 or IPv6 that older GeoIP\n\
    readers can open. The database kind and address family are taken from the\n\
    blocks file name when it follows the GeoLite2 naming convention.\n\n\
    Examples:\n\
      geodat convert --blocks GeoLite2-ASN-Blocks-IPv4.csv\n\
      geodat convert --blocks GeoLite2-City-Blocks-IPv6.csv --locations GeoLite2-City-Locations-en.csv \\\n\
          --regions geoname2fips.csv -o GeoLiteCityv6.dat\n\
      geodat dump --blocks blocks.csv --kind asn"
)]
#[command(version)]
struct Cli {
    /// Log per-row details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a legacy database file
    Convert {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: GeoIP.dat, GeoIPCity.dat, GeoIPASNum.dat, ... per variant)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the node table of the trie instead of writing a database
    Dump {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert { input, output } => cmd_convert(input, output),
        Commands::Dump { input } => cmd_dump(input),
    }
}
