//! Input table reader with automatic gzip decompression
//!
//! GeoLite2 tables are often stored compressed next to the archive they came
//! from. Paths ending in `.gz` (any case) are decompressed on the fly.
//!
//! ```rust,no_run
//! use geodat::file_reader;
//! use std::io::BufRead;
//!
//! let reader = file_reader::open("GeoLite2-ASN-Blocks-IPv4.csv.gz")?;
//! for line in reader.lines() {
//!     println!("{}", line?);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Buffer size for table reading (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// Open a table, decompressing `.gz` files
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if has_extension(path, "gz") {
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// File name without directory, `.gz` and `.csv` suffixes
///
/// `dir/GeoLite2-City-Blocks-IPv4.csv.gz` becomes `GeoLite2-City-Blocks-IPv4`.
pub fn table_stem(path: &Path) -> Option<String> {
    let mut path = path.to_path_buf();
    for ext in ["gz", "csv"] {
        if has_extension(&path, ext) {
            path.set_extension("");
        }
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_table() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "network,geoname_id").unwrap();
        writeln!(file, "1.0.0.0/24,2077456").unwrap();
        file.flush().unwrap();

        let reader = open(file.path()).unwrap();
        let lines: Vec<String> = reader.lines().collect::<io::Result<Vec<_>>>().unwrap();
        assert_eq!(lines, vec!["network,geoname_id", "1.0.0.0/24,2077456"]);
    }

    #[test]
    fn test_gzip_table_any_case() {
        for suffix in [".csv.gz", ".CSV.GZ"] {
            let mut file = NamedTempFile::with_suffix(suffix).unwrap();
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            writeln!(encoder, "geoname_id,region").unwrap();
            file.write_all(&encoder.finish().unwrap()).unwrap();
            file.flush().unwrap();

            let reader = open(file.path()).unwrap();
            let lines: Vec<String> = reader.lines().collect::<io::Result<Vec<_>>>().unwrap();
            assert_eq!(lines, vec!["geoname_id,region"]);
        }
    }

    #[test]
    fn test_missing_table() {
        assert!(open("/nonexistent/GeoLite2-City-Blocks-IPv4.csv").is_err());
    }

    #[test]
    fn test_table_stem() {
        let stem = |p: &str| table_stem(Path::new(p));
        assert_eq!(
            stem("dir/GeoLite2-City-Blocks-IPv4.csv.gz").as_deref(),
            Some("GeoLite2-City-Blocks-IPv4")
        );
        assert_eq!(stem("blocks.CSV").as_deref(), Some("blocks"));
        assert_eq!(stem("blocks.txt").as_deref(), Some("blocks.txt"));
    }
}
