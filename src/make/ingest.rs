//! Line Ingestion
//!
//! Builds a database from text lines of the form `key<sep>value`, e.g. a
//! `name=value` settings file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

use super::install::DatabaseWriter;

/// Add one record per line of `input` to `writer`
///
/// Each line is split at the first `sep` byte; the line terminator is not
/// part of the value. Lines without `sep` are skipped. Returns the number
/// of records added.
pub fn ingest_lines<R: BufRead>(mut input: R, sep: u8, writer: &mut DatabaseWriter) -> Result<usize> {
    let mut line = Vec::new();
    let mut added = 0usize;
    let mut skipped = 0usize;

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        let content = strip_newline(&line);
        match content.iter().position(|&b| b == sep) {
            Some(at) => {
                writer.add(&content[..at], &content[at + 1..])?;
                added += 1;
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} lines without separator {:?}", skipped, sep as char);
    }
    Ok(added)
}

/// Build `output` from the lines of `input`, installing it atomically
pub fn make_from_file(input: &Path, sep: u8, output: &Path, config: &Config) -> Result<usize> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = DatabaseWriter::create(output, config)?;

    let added = ingest_lines(reader, sep, &mut writer)?;
    writer.finish()?;

    info!("Built {:?} from {:?}: {} records", output, input, added);
    Ok(added)
}

fn strip_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
