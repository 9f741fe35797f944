use std::fs;
use std::io::BufRead;
use std::path::Path;

use anyhow::Context;

use crate::constants::*;
use crate::error::ParseError;
use crate::translation::Translation;

/// One item of the query stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Address(u32),
    Exit,
}

/// Parse a hexadecimal virtual address. The `0x` prefix is optional; `-1`
/// (or its unsigned form `ffffffff`) ends the stream.
pub fn parse_query(token: &str) -> Result<Query, ParseError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ParseError::Empty);
    }
    if token == "-1" {
        return Ok(Query::Exit);
    }

    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| ParseError::InvalidHex(token.to_string()))?;

    if value == EXIT_SENTINEL {
        Ok(Query::Exit)
    } else {
        Ok(Query::Address(value))
    }
}

/// Read whitespace-separated addresses up to the sentinel or end of input.
pub fn read_queries<R: BufRead>(reader: R) -> anyhow::Result<Vec<u32>> {
    let mut addresses = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", lineno + 1))?;
        for token in line.split_whitespace() {
            match parse_query(token).with_context(|| format!("line {}", lineno + 1))? {
                Query::Address(va) => addresses.push(va),
                Query::Exit => return Ok(addresses),
            }
        }
    }
    Ok(addresses)
}

pub fn read_virtual_addresses<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<u32>> {
    let path = path.as_ref();
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    read_queries(std::io::BufReader::new(file))
}

/// One output value per line: the physical address in hex, or -1.
pub fn format_results(results: &[Translation]) -> String {
    let mut out = String::new();
    for result in results {
        match result.to_output() {
            INVALID_ADDRESS => out.push_str(&format!("{}\n", INVALID_ADDRESS)),
            pa => out.push_str(&format!("{:#x}\n", pa)),
        }
    }
    out
}

pub fn write_results<P: AsRef<Path>>(path: P, results: &[Translation]) -> anyhow::Result<()> {
    let path = path.as_ref();
    fs::write(path, format_results(results))
        .with_context(|| format!("Failed to write output file {}", path.display()))
}
