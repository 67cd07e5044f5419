//! The line-oriented text form of a filter's bit storage.
//!
//! A dump is a metadata line carrying the filter size in bits, followed by
//! the storage bytes, four per line, each line prefixed with the zero-padded
//! decimal offset of its first byte:
//!
//! ```text
//! bitCount: 96
//! 00000000: [00000001 00000010 00000000 10000000]
//! 00000004: [00000000 00000000 00000100 00001000]
//! 00000008: [00000000 00000000 00000010 00000000]
//! ```
//!
//! Each byte is rendered as 8 binary digits, most significant bit first. The
//! final line holds fewer than four bytes when the storage length is not a
//! multiple of four.
//!
//! Encoding is deterministic: decoding a dump and encoding the result
//! reproduces the identical text.

use std::io::{self, BufRead, Write};

use crate::error::{Error, FormatError, Operation};

/// The literal prefix of the metadata line.
pub const METADATA_PREFIX: &str = "bitCount: ";

/// The number of storage bytes rendered on each data line.
pub const BYTES_PER_LINE: usize = 4;

/// Write the dump of `bytes`, describing a filter of `bit_count` bits, to `w`.
///
/// `w` is flushed before returning. An I/O error aborts the encode, leaving
/// whatever was already written in place.
pub fn encode<W: Write>(bit_count: usize, bytes: &[u8], mut w: W) -> Result<(), Error> {
    let stream = |source: io::Error| Error::Stream {
        op: Operation::Dump,
        source,
    };

    writeln!(w, "{}{}", METADATA_PREFIX, bit_count).map_err(stream)?;

    for (i, chunk) in bytes.chunks(BYTES_PER_LINE).enumerate() {
        writeln!(w, "{}", render_line(i * BYTES_PER_LINE, chunk)).map_err(stream)?;
    }

    w.flush().map_err(stream)
}

/// Render a single data line for `chunk`, the bytes starting at `offset`.
fn render_line(offset: usize, chunk: &[u8]) -> String {
    let groups = chunk
        .iter()
        .map(|b| format!("{:08b}", b))
        .collect::<Vec<_>>()
        .join(" ");

    format!("{:08}: [{}]", offset, groups)
}

/// Read a dump from `r`, returning the decoded storage bytes.
///
/// The dump must describe a filter of exactly `bit_count` bits and contain
/// exactly `bit_count / 8` bytes of data. Decoding stops at the first
/// offending line.
pub fn decode<R: BufRead>(r: R, bit_count: usize) -> Result<Vec<u8>, Error> {
    let mut lines = r
        .split(b'\n')
        .enumerate()
        .map(|(i, line)| -> Result<(usize, String), Error> {
            let n = i + 1;
            let line = line.map_err(|source| Error::Stream {
                op: Operation::Load,
                source,
            })?;

            into_line(line)
                .map(|l| (n, l))
                .map_err(|e| Error::format(Operation::Load, n, e))
        });

    let (n, metadata) = lines
        .next()
        .transpose()?
        .ok_or_else(|| Error::format(Operation::Load, 1, FormatError::MissingMetadata))?;

    let got = parse_metadata(&metadata).map_err(|e| Error::format(Operation::Load, n, e))?;
    if got != bit_count {
        return Err(Error::BitCountMismatch {
            expected: bit_count,
            got,
        });
    }

    let expected_len = bit_count / 8;
    let mut bytes = Vec::with_capacity(expected_len);

    for line in lines {
        let (n, line) = line?;
        parse_line(&line, &mut bytes).map_err(|e| Error::format(Operation::Load, n, e))?;

        if bytes.len() > expected_len {
            return Err(Error::StoreLengthMismatch {
                expected: expected_len,
                got: bytes.len(),
            });
        }
    }

    if bytes.len() != expected_len {
        return Err(Error::StoreLengthMismatch {
            expected: expected_len,
            got: bytes.len(),
        });
    }

    Ok(bytes)
}

/// Convert a raw line, without its `\n` terminator, to text, dropping any
/// trailing `\r`.
fn into_line(mut line: Vec<u8>) -> Result<String, FormatError> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    String::from_utf8(line).map_err(|_| FormatError::Encoding)
}

fn parse_metadata(line: &str) -> Result<usize, FormatError> {
    let value = line
        .strip_prefix(METADATA_PREFIX)
        .ok_or_else(|| FormatError::MetadataPrefix(line.to_string()))?
        .trim();

    value
        .parse()
        .map_err(|_| FormatError::BitCount(value.to_string()))
}

/// Parse the byte values of a single data line, appending them to `out`.
///
/// The offset column is not interpreted; bytes are accumulated in the order
/// they appear.
fn parse_line(line: &str, out: &mut Vec<u8>) -> Result<(), FormatError> {
    let data = match line.split_once(':') {
        Some((_offset, data)) if !data.contains(':') => data,
        _ => return Err(FormatError::Separator(line.to_string())),
    };

    let data = data.trim().trim_matches(|c| c == '[' || c == ']');

    for token in data.split_whitespace() {
        out.push(parse_token(token)?);
    }

    Ok(())
}

fn parse_token(token: &str) -> Result<u8, FormatError> {
    if !token.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(FormatError::Token(token.to_string()));
    }

    u8::from_str_radix(token, 2).map_err(|_| FormatError::Token(token.to_string()))
}
