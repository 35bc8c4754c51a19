//! Reading and writing of the listing files produced for an assembled RM-20
//! program.
//!
//! Three artifacts exist per program: the object listing (`.ob`) holding the
//! encoded code and data words, the entry point listing (`.ent`) naming the
//! symbols exported with `.entry`, and the external reference listing
//! (`.ext`) naming every code word that awaits an external symbol. All three
//! are plain text; the formats are described on the respective `write_*`
//! functions.

use rm20::constants::CODE_BASE_ADDR;
use rm20::Word;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[cfg(test)]
mod test;

/// Encoded output of a single assembly: the code segment followed by the
/// data segment. The data segment is loaded directly after the code segment,
/// which itself is loaded at [`CODE_BASE_ADDR`](../rm20/constants/index.html).
#[derive(Debug, PartialEq)]
pub struct Listing {
    code: Vec<Word>,
    data: Vec<Word>,
}

impl Listing {
    pub fn from(code: Vec<Word>, data: Vec<Word>) -> Listing {
        Listing { code, data }
    }

    pub fn copy_from(code: &[Word], data: &[Word]) -> Listing {
        Listing {
            code: Vec::from(code),
            data: Vec::from(data),
        }
    }

    pub fn code(&self) -> &[Word] {
        &self.code[..]
    }

    pub fn data(&self) -> &[Word] {
        &self.data[..]
    }
}

/// A symbol exported with `.entry`.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryPoint {
    pub label: String,
    pub base_addr: Word,
    pub offset: Word,
}

/// One symbolic reference to an external symbol: the addresses of the two
/// code words into which the loader places the symbol's base and offset.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalRef {
    pub label: String,
    pub base_word_addr: Word,
    pub offset_word_addr: Word,
}

/// Writes an object listing.
///
/// The first line is `"<code_len> <data_len>"`. Every following line holds
/// one word as `"<addr> A<n>-B<n>-C<n>-D<n>-E<n>"` where `addr` is the
/// decimal word address padded to four digits and `A` through `E` are the
/// hex nibbles of the word from bit 16 down to bit 0.
pub fn write_listing<W: Write>(writer: &mut W, listing: &Listing) -> io::Result<()> {
    writeln!(writer, "{} {}", listing.code.len(), listing.data.len())?;
    write_segment(writer, &listing.code, CODE_BASE_ADDR)?;
    write_segment(
        writer,
        &listing.data,
        CODE_BASE_ADDR + listing.code.len() as Word,
    )?;
    Ok(())
}

fn write_segment<W: Write>(writer: &mut W, segment: &[Word], base_addr: Word) -> io::Result<()> {
    for (i, w) in segment.iter().enumerate() {
        writeln!(
            writer,
            "{:04} A{:x}-B{:x}-C{:x}-D{:x}-E{:x}",
            base_addr + i as Word,
            (w >> 16) & 0xF,
            (w >> 12) & 0xF,
            (w >> 8) & 0xF,
            (w >> 4) & 0xF,
            w & 0xF
        )?;
    }
    Ok(())
}

/// Writes an entry point listing: one `"<label>,<base>,<offset>"` line per
/// entry.
pub fn write_entries<W: Write>(writer: &mut W, entrypoints: &[EntryPoint]) -> io::Result<()> {
    for ep in entrypoints {
        writeln!(writer, "{},{},{}", ep.label, ep.base_addr, ep.offset)?;
    }
    Ok(())
}

/// Writes an external reference listing: a `"<label> BASE <addr>"` and a
/// `"<label> OFFSET <addr>"` line per reference, with a blank line between
/// distinct references.
pub fn write_externals<W: Write>(writer: &mut W, externals: &[ExternalRef]) -> io::Result<()> {
    for (i, ext) in externals.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{} BASE {}", ext.label, ext.base_word_addr)?;
        writeln!(writer, "{} OFFSET {}", ext.label, ext.offset_word_addr)?;
    }
    Ok(())
}

/// Parses an object listing previously produced by
/// [`write_listing`](fn.write_listing.html).
pub fn read_listing<R: BufRead>(reader: &mut R) -> io::Result<Listing> {
    let mut header = String::new();
    reader.read_line(&mut header)?;

    let mut counts = header.split_whitespace();
    let code_len = parse_count(counts.next())?;
    let data_len = parse_count(counts.next())?;
    if counts.next().is_some() {
        return Err(bad_listing("extraneous text in header"));
    }

    let code = read_segment(reader, code_len)?;
    let data = read_segment(reader, data_len)?;

    Ok(Listing::from(code, data))
}

fn parse_count(field: Option<&str>) -> io::Result<usize> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| bad_listing("malformed header"))
}

fn read_segment<R: BufRead>(reader: &mut R, len: usize) -> io::Result<Vec<Word>> {
    let mut segment = Vec::with_capacity(len);
    let mut line = String::new();

    for _ in 0..len {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(bad_listing("listing shorter than its header claims"));
        }
        segment.push(parse_word_line(&line).ok_or_else(|| bad_listing("malformed word line"))?);
    }

    Ok(segment)
}

/// Reassembles a word from a `"<addr> A<n>-B<n>-C<n>-D<n>-E<n>"` line.
fn parse_word_line(line: &str) -> Option<Word> {
    let mut fields = line.split_whitespace();
    fields.next()?; // address, implied by line position
    let nibbles = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let mut value: Word = 0;
    let mut pieces = nibbles.split('-');
    for &tag in &['A', 'B', 'C', 'D', 'E'] {
        let digit = pieces.next()?.strip_prefix(tag)?;
        value = (value << 4) | Word::from_str_radix(digit, 16).ok()?;
    }
    if pieces.next().is_some() {
        return None;
    }

    Some(value)
}

fn bad_listing(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

pub fn read_listing_file<P: AsRef<Path>>(path: P) -> io::Result<Listing> {
    read_listing(&mut BufReader::new(File::open(path)?))
}

pub fn write_listing_file<P: AsRef<Path>>(path: P, listing: &Listing) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_listing(&mut writer, listing)?;
    writer.flush()
}

pub fn write_entries_file<P: AsRef<Path>>(path: P, entrypoints: &[EntryPoint]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_entries(&mut writer, entrypoints)?;
    writer.flush()
}

pub fn write_externals_file<P: AsRef<Path>>(path: P, externals: &[ExternalRef]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_externals(&mut writer, externals)?;
    writer.flush()
}
