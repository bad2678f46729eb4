//! GD3 metadata tag
//!
//! The tag trails the command stream: `"Gd3 "`, a u32 version, a u32 byte length, then that many
//! bytes of UTF-16LE text holding eleven NUL-terminated strings in a fixed order.

use crate::{Result, Sn76489Error};
use nom::bytes::complete::{tag, take};
use nom::number::complete::le_u32;
use nom::sequence::tuple;
use nom::IResult;
use serde::Serialize;

/// Tag magic
pub const GD3_MAGIC: &[u8; 4] = b"Gd3 ";

/// Version written by [`Gd3Tag::to_bytes`]
pub const GD3_VERSION: u32 = 0x0000_0100;

/// Number of text fields a complete tag carries
pub const GD3_FIELD_COUNT: usize = 11;

/// Song metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Gd3Tag {
    /// Tag version
    pub version: u32,
    /// Track title
    pub title_english: String,
    /// Track title (original script)
    pub title_japanese: String,
    /// Game name
    pub game_english: String,
    /// Game name (original script)
    pub game_japanese: String,
    /// System name
    pub system_english: String,
    /// System name (original script)
    pub system_japanese: String,
    /// Composer
    pub author_english: String,
    /// Composer (original script)
    pub author_japanese: String,
    /// Release date
    pub release_date: String,
    /// Person who converted the log
    pub converted_by: String,
    /// Free-form notes
    pub notes: String,
}

fn gd3_block(input: &[u8]) -> IResult<&[u8], (u32, &[u8])> {
    let (rest, (_, version, length)) = tuple((tag(GD3_MAGIC), le_u32, le_u32))(input)?;
    let (rest, body) = take(length as usize)(rest)?;
    Ok((rest, (version, body)))
}

/// Split the body into NUL-terminated UTF-16LE strings
///
/// Only strings closed by a terminator count; trailing text without one is dropped.
fn decode_strings(body: &[u8]) -> Result<Vec<String>> {
    if body.len() % 2 != 0 {
        return Err(Sn76489Error::FormatError(format!(
            "GD3 body length {} is not a whole number of UTF-16 units",
            body.len()
        )));
    }
    let mut fields = Vec::new();
    let mut current = Vec::new();
    for pair in body.chunks_exact(2) {
        match u16::from_le_bytes([pair[0], pair[1]]) {
            0 => fields.push(String::from_utf16_lossy(&std::mem::take(&mut current))),
            unit => current.push(unit),
        }
    }
    Ok(fields)
}

impl Gd3Tag {
    /// Parse a tag starting at `data[0]`
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (_, (version, body)) = gd3_block(data).map_err(|e| {
            Sn76489Error::FormatError(format!("Truncated or invalid GD3 tag: {:?}", e))
        })?;

        let fields = decode_strings(body)?;
        if fields.len() < GD3_FIELD_COUNT {
            return Err(Sn76489Error::FormatError(format!(
                "GD3 tag holds {} fields, expected {}",
                fields.len(),
                GD3_FIELD_COUNT
            )));
        }

        let mut it = fields.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Ok(Gd3Tag {
            version,
            title_english: next(),
            title_japanese: next(),
            game_english: next(),
            game_japanese: next(),
            system_english: next(),
            system_japanese: next(),
            author_english: next(),
            author_japanese: next(),
            release_date: next(),
            converted_by: next(),
            notes: next(),
        })
    }

    /// The eleven fields in file order
    pub fn fields(&self) -> [&str; GD3_FIELD_COUNT] {
        [
            &self.title_english,
            &self.title_japanese,
            &self.game_english,
            &self.game_japanese,
            &self.system_english,
            &self.system_japanese,
            &self.author_english,
            &self.author_japanese,
            &self.release_date,
            &self.converted_by,
            &self.notes,
        ]
    }

    /// Encode the tag, including magic and length
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for field in self.fields() {
            for unit in field.encode_utf16() {
                body.extend_from_slice(&unit.to_le_bytes());
            }
            body.extend_from_slice(&[0, 0]);
        }

        let version = if self.version == 0 {
            GD3_VERSION
        } else {
            self.version
        };
        let mut out = Vec::with_capacity(12 + body.len());
        out.extend_from_slice(GD3_MAGIC);
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Title, preferring the English field
    pub fn title(&self) -> &str {
        if self.title_english.is_empty() {
            &self.title_japanese
        } else {
            &self.title_english
        }
    }

    /// Author, preferring the English field
    pub fn author(&self) -> &str {
        if self.author_english.is_empty() {
            &self.author_japanese
        } else {
            &self.author_english
        }
    }
}
