use std::borrow::Cow;

use encoding_rs::Encoding;

use super::Point;
use crate::error::{Axis, LineError, LineErrorKind};

/// Decode raw file contents into text.
///
/// A byte-order mark, when present, overrides `encoding`. Byte sequences that are
/// invalid in the chosen encoding become U+FFFD and are reported per line by [`records`].
pub fn decode<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> (Cow<'a, str>, &'static Encoding) {
    let (text, used, _) = encoding.decode(bytes);
    (text, used)
}

/// Parse one record of the form `x;y;z`.
///
/// The first and the last `;` delimit the fields, so any extra separators end up in the
/// middle field, where they make it fail to parse.
pub fn parse_line(line: &str) -> Result<Point, LineErrorKind> {
    let (first, last) = match (line.find(';'), line.rfind(';')) {
        (Some(first), Some(last)) if first != last => (first, last),
        _ => {
            return Err(LineErrorKind::MissingDelimiter {
                text: line.to_string(),
            })
        }
    };

    Ok(Point {
        x: parse_field(&line[..first], Axis::X)?,
        y: parse_field(&line[first + 1..last], Axis::Y)?,
        z: parse_field(&line[last + 1..], Axis::Z)?,
    })
}

fn parse_field(text: &str, field: Axis) -> Result<f64, LineErrorKind> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| LineErrorKind::InvalidNumber {
            field,
            text: text.to_string(),
        })
}

/// Iterate over the records of decoded `.dat` text, one result per non-blank line.
///
/// Line numbers are 1-based and count blank lines, so they match what an editor shows.
pub fn records<'a>(
    text: &'a str,
    encoding: &'static Encoding,
) -> impl Iterator<Item = Result<Point, LineError>> + 'a {
    text.split('\n').enumerate().filter_map(move |(index, raw)| {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            return None;
        }

        let line_no = index + 1;
        let parsed = if line.contains(char::REPLACEMENT_CHARACTER) {
            Err(LineErrorKind::Decode {
                encoding: encoding.name(),
            })
        } else {
            parse_line(line)
        };
        Some(parsed.map_err(|kind| LineError {
            line: line_no,
            kind,
        }))
    })
}
