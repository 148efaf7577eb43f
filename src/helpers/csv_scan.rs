//! Quote-aware record and field splitting over a raw CSV buffer.
//!
//! Both functions return byte spans instead of slices so the caller can keep
//! absolute offsets into the backing buffer.

use std::borrow::Cow;

use memchr::{memchr, memchr3_iter};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Splits `buf` into record spans `(start, end)`.
///
/// A `"` opens a quoted field only at the start of a field, the same rule
/// [`split_fields`] applies; anywhere else it is a literal character. A
/// newline inside a quoted field does not end the record. The trailing `\r`
/// of a CRLF line ending is excluded from the span. Blank lines produce empty
/// spans.
pub fn record_spans(buf: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut field_start = 0;
    let mut in_quotes = false;
    let mut skip_to = 0;

    for pos in memchr3_iter(b'"', b'\n', b',', buf) {
        if pos < skip_to {
            continue;
        }
        match (buf[pos], in_quotes) {
            (b'"', true) => {
                if buf.get(pos + 1) == Some(&b'"') {
                    skip_to = pos + 2;
                } else {
                    in_quotes = false;
                }
            }
            (b'"', false) => in_quotes = pos == field_start,
            (_, true) => {}
            (b',', false) => field_start = pos + 1,
            _ => {
                spans.push((start, strip_cr(buf, start, pos)));
                start = pos + 1;
                field_start = start;
            }
        }
    }

    if start < buf.len() {
        spans.push((start, strip_cr(buf, start, buf.len())));
    }

    spans
}

fn strip_cr(buf: &[u8], start: usize, end: usize) -> usize {
    if end > start && buf[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}

/// Splits one record into field spans relative to `line`.
///
/// Quoted fields yield the span between the quotes, so an escaped quote is
/// still encoded as `""` and must go through [`decode_field`]. An
/// unterminated quote runs to the end of the record.
pub fn split_fields(line: &[u8], out: &mut Vec<(usize, usize)>) {
    out.clear();
    let mut pos = 0;

    loop {
        if line.get(pos) == Some(&b'"') {
            let content_start = pos + 1;
            let mut cursor = content_start;
            let content_end = loop {
                match memchr(b'"', &line[cursor..]) {
                    Some(off) if line.get(cursor + off + 1) == Some(&b'"') => {
                        cursor += off + 2;
                    }
                    Some(off) => break cursor + off,
                    None => break line.len(),
                }
            };
            out.push((content_start, content_end));

            match memchr(b',', &line[content_end..]) {
                Some(off) => pos = content_end + off + 1,
                None => return,
            }
        } else {
            match memchr(b',', &line[pos..]) {
                Some(off) => {
                    out.push((pos, pos + off));
                    pos += off + 1;
                }
                None => {
                    out.push((pos, line.len()));
                    return;
                }
            }
        }
    }
}

/// Decodes raw field bytes, collapsing `""` escapes.
pub fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    if memchr(b'"', bytes).is_some() {
        Cow::Owned(text.replace("\"\"", "\""))
    } else {
        text
    }
}
