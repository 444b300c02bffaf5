//! Recursive-descent object parser over the `Tokenizer` (`spec.md` §4.2), plus
//! the classical xref table reader (`spec.md` §4.3 "Classical xref table") and
//! the small pieces of syntax (`%PDF-M.N` header, `startxref`) that bracket a
//! document.

use log::warn;
use std::collections::BTreeMap;

use crate::dictionary::Dictionary;
use crate::error::{ParseError, Result};
use crate::object::{Object, Stream, StringFormat};
use crate::object_id::ObjectId;
use crate::tokenizer::{Token, Tokenizer};
use crate::xref::{XrefEntry, XrefTable};

/// Anything that can answer "what is the integer value of object `id`", used to
/// resolve an indirect `/Length` while a stream is still being parsed
/// (`spec.md` §4.2: "Length is taken from the dictionary, following one
/// indirect hop if needed").
pub trait LengthResolver {
    fn resolve_length(&self, id: ObjectId) -> Option<i64>;
}

impl<F: Fn(ObjectId) -> Option<i64>> LengthResolver for F {
    fn resolve_length(&self, id: ObjectId) -> Option<i64> {
        self(id)
    }
}

pub struct NoLengthResolver;
impl LengthResolver for NoLengthResolver {
    fn resolve_length(&self, _id: ObjectId) -> Option<i64> {
        None
    }
}

/// Finds `%PDF-M.N` within the first kilobyte and clamps below-1.4 headers up,
/// per `spec.md` §6 "versions below 1.4 are clamped up".
pub fn parse_header(buf: &[u8]) -> Option<(u8, u8)> {
    let window = &buf[..buf.len().min(1024)];
    let pos = window.windows(5).position(|w| w == b"%PDF-")?;
    let rest = &window[pos + 5..];
    let mut it = rest.iter().copied();
    let major = it.next()?.checked_sub(b'0')?;
    if it.next()? != b'.' {
        return None;
    }
    let minor = it.next()?.checked_sub(b'0')?;
    let (major, minor) = if (major as u16) * 10 + (minor as u16) < 14 { (1, 4) } else { (major, minor) };
    Some((major, minor))
}

/// Scans backward from the end of the buffer for `startxref`, per `spec.md`
/// §6: "The header must match ... versions below 1.4 are clamped up" and the
/// xref-location contract implied by GLOSSARY "Xref table".
pub fn find_startxref(buf: &[u8]) -> Result<usize> {
    let tail_start = buf.len().saturating_sub(2048);
    let tail = &buf[tail_start..];
    let pos = find_last(tail, b"startxref").ok_or(crate::error::XrefError::Start)?;
    let mut t = Tokenizer::at(buf, tail_start + pos + b"startxref".len());
    match t.next_token() {
        Token::Int(offset) if offset >= 0 => Ok(offset as usize),
        _ => Err(crate::error::XrefError::Start.into()),
    }
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// Result of parsing one complete object, per `spec.md` §4.2: "`read()` ...
/// returns success/failure plus the last token read".
pub struct ParsedObject {
    pub object: Object,
    pub last_token: Token,
}

pub struct ObjectParser<'a, L: LengthResolver> {
    pub tok: Tokenizer<'a>,
    pub resolver: &'a L,
    full_buf: &'a [u8],
}

impl<'a, L: LengthResolver> ObjectParser<'a, L> {
    pub fn new(buf: &'a [u8], pos: usize, resolver: &'a L) -> Self {
        ObjectParser { tok: Tokenizer::at(buf, pos), resolver, full_buf: buf }
    }

    /// Parses exactly one value: a scalar, `[...]`, `<<...>>` (possibly
    /// followed by `stream`), or an `N G R` reference. Does not itself expect
    /// an enclosing `N G obj ... endobj` — see `read_indirect_object`.
    pub fn read_value(&mut self) -> Result<ParsedObject> {
        let token = self.tok.next_token();
        self.read_value_from(token)
    }

    fn read_value_from(&mut self, token: Token) -> Result<ParsedObject> {
        match token {
            Token::Int(n) => self.maybe_reference(n),
            Token::Real(r) => Ok(ParsedObject { object: Object::Real(r), last_token: Token::Real(r) }),
            Token::String(s) => {
                Ok(ParsedObject { object: Object::String(s, StringFormat::Literal), last_token: Token::Eof })
            }
            Token::Name(n) => Ok(ParsedObject { object: Object::Name(n), last_token: Token::Eof }),
            Token::BeginArray => self.read_array(),
            Token::BeginDict => self.read_dict_or_stream(),
            Token::Id(id) => match id.as_slice() {
                b"true" => Ok(ParsedObject { object: Object::Boolean(true), last_token: Token::Eof }),
                b"false" => Ok(ParsedObject { object: Object::Boolean(false), last_token: Token::Eof }),
                b"null" => Ok(ParsedObject { object: Object::Null, last_token: Token::Eof }),
                _ => {
                    warn!("unsolicited identifier '{}' where an object was expected", String::from_utf8_lossy(&id));
                    Err(ParseError::InvalidObject.into())
                }
            },
            Token::Eof => Err(ParseError::InvalidObject.into()),
            other => Ok(ParsedObject { object: Object::Null, last_token: other }),
        }
    }

    /// After an unsigned `INT`, look ahead for `INT R` (reference). Any other
    /// continuation is put back via `ungetc`-style seek restoration.
    fn maybe_reference(&mut self, first: i64) -> Result<ParsedObject> {
        if first < 0 {
            return Ok(ParsedObject { object: Object::Integer(first), last_token: Token::Eof });
        }
        let mark = self.tok.position();
        if let Token::Int(gen) = self.tok.next_token() {
            if gen >= 0 {
                let mark2 = self.tok.position();
                if let Token::Id(id) = self.tok.next_token() {
                    if id == b"R" {
                        return Ok(ParsedObject {
                            object: Object::Reference((first as u32, gen as u16)),
                            last_token: Token::Eof,
                        });
                    }
                }
                self.tok.seek(mark2);
            }
        }
        self.tok.seek(mark);
        Ok(ParsedObject { object: Object::Integer(first), last_token: Token::Eof })
    }

    fn read_array(&mut self) -> Result<ParsedObject> {
        let mut items = Vec::new();
        loop {
            let token = self.tok.next_token();
            match token {
                Token::EndArray | Token::Eof => break,
                other => match self.read_value_from(other) {
                    Ok(parsed) => items.push(parsed.object),
                    Err(_) => continue,
                },
            }
        }
        Ok(ParsedObject { object: Object::Array(items), last_token: Token::Eof })
    }

    fn read_dict_or_stream(&mut self) -> Result<ParsedObject> {
        let mut dict = Dictionary::new();
        loop {
            let key_token = self.tok.next_token();
            match key_token {
                Token::EndDict | Token::Eof => break,
                Token::Name(key) => match self.read_value() {
                    Ok(parsed) => {
                        dict.set(key, parsed.object);
                    }
                    Err(_) => {
                        // Resync: skip to the next /Name and treat it as a fresh key
                        // (`spec.md` §4.2: "the parser resyncs by treating the next
                        // name as a new key").
                        warn!("dropping malformed value for dictionary key /{}", String::from_utf8_lossy(&key));
                        continue;
                    }
                },
                _ => {
                    warn!("expected a /Name dictionary key");
                    continue;
                }
            }
        }

        let mark = self.tok.position();
        if let Token::Id(id) = self.tok.next_token() {
            if id == b"stream" {
                return self.read_stream_body(dict);
            }
        }
        self.tok.seek(mark);
        Ok(ParsedObject { object: Object::Dictionary(dict), last_token: Token::Eof })
    }

    fn read_stream_body(&mut self, dict: Dictionary) -> Result<ParsedObject> {
        // Skip exactly one newline: LF, or CRLF.
        let buf = self.remaining_buf_from_start();
        let mut pos = self.tok.position();
        if buf.get(pos) == Some(&b'\r') {
            pos += 1;
        }
        if buf.get(pos) == Some(&b'\n') {
            pos += 1;
        }

        let length = self.resolve_stream_length(&dict).ok_or(ParseError::InvalidStreamLength)?;
        if length < 0 {
            return Err(ParseError::InvalidStreamLength.into());
        }
        let length = length as usize;
        let start = pos;
        let end = start.saturating_add(length).min(buf.len());
        let content = buf[start..end].to_vec();

        self.tok.seek(end);
        let mark = self.tok.position();
        match self.tok.next_token() {
            Token::Id(id) if id == b"endstream" => {}
            _ => {
                // Tolerate a missing/misplaced `endstream` keyword by searching for it
                // verbatim, since a wrong /Length is the common real-world failure.
                if let Some(found) = find_next(buf, b"endstream", mark) {
                    self.tok.seek(found + b"endstream".len());
                } else {
                    return Err(ParseError::MissingEndstream.into());
                }
            }
        }

        Ok(ParsedObject { object: Object::Stream(Stream::new(dict, content)), last_token: Token::Eof })
    }

    fn resolve_stream_length(&self, dict: &Dictionary) -> Option<i64> {
        match dict.get(b"Length").ok()? {
            Object::Integer(n) => Some(*n),
            Object::Real(r) => Some(*r as i64),
            Object::Reference(id) => self.resolver.resolve_length(*id),
            _ => None,
        }
    }

    fn remaining_buf_from_start(&self) -> &'a [u8] {
        self.full_buf
    }
}

fn find_next(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }
    let hay = &haystack[from..];
    hay.windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

/// Parses `major minor obj <value> endobj` at `offset`. A missing `endobj` is
/// a soft-format warning, not a failure (`spec.md` §4.2).
pub fn read_indirect_object<L: LengthResolver>(
    buf: &[u8], offset: usize, resolver: &L,
) -> Result<(ObjectId, Object)> {
    let mut t = Tokenizer::at(buf, offset);
    let major = match t.next_token() {
        Token::Int(n) if n >= 0 => n as u32,
        _ => return Err(ParseError::InvalidObject.into()),
    };
    let minor = match t.next_token() {
        Token::Int(n) if n >= 0 => n as u16,
        _ => return Err(ParseError::InvalidObject.into()),
    };
    match t.next_token() {
        Token::Id(id) if id == b"obj" => {}
        _ => return Err(ParseError::InvalidObject.into()),
    }

    let mut parser = ObjectParser::new(buf, t.position(), resolver);
    let parsed = parser.read_value()?;
    let end = parser.tok.position();

    let mut t = Tokenizer::at(buf, end);
    match t.next_token() {
        Token::Id(id) if id == b"endobj" => {}
        _ => warn!("object {} {} is missing its endobj keyword", major, minor),
    }
    Ok(((major, minor), parsed.object))
}

/// Reads one section of the classical xref table: `first count` followed by
/// `count` 20-byte rows, repeated until `trailer` (`spec.md` §4.3). Leading
/// whitespace before each section header is tolerated.
pub fn read_classical_xref(buf: &[u8], start: usize) -> Result<(XrefTable, usize)> {
    let mut table = XrefTable::new();
    let mut t = Tokenizer::at(buf, start);

    match t.next_token() {
        Token::Id(id) if id == b"xref" => {}
        _ => return Err(ParseError::InvalidXref.into()),
    }

    loop {
        let mark = t.position();
        let first = match t.next_token() {
            Token::Int(n) if n >= 0 => n as u32,
            Token::Id(id) if id == b"trailer" => break,
            _ => {
                t.seek(mark);
                break;
            }
        };
        let count = match t.next_token() {
            Token::Int(n) if n >= 0 => n as u32,
            _ => return Err(ParseError::InvalidXref.into()),
        };

        for i in 0..count {
            let id = first + i;
            let offset_tok = t.next_token();
            let gen_tok = t.next_token();
            let type_tok = t.next_token();
            let (offset, gen, ty) = match (offset_tok, gen_tok, type_tok) {
                (Token::Int(o), Token::Int(g), Token::Id(ty)) if o >= 0 && g >= 0 => (o as u32, g as u16, ty),
                _ => {
                    warn!("malformed classical xref row for object {id}");
                    continue;
                }
            };
            match ty.as_slice() {
                b"n" => table.insert_if_absent(id, XrefEntry::InUse { offset, generation: gen }),
                b"f" => table.insert_if_absent(id, XrefEntry::Free { next_free: offset, generation: gen }),
                _ => warn!("unknown xref row type for object {id}"),
            }
        }
    }

    table.size = table.max_id() + 1;
    Ok((table, t.position()))
}

/// Parses the bare `<< ... >>` trailer dictionary that follows `trailer`.
pub fn read_trailer_dict(buf: &[u8], start: usize) -> Result<Dictionary> {
    let mut parser = ObjectParser::new(buf, start, &NoLengthResolver);
    match parser.tok.next_token() {
        Token::BeginDict => {}
        _ => return Err(crate::error::XrefError::Trailer.into()),
    }
    match parser.read_dict_or_stream()?.object {
        Object::Dictionary(d) => Ok(d),
        _ => Err(crate::error::XrefError::Trailer.into()),
    }
}

pub type ObjectMap = BTreeMap<ObjectId, Object>;
