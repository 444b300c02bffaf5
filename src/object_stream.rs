//! Compressed object streams (`spec.md` §4.4): a single container stream
//! holding `N` objects as `(object_number, offset)` pairs followed by the
//! objects themselves, back to back, with no `obj`/`endobj` wrapper.

use crate::error::{ParseError, Result};
use crate::object::{Object, Stream};
use crate::object_id::ObjectId;
use crate::parser::{NoLengthResolver, ObjectParser};
use crate::tokenizer::{Token, Tokenizer};

/// Materializes every object held in `stream` into `(ObjectId, Object)` pairs.
/// The generation number of an object inside an object stream is always 0
/// (`spec.md` §4.4: "compressed objects are always generation 0").
pub fn read_object_stream(stream: &mut Stream) -> Result<Vec<(ObjectId, Object)>> {
    stream.decompress()?;

    let n = stream.dict.get(b"N").and_then(Object::as_i64).map_err(|_| ParseError::InvalidObject)?;
    let first = stream.dict.get(b"First").and_then(Object::as_i64).map_err(|_| ParseError::InvalidObject)?;
    if n < 0 || first < 0 {
        return Err(ParseError::InvalidObject.into());
    }

    let mut header = Tokenizer::new(&stream.content);
    let mut pairs = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let obj_no = match header.next_token() {
            Token::Int(v) if v >= 0 => v as u32,
            _ => return Err(ParseError::InvalidObject.into()),
        };
        let offset = match header.next_token() {
            Token::Int(v) if v >= 0 => v as usize,
            _ => return Err(ParseError::InvalidObject.into()),
        };
        pairs.push((obj_no, first as usize + offset));
    }

    let mut objects = Vec::with_capacity(pairs.len());
    for (obj_no, offset) in pairs {
        let mut parser = ObjectParser::new(&stream.content, offset, &NoLengthResolver);
        let parsed = parser.read_value()?;
        objects.push(((obj_no, 0u16), parsed.object));
    }
    Ok(objects)
}
