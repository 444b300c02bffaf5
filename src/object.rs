use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object_id::ObjectId;

/// String objects remember whether they were written as a literal `(...)` or a
/// hex `<...>` string so round-tripping an untouched object reproduces the
/// original bytes (`spec.md` §8 "Tokenize-then-write-then-tokenize ... is
/// structurally equal").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// A tagged PDF value, `spec.md` §3: "a tagged sum over eleven variants. Each
/// variant owns its payload". `Reference` never owns its target.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

/// A stream's dictionary plus its (possibly still-compressed) byte content.
/// `spec.md` §3: "streams own their dictionary and their byte buffer".
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
    /// True once `content` has been run through its `/Filter` chain.
    pub decoded: bool,
}

impl Stream {
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Self {
        dict.remove(b"Length");
        Stream { dict, content, decoded: false }
    }

    /// Decompress `content` in place according to `/Filter` (`spec.md` §4's
    /// Filters component: Flate, LZW, plus the PNG-Up predictor).
    pub fn decompress(&mut self) -> Result<()> {
        if self.decoded {
            return Ok(());
        }
        let filters = self.filter_names();
        let mut data = std::mem::take(&mut self.content);
        for name in &filters {
            data = crate::filters::decode(name, &data, self.predictor_params())?;
        }
        self.content = data;
        self.decoded = true;
        Ok(())
    }

    /// Compress `content` with Flate, the only encoder `spec.md` §4 Filters
    /// requires this engine to be able to *produce*.
    pub fn compress_flate(&mut self) {
        if !self.decoded {
            return;
        }
        let compressed = crate::filters::flate_encode(&self.content);
        self.content = compressed;
        self.decoded = false;
        self.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        self.dict.remove(b"DecodeParms");
    }

    fn filter_names(&self) -> Vec<Vec<u8>> {
        match self.dict.get(b"Filter") {
            Ok(Object::Name(n)) => vec![n.clone()],
            Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_name().ok().map(|n| n.to_vec())).collect(),
            _ => Vec::new(),
        }
    }

    fn predictor_params(&self) -> Option<crate::filters::PredictorParams> {
        let parms = self.dict.get(b"DecodeParms").ok()?;
        let dict = match parms {
            Object::Dictionary(d) => d,
            Object::Array(items) => items.iter().find_map(|o| o.as_dict().ok())?,
            _ => return None,
        };
        let predictor = dict.get(b"Predictor").ok()?.as_i64().ok()? as i32;
        if predictor <= 1 {
            return None;
        }
        let columns = dict.get(b"Columns").and_then(Object::as_i64).unwrap_or(1) as usize;
        let colors = dict.get(b"Colors").and_then(Object::as_i64).unwrap_or(1) as usize;
        let bpc = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8) as usize;
        Some(crate::filters::PredictorParams { predictor, columns, colors, bits_per_component: bpc })
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.decoded = false;
    }
}

impl Object {
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            Object::Real(r) => Ok(*r as i64),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            _ => Err(Error::ObjectType((0, 0))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Structural equality after a round trip: two objects compare equal
    /// regardless of which literal/hex string form or int/real form was used
    /// to spell the same value, matching `spec.md` §8's round-trip property.
    pub fn structurally_eq(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::String(a, _), Object::String(b, _)) => a == b,
            (Object::Array(a), Object::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
            }
            (Object::Dictionary(a), Object::Dictionary(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| matches!(b.get(k), Ok(bv) if v.structurally_eq(bv)))
            }
            (Object::Stream(a), Object::Stream(b)) => {
                a.content == b.content && Object::Dictionary(a.dict.clone()).structurally_eq(&Object::Dictionary(b.dict.clone()))
            }
            _ => self == other,
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}
impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}
impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(v)
    }
}
impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}
impl From<Dictionary> for Object {
    fn from(v: Dictionary) -> Self {
        Object::Dictionary(v)
    }
}
impl From<Stream> for Object {
    fn from(v: Stream) -> Self {
        Object::Stream(v)
    }
}
impl From<ObjectId> for Object {
    fn from(v: ObjectId) -> Self {
        Object::Reference(v)
    }
}
