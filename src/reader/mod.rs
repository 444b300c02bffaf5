//! Assembles a `Document` from a byte buffer: header, the `/Prev`-chained
//! xref (classical or stream), the standard security handler if present, and
//! every object reachable from the final merged xref table (`spec.md` §4.3,
//! §4.4, §4.6).

mod metadata;

use std::collections::{BTreeMap, HashSet};

use log::{error, warn};

pub use metadata::PdfMetadata;

use crate::dictionary::Dictionary;
use crate::encryption::StandardSecurityHandler;
use crate::error::{Error, ParseError, Result};
use crate::object::Object;
use crate::object_id::ObjectId;
use crate::object_stream;
use crate::options::DocumentOptions;
use crate::parser::{self, LengthResolver, NoLengthResolver};
use crate::tokenizer::{Token, Tokenizer};
use crate::xref::{XrefEntry, XrefTable};
use crate::xref_stream;

/// Resolves an indirect `/Length` by looking its offset up in the xref table
/// being built and re-parsing just that one object (`spec.md` §4.2: "following
/// one indirect hop"), never recursing through a second indirection.
struct TableLengthResolver<'a> {
    buf: &'a [u8],
    table: &'a XrefTable,
}

impl LengthResolver for TableLengthResolver<'_> {
    fn resolve_length(&self, id: ObjectId) -> Option<i64> {
        match self.table.get(id.0)? {
            XrefEntry::InUse { offset, .. } => {
                let (_, obj) = parser::read_indirect_object(self.buf, *offset as usize, &NoLengthResolver).ok()?;
                obj.as_i64().ok()
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct LoadedDocument {
    pub version: (u8, u8),
    pub trailer: Dictionary,
    pub xref: XrefTable,
    pub objects: BTreeMap<ObjectId, Object>,
}

/// Reads one xref section at `offset`: either a classical `xref` table
/// followed by a `trailer` dict, or a PDF 1.5 cross-reference stream
/// (`spec.md` §4.3, both subsections). The returned `bool` is `true` when the
/// section was read as a stream rather than a classical table.
fn read_xref_section(buf: &[u8], offset: usize) -> Result<(XrefTable, Dictionary, bool)> {
    let mut peek = Tokenizer::at(buf, offset);
    match peek.next_token() {
        Token::Id(id) if id == b"xref" => {
            let (table, pos) = parser::read_classical_xref(buf, offset)?;
            let trailer = parser::read_trailer_dict(buf, pos)?;
            Ok((table, trailer, false))
        }
        _ => {
            let resolver = NoLengthResolver;
            let (_, obj) = parser::read_indirect_object(buf, offset, &resolver)?;
            let mut stream = obj.as_stream().map_err(|_| ParseError::InvalidXref)?.clone();
            let (table, dict) = xref_stream::read_xref_stream(&mut stream)?;
            Ok((table, dict, true))
        }
    }
}

/// Loads a complete `Document` out of `buf`. `password` authenticates an
/// encrypted document's standard security handler; pass `b""` for documents
/// that use the empty user password (by far the common case).
pub fn load(buf: &[u8], password: &[u8], _options: &DocumentOptions) -> Result<LoadedDocument> {
    let version = parser::parse_header(buf).ok_or(ParseError::InvalidFileHeader)?;
    let xref_start = parser::find_startxref(buf)?;
    if xref_start > buf.len() {
        return Err(Error::Xref(crate::error::XrefError::Start));
    }

    let (mut table, mut trailer, mut any_xref_is_stream) = read_xref_section(buf, xref_start)?;
    let mut seen = HashSet::new();
    seen.insert(xref_start);

    let mut prev = trailer.remove(b"Prev").and_then(|o| o.as_i64().ok());
    while let Some(offset) = prev {
        if offset < 0 || offset as usize > buf.len() || !seen.insert(offset as usize) {
            break;
        }
        let (prev_table, mut prev_trailer, is_stream) = read_xref_section(buf, offset as usize)?;
        any_xref_is_stream |= is_stream;
        table.merge_older(prev_table);
        trailer.merge_keep_self(&prev_trailer);
        prev = prev_trailer.remove(b"Prev").and_then(|o| o.as_i64().ok());
    }

    let xref_entry_count = table.max_id() + 1;
    if table.size != xref_entry_count {
        warn!("trailer /Size is {}, correct value is {xref_entry_count}", table.size);
        table.size = xref_entry_count;
    }

    if any_xref_is_stream && trailer.has(b"Encrypt") {
        return Err(Error::EncryptedXrefStream);
    }

    let security = match trailer.get(b"Encrypt").and_then(Object::as_reference) {
        Ok(enc_ref) => Some(load_security_handler(buf, &table, enc_ref, &trailer, password)?),
        Err(_) => None,
    };

    let objects = load_objects(buf, &table, security.as_ref())?;

    Ok(LoadedDocument { version, trailer, xref: table, objects })
}

fn load_security_handler(
    buf: &[u8], table: &XrefTable, enc_ref: ObjectId, trailer: &Dictionary, password: &[u8],
) -> Result<(ObjectId, StandardSecurityHandler)> {
    let offset = match table.get(enc_ref.0) {
        Some(XrefEntry::InUse { offset, .. }) => *offset as usize,
        _ => return Err(Error::MissingXrefEntry),
    };
    let (_, enc_obj) = parser::read_indirect_object(buf, offset, &NoLengthResolver)?;
    let enc_dict = enc_obj.as_dict().map_err(|_| Error::Decryption("Encrypt entry is not a dictionary".into()))?;

    let mut handler = StandardSecurityHandler::from_dicts(enc_dict, trailer)?;
    handler.compute_user_key(password);
    if handler.authenticate_user_password(password) {
        return Ok((enc_ref, handler));
    }
    if handler.authenticate_owner_password(password) {
        return Ok((enc_ref, handler));
    }
    Err(Error::InvalidPassword)
}

fn load_objects(
    buf: &[u8], table: &XrefTable, security: Option<&(ObjectId, StandardSecurityHandler)>,
) -> Result<BTreeMap<ObjectId, Object>> {
    let mut objects = BTreeMap::new();
    let mut pending_streams = Vec::new();
    let resolver = TableLengthResolver { buf, table };

    for (&major, entry) in table.entries.iter() {
        let (offset, generation) = match entry {
            XrefEntry::InUse { offset, generation } => (*offset as usize, *generation),
            _ => continue,
        };
        if offset >= buf.len() {
            warn!("object {major} {generation} has an out-of-range offset {offset}");
            continue;
        }
        let (id, mut object) = match parser::read_indirect_object(buf, offset, &resolver) {
            Ok(v) => v,
            Err(e) => {
                error!("failed to load object {major} {generation} at offset {offset}: {e}");
                continue;
            }
        };

        if let Some((enc_ref, handler)) = security {
            if id != *enc_ref {
                handler.decrypt_object((id.0, generation), &mut object);
            }
        }

        if let Ok(stream) = object.as_stream() {
            if stream.dict.has_type(b"ObjStm") {
                pending_streams.push((major, object));
                continue;
            }
        }
        objects.insert((id.0, generation), object);
    }

    for (container, mut stream_obj) in pending_streams {
        let stream = stream_obj.as_stream_mut().expect("pushed only Stream objects");
        match object_stream::read_object_stream(stream) {
            Ok(pairs) => {
                for (id, obj) in pairs {
                    // spec.md §4.4: an object whose table entry doesn't point to
                    // this container is a stale/duplicate copy and is skipped.
                    match table.get(id.0) {
                        Some(XrefEntry::Compressed { container: c, .. }) if *c == container => {
                            // First definition wins for duplicate ids across object streams.
                            objects.entry(id).or_insert(obj);
                        }
                        _ => {}
                    }
                }
            }
            Err(e) => error!("failed to materialize an object stream: {e}"),
        }
    }

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let obj1_offset = buf.len();
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_offset = buf.len();
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        let obj3_offset = buf.len();
        buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n");
        let xref_offset = buf.len();
        buf.extend_from_slice(b"xref\n0 4\n");
        buf.extend_from_slice(b"0000000000 65535 f \n");
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj1_offset).as_bytes());
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj2_offset).as_bytes());
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj3_offset).as_bytes());
        buf.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());
        buf
    }

    #[test]
    fn loads_a_three_object_document() {
        let buf = minimal_pdf();
        let options = DocumentOptions::default();
        let loaded = load(&buf, b"", &options).unwrap();
        assert_eq!(loaded.version, (1, 4));
        assert_eq!(loaded.objects.len(), 3);
        assert_eq!(loaded.trailer.get(b"Root").unwrap().as_reference().unwrap(), (1, 0));
    }

    #[test]
    fn compressed_entry_from_wrong_container_is_skipped() {
        // Object 10's table entry says it lives in container 100. A second,
        // stale object stream (container 200) also claims to define object 10;
        // its copy must never surface since the table doesn't point to it.
        let mut buf = Vec::new();

        let header_a = b"10 0 ";
        let body_a = b"true";
        let mut content_a = header_a.to_vec();
        content_a.extend_from_slice(body_a);
        let obj_a_offset = buf.len();
        buf.extend_from_slice(format!("100 0 obj\n<< /Type /ObjStm /N 1 /First {} /Length {} >>\nstream\n", header_a.len(), content_a.len()).as_bytes());
        buf.extend_from_slice(&content_a);
        buf.extend_from_slice(b"\nendstream\nendobj\n");

        let header_b = b"10 0 ";
        let body_b = b"false";
        let mut content_b = header_b.to_vec();
        content_b.extend_from_slice(body_b);
        let obj_b_offset = buf.len();
        buf.extend_from_slice(format!("200 0 obj\n<< /Type /ObjStm /N 1 /First {} /Length {} >>\nstream\n", header_b.len(), content_b.len()).as_bytes());
        buf.extend_from_slice(&content_b);
        buf.extend_from_slice(b"\nendstream\nendobj\n");

        let mut table = XrefTable::new();
        table.force_insert(100, XrefEntry::InUse { offset: obj_a_offset as u32, generation: 0 });
        table.force_insert(200, XrefEntry::InUse { offset: obj_b_offset as u32, generation: 0 });
        table.force_insert(10, XrefEntry::Compressed { container: 100, index: 0 });

        let objects = load_objects(&buf, &table, None).unwrap();
        assert_eq!(objects.get(&(10, 0)).unwrap().as_bool().unwrap(), true);
    }

    #[test]
    fn unencrypted_document_has_no_security_handler_requirement() {
        let buf = minimal_pdf();
        let options = DocumentOptions::default();
        let loaded = load(&buf, b"wrong-password-does-not-matter", &options).unwrap();
        assert_eq!(loaded.objects.len(), 3);
    }

    #[test]
    fn encrypted_document_with_xref_stream_is_refused() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.5\n");
        let xref_obj_offset = buf.len();
        let rows: &[u8] = &[0, 0, 0]; // single free entry covering object 0
        buf.extend_from_slice(
            format!(
                "3 0 obj\n<< /Type /XRef /W [1 1 1] /Size 1 /Root 1 0 R /Encrypt 2 0 R /Length {} >>\nstream\n",
                rows.len()
            )
            .as_bytes(),
        );
        buf.extend_from_slice(rows);
        buf.extend_from_slice(b"\nendstream\nendobj\n");
        buf.extend_from_slice(format!("startxref\n{xref_obj_offset}\n%%EOF").as_bytes());

        let options = DocumentOptions::default();
        let err = load(&buf, b"", &options).unwrap_err();
        assert_eq!(err, Error::EncryptedXrefStream);
    }
}
