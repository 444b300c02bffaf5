//! Object table emission (`spec.md` §4.7): reachability sweep, renumbering,
//! then a byte-exact classical xref + trailer writer, built in the style of
//! the teacher pack's writer examples (a recursive `serialize` over the tagged
//! object enum, tracking each object's offset as it's appended to the buffer).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object::{Object, Stream, StringFormat};
use crate::object_id::ObjectId;

/// Walks every value reachable from `trailer`'s `/Root` (and `/Info`, if
/// present) to find which object numbers survive emission.
fn sweep_reachable(objects: &BTreeMap<ObjectId, Object>, trailer: &Dictionary) -> HashSet<u32> {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();
    for key in [&b"Root"[..], b"Info"] {
        if let Ok(id) = trailer.get(key).and_then(Object::as_reference) {
            queue.push_back(id);
        }
    }
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id.0) {
            continue;
        }
        if let Some(obj) = objects.get(&id) {
            collect_refs(obj, &mut queue);
        }
    }
    reachable
}

fn collect_refs(obj: &Object, queue: &mut VecDeque<ObjectId>) {
    match obj {
        Object::Reference(id) => queue.push_back(*id),
        Object::Array(items) => items.iter().for_each(|i| collect_refs(i, queue)),
        Object::Dictionary(d) => d.iter().for_each(|(_, v)| collect_refs(v, queue)),
        Object::Stream(s) => s.dict.iter().for_each(|(_, v)| collect_refs(v, queue)),
        _ => {}
    }
}

/// Compacts the surviving object ids into a dense `1..=n` prefix and rewrites
/// every indirect reference accordingly (`spec.md` §4.7 step (d)).
fn renumber(
    objects: &BTreeMap<ObjectId, Object>, reachable: &HashSet<u32>,
) -> (BTreeMap<ObjectId, Object>, HashMap<u32, u32>) {
    let mut mapping = HashMap::new();
    let mut next = 1u32;
    for &(major, _) in objects.keys().filter(|id| reachable.contains(&id.0)) {
        mapping.entry(major).or_insert_with(|| {
            let id = next;
            next += 1;
            id
        });
    }

    let mut renumbered = BTreeMap::new();
    for (&(major, gen), obj) in objects.iter() {
        if let Some(&new_major) = mapping.get(&major) {
            renumbered.insert((new_major, gen), rewrite_refs(obj, &mapping));
        }
    }
    (renumbered, mapping)
}

pub(crate) fn rewrite_refs(obj: &Object, mapping: &HashMap<u32, u32>) -> Object {
    match obj {
        Object::Reference((major, gen)) => match mapping.get(major) {
            Some(&new_major) => Object::Reference((new_major, *gen)),
            None => Object::Null,
        },
        Object::Array(items) => Object::Array(items.iter().map(|i| rewrite_refs(i, mapping)).collect()),
        Object::Dictionary(d) => Object::Dictionary(rewrite_dict(d, mapping)),
        Object::Stream(s) => Object::Stream(Stream { dict: rewrite_dict(&s.dict, mapping), content: s.content.clone(), decoded: s.decoded }),
        other => other.clone(),
    }
}

fn rewrite_dict(dict: &Dictionary, mapping: &HashMap<u32, u32>) -> Dictionary {
    dict.iter().map(|(k, v)| (k.clone(), rewrite_refs(v, mapping))).collect()
}

/// Serializes `trailer` + `objects` into a complete PDF byte buffer: a
/// `%PDF-x.y` header, every surviving object as `major 0 obj ... endobj`, a
/// classical xref table, and a `trailer ... startxref ... %%EOF` tail
/// (`spec.md` §4.7).
pub fn write_document(version: (u8, u8), trailer: &Dictionary, objects: &BTreeMap<ObjectId, Object>) -> Result<Vec<u8>> {
    let reachable = sweep_reachable(objects, trailer);
    if reachable.is_empty() {
        return Err(Error::EmptyDocument);
    }
    let (renumbered, mapping) = renumber(objects, &reachable);

    let mut buf = Vec::new();
    buf.extend_from_slice(format!("%PDF-{}.{}\n", version.0, version.1).as_bytes());
    buf.extend_from_slice(&[0xDE, 0xAD, 0x20, 0xBE, 0xEF, 0x0A]);

    let max_id = renumbered.keys().map(|(m, _)| *m).max().unwrap_or(0);
    let mut offsets = vec![0u32; max_id as usize + 1];

    for (&(major, gen), obj) in renumbered.iter() {
        offsets[major as usize] = buf.len() as u32;
        buf.extend_from_slice(format!("{major} {gen} obj\n").as_bytes());
        write_object(&mut buf, obj);
        buf.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", max_id + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for &off in offsets.iter().skip(1) {
        buf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }

    let mut new_trailer = trailer.clone();
    new_trailer.remove(b"Prev");
    new_trailer.remove(b"Encrypt");
    new_trailer.remove(b"XRefStm");
    new_trailer.set("Size", Object::Integer(max_id as i64 + 1));
    for key in [&b"Root"[..], b"Info"] {
        if let Ok(&old) = new_trailer.get(key).and_then(Object::as_reference).as_ref() {
            if let Some(&new_major) = mapping.get(&old.0) {
                new_trailer.set(std::str::from_utf8(key).unwrap(), Object::Reference((new_major, 0)));
            }
        }
    }
    if !new_trailer.has(b"ID") {
        let id = Object::String(fresh_file_id(), StringFormat::Hexadecimal);
        new_trailer.set("ID", Object::Array(vec![id.clone(), id]));
    }

    buf.extend_from_slice(b"trailer\n");
    write_object(&mut buf, &Object::Dictionary(new_trailer));
    buf.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF").as_bytes());
    Ok(buf)
}

fn write_object(buf: &mut Vec<u8>, obj: &Object) {
    match obj {
        Object::Null => buf.extend_from_slice(b"null"),
        Object::Boolean(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => {
            let mut tmp = itoa::Buffer::new();
            buf.extend_from_slice(tmp.format(*i).as_bytes());
        }
        Object::Real(r) => buf.extend_from_slice(format_real(*r).as_bytes()),
        Object::Name(n) => {
            buf.push(b'/');
            write_name(buf, n);
        }
        Object::String(s, StringFormat::Literal) => {
            buf.push(b'(');
            write_escaped_literal(buf, s);
            buf.push(b')');
        }
        Object::String(s, StringFormat::Hexadecimal) => {
            buf.push(b'<');
            for byte in s {
                buf.extend_from_slice(format!("{byte:02x}").as_bytes());
            }
            buf.push(b'>');
        }
        Object::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_object(buf, item);
            }
            buf.push(b']');
        }
        Object::Dictionary(dict) => write_dict(buf, dict),
        Object::Stream(stream) => {
            let mut dict = stream.dict.clone();
            dict.set("Length", Object::Integer(stream.content.len() as i64));
            write_dict(buf, &dict);
            buf.extend_from_slice(b"\nstream\n");
            buf.extend_from_slice(&stream.content);
            buf.extend_from_slice(b"\nendstream");
        }
        Object::Reference((major, gen)) => buf.extend_from_slice(format!("{major} {gen} R").as_bytes()),
    }
}

fn write_dict(buf: &mut Vec<u8>, dict: &Dictionary) {
    buf.extend_from_slice(b"<< ");
    for (key, value) in dict.iter() {
        buf.push(b'/');
        write_name(buf, key);
        buf.push(b' ');
        write_object(buf, value);
        buf.push(b' ');
    }
    buf.extend_from_slice(b">>");
}

fn write_name(buf: &mut Vec<u8>, name: &[u8]) {
    for &b in name {
        if b.is_ascii_graphic() && !matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#') {
            buf.push(b);
        } else {
            buf.extend_from_slice(format!("#{b:02x}").as_bytes());
        }
    }
}

fn write_escaped_literal(buf: &mut Vec<u8>, s: &[u8]) {
    for &b in s {
        match b {
            b'(' => buf.extend_from_slice(b"\\("),
            b')' => buf.extend_from_slice(b"\\)"),
            b'\\' => buf.extend_from_slice(b"\\\\"),
            _ => buf.push(b),
        }
    }
}

/// A fresh 16-byte `/ID` entry, stamped on every save that doesn't already
/// carry one (`spec.md` doesn't require a stable `/ID`, but most PDF
/// consumers expect one to be present after a rewrite).
fn fresh_file_id() -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes.to_vec()
}

fn format_real(r: f64) -> String {
    let mut s = format!("{r}");
    if !s.contains('.') {
        return s;
    }
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
