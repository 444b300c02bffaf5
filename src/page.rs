//! Page editing primitives (`spec.md` §4.9/§4.10): draw a line, draw text,
//! crop, merge two pages, and the Form-XObject packaging step those
//! operations lean on. Grounded in `pdf_doc.cpp`'s `PdfPage` methods and
//! `pdf_page_to_xobj`/`stream_to_xobj`, restructured around a plain object
//! table (`BTreeMap<ObjectId, Object>`) instead of a document-owned table the
//! page methods reach through `self.doc`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::fonts::StandardFont;
use crate::geometry::{Matrix, Rect};
use crate::object::{Object, Stream};
use crate::object_id::ObjectId;

/// Process-wide counter backing the `xoN` resource names `pdf_page_to_xobj`
/// hands out, so two pages merged together never collide on an XObject name.
static XOBJECT_REVISION: AtomicU32 = AtomicU32::new(1);

fn next_xobject_name() -> String {
    format!("xo{}", XOBJECT_REVISION.fetch_add(1, Ordering::Relaxed))
}

/// A page being edited: its object id in `objects`, its paper rect, whether
/// the crop box overrides the paper size, and a pending transform matrix that
/// `apply_transformation` flushes into the content stream lazily.
pub struct Page {
    pub id: ObjectId,
    pub paper: Rect,
    pub bbox: Rect,
    pub bbox_is_cropbox: bool,
    pub matrix: Matrix,
}

impl Page {
    pub fn page_size(&self) -> Rect {
        if self.bbox_is_cropbox {
            self.bbox
        } else {
            self.paper
        }
    }

    /// Flushes `self.matrix` into the content stream as `q <cm operands> cm\n
    /// ... Q` and resets it to identity, matching `applyTransformation`'s
    /// "must be called before drawing or cropping" contract.
    pub fn apply_transformation(&mut self, objects: &mut BTreeMap<ObjectId, Object>) -> Result<()> {
        if self.matrix.is_identity() {
            return Ok(());
        }
        let content_id = content_stream_id(objects, self.id)?;
        let stream = object_stream_mut(objects, content_id)?;
        if !stream.content.is_empty() {
            let [a, b, c, d, e, f] = self.matrix.to_cm_operands();
            let prefix = format!("q {a} {b} {c} {d} {e} {f} cm\n");
            prepend(stream, prefix.as_bytes());
            append(stream, b" Q");
        }
        self.matrix = Matrix::identity();
        Ok(())
    }

    /// Repositions and resizes the page under `mat`, leaving the drawing
    /// commands pending until `apply_transformation` runs.
    pub fn transform(&mut self, objects: &mut BTreeMap<ObjectId, Object>, mat: &Matrix) -> Result<()> {
        to_xobj(objects, self)?;
        self.matrix.multiply(mat);
        self.bbox = mat.transform_rect(self.bbox);
        self.paper = mat.transform_rect(self.paper);
        Ok(())
    }

    pub fn draw_line(&mut self, objects: &mut BTreeMap<ObjectId, Object>, begin: (f64, f64), end: (f64, f64), width: f64) -> Result<()> {
        self.apply_transformation(objects)?;
        to_xobj(objects, self)?;
        let cmd = format!("\nq {width} w {} {} m {} {} l S Q", begin.0, begin.1, end.0, end.1);
        let content_id = content_stream_id(objects, self.id)?;
        append(object_stream_mut(objects, content_id)?, cmd.as_bytes());
        Ok(())
    }

    /// Draws `text` at `pos` with `font` at `size` points, installing the
    /// font resource under `/F<BaseName>` if it isn't already there
    /// (`drawText`: "if the page contains /FHelvetica already ... both font
    /// objects will be identical" so re-adding it is harmless).
    pub fn draw_text(&mut self, objects: &mut BTreeMap<ObjectId, Object>, text: &str, pos: (f64, f64), size: i64, font: StandardFont) -> Result<()> {
        self.apply_transformation(objects)?;
        to_xobj(objects, self)?;

        let font_id = install_font(objects, font);
        let page_dict = objects.get_mut(&self.id).ok_or(Error::MissingXrefEntry)?.as_dict_mut()?;
        let resources = page_dict.get_mut(b"Resources")?.as_dict_mut()?;
        let font_dict = match resources.get_mut(b"Font") {
            Ok(Object::Dictionary(_)) => resources.get_mut(b"Font")?.as_dict_mut()?,
            _ => {
                resources.set("Font", Object::Dictionary(Dictionary::new()));
                resources.get_mut(b"Font")?.as_dict_mut()?
            }
        };
        font_dict.set(font.resource_name(), Object::Reference(font_id));

        let escaped = text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)");
        let cmd = format!("\nq BT /{} {size} Tf  {} {} Td  ({escaped}) Tj ET Q", font.resource_name(), pos.0, pos.1);
        let content_id = content_stream_id(objects, self.id)?;
        append(object_stream_mut(objects, content_id)?, cmd.as_bytes());
        Ok(())
    }

    /// Clips drawing to `box_` by wrapping the existing content in a `re W n`
    /// clip path (`crop`: prepend the clip, append the closing `Q`).
    pub fn crop(&mut self, objects: &mut BTreeMap<ObjectId, Object>, box_: Rect) -> Result<()> {
        self.apply_transformation(objects)?;
        to_xobj(objects, self)?;
        let cmd = format!("q {} {} {} {} re W n\n", box_.left.x, box_.left.y, box_.width(), box_.height());
        let content_id = content_stream_id(objects, self.id)?;
        let stream = object_stream_mut(objects, content_id)?;
        prepend(stream, cmd.as_bytes());
        append(stream, b" Q");
        Ok(())
    }

    /// Appends `other`'s content and resources onto `self`. Both pages must
    /// already be (or become) Form-XObject pages so their resource names
    /// never collide (`mergePage`: "No two different XObjects or Fonts have
    /// same name. So we can merge the Resources dicts safely").
    pub fn merge_page(&mut self, objects: &mut BTreeMap<ObjectId, Object>, other: &mut Page) -> Result<()> {
        self.apply_transformation(objects)?;
        other.apply_transformation(objects)?;
        to_xobj(objects, self)?;
        to_xobj(objects, other)?;

        let other_resources = objects.get(&other.id).ok_or(Error::MissingXrefEntry)?.as_dict()?.get(b"Resources")?.as_dict()?.clone();
        let self_dict = objects.get_mut(&self.id).ok_or(Error::MissingXrefEntry)?.as_dict_mut()?;
        self_dict.get_mut(b"Resources")?.as_dict_mut()?.merge_keep_self(&other_resources);

        let self_content = content_stream_id(objects, self.id)?;
        let other_content = content_stream_id(objects, other.id)?;
        let appended = objects.get(&other_content).ok_or(Error::MissingXrefEntry)?.as_stream()?.content.clone();
        let stream = object_stream_mut(objects, self_content)?;
        append(stream, b" ");
        append(stream, &appended);
        Ok(())
    }
}

fn content_stream_id(objects: &BTreeMap<ObjectId, Object>, page_id: ObjectId) -> Result<ObjectId> {
    objects.get(&page_id).ok_or(Error::MissingXrefEntry)?.as_dict()?.get(b"Contents")?.as_reference()
}

fn object_stream_mut(objects: &mut BTreeMap<ObjectId, Object>, id: ObjectId) -> Result<&mut Stream> {
    objects.get_mut(&id).ok_or(Error::MissingXrefEntry)?.as_stream_mut()
}

fn prepend(stream: &mut Stream, bytes: &[u8]) {
    let mut buf = bytes.to_vec();
    buf.extend_from_slice(&stream.content);
    stream.content = buf;
}

fn append(stream: &mut Stream, bytes: &[u8]) {
    stream.content.extend_from_slice(bytes);
}

fn new_object_id(objects: &BTreeMap<ObjectId, Object>) -> ObjectId {
    let next = objects.keys().map(|(major, _)| *major).max().unwrap_or(0) + 1;
    (next, 0)
}

fn install_font(objects: &mut BTreeMap<ObjectId, Object>, font: StandardFont) -> ObjectId {
    if let Some((&id, _)) = objects.iter().find(|(_, obj)| {
        obj.as_dict().ok().and_then(|d| d.get(b"BaseFont").ok()).and_then(|o| o.as_name().ok()) == Some(font.base_font_name().as_bytes())
    }) {
        return id;
    }
    let id = new_object_id(objects);
    objects.insert(id, Object::Dictionary(font.to_font_dict()));
    id
}

/// Packages `page`'s current contents (direct stream, array of streams, or
/// absent) as a Form XObject and rewrites the page to invoke it via `Do`, so
/// drawing operators can be appended afterwards without disturbing whatever
/// content the page started with. No-op if the page has already been
/// converted (`pdf_page_to_xobj`: "we have already converted to xobj, nothing
/// to do").
fn to_xobj(objects: &mut BTreeMap<ObjectId, Object>, page: &mut Page) -> Result<()> {
    let page_dict = objects.get(&page.id).ok_or(Error::MissingXrefEntry)?.as_dict()?.clone();
    if already_converted(&page_dict) {
        return Ok(());
    }

    let contents_obj = page_dict.get(b"Contents").ok().cloned();
    let merged_content: Vec<u8> = match contents_obj {
        Some(Object::Reference(id)) => match objects.get(&id).cloned() {
            Some(Object::Stream(mut s)) => {
                s.decompress()?;
                s.content
            }
            _ => Vec::new(),
        },
        Some(Object::Array(items)) => {
            let mut buf = Vec::new();
            for item in items {
                if let Ok(id) = item.as_reference() {
                    if let Some(Object::Stream(mut s)) = objects.get(&id).cloned() {
                        s.decompress()?;
                        buf.push(b' ');
                        buf.extend_from_slice(&s.content);
                    }
                }
            }
            buf
        }
        Some(Object::Stream(mut s)) => {
            s.decompress()?;
            s.content
        }
        None => Vec::new(),
        Some(_) => {
            log::warn!("page contents is neither a stream nor an array");
            Vec::new()
        }
    };

    let resources = page_dict.get(b"Resources").ok().and_then(|o| o.as_dict().ok()).cloned();

    let mut xobj_dict = Dictionary::new();
    xobj_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobj_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobj_dict.set("FormType", Object::Integer(1));
    page.bbox.set_to_object(&mut xobj_dict, "BBox");
    if let Some(res) = resources.clone() {
        xobj_dict.set("Resources", Object::Dictionary(res));
    }
    let mut xobj_stream = Stream::new(xobj_dict, merged_content);
    xobj_stream.decoded = true;
    xobj_stream.compress_flate();
    let xobj_id = new_object_id(objects);
    objects.insert(xobj_id, Object::Stream(xobj_stream));

    let xobj_name = next_xobject_name();
    let mut xobject_dict = Dictionary::new();
    xobject_dict.set(xobj_name.clone(), Object::Reference(xobj_id));

    let mut new_resources = Dictionary::new();
    new_resources.set("ProcSet", Object::Array(vec![Object::Name(b"PDF".to_vec())]));
    new_resources.set("XObject", Object::Dictionary(xobject_dict));

    let invoke = format!("q /{xobj_name} Do Q");
    let content_id = new_object_id_after(objects, xobj_id);
    let mut content_stream = Stream::new(Dictionary::new(), invoke.into_bytes());
    content_stream.decoded = true;
    objects.insert(content_id, Object::Stream(content_stream));

    let mut new_dict = Dictionary::new();
    new_dict.set("Type", Object::Name(b"Page".to_vec()));
    new_dict.set("Contents", Object::Reference(content_id));
    new_dict.set("Parent", page_dict.get(b"Parent").ok().cloned().unwrap_or(Object::Null));
    new_dict.set("Resources", Object::Dictionary(new_resources));
    objects.insert(page.id, Object::Dictionary(new_dict));
    Ok(())
}

fn new_object_id_after(objects: &BTreeMap<ObjectId, Object>, reserved: ObjectId) -> ObjectId {
    let candidate = new_object_id(objects);
    if candidate == reserved {
        (candidate.0 + 1, 0)
    } else {
        candidate
    }
}

fn already_converted(dict: &Dictionary) -> bool {
    dict.get(b"Resources")
        .ok()
        .and_then(|o| o.as_dict().ok())
        .map(|r| r.has(b"XObject"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page(objects: &mut BTreeMap<ObjectId, Object>) -> Page {
        let content_id = (2, 0);
        objects.insert(content_id, Object::Stream({
            let mut s = Stream::new(Dictionary::new(), b"1 0 0 RG".to_vec());
            s.decoded = true;
            s
        }));
        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set("Resources", Object::Dictionary(Dictionary::new()));
        objects.insert((1, 0), Object::Dictionary(page_dict));
        Page { id: (1, 0), paper: Rect::new(0.0, 0.0, 612.0, 792.0), bbox: Rect::new(0.0, 0.0, 612.0, 792.0), bbox_is_cropbox: false, matrix: Matrix::identity() }
    }

    #[test]
    fn draw_line_converts_page_to_xobj_and_appends_operator() {
        let mut objects = BTreeMap::new();
        let mut page = sample_page(&mut objects);
        page.draw_line(&mut objects, (0.0, 0.0), (100.0, 100.0), 1.0).unwrap();
        let content_id = content_stream_id(&objects, page.id).unwrap();
        let content = objects.get(&content_id).unwrap().as_stream().unwrap();
        let text = String::from_utf8_lossy(&content.content);
        assert!(text.contains(" l S Q"));
        let page_dict = objects.get(&page.id).unwrap().as_dict().unwrap();
        assert!(page_dict.get(b"Resources").unwrap().as_dict().unwrap().has(b"XObject"));
    }

    #[test]
    fn draw_text_installs_font_resource() {
        let mut objects = BTreeMap::new();
        let mut page = sample_page(&mut objects);
        page.draw_text(&mut objects, "hello", (10.0, 20.0), 12, StandardFont::Helvetica).unwrap();
        let page_dict = objects.get(&page.id).unwrap().as_dict().unwrap();
        let fonts = page_dict.get(b"Resources").unwrap().as_dict().unwrap().get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"FHelvetica"));
    }

    #[test]
    fn crop_wraps_content_in_clip_path() {
        let mut objects = BTreeMap::new();
        let mut page = sample_page(&mut objects);
        page.crop(&mut objects, Rect::new(0.0, 0.0, 300.0, 300.0)).unwrap();
        let content_id = content_stream_id(&objects, page.id).unwrap();
        let content = objects.get(&content_id).unwrap().as_stream().unwrap();
        let text = String::from_utf8_lossy(&content.content);
        assert!(text.starts_with("q 0 0 300 300 re W n"));
        assert!(text.trim_end().ends_with('Q'));
    }

    #[test]
    fn merge_page_joins_content_and_resources() {
        let mut objects = BTreeMap::new();
        let mut page1 = sample_page(&mut objects);
        let mut page2_dict = Dictionary::new();
        let content2_id = (20, 0);
        objects.insert(content2_id, Object::Stream({
            let mut s = Stream::new(Dictionary::new(), b"0 0 1 RG".to_vec());
            s.decoded = true;
            s
        }));
        page2_dict.set("Type", Object::Name(b"Page".to_vec()));
        page2_dict.set("Contents", Object::Reference(content2_id));
        page2_dict.set("Resources", Object::Dictionary(Dictionary::new()));
        objects.insert((10, 0), Object::Dictionary(page2_dict));
        let mut page2 = Page { id: (10, 0), paper: page1.paper, bbox: page1.bbox, bbox_is_cropbox: false, matrix: Matrix::identity() };

        page1.merge_page(&mut objects, &mut page2).unwrap();
        let content_id = content_stream_id(&objects, page1.id).unwrap();
        let content = objects.get(&content_id).unwrap().as_stream().unwrap();
        assert!(content.content.len() > 0);
    }

    #[test]
    fn page_size_prefers_cropbox_when_flagged() {
        let page = Page { id: (1, 0), paper: Rect::new(0.0, 0.0, 612.0, 792.0), bbox: Rect::new(0.0, 0.0, 300.0, 300.0), bbox_is_cropbox: true, matrix: Matrix::identity() };
        assert_eq!(page.page_size(), Rect::new(0.0, 0.0, 300.0, 300.0));
    }
}
