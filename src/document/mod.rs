//! The `Document` type: the public surface over a loaded object graph, its
//! page list, and the editing/merge/save operations built on top of
//! `reader::load`, `page::Page`, and this module's page-tree and emission
//! helpers (`spec.md` §4.5-§4.11, plus the supplemented editing primitives
//! from `SPEC_FULL.md` §C).

pub mod pages;
pub mod write;

use std::collections::BTreeMap;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::fonts::StandardFont;
use crate::geometry::{Matrix, Rect};
use crate::object::{Object, Stream};
use crate::object_id::ObjectId;
use crate::options::DocumentOptions;
use crate::page::Page;
use crate::paper::{resolve_orientation, Orientation};
use crate::reader;

pub struct Document {
    pub version: (u8, u8),
    pub trailer: Dictionary,
    pub objects: BTreeMap<ObjectId, Object>,
    pub pages: Vec<Page>,
    options: DocumentOptions,
}

impl Document {
    /// Loads, resolves the page tree, and (per `spec.md` §4.12) attempts
    /// empty-password decryption automatically before handing back a `Ready`
    /// document.
    pub fn load(buf: &[u8], options: DocumentOptions) -> Result<Document> {
        Self::open(buf, b"", options)
    }

    pub fn open(buf: &[u8], password: &[u8], options: DocumentOptions) -> Result<Document> {
        let mut loaded = reader::load(buf, password, &options)?;
        let root = loaded.trailer.get(b"Root").and_then(Object::as_reference)?;
        let catalog = loaded.objects.get(&root).ok_or(Error::MissingXrefEntry)?.as_dict()?;
        let pages_root = catalog.get(b"Pages").and_then(Object::as_reference)?;
        let pages = pages::resolve_pages(&loaded.objects, pages_root)?;

        if options.repair_mode {
            pages::narrow_page_dicts(&mut loaded.objects, &pages);
        }

        Ok(Document { version: loaded.version, trailer: loaded.trailer, objects: loaded.objects, pages, options })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn root_id(&self) -> Result<ObjectId> {
        self.trailer.get(b"Root").and_then(Object::as_reference)
    }

    /// Reorders pages per `new_order`, a list of old 1-based page indices,
    /// e.g. `[2, 1, 3]` swaps the first two pages.
    pub fn reorder_pages(&mut self, new_order: &[usize]) -> Result<()> {
        let mut reordered = Vec::with_capacity(new_order.len());
        for &i in new_order {
            let page = self.pages.get(i.wrapping_sub(1)).ok_or(Error::EmptyDocument)?;
            reordered.push(Page { id: page.id, paper: page.paper, bbox: page.bbox, bbox_is_cropbox: page.bbox_is_cropbox, matrix: page.matrix });
        }
        self.pages = reordered;
        Ok(())
    }

    /// Drops the 1-based page numbers in `indices`.
    pub fn delete_pages(&mut self, indices: &[usize]) {
        let mut i = 1;
        self.pages.retain(|_| {
            let keep = !indices.contains(&i);
            i += 1;
            keep
        });
    }

    /// Keeps only pages whose 1-based index `n` satisfies `n % modulus ==
    /// remainder`, the booklet/n-up selection idiom (`cmd_exec.cpp`'s
    /// `pageModulo`).
    pub fn modulo(&mut self, modulus: usize, remainder: usize) {
        let mut i = 1;
        self.pages.retain(|_| {
            let keep = modulus != 0 && i % modulus == remainder;
            i += 1;
            keep
        });
    }

    /// Inserts a blank page at `page_num` (1-based), or appends one if
    /// `page_num` is `None`, copying the paper size of the nearest existing
    /// page (`pdf_doc.cpp`'s `newBlankPage`).
    pub fn insert_blank_page(&mut self, page_num: Option<usize>) -> Result<()> {
        let insert_at = page_num.unwrap_or(self.pages.len() + 1);
        if insert_at < 1 || insert_at > self.pages.len() + 1 {
            return Err(Error::EmptyDocument);
        }

        let reference_index = if insert_at > self.pages.len() || insert_at % 2 == 0 { insert_at.saturating_sub(1) } else { insert_at };
        let (paper, bbox, bbox_is_cropbox) = match self.pages.get(reference_index.saturating_sub(1)) {
            Some(p) => (p.paper, p.bbox, p.bbox_is_cropbox),
            None => (Rect::new(0.0, 0.0, self.options.default_paper.0, self.options.default_paper.1), Rect::new(0.0, 0.0, self.options.default_paper.0, self.options.default_paper.1), false),
        };

        let content_id = self.alloc_id();
        let mut content = Stream::new(Dictionary::new(), Vec::new());
        content.decoded = true;
        self.objects.insert(content_id, Object::Stream(content));

        let page_id = self.alloc_id();
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(self.root_id()?));
        dict.set("Resources", Object::Dictionary(Dictionary::new()));
        dict.set("Contents", Object::Reference(content_id));
        self.objects.insert(page_id, Object::Dictionary(dict));

        let page = Page { id: page_id, paper, bbox, bbox_is_cropbox, matrix: Matrix::identity() };
        if insert_at > self.pages.len() {
            self.pages.push(page);
        } else {
            self.pages.insert(insert_at - 1, page);
        }
        Ok(())
    }

    fn alloc_id(&self) -> ObjectId {
        (self.objects.keys().map(|(m, _)| *m).max().unwrap_or(0) + 1, 0)
    }

    /// Composes `n` pages of input onto one output page, scaled and laid out
    /// in a grid, using only the public `Page::transform`/`Page::merge_page`
    /// primitives (`doc_edit.cpp`'s `nup`).
    pub fn impose_n_up(&mut self, n: usize, orientation: Orientation) -> Result<()> {
        if n == 0 || self.pages.is_empty() {
            return Ok(());
        }
        let cols = (n as f64).sqrt().ceil() as usize;
        let rows = n.div_ceil(cols);

        let mut imposed = Vec::new();
        let mut chunk_start = 0;
        while chunk_start < self.pages.len() {
            let chunk_end = (chunk_start + n).min(self.pages.len());
            let mut sheet_size = self.pages[chunk_start].page_size();
            resolve_orientation(&mut sheet_size, orientation);
            let (sheet_w, sheet_h) = (sheet_size.width(), sheet_size.height());
            let sheet = self.new_blank_sheet(sheet_w, sheet_h)?;
            let mut sheet_page = sheet;

            let cell_w = sheet_w / cols as f64;
            let cell_h = sheet_h / rows as f64;
            for (slot, idx) in (chunk_start..chunk_end).enumerate() {
                let (col, row) = (slot % cols, slot / cols);
                let source_size = self.pages[idx].page_size();
                let scale = (cell_w / source_size.width()).min(cell_h / source_size.height());
                let tx = col as f64 * cell_w;
                let ty = sheet_h - (row as f64 + 1.0) * cell_h;

                let mut mat = Matrix::identity();
                mat.scale(scale);
                mat.translate(tx, ty);
                self.pages[idx].transform(&mut self.objects, &mat)?;
                let mut source = Page { id: self.pages[idx].id, paper: self.pages[idx].paper, bbox: self.pages[idx].bbox, bbox_is_cropbox: self.pages[idx].bbox_is_cropbox, matrix: self.pages[idx].matrix };
                sheet_page.merge_page(&mut self.objects, &mut source)?;
            }
            imposed.push(sheet_page);
            chunk_start = chunk_end;
        }

        self.pages = imposed;
        Ok(())
    }

    fn new_blank_sheet(&mut self, width: f64, height: f64) -> Result<Page> {
        let content_id = self.alloc_id();
        let mut content = Stream::new(Dictionary::new(), Vec::new());
        content.decoded = true;
        self.objects.insert(content_id, Object::Stream(content));

        let page_id = self.alloc_id();
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Resources", Object::Dictionary(Dictionary::new()));
        dict.set("Contents", Object::Reference(content_id));
        self.objects.insert(page_id, Object::Dictionary(dict));

        let rect = Rect::new(0.0, 0.0, width, height);
        Ok(Page { id: page_id, paper: rect, bbox: rect, bbox_is_cropbox: false, matrix: Matrix::identity() })
    }

    pub fn draw_line_on_page(&mut self, page_index: usize, begin: (f64, f64), end: (f64, f64), width: f64) -> Result<()> {
        let page = self.pages.get_mut(page_index).ok_or(Error::EmptyDocument)?;
        page.draw_line(&mut self.objects, begin, end, width)
    }

    pub fn draw_text_on_page(&mut self, page_index: usize, text: &str, pos: (f64, f64), size: i64, font: StandardFont) -> Result<()> {
        let page = self.pages.get_mut(page_index).ok_or(Error::EmptyDocument)?;
        page.draw_text(&mut self.objects, text, pos, size, font)
    }

    pub fn crop_page(&mut self, page_index: usize, rect: Rect) -> Result<()> {
        let page = self.pages.get_mut(page_index).ok_or(Error::EmptyDocument)?;
        page.crop(&mut self.objects, rect)
    }

    /// Appends `other`'s object table onto `self`'s (`spec.md` §4.11): grows
    /// the numbering space by `|other| - 1` (its entry 0 is dropped), shifts
    /// every one of `other`'s object numbers and internal references by
    /// `self`'s current highest object number, re-parents `other`'s pages,
    /// and physically moves its objects into `self`.
    pub fn merge(&mut self, other: Document) -> Result<()> {
        let shift = self.objects.keys().map(|(m, _)| *m).max().unwrap_or(0);
        let mut remap = std::collections::HashMap::new();
        for &(major, _) in other.objects.keys() {
            remap.entry(major).or_insert(major + shift);
        }

        for (&(major, gen), obj) in other.objects.iter() {
            let new_id = (*remap.get(&major).unwrap(), gen);
            self.objects.insert(new_id, write::rewrite_refs(obj, &remap));
        }

        let root_id = self.root_id()?;
        for mut page in other.pages {
            page.id = (remap[&page.id.0], page.id.1);
            if let Ok(dict) = self.objects.get_mut(&page.id).ok_or(Error::MissingXrefEntry)?.as_dict_mut() {
                dict.set("Parent", Object::Reference(root_id));
            }
            self.pages.push(page);
        }
        Ok(())
    }

    /// Rebuilds the page tree, flushes every page's pending transform, and
    /// emits a fresh object table (`spec.md` §4.7/§4.8/§4.10: "just before
    /// save" is when pending transforms are guaranteed flushed).
    pub fn save(&mut self) -> Result<Vec<u8>> {
        for page in &mut self.pages {
            page.apply_transformation(&mut self.objects)?;
        }
        let root_id = self.root_id()?;
        let catalog_id = root_id;
        pages::rebuild_page_tree(&mut self.objects, &self.pages, catalog_id)?;
        write::write_document(self.version, &self.trailer, &self.objects)
    }
}
