//! Page tree resolver and reconstructor (`spec.md` §4.5, §4.8), grounded in
//! `reader/object_loader.rs`'s recursive dereferencing pattern but walking
//! `/Type /Pages` nodes instead of resolving a single object.

use std::collections::{BTreeMap, HashSet};

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::Object;
use crate::object_id::ObjectId;
use crate::page::Page;

/// Inheritable attributes accumulated while walking down the page tree.
#[derive(Clone, Default)]
struct Inherited {
    resources: Option<Dictionary>,
    media_box: Option<Rect>,
    crop_box: Option<Rect>,
}

/// Walks `root`'s `/Pages` node depth-first, merging inheritable `/Resources`
/// and box attributes into every leaf (`spec.md` §4.5: "a leaf without a box
/// inherits the nearest ancestor's").
pub fn resolve_pages(objects: &BTreeMap<ObjectId, Object>, root: ObjectId) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    let mut seen = HashSet::new();
    walk(objects, root, Inherited::default(), &mut pages, &mut seen)?;
    Ok(pages)
}

fn walk(
    objects: &BTreeMap<ObjectId, Object>, id: ObjectId, mut inherited: Inherited, pages: &mut Vec<Page>,
    seen: &mut HashSet<ObjectId>,
) -> Result<()> {
    if !seen.insert(id) {
        return Err(Error::ReferenceCycle(id));
    }
    let dict = objects.get(&id).ok_or(Error::MissingXrefEntry)?.as_dict()?;

    if let Ok(res) = dict.get(b"Resources").and_then(Object::as_dict) {
        inherited.resources = match inherited.resources.take() {
            Some(mut parent) => {
                parent.merge_keep_self(res);
                Some(parent)
            }
            None => Some(res.clone()),
        };
    }
    if let Ok(rect) = read_rect(objects, dict, b"MediaBox") {
        inherited.media_box = Some(rect);
    }
    if let Ok(rect) = read_rect(objects, dict, b"CropBox").or_else(|_| read_rect(objects, dict, b"TrimBox")) {
        inherited.crop_box = Some(rect);
    }

    if dict.has_type(b"Pages") {
        let kids = dict.get(b"Kids").and_then(Object::as_array).map_err(|_| Error::ObjectType(id))?;
        for kid in kids.clone() {
            let kid_id = kid.as_reference()?;
            walk(objects, kid_id, inherited.clone(), pages, seen)?;
        }
        seen.remove(&id);
        return Ok(());
    }

    // Leaf page.
    let paper = inherited.media_box.unwrap_or_else(|| Rect::new(0.0, 0.0, 612.0, 792.0));
    let (bbox, bbox_is_cropbox) = match inherited.crop_box {
        Some(r) => (r, true),
        None => (paper, false),
    };
    pages.push(Page { id, paper, bbox, bbox_is_cropbox, matrix: crate::geometry::Matrix::identity() });
    seen.remove(&id);
    Ok(())
}

fn read_rect(objects: &BTreeMap<ObjectId, Object>, dict: &Dictionary, key: &[u8]) -> Result<Rect> {
    let obj = dict.get(key)?;
    Rect::get_from_object(obj, &|id| objects.get(&id).cloned())
}

/// Narrows every Page leaf's dictionary to `{Type, Parent, Resources,
/// Contents}` (`spec.md` §4.5), dropping everything else (`/Annots`,
/// `/Group`, custom producer keys, ...). Only run under `repair_mode`: a
/// resource-inheritance pass has already copied what a leaf needs up into
/// `Inherited` before this runs, so the drop is safe, but it's still a lossy
/// rewrite and stays opt-in.
pub fn narrow_page_dicts(objects: &mut BTreeMap<ObjectId, Object>, pages: &[Page]) {
    const KEPT: &[&[u8]] = &[b"Type", b"Parent", b"Resources", b"Contents"];
    for page in pages {
        if let Some(Object::Dictionary(dict)) = objects.get_mut(&page.id) {
            dict.retain_keys(KEPT);
        }
    }
}

/// Fan-out used by the balanced `/Pages` tree (`spec.md` §4.8: "fan-out 50").
const FAN_OUT: usize = 50;

/// Rebuilds a balanced `/Pages` tree of fan-out 50 from `pages`, allocating
/// fresh node ids starting after the highest existing object number, and
/// repoints `catalog_id`'s `/Pages` entry to the new root.
pub fn rebuild_page_tree(objects: &mut BTreeMap<ObjectId, Object>, pages: &[Page], catalog_id: ObjectId) -> Result<ObjectId> {
    let mut next_id = objects.keys().map(|(m, _)| *m).max().unwrap_or(0) + 1;
    let mut alloc = move || {
        let id = (next_id, 0);
        next_id += 1;
        id
    };

    // Flush each page's current geometry back into its dictionary first.
    for page in pages {
        let dict = objects.get_mut(&page.id).ok_or(Error::MissingXrefEntry)?.as_dict_mut()?;
        page.paper.set_to_object(dict, "MediaBox");
        if page.bbox_is_cropbox && !page.bbox.is_zero() {
            page.bbox.set_to_object(dict, "CropBox");
        }
    }

    let mut level: Vec<(ObjectId, u32)> = pages.iter().map(|p| (p.id, 1)).collect();
    if level.is_empty() {
        return Err(Error::EmptyDocument);
    }

    // At least one Pages level is always built, even for a single page, since
    // the catalog's /Pages entry must reference a /Type /Pages node.
    let mut first_pass = true;
    while level.len() > 1 || first_pass {
        first_pass = false;
        let mut next_level = Vec::new();
        for group in level.chunks(FAN_OUT) {
            let node_id = alloc();
            let count: u32 = group.iter().map(|(_, c)| c).sum();
            let mut dict = Dictionary::new();
            dict.set("Type", Object::Name(b"Pages".to_vec()));
            dict.set("Kids", Object::Array(group.iter().map(|(id, _)| Object::Reference(*id)).collect()));
            dict.set("Count", Object::Integer(count as i64));
            for (kid_id, _) in group {
                if let Ok(kid_dict) = objects.get_mut(kid_id).ok_or(Error::MissingXrefEntry)?.as_dict_mut() {
                    kid_dict.set("Parent", Object::Reference(node_id));
                }
            }
            objects.insert(node_id, Object::Dictionary(dict));
            next_level.push((node_id, count));
        }
        level = next_level;
    }

    let root_id = level[0].0;
    if let Ok(root_dict) = objects.get_mut(&root_id).ok_or(Error::MissingXrefEntry)?.as_dict_mut() {
        root_dict.remove(b"Parent");
    }

    let catalog = objects.get_mut(&catalog_id).ok_or(Error::MissingXrefEntry)?.as_dict_mut()?;
    catalog.set("Pages", Object::Reference(root_id));
    Ok(root_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Stream;

    fn make_page(objects: &mut BTreeMap<ObjectId, Object>, id: ObjectId, parent: ObjectId) {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(parent));
        objects.insert(id, Object::Dictionary(dict));
    }

    #[test]
    fn resolves_nested_pages_inheriting_mediabox_and_resources() {
        let mut objects = BTreeMap::new();
        let mut parent_res = Dictionary::new();
        parent_res.set("Font", Object::Dictionary(Dictionary::new()));

        let mut root = Dictionary::new();
        root.set("Type", Object::Name(b"Pages".to_vec()));
        root.set("Kids", Object::Array(vec![Object::Reference((2, 0))]));
        root.set("MediaBox", Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)]));
        root.set("Resources", Object::Dictionary(parent_res));
        objects.insert((1, 0), Object::Dictionary(root));

        make_page(&mut objects, (2, 0), (1, 0));

        let pages = resolve_pages(&objects, (1, 0)).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].paper, Rect::new(0.0, 0.0, 612.0, 792.0));
        assert!(!pages[0].bbox_is_cropbox);
    }

    #[test]
    fn narrow_page_dicts_drops_everything_but_the_kept_keys() {
        let mut objects = BTreeMap::new();
        let id = (2, 0);
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference((1, 0)));
        dict.set("Resources", Object::Dictionary(Dictionary::new()));
        dict.set("Contents", Object::Reference((3, 0)));
        dict.set("Annots", Object::Array(vec![]));
        dict.set("Group", Object::Dictionary(Dictionary::new()));
        objects.insert(id, Object::Dictionary(dict));

        let pages = vec![Page { id, paper: Rect::new(0.0, 0.0, 612.0, 792.0), bbox: Rect::new(0.0, 0.0, 612.0, 792.0), bbox_is_cropbox: false, matrix: Default::default() }];
        narrow_page_dicts(&mut objects, &pages);

        let narrowed = objects.get(&id).unwrap().as_dict().unwrap();
        assert_eq!(narrowed.len(), 4);
        assert!(narrowed.has(b"Type"));
        assert!(narrowed.has(b"Parent"));
        assert!(narrowed.has(b"Resources"));
        assert!(narrowed.has(b"Contents"));
        assert!(!narrowed.has(b"Annots"));
        assert!(!narrowed.has(b"Group"));
    }

    #[test]
    fn rebuild_tree_groups_pages_into_fanout_of_fifty() {
        let mut objects = BTreeMap::new();
        let catalog_id = (1, 0);
        objects.insert(catalog_id, Object::Dictionary(Dictionary::new()));

        let mut pages = Vec::new();
        for i in 0..120u32 {
            let id = (100 + i, 0);
            let mut s = Stream::new(Dictionary::new(), Vec::new());
            s.decoded = true;
            objects.insert((200 + i, 0), Object::Stream(s));
            let mut dict = Dictionary::new();
            dict.set("Type", Object::Name(b"Page".to_vec()));
            dict.set("Contents", Object::Reference((200 + i, 0)));
            objects.insert(id, Object::Dictionary(dict));
            pages.push(Page { id, paper: Rect::new(0.0, 0.0, 612.0, 792.0), bbox: Rect::new(0.0, 0.0, 612.0, 792.0), bbox_is_cropbox: false, matrix: Default::default() });
        }

        let root_id = rebuild_page_tree(&mut objects, &pages, catalog_id).unwrap();
        let root_dict = objects.get(&root_id).unwrap().as_dict().unwrap();
        assert_eq!(root_dict.get(b"Count").unwrap().as_i64().unwrap(), 120);
        assert!(!root_dict.has(b"Parent"));
        let catalog = objects.get(&catalog_id).unwrap().as_dict().unwrap();
        assert_eq!(catalog.get(b"Pages").unwrap().as_reference().unwrap(), root_id);
    }
}
