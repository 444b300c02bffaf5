use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::object::Object;

/// An ordered `/Name -> Object` map, per `spec.md` §3 "a tagged sum over eleven
/// variants" — dictionaries own their values. Order is preserved on write because
/// some tools compare output PDFs key-for-key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0.get(key).ok_or(Error::DictKey)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<&mut Object> {
        self.0.get_mut(key).ok_or(Error::DictKey)
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Object)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Vec<u8>, &mut Object)> {
        self.0.iter_mut()
    }

    /// `/Type` entry as raw bytes, used throughout the page-tree walk.
    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name)
    }

    pub fn has_type(&self, type_name: &[u8]) -> bool {
        matches!(self.get_type(), Ok(t) if t == type_name)
    }

    /// Merges `other` into `self`; existing keys in `self` win. Used for resource
    /// inheritance (`spec.md` §4.5) where the child's dict must shadow the parent's.
    pub fn merge_keep_self(&mut self, other: &Dictionary) {
        for (k, v) in other.iter() {
            let both_dicts = matches!(
                (self.0.get(k), v),
                (Some(Object::Dictionary(_)), Object::Dictionary(_))
            );
            if both_dicts {
                // Recurse into nested sub-dictionaries (e.g. /Resources/Font) so that
                // a child's individual font entries don't blot out the parent's.
                let other_dict = v.as_dict().expect("matched above");
                let self_dict = self.0.get_mut(k).and_then(|o| Object::as_dict_mut(o).ok()).expect("matched above");
                self_dict.merge_keep_self(other_dict);
            } else if !self.0.contains_key(k) {
                self.0.insert(k.clone(), v.clone());
            }
        }
    }

    /// Narrows the dictionary to only the given keys, dropping everything else.
    /// Used on save to trim Page dictionaries per `spec.md` §4.5.
    pub fn retain_keys(&mut self, keys: &[&[u8]]) {
        self.0.retain(|k, _| keys.iter().any(|want| want == &k.as_slice()));
    }
}

impl FromIterator<(Vec<u8>, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Vec<u8>, Object)>>(iter: T) -> Self {
        Dictionary(IndexMap::from_iter(iter))
    }
}
