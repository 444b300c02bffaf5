//! The standard security handler, V=1/2 R=2/3 (`spec.md` §4.6), grounded in
//! `Crypt::authenticateUserPassword`/`authenticate`/`decryptIndirectObject`.
//! AES (R>=4) is out of scope; this handler only ever derives an RC4 key.

use bitflags::bitflags;
use md5::{Digest, Md5};

use crate::dictionary::Dictionary;
use crate::encryption::rc4::Rc4;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::object_id::ObjectId;

const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

bitflags! {
    /// The named bits of `/P`, PDF 1.4 table 3.15. Bits 1-2 and 7-32 are
    /// reserved/must-be-one and are not exposed here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: i32 {
        const PRINT = 1 << 2;
        const MODIFY = 1 << 3;
        const COPY = 1 << 4;
        const ANNOTATE = 1 << 5;
    }
}

#[derive(Debug, Clone)]
pub struct StandardSecurityHandler {
    pub version: i64,
    pub revision: i64,
    pub key_len: usize,
    pub o_entry: Vec<u8>,
    pub u_entry: Vec<u8>,
    pub permissions: i32,
    pub id0: Vec<u8>,
    pub file_key: Vec<u8>,
}

impl StandardSecurityHandler {
    /// Pulls `/V /R /Length /O /U /P` from the Encrypt dictionary and the
    /// first `/ID` element off the trailer (`Crypt::getEncryptionInfo`).
    pub fn from_dicts(encrypt: &Dictionary, trailer: &Dictionary) -> Result<Self> {
        if let Ok(Object::Name(filter)) = encrypt.get(b"Filter") {
            if filter != b"Standard" {
                return Err(Error::UnsupportedEncryption(String::from_utf8_lossy(filter).into_owned()));
            }
        }
        let version = encrypt.get(b"V").and_then(Object::as_i64).unwrap_or(1);
        let revision = encrypt.get(b"R").and_then(Object::as_i64).unwrap_or(2);
        if !(1..=2).contains(&version) {
            return Err(Error::UnsupportedEncryption(format!("/V {version} (only V=1,2 supported)")));
        }
        let key_len = encrypt.get(b"Length").and_then(Object::as_i64).map(|bits| (bits / 8) as usize).unwrap_or(5);
        let o_entry = encrypt.get(b"O").and_then(Object::as_str).map_err(|_| Error::Decryption("missing /O".into()))?.to_vec();
        if o_entry.len() != 32 {
            return Err(Error::Decryption("/O entry is not 32 bytes".into()));
        }
        let u_entry = encrypt.get(b"U").and_then(Object::as_str).map(<[u8]>::to_vec).unwrap_or_default();
        let permissions = encrypt.get(b"P").and_then(Object::as_i64).unwrap_or(0) as i32;

        let id0 = match trailer.get(b"ID").and_then(Object::as_array) {
            Ok(items) if !items.is_empty() => items[0].as_str().map_err(|_| Error::Decryption("/ID[0] is not a string".into()))?.to_vec(),
            _ => return Err(Error::Decryption("missing trailer /ID".into())),
        };

        if !(5..=16).contains(&key_len) {
            return Err(Error::UnsupportedEncryption(format!("key length {key_len} bytes")));
        }

        Ok(StandardSecurityHandler {
            version,
            revision,
            key_len,
            o_entry,
            u_entry,
            permissions,
            id0,
            file_key: Vec::new(),
        })
    }

    /// Algorithm 3.2: derive the file encryption key from a (possibly empty)
    /// user password, and remember it for per-object keys.
    pub fn compute_user_key(&mut self, password: &[u8]) {
        let mut buf = pad_password(password);
        buf.extend_from_slice(&self.o_entry);
        buf.extend_from_slice(&self.permissions.to_le_bytes());
        buf.extend_from_slice(&self.id0);

        let mut digest = Md5::digest(&buf).to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                digest = Md5::digest(&digest[..self.key_len]).to_vec();
            }
        }
        digest.truncate(self.key_len);
        self.file_key = digest;
    }

    /// Algorithm 3.4/3.5: does this key (already derived via
    /// `compute_user_key`) reproduce the stored `/U` entry? `password` is
    /// unused beyond having already shaped `self.file_key`.
    pub fn authenticate_user_password(&self, _password: &[u8]) -> bool {
        if self.u_entry.is_empty() {
            return true;
        }
        match self.revision {
            2 => {
                let mut tmp = PADDING.to_vec();
                Rc4::new(&self.file_key).apply_keystream(&mut tmp);
                tmp == self.u_entry
            }
            _ => {
                let mut buf = PADDING.to_vec();
                buf.extend_from_slice(&self.id0);
                let mut digest = Md5::digest(&buf).to_vec();
                Rc4::new(&self.file_key).apply_keystream(&mut digest[..16]);
                apply_r3_cascade(&self.file_key, &mut digest);
                self.u_entry.len() >= 16 && digest[..16] == self.u_entry[..16]
            }
        }
    }

    /// Algorithm 3.7: check the owner password by reversing the `/O` RC4/XOR
    /// cascade, then delegating to the user-password check on the result.
    pub fn authenticate_owner_password(&mut self, password: &[u8]) -> bool {
        let mut buf = pad_password(password);
        buf.truncate(32);
        let mut digest = Md5::digest(&buf).to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                digest = Md5::digest(&digest[..16]).to_vec();
            }
        }
        let owner_key = &digest[..self.key_len];

        let mut candidate = self.o_entry.clone();
        match self.revision {
            2 => Rc4::new(owner_key).apply_keystream(&mut candidate),
            _ => {
                for i in (0..20).rev() {
                    let round_key: Vec<u8> = owner_key.iter().map(|b| b ^ i as u8).collect();
                    Rc4::new(&round_key).apply_keystream(&mut candidate);
                }
            }
        }
        self.compute_user_key(&candidate);
        self.authenticate_user_password(&candidate)
    }

    pub fn permissions_flags(&self) -> Permissions {
        Permissions::from_bits_truncate(self.permissions)
    }

    /// Algorithm 3.1: per-object RC4 key, `file_key || obj_lo3 || gen_lo2`,
    /// MD5-hashed and truncated to `min(file_key.len() + 5, 16)`.
    pub fn object_key(&self, id: ObjectId) -> Vec<u8> {
        let (obj_no, gen_no) = id;
        let mut buf = self.file_key.clone();
        buf.extend_from_slice(&obj_no.to_le_bytes()[..3]);
        buf.extend_from_slice(&gen_no.to_le_bytes()[..2]);
        let digest = Md5::digest(&buf);
        let len = (self.file_key.len() + 5).min(16);
        digest[..len].to_vec()
    }

    /// RC4-decrypts every string and stream payload reachable from `object`,
    /// recursing through arrays and dictionary values but never dictionary
    /// keys (`decryptObject` in the original).
    pub fn decrypt_object(&self, id: ObjectId, object: &mut Object) {
        let key = self.object_key(id);
        let cipher = Rc4::new(&key);
        decrypt_in_place(&cipher, object);
    }
}

fn decrypt_in_place(cipher: &Rc4, object: &mut Object) {
    match object {
        Object::String(bytes, _) => cipher.apply_keystream(bytes),
        Object::Array(items) => items.iter_mut().for_each(|o| decrypt_in_place(cipher, o)),
        Object::Dictionary(dict) => dict.iter_mut().for_each(|(_, v)| decrypt_in_place(cipher, v)),
        Object::Stream(stream) => {
            cipher.apply_keystream(&mut stream.content);
            stream.dict.iter_mut().for_each(|(_, v)| decrypt_in_place(cipher, v));
        }
        _ => {}
    }
}

fn pad_password(password: &[u8]) -> Vec<u8> {
    let mut buf = password.to_vec();
    buf.truncate(32);
    let remaining = 32 - buf.len();
    buf.extend_from_slice(&PADDING[..remaining]);
    buf
}

fn apply_r3_cascade(file_key: &[u8], digest: &mut [u8]) {
    for i in 1..=19u8 {
        let round_key: Vec<u8> = file_key.iter().map(|b| b ^ i).collect();
        Rc4::new(&round_key).apply_keystream(&mut digest[..16]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(revision: i64) -> StandardSecurityHandler {
        StandardSecurityHandler {
            version: 2,
            revision,
            key_len: 5,
            o_entry: vec![0u8; 32],
            u_entry: Vec::new(),
            permissions: -4,
            id0: vec![1u8; 16],
            file_key: Vec::new(),
        }
    }

    #[test]
    fn empty_password_always_authenticates_when_u_is_empty() {
        let mut h = handler(3);
        h.compute_user_key(b"");
        assert!(h.authenticate_user_password(b""));
    }

    #[test]
    fn object_key_differs_per_object() {
        let mut h = handler(2);
        h.compute_user_key(b"");
        let k1 = h.object_key((1, 0));
        let k2 = h.object_key((2, 0));
        assert_ne!(k1, k2);
        assert_eq!(k1.len(), 10); // 5 + 5, capped at 16
    }

    #[test]
    fn decrypt_recurses_through_arrays_and_dicts_but_not_keys() {
        let mut h = handler(2);
        h.compute_user_key(b"");
        let mut dict = Dictionary::new();
        dict.set("Secret", Object::String(b"hello".to_vec(), crate::object::StringFormat::Literal));
        let mut object = Object::Dictionary(dict);
        h.decrypt_object((1, 0), &mut object);
        let decrypted = object.as_dict().unwrap().get(b"Secret").unwrap().as_str().unwrap().to_vec();
        assert_ne!(decrypted, b"hello");
    }

    #[test]
    fn permissions_flags_decodes_named_bits() {
        // -4 = ...11111100, so PRINT/MODIFY/COPY/ANNOTATE (bits 3-6) are all set.
        let h = handler(3);
        let flags = h.permissions_flags();
        assert!(flags.contains(Permissions::PRINT));
        assert!(flags.contains(Permissions::MODIFY));
        assert!(flags.contains(Permissions::COPY));
        assert!(flags.contains(Permissions::ANNOTATE));
    }
}
