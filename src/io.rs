//! File-path convenience wrappers over `Document::open`/`save`
//! (`spec.md` §4 Stream I/O component), grounded in `reader/load.rs`'s
//! `Document::load`/`load_with_password` but synchronous-only: `spec.md` §5
//! rules out the teacher's async feature entirely ("single-threaded and
//! synchronous ... no operation may suspend").

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::Result;
use crate::options::DocumentOptions;

/// Reads `path` into memory and opens it with the empty user password.
pub fn load<P: AsRef<Path>>(path: P, options: DocumentOptions) -> Result<Document> {
    let buf = fs::read(path)?;
    Document::load(&buf, options)
}

/// Reads `path` into memory and opens it, authenticating with `password`.
pub fn load_with_password<P: AsRef<Path>>(path: P, password: &[u8], options: DocumentOptions) -> Result<Document> {
    let buf = fs::read(path)?;
    Document::open(&buf, password, options)
}

/// Serializes `doc` and writes it to `path`.
pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
    let buf = doc.save()?;
    fs::write(path, buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn minimal_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let obj1 = buf.len();
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2 = buf.len();
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        let obj3 = buf.len();
        buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> /Contents 4 0 R >>\nendobj\n");
        let obj4 = buf.len();
        buf.extend_from_slice(b"4 0 obj\n<< /Length 0 >>\nstream\n\nendstream\nendobj\n");
        let xref_offset = buf.len();
        buf.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n");
        for off in [obj1, obj2, obj3, obj4] {
            buf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
        buf.extend_from_slice(b"trailer\n<< /Size 5 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());
        buf
    }

    #[test]
    fn loads_and_saves_through_a_real_file() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), minimal_pdf()).unwrap();

        let mut doc = load(tmp.path(), DocumentOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 1);

        let out = NamedTempFile::new().unwrap();
        save(&mut doc, out.path()).unwrap();
        let reopened = load(out.path(), DocumentOptions::default()).unwrap();
        assert_eq!(reopened.page_count(), 1);
    }
}
