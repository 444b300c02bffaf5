//! Lightweight metadata extraction from an already-assembled document, kept
//! as a thin read-only view over `/Info` and the page count (`spec.md` §B
//! ambient stack: metadata is carried over from the teacher even though the
//! distilled spec never calls it out by name).

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::dictionary::Dictionary;
use crate::object::Object;
use crate::object_id::ObjectId;

#[derive(Debug, Clone, Default)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub creation_date_parsed: Option<DateTime<FixedOffset>>,
    pub modification_date_parsed: Option<DateTime<FixedOffset>>,
    pub page_count: u32,
    pub version: String,
}

/// Parses the PDF date format (`D:YYYYMMDDHHmmSSOHH'mm'`, PDF 32000-1 §7.9.4)
/// into a `chrono` timestamp. The `D:` prefix, seconds, and the timezone
/// suffix are all optional; a missing timezone is treated as UTC.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.strip_prefix("D:").unwrap_or(raw);
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> u32 {
        digits.get(start..start + len).and_then(|s| s.parse().ok()).unwrap_or(default)
    };
    let year: i32 = digits.get(0..4)?.parse().ok()?;
    let month = if digits.len() >= 6 { field(4, 2, 1) } else { 1 };
    let day = if digits.len() >= 8 { field(6, 2, 1) } else { 1 };
    let hour = if digits.len() >= 10 { field(8, 2, 0) } else { 0 };
    let minute = if digits.len() >= 12 { field(10, 2, 0) } else { 0 };
    let second = if digits.len() >= 14 { field(12, 2, 0) } else { 0 };

    let rest = &s[digits.len()..];
    let offset = parse_offset(rest).unwrap_or(FixedOffset::east_opt(0)?);
    offset.with_ymd_and_hms(year, month, day, hour, minute, second).single()
}

fn parse_offset(rest: &str) -> Option<FixedOffset> {
    let rest = rest.trim();
    if rest.is_empty() || rest.starts_with('Z') {
        return FixedOffset::east_opt(0);
    }
    let sign = match rest.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = rest[1..].chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4).and_then(|s| s.parse().ok()).unwrap_or(0);
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl PdfMetadata {
    pub fn extract(
        version: (u8, u8), trailer: &Dictionary, objects: &BTreeMap<ObjectId, Object>, page_count: u32,
    ) -> PdfMetadata {
        let info = trailer
            .get(b"Info")
            .ok()
            .and_then(|o| o.as_reference().ok())
            .and_then(|id| objects.get(&id))
            .and_then(|o| o.as_dict().ok());

        let text = |key: &[u8]| -> Option<String> {
            info.and_then(|d| d.get(key).ok())
                .and_then(|o| o.as_str().ok())
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        };

        let creation_date = text(b"CreationDate");
        let modification_date = text(b"ModDate");
        let creation_date_parsed = creation_date.as_deref().and_then(parse_pdf_date);
        let modification_date_parsed = modification_date.as_deref().and_then(parse_pdf_date);

        PdfMetadata {
            title: text(b"Title"),
            author: text(b"Author"),
            subject: text(b"Subject"),
            keywords: text(b"Keywords"),
            creator: text(b"Creator"),
            producer: text(b"Producer"),
            creation_date,
            modification_date,
            creation_date_parsed,
            modification_date_parsed,
            page_count,
            version: format!("{}.{}", version.0, version.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::StringFormat;

    #[test]
    fn extracts_title_from_info_dict() {
        let mut info = Dictionary::new();
        info.set("Title", Object::String(b"Hello".to_vec(), StringFormat::Literal));
        let mut objects = BTreeMap::new();
        objects.insert((5, 0), Object::Dictionary(info));

        let mut trailer = Dictionary::new();
        trailer.set("Info", Object::Reference((5, 0)));

        let meta = PdfMetadata::extract((1, 7), &trailer, &objects, 3);
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(meta.page_count, 3);
        assert_eq!(meta.version, "1.7");
    }

    #[test]
    fn missing_info_dict_yields_all_none() {
        let trailer = Dictionary::new();
        let objects = BTreeMap::new();
        let meta = PdfMetadata::extract((1, 4), &trailer, &objects, 0);
        assert!(meta.title.is_none());
        assert!(meta.author.is_none());
    }

    #[test]
    fn parses_full_pdf_date_with_offset() {
        let dt = parse_pdf_date("D:20230615143012+02'00'").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S %z").to_string(), "2023-06-15 14:30:12 +0200");
    }

    #[test]
    fn parses_date_only_pdf_date_defaulting_to_utc_midnight() {
        let dt = parse_pdf_date("D:20230615").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S %z").to_string(), "2023-06-15 00:00:00 +0000");
    }

    #[test]
    fn rejects_garbage_date_strings() {
        assert!(parse_pdf_date("not a date").is_none());
    }

    #[test]
    fn extract_populates_parsed_creation_date() {
        let mut info = Dictionary::new();
        info.set("CreationDate", Object::String(b"D:20200101120000Z".to_vec(), StringFormat::Literal));
        let mut objects = BTreeMap::new();
        objects.insert((5, 0), Object::Dictionary(info));
        let mut trailer = Dictionary::new();
        trailer.set("Info", Object::Reference((5, 0)));

        let meta = PdfMetadata::extract((1, 7), &trailer, &objects, 1);
        let parsed = meta.creation_date_parsed.unwrap();
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2020-01-01");
    }
}
