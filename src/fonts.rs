//! The 14 standard Type1 fonts every PDF viewer is expected to carry without
//! embedding (`spec.md` §4.9), grounded in `newFontObject`'s fallback rule:
//! any other requested name is logged and replaced with Helvetica.

use crate::dictionary::Dictionary;
use crate::object::Object;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl StandardFont {
    pub fn base_font_name(self) -> &'static str {
        match self {
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::Symbol => "Symbol",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Matches a base-font name case-sensitively, the way `standard_fonts`
    /// (a plain `std::set<std::string>`) does.
    pub fn from_name(name: &str) -> Option<Self> {
        use StandardFont::*;
        Some(match name {
            "Times-Roman" => TimesRoman,
            "Times-Bold" => TimesBold,
            "Times-Italic" => TimesItalic,
            "Times-BoldItalic" => TimesBoldItalic,
            "Helvetica" => Helvetica,
            "Helvetica-Bold" => HelveticaBold,
            "Helvetica-Oblique" => HelveticaOblique,
            "Helvetica-BoldOblique" => HelveticaBoldOblique,
            "Courier" => Courier,
            "Courier-Bold" => CourierBold,
            "Courier-Oblique" => CourierOblique,
            "Courier-BoldOblique" => CourierBoldOblique,
            "Symbol" => Symbol,
            "ZapfDingbats" => ZapfDingbats,
            _ => return None,
        })
    }

    /// Resolves a requested font name to a standard font, falling back to
    /// Helvetica and warning when the name isn't one of the 14
    /// (`newFontObject`: "'%s' is not a standard font, using Helvetica").
    pub fn resolve(requested: Option<&str>) -> Self {
        match requested.and_then(StandardFont::from_name) {
            Some(font) => font,
            None => {
                if let Some(name) = requested {
                    log::warn!("'{name}' is not a standard font, using Helvetica instead");
                }
                StandardFont::Helvetica
            }
        }
    }

    /// The resource-dictionary key this font is installed under (`F` prefix,
    /// per `drawText`'s `/F%s` naming, e.g. `/FHelvetica`).
    pub fn resource_name(self) -> String {
        format!("F{}", self.base_font_name())
    }

    pub fn to_font_dict(self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Font".to_vec()));
        dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        dict.set("BaseFont", Object::Name(self.base_font_name().as_bytes().to_vec()));
        dict.set("Name", Object::Name(self.resource_name().into_bytes()));
        dict.set("Encoding", Object::Name(b"MacRomanEncoding".to_vec()));
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_falls_back_to_helvetica() {
        assert_eq!(StandardFont::resolve(Some("Comic Sans")), StandardFont::Helvetica);
    }

    #[test]
    fn none_requested_falls_back_to_helvetica() {
        assert_eq!(StandardFont::resolve(None), StandardFont::Helvetica);
    }

    #[test]
    fn known_name_round_trips() {
        assert_eq!(StandardFont::resolve(Some("Courier-BoldOblique")), StandardFont::CourierBoldOblique);
    }

    #[test]
    fn resource_name_is_f_prefixed() {
        assert_eq!(StandardFont::Helvetica.resource_name(), "FHelvetica");
    }
}
