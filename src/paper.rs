//! Named paper sizes and orientation solving (`spec.md` §9's design note),
//! grounded in `doc_edit.cpp`'s `paper_sizes` table, `set_paper_from_name`,
//! and `paper_set_orientation`.

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Auto,
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy)]
struct NamedSize {
    name: &'static str,
    width: f64,
    height: f64,
}

const SIZES: &[NamedSize] = &[
    NamedSize { name: "a0", width: 2382.0, height: 3369.0 },
    NamedSize { name: "a1", width: 1684.0, height: 2382.0 },
    NamedSize { name: "a2", width: 1191.0, height: 1684.0 },
    NamedSize { name: "a3", width: 842.0, height: 1191.0 },
    NamedSize { name: "a4", width: 595.0, height: 842.0 },
    NamedSize { name: "a5", width: 421.0, height: 595.0 },
    NamedSize { name: "a6", width: 297.0, height: 420.0 },
    NamedSize { name: "a7", width: 210.0, height: 297.0 },
    NamedSize { name: "a8", width: 148.0, height: 210.0 },
    NamedSize { name: "a9", width: 105.0, height: 148.0 },
    NamedSize { name: "a10", width: 73.0, height: 105.0 },
    NamedSize { name: "b0", width: 2835.0, height: 4008.0 },
    NamedSize { name: "b1", width: 2004.0, height: 2835.0 },
    NamedSize { name: "b2", width: 1417.0, height: 2004.0 },
    NamedSize { name: "b3", width: 1001.0, height: 1417.0 },
    NamedSize { name: "b4", width: 709.0, height: 1001.0 },
    NamedSize { name: "b5", width: 499.0, height: 709.0 },
    NamedSize { name: "b6", width: 354.0, height: 499.0 },
    NamedSize { name: "jisb0", width: 2920.0, height: 4127.0 },
    NamedSize { name: "jisb1", width: 2064.0, height: 2920.0 },
    NamedSize { name: "jisb2", width: 1460.0, height: 2064.0 },
    NamedSize { name: "jisb3", width: 1032.0, height: 1460.0 },
    NamedSize { name: "jisb4", width: 729.0, height: 1032.0 },
    NamedSize { name: "jisb5", width: 516.0, height: 729.0 },
    NamedSize { name: "jisb6", width: 363.0, height: 516.0 },
    NamedSize { name: "c0", width: 2599.0, height: 3677.0 },
    NamedSize { name: "c1", width: 1837.0, height: 2599.0 },
    NamedSize { name: "c2", width: 1298.0, height: 1837.0 },
    NamedSize { name: "c3", width: 918.0, height: 1298.0 },
    NamedSize { name: "c4", width: 649.0, height: 918.0 },
    NamedSize { name: "c5", width: 459.0, height: 649.0 },
    NamedSize { name: "c6", width: 323.0, height: 459.0 },
    NamedSize { name: "ledger", width: 1224.0, height: 792.0 },
    NamedSize { name: "tabloid", width: 792.0, height: 1224.0 },
    NamedSize { name: "letter", width: 612.0, height: 792.0 },
    NamedSize { name: "halfletter", width: 396.0, height: 612.0 },
    NamedSize { name: "statement", width: 396.0, height: 612.0 },
    NamedSize { name: "legal", width: 612.0, height: 1008.0 },
    NamedSize { name: "executive", width: 540.0, height: 720.0 },
    NamedSize { name: "folio", width: 612.0, height: 936.0 },
    NamedSize { name: "quarto", width: 610.0, height: 780.0 },
    NamedSize { name: "10x14", width: 720.0, height: 1008.0 },
    NamedSize { name: "arche", width: 2592.0, height: 3456.0 },
    NamedSize { name: "archd", width: 1728.0, height: 2592.0 },
    NamedSize { name: "archc", width: 1296.0, height: 1728.0 },
    NamedSize { name: "archb", width: 864.0, height: 1296.0 },
    NamedSize { name: "archa", width: 648.0, height: 864.0 },
    NamedSize { name: "flsa", width: 612.0, height: 936.0 },
    NamedSize { name: "flse", width: 612.0, height: 936.0 },
];

/// User-extensible paper-size table (`spec.md` §9: "configuration is explicit,
/// not a process-global"); built-ins plus whatever the caller registers.
#[derive(Debug, Clone)]
pub struct PaperSizeTable {
    extra: Vec<(String, f64, f64)>,
}

impl Default for PaperSizeTable {
    fn default() -> Self {
        PaperSizeTable { extra: Vec::new() }
    }
}

impl PaperSizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// User-defined sizes shadow built-ins with the same name, since they're
    /// searched first (`add_new_paper_size` pushes to the front of the list).
    pub fn add(&mut self, name: &str, width: f64, height: f64) {
        self.extra.push((name.to_lowercase(), width, height));
    }

    pub fn lookup(&self, name: &str, orientation: Orientation) -> Option<Rect> {
        let lower = name.to_lowercase();
        let (width, height) = self
            .extra
            .iter()
            .rev()
            .find(|(n, ..)| *n == lower)
            .map(|(_, w, h)| (*w, *h))
            .or_else(|| SIZES.iter().find(|s| s.name == lower).map(|s| (s.width, s.height)))?;

        let mut paper = Rect::new(0.0, 0.0, width, height);
        resolve_orientation(&mut paper, orientation);
        Some(paper)
    }

    pub fn names(&self) -> Vec<&str> {
        self.extra.iter().map(|(n, ..)| n.as_str()).chain(SIZES.iter().map(|s| s.name)).collect()
    }
}

/// Swaps width/height if the requested orientation disagrees with the
/// paper's natural shape (`paper_set_orientation`). `Auto` never swaps.
pub fn resolve_orientation(paper: &mut Rect, orientation: Orientation) {
    let should_swap = match orientation {
        Orientation::Portrait => paper.is_landscape(),
        Orientation::Landscape => !paper.is_landscape(),
        Orientation::Auto => false,
    };
    if should_swap {
        paper.right = Point::new(paper.right.y, paper.right.x);
    }
}
