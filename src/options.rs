//! Explicit, non-global configuration (`spec.md` §9: "configuration is a
//! struct passed to `Document::load`/`save`, not a set of process-wide
//! statics like the original's command-line flags").

use crate::paper::PaperSizeTable;

#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Suppresses `log::warn!` call sites that only matter to an interactive
    /// user; out-of-scope CLI surfaces would read this, the library itself
    /// never gates logging on it directly.
    pub quiet: bool,
    /// Tolerate a missing/misplaced xref by rebuilding it from a linear scan
    /// of `N G obj` markers, per `spec.md` §4.3's "Repair" note.
    pub repair_mode: bool,
    pub paper_sizes: PaperSizeTable,
    /// A blank page falls back to this size if `insert_blank_page` has no
    /// reference page to copy from (e.g. an otherwise empty document).
    pub default_paper: (f64, f64),
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions { quiet: false, repair_mode: true, paper_sizes: PaperSizeTable::new(), default_paper: (612.0, 792.0) }
    }
}
