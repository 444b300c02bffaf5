//! A PDF document engine: a byte-exact tokenizer and object parser, a
//! `/Prev`-chained cross-reference reader (classical tables and streams), the
//! standard security handler, an inheritance-aware page tree, Form-XObject
//! page composition, and a reachability-swept rewriter. No rendering, no
//! font embedding beyond the 14 standard names, no incremental updates.

pub mod dictionary;
pub mod document;
pub mod encryption;
pub mod error;
pub mod filters;
pub mod fonts;
pub mod geometry;
pub mod io;
pub mod object;
pub mod object_id;
pub mod object_stream;
pub mod options;
pub mod page;
pub mod paper;
pub mod parser;
pub mod reader;
pub mod tokenizer;
pub mod xref;
pub mod xref_stream;

pub use dictionary::Dictionary;
pub use document::Document;
pub use error::{Error, ParseError, Result, XrefError};
pub use fonts::StandardFont;
pub use geometry::{Matrix, Point, Rect};
pub use object::{Object, Stream, StringFormat};
pub use object_id::ObjectId;
pub use options::DocumentOptions;
pub use page::Page;
pub use paper::{Orientation, PaperSizeTable};
