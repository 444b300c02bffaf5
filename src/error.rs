use crate::object_id::ObjectId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while scanning and parsing PDF syntax (`spec.md` §4.1/§4.2).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("file does not start with a %PDF- header")]
    InvalidFileHeader,
    #[error("indirect object is malformed")]
    InvalidObject,
    #[error("dictionary is malformed")]
    InvalidDictionary,
    #[error("stream is missing a readable /Length")]
    InvalidStreamLength,
    #[error("stream is missing its `endstream` keyword")]
    MissingEndstream,
    #[error("xref section is malformed")]
    InvalidXref,
    #[error("content stream operator sequence is malformed")]
    InvalidContentStream,
}

/// Errors specific to locating and chaining cross-reference sections (`spec.md` §4.3).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XrefError {
    #[error("could not locate startxref / %%EOF")]
    Start,
    #[error("startxref offset is out of range")]
    PrevStart,
    #[error("xref stream /Prev offset is out of range")]
    StreamStart,
    #[error("trailer dictionary is missing or malformed")]
    Trailer,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Xref(#[from] XrefError),
    #[error("object {0:?} is not of the expected type")]
    ObjectType(ObjectId),
    #[error("dictionary key not found")]
    DictKey,
    #[error("reference cycle detected resolving object {0:?}")]
    ReferenceCycle(ObjectId),
    #[error("no xref entry for object")]
    MissingXrefEntry,
    #[error("offset {0} is outside the document buffer")]
    InvalidOffset(usize),
    #[error("stream is invalid: {0}")]
    InvalidStream(String),
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("password is incorrect")]
    InvalidPassword,
    #[error("document uses an unsupported security handler: {0}")]
    UnsupportedEncryption(String),
    #[error("a document with a cross-reference stream cannot also be encrypted")]
    EncryptedXrefStream,
    #[error("document has no pages")]
    EmptyDocument,
    #[error("numeric conversion failed: {0}")]
    NumericCast(String),
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
