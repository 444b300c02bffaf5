//! Standard security handler, V=1/2 R=2/3, RC4/MD5 only (`spec.md` §4.6).
//! AES (R>=4, `/V` 4/5) is an explicit Non-goal; `from_dicts` rejects it.

pub mod rc4;
pub mod standard_security_handler;

pub use standard_security_handler::{Permissions, StandardSecurityHandler};
