/// `(major, minor)` — object number and generation, per `spec.md` §3 GLOSSARY "Indirect object".
pub type ObjectId = (u32, u16);
