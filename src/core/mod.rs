// Core modules implementing dataset decoding, string interning, key lookup, and error modeling.
pub mod column;
pub(crate) mod decode;
pub mod directory;
pub mod error;
pub mod format;
pub mod header;
pub mod keys;
pub mod kind;
pub mod reader;
pub mod relations;
pub mod row;
pub mod strings;
pub mod table;
pub mod value;
pub(crate) mod wire;

#[cfg(test)]
pub(crate) mod fixture;
