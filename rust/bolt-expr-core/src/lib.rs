//! bolt-expr-core
//!
//! Host-agnostic NBT value and type model shared by the bolt-expr compiler:
//! literal conversion, structural types, path accessors, compatibility
//! checking and casting. No knowledge of scoreboards, IR or the optimizer
//! lives here.

pub mod rational;
pub mod types;
pub mod value;

pub use rational::Scale;
pub use types::{access, access_path, cast, check, Accessor, ArrayKind, CheckFlags, NbtType, RecordType, TypeDiagnostic};
pub use value::{HostValue, LiteralError, NbtValue};
