//! The NBT type model: structural types, path accessors, compatibility
//! checking and literal casting (spec.md §4.1).

use crate::value::NbtValue;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Numeric width ordering used by the `write ⊇ read` compatibility rule.
const NUMERIC_ORDER: [NbtType; 6] = [
    NbtType::Byte,
    NbtType::Short,
    NbtType::Int,
    NbtType::Long,
    NbtType::Float,
    NbtType::Double,
];

/// Array element kind for `array[byte|int|long]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Byte,
    Int,
    Long,
}

impl ArrayKind {
    /// The scalar type yielded by indexing into an array of this kind
    /// (spec.md §4.1 `access`; original `get_subtype_from_accessor`'s
    /// `array.wrapper`).
    pub fn element_type(self) -> NbtType {
        match self {
            ArrayKind::Byte => NbtType::Byte,
            ArrayKind::Int => NbtType::Int,
            ArrayKind::Long => NbtType::Long,
        }
    }
}

/// A fixed-keys record, e.g. `{x: int, y: int}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub fields: IndexMap<String, NbtType>,
    /// Keys that may be absent on the read side without failing the check.
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NbtType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    List(Box<NbtType>),
    Array(ArrayKind),
    /// Fixed-keys compound.
    Record(RecordType),
    /// Homogeneous compound: every value must conform to one type.
    Mapping(Box<NbtType>),
    Union(Vec<NbtType>),
    Optional(Box<NbtType>),
    Any,
}

impl fmt::Display for NbtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtType::Byte => write!(f, "byte"),
            NbtType::Short => write!(f, "short"),
            NbtType::Int => write!(f, "int"),
            NbtType::Long => write!(f, "long"),
            NbtType::Float => write!(f, "float"),
            NbtType::Double => write!(f, "double"),
            NbtType::String => write!(f, "string"),
            NbtType::List(t) => write!(f, "list[{t}]"),
            NbtType::Array(ArrayKind::Byte) => write!(f, "array[byte]"),
            NbtType::Array(ArrayKind::Int) => write!(f, "array[int]"),
            NbtType::Array(ArrayKind::Long) => write!(f, "array[long]"),
            NbtType::Record(_) => write!(f, "record"),
            NbtType::Mapping(t) => write!(f, "mapping[{t}]"),
            NbtType::Union(ts) => {
                let parts: Vec<String> = ts.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" | "))
            }
            NbtType::Optional(t) => write!(f, "{t}?"),
            NbtType::Any => write!(f, "any"),
        }
    }
}

impl NbtType {
    fn numeric_rank(&self) -> Option<usize> {
        NUMERIC_ORDER.iter().position(|t| t == self)
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Best-effort type inference from a literal (spec.md §4.1 `infer`).
    pub fn infer(value: &NbtValue) -> NbtType {
        match value {
            NbtValue::Byte(_) => NbtType::Byte,
            NbtValue::Short(_) => NbtType::Short,
            NbtValue::Int(_) => NbtType::Int,
            NbtValue::Long(_) => NbtType::Long,
            NbtValue::Float(_) => NbtType::Float,
            NbtValue::Double(_) => NbtType::Double,
            NbtValue::String(_) => NbtType::String,
            NbtValue::List(items) => {
                let elem = items
                    .first()
                    .map(NbtType::infer)
                    .unwrap_or(NbtType::Any);
                NbtType::List(Box::new(elem))
            }
            NbtValue::Compound(map) => {
                let mut fields = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    fields.insert(k.clone(), NbtType::infer(v));
                }
                NbtType::Record(RecordType {
                    fields,
                    optional: Vec::new(),
                })
            }
        }
    }
}

/// One step of path navigation into an NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Key(String),
    Index(i32),
    /// `path[{match:1b}]` — a compound filter; only meaningful on lists.
    Filter(NbtValue),
}

/// Subtype access at one step (spec.md §4.1 `access`).
pub fn access(ty: &NbtType, accessor: &Accessor) -> Option<NbtType> {
    match (ty, accessor) {
        (NbtType::Any, _) => Some(NbtType::Any),
        (NbtType::Record(rec), Accessor::Key(key)) => rec.fields.get(key).cloned(),
        (NbtType::Mapping(value_ty), Accessor::Key(_)) => Some((**value_ty).clone()),
        (NbtType::List(elem), Accessor::Index(_)) => Some((**elem).clone()),
        (NbtType::List(elem), Accessor::Filter(_)) => Some(NbtType::List(elem.clone())),
        (NbtType::Array(kind), Accessor::Index(_)) => Some(kind.element_type()),
        (NbtType::Optional(inner), accessor) => access(inner, accessor),
        (NbtType::Union(branches), accessor) => {
            let mut results = Vec::new();
            for branch in branches {
                results.push(access(branch, accessor)?);
            }
            Some(NbtType::Union(results))
        }
        _ => None,
    }
}

/// Iterated `access` over a full path (spec.md §4.1 `access_path`).
pub fn access_path(ty: &NbtType, accessors: &[Accessor]) -> Option<NbtType> {
    let mut current = ty.clone();
    for accessor in accessors {
        current = access(&current, accessor)?;
    }
    Some(current)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckFlags {
    /// When true, numeric widths must match exactly (no narrowing or
    /// widening) — used when checking a literal against a declared type.
    pub numeric_match: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeDiagnostic {
    #[error("{path}: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: String,
    },
    #[error("{path}: missing required key {key:?}")]
    MissingKey { path: String, key: String },
    #[error("{path}: unexpected key {key:?} on read side")]
    ExtraKey { path: String, key: String },
    #[error("{path}: {inner}")]
    Nested { path: String, inner: Box<TypeDiagnostic> },
}

impl TypeDiagnostic {
    /// All type diagnostics produced by this checker are recoverable: the
    /// host decides whether to treat them as a warning or a hard error
    /// (spec.md §7), compilation always continues with best-effort lowering.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    fn nest(self, path: &str) -> TypeDiagnostic {
        TypeDiagnostic::Nested {
            path: path.to_string(),
            inner: Box::new(self),
        }
    }
}

/// Structural compatibility check: `write ⊇ read` (spec.md §4.1 `check`).
pub fn check(write: &NbtType, read: &NbtType, flags: CheckFlags) -> Result<(), TypeDiagnostic> {
    check_at("$", write, read, flags)
}

fn check_at(
    path: &str,
    write: &NbtType,
    read: &NbtType,
    flags: CheckFlags,
) -> Result<(), TypeDiagnostic> {
    if matches!(write, NbtType::Any) || matches!(read, NbtType::Any) {
        return Ok(());
    }

    if let NbtType::Union(branches) = read {
        // Reading a union requires every branch to be write-compatible.
        for branch in branches {
            check_at(path, write, branch, flags).map_err(|e| e.nest(path))?;
        }
        return Ok(());
    }

    if let NbtType::Union(branches) = write {
        // Writing a union requires some branch to accept the read type.
        let mut last_err = None;
        for branch in branches {
            match check_at(path, branch, read, flags) {
                Ok(()) => return Ok(()),
                Err(e) => last_err = Some(e),
            }
        }
        return Err(last_err.unwrap_or_else(|| mismatch(path, write, read)));
    }

    if let (Some(write_rank), Some(read_rank)) = (write.numeric_rank(), read.numeric_rank()) {
        let ok = if flags.numeric_match {
            write_rank == read_rank
        } else {
            write_rank >= read_rank
        };
        return if ok { Ok(()) } else { Err(mismatch(path, write, read)) };
    }

    match (write, read) {
        (NbtType::String, NbtType::String) => Ok(()),
        (NbtType::List(w), NbtType::List(r)) | (NbtType::Mapping(w), NbtType::Mapping(r)) => {
            check_at(path, w, r, flags).map_err(|e| e.nest(path))
        }
        (NbtType::Array(a), NbtType::Array(b)) if a == b => Ok(()),
        (NbtType::Mapping(w), NbtType::Record(rec)) => {
            for (key, value_ty) in &rec.fields {
                check_at(&format!("{path}.{key}"), w, value_ty, flags)?;
            }
            Ok(())
        }
        (NbtType::Record(wrec), NbtType::Record(rrec)) => {
            for (key, want) in &wrec.fields {
                match rrec.fields.get(key) {
                    Some(got) => {
                        check_at(&format!("{path}.{key}"), want, got, CheckFlags { numeric_match: true })?
                    }
                    None if !wrec.optional.contains(key) => {
                        return Err(TypeDiagnostic::MissingKey {
                            path: path.to_string(),
                            key: key.clone(),
                        })
                    }
                    None => {}
                }
            }
            for key in rrec.fields.keys() {
                if !wrec.fields.contains_key(key) {
                    return Err(TypeDiagnostic::ExtraKey {
                        path: path.to_string(),
                        key: key.clone(),
                    });
                }
            }
            Ok(())
        }
        (NbtType::Optional(w), read) => match read {
            NbtType::Optional(r) => check_at(path, w, r, flags),
            other => check_at(path, w, other, flags),
        },
        (write, NbtType::Optional(r)) => check_at(path, write, r, flags),
        _ => Err(mismatch(path, write, read)),
    }
}

fn mismatch(path: &str, write: &NbtType, read: &NbtType) -> TypeDiagnostic {
    TypeDiagnostic::Mismatch {
        path: path.to_string(),
        expected: write.to_string(),
        found: read.to_string(),
    }
}

/// Coerces a literal to `ty`, or `None` if incompatible (spec.md §4.1 `cast`).
pub fn cast(ty: &NbtType, value: &NbtValue) -> Option<NbtValue> {
    match (ty, value) {
        (NbtType::Any, v) => Some(v.clone()),
        (NbtType::Byte, v) => v.as_score_int().and_then(|i| i8::try_from(i).ok()).map(NbtValue::Byte),
        (NbtType::Short, v) => v.as_score_int().and_then(|i| i16::try_from(i).ok()).map(NbtValue::Short),
        (NbtType::Int, v) => v.as_score_int().map(NbtValue::Int),
        (NbtType::Long, v) => cast_to_long(v),
        (NbtType::Float, v) => cast_to_f64(v).map(|f| NbtValue::Float(f as f32)),
        (NbtType::Double, v) => cast_to_f64(v).map(NbtValue::Double),
        (NbtType::String, NbtValue::String(s)) => Some(NbtValue::String(s.clone())),
        (NbtType::List(elem), NbtValue::List(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(cast(elem, item)?);
            }
            Some(NbtValue::List(out))
        }
        (NbtType::Mapping(value_ty), NbtValue::Compound(map)) => {
            let mut out = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), cast(value_ty, v)?);
            }
            Some(NbtValue::Compound(out))
        }
        (NbtType::Record(rec), NbtValue::Compound(map)) => {
            let mut out = IndexMap::with_capacity(map.len());
            for (key, field_ty) in &rec.fields {
                match map.get(key) {
                    Some(v) => out.insert(key.clone(), cast(field_ty, v)?),
                    None if rec.optional.contains(key) => None,
                    None => return None,
                };
            }
            Some(NbtValue::Compound(out))
        }
        (NbtType::Optional(inner), v) => cast(inner, v),
        (NbtType::Union(branches), v) => branches.iter().find_map(|b| cast(b, v)),
        _ => None,
    }
}

fn cast_to_long(v: &NbtValue) -> Option<NbtValue> {
    match v {
        NbtValue::Long(l) => Some(NbtValue::Long(*l)),
        other => other.as_score_int().map(|i| NbtValue::Long(i64::from(i))),
    }
}

fn cast_to_f64(v: &NbtValue) -> Option<f64> {
    match v {
        NbtValue::Byte(b) => Some(f64::from(*b)),
        NbtValue::Short(s) => Some(f64::from(*s)),
        NbtValue::Int(i) => Some(f64::from(*i)),
        NbtValue::Long(l) => Some(*l as f64),
        NbtValue::Float(f) => Some(f64::from(*f)),
        NbtValue::Double(d) => Some(*d),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widening_ok_without_numeric_match() {
        assert!(check(&NbtType::Long, &NbtType::Int, CheckFlags::default()).is_ok());
    }

    #[test]
    fn numeric_narrowing_rejected() {
        assert!(check(&NbtType::Int, &NbtType::Long, CheckFlags::default()).is_err());
    }

    #[test]
    fn numeric_match_rejects_widening_too() {
        let flags = CheckFlags { numeric_match: true };
        assert!(check(&NbtType::Long, &NbtType::Int, flags).is_err());
        assert!(check(&NbtType::Int, &NbtType::Int, flags).is_ok());
    }

    #[test]
    fn any_is_universally_compatible() {
        assert!(check(&NbtType::Any, &NbtType::String, CheckFlags::default()).is_ok());
        assert!(check(&NbtType::String, &NbtType::Any, CheckFlags::default()).is_ok());
    }

    #[test]
    fn record_missing_required_key_fails() {
        let mut fields = IndexMap::new();
        fields.insert("x".to_string(), NbtType::Int);
        let write = NbtType::Record(RecordType { fields, optional: vec![] });
        let read = NbtType::Record(RecordType { fields: IndexMap::new(), optional: vec![] });
        assert!(matches!(
            check(&write, &read, CheckFlags::default()),
            Err(TypeDiagnostic::MissingKey { .. })
        ));
    }

    #[test]
    fn record_extra_key_on_read_fails() {
        let write = NbtType::Record(RecordType { fields: IndexMap::new(), optional: vec![] });
        let mut rfields = IndexMap::new();
        rfields.insert("y".to_string(), NbtType::Int);
        let read = NbtType::Record(RecordType { fields: rfields, optional: vec![] });
        assert!(matches!(
            check(&write, &read, CheckFlags::default()),
            Err(TypeDiagnostic::ExtraKey { .. })
        ));
    }

    #[test]
    fn access_path_walks_nested_keys() {
        let mut inner = IndexMap::new();
        inner.insert("y".to_string(), NbtType::Int);
        let mut outer = IndexMap::new();
        outer.insert(
            "x".to_string(),
            NbtType::Record(RecordType { fields: inner, optional: vec![] }),
        );
        let ty = NbtType::Record(RecordType { fields: outer, optional: vec![] });
        let path = [Accessor::Key("x".into()), Accessor::Key("y".into())];
        assert_eq!(access_path(&ty, &path), Some(NbtType::Int));
    }

    #[test]
    fn checker_soundness_matches_cast_success() {
        // §8 invariant: if check(W, infer(v), numeric_match=true) is ok,
        // cast(W, v) returns a defined value of exactly type W.
        let v = NbtValue::Int(7);
        let inferred = NbtType::infer(&v);
        assert!(check(&NbtType::Int, &inferred, CheckFlags { numeric_match: true }).is_ok());
        assert_eq!(cast(&NbtType::Int, &v), Some(NbtValue::Int(7)));
    }
}
