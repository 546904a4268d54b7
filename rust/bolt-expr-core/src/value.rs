//! Host-facing values and the NBT value model they convert into.

use indexmap::IndexMap;
use thiserror::Error;

/// A value as it arrives from the embedding host, before conversion to NBT.
///
/// The surface-language parser is out of scope for this crate (see
/// `spec.md` §1), so literal construction is specified against this
/// explicit enum rather than a dynamically-typed host object.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<HostValue>),
    /// Order-preserving: the iteration order becomes the compound's key order.
    Map(Vec<(String, HostValue)>),
}

#[derive(Debug, Error, PartialEq)]
pub enum LiteralError {
    #[error("host value has no NBT equivalent: {0:?}")]
    Unrepresentable(HostValue),
}

/// A primitive NBT value. Compounds are order-preserving maps so that
/// serialized SNBT (and therefore emitted commands) stay deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Compound(IndexMap<String, NbtValue>),
    List(Vec<NbtValue>),
}

impl NbtValue {
    /// Converts a host value following the §3 conversion rule: booleans to
    /// byte, integers to int, floats to float, strings to string, mappings
    /// and lists recursively; anything else is rejected.
    pub fn from_host(value: HostValue) -> Result<Self, LiteralError> {
        match value {
            HostValue::Bool(b) => Ok(NbtValue::Byte(i8::from(b))),
            HostValue::Int(i) => {
                // Integer literals default to `int`; callers that need a
                // wider/narrower NBT numeric type cast explicitly afterward.
                if let Ok(narrow) = i32::try_from(i) {
                    Ok(NbtValue::Int(narrow))
                } else {
                    Ok(NbtValue::Long(i))
                }
            }
            HostValue::Float(f) => Ok(NbtValue::Float(f as f32)),
            HostValue::Str(s) => Ok(NbtValue::String(s)),
            HostValue::List(items) => {
                let converted = items
                    .into_iter()
                    .map(NbtValue::from_host)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(NbtValue::List(converted))
            }
            HostValue::Map(entries) => {
                let mut compound = IndexMap::with_capacity(entries.len());
                for (key, val) in entries {
                    compound.insert(key, NbtValue::from_host(val)?);
                }
                Ok(NbtValue::Compound(compound))
            }
        }
    }

    /// Renders this value using Minecraft's stringified-NBT grammar.
    pub fn to_snbt(&self) -> String {
        match self {
            NbtValue::Byte(v) => format!("{v}b"),
            NbtValue::Short(v) => format!("{v}s"),
            NbtValue::Int(v) => format!("{v}"),
            NbtValue::Long(v) => format!("{v}l"),
            NbtValue::Float(v) => format!("{v}f"),
            NbtValue::Double(v) => format!("{v}d"),
            NbtValue::String(v) => format!("{v:?}"),
            NbtValue::List(items) => {
                let inner: Vec<String> = items.iter().map(NbtValue::to_snbt).collect();
                format!("[{}]", inner.join(","))
            }
            NbtValue::Compound(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k}:{}", v.to_snbt()))
                    .collect();
                format!("{{{}}}", inner.join(","))
            }
        }
    }

    /// True if this value is a bare numeric scalar (the operand kinds that
    /// `mul`/`div`/`mod`/`min`/`max` require a score for, per §4.4 pass 17).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            NbtValue::Byte(_)
                | NbtValue::Short(_)
                | NbtValue::Int(_)
                | NbtValue::Long(_)
                | NbtValue::Float(_)
                | NbtValue::Double(_)
        )
    }

    /// Best-effort conversion to `i32`, used when a literal is promoted to a
    /// constant score (scores only ever hold 32-bit integers).
    pub fn as_score_int(&self) -> Option<i32> {
        match self {
            NbtValue::Byte(v) => Some(i32::from(*v)),
            NbtValue::Short(v) => Some(i32::from(*v)),
            NbtValue::Int(v) => Some(*v),
            NbtValue::Long(v) => i32::try_from(*v).ok(),
            NbtValue::Float(v) if v.fract() == 0.0 => Some(*v as i32),
            NbtValue::Double(v) if v.fract() == 0.0 => Some(*v as i32),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_becomes_byte() {
        assert_eq!(
            NbtValue::from_host(HostValue::Bool(true)).unwrap(),
            NbtValue::Byte(1)
        );
    }

    #[test]
    fn int_becomes_int_or_long() {
        assert_eq!(
            NbtValue::from_host(HostValue::Int(5)).unwrap(),
            NbtValue::Int(5)
        );
        assert_eq!(
            NbtValue::from_host(HostValue::Int(i64::MAX)).unwrap(),
            NbtValue::Long(i64::MAX)
        );
    }

    #[test]
    fn nested_map_preserves_key_order() {
        let host = HostValue::Map(vec![
            ("b".into(), HostValue::Int(1)),
            ("a".into(), HostValue::Int(2)),
        ]);
        let nbt = NbtValue::from_host(host).unwrap();
        match nbt {
            NbtValue::Compound(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["b", "a"]);
            }
            _ => panic!("expected compound"),
        }
    }

    #[test]
    fn snbt_round_trip_shapes() {
        let nbt = NbtValue::Int(3);
        assert_eq!(nbt.to_snbt(), "3");
        let nbt = NbtValue::Float(1.5);
        assert_eq!(nbt.to_snbt(), "1.5f");
    }
}
