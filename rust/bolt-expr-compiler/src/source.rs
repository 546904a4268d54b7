//! User-facing source identifiers (spec.md §3 "Source identifiers").

use bolt_expr_core::{Accessor, NbtType, Scale};

/// Where a [`DataSource`] lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Storage,
    Entity,
    Block,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Storage => write!(f, "storage"),
            TargetKind::Entity => write!(f, "entity"),
            TargetKind::Block => write!(f, "block"),
        }
    }
}

/// A scoreboard holder/objective pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreSource {
    pub holder: String,
    pub objective: String,
}

impl ScoreSource {
    pub fn new(holder: impl Into<String>, objective: impl Into<String>) -> Self {
        ScoreSource {
            holder: holder.into(),
            objective: objective.into(),
        }
    }
}

impl std::fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.holder, self.objective)
    }
}

/// A data-path source: `(target_kind, target, path, nbt_type?, scale)`.
///
/// `nbt_type`/`scale` are not hashed/compared — two `DataSource`s that only
/// differ in their declared view onto the same path are the *same* source
/// for reaching-definitions purposes (spec.md §4.4's parent/child aliasing).
#[derive(Debug, Clone)]
pub struct DataSource {
    pub target_kind: TargetKind,
    pub target: String,
    pub path: Vec<Accessor>,
    pub nbt_type: Option<NbtType>,
    pub scale: Scale,
}

impl DataSource {
    pub fn new(target_kind: TargetKind, target: impl Into<String>) -> Self {
        DataSource {
            target_kind,
            target: target.into(),
            path: Vec::new(),
            nbt_type: None,
            scale: Scale::ONE,
        }
    }

    pub fn with_path(&self, accessor: Accessor) -> DataSource {
        let mut path = self.path.clone();
        path.push(accessor);
        DataSource {
            target_kind: self.target_kind,
            target: self.target.clone(),
            path,
            nbt_type: self.nbt_type.clone(),
            scale: self.scale,
        }
    }

    pub fn with_scale(&self, scale: Scale) -> DataSource {
        DataSource { scale, ..self.clone() }
    }

    pub fn with_type(&self, nbt_type: NbtType) -> DataSource {
        DataSource {
            nbt_type: Some(nbt_type),
            ..self.clone()
        }
    }

    /// True if `other`'s path is a (non-strict) prefix of this one, i.e.
    /// writing `other` invalidates this path's cached value and vice versa.
    pub fn aliases(&self, other: &DataSource) -> bool {
        if self.target_kind != other.target_kind || self.target != other.target {
            return false;
        }
        let shorter = self.path.len().min(other.path.len());
        self.path[..shorter] == other.path[..shorter]
    }
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        self.target_kind == other.target_kind && self.target == other.target && self.path == other.path
    }
}
impl Eq for DataSource {}

impl std::hash::Hash for DataSource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.target_kind.hash(state);
        self.target.hash(state);
        // Accessor doesn't derive Hash (it can hold a float-bearing NbtValue
        // via Filter); hash its rendered path instead.
        format!("{:?}", self.path).hash(state);
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.target_kind, self.target)?;
        if !self.path.is_empty() {
            write!(f, " {}", render_path(&self.path))?;
        }
        Ok(())
    }
}

pub fn render_path(path: &[Accessor]) -> String {
    let mut out = String::new();
    for (i, accessor) in path.iter().enumerate() {
        match accessor {
            Accessor::Key(key) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(key);
            }
            Accessor::Index(idx) => {
                out.push_str(&format!("[{idx}]"));
            }
            Accessor::Filter(value) => {
                out.push_str(&format!("[{}]", value.to_snbt()));
            }
        }
    }
    out
}

/// Tagged union used as a hashable key wherever sources are tracked in maps
/// (reaching definitions, lazy-value tables, temp/defined sets).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceTuple {
    Score(ScoreSource),
    Data(DataSourceKey),
}

/// The hashable projection of a [`DataSource`] (drops `nbt_type`/`scale`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSourceKey {
    pub target_kind: TargetKind,
    pub target: String,
    pub path: Vec<AccessorKey>,
}

/// `Accessor` without the `NbtValue` payload inside `Filter`, which is not
/// `Hash`/`Eq` (it can carry floats).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessorKey {
    Key(String),
    Index(i32),
    Filter(String),
}

impl From<&DataSource> for DataSourceKey {
    fn from(d: &DataSource) -> Self {
        DataSourceKey {
            target_kind: d.target_kind,
            target: d.target.clone(),
            path: d.path.iter().map(accessor_key).collect(),
        }
    }
}

fn accessor_key(a: &Accessor) -> AccessorKey {
    match a {
        Accessor::Key(k) => AccessorKey::Key(k.clone()),
        Accessor::Index(i) => AccessorKey::Index(*i),
        Accessor::Filter(v) => AccessorKey::Filter(v.to_snbt()),
    }
}

impl SourceTuple {
    pub fn from_score(s: &ScoreSource) -> SourceTuple {
        SourceTuple::Score(s.clone())
    }

    pub fn from_data(d: &DataSource) -> SourceTuple {
        SourceTuple::Data(DataSourceKey::from(d))
    }

    /// True if `self`'s path aliases `other`'s per spec.md §3's parent/child
    /// invalidation rule. Scores never alias anything but themselves.
    pub fn aliases(&self, other: &SourceTuple) -> bool {
        match (self, other) {
            (SourceTuple::Score(a), SourceTuple::Score(b)) => a == b,
            (SourceTuple::Data(a), SourceTuple::Data(b)) => {
                if a.target_kind != b.target_kind || a.target != b.target {
                    return false;
                }
                let shorter = a.path.len().min(b.path.len());
                a.path[..shorter] == b.path[..shorter]
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_path_aliases_child() {
        let root = DataSource::new(TargetKind::Storage, "demo");
        let child = root.with_path(Accessor::Key("list".into())).with_path(Accessor::Index(0));
        assert!(root.aliases(&child));
        assert!(child.aliases(&root));
    }

    #[test]
    fn siblings_do_not_alias() {
        let root = DataSource::new(TargetKind::Storage, "demo");
        let a = root.with_path(Accessor::Key("a".into()));
        let b = root.with_path(Accessor::Key("b".into()));
        assert!(!a.aliases(&b));
    }
}
