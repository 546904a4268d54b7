//! Driver configuration (spec.md §6). Deserializable so a host can load it
//! from `bolt-expr.toml` (see `bolt-expr-cli`) as well as construct it
//! programmatically.

use bolt_expr_core::NbtType;
use serde::{Deserialize, Serialize};

use crate::optimizer::PassId;

/// Knobs governing temp/constant naming and which optimizer passes run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Scoreboard objective used for temporaries and promoted constants.
    pub temp_objective: String,
    /// Storage namespace used for temporary data paths.
    pub temp_storage: String,
    /// Objective constants are allocated under; defaults to `temp_objective`
    /// when left blank.
    pub const_objective: String,
    /// Logical path of the generated `init` function (spec.md §6) — not
    /// used by `Expression` itself, carried through for the host's build
    /// pipeline to name the function it writes `generate_init`'s output to.
    pub init_path: String,
    /// Prefix prepended to user-supplied objective names unless the caller
    /// already supplied one (spec.md §6); empty disables prefixing.
    pub objective_prefix: String,
    /// Cast type used for a store whose data target has no declared NBT
    /// type and the operation doesn't otherwise determine one.
    #[serde(with = "scalar_nbt_type")]
    pub default_nbt_type: NbtType,
    /// Cast type an untyped data target widens to when a division would
    /// otherwise truncate it (spec.md §4.4 pass 9/10).
    #[serde(with = "scalar_nbt_type")]
    pub default_floating_nbt_type: NbtType,
    /// Passes to skip, by name — default is the full fixed order from
    /// spec.md §4.4.
    pub disabled_passes: Vec<PassId>,
    /// Upper bound on the denominator `Scale::approximate` will search for
    /// a float scale factor.
    pub max_scale_denominator: i64,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        ExpressionConfig {
            temp_objective: "bolt.expr.temp".to_string(),
            temp_storage: "bolt:expr".to_string(),
            const_objective: "bolt.expr.const".to_string(),
            init_path: "bolt_expr:init".to_string(),
            objective_prefix: String::new(),
            default_nbt_type: NbtType::Int,
            default_floating_nbt_type: NbtType::Double,
            disabled_passes: Vec::new(),
            max_scale_denominator: 1 << 16,
        }
    }
}

impl ExpressionConfig {
    pub fn const_objective(&self) -> &str {
        if self.const_objective.is_empty() {
            &self.temp_objective
        } else {
            &self.const_objective
        }
    }
}

/// (De)serializes the two `*_nbt_type` config fields as their scalar type
/// name (`"int"`, `"double"`, ...) rather than deriving `serde` over the
/// full recursive `NbtType` tree, which only this handful of scalar slots
/// in config ever needs. An unrecognized name is a configuration error
/// (spec.md §7) caught at load time rather than at use.
mod scalar_nbt_type {
    use bolt_expr_core::NbtType;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(ty: &NbtType, serializer: S) -> Result<S::Ok, S::Error> {
        ty.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NbtType, D::Error> {
        let name = String::deserialize(deserializer)?;
        match name.as_str() {
            "byte" => Ok(NbtType::Byte),
            "short" => Ok(NbtType::Short),
            "int" => Ok(NbtType::Int),
            "long" => Ok(NbtType::Long),
            "float" => Ok(NbtType::Float),
            "double" => Ok(NbtType::Double),
            other => Err(serde::de::Error::custom(format!("not a scalar NBT type name: {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_every_pass() {
        let cfg = ExpressionConfig::default();
        assert!(cfg.disabled_passes.is_empty());
    }

    #[test]
    fn default_nbt_types_are_int_and_double() {
        let cfg = ExpressionConfig::default();
        assert_eq!(cfg.default_nbt_type, NbtType::Int);
        assert_eq!(cfg.default_floating_nbt_type, NbtType::Double);
    }

    #[test]
    fn scalar_nbt_type_round_trips_through_toml() {
        let cfg = ExpressionConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let back: ExpressionConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.default_nbt_type, cfg.default_nbt_type);
    }
}
