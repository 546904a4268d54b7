//! Demonstration host for `bolt-expr-compiler`: a `CommandSink` that just
//! collects commands, and config loading from a `bolt-expr.toml` file.

use std::fs;
use std::path::Path;

use bolt_expr_compiler::{CommandSink, ExpressionConfig};
use thiserror::Error;

/// A `CommandSink` that keeps every emitted command in memory, in order —
/// stands in for a real datapack function writer.
#[derive(Debug, Default)]
pub struct MockCommandSink {
    pub commands: Vec<String>,
}

impl CommandSink for MockCommandSink {
    fn push(&mut self, command: String) {
        self.commands.push(command);
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

/// Loads an `ExpressionConfig` from a TOML file, falling back to defaults
/// for any field the file doesn't set (see `ExpressionConfig`'s
/// `#[serde(default)]`).
pub fn load_config(path: &Path) -> Result<ExpressionConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_sink_records_commands_in_order() {
        let mut sink = MockCommandSink::default();
        sink.push("first".to_string());
        sink.push("second".to_string());
        assert_eq!(sink.commands, vec!["first", "second"]);
    }
}
