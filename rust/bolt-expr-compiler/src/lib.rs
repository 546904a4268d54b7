//! bolt-expr-compiler
//!
//! Lowers `Expr`/`Condition` trees over scores and data paths into ordered
//! `scoreboard`/`data`/`execute` command strings: unroll into IR, run the
//! fixed-order optimizer pipeline, serialize. `Expression` is the
//! entry point a host embeds.

pub mod config;
pub mod driver;
pub mod error;
pub mod expr_tree;
pub mod ir;
pub mod managers;
pub mod optimizer;
pub mod predicates;
pub mod serializer;
pub mod source;
pub mod unroll;

pub use config::ExpressionConfig;
pub use driver::{CommandSink, Expression};
pub use error::{ExpressionError, OptimizeError, SerializeError, UnrollError};
pub use expr_tree::{Condition, Expr, ExprExt, IntoExpr};
pub use ir::{BinaryOp, ConditionOp, IrNode, UnaryOp};
pub use optimizer::PassId;
pub use source::{DataSource, ScoreSource, TargetKind};
