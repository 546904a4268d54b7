//! Smoke-test binary: resolves a handful of canned expressions through
//! `Expression` and prints the resulting commands. Not a real datapack
//! build tool — see `bolt-expr-cli`'s crate docs.

use std::path::PathBuf;

use bolt_expr_cli::{load_config, MockCommandSink};
use bolt_expr_compiler::{ExprExt, Expression, ExpressionConfig, ScoreSource};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a bolt-expr.toml config file; defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match args.config {
        Some(path) => load_config(&path).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to default config");
            ExpressionConfig::default()
        }),
        None => ExpressionConfig::default(),
    };

    let mut expr = Expression::new(config);
    let mut sink = MockCommandSink::default();

    let health = ScoreSource::new("@s", "health");
    expr.resolve(&health.clone().add(5i64).mul(2i64), None, &mut sink)
        .expect("resolving a canned expression should never fail");

    expr.generate_init(&mut sink);

    for command in &sink.commands {
        println!("{command}");
    }
}
