// src/tasks/scripts.rs

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};
use tracing::{debug, info};

use crate::tasks::{FileFailures, TaskContext, TaskReport};
use crate::types::TaskKind;

/// Check that `target` (e.g. `es2015`, `chrome80`) is understood by the
/// transformer.
pub fn check_target(target: &str) -> std::result::Result<(), String> {
    TransformOptions::from_target(target).map(|_| ())
}

fn joined<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Transpile one classic script down to `target` and minify it.
///
/// Top-level names are never mangled: every page script shares the global
/// scope.
pub fn compile_one(source: &str, path: &Path, target: &str) -> Result<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        bail!("parse error: {}", joined(&parsed.errors));
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();

    let options = TransformOptions::from_target(target).map_err(|e| anyhow!(e))?;
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        bail!("transform error: {}", joined(&transformed.errors));
    }

    let minified = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: false,
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions::default()),
    })
    .build(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Compile every script matching `scripts.src` into `scripts.dist`.
pub fn compile_scripts(ctx: &TaskContext) -> Result<TaskReport> {
    let cfg = &ctx.config.scripts;
    let dist = ctx.path(&cfg.dist);

    let mut report = TaskReport::default();
    let mut failures = FileFailures::new(TaskKind::CompileScripts);

    for file in ctx.sources(&cfg.src)? {
        let result = ctx
            .fs
            .read_to_string(&file.path)
            .and_then(|src| compile_one(&src, &file.path, &cfg.target));

        let code = match result {
            Ok(code) => code,
            Err(err) => {
                failures.record(&file.path, err);
                continue;
            }
        };

        let out = dist.join(&file.rel);
        ctx.fs
            .write(&out, code.as_bytes())
            .with_context(|| format!("writing {:?}", out))?;
        debug!(file = ?file.rel, out = ?out, "script written");
        report.written += 1;
    }

    info!(task = %TaskKind::CompileScripts, scripts = report.written, "scripts compiled");
    failures.finish(report)
}
