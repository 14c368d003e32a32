//! HLSL to GLSL cross-compiler core.
//!
//! The pipeline runs preprocess, lex, parse, resolve, type-analyze and
//! emit, collecting diagnostics along the way. [`translate`] drives the
//! whole chain for one `(entry point, shader stage)` pair.

pub mod analyzer;
pub mod ast;
pub mod diags;
pub mod glsl;
pub mod intrinsics;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod report;
pub mod resolver;
pub mod scope;
pub mod semantic;
pub mod target;
pub mod ty;

#[cfg(test)]
mod analyzer_tests;
#[cfg(test)]
mod emitter_tests;
#[cfg(test)]
mod integration_tests;

use std::io;
use std::io::Write as _;

pub use preprocessor::{IncludeResolver, NullIncludeResolver};
pub use report::{CompilerError, Diagnostic, Log, Reporter, Result, Severity, StdLog};
pub use target::{InputVersion, OutputVersion, ShaderTarget};

/// One shader source to translate.
pub struct ShaderInput {
    pub source: String,
    pub filename: String,
    pub entry_point: String,
    pub target: ShaderTarget,
    pub input_version: InputVersion,
    /// `(identifier, optional value)` pairs defined before the first line.
    pub predefined_macros: Vec<(String, Option<String>)>,
    pub include_resolver: Option<Box<dyn IncludeResolver>>,
}

impl ShaderInput {
    pub fn new(source: impl Into<String>, entry_point: impl Into<String>, target: ShaderTarget) -> Self {
        ShaderInput {
            source: source.into(),
            filename: String::new(),
            entry_point: entry_point.into(),
            target,
            input_version: InputVersion::Hlsl5,
            predefined_macros: Vec::new(),
            include_resolver: None,
        }
    }
}

/// Where and how the translated GLSL is written.
pub struct ShaderOutput<'a> {
    pub sink: &'a mut dyn io::Write,
    pub version: OutputVersion,
    pub options: Options,
}

/// Formatting and behavior options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Indentation string for the emitted code.
    pub indent: String,
    /// Prefix for mangled local names and generated globals.
    pub prefix: String,
    pub warnings: bool,
    /// Blank lines between declarations.
    pub blanks: bool,
    /// `#line` marks in the output.
    pub line_marks: bool,
    pub dump_ast: bool,
    pub preprocess_only: bool,
    pub keep_comments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            indent: "    ".to_string(),
            prefix: "_".to_string(),
            warnings: false,
            blanks: true,
            line_marks: false,
            dump_ast: false,
            preprocess_only: false,
            keep_comments: true,
        }
    }
}

/// Translate one HLSL entry point into GLSL. Returns `true` on success;
/// `false` when any error was reported. All diagnostics are flushed into
/// the given log sink, grouped by severity.
pub fn translate(input: &mut ShaderInput, output: &mut ShaderOutput, log: &mut dyn Log) -> bool {
    let mut reporter = Reporter::new(output.options.warnings);

    // Preprocess.
    let source = {
        let mut preprocessor = preprocessor::Preprocessor::new(
            &input.predefined_macros,
            input.include_resolver.as_deref_mut(),
            &mut reporter,
        );
        preprocessor.run(&input.source)
    };

    if output.options.preprocess_only {
        let success = !reporter.has_errors();
        if let Err(err) = output.sink.write_all(source.to_text().as_bytes()) {
            reporter.error(
                report::ReportKind::IoError,
                err.to_string(),
                report::Span::default(),
            );
        }
        let success = success && !reporter.has_errors();
        reporter.flush(log);
        return success;
    }

    // Lex and parse.
    let tokens = lexer::tokenize(&source.lines, &mut reporter);
    let mut parser = parser::Parser::new(tokens, &mut reporter);
    if output.options.keep_comments {
        parser = parser.with_comments(source.comments);
    }
    let mut program = parser.parse();

    if output.options.dump_ast {
        reporter.info(diags::AstFormatter::format_program(&program), report::Span::default());
    }

    // Resolve and analyze.
    resolver::resolve(&mut program, &mut reporter);
    let analysis = analyzer::analyze(&mut program, &input.entry_point, input.target, &mut reporter);

    // Emit only when the front half is clean; partial output from a
    // broken AST helps nobody.
    if !reporter.has_errors() {
        if let Some(entry) = analysis.entry {
            let emitted = glsl::emit(
                &program,
                &analysis.table,
                entry,
                input.target,
                output.version,
                &output.options,
                &mut reporter,
            );
            if let Some(text) = emitted {
                if let Err(err) = output.sink.write_all(text.as_bytes()) {
                    reporter.error(
                        report::ReportKind::IoError,
                        err.to_string(),
                        report::Span::default(),
                    );
                }
            }
        }
    }

    let success = !reporter.has_errors();
    reporter.flush(log);
    success
}
