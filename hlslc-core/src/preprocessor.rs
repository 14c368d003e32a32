//! Minimal HLSL preprocessor.
//!
//! Line-oriented: expands object-like `#define` macros, resolves
//! `#include` through the caller's resolver, evaluates
//! `#ifdef`/`#ifndef`/`#else`/`#endif`, and honors `#line` marks.
//! Comments are stripped here (block comments may span lines, which the
//! line-at-a-time lexer cannot see) and captured with their line numbers
//! so the parser can re-attach them when comment preservation is on.

use crate::report::{ReportKind, Reporter, Span};
use std::collections::HashMap;

/// Callback resolving `#include "name"` to the included source text.
pub trait IncludeResolver {
    fn resolve(&mut self, name: &str) -> std::io::Result<String>;
}

/// Default resolver that rejects every include.
#[derive(Debug, Default)]
pub struct NullIncludeResolver;

impl IncludeResolver for NullIncludeResolver {
    fn resolve(&mut self, name: &str) -> std::io::Result<String> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("include \"{}\" not resolvable", name),
        ))
    }
}

/// One expanded source line with its original line number.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub text: String,
    pub line: u32,
}

/// A comment captured during preprocessing.
#[derive(Debug, Clone)]
pub struct Comment {
    pub line: u32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PreprocessedSource {
    pub lines: Vec<SourceLine>,
    pub comments: Vec<Comment>,
}

impl PreprocessedSource {
    /// The expanded text, used by preprocess-only mode.
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        for line in &self.lines {
            s.push_str(&line.text);
            s.push('\n');
        }
        s
    }
}

struct CondState {
    active: bool,
    taken: bool,
    parent_active: bool,
}

pub struct Preprocessor<'a, 'r> {
    macros: HashMap<String, String>,
    resolver: Option<&'a mut (dyn IncludeResolver + 'r)>,
    reporter: &'a mut Reporter,
    cond_stack: Vec<CondState>,
    in_block_comment: bool,
}

impl<'a, 'r> Preprocessor<'a, 'r> {
    pub fn new(
        predefined_macros: &[(String, Option<String>)],
        resolver: Option<&'a mut (dyn IncludeResolver + 'r)>,
        reporter: &'a mut Reporter,
    ) -> Self {
        let macros = predefined_macros
            .iter()
            .map(|(ident, value)| (ident.clone(), value.clone().unwrap_or_default()))
            .collect();
        Preprocessor {
            macros,
            resolver,
            reporter,
            cond_stack: Vec::new(),
            in_block_comment: false,
        }
    }

    pub fn run(&mut self, source: &str) -> PreprocessedSource {
        let mut output = PreprocessedSource {
            lines: Vec::new(),
            comments: Vec::new(),
        };
        self.process(source, &mut output);
        if !self.cond_stack.is_empty() {
            self.reporter.error(
                ReportKind::SyntaxError,
                "missing #endif at end of file",
                Span::default(),
            );
        }
        if self.in_block_comment {
            self.reporter.error(
                ReportKind::LexicalError,
                "unterminated block comment",
                Span::default(),
            );
        }
        output
    }

    fn active(&self) -> bool {
        self.cond_stack.iter().all(|c| c.active)
    }

    fn process(&mut self, source: &str, output: &mut PreprocessedSource) {
        let mut line_no: u32 = 1;
        for raw_line in source.lines() {
            let line = self.strip_comments(raw_line, line_no, output);
            let trimmed = line.trim_start();

            if let Some(directive) = trimmed.strip_prefix('#') {
                line_no = self.directive(directive.trim(), line_no, output);
            } else if self.active() && !line.trim().is_empty() {
                output.lines.push(SourceLine {
                    text: self.substitute(&line),
                    line: line_no,
                });
            }
            line_no += 1;
        }
    }

    /// Handle one directive line; returns the (possibly remapped) current
    /// line number.
    fn directive(&mut self, directive: &str, line_no: u32, output: &mut PreprocessedSource) -> u32 {
        let span = Span::new(line_no, 1);
        let (name, rest) = match directive.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (directive, ""),
        };

        match name {
            "define" if self.active() => {
                let (ident, value) = match rest.split_once(char::is_whitespace) {
                    Some((ident, value)) => (ident, value.trim()),
                    None => (rest, ""),
                };
                if ident.is_empty() || ident.contains('(') {
                    self.reporter.error(
                        ReportKind::SyntaxError,
                        format!("unsupported macro definition \"{}\"", rest),
                        span,
                    );
                } else {
                    self.macros.insert(ident.to_string(), value.to_string());
                }
            }
            "undef" if self.active() => {
                self.macros.remove(rest);
            }
            "include" if self.active() => {
                let file = rest.trim_matches(|c| c == '"' || c == '<' || c == '>');
                match self.resolver.as_deref_mut() {
                    Some(resolver) => match resolver.resolve(file) {
                        Ok(text) => {
                            // Included lines keep the include site's number.
                            let mut included = PreprocessedSource {
                                lines: Vec::new(),
                                comments: Vec::new(),
                            };
                            self.process(&text, &mut included);
                            for mut line in included.lines {
                                line.line = line_no;
                                output.lines.push(line);
                            }
                            output.comments.extend(included.comments);
                        }
                        Err(err) => {
                            self.reporter
                                .error(ReportKind::IoError, err.to_string(), span);
                        }
                    },
                    None => {
                        self.reporter.error(
                            ReportKind::IoError,
                            format!("no include resolver for \"{}\"", file),
                            span,
                        );
                    }
                }
            }
            "ifdef" | "ifndef" => {
                let parent_active = self.active();
                let defined = self.macros.contains_key(rest);
                let active = parent_active && (defined == (name == "ifdef"));
                self.cond_stack.push(CondState {
                    active,
                    taken: active,
                    parent_active,
                });
            }
            "else" => match self.cond_stack.last_mut() {
                Some(state) => {
                    state.active = state.parent_active && !state.taken;
                    state.taken = true;
                }
                None => {
                    self.reporter
                        .error(ReportKind::SyntaxError, "#else without #ifdef", span);
                }
            },
            "endif" => {
                if self.cond_stack.pop().is_none() {
                    self.reporter
                        .error(ReportKind::SyntaxError, "#endif without #ifdef", span);
                }
            }
            "line" if self.active() => {
                if let Some(n) = rest.split_whitespace().next().and_then(|s| s.parse::<u32>().ok()) {
                    // The next line is numbered n, and line_no is
                    // incremented right after this directive returns.
                    return n.saturating_sub(1);
                }
                self.reporter
                    .error(ReportKind::SyntaxError, "invalid #line directive", span);
            }
            "define" | "undef" | "include" | "line" => {
                // Inactive branch; skip.
            }
            _ if self.active() => {
                self.reporter.warning(
                    ReportKind::SyntaxError,
                    format!("unknown preprocessor directive \"#{}\"", name),
                    span,
                );
            }
            _ => {}
        }
        line_no
    }

    /// Remove line and block comments, recording their text.
    fn strip_comments(&mut self, line: &str, line_no: u32, output: &mut PreprocessedSource) -> String {
        let mut stripped = String::new();
        let mut rest = line;

        loop {
            if self.in_block_comment {
                match rest.find("*/") {
                    Some(end) => {
                        if self.active() && !rest[..end].trim().is_empty() {
                            output.comments.push(Comment {
                                line: line_no,
                                text: rest[..end].trim().to_string(),
                            });
                        }
                        rest = &rest[end + 2..];
                        self.in_block_comment = false;
                    }
                    None => {
                        if self.active() && !rest.trim().is_empty() {
                            output.comments.push(Comment {
                                line: line_no,
                                text: rest.trim().to_string(),
                            });
                        }
                        return stripped;
                    }
                }
            } else {
                let line_pos = rest.find("//");
                let block_pos = rest.find("/*");
                match (line_pos, block_pos) {
                    (Some(lp), bp) if bp.map(|b| lp < b).unwrap_or(true) => {
                        stripped.push_str(&rest[..lp]);
                        if self.active() && !rest[lp + 2..].trim().is_empty() {
                            output.comments.push(Comment {
                                line: line_no,
                                text: rest[lp + 2..].trim().to_string(),
                            });
                        }
                        return stripped;
                    }
                    (_, Some(bp)) => {
                        stripped.push_str(&rest[..bp]);
                        rest = &rest[bp + 2..];
                        self.in_block_comment = true;
                    }
                    (None, None) => {
                        stripped.push_str(rest);
                        return stripped;
                    }
                    (Some(_), None) => unreachable!(),
                }
            }
        }
    }

    /// Replace macro occurrences at identifier boundaries.
    fn substitute(&self, line: &str) -> String {
        if self.macros.is_empty() {
            return line.to_string();
        }
        let mut out = String::with_capacity(line.len());
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < bytes.len() {
                    let c2 = bytes[i] as char;
                    if c2.is_ascii_alphanumeric() || c2 == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word = &line[start..i];
                match self.macros.get(word) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(word),
                }
            } else {
                out.push(c);
                i += 1;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess(source: &str) -> (PreprocessedSource, Reporter) {
        preprocess_with(source, &[])
    }

    fn preprocess_with(
        source: &str,
        macros: &[(String, Option<String>)],
    ) -> (PreprocessedSource, Reporter) {
        let mut reporter = Reporter::new(true);
        let output = Preprocessor::new(macros, None, &mut reporter).run(source);
        (output, reporter)
    }

    #[test]
    fn test_define_substitution() {
        let (output, reporter) = preprocess("#define SIZE 16\nfloat data[SIZE];\n");
        assert!(!reporter.has_errors());
        assert_eq!(output.lines.len(), 1);
        assert_eq!(output.lines[0].text, "float data[16];");
        assert_eq!(output.lines[0].line, 2);
    }

    #[test]
    fn test_substitution_respects_word_boundaries() {
        let (output, _) = preprocess("#define N 4\nfloat Nx; float v[N];\n");
        assert_eq!(output.lines[0].text, "float Nx; float v[4];");
    }

    #[test]
    fn test_ifdef_branches() {
        let source = "#define A\n#ifdef A\nint x;\n#else\nint y;\n#endif\n#ifndef A\nint z;\n#endif\n";
        let (output, reporter) = preprocess(source);
        assert!(!reporter.has_errors());
        let texts: Vec<_> = output.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["int x;"]);
    }

    #[test]
    fn test_missing_endif_reported() {
        let (_, reporter) = preprocess("#ifdef A\nint x;\n");
        assert!(reporter.has_errors());
    }

    #[test]
    fn test_predefined_macros() {
        let macros = vec![("WIDTH".to_string(), Some("8".to_string()))];
        let (output, _) = preprocess_with("float v[WIDTH];\n", &macros);
        assert_eq!(output.lines[0].text, "float v[8];");
    }

    #[test]
    fn test_comments_stripped_and_captured() {
        let source = "// leading\nint x; /* mid */ int y;\n/* multi\nline */ int z;\n";
        let (output, reporter) = preprocess(source);
        assert!(!reporter.has_errors());
        let texts: Vec<_> = output.lines.iter().map(|l| l.text.trim().to_string()).collect();
        assert_eq!(texts, vec!["int x;  int y;", "int z;"]);
        assert_eq!(output.comments.len(), 4);
        assert_eq!(output.comments[0].text, "leading");
    }

    #[test]
    fn test_line_mark() {
        let (output, _) = preprocess("int a;\n#line 40\nint b;\n");
        assert_eq!(output.lines[0].line, 1);
        assert_eq!(output.lines[1].line, 40);
    }
}
