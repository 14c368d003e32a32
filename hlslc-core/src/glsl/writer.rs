//! Low-level output writer: indentation, scopes, blank lines and
//! `#line` marks, per the formatting options.

#[derive(Debug)]
pub struct Writer {
    output: String,
    indent_str: String,
    indent: usize,
    blanks: bool,
    line_marks: bool,
    /// Last line mark written, to suppress duplicates.
    last_mark: Option<u32>,
    at_blank: bool,
}

impl Writer {
    pub fn new(indent_str: &str, blanks: bool, line_marks: bool) -> Self {
        Writer {
            output: String::new(),
            indent_str: indent_str.to_string(),
            indent: 0,
            blanks,
            line_marks,
            last_mark: None,
            at_blank: true,
        }
    }

    pub fn into_string(self) -> String {
        self.output
    }

    pub fn line(&mut self, content: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.output.push_str(&self.indent_str);
        }
        self.output.push_str(content.as_ref());
        self.output.push('\n');
        self.at_blank = false;
    }

    /// Separator line between declarations; suppressed when blank lines
    /// are disabled and coalesced when already at one.
    pub fn blank(&mut self) {
        if self.blanks && !self.at_blank {
            self.output.push('\n');
            self.at_blank = true;
        }
    }

    pub fn line_mark(&mut self, line: u32) {
        if self.line_marks && self.last_mark != Some(line) {
            self.line(format!("#line {}", line));
            self.last_mark = Some(line);
        }
    }

    pub fn comment(&mut self, text: &str) {
        self.line(format!("// {}", text));
    }

    pub fn open_scope(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    pub fn close_scope(&mut self, semicolon: bool) {
        self.indent = self.indent.saturating_sub(1);
        self.line(if semicolon { "};" } else { "}" });
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn unindent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation_and_scopes() {
        let mut writer = Writer::new("  ", true, false);
        writer.line("void main()");
        writer.open_scope();
        writer.line("x = 1;");
        writer.close_scope(false);
        assert_eq!(writer.into_string(), "void main()\n{\n  x = 1;\n}\n");
    }

    #[test]
    fn test_blank_coalescing() {
        let mut writer = Writer::new("    ", true, false);
        writer.blank();
        writer.line("a;");
        writer.blank();
        writer.blank();
        writer.line("b;");
        assert_eq!(writer.into_string(), "a;\n\nb;\n");
    }

    #[test]
    fn test_blanks_disabled() {
        let mut writer = Writer::new("    ", false, false);
        writer.line("a;");
        writer.blank();
        writer.line("b;");
        assert_eq!(writer.into_string(), "a;\nb;\n");
    }

    #[test]
    fn test_line_marks_deduplicated() {
        let mut writer = Writer::new("    ", true, true);
        writer.line_mark(3);
        writer.line("a;");
        writer.line_mark(3);
        writer.line("b;");
        writer.line_mark(5);
        writer.line("c;");
        assert_eq!(writer.into_string(), "#line 3\na;\nb;\n#line 5\nc;\n");
    }
}
