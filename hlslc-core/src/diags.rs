//! Diagnostic utilities for AST formatting and display.
//!
//! Provides a compact formatter for AST nodes that outputs something
//! close to HLSL syntax, used by the AST dump option.

use crate::ast::*;
use std::fmt::Write;

/// Formatter for AST nodes that produces readable indented output.
pub struct AstFormatter<'a> {
    program: &'a Program,
    output: String,
    indent: usize,
}

impl<'a> AstFormatter<'a> {
    pub fn new(program: &'a Program) -> Self {
        AstFormatter {
            program,
            output: String::new(),
            indent: 0,
        }
    }

    /// Format a whole program and return the formatted string.
    pub fn format_program(program: &'a Program) -> String {
        let mut formatter = AstFormatter::new(program);
        for global in &program.globals {
            formatter.write_global(global);
        }
        formatter.output
    }

    fn write_line(&mut self, content: &str) {
        let indent = "  ".repeat(self.indent);
        let _ = writeln!(self.output, "{}{}", indent, content);
    }

    fn write_global(&mut self, global: &GlobalDecl) {
        match &global.kind {
            GlobalDeclKind::Var(id) => {
                let stmnt = self.program.var_decl_stmnt(*id);
                self.write_line(&stmnt.to_string(self.program, true));
            }
            GlobalDeclKind::Struct(id) => self.write_struct(*id),
            GlobalDeclKind::Function(id) => self.write_function(*id),
            GlobalDeclKind::UniformBuffer(id) => {
                let decl = self.program.uniform_buffer(*id);
                self.write_line(&decl.to_string());
                self.indent += 1;
                for &member in &decl.members {
                    let stmnt = self.program.var_decl_stmnt(member);
                    self.write_line(&stmnt.to_string(self.program, true));
                }
                self.indent -= 1;
            }
            GlobalDeclKind::Buffers(ids) => {
                for &id in ids {
                    let decl = self.program.buffer(id);
                    self.write_line(&format!("{:?} {}", decl.kind, decl.ident));
                }
            }
            GlobalDeclKind::Samplers(ids) => {
                for &id in ids {
                    let decl = self.program.sampler(id);
                    self.write_line(&format!("{:?} {}", decl.kind, decl.ident));
                }
            }
            GlobalDeclKind::Alias(id) => {
                let decl = self.program.alias(*id);
                self.write_line(&format!(
                    "typedef {} {}",
                    decl.var_type.to_string(self.program),
                    decl.ident
                ));
            }
        }
    }

    fn write_struct(&mut self, id: StructId) {
        let decl = self.program.struct_(id);
        let mut header = decl.signature_to_string();
        if let Some(base) = &decl.base_name {
            header += &format!(" : {}", base);
        }
        self.write_line(&header);
        self.indent += 1;
        for &member in &decl.members {
            let stmnt = self.program.var_decl_stmnt(member);
            self.write_line(&stmnt.to_string(self.program, true));
        }
        self.indent -= 1;
    }

    fn write_function(&mut self, id: FunctionId) {
        let decl = self.program.function(id);
        let mut header = decl.signature_to_string(self.program, true);
        if let Some(semantic) = &decl.return_semantic {
            header += &format!(" : {}", semantic);
        }
        if decl.is_forward_decl() {
            header += ";";
        }
        for attribute in &decl.attributes {
            self.write_line(&format!("[{}]", attribute.ident));
        }
        self.write_line(&header);
        if let Some(body) = &decl.body {
            self.indent += 1;
            for stmnt in &body.stmnts {
                self.write_stmnt(stmnt);
            }
            self.indent -= 1;
        }
    }

    fn write_stmnt(&mut self, stmnt: &Stmnt) {
        match &stmnt.kind {
            StmntKind::Null => self.write_line(";"),
            StmntKind::VarDecl(id) => {
                let decl_stmnt = self.program.var_decl_stmnt(*id);
                self.write_line(&decl_stmnt.to_string(self.program, true));
            }
            StmntKind::CodeBlock(block) => {
                self.write_line("{");
                self.indent += 1;
                for inner in &block.stmnts {
                    self.write_stmnt(inner);
                }
                self.indent -= 1;
                self.write_line("}");
            }
            StmntKind::For {
                init,
                condition,
                iteration,
                body,
            } => {
                let condition = condition
                    .as_ref()
                    .map(|c| self.format_expr(c))
                    .unwrap_or_default();
                let iteration = iteration
                    .as_ref()
                    .map(|i| self.format_expr(i))
                    .unwrap_or_default();
                self.write_line(&format!("for (...; {}; {})", condition, iteration));
                self.indent += 1;
                self.write_stmnt(init);
                self.write_stmnt(body);
                self.indent -= 1;
            }
            StmntKind::While { condition, body } => {
                self.write_line(&format!("while ({})", self.format_expr(condition)));
                self.indent += 1;
                self.write_stmnt(body);
                self.indent -= 1;
            }
            StmntKind::DoWhile { body, condition } => {
                self.write_line("do");
                self.indent += 1;
                self.write_stmnt(body);
                self.indent -= 1;
                self.write_line(&format!("while ({})", self.format_expr(condition)));
            }
            StmntKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.write_line(&format!("if ({})", self.format_expr(condition)));
                self.indent += 1;
                self.write_stmnt(then_branch);
                self.indent -= 1;
                if let Some(else_branch) = else_branch {
                    self.write_line("else");
                    self.indent += 1;
                    self.write_stmnt(else_branch);
                    self.indent -= 1;
                }
            }
            StmntKind::Switch { selector, cases } => {
                self.write_line(&format!("switch ({})", self.format_expr(selector)));
                self.indent += 1;
                for case in cases {
                    match &case.expr {
                        Some(expr) => self.write_line(&format!("case {}:", self.format_expr(expr))),
                        None => self.write_line("default:"),
                    }
                    self.indent += 1;
                    for inner in &case.stmnts {
                        self.write_stmnt(inner);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
            }
            StmntKind::Expr(expr) => {
                let formatted = self.format_expr(expr);
                self.write_line(&formatted);
            }
            StmntKind::Return(expr) => match expr {
                Some(expr) => {
                    let formatted = self.format_expr(expr);
                    self.write_line(&format!("return {}", formatted));
                }
                None => self.write_line("return"),
            },
            StmntKind::CtrlTransfer(ctrl) => self.write_line(&ctrl.to_string()),
        }
    }

    fn format_expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Null => String::new(),
            ExprKind::Literal { value, .. } => value.clone(),
            ExprKind::TypeName(var_type) => var_type.to_string(self.program),
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => format!(
                "({} ? {} : {})",
                self.format_expr(condition),
                self.format_expr(then_expr),
                self.format_expr(else_expr)
            ),
            ExprKind::Binary { op, lhs, rhs } => format!(
                "({} {} {})",
                self.format_expr(lhs),
                op,
                self.format_expr(rhs)
            ),
            ExprKind::Unary { op, expr } => format!("({}{})", op, self.format_expr(expr)),
            ExprKind::PostUnary { op, expr } => format!("({}{})", self.format_expr(expr), op),
            ExprKind::Call(call) => {
                let arguments: Vec<String> =
                    call.arguments.iter().map(|a| self.format_expr(a)).collect();
                let callee = match (&call.ident, call.type_ctor) {
                    (Some(ident), _) => ident.to_string(),
                    (None, Some(data_type)) => data_type.to_string(),
                    (None, None) => "?".to_string(),
                };
                format!("{}({})", callee, arguments.join(", "))
            }
            ExprKind::Bracket(inner) => format!("({})", self.format_expr(inner)),
            ExprKind::Suffix { expr, var_ident } => {
                format!("{}.{}", self.format_expr(expr), var_ident)
            }
            ExprKind::ArrayAccess { expr, indices } => {
                let mut s = self.format_expr(expr);
                for index in indices {
                    s += &format!("[{}]", self.format_expr(index));
                }
                s
            }
            ExprKind::Cast { target, expr } => format!(
                "({}){}",
                target.to_string(self.program),
                self.format_expr(expr)
            ),
            ExprKind::Var { ident, assign } => match assign {
                Some((op, value)) => {
                    format!("{} {} {}", ident, op, self.format_expr(value))
                }
                None => ident.to_string(),
            },
            ExprKind::List { first, next } => {
                format!("{}, {}", self.format_expr(first), self.format_expr(next))
            }
            ExprKind::Initializer(exprs) => {
                let items: Vec<String> = exprs.iter().map(|e| self.format_expr(e)).collect();
                format!("{{{}}}", items.join(", "))
            }
        }
    }
}
