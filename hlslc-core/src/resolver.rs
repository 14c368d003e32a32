//! Symbol table and reference resolver.
//!
//! Binds every name occurrence to its declaration: `VarIdent` head
//! symbols, `VarDecl` back-references to their declaration statements,
//! struct base references, type-specifier references, and intrinsic
//! classification of calls. Function calls to user functions are bound
//! later by the analyzer, which needs argument types for overload
//! ranking; the resolver only verifies that the callee name exists.

use crate::ast::*;
use crate::intrinsics::Intrinsic;
use crate::report::{ReportKind, Reporter};
use crate::scope::ScopeStack;
use std::collections::HashMap;

pub struct Resolver<'a> {
    reporter: &'a mut Reporter,
    scopes: ScopeStack<SymbolRef>,
    /// Struct and typedef names (global type namespace).
    type_names: HashMap<String, SymbolRef>,
}

/// Resolve all references in the program in place.
pub fn resolve(program: &mut Program, reporter: &mut Reporter) {
    let mut resolver = Resolver {
        reporter,
        scopes: ScopeStack::new(),
        type_names: HashMap::new(),
    };
    resolver.run(program);
}

impl<'a> Resolver<'a> {
    fn run(&mut self, program: &mut Program) {
        self.bind_decl_stmnt_refs(program);
        self.register_type_names(program);
        self.resolve_declared_types(program);
        self.register_globals(program);
        self.check_function_signatures(program);

        // Function bodies; each body is detached during its walk so the
        // arenas stay freely addressable.
        for index in 0..program.functions.len() {
            let body = program.functions[index].body.take();
            let parameters = program.functions[index].parameters.clone();
            if let Some(mut body) = body {
                self.scopes.push_scope();
                for &param in &parameters {
                    self.register_var_decl_stmnt(program, param);
                }
                self.resolve_code_block(program, &mut body);
                self.scopes.pop_scope();
                program.functions[index].body = Some(body);
            }
        }
    }

    /// Every declarator points back at its declaration statement.
    fn bind_decl_stmnt_refs(&mut self, program: &mut Program) {
        for index in 0..program.var_decl_stmnts.len() {
            let id = VarDeclStmntId(index as u32);
            for var in program.var_decl_stmnts[index].var_decls.clone() {
                program.var_mut(var).decl_stmnt = Some(id);
            }
        }
    }

    fn register_type_names(&mut self, program: &mut Program) {
        // Source order matters: a base struct or aliased type must be
        // declared before use.
        for global_index in 0..program.globals.len() {
            match &program.globals[global_index].kind {
                &GlobalDeclKind::Struct(id) => self.register_struct(program, id),
                &GlobalDeclKind::Alias(id) => {
                    let alias = &program.aliases[id.index()];
                    let ident = alias.ident.clone();
                    let span = alias.span;
                    if self.type_names.contains_key(&ident) {
                        self.reporter.error(
                            ReportKind::Redefinition,
                            format!("redefinition of type '{}'", ident),
                            span,
                        );
                    } else {
                        self.type_names.insert(ident, SymbolRef::Alias(id));
                    }
                }
                &GlobalDeclKind::Var(stmnt) => {
                    // Inline struct definitions in global declarations.
                    let specifier = &program.var_decl_stmnt(stmnt).var_type.specifier;
                    if let TypeSpecifier::Struct(struct_id) = specifier {
                        let struct_id = *struct_id;
                        self.register_struct(program, struct_id);
                    }
                }
                _ => {}
            }
        }
    }

    fn register_struct(&mut self, program: &mut Program, id: StructId) {
        let (ident, span, base_name) = {
            let decl = program.struct_(id);
            (decl.ident.clone(), decl.span, decl.base_name.clone())
        };

        if let Some(base_name) = base_name {
            match self.type_names.get(&base_name) {
                Some(SymbolRef::Struct(base_id)) => {
                    program.struct_mut(id).base_struct = Some(*base_id);
                }
                _ => {
                    self.reporter.error(
                        ReportKind::UnresolvedSymbol,
                        format!("undeclared base struct '{}'", base_name),
                        span,
                    );
                }
            }
        }

        if ident.is_empty() {
            return;
        }
        if self.type_names.contains_key(&ident) {
            self.reporter.error(
                ReportKind::Redefinition,
                format!("redefinition of 'struct {}'", ident),
                span,
            );
        } else {
            self.type_names.insert(ident, SymbolRef::Struct(id));
        }
    }

    /// Bind the `Ident` type specifiers of all declarations.
    fn resolve_declared_types(&mut self, program: &mut Program) {
        for index in 0..program.var_decl_stmnts.len() {
            let var_type = &mut program.var_decl_stmnts[index].var_type;
            Self::resolve_type_specifier(&self.type_names, self.reporter, var_type);
        }
        for index in 0..program.functions.len() {
            let var_type = &mut program.functions[index].return_type;
            Self::resolve_type_specifier(&self.type_names, self.reporter, var_type);
        }
        for index in 0..program.aliases.len() {
            let var_type = &mut program.aliases[index].var_type;
            Self::resolve_type_specifier(&self.type_names, self.reporter, var_type);
        }
        for index in 0..program.buffers.len() {
            if let Some(var_type) = &mut program.buffers[index].generic_type {
                Self::resolve_type_specifier(&self.type_names, self.reporter, var_type);
            }
        }
    }

    fn resolve_type_specifier(
        type_names: &HashMap<String, SymbolRef>,
        reporter: &mut Reporter,
        var_type: &mut VarType,
    ) {
        if let TypeSpecifier::Ident { name, symbol } = &mut var_type.specifier {
            if symbol.is_none() {
                match type_names.get(name) {
                    Some(resolved) => *symbol = Some(*resolved),
                    None => reporter.error(
                        ReportKind::UnresolvedSymbol,
                        format!("undeclared type '{}'", name),
                        var_type.span,
                    ),
                }
            }
        }
    }

    fn register_globals(&mut self, program: &mut Program) {
        for global_index in 0..program.globals.len() {
            match program.globals[global_index].kind.clone() {
                GlobalDeclKind::Var(stmnt) => {
                    self.register_var_decl_stmnt(program, stmnt);
                    // Global initializers may reference earlier globals.
                    self.resolve_var_decl_initializers(program, stmnt);
                }
                GlobalDeclKind::UniformBuffer(id) => {
                    // Constant buffer members live in the global scope.
                    for stmnt in program.uniform_buffer(id).members.clone() {
                        self.register_var_decl_stmnt(program, stmnt);
                    }
                }
                GlobalDeclKind::Buffers(ids) => {
                    for id in ids {
                        let (ident, span) = {
                            let decl = program.buffer(id);
                            (decl.ident.clone(), decl.span)
                        };
                        self.register_symbol(&ident, SymbolRef::Buffer(id), span);
                    }
                }
                GlobalDeclKind::Samplers(ids) => {
                    for id in ids {
                        let (ident, span) = {
                            let decl = program.sampler(id);
                            (decl.ident.clone(), decl.span)
                        };
                        self.register_symbol(&ident, SymbolRef::Sampler(id), span);
                    }
                }
                GlobalDeclKind::Struct(_)
                | GlobalDeclKind::Alias(_)
                | GlobalDeclKind::Function(_) => {}
            }
        }
    }

    fn register_symbol(&mut self, ident: &str, symbol: SymbolRef, span: crate::report::Span) {
        if self.scopes.is_defined_in_current_scope(ident) {
            self.reporter.error(
                ReportKind::Redefinition,
                format!("redefinition of '{}'", ident),
                span,
            );
        } else {
            self.scopes.insert(ident.to_string(), symbol);
        }
    }

    fn register_var_decl_stmnt(&mut self, program: &Program, id: VarDeclStmntId) {
        for &var in &program.var_decl_stmnt(id).var_decls {
            let decl = program.var(var);
            self.register_symbol(&decl.ident.clone(), SymbolRef::Var(var), decl.span);
        }
    }

    fn resolve_var_decl_initializers(&mut self, program: &mut Program, id: VarDeclStmntId) {
        for var in program.var_decl_stmnt(id).var_decls.clone() {
            let mut initializer = program.var_mut(var).initializer.take();
            if let Some(expr) = &mut initializer {
                self.resolve_expr(program, expr);
            }
            program.var_mut(var).initializer = initializer;
        }
    }

    /// Multiple declarations of one function must agree: forward
    /// declarations share the definition's signature, and at most one
    /// declaration carries a body.
    fn check_function_signatures(&mut self, program: &Program) {
        for (index, function) in program.functions.iter().enumerate() {
            for other in &program.functions[..index] {
                if other.ident != function.ident {
                    continue;
                }
                if function.equals_signature(program, other)
                    && !function.is_forward_decl()
                    && !other.is_forward_decl()
                {
                    self.reporter.error(
                        ReportKind::Redefinition,
                        format!(
                            "redefinition of function '{}'",
                            function.signature_to_string(program, false)
                        ),
                        function.span,
                    );
                }
            }
        }
    }

    /* --- Statements --- */

    fn resolve_code_block(&mut self, program: &mut Program, block: &mut CodeBlock) {
        self.scopes.push_scope();
        for stmnt in &mut block.stmnts {
            self.resolve_stmnt(program, stmnt);
        }
        self.scopes.pop_scope();
    }

    fn resolve_stmnt(&mut self, program: &mut Program, stmnt: &mut Stmnt) {
        match &mut stmnt.kind {
            StmntKind::Null | StmntKind::CtrlTransfer(_) => {}
            StmntKind::VarDecl(id) => {
                let id = *id;
                // Resolve initializers before the names become visible,
                // then register the declarators.
                self.resolve_var_decl_initializers(program, id);
                self.register_var_decl_stmnt(program, id);
            }
            StmntKind::CodeBlock(block) => self.resolve_code_block(program, block),
            StmntKind::For {
                init,
                condition,
                iteration,
                body,
            } => {
                self.scopes.push_scope();
                self.resolve_stmnt(program, init);
                if let Some(condition) = condition {
                    self.resolve_expr(program, condition);
                }
                if let Some(iteration) = iteration {
                    self.resolve_expr(program, iteration);
                }
                self.resolve_stmnt(program, body);
                self.scopes.pop_scope();
            }
            StmntKind::While { condition, body } => {
                self.resolve_expr(program, condition);
                self.resolve_stmnt(program, body);
            }
            StmntKind::DoWhile { body, condition } => {
                self.resolve_stmnt(program, body);
                self.resolve_expr(program, condition);
            }
            StmntKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(program, condition);
                self.resolve_stmnt(program, then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmnt(program, else_branch);
                }
            }
            StmntKind::Switch { selector, cases } => {
                self.resolve_expr(program, selector);
                for case in cases {
                    if let Some(expr) = &mut case.expr {
                        self.resolve_expr(program, expr);
                    }
                    self.scopes.push_scope();
                    for stmnt in &mut case.stmnts {
                        self.resolve_stmnt(program, stmnt);
                    }
                    self.scopes.pop_scope();
                }
            }
            StmntKind::Expr(expr) => self.resolve_expr(program, expr),
            StmntKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.resolve_expr(program, expr);
                }
            }
        }
    }

    /* --- Expressions --- */

    fn resolve_expr(&mut self, program: &mut Program, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Null | ExprKind::Literal { .. } => {}
            ExprKind::TypeName(var_type) => {
                Self::resolve_type_specifier(&self.type_names, self.reporter, var_type);
            }
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(program, condition);
                self.resolve_expr(program, then_expr);
                self.resolve_expr(program, else_expr);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.resolve_expr(program, lhs);
                self.resolve_expr(program, rhs);
            }
            ExprKind::Unary { expr, .. } | ExprKind::PostUnary { expr, .. } => {
                self.resolve_expr(program, expr);
            }
            ExprKind::Call(_) => self.resolve_call(program, expr),
            ExprKind::Bracket(inner) => self.resolve_expr(program, inner),
            ExprKind::Suffix { expr, var_ident } => {
                self.resolve_expr(program, expr);
                self.resolve_array_indices(program, var_ident);
            }
            ExprKind::ArrayAccess { expr, indices } => {
                self.resolve_expr(program, expr);
                for index in indices {
                    self.resolve_expr(program, index);
                }
            }
            ExprKind::Cast { target, expr } => {
                Self::resolve_type_specifier(&self.type_names, self.reporter, target);
                self.resolve_expr(program, expr);
            }
            ExprKind::Var { ident, assign } => {
                self.resolve_var_ident(program, ident);
                if let Some((_, value)) = assign {
                    self.resolve_expr(program, value);
                }
            }
            ExprKind::List { first, next } => {
                self.resolve_expr(program, first);
                self.resolve_expr(program, next);
            }
            ExprKind::Initializer(exprs) => {
                for expr in exprs {
                    self.resolve_expr(program, expr);
                }
            }
        }
    }

    fn resolve_call(&mut self, program: &mut Program, expr: &mut Expr) {
        let span = expr.span;
        let ExprKind::Call(call) = &mut expr.kind else {
            return;
        };

        let mut arguments = std::mem::take(&mut call.arguments);
        let mut ident = call.ident.take();

        let mut intrinsic = None;
        match &mut ident {
            None => {
                // Type constructor; nothing to bind.
            }
            Some(var_ident) if var_ident.next.is_none() => {
                let name = var_ident.ident.clone();
                if program.functions_by_name(&name).is_empty() {
                    match Intrinsic::parse(&name) {
                        Some(found) => intrinsic = Some(found),
                        None => {
                            self.reporter.error(
                                ReportKind::UnresolvedFunction,
                                format!("undeclared function '{}'", name),
                                span,
                            );
                        }
                    }
                }
            }
            Some(var_ident) => {
                // Method call: the chain head is an object, the final
                // segment the method name.
                self.resolve_var_ident_head(program, var_ident);
                self.resolve_array_indices(program, var_ident);
                let method = var_ident.last().ident.clone();
                match Intrinsic::parse_method(&method) {
                    Some(found) => intrinsic = Some(found),
                    None => {
                        self.reporter.error(
                            ReportKind::UnresolvedFunction,
                            format!("unknown object method '{}'", method),
                            span,
                        );
                    }
                }
            }
        }

        for argument in &mut arguments {
            self.resolve_expr(program, argument);
        }

        let ExprKind::Call(call) = &mut expr.kind else {
            return;
        };
        call.arguments = arguments;
        call.ident = ident;
        if call.intrinsic.is_none() {
            call.intrinsic = intrinsic;
        }
    }

    fn resolve_var_ident(&mut self, program: &mut Program, ident: &mut VarIdent) {
        self.resolve_var_ident_head(program, ident);
        self.resolve_array_indices(program, ident);
    }

    fn resolve_var_ident_head(&mut self, _program: &mut Program, ident: &mut VarIdent) {
        if ident.symbol.is_some() {
            // Re-resolving an already-resolved chain is a no-op.
            return;
        }
        match self.scopes.lookup(&ident.ident) {
            Some(symbol) => ident.symbol = Some(*symbol),
            None => {
                // Struct and typedef names may appear in expression
                // position (e.g. static member style access is an error
                // caught later by type derivation).
                match self.type_names.get(&ident.ident) {
                    Some(symbol) => ident.symbol = Some(*symbol),
                    None => self.reporter.error(
                        ReportKind::UnresolvedSymbol,
                        format!("undeclared identifier '{}'", ident.ident),
                        ident.span,
                    ),
                }
            }
        }
    }

    /// Array index expressions appear on every segment of a chain.
    fn resolve_array_indices(&mut self, program: &mut Program, ident: &mut VarIdent) {
        let mut current = Some(ident);
        while let Some(segment) = current {
            for index in &mut segment.array_indices {
                self.resolve_expr(program, index);
            }
            current = segment.next.as_deref_mut();
        }
    }
}
