//! Type analyzer.
//!
//! Derives a memoized type denoter for every typed node, validates
//! castability at every implicit and explicit conversion site, performs
//! overload resolution and intrinsic typing for calls, and validates the
//! entry point's I/O structure against the shader stage. Errors are
//! collected per statement so one run surfaces as many diagnostics as
//! possible.

use crate::ast::*;
use crate::intrinsics::Intrinsic;
use crate::report::{ReportKind, Reporter, Span};
use crate::target::ShaderTarget;
use crate::ty::{DataType, TypeDenoter};

/// Result of the analysis pass: the populated type memo and the resolved
/// entry point.
#[derive(Debug, Default)]
pub struct Analysis {
    pub table: TypeTable,
    pub entry: Option<FunctionId>,
}

/// Marker for an already-reported analysis error.
struct TypeFailure;

type TResult<T> = Result<T, TypeFailure>;

pub fn analyze(
    program: &mut Program,
    entry_point: &str,
    target: ShaderTarget,
    reporter: &mut Reporter,
) -> Analysis {
    let mut analyzer = Analyzer {
        reporter,
        table: TypeTable::new(),
        current_return: None,
    };

    analyzer.check_global_initializers(program);
    for index in 0..program.functions.len() {
        analyzer.check_function(program, FunctionId(index as u32));
    }

    let entry = analyzer.find_entry_point(program, entry_point);
    if let Some(entry) = entry {
        analyzer.check_entry_point(program, entry, target);
    }

    Analysis {
        table: analyzer.table,
        entry,
    }
}

pub struct Analyzer<'a> {
    reporter: &'a mut Reporter,
    table: TypeTable,
    current_return: Option<(TypeDenoter, bool)>,
}

impl<'a> Analyzer<'a> {
    fn error(&mut self, kind: ReportKind, message: impl Into<String>, span: Span) -> TypeFailure {
        self.reporter.error(kind, message, span);
        TypeFailure
    }

    /* --- Declarations --- */

    fn check_global_initializers(&mut self, program: &mut Program) {
        for global_index in 0..program.globals.len() {
            let stmnt = match &program.globals[global_index].kind {
                GlobalDeclKind::Var(stmnt) => *stmnt,
                _ => continue,
            };
            let _ = self.check_var_decl_stmnt(program, stmnt);
        }
    }

    fn check_function(&mut self, program: &mut Program, id: FunctionId) {
        let return_denoter = program
            .function(id)
            .return_type
            .type_denoter(program)
            .unwrap_or(TypeDenoter::void());
        let is_void = return_denoter.is_void();
        self.current_return = Some((return_denoter, is_void));

        // Parameter defaults.
        for param in program.function(id).parameters.clone() {
            let _ = self.check_var_decl_stmnt(program, param);
        }

        if let Some(mut body) = program.functions[id.index()].body.take() {
            self.check_code_block(program, &mut body);
            program.functions[id.index()].body = Some(body);
        }
        self.current_return = None;
    }

    /// Derive declarator types, then validate and adapt initializers.
    fn check_var_decl_stmnt(&mut self, program: &mut Program, id: VarDeclStmntId) -> TResult<()> {
        for var in program.var_decl_stmnt(id).var_decls.clone() {
            let decl_type = self.type_of_var_decl(program, var)?;

            let mut initializer = program.var_mut(var).initializer.take();
            if let Some(expr) = &mut initializer {
                if let Ok(init_type) = self.type_of_expr(program, expr) {
                    self.check_implicit_cast(program, &init_type, &decl_type, expr.span);

                    // Literal initializers adopt the declared base type.
                    if let Some(decl_base) = decl_type.base_type() {
                        if matches!(expr.kind, ExprKind::Literal { .. }) {
                            expr.convert_literal_data_type(
                                DataType::scalar(decl_base.scalar),
                                &mut self.table,
                            );
                        }
                    }
                }
            }
            program.var_mut(var).initializer = initializer;
        }
        Ok(())
    }

    /* --- Statements --- */

    fn check_code_block(&mut self, program: &mut Program, block: &mut CodeBlock) {
        for stmnt in &mut block.stmnts {
            let _ = self.check_stmnt(program, stmnt);
        }
    }

    fn check_stmnt(&mut self, program: &mut Program, stmnt: &mut Stmnt) -> TResult<()> {
        match &mut stmnt.kind {
            StmntKind::Null | StmntKind::CtrlTransfer(_) => Ok(()),
            StmntKind::VarDecl(id) => {
                let id = *id;
                self.check_var_decl_stmnt(program, id)
            }
            StmntKind::CodeBlock(block) => {
                self.check_code_block(program, block);
                Ok(())
            }
            StmntKind::For {
                init,
                condition,
                iteration,
                body,
            } => {
                let _ = self.check_stmnt(program, init);
                if let Some(condition) = condition {
                    let _ = self.check_condition(program, condition);
                }
                if let Some(iteration) = iteration {
                    let _ = self.type_of_expr(program, iteration);
                }
                self.check_stmnt(program, body)
            }
            StmntKind::While { condition, body } => {
                let _ = self.check_condition(program, condition);
                self.check_stmnt(program, body)
            }
            StmntKind::DoWhile { body, condition } => {
                let result = self.check_stmnt(program, body);
                let _ = self.check_condition(program, condition);
                result
            }
            StmntKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let _ = self.check_condition(program, condition);
                let _ = self.check_stmnt(program, then_branch);
                if let Some(else_branch) = else_branch {
                    let _ = self.check_stmnt(program, else_branch);
                }
                Ok(())
            }
            StmntKind::Switch { selector, cases } => {
                if let Ok(selector_type) = self.type_of_expr(program, selector) {
                    let int_type = TypeDenoter::Base(DataType::scalar(crate::ty::ScalarType::Int));
                    if !selector_type.is_castable_to(&int_type, program) {
                        let span = selector.span;
                        let found = selector_type.to_string(program);
                        self.error(
                            ReportKind::TypeMismatch,
                            format!("switch selector must be integral, found '{}'", found),
                            span,
                        );
                    }
                }
                for case in cases {
                    if let Some(expr) = &mut case.expr {
                        let _ = self.type_of_expr(program, expr);
                    }
                    for stmnt in &mut case.stmnts {
                        let _ = self.check_stmnt(program, stmnt);
                    }
                }
                Ok(())
            }
            StmntKind::Expr(expr) => {
                let _ = self.type_of_expr(program, expr)?;
                Ok(())
            }
            StmntKind::Return(expr) => {
                let span = stmnt.span;
                let (return_type, is_void) = match &self.current_return {
                    Some((denoter, is_void)) => (denoter.clone(), *is_void),
                    None => return Ok(()),
                };
                match expr {
                    Some(expr) => {
                        if is_void {
                            self.error(
                                ReportKind::TypeMismatch,
                                "return with a value in a void function",
                                span,
                            );
                            return Err(TypeFailure);
                        }
                        let expr_type = self.type_of_expr(program, expr)?;
                        self.check_implicit_cast(program, &expr_type, &return_type, expr.span);
                    }
                    None => {
                        if !is_void {
                            self.error(
                                ReportKind::TypeMismatch,
                                "return without a value in a non-void function",
                                span,
                            );
                            return Err(TypeFailure);
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, program: &mut Program, condition: &mut Expr) -> TResult<()> {
        let condition_type = self.type_of_expr(program, condition)?;
        if !condition_type.is_castable_to(&TypeDenoter::bool_(), program) {
            let span = condition.span;
            let found = condition_type.to_string(program);
            self.error(
                ReportKind::TypeMismatch,
                format!("can not cast '{}' to 'bool' in condition", found),
                span,
            );
            return Err(TypeFailure);
        }
        Ok(())
    }

    /// Report non-castable implicit conversions and warn on component
    /// truncation (legal in HLSL).
    fn check_implicit_cast(
        &mut self,
        program: &Program,
        from: &TypeDenoter,
        to: &TypeDenoter,
        span: Span,
    ) {
        if !from.is_castable_to(to, program) {
            let message = format!(
                "can not cast '{}' to '{}'",
                from.to_string(program),
                to.to_string(program)
            );
            self.reporter.error(ReportKind::TypeMismatch, message, span);
        } else if from.truncates_to(to, program) {
            let message = format!(
                "implicit truncation of '{}' to '{}'",
                from.to_string(program),
                to.to_string(program)
            );
            self.reporter.warning(ReportKind::TypeMismatch, message, span);
        }
    }

    /* --- Type derivation --- */

    /// Memoized denoter of a variable declaration.
    pub fn type_of_var_decl(&mut self, program: &Program, var: VarId) -> TResult<TypeDenoter> {
        let node = program.var(var).id;
        if let Some(denoter) = self.table.get(node) {
            return Ok(denoter.clone());
        }
        match program.var_type_denoter(var) {
            Ok(denoter) => {
                self.table.insert(node, denoter.clone());
                Ok(denoter)
            }
            Err(message) => {
                let span = program.var(var).span;
                Err(self.error(ReportKind::InternalError, message, span))
            }
        }
    }

    /// Memoized denoter of an expression; derivation may bind function
    /// calls as a side effect.
    pub fn type_of_expr(&mut self, program: &mut Program, expr: &mut Expr) -> TResult<TypeDenoter> {
        if let Some(denoter) = self.table.get(expr.id) {
            return Ok(denoter.clone());
        }
        let denoter = self.derive_expr(program, expr)?;
        self.table.insert(expr.id, denoter.clone());
        Ok(denoter)
    }

    fn derive_expr(&mut self, program: &mut Program, expr: &mut Expr) -> TResult<TypeDenoter> {
        let span = expr.span;
        match &mut expr.kind {
            // Null expressions only occur as unsized array dimensions,
            // which must be integral.
            ExprKind::Null => Ok(TypeDenoter::Base(DataType::scalar(
                crate::ty::ScalarType::Int,
            ))),

            ExprKind::Literal { data_type, .. } => Ok(TypeDenoter::Base(*data_type)),

            ExprKind::TypeName(var_type) => match var_type.type_denoter(program) {
                Ok(denoter) => Ok(denoter),
                Err(message) => Err(self.error(ReportKind::UnresolvedSymbol, message, span)),
            },

            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition_type = self.type_of_expr(program, condition)?;
                if !condition_type.is_castable_to(&TypeDenoter::bool_(), program) {
                    let found = condition_type.to_string(program);
                    let condition_span = condition.span;
                    return Err(self.error(
                        ReportKind::TypeMismatch,
                        format!(
                            "can not cast '{}' to 'bool' in condition of ternary expression",
                            found
                        ),
                        condition_span,
                    ));
                }
                let then_type = self.type_of_expr(program, then_expr)?;
                let else_type = self.type_of_expr(program, else_expr)?;
                if !else_type.is_castable_to(&then_type, program) {
                    let message = format!(
                        "can not cast '{}' to '{}' in ternary expression",
                        else_type.to_string(program),
                        then_type.to_string(program)
                    );
                    return Err(self.error(ReportKind::TypeMismatch, message, span));
                }
                Ok(then_type)
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let lhs_type = self.type_of_expr(program, lhs)?;
                let rhs_type = self.type_of_expr(program, rhs)?;
                if !rhs_type.is_castable_to(&lhs_type, program)
                    || !lhs_type.is_castable_to(&rhs_type, program)
                {
                    let message = format!(
                        "can not cast '{}' to '{}' in binary expression '{}'",
                        rhs_type.to_string(program),
                        lhs_type.to_string(program),
                        op
                    );
                    return Err(self.error(ReportKind::TypeMismatch, message, span));
                }
                if op.is_boolean_op() {
                    Ok(TypeDenoter::bool_())
                } else {
                    Ok(lhs_type)
                }
            }

            ExprKind::Unary { op, expr } => {
                let op = *op;
                let operand_type = self.type_of_expr(program, expr)?;
                if op.is_logical_op() {
                    Ok(TypeDenoter::bool_())
                } else {
                    Ok(operand_type)
                }
            }

            ExprKind::PostUnary { expr, .. } => self.type_of_expr(program, expr),

            ExprKind::Call(_) => self.derive_call(program, expr),

            ExprKind::Bracket(inner) => self.type_of_expr(program, inner),

            ExprKind::Suffix {
                expr: inner,
                var_ident,
            } => {
                let var_ident = var_ident.clone();
                let inner_type = self.type_of_expr(program, inner)?;
                match inner_type.get_member(&var_ident, program) {
                    Ok(denoter) => Ok(denoter),
                    Err(message) => Err(self.error(ReportKind::TypeMismatch, message, span)),
                }
            }

            ExprKind::ArrayAccess { expr: inner, indices } => {
                let count = indices.len();
                for index in indices.iter_mut() {
                    let _ = self.type_of_expr(program, index);
                }
                let inner_type = self.type_of_expr(program, inner)?;
                match inner_type.get_from_array(count, None, program) {
                    Ok(denoter) => Ok(denoter),
                    Err(message) => Err(self.error(ReportKind::TypeMismatch, message, span)),
                }
            }

            ExprKind::Cast { target, expr: inner } => {
                let target_type = match target.type_denoter(program) {
                    Ok(denoter) => denoter,
                    Err(message) => {
                        return Err(self.error(ReportKind::UnresolvedSymbol, message, span))
                    }
                };
                let value_type = self.type_of_expr(program, inner)?;
                if !explicit_castable(&value_type, &target_type, program) {
                    let message = format!(
                        "can not cast '{}' to '{}' in cast expression",
                        value_type.to_string(program),
                        target_type.to_string(program)
                    );
                    return Err(self.error(ReportKind::TypeMismatch, message, span));
                }
                Ok(target_type)
            }

            ExprKind::Var { ident, assign } => {
                let ident = ident.clone();
                let var_type = self.type_of_var_ident(program, &ident)?;
                if let Some((_, value)) = assign {
                    let value_span = value.span;
                    let value_type = self.type_of_expr(program, value)?;
                    self.check_implicit_cast(program, &value_type, &var_type, value_span);
                }
                Ok(var_type)
            }

            // Comma operator: the type of the first sub-expression.
            ExprKind::List { first, next } => {
                let first_type = self.type_of_expr(program, first)?;
                let _ = self.type_of_expr(program, next);
                Ok(first_type)
            }

            ExprKind::Initializer(exprs) => {
                if exprs.is_empty() {
                    return Err(self.error(
                        ReportKind::TypeMismatch,
                        "can not derive type of initializer list with no elements",
                        span,
                    ));
                }
                let mut element_type = None;
                for expr in exprs.iter_mut() {
                    let derived = self.type_of_expr(program, expr)?;
                    if element_type.is_none() {
                        element_type = Some(derived);
                    }
                }
                Ok(element_type.unwrap().as_array(&[None]))
            }
        }
    }

    /// Denoter of a resolved identifier chain.
    pub fn type_of_var_ident(
        &mut self,
        program: &Program,
        ident: &VarIdent,
    ) -> TResult<TypeDenoter> {
        let span = ident.span;
        let Some(symbol) = ident.symbol else {
            return Err(self.error(
                ReportKind::InternalError,
                format!(
                    "missing symbol reference to derive type of variable identifier '{}'",
                    ident
                ),
                span,
            ));
        };

        let next = ident.next.as_deref();
        let num_indices = ident.array_indices.len();
        let result = match symbol {
            SymbolRef::Var(id) => {
                let base = self.type_of_var_decl(program, id)?;
                base.get_from_array(num_indices, next, program)
            }
            SymbolRef::Buffer(id) => {
                program
                    .buffer_type_denoter(id)
                    .get_from_array(num_indices, next, program)
            }
            SymbolRef::Sampler(id) => {
                program
                    .sampler_type_denoter(id)
                    .get_from_array(num_indices, next, program)
            }
            SymbolRef::Struct(id) => {
                let signature = program.struct_(id).signature_to_string();
                if next.is_some() {
                    Err(format!("can not directly access members of '{}'", signature))
                } else if num_indices > 0 {
                    Err(format!("can not directly access array of '{}'", signature))
                } else {
                    TypeDenoter::Struct(id).get(program)
                }
            }
            SymbolRef::Alias(id) => {
                let name = program.alias(id).ident.clone();
                if next.is_some() {
                    Err(format!("can not directly access members of '{}'", name))
                } else if num_indices > 0 {
                    Err(format!("can not directly access array of '{}'", name))
                } else {
                    TypeDenoter::Alias(id).get(program)
                }
            }
        };
        result.map_err(|message| self.error(ReportKind::TypeMismatch, message, span))
    }

    /* --- Calls --- */

    fn derive_call(&mut self, program: &mut Program, expr: &mut Expr) -> TResult<TypeDenoter> {
        let span = expr.span;
        let ExprKind::Call(call) = &mut expr.kind else {
            return Err(TypeFailure);
        };

        // Derive argument types first; they drive overload resolution
        // and intrinsic typing.
        let mut arguments = std::mem::take(&mut call.arguments);
        let ident = call.ident.clone();
        let type_ctor = call.type_ctor;
        let intrinsic = call.intrinsic;

        let mut argument_types = Vec::with_capacity(arguments.len());
        let mut failed = false;
        for argument in &mut arguments {
            match self.type_of_expr(program, argument) {
                Ok(denoter) => argument_types.push(denoter),
                Err(TypeFailure) => failed = true,
            }
        }

        let restore = |call: &mut FunctionCall, arguments: Vec<Expr>| {
            call.arguments = arguments;
        };

        if failed {
            let ExprKind::Call(call) = &mut expr.kind else {
                return Err(TypeFailure);
            };
            restore(call, arguments);
            return Err(TypeFailure);
        }

        let result = if let Some(data_type) = type_ctor {
            self.check_type_ctor(program, data_type, &argument_types, span)
        } else if let Some(intrinsic) = intrinsic {
            self.check_intrinsic_call(program, intrinsic, ident.as_ref(), &argument_types, span)
        } else if let Some(ident) = &ident {
            self.bind_overload(program, ident, &argument_types, span)
        } else {
            Err(self.error(
                ReportKind::InternalError,
                "missing function reference to derive expression type",
                span,
            ))
        };

        let ExprKind::Call(call) = &mut expr.kind else {
            return Err(TypeFailure);
        };
        restore(call, arguments);
        match result {
            Ok((denoter, bound)) => {
                if bound.is_some() {
                    call.func_decl = bound;
                }
                Ok(denoter)
            }
            Err(failure) => Err(failure),
        }
    }

    fn check_type_ctor(
        &mut self,
        program: &Program,
        data_type: DataType,
        argument_types: &[TypeDenoter],
        span: Span,
    ) -> TResult<(TypeDenoter, Option<FunctionId>)> {
        let target = TypeDenoter::Base(data_type);
        if argument_types.is_empty() {
            return Err(self.error(
                ReportKind::TypeMismatch,
                format!("type constructor '{}' requires arguments", data_type),
                span,
            ));
        }

        // Single-argument constructors behave like casts; otherwise the
        // component counts must add up.
        if argument_types.len() == 1 {
            if !explicit_castable(&argument_types[0], &target, program) {
                let message = format!(
                    "can not cast '{}' to '{}' in type constructor",
                    argument_types[0].to_string(program),
                    data_type
                );
                return Err(self.error(ReportKind::TypeMismatch, message, span));
            }
        } else {
            let mut components = 0u32;
            for argument in argument_types {
                match argument.get(program).ok().and_then(|d| d.base_type()) {
                    Some(base) => components += base.num_components(),
                    None => {
                        let message = format!(
                            "invalid argument type '{}' in type constructor '{}'",
                            argument.to_string(program),
                            data_type
                        );
                        return Err(self.error(ReportKind::TypeMismatch, message, span));
                    }
                }
            }
            if components != data_type.num_components() {
                let message = format!(
                    "type constructor '{}' requires {} components, found {}",
                    data_type,
                    data_type.num_components(),
                    components
                );
                return Err(self.error(ReportKind::TypeMismatch, message, span));
            }
        }
        Ok((target, None))
    }

    fn check_intrinsic_call(
        &mut self,
        program: &Program,
        intrinsic: Intrinsic,
        ident: Option<&VarIdent>,
        argument_types: &[TypeDenoter],
        span: Span,
    ) -> TResult<(TypeDenoter, Option<FunctionId>)> {
        let (min_args, max_args) = intrinsic.arity();
        if argument_types.len() < min_args || argument_types.len() > max_args {
            let message = if min_args == max_args {
                format!(
                    "intrinsic '{}' requires {} argument(s), found {}",
                    intrinsic.glsl_name(),
                    min_args,
                    argument_types.len()
                )
            } else {
                format!(
                    "intrinsic '{}' requires {} to {} arguments, found {}",
                    intrinsic.glsl_name(),
                    min_args,
                    max_args,
                    argument_types.len()
                )
            };
            return Err(self.error(ReportKind::InvalidIntrinsicArity, message, span));
        }

        let object_type = if intrinsic.is_method() {
            let Some(ident) = ident else {
                return Err(self.error(
                    ReportKind::InternalError,
                    "method intrinsic without an object",
                    span,
                ));
            };
            let object_chain = chain_without_last(ident);
            Some(self.type_of_var_ident(program, &object_chain)?)
        } else {
            None
        };

        match intrinsic.return_type(object_type.as_ref(), argument_types, program) {
            Ok(denoter) => Ok((denoter, None)),
            Err(message) => Err(self.error(ReportKind::TypeMismatch, message, span)),
        }
    }

    /// Overload resolution: arity filter, implicit-match filter, prefer
    /// the exact match, then the fewest implicit conversions.
    fn bind_overload(
        &mut self,
        program: &Program,
        ident: &VarIdent,
        argument_types: &[TypeDenoter],
        span: Span,
    ) -> TResult<(TypeDenoter, Option<FunctionId>)> {
        let name = &ident.ident;
        let candidates = program.functions_by_name(name);
        if candidates.is_empty() {
            return Err(self.error(
                ReportKind::UnresolvedFunction,
                format!("undeclared function '{}'", name),
                span,
            ));
        }

        let argument_count = argument_types.len();
        let mut viable: Vec<(FunctionId, usize)> = Vec::new();

        for id in &candidates {
            let function = program.function(*id);
            if argument_count < function.num_min_args(program)
                || argument_count > function.num_max_args()
            {
                continue;
            }
            let mut conversions = 0usize;
            let mut matches = true;
            for (index, argument_type) in argument_types.iter().enumerate() {
                if !function.match_parameter(program, index, argument_type, true) {
                    matches = false;
                    break;
                }
                if !function.match_parameter(program, index, argument_type, false) {
                    conversions += 1;
                }
            }
            if matches {
                viable.push((*id, conversions));
            }
        }

        if viable.is_empty() {
            let arguments: Vec<String> = argument_types
                .iter()
                .map(|t| t.to_string(program))
                .collect();
            return Err(self.error(
                ReportKind::UnresolvedFunction,
                format!(
                    "no matching overload for '{}({})'",
                    name,
                    arguments.join(", ")
                ),
                span,
            ));
        }

        let best = viable.iter().map(|(_, conversions)| *conversions).min().unwrap();
        let best_candidates: Vec<FunctionId> = viable
            .iter()
            .filter(|(_, conversions)| *conversions == best)
            .map(|(id, _)| *id)
            .collect();

        if best_candidates.len() > 1 {
            return Err(self.error(
                ReportKind::AmbiguousOverload,
                format!("ambiguous call to overloaded function '{}'", name),
                span,
            ));
        }

        let bound = best_candidates[0];
        let return_type = match program.function(bound).return_type.type_denoter(program) {
            Ok(denoter) => denoter,
            Err(message) => return Err(self.error(ReportKind::InternalError, message, span)),
        };
        Ok((return_type, Some(bound)))
    }

    /* --- Entry point --- */

    fn find_entry_point(&mut self, program: &Program, entry_point: &str) -> Option<FunctionId> {
        let found = program
            .functions
            .iter()
            .position(|f| f.ident == entry_point && !f.is_forward_decl());
        match found {
            Some(index) => Some(FunctionId(index as u32)),
            None => {
                self.reporter.error(
                    ReportKind::UnresolvedSymbol,
                    format!("entry point '{}' not found", entry_point),
                    Span::default(),
                );
                None
            }
        }
    }

    /// Structural validation of the entry point's inputs and outputs:
    /// every non-uniform parameter needs a stage-compatible semantic
    /// (directly or through its struct members), and the return value
    /// needs output semantics. System-value members are flagged for the
    /// emitter.
    fn check_entry_point(&mut self, program: &mut Program, entry: FunctionId, target: ShaderTarget) {
        for param in program.function(entry).parameters.clone() {
            let stmnt = program.var_decl_stmnt(param);
            let is_input = stmnt.is_input();
            let var_type = stmnt.var_type.clone();

            for var in program.var_decl_stmnt(param).var_decls.clone() {
                let denoter = var_type
                    .type_denoter(program)
                    .and_then(|d| d.get(program))
                    .unwrap_or(TypeDenoter::void());
                match denoter {
                    TypeDenoter::Struct(struct_id) => {
                        let mut members = Vec::new();
                        program
                            .struct_(struct_id)
                            .collect_member_vars(program, &mut members);
                        for member in members {
                            self.check_entry_semantic(program, member, target, is_input);
                        }
                    }
                    TypeDenoter::Base(_) => {
                        // Parameters without a semantic become uniforms
                        // and need no stage validation.
                        if program.var(var).semantic.is_some() {
                            self.check_entry_semantic(program, var, target, is_input);
                        }
                    }
                    _ => {}
                }
            }
        }

        // Return value semantics.
        let return_denoter = program
            .function(entry)
            .return_type
            .type_denoter(program)
            .and_then(|d| d.get(program))
            .unwrap_or(TypeDenoter::void());
        match return_denoter {
            TypeDenoter::Struct(struct_id) => {
                let mut members = Vec::new();
                program
                    .struct_(struct_id)
                    .collect_member_vars(program, &mut members);
                for member in members {
                    self.check_entry_semantic(program, member, target, false);
                }
            }
            TypeDenoter::Base(data_type) if !data_type.is_void() => {
                let function = program.function(entry);
                let span = function.span;
                match function.return_semantic.clone() {
                    Some(semantic) => {
                        if !semantic.is_valid_output(target) {
                            self.reporter.error(
                                ReportKind::InvalidSemantic,
                                format!(
                                    "semantic '{}' is not a valid {} shader output",
                                    semantic, target
                                ),
                                span,
                            );
                        }
                    }
                    None => {
                        self.reporter.error(
                            ReportKind::InvalidSemantic,
                            "entry point return value requires a semantic",
                            span,
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn check_entry_semantic(
        &mut self,
        program: &mut Program,
        var: VarId,
        target: ShaderTarget,
        is_input: bool,
    ) {
        let decl = program.var(var);
        let span = decl.span;
        let ident = decl.ident.clone();
        let Some(semantic) = decl.semantic.clone() else {
            self.reporter.error(
                ReportKind::InvalidSemantic,
                format!("entry point value '{}' requires a semantic", ident),
                span,
            );
            return;
        };

        let valid = if is_input {
            semantic.is_valid_input(target)
        } else {
            semantic.is_valid_output(target)
        };
        if !valid {
            self.reporter.error(
                ReportKind::InvalidSemantic,
                format!(
                    "semantic '{}' is not a valid {} shader {}",
                    semantic,
                    target,
                    if is_input { "input" } else { "output" }
                ),
                span,
            );
        }

        if semantic.is_system_value() {
            program.var_mut(var).is_system_value = true;
        }
    }
}

/// Explicit casts additionally allow same-size reinterpretation between
/// primitive types.
fn explicit_castable(from: &TypeDenoter, to: &TypeDenoter, program: &Program) -> bool {
    if from.is_castable_to(to, program) {
        return true;
    }
    let (Ok(src), Ok(dst)) = (from.get(program), to.get(program)) else {
        return false;
    };
    match (src.base_type(), dst.base_type()) {
        (Some(a), Some(b)) => {
            !a.is_void() && !b.is_void() && a.num_components() == b.num_components()
        }
        _ => false,
    }
}

/// Clone of the chain with the final segment removed; used to type the
/// object of a method call.
pub fn chain_without_last(ident: &VarIdent) -> VarIdent {
    let mut chain = ident.clone();
    truncate_last(&mut chain);
    chain
}

fn truncate_last(ident: &mut VarIdent) {
    match &mut ident.next {
        Some(next) if next.next.is_none() => ident.next = None,
        Some(next) => truncate_last(next),
        None => {}
    }
}
