//! Stage-aware GLSL emitter.
//!
//! Walks the resolved, type-annotated AST and writes GLSL source for one
//! `(entry, stage)` pair: version preamble and extensions, globals
//! synthesized from the entry point's inputs and outputs (with
//! semantic-to-builtin remapping), struct declarations, intrinsic helper
//! bodies, helper functions and the `void main()` wrapper.

use crate::ast::*;
use crate::intrinsics::Intrinsic;
use crate::report::{ReportKind, Reporter, Span};
use crate::semantic::{Semantic, SystemValue};
use crate::target::{OutputVersion, ShaderTarget, VersionFeature};
use crate::ty::{DataType, ScalarType, TypeDenoter};
use crate::Options;
use std::collections::{HashMap, HashSet};

use super::writer::Writer;

/// Emit the translated GLSL source, or `None` when errors prevent any
/// meaningful output.
pub fn emit(
    program: &Program,
    table: &TypeTable,
    entry: FunctionId,
    target: ShaderTarget,
    version: OutputVersion,
    options: &Options,
    reporter: &mut Reporter,
) -> Option<String> {
    if !version.is_glsl() {
        reporter.error(
            ReportKind::UnsupportedFeature,
            format!("output language '{}' is not supported", version),
            Span::default(),
        );
        return None;
    }

    let mut emitter = Emitter {
        program,
        table,
        target,
        options,
        reporter,
        writer: Writer::new(&options.indent, options.blanks, options.line_marks),
        entry,
        version: 0,
        use_location_extension: false,
        inputs: Vec::new(),
        outputs: Vec::new(),
        uniform_params: Vec::new(),
        return_output: ReturnOutput::Void,
        omitted_structs: HashSet::new(),
        io_names: HashMap::new(),
        renamed: HashMap::new(),
        clip_types: Vec::new(),
        in_entry: false,
        entry_tail: false,
    };
    emitter.run(version)
}

#[derive(Debug, Clone)]
struct IoVar {
    var: VarId,
    semantic: Semantic,
    data_type: DataType,
    /// Emitted name: a builtin (`gl_VertexID`) or a global identifier.
    name: String,
    builtin: bool,
    location: Option<u32>,
}

#[derive(Debug, Clone)]
enum ReturnOutput {
    Void,
    Value {
        name: String,
        builtin: bool,
        data_type: DataType,
        location: Option<u32>,
    },
    Struct(StructId),
}

pub struct Emitter<'a> {
    program: &'a Program,
    table: &'a TypeTable,
    target: ShaderTarget,
    options: &'a Options,
    reporter: &'a mut Reporter,
    writer: Writer,
    entry: FunctionId,
    version: u32,
    use_location_extension: bool,

    inputs: Vec<IoVar>,
    outputs: Vec<IoVar>,
    /// Entry parameters without semantics become plain uniforms.
    uniform_params: Vec<VarId>,
    return_output: ReturnOutput,
    omitted_structs: HashSet<StructId>,
    io_names: HashMap<VarId, String>,
    renamed: HashMap<VarId, String>,
    clip_types: Vec<DataType>,

    in_entry: bool,
    /// True while writing the final top-level statement of `main`, where
    /// a trailing bare `return;` is elided.
    entry_tail: bool,
}

impl<'a> Emitter<'a> {
    fn run(mut self, requested: OutputVersion) -> Option<String> {
        self.collect_entry_io();
        self.collect_renames();
        self.collect_clip_types();

        let minimum = self.minimum_version();
        if requested.is_auto() {
            self.version = minimum.max(130);
        } else {
            self.version = requested.value();
            self.check_version_features(minimum);
        }
        if self.reporter.has_errors() {
            return None;
        }

        self.write_preamble();
        self.write_stage_layouts();
        self.write_structs();
        self.write_global_declarations();
        self.write_io_globals();
        self.write_clip_helpers();
        self.write_functions();
        self.write_entry_point();

        Some(self.writer.into_string())
    }

    /* --- Entry I/O collection --- */

    fn collect_entry_io(&mut self) {
        let program = self.program;
        let function = program.function(self.entry);

        for &param in &function.parameters {
            let stmnt = program.var_decl_stmnt(param);
            let is_output = stmnt.is_output();
            let denoter = stmnt
                .var_type
                .type_denoter(program)
                .and_then(|d| d.get(program))
                .unwrap_or(TypeDenoter::void());

            for &var in &stmnt.var_decls {
                match &denoter {
                    TypeDenoter::Struct(struct_id) => {
                        let mut members = Vec::new();
                        program
                            .struct_(*struct_id)
                            .collect_member_vars(program, &mut members);
                        for member in members {
                            self.add_io_var(member, !is_output);
                        }
                        if !program
                            .struct_(*struct_id)
                            .has_non_system_value_members(program)
                        {
                            self.omitted_structs.insert(*struct_id);
                        }
                    }
                    TypeDenoter::Base(_) => {
                        if program.var(var).semantic.is_some() {
                            self.add_io_var(var, !is_output);
                        } else {
                            self.uniform_params.push(var);
                        }
                    }
                    _ => {}
                }
            }
        }

        // Return value.
        let return_denoter = function
            .return_type
            .type_denoter(program)
            .and_then(|d| d.get(program))
            .unwrap_or(TypeDenoter::void());
        self.return_output = match return_denoter {
            TypeDenoter::Struct(struct_id) => {
                let mut members = Vec::new();
                program
                    .struct_(struct_id)
                    .collect_member_vars(program, &mut members);
                for member in members {
                    self.add_io_var(member, false);
                }
                if !program
                    .struct_(struct_id)
                    .has_non_system_value_members(program)
                {
                    self.omitted_structs.insert(struct_id);
                }
                ReturnOutput::Struct(struct_id)
            }
            TypeDenoter::Base(data_type) if !data_type.is_void() => {
                let semantic = function
                    .return_semantic
                    .clone()
                    .unwrap_or(Semantic::User("COLOR".to_string(), 0));
                let (name, builtin, location) = self.output_name(&semantic, None);
                ReturnOutput::Value {
                    name,
                    builtin,
                    data_type,
                    location,
                }
            }
            _ => ReturnOutput::Void,
        };
    }

    fn add_io_var(&mut self, var: VarId, is_input: bool) {
        let decl = self.program.var(var);
        let Some(semantic) = decl.semantic.clone() else {
            return;
        };
        let data_type = self
            .program
            .var_type_denoter(var)
            .ok()
            .and_then(|d| d.get(self.program).ok())
            .and_then(|d| d.base_type())
            .unwrap_or(DataType::vector(ScalarType::Float, 4));

        let (name, builtin, location) = if is_input {
            self.input_name(&semantic, &decl.ident)
        } else {
            self.output_name(&semantic, Some(&decl.ident))
        };

        let io_var = IoVar {
            var,
            semantic,
            data_type,
            name: name.clone(),
            builtin,
            location,
        };
        self.io_names.insert(var, name);
        if is_input {
            self.inputs.push(io_var);
        } else {
            self.outputs.push(io_var);
        }
    }

    fn input_name(&mut self, semantic: &Semantic, ident: &str) -> (String, bool, Option<u32>) {
        if let Some(builtin) = semantic.input_builtin(self.target) {
            return (builtin.to_string(), true, None);
        }
        let location = Some(self.next_location(true));
        // Vertex-stage inputs keep their HLSL names; inter-stage varyings
        // are named from the semantic so separately compiled stages link.
        if self.target.is_vertex() {
            (ident.to_string(), false, location)
        } else {
            (self.varying_name(semantic), false, location)
        }
    }

    fn output_name(
        &mut self,
        semantic: &Semantic,
        ident: Option<&str>,
    ) -> (String, bool, Option<u32>) {
        if let Some(builtin) = semantic.output_builtin(self.target) {
            return (builtin.to_string(), true, None);
        }
        if let Semantic::System(SystemValue::Target, index) = semantic {
            let name = match ident {
                Some(ident) => ident.to_string(),
                None => {
                    let suffix = if *index > 0 {
                        index.to_string()
                    } else {
                        String::new()
                    };
                    format!("{}fragColor{}", self.options.prefix, suffix)
                }
            };
            return (name, false, Some(*index));
        }
        let location = Some(self.next_location(false));
        (self.varying_name(semantic), false, location)
    }

    fn varying_name(&self, semantic: &Semantic) -> String {
        format!("{}{}", self.options.prefix, semantic)
    }

    fn next_location(&self, is_input: bool) -> u32 {
        // First-seen order per stage side.
        let list = if is_input { &self.inputs } else { &self.outputs };
        list.iter().filter(|io| io.location.is_some()).count() as u32
    }

    /* --- Name mangling --- */

    /// Locals that collide with GLSL keywords or generated globals get
    /// the configured prefix. An empty prefix disables mangling.
    fn collect_renames(&mut self) {
        if self.options.prefix.is_empty() {
            return;
        }
        let mut reserved: HashSet<String> =
            GLSL_KEYWORDS.iter().map(|s| s.to_string()).collect();
        // Only generated names count; an in-global that keeps its HLSL
        // identifier shadows harmlessly.
        for io in self.inputs.iter().chain(&self.outputs) {
            if io.name != self.program.var(io.var).ident {
                reserved.insert(io.name.clone());
            }
        }

        let program = self.program;
        for function in &program.functions {
            for &param in &function.parameters {
                self.rename_stmnt_vars(param, &reserved);
            }
            if let Some(body) = &function.body {
                self.rename_block_vars(body, &reserved);
            }
        }
    }

    fn rename_block_vars(&mut self, block: &CodeBlock, reserved: &HashSet<String>) {
        for stmnt in &block.stmnts {
            self.rename_in_stmnt(stmnt, reserved);
        }
    }

    fn rename_in_stmnt(&mut self, stmnt: &Stmnt, reserved: &HashSet<String>) {
        match &stmnt.kind {
            StmntKind::VarDecl(id) => self.rename_stmnt_vars(*id, reserved),
            StmntKind::CodeBlock(block) => self.rename_block_vars(block, reserved),
            StmntKind::For { init, body, .. } => {
                self.rename_in_stmnt(init, reserved);
                self.rename_in_stmnt(body, reserved);
            }
            StmntKind::While { body, .. } | StmntKind::DoWhile { body, .. } => {
                self.rename_in_stmnt(body, reserved);
            }
            StmntKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.rename_in_stmnt(then_branch, reserved);
                if let Some(else_branch) = else_branch {
                    self.rename_in_stmnt(else_branch, reserved);
                }
            }
            StmntKind::Switch { cases, .. } => {
                for case in cases {
                    for stmnt in &case.stmnts {
                        self.rename_in_stmnt(stmnt, reserved);
                    }
                }
            }
            _ => {}
        }
    }

    fn rename_stmnt_vars(&mut self, id: VarDeclStmntId, reserved: &HashSet<String>) {
        let program = self.program;
        for &var in &program.var_decl_stmnt(id).var_decls {
            if self.io_names.contains_key(&var) {
                continue;
            }
            let ident = &program.var(var).ident;
            if reserved.contains(ident) {
                self.renamed
                    .insert(var, format!("{}{}", self.options.prefix, ident));
            }
        }
    }

    /* --- Feature scan --- */

    fn collect_clip_types(&mut self) {
        let program = self.program;
        for function in &program.functions {
            if let Some(body) = &function.body {
                for stmnt in &body.stmnts {
                    self.scan_stmnt_for_clip(stmnt);
                }
            }
        }
    }

    fn scan_stmnt_for_clip(&mut self, stmnt: &Stmnt) {
        let program = self.program;
        match &stmnt.kind {
            StmntKind::VarDecl(id) => {
                for &var in &program.var_decl_stmnt(*id).var_decls {
                    if let Some(expr) = &program.var(var).initializer {
                        self.scan_expr_for_clip(expr);
                    }
                }
            }
            StmntKind::CodeBlock(block) => {
                for stmnt in &block.stmnts {
                    self.scan_stmnt_for_clip(stmnt);
                }
            }
            StmntKind::For {
                init,
                condition,
                iteration,
                body,
            } => {
                self.scan_stmnt_for_clip(init);
                if let Some(condition) = condition {
                    self.scan_expr_for_clip(condition);
                }
                if let Some(iteration) = iteration {
                    self.scan_expr_for_clip(iteration);
                }
                self.scan_stmnt_for_clip(body);
            }
            StmntKind::While { condition, body } => {
                self.scan_expr_for_clip(condition);
                self.scan_stmnt_for_clip(body);
            }
            StmntKind::DoWhile { body, condition } => {
                self.scan_stmnt_for_clip(body);
                self.scan_expr_for_clip(condition);
            }
            StmntKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.scan_expr_for_clip(condition);
                self.scan_stmnt_for_clip(then_branch);
                if let Some(else_branch) = else_branch {
                    self.scan_stmnt_for_clip(else_branch);
                }
            }
            StmntKind::Switch { selector, cases } => {
                self.scan_expr_for_clip(selector);
                for case in cases {
                    for stmnt in &case.stmnts {
                        self.scan_stmnt_for_clip(stmnt);
                    }
                }
            }
            StmntKind::Expr(expr) => self.scan_expr_for_clip(expr),
            StmntKind::Return(Some(expr)) => self.scan_expr_for_clip(expr),
            _ => {}
        }
    }

    fn scan_expr_for_clip(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call(call) => {
                if call.intrinsic == Some(Intrinsic::Clip) {
                    let data_type = call
                        .arguments
                        .first()
                        .and_then(|arg| self.table.get(arg.id))
                        .and_then(|d| d.base_type())
                        .unwrap_or(DataType::scalar(ScalarType::Float));
                    if !self.clip_types.contains(&data_type) {
                        self.clip_types.push(data_type);
                    }
                }
                for argument in &call.arguments {
                    self.scan_expr_for_clip(argument);
                }
            }
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                self.scan_expr_for_clip(condition);
                self.scan_expr_for_clip(then_expr);
                self.scan_expr_for_clip(else_expr);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.scan_expr_for_clip(lhs);
                self.scan_expr_for_clip(rhs);
            }
            ExprKind::Unary { expr, .. }
            | ExprKind::PostUnary { expr, .. }
            | ExprKind::Bracket(expr)
            | ExprKind::Cast { expr, .. } => self.scan_expr_for_clip(expr),
            ExprKind::Suffix { expr, .. } => self.scan_expr_for_clip(expr),
            ExprKind::ArrayAccess { expr, indices } => {
                self.scan_expr_for_clip(expr);
                for index in indices {
                    self.scan_expr_for_clip(index);
                }
            }
            ExprKind::Var { assign, .. } => {
                if let Some((_, value)) = assign {
                    self.scan_expr_for_clip(value);
                }
            }
            ExprKind::List { first, next } => {
                self.scan_expr_for_clip(first);
                self.scan_expr_for_clip(next);
            }
            ExprKind::Initializer(exprs) => {
                for expr in exprs {
                    self.scan_expr_for_clip(expr);
                }
            }
            _ => {}
        }
    }

    /* --- Versioning --- */

    fn minimum_version(&self) -> u32 {
        let mut version = 130;
        let mut require = |feature: VersionFeature| {
            let minimum = feature.min_version();
            if minimum > version {
                version = minimum;
            }
        };

        match self.target {
            ShaderTarget::Geometry => require(VersionFeature::GeometryStage),
            ShaderTarget::TessControl | ShaderTarget::TessEval => {
                require(VersionFeature::TessellationStage)
            }
            ShaderTarget::Compute => require(VersionFeature::ComputeStage),
            _ => {}
        }

        if self
            .inputs
            .iter()
            .chain(&self.outputs)
            .any(|io| io.location.is_some())
        {
            require(VersionFeature::ExplicitLocations);
        }
        if self
            .inputs
            .iter()
            .any(|io| matches!(io.semantic, Semantic::System(SystemValue::InstanceId, _)))
        {
            require(VersionFeature::InstanceId);
        }
        if self.program.buffers.iter().any(|b| b.kind.is_storage()) {
            require(VersionFeature::ComputeStage);
        }
        if self.has_entry_attribute("earlydepthstencil") {
            require(VersionFeature::EarlyFragmentTests);
        }
        version
    }

    fn check_version_features(&mut self, minimum: u32) {
        if self.version >= minimum {
            return;
        }
        // Explicit locations are the one feature an extension can cover
        // on older targets.
        let location_min = VersionFeature::ExplicitLocations.min_version();
        if minimum == location_min && self.version < location_min {
            self.use_location_extension = true;
            return;
        }
        self.reporter.error(
            ReportKind::UnsupportedFeature,
            format!(
                "output version GLSL{} can not express this shader (requires GLSL{})",
                self.version, minimum
            ),
            Span::default(),
        );
    }

    fn has_entry_attribute(&self, name: &str) -> bool {
        self.program
            .function(self.entry)
            .attributes
            .iter()
            .any(|a| a.ident.eq_ignore_ascii_case(name))
    }

    fn entry_attribute(&self, name: &str) -> Option<&Attribute> {
        self.program
            .function(self.entry)
            .attributes
            .iter()
            .find(|a| a.ident.eq_ignore_ascii_case(name))
    }

    /* --- Preamble --- */

    fn write_preamble(&mut self) {
        self.writer.line(format!("#version {}", self.version));
        if self.use_location_extension {
            self.writer
                .line("#extension GL_ARB_explicit_attrib_location : enable");
        }
    }

    fn write_stage_layouts(&mut self) {
        if let Some(attribute) = self.entry_attribute("numthreads") {
            let sizes: Vec<u64> = attribute
                .arguments
                .iter()
                .map(|arg| arg.as_const_u64().unwrap_or(1))
                .collect();
            let span = attribute.span;
            if sizes.len() == 3 {
                self.writer.blank();
                self.writer.line(format!(
                    "layout(local_size_x={}, local_size_y={}, local_size_z={}) in;",
                    sizes[0], sizes[1], sizes[2]
                ));
            } else {
                self.reporter.error(
                    ReportKind::InvalidSemantic,
                    "attribute 'numthreads' requires three arguments",
                    span,
                );
            }
        }
        if self.has_entry_attribute("earlydepthstencil") {
            self.writer.blank();
            self.writer.line("layout(early_fragment_tests) in;");
        }
    }

    /* --- Type helpers --- */

    fn struct_name(&self, id: StructId) -> String {
        let decl = self.program.struct_(id);
        if decl.is_anonymous() {
            format!("{}anonymous{}", self.options.prefix, id.0)
        } else {
            decl.ident.clone()
        }
    }

    fn denoter_str(&mut self, denoter: &TypeDenoter, span: Span) -> String {
        match denoter {
            TypeDenoter::Base(data_type) => data_type.to_glsl(),
            TypeDenoter::Struct(id) => self.struct_name(*id),
            TypeDenoter::Alias(_) => match denoter.get(self.program) {
                Ok(resolved) => self.denoter_str(&resolved, span),
                Err(message) => {
                    self.reporter.error(ReportKind::InternalError, message, span);
                    String::new()
                }
            },
            TypeDenoter::Array { element, .. } => self.denoter_str(element, span),
            TypeDenoter::Buffer(_) | TypeDenoter::Sampler(_) => {
                self.reporter.error(
                    ReportKind::UnsupportedFeature,
                    "buffer and sampler types can not be written as GLSL value types",
                    span,
                );
                String::new()
            }
        }
    }

    fn var_type_str(&mut self, var_type: &VarType) -> String {
        match var_type.type_denoter(self.program) {
            Ok(denoter) => self.denoter_str(&denoter, var_type.span),
            Err(message) => {
                self.reporter
                    .error(ReportKind::InternalError, message, var_type.span);
                String::new()
            }
        }
    }

    fn var_name(&self, var: VarId) -> String {
        if let Some(name) = self.io_names.get(&var) {
            return name.clone();
        }
        if let Some(name) = self.renamed.get(&var) {
            return name.clone();
        }
        self.program.var(var).ident.clone()
    }

    /* --- Struct declarations --- */

    fn write_structs(&mut self) {
        for global in &self.program.globals.clone() {
            let GlobalDeclKind::Struct(id) = &global.kind else {
                continue;
            };
            if self.omitted_structs.contains(id) {
                continue;
            }
            self.write_struct_decl(*id, global.span, &global.comments);
        }
    }

    fn write_struct_decl(&mut self, id: StructId, span: Span, comments: &[String]) {
        self.writer.blank();
        if self.options.keep_comments {
            for comment in comments {
                self.writer.comment(comment);
            }
        }
        self.writer.line_mark(span.line);
        self.writer.line(format!("struct {}", self.struct_name(id)));
        self.writer.open_scope();

        // Inherited members are flattened into the GLSL struct.
        let mut members = Vec::new();
        self.program
            .struct_(id)
            .collect_member_vars(self.program, &mut members);
        for member in members {
            let stmnt_id = self.program.var(member).decl_stmnt.unwrap();
            let var_type = self.program.var_decl_stmnt(stmnt_id).var_type.clone();
            let type_str = self.var_type_str(&var_type);
            let dims = self.array_dims_str(&self.program.var(member).array_dims.clone());
            let name = self.program.var(member).ident.clone();
            self.writer.line(format!("{} {}{};", type_str, name, dims));
        }
        self.writer.close_scope(true);
    }

    fn array_dims_str(&mut self, dims: &[Option<Expr>]) -> String {
        let mut s = String::new();
        for dim in dims {
            match dim {
                Some(expr) => {
                    let rendered = self.expr_str(expr);
                    s += &format!("[{}]", rendered);
                }
                None => s += "[]",
            }
        }
        s
    }

    /* --- Global declarations --- */

    fn write_global_declarations(&mut self) {
        for global in &self.program.globals.clone() {
            match &global.kind {
                GlobalDeclKind::Var(id) => self.write_global_var(*id, global),
                GlobalDeclKind::UniformBuffer(id) => self.write_uniform_buffer(*id, global),
                GlobalDeclKind::Buffers(ids) => {
                    for &id in ids {
                        self.write_buffer(id, global);
                    }
                }
                // Sampler states merge into combined texture samplers.
                GlobalDeclKind::Samplers(_) => {}
                // Typedefs resolve away; structs were written above.
                GlobalDeclKind::Alias(_)
                | GlobalDeclKind::Struct(_)
                | GlobalDeclKind::Function(_) => {}
            }
        }
    }

    fn write_global_var(&mut self, id: VarDeclStmntId, global: &GlobalDecl) {
        let stmnt = self.program.var_decl_stmnt(id).clone();
        self.writer.blank();
        if self.options.keep_comments {
            for comment in &global.comments {
                self.writer.comment(comment);
            }
        }
        self.writer.line_mark(global.span.line);

        // HLSL globals without `static` are uniform; `static`/`const`
        // globals stay value globals.
        let is_static = stmnt.storage_classes.contains(&StorageClass::Static);
        let is_shared = stmnt.storage_classes.contains(&StorageClass::GroupShared);
        let qualifier = if is_shared {
            "shared "
        } else if stmnt.is_const() && !stmnt.is_uniform {
            "const "
        } else if !is_static {
            "uniform "
        } else {
            ""
        };

        let type_str = self.var_type_str(&stmnt.var_type);
        for &var in &stmnt.var_decls {
            let decl = self.program.var(var).clone();
            let dims = self.array_dims_str(&decl.array_dims);
            let mut line = format!("{}{} {}{}", qualifier, type_str, self.var_name(var), dims);
            if !qualifier.starts_with("uniform") && !is_shared {
                if let Some(init) = &decl.initializer {
                    let rendered = self.initializer_str(init, &stmnt.var_type, &decl.array_dims);
                    line += &format!(" = {}", rendered);
                }
            }
            line += ";";
            self.writer.line(line);
        }
    }

    fn write_uniform_buffer(&mut self, id: UniformBufferId, global: &GlobalDecl) {
        let decl = self.program.uniform_buffer(id).clone();
        self.writer.blank();
        if self.options.keep_comments {
            for comment in &global.comments {
                self.writer.comment(comment);
            }
        }
        self.writer.line_mark(global.span.line);

        let binding = decl
            .registers
            .first()
            .filter(|_| self.version >= VersionFeature::ExplicitBindings.min_version())
            .map(|r| format!(", binding = {}", r.slot))
            .unwrap_or_default();
        self.writer
            .line(format!("layout(std140{}) uniform {}", binding, decl.ident));
        self.writer.open_scope();
        for &member in &decl.members {
            let stmnt = self.program.var_decl_stmnt(member).clone();
            let type_str = self.var_type_str(&stmnt.var_type);
            for &var in &stmnt.var_decls {
                let dims = self.array_dims_str(&self.program.var(var).array_dims.clone());
                let name = self.program.var(var).ident.clone();
                self.writer.line(format!("{} {}{};", type_str, name, dims));
            }
        }
        self.writer.close_scope(true);
    }

    fn write_buffer(&mut self, id: BufferId, global: &GlobalDecl) {
        let decl = self.program.buffer(id).clone();
        self.writer.blank();
        self.writer.line_mark(global.span.line);

        if decl.kind.is_texture() {
            let scalar_prefix = decl
                .generic_type
                .as_ref()
                .and_then(|t| t.type_denoter(self.program).ok())
                .and_then(|d| d.base_type())
                .map(|b| match b.scalar {
                    ScalarType::Int => "i",
                    ScalarType::UInt => "u",
                    _ => "",
                })
                .unwrap_or("");
            let sampler = match decl.kind {
                BufferType::Texture1D => "sampler1D",
                BufferType::Texture2D => "sampler2D",
                BufferType::Texture3D => "sampler3D",
                BufferType::TextureCube => "samplerCube",
                _ => "sampler2D",
            };
            let binding = decl
                .registers
                .first()
                .filter(|_| self.version >= VersionFeature::ExplicitBindings.min_version())
                .map(|r| format!("layout(binding = {}) ", r.slot))
                .unwrap_or_default();
            self.writer.line(format!(
                "{}uniform {}{} {};",
                binding, scalar_prefix, sampler, decl.ident
            ));
        } else {
            // Structured and byte-address buffers become storage blocks.
            let element = decl
                .generic_type
                .as_ref()
                .map(|t| self.var_type_str(t))
                .unwrap_or_else(|| "uint".to_string());
            let binding = decl
                .registers
                .first()
                .map(|r| format!(", binding = {}", r.slot))
                .unwrap_or_default();
            let qualifier = if decl.kind.is_read_write() { "" } else { "readonly " };
            self.writer.line(format!(
                "layout(std430{}) {}buffer {}Block",
                binding, qualifier, decl.ident
            ));
            self.writer.open_scope();
            self.writer.line(format!("{} {}[];", element, decl.ident));
            self.writer.close_scope(true);
        }
    }

    /* --- Entry I/O globals --- */

    fn write_io_globals(&mut self) {
        let inputs = self.inputs.clone();
        let outputs = self.outputs.clone();

        let mut wrote = false;
        for io in inputs.iter().filter(|io| !io.builtin) {
            if !wrote {
                self.writer.blank();
                wrote = true;
            }
            let line = self.io_decl_str(io, true);
            self.writer.line(line);
        }

        wrote = false;
        for io in outputs.iter().filter(|io| !io.builtin) {
            if !wrote {
                self.writer.blank();
                wrote = true;
            }
            let line = self.io_decl_str(io, false);
            self.writer.line(line);
        }

        if let ReturnOutput::Value {
            name,
            builtin: false,
            data_type,
            location,
        } = self.return_output.clone()
        {
            self.writer.blank();
            let layout = location
                .filter(|_| self.locations_enabled())
                .map(|l| format!("layout(location = {}) ", l))
                .unwrap_or_default();
            self.writer
                .line(format!("{}out {} {};", layout, data_type.to_glsl(), name));
        }

        // Entry parameters without semantics are plain uniforms.
        let uniform_params = self.uniform_params.clone();
        let mut wrote = false;
        for var in uniform_params {
            if !wrote {
                self.writer.blank();
                wrote = true;
            }
            let stmnt_id = self.program.var(var).decl_stmnt.unwrap();
            let var_type = self.program.var_decl_stmnt(stmnt_id).var_type.clone();
            let type_str = self.var_type_str(&var_type);
            let dims = self.array_dims_str(&self.program.var(var).array_dims.clone());
            self.writer
                .line(format!("uniform {} {}{};", type_str, self.var_name(var), dims));
        }
    }

    fn locations_enabled(&self) -> bool {
        self.version >= VersionFeature::ExplicitLocations.min_version()
            || self.use_location_extension
    }

    fn io_decl_str(&mut self, io: &IoVar, is_input: bool) -> String {
        let layout = io
            .location
            .filter(|_| self.locations_enabled())
            .map(|l| format!("layout(location = {}) ", l))
            .unwrap_or_default();
        format!(
            "{}{} {} {};",
            layout,
            if is_input { "in" } else { "out" },
            io.data_type.to_glsl(),
            io.name
        )
    }

    /* --- Clip helpers --- */

    /// One overload per referenced argument type, each emitted once per
    /// translation unit.
    fn write_clip_helpers(&mut self) {
        for data_type in self.clip_types.clone() {
            self.writer.blank();
            let type_str = data_type.to_glsl();
            self.writer.line(format!("void clip({} x)", type_str));
            self.writer.open_scope();
            if data_type.is_scalar() {
                self.writer.line("if (x < 0.0) discard;");
            } else {
                self.writer.line(format!(
                    "if (any(lessThan(x, {}(0.0)))) discard;",
                    type_str
                ));
            }
            self.writer.close_scope(false);
        }
    }

    /* --- Functions --- */

    fn write_functions(&mut self) {
        for index in 0..self.program.functions.len() {
            let id = FunctionId(index as u32);
            if id == self.entry || self.program.function(id).is_forward_decl() {
                continue;
            }
            self.write_function(id);
        }
    }

    fn write_function(&mut self, id: FunctionId) {
        let function = self.program.function(id).clone();
        self.writer.blank();
        if self.options.keep_comments {
            for comment in &function.comments {
                self.writer.comment(comment);
            }
        }
        self.writer.line_mark(function.span.line);

        let return_str = self.var_type_str(&function.return_type);
        let mut signature = format!("{} {}(", return_str, function.ident);
        for (index, &param) in function.parameters.iter().enumerate() {
            if index > 0 {
                signature += ", ";
            }
            let stmnt = self.program.var_decl_stmnt(param).clone();
            if stmnt.is_output() {
                signature += if stmnt.is_input { "inout " } else { "out " };
            }
            let type_str = self.var_type_str(&stmnt.var_type);
            let var = stmnt.var_decls[0];
            let dims = self.array_dims_str(&self.program.var(var).array_dims.clone());
            signature += &format!("{} {}{}", type_str, self.var_name(var), dims);
        }
        signature += ")";
        self.writer.line(signature);

        self.writer.open_scope();
        if let Some(body) = &function.body {
            self.write_block_stmnts(body);
        }
        self.writer.close_scope(false);
    }

    /* --- Entry point --- */

    fn write_entry_point(&mut self) {
        let function = self.program.function(self.entry).clone();
        self.writer.blank();
        if self.options.keep_comments {
            for comment in &function.comments {
                self.writer.comment(comment);
            }
        }
        self.writer.line_mark(function.span.line);
        self.writer.line("void main()");
        self.writer.open_scope();

        // Reconstruct struct parameters from the in-globals.
        for &param in &function.parameters {
            let stmnt = self.program.var_decl_stmnt(param).clone();
            let denoter = stmnt
                .var_type
                .type_denoter(self.program)
                .and_then(|d| d.get(self.program))
                .unwrap_or(TypeDenoter::void());
            let TypeDenoter::Struct(struct_id) = denoter else {
                continue;
            };
            if self.omitted_structs.contains(&struct_id) {
                continue;
            }
            for &var in &stmnt.var_decls {
                let param_name = self.var_name(var);
                self.writer
                    .line(format!("{} {};", self.struct_name(struct_id), param_name));
                let mut members = Vec::new();
                self.program
                    .struct_(struct_id)
                    .collect_member_vars(self.program, &mut members);
                for member in members {
                    let member_ident = self.program.var(member).ident.clone();
                    if let Some(source) = self.io_names.get(&member) {
                        let source = source.clone();
                        self.writer
                            .line(format!("{}.{} = {};", param_name, member_ident, source));
                    }
                }
            }
        }

        self.in_entry = true;
        if let Some(body) = &function.body {
            for (index, stmnt) in body.stmnts.iter().enumerate() {
                self.entry_tail = index + 1 == body.stmnts.len();
                self.write_stmnt(stmnt);
            }
        }
        self.in_entry = false;
        self.entry_tail = false;
        self.writer.close_scope(false);
    }

    /* --- Statements --- */

    fn write_block_stmnts(&mut self, block: &CodeBlock) {
        for stmnt in &block.stmnts {
            self.write_stmnt(stmnt);
        }
    }

    fn write_scoped_stmnt(&mut self, stmnt: &Stmnt) {
        self.writer.open_scope();
        match &stmnt.kind {
            StmntKind::CodeBlock(block) => self.write_block_stmnts(block),
            _ => self.write_stmnt(stmnt),
        }
        self.writer.close_scope(false);
    }

    fn write_stmnt(&mut self, stmnt: &Stmnt) {
        if self.options.keep_comments {
            for comment in &stmnt.comments.clone() {
                self.writer.comment(comment);
            }
        }
        self.writer.line_mark(stmnt.span.line);

        match &stmnt.kind {
            StmntKind::Null => {}
            StmntKind::VarDecl(id) => self.write_local_var_decl(*id),
            StmntKind::CodeBlock(block) => {
                self.writer.open_scope();
                self.write_block_stmnts(block);
                self.writer.close_scope(false);
            }
            StmntKind::For {
                init,
                condition,
                iteration,
                body,
            } => {
                let init_str = self.inline_stmnt_str(init);
                let condition_str = condition
                    .as_ref()
                    .map(|c| self.expr_str(c))
                    .unwrap_or_default();
                let iteration_str = iteration
                    .as_ref()
                    .map(|i| self.expr_str(i))
                    .unwrap_or_default();
                self.writer.line(format!(
                    "for ({} {}; {})",
                    init_str, condition_str, iteration_str
                ));
                self.write_scoped_stmnt(body);
            }
            StmntKind::While { condition, body } => {
                let condition_str = self.expr_str(condition);
                self.writer.line(format!("while ({})", condition_str));
                self.write_scoped_stmnt(body);
            }
            StmntKind::DoWhile { body, condition } => {
                self.writer.line("do");
                self.write_scoped_stmnt(body);
                let condition_str = self.expr_str(condition);
                self.writer.line(format!("while ({});", condition_str));
            }
            StmntKind::If { .. } => self.write_if_chain(stmnt, false),
            StmntKind::Switch { selector, cases } => {
                let selector_str = self.expr_str(selector);
                self.writer.line(format!("switch ({})", selector_str));
                self.writer.open_scope();
                for case in cases {
                    match &case.expr {
                        Some(expr) => {
                            let expr_str = self.expr_str(expr);
                            self.writer.line(format!("case {}:", expr_str));
                        }
                        None => self.writer.line("default:"),
                    }
                    self.writer.indent();
                    for stmnt in &case.stmnts {
                        self.write_stmnt(stmnt);
                    }
                    self.writer.unindent();
                }
                self.writer.close_scope(false);
            }
            StmntKind::Expr(expr) => {
                let rendered = self.expr_str(expr);
                self.writer.line(format!("{};", rendered));
            }
            StmntKind::Return(expr) => self.write_return(expr.as_ref()),
            StmntKind::CtrlTransfer(ctrl) => self.writer.line(format!("{};", ctrl)),
        }
    }

    fn write_if_chain(&mut self, stmnt: &Stmnt, as_else: bool) {
        let StmntKind::If {
            condition,
            then_branch,
            else_branch,
        } = &stmnt.kind
        else {
            return;
        };
        let condition_str = self.expr_str(condition);
        let keyword = if as_else { "else if" } else { "if" };
        self.writer.line(format!("{} ({})", keyword, condition_str));
        self.write_scoped_stmnt(then_branch);
        if let Some(else_branch) = else_branch {
            if matches!(else_branch.kind, StmntKind::If { .. }) {
                self.write_if_chain(else_branch, true);
            } else {
                self.writer.line("else");
                self.write_scoped_stmnt(else_branch);
            }
        }
    }

    fn write_local_var_decl(&mut self, id: VarDeclStmntId) {
        let stmnt = self.program.var_decl_stmnt(id).clone();

        // Locals of omitted structs vanish; their member accesses are
        // rewritten to builtins.
        if let Ok(TypeDenoter::Struct(struct_id)) = stmnt
            .var_type
            .type_denoter(self.program)
            .and_then(|d| d.get(self.program))
        {
            if self.omitted_structs.contains(&struct_id) {
                return;
            }
        }

        let qualifier = if stmnt.is_const() { "const " } else { "" };
        let type_str = self.var_type_str(&stmnt.var_type);
        for &var in &stmnt.var_decls {
            let decl = self.program.var(var).clone();
            let dims = self.array_dims_str(&decl.array_dims);
            let mut line = format!("{}{} {}{}", qualifier, type_str, self.var_name(var), dims);
            if let Some(init) = &decl.initializer {
                let rendered = self.initializer_str(init, &stmnt.var_type, &decl.array_dims);
                line += &format!(" = {}", rendered);
            }
            line += ";";
            self.writer.line(line);
        }
    }

    fn inline_stmnt_str(&mut self, stmnt: &Stmnt) -> String {
        match &stmnt.kind {
            StmntKind::Null => ";".to_string(),
            StmntKind::VarDecl(id) => {
                let stmnt = self.program.var_decl_stmnt(*id).clone();
                let type_str = self.var_type_str(&stmnt.var_type);
                let mut parts = Vec::new();
                for &var in &stmnt.var_decls {
                    let decl = self.program.var(var).clone();
                    let mut part = self.var_name(var);
                    part += &self.array_dims_str(&decl.array_dims);
                    if let Some(init) = &decl.initializer {
                        let rendered = self.expr_str(init);
                        part += &format!(" = {}", rendered);
                    }
                    parts.push(part);
                }
                format!("{} {};", type_str, parts.join(", "))
            }
            StmntKind::Expr(expr) => format!("{};", self.expr_str(expr)),
            _ => ";".to_string(),
        }
    }

    fn write_return(&mut self, expr: Option<&Expr>) {
        if !self.in_entry {
            match expr {
                Some(expr) => {
                    let rendered = self.expr_str(expr);
                    self.writer.line(format!("return {};", rendered));
                }
                None => self.writer.line("return;"),
            }
            return;
        }

        // Entry point: route the return value into the out-globals.
        match self.return_output.clone() {
            ReturnOutput::Void => {
                if !self.entry_tail {
                    self.writer.line("return;");
                }
            }
            ReturnOutput::Value { name, .. } => {
                if let Some(expr) = expr {
                    let rendered = self.expr_str(expr);
                    self.writer.line(format!("{} = {};", name, rendered));
                }
                if !self.entry_tail {
                    self.writer.line("return;");
                }
            }
            ReturnOutput::Struct(struct_id) => {
                if self.omitted_structs.contains(&struct_id) {
                    // Members were written straight to builtins.
                    if !self.entry_tail {
                        self.writer.line("return;");
                    }
                    return;
                }
                let Some(expr) = expr else {
                    return;
                };
                let rendered = self.expr_str(expr);
                let temp = format!("{}stageOutput", self.options.prefix);
                self.writer.open_scope();
                self.writer.line(format!(
                    "{} {} = {};",
                    self.struct_name(struct_id),
                    temp,
                    rendered
                ));
                for io in self.outputs.clone() {
                    let member = self.program.var(io.var).ident.clone();
                    self.writer
                        .line(format!("{} = {}.{};", io.name, temp, member));
                }
                if !self.entry_tail {
                    self.writer.line("return;");
                }
                self.writer.close_scope(false);
            }
        }
    }

    /* --- Expressions --- */

    fn initializer_str(
        &mut self,
        init: &Expr,
        var_type: &VarType,
        dims: &[Option<Expr>],
    ) -> String {
        if let ExprKind::Initializer(exprs) = &init.kind {
            // GLSL array constructor syntax.
            let items: Vec<String> = exprs.iter().map(|e| self.expr_str(e)).collect();
            let element = self.var_type_str(var_type);
            if !dims.is_empty() {
                return format!("{}[{}]({})", element, items.len(), items.join(", "));
            }
            return format!("{}({})", element, items.join(", "));
        }
        self.expr_str(init)
    }

    fn expr_str(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Null => String::new(),
            ExprKind::Literal { data_type, value } => {
                let mut value = value.clone();
                // GLSL has no half literals; the `u` suffix survives.
                if data_type.scalar == ScalarType::Half && !value.contains('.') {
                    value += ".0";
                }
                value
            }
            ExprKind::TypeName(var_type) => self.var_type_str(var_type),
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                format!(
                    "{} ? {} : {}",
                    self.operand_str(condition),
                    self.operand_str(then_expr),
                    self.operand_str(else_expr)
                )
            }
            ExprKind::Binary { op, lhs, rhs } => {
                format!(
                    "{} {} {}",
                    self.operand_str(lhs),
                    op,
                    self.operand_str(rhs)
                )
            }
            ExprKind::Unary { op, expr } => format!("{}{}", op, self.operand_str(expr)),
            ExprKind::PostUnary { op, expr } => format!("{}{}", self.operand_str(expr), op),
            ExprKind::Call(call) => self.call_str(call, expr.span),
            ExprKind::Bracket(inner) => format!("({})", self.expr_str(inner)),
            ExprKind::Suffix { expr, var_ident } => {
                format!("{}.{}", self.operand_str(expr), self.chain_tail_str(var_ident))
            }
            ExprKind::ArrayAccess { expr, indices } => {
                let mut s = self.operand_str(expr);
                for index in indices {
                    s += &format!("[{}]", self.expr_str(index));
                }
                s
            }
            ExprKind::Cast { target, expr } => {
                // GLSL uses constructor syntax for conversions.
                format!("{}({})", self.var_type_str(target), self.expr_str(expr))
            }
            ExprKind::Var { ident, assign } => {
                let name = self.var_ident_str(ident);
                match assign {
                    Some((op, value)) => {
                        format!("{} {} {}", name, op, self.expr_str(value))
                    }
                    None => name,
                }
            }
            ExprKind::List { first, next } => {
                format!("{}, {}", self.expr_str(first), self.expr_str(next))
            }
            ExprKind::Initializer(exprs) => {
                // Bare initializer lists outside declarations fall back
                // to a comma-separated constructor-less list.
                let items: Vec<String> = exprs.iter().map(|e| self.expr_str(e)).collect();
                format!("({})", items.join(", "))
            }
        }
    }

    /// Parenthesize compound operands inside larger expressions.
    fn operand_str(&mut self, expr: &Expr) -> String {
        let needs_parens = matches!(
            expr.kind,
            ExprKind::Binary { .. }
                | ExprKind::Ternary { .. }
                | ExprKind::List { .. }
                | ExprKind::Var { assign: Some(_), .. }
        );
        let rendered = self.expr_str(expr);
        if needs_parens {
            format!("({})", rendered)
        } else {
            rendered
        }
    }

    fn var_ident_str(&mut self, ident: &VarIdent) -> String {
        // Member access on a local of an omitted struct maps straight to
        // the member's builtin.
        if let (Some(SymbolRef::Var(var)), Some(next)) = (ident.symbol, ident.next.as_deref()) {
            if let Ok(TypeDenoter::Struct(struct_id)) = self
                .program
                .var_type_denoter(var)
                .and_then(|d| d.get(self.program))
            {
                if self.omitted_structs.contains(&struct_id) {
                    if let Some(member) =
                        self.program.struct_(struct_id).fetch(self.program, &next.ident)
                    {
                        if let Some(name) = self.io_names.get(&member) {
                            let mut s = name.clone();
                            for index in &next.array_indices {
                                s += &format!("[{}]", self.expr_str(index));
                            }
                            if let Some(tail) = next.next.as_deref() {
                                s += &format!(".{}", self.chain_tail_str(tail));
                            }
                            return s;
                        }
                    }
                }
            }
        }

        let head = match ident.symbol {
            Some(SymbolRef::Var(var)) => self.var_name(var),
            Some(SymbolRef::Buffer(buffer)) => self.program.buffer(buffer).ident.clone(),
            Some(SymbolRef::Sampler(sampler)) => self.program.sampler(sampler).ident.clone(),
            _ => ident.ident.clone(),
        };

        let mut s = head;
        for index in &ident.array_indices {
            s += &format!("[{}]", self.expr_str(index));
        }
        if let Some(next) = ident.next.as_deref() {
            s += &format!(".{}", self.chain_tail_str(next));
        }
        s
    }

    /// Remaining chain segments after the head; member names are emitted
    /// verbatim.
    fn chain_tail_str(&mut self, ident: &VarIdent) -> String {
        let mut s = ident.ident.clone();
        for index in &ident.array_indices {
            s += &format!("[{}]", self.expr_str(index));
        }
        if let Some(next) = ident.next.as_deref() {
            s += &format!(".{}", self.chain_tail_str(next));
        }
        s
    }

    /* --- Calls and intrinsic rewriting --- */

    fn call_str(&mut self, call: &FunctionCall, span: Span) -> String {
        let arguments: Vec<String> = call.arguments.iter().map(|a| self.expr_str(a)).collect();

        if let Some(data_type) = call.type_ctor {
            return format!("{}({})", data_type.to_glsl(), arguments.join(", "));
        }

        if let Some(intrinsic) = call.intrinsic {
            return self.intrinsic_str(intrinsic, call, arguments, span);
        }

        if let Some(id) = call.func_decl {
            return format!(
                "{}({})",
                self.program.function(id).ident,
                arguments.join(", ")
            );
        }

        // Unbound call: surface the name as written.
        let name = call
            .ident
            .as_ref()
            .map(|i| i.to_string())
            .unwrap_or_default();
        format!("{}({})", name, arguments.join(", "))
    }

    fn intrinsic_str(
        &mut self,
        intrinsic: Intrinsic,
        call: &FunctionCall,
        arguments: Vec<String>,
        span: Span,
    ) -> String {
        match intrinsic {
            // HLSL row-major semantics against GLSL column-major: swap
            // the operand order.
            Intrinsic::Mul => {
                let lhs = call.arguments.first().map(|a| self.operand_str(a));
                let rhs = call.arguments.get(1).map(|a| self.operand_str(a));
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => format!("{} * {}", rhs, lhs),
                    _ => String::new(),
                }
            }

            Intrinsic::Rcp => {
                let one = self.literal_one(call.arguments.first());
                format!("({} / {})", one, arguments.first().cloned().unwrap_or_default())
            }

            Intrinsic::Saturate => {
                let integral = self.argument_is_integral(call.arguments.first());
                let (zero, one) = if integral { ("0", "1") } else { ("0.0", "1.0") };
                format!(
                    "clamp({}, {}, {})",
                    arguments.first().cloned().unwrap_or_default(),
                    zero,
                    one
                )
            }

            Intrinsic::Clip => format!("clip({})", arguments.join(", ")),

            Intrinsic::SinCos => {
                // sincos(x, s, c) has no GLSL counterpart.
                if arguments.len() == 3 {
                    format!(
                        "{} = sin({}), {} = cos({})",
                        arguments[1], arguments[0], arguments[2], arguments[0]
                    )
                } else {
                    String::new()
                }
            }

            Intrinsic::InterlockedCompareExchange => {
                if arguments.len() == 4 {
                    format!(
                        "{} = atomicCompSwap({}, {}, {})",
                        arguments[3], arguments[0], arguments[1], arguments[2]
                    )
                } else {
                    String::new()
                }
            }

            _ if intrinsic.is_atomic() => {
                // The three-argument form receives the original value.
                if arguments.len() == 3 {
                    format!(
                        "{} = {}({}, {})",
                        arguments[2],
                        intrinsic.glsl_name(),
                        arguments[0],
                        arguments[1]
                    )
                } else {
                    format!("{}({})", intrinsic.glsl_name(), arguments.join(", "))
                }
            }

            Intrinsic::Sample | Intrinsic::SampleLevel | Intrinsic::Load => {
                self.texture_method_str(intrinsic, call, arguments, span)
            }

            _ => format!("{}({})", intrinsic.glsl_name(), arguments.join(", ")),
        }
    }

    /// `tex.Sample(smp, uv)` lowers to `texture(tex, uv)`: the texture
    /// object takes the sampler's place and the sampler state vanishes.
    fn texture_method_str(
        &mut self,
        intrinsic: Intrinsic,
        call: &FunctionCall,
        arguments: Vec<String>,
        span: Span,
    ) -> String {
        let Some(ident) = &call.ident else {
            self.reporter.error(
                ReportKind::InternalError,
                "texture method call without an object",
                span,
            );
            return String::new();
        };
        let object = crate::analyzer::chain_without_last(ident);
        let object_str = self.var_ident_str(&object);

        match intrinsic {
            Intrinsic::Sample => {
                let coord = arguments.get(1).cloned().unwrap_or_default();
                format!("texture({}, {})", object_str, coord)
            }
            Intrinsic::SampleLevel => {
                let coord = arguments.get(1).cloned().unwrap_or_default();
                let level = arguments.get(2).cloned().unwrap_or_default();
                format!("textureLod({}, {}, {})", object_str, coord, level)
            }
            _ => {
                let is_texture = matches!(
                    ident.symbol,
                    Some(SymbolRef::Buffer(id)) if self.program.buffer(id).kind.is_texture()
                );
                if is_texture {
                    let coord = arguments.first().cloned().unwrap_or_default();
                    format!("texelFetch({}, {}, 0)", object_str, coord)
                } else {
                    // Structured buffer load.
                    let index = arguments.first().cloned().unwrap_or_default();
                    format!("{}[{}]", object_str, index)
                }
            }
        }
    }

    fn literal_one(&self, argument: Option<&Expr>) -> &'static str {
        if self.argument_is_integral(argument) {
            "1"
        } else {
            "1.0"
        }
    }

    fn argument_is_integral(&self, argument: Option<&Expr>) -> bool {
        argument
            .and_then(|arg| self.table.get(arg.id))
            .and_then(|d| d.base_type())
            .map(|b| b.is_integral())
            .unwrap_or(false)
    }
}

/// GLSL reserved words that HLSL identifiers may collide with.
const GLSL_KEYWORDS: &[&str] = &[
    "attribute",
    "varying",
    "layout",
    "uniform",
    "buffer",
    "shared",
    "flat",
    "smooth",
    "noperspective",
    "patch",
    "sample",
    "invariant",
    "precision",
    "highp",
    "mediump",
    "lowp",
    "vec2",
    "vec3",
    "vec4",
    "ivec2",
    "ivec3",
    "ivec4",
    "uvec2",
    "uvec3",
    "uvec4",
    "bvec2",
    "bvec3",
    "bvec4",
    "mat2",
    "mat3",
    "mat4",
    "input",
    "output",
    "texture",
    "main",
];
