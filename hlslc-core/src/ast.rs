//! Abstract syntax tree for HLSL translation units.
//!
//! The tree is arena-backed: declarations live in per-kind vectors on
//! [`Program`] and every back-reference (symbol refs, base-struct refs,
//! function refs) is an index into those arenas, never a pointer. The
//! expression/statement trees are owned in place. Typed expression nodes
//! carry a [`NodeId`] that keys the memoized type-denoter side table
//! ([`TypeTable`]).

use crate::report::Span;
use crate::semantic::Semantic;
use crate::ty::{DataType, ScalarType, TypeDenoter};
use std::collections::HashMap;
use std::fmt;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(VarId);
arena_id!(VarDeclStmntId);
arena_id!(StructId);
arena_id!(FunctionId);
arena_id!(BufferId);
arena_id!(SamplerId);
arena_id!(AliasId);
arena_id!(UniformBufferId);

/// Unique id of a typed AST node, assigned by the parser's [`NodeCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Default, Clone)]
pub struct NodeCounter(u32);

impl NodeCounter {
    pub fn new() -> Self {
        NodeCounter(0)
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.0);
        self.0 += 1;
        id
    }
}

/// Reference to a named declaration, as bound by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRef {
    Var(VarId),
    Buffer(BufferId),
    Sampler(SamplerId),
    Struct(StructId),
    Alias(AliasId),
}

/* ----- Program ----- */

/// A parsed translation unit. Owns every AST node for the lifetime of one
/// compilation; released wholesale afterwards.
#[derive(Debug, Default, Clone)]
pub struct Program {
    /// Global declarations in source order.
    pub globals: Vec<GlobalDecl>,

    pub vars: Vec<VarDecl>,
    pub var_decl_stmnts: Vec<VarDeclStmnt>,
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FunctionDecl>,
    pub buffers: Vec<BufferDecl>,
    pub samplers: Vec<SamplerDecl>,
    pub aliases: Vec<AliasDecl>,
    pub uniform_buffers: Vec<UniformBufferDecl>,
}

#[derive(Debug, Clone)]
pub struct GlobalDecl {
    pub span: Span,
    pub comments: Vec<String>,
    pub kind: GlobalDeclKind,
}

#[derive(Debug, Clone)]
pub enum GlobalDeclKind {
    Var(VarDeclStmntId),
    Struct(StructId),
    Function(FunctionId),
    UniformBuffer(UniformBufferId),
    Buffers(Vec<BufferId>),
    Samplers(Vec<SamplerId>),
    Alias(AliasId),
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.index()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut VarDecl {
        &mut self.vars[id.index()]
    }

    pub fn var_decl_stmnt(&self, id: VarDeclStmntId) -> &VarDeclStmnt {
        &self.var_decl_stmnts[id.index()]
    }

    pub fn var_decl_stmnt_mut(&mut self, id: VarDeclStmntId) -> &mut VarDeclStmnt {
        &mut self.var_decl_stmnts[id.index()]
    }

    pub fn struct_(&self, id: StructId) -> &StructDecl {
        &self.structs[id.index()]
    }

    pub fn struct_mut(&mut self, id: StructId) -> &mut StructDecl {
        &mut self.structs[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionDecl {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionDecl {
        &mut self.functions[id.index()]
    }

    pub fn buffer(&self, id: BufferId) -> &BufferDecl {
        &self.buffers[id.index()]
    }

    pub fn sampler(&self, id: SamplerId) -> &SamplerDecl {
        &self.samplers[id.index()]
    }

    pub fn alias(&self, id: AliasId) -> &AliasDecl {
        &self.aliases[id.index()]
    }

    pub fn uniform_buffer(&self, id: UniformBufferId) -> &UniformBufferDecl {
        &self.uniform_buffers[id.index()]
    }

    /// All function overloads sharing the given identifier.
    pub fn functions_by_name(&self, ident: &str) -> Vec<FunctionId> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, f)| f.ident == ident)
            .map(|(i, _)| FunctionId(i as u32))
            .collect()
    }

    /// Type denoter of a variable declaration: the statement's base type
    /// wrapped in the declarator's array dimensions.
    pub fn var_type_denoter(&self, id: VarId) -> Result<TypeDenoter, String> {
        let var = self.var(id);
        let stmnt_id = var.decl_stmnt.ok_or_else(|| {
            format!(
                "missing reference to declaration statement of variable '{}'",
                var.ident
            )
        })?;
        let base = self.var_decl_stmnt(stmnt_id).var_type.type_denoter(self)?;
        Ok(base.as_array(&eval_array_dims(&var.array_dims)))
    }

    pub fn buffer_type_denoter(&self, id: BufferId) -> TypeDenoter {
        let buffer = self.buffer(id);
        TypeDenoter::Buffer(id).as_array(&eval_array_dims(&buffer.array_dims))
    }

    pub fn sampler_type_denoter(&self, id: SamplerId) -> TypeDenoter {
        let sampler = self.sampler(id);
        TypeDenoter::Sampler(id).as_array(&eval_array_dims(&sampler.array_dims))
    }
}

/// Evaluate the constant array dimension expressions of a declarator.
/// Dimensions that are absent or not compile-time integral stay unsized.
pub fn eval_array_dims(dims: &[Option<Expr>]) -> Vec<Option<u64>> {
    dims.iter()
        .map(|d| d.as_ref().and_then(Expr::as_const_u64))
        .collect()
}

/* ----- Type specifiers ----- */

/// A parsed type as written in the source, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpecifier {
    /// Scalar, vector or matrix base type (including `void`).
    Base(DataType),
    /// A named struct or typedef; `symbol` is bound by the resolver.
    Ident {
        name: String,
        symbol: Option<SymbolRef>,
    },
    /// An inline struct definition.
    Struct(StructId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarType {
    pub span: Span,
    pub specifier: TypeSpecifier,
}

impl VarType {
    pub fn base(span: Span, data_type: DataType) -> Self {
        VarType {
            span,
            specifier: TypeSpecifier::Base(data_type),
        }
    }

    pub fn type_denoter(&self, program: &Program) -> Result<TypeDenoter, String> {
        match &self.specifier {
            TypeSpecifier::Base(data_type) => Ok(TypeDenoter::Base(*data_type)),
            TypeSpecifier::Struct(id) => Ok(TypeDenoter::Struct(*id)),
            TypeSpecifier::Ident { name, symbol } => match symbol {
                Some(SymbolRef::Struct(id)) => Ok(TypeDenoter::Struct(*id)),
                Some(SymbolRef::Alias(id)) => Ok(TypeDenoter::Alias(*id)),
                Some(_) => Err(format!("'{}' does not name a type", name)),
                None => Err(format!("unresolved type name '{}'", name)),
            },
        }
    }

    pub fn to_string(&self, program: &Program) -> String {
        match &self.specifier {
            TypeSpecifier::Base(data_type) => data_type.to_string(),
            TypeSpecifier::Ident { name, .. } => name.clone(),
            TypeSpecifier::Struct(id) => program.struct_(*id).signature_to_string(),
        }
    }
}

/* ----- VarIdent ----- */

/// Chain of identifier segments (`a.b.c`), each with optional array
/// indices. The head segment carries the resolved symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct VarIdent {
    pub span: Span,
    pub ident: String,
    pub array_indices: Vec<Expr>,
    pub next: Option<Box<VarIdent>>,
    pub symbol: Option<SymbolRef>,
}

impl VarIdent {
    pub fn new(span: Span, ident: impl Into<String>) -> Self {
        VarIdent {
            span,
            ident: ident.into(),
            array_indices: Vec::new(),
            next: None,
            symbol: None,
        }
    }

    pub fn last(&self) -> &VarIdent {
        match &self.next {
            Some(next) => next.last(),
            None => self,
        }
    }

    pub fn last_mut(&mut self) -> &mut VarIdent {
        // Recursing through `&mut self.next` trips the borrow checker on
        // the None arm, so walk iteratively.
        let mut current = self;
        while current.next.is_some() {
            current = current.next.as_mut().unwrap();
        }
        current
    }
}

impl fmt::Display for VarIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ident)?;
        if let Some(next) = &self.next {
            write!(f, ".{}", next)?;
        }
        Ok(())
    }
}

/* ----- Declarations ----- */

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: NodeId,
    pub span: Span,
    pub ident: String,
    pub array_dims: Vec<Option<Expr>>,
    pub semantic: Option<Semantic>,
    pub pack_offset: Option<PackOffset>,
    pub initializer: Option<Expr>,
    /// Back-reference to the declaration statement this declarator
    /// belongs to; set by the resolver.
    pub decl_stmnt: Option<VarDeclStmntId>,
    /// Set by the analyzer for entry-point I/O bound to system values.
    pub is_system_value: bool,
}

impl VarDecl {
    pub fn to_string(&self) -> String {
        let mut s = self.ident.clone();
        for _ in &self.array_dims {
            s += "[]";
        }
        if let Some(semantic) = &self.semantic {
            s += " : ";
            s += &semantic.to_string();
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeModifier {
    Const,
    RowMajor,
    ColumnMajor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Static,
    GroupShared,
}

/// One `type a, b, c;` declaration statement; shared by globals, struct
/// members, function parameters and locals.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmnt {
    pub id: NodeId,
    pub span: Span,
    pub var_type: VarType,
    pub var_decls: Vec<VarId>,
    pub is_input: bool,
    pub is_output: bool,
    pub is_uniform: bool,
    pub type_modifiers: Vec<TypeModifier>,
    pub storage_classes: Vec<StorageClass>,
}

impl VarDeclStmnt {
    /// Parameters without an explicit `out` default to input.
    pub fn is_input(&self) -> bool {
        self.is_input || !self.is_output
    }

    pub fn is_output(&self) -> bool {
        self.is_output
    }

    pub fn is_const(&self) -> bool {
        self.is_uniform || self.type_modifiers.contains(&TypeModifier::Const)
    }

    pub fn fetch(&self, program: &Program, ident: &str) -> Option<VarId> {
        self.var_decls
            .iter()
            .copied()
            .find(|&id| program.var(id).ident == ident)
    }

    pub fn to_string(&self, program: &Program, use_var_names: bool) -> String {
        let mut s = self.var_type.to_string(program);
        if use_var_names {
            for (i, &var) in self.var_decls.iter().enumerate() {
                s += " ";
                s += &program.var(var).to_string();
                if i + 1 < self.var_decls.len() {
                    s += ",";
                }
            }
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferType {
    Buffer,
    ByteAddressBuffer,
    StructuredBuffer,
    RwBuffer,
    RwByteAddressBuffer,
    RwStructuredBuffer,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
}

impl BufferType {
    pub fn parse(ident: &str) -> Option<BufferType> {
        match ident {
            "Buffer" => Some(BufferType::Buffer),
            "ByteAddressBuffer" => Some(BufferType::ByteAddressBuffer),
            "StructuredBuffer" => Some(BufferType::StructuredBuffer),
            "RWBuffer" => Some(BufferType::RwBuffer),
            "RWByteAddressBuffer" => Some(BufferType::RwByteAddressBuffer),
            "RWStructuredBuffer" => Some(BufferType::RwStructuredBuffer),
            "Texture1D" => Some(BufferType::Texture1D),
            "Texture2D" => Some(BufferType::Texture2D),
            "Texture3D" => Some(BufferType::Texture3D),
            "TextureCube" => Some(BufferType::TextureCube),
            _ => None,
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(
            self,
            BufferType::Texture1D
                | BufferType::Texture2D
                | BufferType::Texture3D
                | BufferType::TextureCube
        )
    }

    /// Storage buffers lower to GLSL `buffer` blocks.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            BufferType::StructuredBuffer
                | BufferType::ByteAddressBuffer
                | BufferType::RwStructuredBuffer
                | BufferType::RwByteAddressBuffer
        )
    }

    pub fn is_read_write(&self) -> bool {
        matches!(
            self,
            BufferType::RwBuffer | BufferType::RwByteAddressBuffer | BufferType::RwStructuredBuffer
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferDecl {
    pub id: NodeId,
    pub span: Span,
    pub kind: BufferType,
    pub ident: String,
    /// Element type of `Texture2D<float4>` / `StructuredBuffer<T>`.
    pub generic_type: Option<VarType>,
    pub array_dims: Vec<Option<Expr>>,
    pub registers: Vec<Register>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerType {
    SamplerState,
    SamplerComparisonState,
}

impl SamplerType {
    pub fn parse(ident: &str) -> Option<SamplerType> {
        match ident {
            "SamplerState" | "sampler" => Some(SamplerType::SamplerState),
            "SamplerComparisonState" => Some(SamplerType::SamplerComparisonState),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDecl {
    pub id: NodeId,
    pub span: Span,
    pub kind: SamplerType,
    pub ident: String,
    pub array_dims: Vec<Option<Expr>>,
    pub registers: Vec<Register>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub id: NodeId,
    pub span: Span,
    /// Empty for anonymous structs.
    pub ident: String,
    pub base_name: Option<String>,
    /// Resolved base struct; set by the resolver.
    pub base_struct: Option<StructId>,
    pub members: Vec<VarDeclStmntId>,
}

impl StructDecl {
    pub fn is_anonymous(&self) -> bool {
        self.ident.is_empty()
    }

    pub fn signature_to_string(&self) -> String {
        if self.is_anonymous() {
            "struct <anonymous>".to_string()
        } else {
            format!("struct {}", self.ident)
        }
    }

    /// Member lookup honoring inheritance: base struct first, then own
    /// members, first match wins.
    pub fn fetch(&self, program: &Program, ident: &str) -> Option<VarId> {
        if let Some(base) = self.base_struct {
            if let Some(var) = program.struct_(base).fetch(program, ident) {
                return Some(var);
            }
        }
        for &member in &self.members {
            if let Some(var) = program.var_decl_stmnt(member).fetch(program, ident) {
                return Some(var);
            }
        }
        None
    }

    pub fn num_members(&self, program: &Program) -> usize {
        let mut n = 0;
        if let Some(base) = self.base_struct {
            n += program.struct_(base).num_members(program);
        }
        for &member in &self.members {
            n += program.var_decl_stmnt(member).var_decls.len();
        }
        n
    }

    /// True if any member (own or inherited) has a non-system-value
    /// semantic or no semantic at all.
    pub fn has_non_system_value_members(&self, program: &Program) -> bool {
        if let Some(base) = self.base_struct {
            if program.struct_(base).has_non_system_value_members(program) {
                return true;
            }
        }
        for &member in &self.members {
            for &var in &program.var_decl_stmnt(member).var_decls {
                let system = program
                    .var(var)
                    .semantic
                    .as_ref()
                    .map(|s| s.is_system_value())
                    .unwrap_or(false);
                if !system {
                    return true;
                }
            }
        }
        false
    }

    /// All member variables, base struct first.
    pub fn collect_member_vars(&self, program: &Program, out: &mut Vec<VarId>) {
        if let Some(base) = self.base_struct {
            program.struct_(base).collect_member_vars(program, out);
        }
        for &member in &self.members {
            out.extend(program.var_decl_stmnt(member).var_decls.iter().copied());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub id: NodeId,
    pub span: Span,
    pub ident: String,
    pub var_type: VarType,
    pub array_dims: Vec<Option<Expr>>,
}

impl AliasDecl {
    /// The aliased type, with the typedef's own array dimensions applied.
    pub fn aliased_type_denoter(&self, program: &Program) -> Result<TypeDenoter, String> {
        Ok(self
            .var_type
            .type_denoter(program)?
            .as_array(&eval_array_dims(&self.array_dims)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub span: Span,
    pub ident: String,
    pub return_type: VarType,
    pub return_semantic: Option<Semantic>,
    pub parameters: Vec<VarDeclStmntId>,
    pub attributes: Vec<Attribute>,
    /// `None` for forward declarations.
    pub body: Option<CodeBlock>,
    pub comments: Vec<String>,
}

impl FunctionDecl {
    pub fn is_forward_decl(&self) -> bool {
        self.body.is_none()
    }

    pub fn has_void_return_type(&self) -> bool {
        matches!(
            self.return_type.specifier,
            TypeSpecifier::Base(data_type) if data_type.scalar == ScalarType::Void
        )
    }

    pub fn signature_to_string(&self, program: &Program, use_param_names: bool) -> String {
        let mut s = self.return_type.to_string(program);
        s += " ";
        s += &self.ident;
        s += "(";
        for (i, &param) in self.parameters.iter().enumerate() {
            s += &program.var_decl_stmnt(param).to_string(program, use_param_names);
            if i + 1 < self.parameters.len() {
                s += ", ";
            }
        }
        s += ")";
        s
    }

    /// Two declarations agree when all parameter types compare equal.
    pub fn equals_signature(&self, program: &Program, rhs: &FunctionDecl) -> bool {
        if self.parameters.len() != rhs.parameters.len() {
            return false;
        }
        for (&lhs_param, &rhs_param) in self.parameters.iter().zip(&rhs.parameters) {
            let lhs_type = program.var_decl_stmnt(lhs_param).var_type.type_denoter(program);
            let rhs_type = program.var_decl_stmnt(rhs_param).var_type.type_denoter(program);
            match (lhs_type, rhs_type) {
                (Ok(lhs_type), Ok(rhs_type)) => {
                    if !lhs_type.equals(&rhs_type, program) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }

    /// Index of the first parameter with a defaulted initializer.
    pub fn num_min_args(&self, program: &Program) -> usize {
        let mut n = 0;
        for &param in &self.parameters {
            let stmnt = program.var_decl_stmnt(param);
            let defaulted = stmnt
                .var_decls
                .first()
                .map(|&var| program.var(var).initializer.is_some())
                .unwrap_or(false);
            if defaulted {
                break;
            }
            n += 1;
        }
        n
    }

    pub fn num_max_args(&self) -> usize {
        self.parameters.len()
    }

    /// Does an argument of the given type fit parameter `index`?
    pub fn match_parameter(
        &self,
        program: &Program,
        index: usize,
        arg_type: &TypeDenoter,
        implicit_conversion: bool,
    ) -> bool {
        let Some(&param) = self.parameters.get(index) else {
            return false;
        };
        let Ok(param_type) = program.var_decl_stmnt(param).var_type.type_denoter(program) else {
            return false;
        };
        if arg_type.equals(&param_type, program) {
            return true;
        }
        implicit_conversion && arg_type.is_castable_to(&param_type, program)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformBufferType {
    ConstantBuffer,
    TextureBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformBufferDecl {
    pub id: NodeId,
    pub span: Span,
    pub kind: UniformBufferType,
    pub ident: String,
    pub registers: Vec<Register>,
    pub members: Vec<VarDeclStmntId>,
}

impl UniformBufferDecl {
    pub fn to_string(&self) -> String {
        let keyword = match self.kind {
            UniformBufferType::ConstantBuffer => "cbuffer",
            UniformBufferType::TextureBuffer => "tbuffer",
        };
        format!("{} {}", keyword, self.ident)
    }
}

/* ----- Helpers ----- */

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub span: Span,
    pub ident: String,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterType {
    ConstantBuffer, // b
    Texture,        // t
    Sampler,        // s
    Unordered,      // u
}

impl RegisterType {
    pub fn from_prefix(prefix: char) -> Option<RegisterType> {
        match prefix {
            'b' => Some(RegisterType::ConstantBuffer),
            't' => Some(RegisterType::Texture),
            's' => Some(RegisterType::Sampler),
            'u' => Some(RegisterType::Unordered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub kind: RegisterType,
    pub slot: u32,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            RegisterType::ConstantBuffer => 'b',
            RegisterType::Texture => 't',
            RegisterType::Sampler => 's',
            RegisterType::Unordered => 'u',
        };
        write!(f, "{}{}", prefix, self.slot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackOffset {
    pub register_name: String,
    pub vector_component: String,
}

impl fmt::Display for PackOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "packoffset({}", self.register_name)?;
        if !self.vector_component.is_empty() {
            write!(f, ".{}", self.vector_component)?;
        }
        write!(f, ")")
    }
}

/* ----- Statements ----- */

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeBlock {
    pub stmnts: Vec<Stmnt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmnt {
    pub span: Span,
    pub comments: Vec<String>,
    pub kind: StmntKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmntKind {
    Null,
    VarDecl(VarDeclStmntId),
    CodeBlock(CodeBlock),
    For {
        init: Box<Stmnt>,
        condition: Option<Expr>,
        iteration: Option<Expr>,
        body: Box<Stmnt>,
    },
    While {
        condition: Expr,
        body: Box<Stmnt>,
    },
    DoWhile {
        body: Box<Stmnt>,
        condition: Expr,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmnt>,
        else_branch: Option<Box<Stmnt>>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
    },
    Expr(Expr),
    Return(Option<Expr>),
    CtrlTransfer(CtrlTransfer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub span: Span,
    /// `None` for the `default:` case.
    pub expr: Option<Expr>,
    pub stmnts: Vec<Stmnt>,
}

impl SwitchCase {
    pub fn is_default_case(&self) -> bool {
        self.expr.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlTransfer {
    Break,
    Continue,
    Discard,
}

impl fmt::Display for CtrlTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CtrlTransfer::Break => "break",
            CtrlTransfer::Continue => "continue",
            CtrlTransfer::Discard => "discard",
        };
        write!(f, "{}", s)
    }
}

/* ----- Expressions ----- */

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Placeholder expression, used only as unsized array dimension.
    Null,
    Literal {
        data_type: DataType,
        value: String,
    },
    /// A type used in expression position (cast targets).
    TypeName(VarType),
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    PostUnary {
        op: PostUnaryOp,
        expr: Box<Expr>,
    },
    Call(FunctionCall),
    Bracket(Box<Expr>),
    /// Member access on a non-identifier expression: `f().xyz`.
    Suffix {
        expr: Box<Expr>,
        var_ident: VarIdent,
    },
    ArrayAccess {
        expr: Box<Expr>,
        indices: Vec<Expr>,
    },
    Cast {
        target: VarType,
        expr: Box<Expr>,
    },
    /// Variable access, optionally with an assignment.
    Var {
        ident: VarIdent,
        assign: Option<(AssignOp, Box<Expr>)>,
    },
    /// Comma operator; the type is the first sub-expression's.
    List {
        first: Box<Expr>,
        next: Box<Expr>,
    },
    Initializer(Vec<Expr>),
}

impl Expr {
    /// Compile-time unsigned integral value, for array dimensions.
    pub fn as_const_u64(&self) -> Option<u64> {
        match &self.kind {
            ExprKind::Literal { data_type, value } if data_type.is_integral() => {
                let digits = value.trim_end_matches(['u', 'U', 'l', 'L']);
                if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                    u64::from_str_radix(hex, 16).ok()
                } else {
                    digits.parse().ok()
                }
            }
            ExprKind::Bracket(inner) => inner.as_const_u64(),
            _ => None,
        }
    }

    /// Number of scalar elements of an initializer list, with nested
    /// initializers counted flattened.
    pub fn num_initializer_elements(&self) -> usize {
        match &self.kind {
            ExprKind::Initializer(exprs) => {
                exprs.iter().map(Expr::num_initializer_elements).sum()
            }
            _ => 1,
        }
    }

    /// Change a literal's data type, rewriting its textual value, and
    /// invalidate the memoized type denoter. No-op for equal types or
    /// non-literal expressions.
    pub fn convert_literal_data_type(&mut self, target: DataType, table: &mut TypeTable) {
        let ExprKind::Literal { data_type, value } = &mut self.kind else {
            return;
        };
        if *data_type == target {
            return;
        }

        let digits = value.trim_end_matches(['f', 'F', 'u', 'U', 'h', 'H', 'l', 'L']);
        let numeric: f64 = digits.parse().unwrap_or(0.0);

        *value = match target.scalar {
            ScalarType::Bool => {
                if numeric != 0.0 {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            ScalarType::Int => format!("{}", numeric as i64),
            ScalarType::UInt => format!("{}u", numeric as u64),
            ScalarType::Half | ScalarType::Float | ScalarType::Double => {
                if numeric.fract() == 0.0 {
                    format!("{:.1}", numeric)
                } else {
                    format!("{}", numeric)
                }
            }
            ScalarType::Void => value.clone(),
        };

        *data_type = target;
        table.reset(self.id);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Callee name; `None` for type constructors like `float4(...)`.
    pub ident: Option<VarIdent>,
    /// Set for type constructors.
    pub type_ctor: Option<DataType>,
    pub arguments: Vec<Expr>,
    /// Bound by the analyzer for non-intrinsic calls.
    pub func_decl: Option<FunctionId>,
    /// Set when the callee names an intrinsic.
    pub intrinsic: Option<crate::intrinsics::Intrinsic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    /// Operators whose result type is `bool` regardless of operands.
    pub fn is_boolean_op(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::Greater
                | BinaryOp::LessEqual
                | BinaryOp::GreaterEqual
                | BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    LogicalNot,
    Negate,
    Plus,
    BitwiseNot,
    Inc,
    Dec,
}

impl UnaryOp {
    pub fn is_logical_op(&self) -> bool {
        matches!(self, UnaryOp::LogicalNot)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::LogicalNot => "!",
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostUnaryOp {
    Inc,
    Dec,
}

impl fmt::Display for PostUnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostUnaryOp::Inc => write!(f, "++"),
            PostUnaryOp::Dec => write!(f, "--"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        };
        write!(f, "{}", s)
    }
}

/* ----- Type denoter memo table ----- */

/// Write-once memo of derived type denoters, keyed by node id.
/// Invalidated per node by [`TypeTable::reset`] and by
/// [`Expr::convert_literal_data_type`].
#[derive(Debug, Default, Clone)]
pub struct TypeTable {
    map: HashMap<NodeId, TypeDenoter>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&TypeDenoter> {
        self.map.get(&id)
    }

    pub fn insert(&mut self, id: NodeId, denoter: TypeDenoter) {
        self.map.insert(id, denoter);
    }

    pub fn reset(&mut self, id: NodeId) {
        self.map.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident_chain(names: &[&str]) -> VarIdent {
        let mut iter = names.iter().rev();
        let mut ident = VarIdent::new(Span::default(), *iter.next().unwrap());
        for name in iter {
            let mut outer = VarIdent::new(Span::default(), *name);
            outer.next = Some(Box::new(ident));
            ident = outer;
        }
        ident
    }

    #[test]
    fn test_var_ident_to_string() {
        assert_eq!(ident_chain(&["a"]).to_string(), "a");
        assert_eq!(ident_chain(&["a", "b", "c"]).to_string(), "a.b.c");
    }

    #[test]
    fn test_var_ident_last() {
        let chain = ident_chain(&["a", "b", "c"]);
        assert_eq!(chain.last().ident, "c");
    }

    #[test]
    fn test_initializer_elements_flattened() {
        let counter = &mut NodeCounter::new();
        let lit = |c: &mut NodeCounter| Expr {
            id: c.next(),
            span: Span::default(),
            kind: ExprKind::Literal {
                data_type: DataType::scalar(ScalarType::Int),
                value: "1".to_string(),
            },
        };
        let inner = Expr {
            id: counter.next(),
            span: Span::default(),
            kind: ExprKind::Initializer(vec![lit(counter), lit(counter)]),
        };
        let outer = Expr {
            id: counter.next(),
            span: Span::default(),
            kind: ExprKind::Initializer(vec![inner, lit(counter)]),
        };
        assert_eq!(outer.num_initializer_elements(), 3);
    }

    #[test]
    fn test_convert_literal_idempotent() {
        let mut table = TypeTable::new();
        let mut expr = Expr {
            id: NodeId(0),
            span: Span::default(),
            kind: ExprKind::Literal {
                data_type: DataType::scalar(ScalarType::Int),
                value: "1".to_string(),
            },
        };
        let float = DataType::scalar(ScalarType::Float);
        expr.convert_literal_data_type(float, &mut table);
        let first = expr.clone();
        expr.convert_literal_data_type(float, &mut table);
        assert_eq!(expr, first);
        if let ExprKind::Literal { value, .. } = &expr.kind {
            assert_eq!(value, "1.0");
        } else {
            unreachable!();
        }
    }

    #[test]
    fn test_const_u64() {
        let expr = Expr {
            id: NodeId(0),
            span: Span::default(),
            kind: ExprKind::Literal {
                data_type: DataType::scalar(ScalarType::Int),
                value: "16".to_string(),
            },
        };
        assert_eq!(expr.as_const_u64(), Some(16));

        let hex = Expr {
            id: NodeId(1),
            span: Span::default(),
            kind: ExprKind::Literal {
                data_type: DataType::scalar(ScalarType::UInt),
                value: "0x10u".to_string(),
            },
        };
        assert_eq!(hex.as_const_u64(), Some(16));
    }
}
