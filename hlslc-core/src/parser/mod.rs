//! Recursive-descent parser for the HLSL subset.
//!
//! Consumes the token stream produced by the lexer and builds the
//! arena-backed [`Program`]. Syntax errors are reported through the
//! shared [`Reporter`]; the parser recovers at the next statement
//! boundary so several errors can surface per run.

use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use crate::preprocessor::Comment;
use crate::report::{ReportKind, Reporter, Span};
use crate::semantic::Semantic;
use crate::ty::{DataType, ScalarType};

#[cfg(test)]
mod tests;

/// Marker for an already-reported syntax error.
pub struct ParseFailure;

type PResult<T> = Result<T, ParseFailure>;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    counter: NodeCounter,
    program: Program,
    reporter: &'a mut Reporter,
    comments: Vec<Comment>,
    comment_cursor: usize,
    keep_comments: bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, reporter: &'a mut Reporter) -> Self {
        Parser {
            tokens,
            pos: 0,
            counter: NodeCounter::new(),
            program: Program::new(),
            reporter,
            comments: Vec::new(),
            comment_cursor: 0,
            keep_comments: false,
        }
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self.keep_comments = true;
        self
    }

    pub fn take_node_counter(&mut self) -> NodeCounter {
        std::mem::take(&mut self.counter)
    }

    /// Parse the whole token stream into a program.
    pub fn parse(&mut self) -> Program {
        while self.peek().is_some() {
            let comments = self.pending_comments();
            let start = self.pos;
            match self.parse_global_decl(comments) {
                Ok(()) => {}
                Err(ParseFailure) => self.skip_to_boundary(),
            }
            if self.pos == start {
                // No progress; drop one token to guarantee termination.
                self.pos += 1;
            }
        }
        std::mem::take(&mut self.program)
    }

    /* --- Token helpers --- */

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn span(&self) -> Span {
        self.peek()
            .map(|t| t.span)
            .or_else(|| self.tokens.last().map(|t| t.span))
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn accept(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<Span> {
        let span = self.span();
        if self.accept(kind) {
            Ok(span)
        } else {
            self.error(format!("expected {}", what));
            Err(ParseFailure)
        }
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Ident(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    fn peek_ident_at(&self, offset: usize) -> Option<&str> {
        match self.peek_at(offset).map(|t| &t.kind) {
            Some(TokenKind::Ident(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_ident() == Some(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<(String, Span)> {
        let span = self.span();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Ident(name)) => Ok((name, span)),
            _ => {
                self.error(format!("expected {}", what));
                Err(ParseFailure)
            }
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let span = self.span();
        self.reporter.error(ReportKind::SyntaxError, message, span);
    }

    /// Consume tokens up to and including the next `;`, or up to a `}`.
    fn skip_to_boundary(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => {
                    self.pos += 1;
                    return;
                }
                TokenKind::RBrace => return,
                _ => self.pos += 1,
            }
        }
    }

    fn pending_comments(&mut self) -> Vec<String> {
        if !self.keep_comments {
            return Vec::new();
        }
        let line = self.peek().map(|t| t.span.line).unwrap_or(u32::MAX);
        let mut out = Vec::new();
        while self.comment_cursor < self.comments.len()
            && self.comments[self.comment_cursor].line < line
        {
            out.push(self.comments[self.comment_cursor].text.clone());
            self.comment_cursor += 1;
        }
        out
    }

    fn make_expr(&mut self, span: Span, kind: ExprKind) -> Expr {
        Expr {
            id: self.counter.next(),
            span,
            kind,
        }
    }

    /* --- Globals --- */

    fn parse_global_decl(&mut self, comments: Vec<String>) -> PResult<()> {
        let span = self.span();
        let attributes = self.parse_attributes()?;

        if self.accept_keyword("typedef") {
            let alias = self.parse_typedef(span)?;
            self.program.globals.push(GlobalDecl {
                span,
                comments,
                kind: GlobalDeclKind::Alias(alias),
            });
            return Ok(());
        }

        if self.peek_ident() == Some("cbuffer") || self.peek_ident() == Some("tbuffer") {
            let id = self.parse_uniform_buffer(span)?;
            self.program.globals.push(GlobalDecl {
                span,
                comments,
                kind: GlobalDeclKind::UniformBuffer(id),
            });
            return Ok(());
        }

        if let Some(name) = self.peek_ident() {
            if let Some(kind) = BufferType::parse(name) {
                let ids = self.parse_buffer_decls(kind)?;
                self.program.globals.push(GlobalDecl {
                    span,
                    comments,
                    kind: GlobalDeclKind::Buffers(ids),
                });
                return Ok(());
            }
            if let Some(kind) = crate::ast::SamplerType::parse(name) {
                let ids = self.parse_sampler_decls(kind)?;
                self.program.globals.push(GlobalDecl {
                    span,
                    comments,
                    kind: GlobalDeclKind::Samplers(ids),
                });
                return Ok(());
            }
        }

        // Plain `struct S { ... };` without a following declarator.
        if self.peek_ident() == Some("struct") {
            let is_plain_decl = matches!(
                (self.peek_ident_at(1), self.peek_at(2).map(|t| &t.kind)),
                (Some(_), Some(TokenKind::LBrace)) | (Some(_), Some(TokenKind::Colon))
            );
            if is_plain_decl {
                let struct_id = self.parse_struct_decl()?;
                if self.accept(&TokenKind::Semicolon) {
                    self.program.globals.push(GlobalDecl {
                        span,
                        comments,
                        kind: GlobalDeclKind::Struct(struct_id),
                    });
                    return Ok(());
                }
                // `struct S { ... } s;` falls through to a var decl.
                let var_type = VarType {
                    span,
                    specifier: TypeSpecifier::Struct(struct_id),
                };
                let stmnt = self.parse_var_decl_stmnt_with(span, var_type, Flags::default())?;
                self.program.globals.push(GlobalDecl {
                    span,
                    comments,
                    kind: GlobalDeclKind::Var(stmnt),
                });
                return Ok(());
            }
        }

        // Function or global variable declaration.
        let flags = self.parse_decl_flags();
        let var_type = self.parse_var_type()?;

        // `type ident (` is a function; anything else is a variable.
        let is_function = self.peek_ident().is_some()
            && matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::LParen));

        if is_function {
            let id = self.parse_function_decl(span, var_type, attributes, comments)?;
            self.program.globals.push(GlobalDecl {
                span,
                comments: Vec::new(),
                kind: GlobalDeclKind::Function(id),
            });
            Ok(())
        } else {
            if !attributes.is_empty() {
                self.error("attributes are only allowed on function declarations");
            }
            let stmnt = self.parse_var_decl_stmnt_with(span, var_type, flags)?;
            self.program.globals.push(GlobalDecl {
                span,
                comments,
                kind: GlobalDeclKind::Var(stmnt),
            });
            Ok(())
        }
    }

    fn parse_attributes(&mut self) -> PResult<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBracket))
            && self.peek_ident_at(1).is_some()
        {
            let span = self.span();
            self.expect(&TokenKind::LBracket, "'['")?;
            let (ident, _) = self.expect_ident("attribute name")?;
            let mut arguments = Vec::new();
            if self.accept(&TokenKind::LParen) {
                if !self.accept(&TokenKind::RParen) {
                    loop {
                        arguments.push(self.parse_assignment_expr()?);
                        if !self.accept(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                }
            }
            self.expect(&TokenKind::RBracket, "']'")?;
            attributes.push(Attribute {
                span,
                ident,
                arguments,
            });
        }
        Ok(attributes)
    }

    fn parse_typedef(&mut self, span: Span) -> PResult<AliasId> {
        let var_type = self.parse_var_type()?;
        let (ident, _) = self.expect_ident("typedef name")?;
        let array_dims = self.parse_array_dims()?;
        self.expect(&TokenKind::Semicolon, "';'")?;

        let id = AliasId(self.program.aliases.len() as u32);
        self.program.aliases.push(AliasDecl {
            id: self.counter.next(),
            span,
            ident,
            var_type,
            array_dims,
        });
        Ok(id)
    }

    /// `struct [name] [: base] { members }` without the trailing
    /// semicolon or declarator.
    fn parse_struct_decl(&mut self) -> PResult<StructId> {
        let span = self.span();
        self.accept_keyword("struct");

        let ident = match self.peek_ident() {
            Some(_) => self.expect_ident("struct name")?.0,
            None => String::new(),
        };
        let base_name = if self.accept(&TokenKind::Colon) {
            Some(self.expect_ident("base struct name")?.0)
        } else {
            None
        };

        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.accept(&TokenKind::RBrace) {
            if self.peek().is_none() {
                self.error("unexpected end of struct body");
                return Err(ParseFailure);
            }
            let member_span = self.span();
            let flags = self.parse_decl_flags();
            let var_type = self.parse_var_type()?;
            match self.parse_var_decl_stmnt_with(member_span, var_type, flags) {
                Ok(member) => members.push(member),
                Err(ParseFailure) => self.skip_to_boundary(),
            }
        }

        let id = StructId(self.program.structs.len() as u32);
        self.program.structs.push(StructDecl {
            id: self.counter.next(),
            span,
            ident,
            base_name,
            base_struct: None,
            members,
        });
        Ok(id)
    }

    fn parse_uniform_buffer(&mut self, span: Span) -> PResult<UniformBufferId> {
        let kind = if self.accept_keyword("cbuffer") {
            UniformBufferType::ConstantBuffer
        } else {
            self.accept_keyword("tbuffer");
            UniformBufferType::TextureBuffer
        };
        let (ident, _) = self.expect_ident("buffer name")?;
        let registers = self.parse_register_suffix()?;

        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.accept(&TokenKind::RBrace) {
            if self.peek().is_none() {
                self.error("unexpected end of buffer body");
                return Err(ParseFailure);
            }
            let member_span = self.span();
            let flags = self.parse_decl_flags();
            let var_type = self.parse_var_type()?;
            match self.parse_var_decl_stmnt_with(member_span, var_type, flags) {
                Ok(member) => members.push(member),
                Err(ParseFailure) => self.skip_to_boundary(),
            }
        }
        self.accept(&TokenKind::Semicolon);

        let id = UniformBufferId(self.program.uniform_buffers.len() as u32);
        self.program.uniform_buffers.push(UniformBufferDecl {
            id: self.counter.next(),
            span,
            kind,
            ident,
            registers,
            members,
        });
        Ok(id)
    }

    fn parse_buffer_decls(&mut self, kind: BufferType) -> PResult<Vec<BufferId>> {
        self.advance(); // the buffer type keyword

        let generic_type = if self.accept(&TokenKind::Less) {
            let ty = self.parse_var_type()?;
            self.expect(&TokenKind::Greater, "'>'")?;
            Some(ty)
        } else {
            None
        };

        let mut ids = Vec::new();
        loop {
            let span = self.span();
            let (ident, _) = self.expect_ident("buffer name")?;
            let array_dims = self.parse_array_dims()?;
            let registers = self.parse_register_suffix()?;

            let id = BufferId(self.program.buffers.len() as u32);
            self.program.buffers.push(BufferDecl {
                id: self.counter.next(),
                span,
                kind,
                ident,
                generic_type: generic_type.clone(),
                array_dims,
                registers,
            });
            ids.push(id);

            if !self.accept(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(ids)
    }

    fn parse_sampler_decls(&mut self, kind: crate::ast::SamplerType) -> PResult<Vec<SamplerId>> {
        self.advance(); // the sampler type keyword

        let mut ids = Vec::new();
        loop {
            let span = self.span();
            let (ident, _) = self.expect_ident("sampler name")?;
            let array_dims = self.parse_array_dims()?;
            let registers = self.parse_register_suffix()?;

            let id = SamplerId(self.program.samplers.len() as u32);
            self.program.samplers.push(SamplerDecl {
                id: self.counter.next(),
                span,
                kind,
                ident,
                array_dims,
                registers,
            });
            ids.push(id);

            if !self.accept(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(ids)
    }

    fn parse_function_decl(
        &mut self,
        span: Span,
        return_type: VarType,
        attributes: Vec<Attribute>,
        comments: Vec<String>,
    ) -> PResult<FunctionId> {
        let (ident, _) = self.expect_ident("function name")?;
        self.expect(&TokenKind::LParen, "'('")?;

        let mut parameters = Vec::new();
        if !self.accept(&TokenKind::RParen) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.accept(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "')'")?;
        }

        let return_semantic = if self.accept(&TokenKind::Colon) {
            let (name, _) = self.expect_ident("return semantic")?;
            Some(Semantic::parse(&name))
        } else {
            None
        };

        let body = if self.accept(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_code_block()?)
        };

        let id = FunctionId(self.program.functions.len() as u32);
        self.program.functions.push(FunctionDecl {
            id: self.counter.next(),
            span,
            ident,
            return_type,
            return_semantic,
            parameters,
            attributes,
            body,
            comments,
        });
        Ok(id)
    }

    fn parse_parameter(&mut self) -> PResult<VarDeclStmntId> {
        let span = self.span();
        let flags = self.parse_decl_flags();
        let var_type = self.parse_var_type()?;
        let (ident, ident_span) = self.expect_ident("parameter name")?;
        let array_dims = self.parse_array_dims()?;

        let semantic = if self.accept(&TokenKind::Colon) {
            let (name, _) = self.expect_ident("semantic")?;
            Some(Semantic::parse(&name))
        } else {
            None
        };
        let initializer = if self.accept(&TokenKind::Assign) {
            Some(self.parse_assignment_expr()?)
        } else {
            None
        };

        let var = VarId(self.program.vars.len() as u32);
        self.program.vars.push(VarDecl {
            id: self.counter.next(),
            span: ident_span,
            ident,
            array_dims,
            semantic,
            pack_offset: None,
            initializer,
            decl_stmnt: None,
            is_system_value: false,
        });

        let stmnt = VarDeclStmntId(self.program.var_decl_stmnts.len() as u32);
        self.program.var_decl_stmnts.push(VarDeclStmnt {
            id: self.counter.next(),
            span,
            var_type,
            var_decls: vec![var],
            is_input: flags.is_input,
            is_output: flags.is_output,
            is_uniform: flags.is_uniform,
            type_modifiers: flags.type_modifiers,
            storage_classes: flags.storage_classes,
        });
        Ok(stmnt)
    }

    /* --- Types and declarators --- */

    fn parse_var_type(&mut self) -> PResult<VarType> {
        let span = self.span();
        if self.peek_ident() == Some("struct") {
            let struct_id = self.parse_struct_decl()?;
            return Ok(VarType {
                span,
                specifier: TypeSpecifier::Struct(struct_id),
            });
        }
        let (name, _) = self.expect_ident("type name")?;
        let specifier = match DataType::parse(&name) {
            Some(data_type) => TypeSpecifier::Base(data_type),
            None => TypeSpecifier::Ident { name, symbol: None },
        };
        Ok(VarType { span, specifier })
    }

    fn parse_array_dims(&mut self) -> PResult<Vec<Option<Expr>>> {
        let mut dims = Vec::new();
        while self.accept(&TokenKind::LBracket) {
            if self.accept(&TokenKind::RBracket) {
                dims.push(None);
            } else {
                dims.push(Some(self.parse_assignment_expr()?));
                self.expect(&TokenKind::RBracket, "']'")?;
            }
        }
        Ok(dims)
    }

    fn parse_register_suffix(&mut self) -> PResult<Vec<Register>> {
        let mut registers = Vec::new();
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Colon))
            && self.peek_ident_at(1) == Some("register")
        {
            self.advance();
            self.advance();
            self.expect(&TokenKind::LParen, "'('")?;
            let (slot, slot_span) = self.expect_ident("register slot")?;
            if let Some(register) = parse_register(&slot) {
                registers.push(register);
            } else {
                self.reporter.error(
                    ReportKind::SyntaxError,
                    format!("invalid register \"{}\"", slot),
                    slot_span,
                );
            }
            self.expect(&TokenKind::RParen, "')'")?;
        }
        Ok(registers)
    }

    /// One `type a = x, b[2] : SEMANTIC, ...;` statement. The base type
    /// and modifier flags are parsed by the caller.
    fn parse_var_decl_stmnt_with(
        &mut self,
        span: Span,
        var_type: VarType,
        flags: Flags,
    ) -> PResult<VarDeclStmntId> {
        let mut var_decls = Vec::new();
        loop {
            let (ident, ident_span) = self.expect_ident("variable name")?;
            let array_dims = self.parse_array_dims()?;

            let mut semantic = None;
            let mut pack_offset = None;
            while self.accept(&TokenKind::Colon) {
                if self.peek_ident() == Some("packoffset") {
                    self.advance();
                    self.expect(&TokenKind::LParen, "'('")?;
                    let (register_name, _) = self.expect_ident("register name")?;
                    let vector_component = if self.accept(&TokenKind::Dot) {
                        self.expect_ident("vector component")?.0
                    } else {
                        String::new()
                    };
                    self.expect(&TokenKind::RParen, "')'")?;
                    pack_offset = Some(PackOffset {
                        register_name,
                        vector_component,
                    });
                } else if self.peek_ident() == Some("register") {
                    // Register bindings on plain variables are accepted
                    // and ignored.
                    self.advance();
                    self.expect(&TokenKind::LParen, "'('")?;
                    self.expect_ident("register slot")?;
                    self.expect(&TokenKind::RParen, "')'")?;
                } else {
                    let (name, _) = self.expect_ident("semantic")?;
                    semantic = Some(Semantic::parse(&name));
                }
            }

            let initializer = if self.accept(&TokenKind::Assign) {
                Some(self.parse_initializer_expr()?)
            } else {
                None
            };

            let var = VarId(self.program.vars.len() as u32);
            self.program.vars.push(VarDecl {
                id: self.counter.next(),
                span: ident_span,
                ident,
                array_dims,
                semantic,
                pack_offset,
                initializer,
                decl_stmnt: None,
                is_system_value: false,
            });
            var_decls.push(var);

            if !self.accept(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';'")?;

        let stmnt = VarDeclStmntId(self.program.var_decl_stmnts.len() as u32);
        self.program.var_decl_stmnts.push(VarDeclStmnt {
            id: self.counter.next(),
            span,
            var_type,
            var_decls,
            is_input: flags.is_input,
            is_output: flags.is_output,
            is_uniform: flags.is_uniform,
            type_modifiers: flags.type_modifiers,
            storage_classes: flags.storage_classes,
        });
        Ok(stmnt)
    }

    fn parse_decl_flags(&mut self) -> Flags {
        let mut flags = Flags::default();
        loop {
            if self.accept_keyword("in") {
                flags.is_input = true;
            } else if self.accept_keyword("out") {
                flags.is_output = true;
            } else if self.accept_keyword("inout") {
                flags.is_input = true;
                flags.is_output = true;
            } else if self.accept_keyword("uniform") {
                flags.is_uniform = true;
            } else if self.accept_keyword("const") {
                flags.type_modifiers.push(TypeModifier::Const);
            } else if self.accept_keyword("row_major") {
                flags.type_modifiers.push(TypeModifier::RowMajor);
            } else if self.accept_keyword("column_major") {
                flags.type_modifiers.push(TypeModifier::ColumnMajor);
            } else if self.accept_keyword("static") {
                flags.storage_classes.push(StorageClass::Static);
            } else if self.accept_keyword("groupshared") {
                flags.storage_classes.push(StorageClass::GroupShared);
            } else {
                return flags;
            }
        }
    }

    /* --- Statements --- */

    fn parse_code_block(&mut self) -> PResult<CodeBlock> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut stmnts = Vec::new();
        while !self.accept(&TokenKind::RBrace) {
            if self.peek().is_none() {
                self.error("unexpected end of code block");
                return Err(ParseFailure);
            }
            match self.parse_stmnt() {
                Ok(stmnt) => stmnts.push(stmnt),
                Err(ParseFailure) => self.skip_to_boundary(),
            }
        }
        Ok(CodeBlock { stmnts })
    }

    fn parse_stmnt(&mut self) -> PResult<Stmnt> {
        let comments = self.pending_comments();
        let span = self.span();
        let kind = self.parse_stmnt_kind()?;
        Ok(Stmnt {
            span,
            comments,
            kind,
        })
    }

    fn parse_stmnt_kind(&mut self) -> PResult<StmntKind> {
        let span = self.span();

        if self.accept(&TokenKind::Semicolon) {
            return Ok(StmntKind::Null);
        }
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBrace)) {
            return Ok(StmntKind::CodeBlock(self.parse_code_block()?));
        }

        match self.peek_ident() {
            Some("return") => {
                self.advance();
                let expr = if self.accept(&TokenKind::Semicolon) {
                    None
                } else {
                    let expr = self.parse_expr()?;
                    self.expect(&TokenKind::Semicolon, "';'")?;
                    Some(expr)
                };
                return Ok(StmntKind::Return(expr));
            }
            Some("break") => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';'")?;
                return Ok(StmntKind::CtrlTransfer(CtrlTransfer::Break));
            }
            Some("continue") => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';'")?;
                return Ok(StmntKind::CtrlTransfer(CtrlTransfer::Continue));
            }
            Some("discard") => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';'")?;
                return Ok(StmntKind::CtrlTransfer(CtrlTransfer::Discard));
            }
            Some("if") => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let condition = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                let then_branch = Box::new(self.parse_stmnt()?);
                let else_branch = if self.accept_keyword("else") {
                    Some(Box::new(self.parse_stmnt()?))
                } else {
                    None
                };
                return Ok(StmntKind::If {
                    condition,
                    then_branch,
                    else_branch,
                });
            }
            Some("while") => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let condition = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                let body = Box::new(self.parse_stmnt()?);
                return Ok(StmntKind::While { condition, body });
            }
            Some("do") => {
                self.advance();
                let body = Box::new(self.parse_stmnt()?);
                if !self.accept_keyword("while") {
                    self.error("expected 'while' after do-while body");
                    return Err(ParseFailure);
                }
                self.expect(&TokenKind::LParen, "'('")?;
                let condition = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                self.expect(&TokenKind::Semicolon, "';'")?;
                return Ok(StmntKind::DoWhile { body, condition });
            }
            Some("for") => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let init = Box::new(Stmnt {
                    span,
                    comments: Vec::new(),
                    kind: self.parse_for_init()?,
                });
                let condition = if self.accept(&TokenKind::Semicolon) {
                    None
                } else {
                    let condition = self.parse_expr()?;
                    self.expect(&TokenKind::Semicolon, "';'")?;
                    Some(condition)
                };
                let iteration = if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::RParen)) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::RParen, "')'")?;
                let body = Box::new(self.parse_stmnt()?);
                return Ok(StmntKind::For {
                    init,
                    condition,
                    iteration,
                    body,
                });
            }
            Some("switch") => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let selector = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                self.expect(&TokenKind::LBrace, "'{'")?;
                let mut cases = Vec::new();
                while !self.accept(&TokenKind::RBrace) {
                    cases.push(self.parse_switch_case()?);
                }
                return Ok(StmntKind::Switch { selector, cases });
            }
            _ => {}
        }

        if self.at_var_decl_start() {
            let flags = self.parse_decl_flags();
            let var_type = self.parse_var_type()?;
            let stmnt = self.parse_var_decl_stmnt_with(span, var_type, flags)?;
            return Ok(StmntKind::VarDecl(stmnt));
        }

        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(StmntKind::Expr(expr))
    }

    fn parse_for_init(&mut self) -> PResult<StmntKind> {
        if self.accept(&TokenKind::Semicolon) {
            return Ok(StmntKind::Null);
        }
        if self.at_var_decl_start() {
            let span = self.span();
            let flags = self.parse_decl_flags();
            let var_type = self.parse_var_type()?;
            let stmnt = self.parse_var_decl_stmnt_with(span, var_type, flags)?;
            return Ok(StmntKind::VarDecl(stmnt));
        }
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(StmntKind::Expr(expr))
    }

    fn parse_switch_case(&mut self) -> PResult<SwitchCase> {
        let span = self.span();
        let expr = if self.accept_keyword("case") {
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::Colon, "':'")?;
            Some(expr)
        } else if self.accept_keyword("default") {
            self.expect(&TokenKind::Colon, "':'")?;
            None
        } else {
            self.error("expected 'case' or 'default'");
            return Err(ParseFailure);
        };

        let mut stmnts = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                None | Some(TokenKind::RBrace) => break,
                Some(TokenKind::Ident(name)) if name == "case" || name == "default" => break,
                _ => match self.parse_stmnt() {
                    Ok(stmnt) => stmnts.push(stmnt),
                    Err(ParseFailure) => self.skip_to_boundary(),
                },
            }
        }
        Ok(SwitchCase { span, expr, stmnts })
    }

    /// Decide between a declaration and an expression statement:
    /// modifier keywords, base type names, `struct`, or `Ident Ident`.
    fn at_var_decl_start(&self) -> bool {
        let Some(name) = self.peek_ident() else {
            return false;
        };
        if matches!(
            name,
            "const" | "static" | "groupshared" | "uniform" | "row_major" | "column_major" | "struct"
        ) {
            return true;
        }
        if DataType::parse(name).is_some() {
            // A constructor call `float4(...)` is an expression.
            return !matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::LParen));
        }
        matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::Ident(_)))
    }

    /* --- Expressions --- */

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        let span = self.span();
        let first = self.parse_assignment_expr()?;
        if self.accept(&TokenKind::Comma) {
            let next = self.parse_expr()?;
            Ok(self.make_expr(
                span,
                ExprKind::List {
                    first: Box::new(first),
                    next: Box::new(next),
                },
            ))
        } else {
            Ok(first)
        }
    }

    fn parse_assignment_expr(&mut self) -> PResult<Expr> {
        let lhs = self.parse_ternary_expr()?;

        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Assign) => AssignOp::Set,
            Some(TokenKind::PlusAssign) => AssignOp::Add,
            Some(TokenKind::MinusAssign) => AssignOp::Sub,
            Some(TokenKind::StarAssign) => AssignOp::Mul,
            Some(TokenKind::SlashAssign) => AssignOp::Div,
            Some(TokenKind::PercentAssign) => AssignOp::Mod,
            _ => return Ok(lhs),
        };
        let op_span = self.span();
        self.advance();
        let value = self.parse_assignment_expr()?;

        match lhs.kind {
            ExprKind::Var { ident, assign: None } => Ok(Expr {
                id: lhs.id,
                span: lhs.span,
                kind: ExprKind::Var {
                    ident,
                    assign: Some((op, Box::new(value))),
                },
            }),
            _ => {
                self.reporter.error(
                    ReportKind::SyntaxError,
                    "left-hand side of assignment is not assignable",
                    op_span,
                );
                Err(ParseFailure)
            }
        }
    }

    fn parse_ternary_expr(&mut self) -> PResult<Expr> {
        let span = self.span();
        let condition = self.parse_binary_expr(0)?;
        if !self.accept(&TokenKind::Question) {
            return Ok(condition);
        }
        let then_expr = self.parse_assignment_expr()?;
        self.expect(&TokenKind::Colon, "':'")?;
        let else_expr = self.parse_assignment_expr()?;
        Ok(self.make_expr(
            span,
            ExprKind::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
        ))
    }

    fn parse_binary_expr(&mut self, min_precedence: u8) -> PResult<Expr> {
        let mut lhs = self.parse_unary_expr()?;
        loop {
            let Some((op, precedence)) = self.peek_binary_op() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            let op_span = self.span();
            self.advance();
            let rhs = self.parse_binary_expr(precedence + 1)?;
            lhs = self.make_expr(
                op_span,
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
        Ok(lhs)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8)> {
        let op = match self.peek().map(|t| &t.kind)? {
            TokenKind::Star => (BinaryOp::Mul, 10),
            TokenKind::Slash => (BinaryOp::Div, 10),
            TokenKind::Percent => (BinaryOp::Mod, 10),
            TokenKind::Plus => (BinaryOp::Add, 9),
            TokenKind::Minus => (BinaryOp::Sub, 9),
            TokenKind::ShiftLeft => (BinaryOp::ShiftLeft, 8),
            TokenKind::ShiftRight => (BinaryOp::ShiftRight, 8),
            TokenKind::Less => (BinaryOp::Less, 7),
            TokenKind::Greater => (BinaryOp::Greater, 7),
            TokenKind::LessEqual => (BinaryOp::LessEqual, 7),
            TokenKind::GreaterEqual => (BinaryOp::GreaterEqual, 7),
            TokenKind::EqualEqual => (BinaryOp::Equal, 6),
            TokenKind::NotEqual => (BinaryOp::NotEqual, 6),
            TokenKind::Amp => (BinaryOp::BitwiseAnd, 5),
            TokenKind::Caret => (BinaryOp::BitwiseXor, 4),
            TokenKind::Pipe => (BinaryOp::BitwiseOr, 3),
            TokenKind::AndAnd => (BinaryOp::LogicalAnd, 2),
            TokenKind::OrOr => (BinaryOp::LogicalOr, 1),
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary_expr(&mut self) -> PResult<Expr> {
        let span = self.span();
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Not) => Some(UnaryOp::LogicalNot),
            Some(TokenKind::Minus) => Some(UnaryOp::Negate),
            Some(TokenKind::Plus) => Some(UnaryOp::Plus),
            Some(TokenKind::Tilde) => Some(UnaryOp::BitwiseNot),
            Some(TokenKind::Inc) => Some(UnaryOp::Inc),
            Some(TokenKind::Dec) => Some(UnaryOp::Dec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary_expr()?;
            return Ok(self.make_expr(
                span,
                ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
            ));
        }
        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            let span = self.span();
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Inc) => {
                    self.advance();
                    expr = self.make_expr(
                        span,
                        ExprKind::PostUnary {
                            op: PostUnaryOp::Inc,
                            expr: Box::new(expr),
                        },
                    );
                }
                Some(TokenKind::Dec) => {
                    self.advance();
                    expr = self.make_expr(
                        span,
                        ExprKind::PostUnary {
                            op: PostUnaryOp::Dec,
                            expr: Box::new(expr),
                        },
                    );
                }
                Some(TokenKind::Dot) if !matches!(expr.kind, ExprKind::Var { .. }) => {
                    self.advance();
                    let var_ident = self.parse_var_ident()?;
                    expr = self.make_expr(
                        span,
                        ExprKind::Suffix {
                            expr: Box::new(expr),
                            var_ident,
                        },
                    );
                }
                Some(TokenKind::LBracket) if !matches!(expr.kind, ExprKind::Var { .. }) => {
                    let mut indices = Vec::new();
                    while self.accept(&TokenKind::LBracket) {
                        indices.push(self.parse_expr()?);
                        self.expect(&TokenKind::RBracket, "']'")?;
                    }
                    expr = self.make_expr(
                        span,
                        ExprKind::ArrayAccess {
                            expr: Box::new(expr),
                            indices,
                        },
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary_expr(&mut self) -> PResult<Expr> {
        let span = self.span();
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::IntLiteral(text)) => {
                self.advance();
                let scalar = if text.ends_with(['u', 'U']) {
                    ScalarType::UInt
                } else {
                    ScalarType::Int
                };
                Ok(self.make_expr(
                    span,
                    ExprKind::Literal {
                        data_type: DataType::scalar(scalar),
                        value: text,
                    },
                ))
            }
            Some(TokenKind::FloatLiteral { value, is_half }) => {
                self.advance();
                let scalar = if is_half {
                    ScalarType::Half
                } else {
                    ScalarType::Float
                };
                Ok(self.make_expr(
                    span,
                    ExprKind::Literal {
                        data_type: DataType::scalar(scalar),
                        value,
                    },
                ))
            }
            Some(TokenKind::LBrace) => self.parse_initializer_expr(),
            Some(TokenKind::LParen) => {
                // `(T)expr` cast or plain bracket expression.
                if let Some(name) = self.peek_ident_at(1) {
                    let is_cast = DataType::parse(name).is_some()
                        && matches!(self.peek_at(2).map(|t| &t.kind), Some(TokenKind::RParen));
                    if is_cast {
                        self.advance();
                        let target = self.parse_var_type()?;
                        self.expect(&TokenKind::RParen, "')'")?;
                        let expr = self.parse_unary_expr()?;
                        return Ok(self.make_expr(
                            span,
                            ExprKind::Cast {
                                target,
                                expr: Box::new(expr),
                            },
                        ));
                    }
                }
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(self.make_expr(span, ExprKind::Bracket(Box::new(inner))))
            }
            Some(TokenKind::Ident(name)) => {
                if name == "true" || name == "false" {
                    self.advance();
                    return Ok(self.make_expr(
                        span,
                        ExprKind::Literal {
                            data_type: DataType::scalar(ScalarType::Bool),
                            value: name,
                        },
                    ));
                }

                // Type constructor `float4(...)`.
                if let Some(data_type) = DataType::parse(&name) {
                    if matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::LParen)) {
                        self.advance();
                        let arguments = self.parse_call_arguments()?;
                        return Ok(self.make_expr(
                            span,
                            ExprKind::Call(FunctionCall {
                                ident: None,
                                type_ctor: Some(data_type),
                                arguments,
                                func_decl: None,
                                intrinsic: None,
                            }),
                        ));
                    }
                }

                let ident = self.parse_var_ident()?;
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
                    let arguments = self.parse_call_arguments()?;
                    return Ok(self.make_expr(
                        span,
                        ExprKind::Call(FunctionCall {
                            ident: Some(ident),
                            type_ctor: None,
                            arguments,
                            func_decl: None,
                            intrinsic: None,
                        }),
                    ));
                }
                Ok(self.make_expr(
                    span,
                    ExprKind::Var {
                        ident,
                        assign: None,
                    },
                ))
            }
            _ => {
                self.error("expected expression");
                Err(ParseFailure)
            }
        }
    }

    fn parse_call_arguments(&mut self) -> PResult<Vec<Expr>> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut arguments = Vec::new();
        if !self.accept(&TokenKind::RParen) {
            loop {
                arguments.push(self.parse_assignment_expr()?);
                if !self.accept(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "')'")?;
        }
        Ok(arguments)
    }

    fn parse_initializer_expr(&mut self) -> PResult<Expr> {
        let span = self.span();
        if !matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBrace)) {
            return self.parse_assignment_expr();
        }
        self.advance();
        let mut exprs = Vec::new();
        if !self.accept(&TokenKind::RBrace) {
            loop {
                exprs.push(self.parse_initializer_expr()?);
                if !self.accept(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace, "'}'")?;
        }
        Ok(self.make_expr(span, ExprKind::Initializer(exprs)))
    }

    fn parse_var_ident(&mut self) -> PResult<VarIdent> {
        let (ident, span) = self.expect_ident("identifier")?;
        let mut var_ident = VarIdent::new(span, ident);

        while self.accept(&TokenKind::LBracket) {
            var_ident.array_indices.push(self.parse_expr()?);
            self.expect(&TokenKind::RBracket, "']'")?;
        }

        // `.ident` continues the chain; `.Sample(...)` also ends up here
        // and is classified as a method call by the resolver.
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Dot))
            && self.peek_ident_at(1).is_some()
        {
            self.advance();
            let next = self.parse_var_ident()?;
            var_ident.next = Some(Box::new(next));
        }
        Ok(var_ident)
    }
}

#[derive(Debug, Default)]
struct Flags {
    is_input: bool,
    is_output: bool,
    is_uniform: bool,
    type_modifiers: Vec<TypeModifier>,
    storage_classes: Vec<StorageClass>,
}

fn parse_register(slot: &str) -> Option<Register> {
    let mut chars = slot.chars();
    let kind = RegisterType::from_prefix(chars.next()?)?;
    let index: u32 = chars.as_str().parse().ok()?;
    Some(Register { kind, slot: index })
}
