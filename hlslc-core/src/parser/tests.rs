use super::Parser;
use crate::ast::*;
use crate::lexer;
use crate::preprocessor::Preprocessor;
use crate::report::Reporter;
use crate::semantic::Semantic;
use crate::ty::{DataType, ScalarType};
use indoc::indoc;

fn parse(source: &str) -> (Program, Reporter) {
    let mut reporter = Reporter::new(true);
    let preprocessed = Preprocessor::new(&[], None, &mut reporter).run(source);
    let tokens = lexer::tokenize(&preprocessed.lines, &mut reporter);
    let program = Parser::new(tokens, &mut reporter).parse();
    (program, reporter)
}

fn parse_ok(source: &str) -> Program {
    let (program, reporter) = parse(source);
    assert!(
        !reporter.has_errors(),
        "unexpected parse errors: {:?}",
        reporter.diagnostics()
    );
    program
}

/// The function body of the first function declaration.
fn first_body(program: &Program) -> &CodeBlock {
    program.functions[0].body.as_ref().expect("function body")
}

#[test]
fn test_simple_function() {
    let program = parse_ok("float4 VS(float4 p : POSITION) : SV_Position { return p; }");

    assert_eq!(program.functions.len(), 1);
    let function = &program.functions[0];
    assert_eq!(function.ident, "VS");
    assert_eq!(function.parameters.len(), 1);
    assert!(!function.is_forward_decl());
    assert_eq!(
        function.return_semantic,
        Some(Semantic::parse("SV_Position"))
    );

    let param = program.var_decl_stmnt(function.parameters[0]);
    assert_eq!(
        param.var_type.specifier,
        TypeSpecifier::Base(DataType::vector(ScalarType::Float, 4))
    );
    let var = program.var(param.var_decls[0]);
    assert_eq!(var.ident, "p");
    assert_eq!(var.semantic, Some(Semantic::parse("POSITION")));
}

#[test]
fn test_forward_declaration() {
    let program = parse_ok("float f(int x);");
    assert!(program.functions[0].is_forward_decl());
}

#[test]
fn test_struct_with_base_and_members() {
    let program = parse_ok(indoc! {"
        struct Base
        {
            float4 pos : SV_Position;
        };
        struct Derived : Base
        {
            float2 uv : TEXCOORD0;
            float3 normal, tangent;
        };
    "});

    assert_eq!(program.structs.len(), 2);
    let derived = &program.structs[1];
    assert_eq!(derived.ident, "Derived");
    assert_eq!(derived.base_name.as_deref(), Some("Base"));
    assert_eq!(derived.members.len(), 2);
    // Two declarators in one member statement.
    let second = program.var_decl_stmnt(derived.members[1]);
    assert_eq!(second.var_decls.len(), 2);
}

#[test]
fn test_anonymous_struct_var() {
    let program = parse_ok("struct { float x; } s;");
    assert_eq!(program.structs.len(), 1);
    assert!(program.structs[0].is_anonymous());
    assert_eq!(
        program.structs[0].signature_to_string(),
        "struct <anonymous>"
    );
    assert_eq!(program.globals.len(), 1);
    assert!(matches!(program.globals[0].kind, GlobalDeclKind::Var(_)));
}

#[test]
fn test_cbuffer_with_register() {
    let program = parse_ok(indoc! {"
        cbuffer Scene : register(b0)
        {
            float4x4 viewProjection;
            float4 lightDir;
        };
    "});

    assert_eq!(program.uniform_buffers.len(), 1);
    let buffer = &program.uniform_buffers[0];
    assert_eq!(buffer.ident, "Scene");
    assert_eq!(buffer.kind, UniformBufferType::ConstantBuffer);
    assert_eq!(buffer.members.len(), 2);
    assert_eq!(
        buffer.registers,
        vec![Register {
            kind: RegisterType::ConstantBuffer,
            slot: 0
        }]
    );
}

#[test]
fn test_texture_and_sampler() {
    let program = parse_ok(indoc! {"
        Texture2D<float4> colorMap : register(t0);
        SamplerState linearSampler : register(s0);
    "});

    assert_eq!(program.buffers.len(), 1);
    assert_eq!(program.buffers[0].kind, BufferType::Texture2D);
    assert!(program.buffers[0].generic_type.is_some());
    assert_eq!(program.samplers.len(), 1);
    assert_eq!(program.samplers[0].kind, SamplerType::SamplerState);
    assert_eq!(
        program.samplers[0].registers,
        vec![Register {
            kind: RegisterType::Sampler,
            slot: 0
        }]
    );
}

#[test]
fn test_structured_buffer() {
    let program = parse_ok("RWStructuredBuffer<float4> particles : register(u0);");
    assert_eq!(program.buffers[0].kind, BufferType::RwStructuredBuffer);
    assert!(program.buffers[0].kind.is_storage());
    assert!(program.buffers[0].kind.is_read_write());
}

#[test]
fn test_typedef() {
    let program = parse_ok("typedef float4 Color;");
    assert_eq!(program.aliases.len(), 1);
    assert_eq!(program.aliases[0].ident, "Color");
}

#[test]
fn test_global_var_with_array_dims() {
    let program = parse_ok("float weights[4], bias;");
    let &GlobalDeclKind::Var(id) = &program.globals[0].kind else {
        panic!("expected var decl");
    };
    let stmnt = program.var_decl_stmnt(id);
    assert_eq!(stmnt.var_decls.len(), 2);
    let weights = program.var(stmnt.var_decls[0]);
    assert_eq!(weights.array_dims.len(), 1);
    assert_eq!(
        weights.array_dims[0].as_ref().and_then(Expr::as_const_u64),
        Some(4)
    );
}

#[test]
fn test_statement_kinds() {
    let program = parse_ok(indoc! {"
        void f()
        {
            int i = 0;
            for (int k = 0; k < 4; k++) { i += k; }
            while (i < 10) i++;
            do { i--; } while (i > 0);
            if (i == 0) i = 1; else i = 2;
            switch (i)
            {
                case 1:
                    i = 3;
                    break;
                default:
                    break;
            }
            ;
        }
    "});

    let body = first_body(&program);
    assert_eq!(body.stmnts.len(), 7);
    assert!(matches!(body.stmnts[0].kind, StmntKind::VarDecl(_)));
    assert!(matches!(body.stmnts[1].kind, StmntKind::For { .. }));
    assert!(matches!(body.stmnts[2].kind, StmntKind::While { .. }));
    assert!(matches!(body.stmnts[3].kind, StmntKind::DoWhile { .. }));
    assert!(matches!(body.stmnts[4].kind, StmntKind::If { .. }));
    assert!(matches!(body.stmnts[5].kind, StmntKind::Switch { .. }));
    assert!(matches!(body.stmnts[6].kind, StmntKind::Null));

    let StmntKind::Switch { cases, .. } = &body.stmnts[5].kind else {
        panic!("expected switch");
    };
    assert_eq!(cases.len(), 2);
    assert!(!cases[0].is_default_case());
    assert!(cases[1].is_default_case());
}

#[test]
fn test_operator_precedence() {
    let program = parse_ok("void f() { int x = 1 + 2 * 3; }");
    let body = first_body(&program);
    let &StmntKind::VarDecl(id) = &body.stmnts[0].kind else {
        panic!("expected var decl");
    };
    let var = program.var(program.var_decl_stmnt(id).var_decls[0]);
    let init = var.initializer.as_ref().unwrap();

    // `1 + (2 * 3)`: the addition is the root.
    let ExprKind::Binary { op, rhs, .. } = &init.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        rhs.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_assignment_on_var_access() {
    let program = parse_ok("void f() { int x; x = 1; x += 2; }");
    let body = first_body(&program);
    let StmntKind::Expr(expr) = &body.stmnts[1].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(
        &expr.kind,
        ExprKind::Var {
            assign: Some((AssignOp::Set, _)),
            ..
        }
    ));
    let StmntKind::Expr(expr) = &body.stmnts[2].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(
        &expr.kind,
        ExprKind::Var {
            assign: Some((AssignOp::Add, _)),
            ..
        }
    ));
}

#[test]
fn test_var_ident_chain_round_trip() {
    let program = parse_ok("void f() { s.a.b = 1; }");
    let body = first_body(&program);
    let StmntKind::Expr(expr) = &body.stmnts[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Var { ident, .. } = &expr.kind else {
        panic!("expected var access");
    };
    // The printed chain mirrors the parsed structure.
    assert_eq!(ident.to_string(), "s.a.b");
    assert_eq!(ident.last().ident, "b");
}

#[test]
fn test_method_call_chain() {
    let program = parse_ok("float4 f() { return colorMap.Sample(linearSampler, uv); }");
    let body = first_body(&program);
    let StmntKind::Return(Some(expr)) = &body.stmnts[0].kind else {
        panic!("expected return");
    };
    let ExprKind::Call(call) = &expr.kind else {
        panic!("expected call");
    };
    let ident = call.ident.as_ref().unwrap();
    assert_eq!(ident.to_string(), "colorMap.Sample");
    assert_eq!(call.arguments.len(), 2);
}

#[test]
fn test_type_constructor_call() {
    let program = parse_ok("void f() { float4 v = float4(1.0, 2.0, 3.0, 4.0); }");
    let body = first_body(&program);
    let &StmntKind::VarDecl(id) = &body.stmnts[0].kind else {
        panic!("expected var decl");
    };
    let var = program.var(program.var_decl_stmnt(id).var_decls[0]);
    let ExprKind::Call(call) = &var.initializer.as_ref().unwrap().kind else {
        panic!("expected constructor call");
    };
    assert_eq!(call.type_ctor, Some(DataType::vector(ScalarType::Float, 4)));
    assert!(call.ident.is_none());
}

#[test]
fn test_cast_expression() {
    let program = parse_ok("void f() { float x = (float)1; }");
    let body = first_body(&program);
    let &StmntKind::VarDecl(id) = &body.stmnts[0].kind else {
        panic!("expected var decl");
    };
    let var = program.var(program.var_decl_stmnt(id).var_decls[0]);
    assert!(matches!(
        var.initializer.as_ref().unwrap().kind,
        ExprKind::Cast { .. }
    ));
}

#[test]
fn test_initializer_list() {
    let program = parse_ok("void f() { float a[3] = { 1.0, 2.0, 3.0 }; }");
    let body = first_body(&program);
    let &StmntKind::VarDecl(id) = &body.stmnts[0].kind else {
        panic!("expected var decl");
    };
    let var = program.var(program.var_decl_stmnt(id).var_decls[0]);
    let init = var.initializer.as_ref().unwrap();
    assert!(matches!(init.kind, ExprKind::Initializer(_)));
    assert_eq!(init.num_initializer_elements(), 3);
}

#[test]
fn test_numthreads_attribute() {
    let program = parse_ok(indoc! {"
        [numthreads(8, 4, 1)]
        void CS(uint3 id : SV_DispatchThreadID)
        {
        }
    "});
    let function = &program.functions[0];
    assert_eq!(function.attributes.len(), 1);
    assert_eq!(function.attributes[0].ident, "numthreads");
    assert_eq!(function.attributes[0].arguments.len(), 3);
    assert_eq!(function.attributes[0].arguments[0].as_const_u64(), Some(8));
}

#[test]
fn test_parameter_modifiers_and_defaults() {
    let program = parse_ok("void f(in float a, out float b, inout float c, uniform float d = 1.0) {}");
    let function = &program.functions[0];
    assert_eq!(function.parameters.len(), 4);

    let a = program.var_decl_stmnt(function.parameters[0]);
    assert!(a.is_input() && !a.is_output());
    let b = program.var_decl_stmnt(function.parameters[1]);
    assert!(b.is_output() && !b.is_input());
    let c = program.var_decl_stmnt(function.parameters[2]);
    assert!(c.is_input() && c.is_output());
    let d = program.var_decl_stmnt(function.parameters[3]);
    assert!(d.is_uniform);
    assert!(program.var(d.var_decls[0]).initializer.is_some());
}

#[test]
fn test_default_io_flags() {
    // Neither `in` nor `out` means input.
    let program = parse_ok("void f(float a) {}");
    let param = program.var_decl_stmnt(program.functions[0].parameters[0]);
    assert!(!param.is_input && !param.is_output);
    assert!(param.is_input());
    assert!(!param.is_output());
}

#[test]
fn test_const_flags() {
    let program = parse_ok("void f() { const int x = 1; }");
    let body = first_body(&program);
    let &StmntKind::VarDecl(id) = &body.stmnts[0].kind else {
        panic!("expected var decl");
    };
    assert!(program.var_decl_stmnt(id).is_const());
}

#[test]
fn test_ternary_and_comma() {
    let program = parse_ok("void f() { int x = 1 > 0 ? 1 : 2; }");
    let body = first_body(&program);
    let &StmntKind::VarDecl(id) = &body.stmnts[0].kind else {
        panic!("expected var decl");
    };
    let var = program.var(program.var_decl_stmnt(id).var_decls[0]);
    assert!(matches!(
        var.initializer.as_ref().unwrap().kind,
        ExprKind::Ternary { .. }
    ));
}

#[test]
fn test_error_recovery_reports_multiple() {
    let (_, reporter) = parse(indoc! {"
        float4 broken1 = ;
        float4 broken2 = ;
        float ok = 1.0;
    "});
    let errors = reporter
        .diagnostics()
        .iter()
        .filter(|d| d.severity == crate::report::Severity::Error)
        .count();
    assert!(errors >= 2, "expected at least two errors, got {}", errors);
}

#[test]
fn test_node_counter_advances() {
    let mut reporter = Reporter::new(true);
    let preprocessed =
        Preprocessor::new(&[], None, &mut reporter).run("void f() { int x = 1 + 2; }");
    let tokens = lexer::tokenize(&preprocessed.lines, &mut reporter);
    let mut parser = Parser::new(tokens, &mut reporter);
    let _program = parser.parse();
    let mut counter = parser.take_node_counter();
    // Ids handed out after parsing continue past the parsed nodes.
    assert!(counter.next().0 > 0);
}
