use crate::analyzer::{analyze, Analysis};
use crate::ast::*;
use crate::lexer;
use crate::parser::Parser;
use crate::preprocessor::Preprocessor;
use crate::report::{ReportKind, Reporter, Severity};
use crate::resolver;
use crate::target::ShaderTarget;
use crate::ty::{DataType, ScalarType, TypeDenoter};
use indoc::indoc;

fn analyze_source(
    source: &str,
    entry: &str,
    target: ShaderTarget,
) -> (Program, Analysis, Reporter) {
    let mut reporter = Reporter::new(true);
    let preprocessed = Preprocessor::new(&[], None, &mut reporter).run(source);
    let tokens = lexer::tokenize(&preprocessed.lines, &mut reporter);
    let mut parser = Parser::new(tokens, &mut reporter);
    let mut program = parser.parse();
    resolver::resolve(&mut program, &mut reporter);
    let analysis = analyze(&mut program, entry, target, &mut reporter);
    (program, analysis, reporter)
}

fn assert_clean(reporter: &Reporter) {
    assert!(
        !reporter.has_errors(),
        "unexpected errors: {:?}",
        reporter.diagnostics()
    );
}

fn has_error(reporter: &Reporter, kind: ReportKind) -> bool {
    reporter
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Error && d.kind == kind)
}

/// Find the first call expression in the entry function's body.
fn find_call(program: &Program) -> Option<&FunctionCall> {
    for function in &program.functions {
        if let Some(body) = &function.body {
            for stmnt in &body.stmnts {
                if let Some(call) = find_call_in_stmnt(program, stmnt) {
                    return Some(call);
                }
            }
        }
    }
    None
}

fn find_call_in_stmnt<'a>(program: &'a Program, stmnt: &'a Stmnt) -> Option<&'a FunctionCall> {
    match &stmnt.kind {
        StmntKind::VarDecl(id) => {
            for &var in &program.var_decl_stmnt(*id).var_decls {
                if let Some(init) = &program.var(var).initializer {
                    if let Some(call) = find_call_in_expr(init) {
                        return Some(call);
                    }
                }
            }
            None
        }
        StmntKind::Expr(expr) | StmntKind::Return(Some(expr)) => find_call_in_expr(expr),
        StmntKind::CodeBlock(block) => block
            .stmnts
            .iter()
            .find_map(|s| find_call_in_stmnt(program, s)),
        _ => None,
    }
}

fn find_call_in_expr(expr: &Expr) -> Option<&FunctionCall> {
    match &expr.kind {
        ExprKind::Call(call) => Some(call),
        ExprKind::Binary { lhs, rhs, .. } => {
            find_call_in_expr(lhs).or_else(|| find_call_in_expr(rhs))
        }
        ExprKind::Var {
            assign: Some((_, value)),
            ..
        } => find_call_in_expr(value),
        ExprKind::Bracket(inner) | ExprKind::Cast { expr: inner, .. } => find_call_in_expr(inner),
        _ => None,
    }
}

#[test]
fn test_identity_passthrough_types() {
    let (_, analysis, reporter) = analyze_source(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
    );
    assert_clean(&reporter);
    assert!(analysis.entry.is_some());
    assert!(!analysis.table.is_empty());
}

#[test]
fn test_redefinition_in_same_scope() {
    let (_, _, reporter) = analyze_source(
        "void f() { int x; float x; } float4 VS() : SV_Position { f(); return float4(0.0, 0.0, 0.0, 1.0); }",
        "VS",
        ShaderTarget::Vertex,
    );
    assert!(has_error(&reporter, ReportKind::Redefinition));
}

#[test]
fn test_shadowing_is_allowed() {
    let (_, _, reporter) = analyze_source(
        "float4 VS() : SV_Position { int x = 1; { int x = 2; } return float4(0.0, 0.0, 0.0, 1.0); }",
        "VS",
        ShaderTarget::Vertex,
    );
    assert_clean(&reporter);
}

#[test]
fn test_unresolved_symbol() {
    let (_, _, reporter) = analyze_source(
        "float4 VS() : SV_Position { return undefined_name; }",
        "VS",
        ShaderTarget::Vertex,
    );
    assert!(has_error(&reporter, ReportKind::UnresolvedSymbol));
}

#[test]
fn test_unresolved_function() {
    let (_, _, reporter) = analyze_source(
        "float4 VS() : SV_Position { return undefined_fn(1.0); }",
        "VS",
        ShaderTarget::Vertex,
    );
    assert!(has_error(&reporter, ReportKind::UnresolvedFunction));
}

#[test]
fn test_overload_prefers_exact_match() {
    let source = indoc! {"
        float f(int x) { return 1.0; }
        float f(float x) { return 2.0; }
        float4 VS() : SV_Position
        {
            float y = f(1.0);
            return float4(y, y, y, y);
        }
    "};
    let (program, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);

    let call = find_call(&program).expect("call to f");
    let bound = call.func_decl.expect("bound overload");
    let param = program.function(bound).parameters[0];
    let param_type = program
        .var_decl_stmnt(param)
        .var_type
        .type_denoter(&program)
        .unwrap();
    // The float overload wins without any implicit conversion.
    assert!(param_type.equals(
        &TypeDenoter::Base(DataType::scalar(ScalarType::Float)),
        &program
    ));
}

#[test]
fn test_ambiguous_overload() {
    let source = indoc! {"
        float f(int x) { return 1.0; }
        float f(uint x) { return 2.0; }
        float4 VS() : SV_Position
        {
            float y = f(1.5);
            return float4(y, y, y, y);
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::AmbiguousOverload));
}

#[test]
fn test_arity_bounds_respected() {
    let source = indoc! {"
        float f(float a, float b = 1.0) { return a + b; }
        float4 VS() : SV_Position
        {
            float y = f(1.0);
            float z = f(1.0, 2.0);
            return float4(y, z, 0.0, 1.0);
        }
    "};
    let (program, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);

    let f = &program.functions[0];
    assert_eq!(f.num_min_args(&program), 1);
    assert_eq!(f.num_max_args(), 2);
}

#[test]
fn test_too_many_arguments() {
    let source = indoc! {"
        float f(float a) { return a; }
        float4 VS() : SV_Position
        {
            float y = f(1.0, 2.0);
            return float4(y, y, y, y);
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::UnresolvedFunction));
}

#[test]
fn test_non_castable_binary_is_type_mismatch() {
    let source = indoc! {"
        struct S { int a; };
        float4 VS() : SV_Position
        {
            S s;
            float x = s + 1;
            return float4(x, x, x, x);
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::TypeMismatch));
}

#[test]
fn test_intrinsic_arity_error() {
    let (_, _, reporter) = analyze_source(
        "float4 VS() : SV_Position { float d = dot(1.0); return float4(d, d, d, d); }",
        "VS",
        ShaderTarget::Vertex,
    );
    assert!(has_error(&reporter, ReportKind::InvalidIntrinsicArity));
}

#[test]
fn test_intrinsic_mul_typing() {
    let source = indoc! {"
        float4x4 m;
        float4 VS(float4 p : POSITION) : SV_Position
        {
            return mul(m, p);
        }
    "};
    let (program, analysis, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);

    // The mul call derives a float4 result.
    let vec4 = TypeDenoter::Base(DataType::vector(ScalarType::Float, 4));
    let found = analysis
        .table
        .len();
    assert!(found > 0);
    let function = program.functions.iter().find(|f| f.ident == "VS").unwrap();
    let body = function.body.as_ref().unwrap();
    let StmntKind::Return(Some(expr)) = &body.stmnts[0].kind else {
        panic!("expected return");
    };
    assert!(analysis.table.get(expr.id).unwrap().equals(&vec4, &program));
}

#[test]
fn test_struct_member_and_swizzle_types() {
    let source = indoc! {"
        struct Light { float4 color; };
        float4 VS() : SV_Position
        {
            Light light;
            light.color = float4(1.0, 1.0, 1.0, 1.0);
            float3 rgb = light.color.xyz;
            float a = light.color.a;
            return light.color;
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);
}

#[test]
fn test_struct_direct_member_access_is_error() {
    let source = indoc! {"
        struct S { int a; };
        float4 VS() : SV_Position
        {
            int x = S.a;
            return float4(0.0, 0.0, 0.0, 1.0);
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::TypeMismatch));
}

#[test]
fn test_empty_initializer_is_type_mismatch() {
    let source = indoc! {"
        float4 VS() : SV_Position
        {
            float a[2] = {};
            return float4(0.0, 0.0, 0.0, 1.0);
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::TypeMismatch));
}

#[test]
fn test_truncation_warning() {
    let source = indoc! {"
        float4 VS(float4 p : POSITION) : SV_Position
        {
            float2 uv = p;
            return p;
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(!reporter.has_errors());
    assert!(reporter
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Warning));
}

#[test]
fn test_invalid_semantic_for_stage() {
    // SV_DispatchThreadID is a compute input, not a vertex input.
    let source = "float4 VS(uint3 id : SV_DispatchThreadID) : SV_Position { return float4(0.0, 0.0, 0.0, 1.0); }";
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::InvalidSemantic));
}

#[test]
fn test_entry_point_not_found() {
    let (_, analysis, reporter) = analyze_source(
        "float4 VS() : SV_Position { return float4(0.0, 0.0, 0.0, 1.0); }",
        "Missing",
        ShaderTarget::Vertex,
    );
    assert!(analysis.entry.is_none());
    assert!(has_error(&reporter, ReportKind::UnresolvedSymbol));
}

#[test]
fn test_ternary_condition_must_be_bool_castable() {
    let source = indoc! {"
        struct S { int a; };
        float4 VS() : SV_Position
        {
            S s;
            float x = s ? 1.0 : 2.0;
            return float4(x, x, x, x);
        }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::TypeMismatch));
}

#[test]
fn test_analysis_is_deterministic() {
    // Running the analyzer twice over freshly parsed programs yields the
    // same number of memoized denoters.
    let source = indoc! {"
        float4 VS(float4 p : POSITION) : SV_Position
        {
            float s = dot(p, p);
            return p * s;
        }
    "};
    let (_, first, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);
    let (_, second, _) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_eq!(first.table.len(), second.table.len());
}

#[test]
fn test_equals_signature_is_symmetric() {
    let source = indoc! {"
        float f(int a, float b);
        float g(int a, float b) { return b; }
        float h(float a) { return a; }
        float4 VS() : SV_Position { return float4(0.0, 0.0, 0.0, 1.0); }
    "};
    let (program, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);

    let f = &program.functions[0];
    let g = &program.functions[1];
    let h = &program.functions[2];
    assert!(f.equals_signature(&program, g));
    assert!(g.equals_signature(&program, f));
    assert!(!f.equals_signature(&program, h));
    assert!(!h.equals_signature(&program, f));
}

#[test]
fn test_function_redefinition_with_same_signature() {
    let source = indoc! {"
        float f(float a) { return a; }
        float f(float a) { return a + 1.0; }
        float4 VS() : SV_Position { return float4(0.0, 0.0, 0.0, 1.0); }
    "};
    let (_, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert!(has_error(&reporter, ReportKind::Redefinition));
}

#[test]
fn test_typedef_resolution() {
    let source = indoc! {"
        typedef float4 Color;
        Color tint;
        float4 VS() : SV_Position { return tint; }
    "};
    let (program, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);

    // The alias strips to its aliased base type.
    let alias = TypeDenoter::Alias(AliasId(0));
    let resolved = alias.get(&program).unwrap();
    assert_eq!(
        resolved,
        TypeDenoter::Base(DataType::vector(ScalarType::Float, 4))
    );
}

#[test]
fn test_struct_inheritance_member_lookup() {
    let source = indoc! {"
        struct Base { float4 pos; };
        struct Derived : Base { float2 uv; };
        float4 VS() : SV_Position
        {
            Derived d;
            d.pos = float4(0.0, 0.0, 0.0, 1.0);
            d.uv = float2(0.0, 0.0);
            return d.pos;
        }
    "};
    let (program, _, reporter) = analyze_source(source, "VS", ShaderTarget::Vertex);
    assert_clean(&reporter);

    let derived = &program.structs[1];
    assert_eq!(derived.num_members(&program), 2);
    assert!(derived.fetch(&program, "pos").is_some());
    assert!(derived.fetch(&program, "uv").is_some());
    assert!(derived.fetch(&program, "missing").is_none());
}
