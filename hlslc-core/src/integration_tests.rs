use crate::report::{Diagnostic, Log, ReportKind, Severity};
use crate::target::{OutputVersion, ShaderTarget};
use crate::{translate, IncludeResolver, Options, ShaderInput, ShaderOutput};
use indoc::indoc;

#[derive(Default)]
struct MemoryLog(Vec<Diagnostic>);

impl Log for MemoryLog {
    fn submit(&mut self, diagnostic: &Diagnostic) {
        self.0.push(diagnostic.clone());
    }
}

fn run_translation(input: &mut ShaderInput, options: Options) -> (String, bool, Vec<Diagnostic>) {
    let mut sink = Vec::new();
    let mut log = MemoryLog::default();
    let success = {
        let mut output = ShaderOutput {
            sink: &mut sink,
            version: OutputVersion::GLSL330,
            options,
        };
        translate(input, &mut output, &mut log)
    };
    (String::from_utf8(sink).unwrap(), success, log.0)
}

#[test]
fn test_success_flag_matches_errors() {
    let mut input = ShaderInput::new(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
    );
    let (output, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(success, "{:?}", diagnostics);
    assert!(!output.is_empty());
    assert!(diagnostics
        .iter()
        .all(|d| d.severity != Severity::Error));
}

#[test]
fn test_failed_translation_returns_false() {
    let mut input = ShaderInput::new(
        "float4 VS(float4 p : POSITION) : SV_Position { return missing; }",
        "VS",
        ShaderTarget::Vertex,
    );
    let (_, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(!success);
    assert!(diagnostics
        .iter()
        .any(|d| d.kind == ReportKind::UnresolvedSymbol));
}

#[test]
fn test_multiple_errors_surface_in_one_run() {
    let source = indoc! {"
        float4 VS(float4 p : POSITION) : SV_Position
        {
            float a = missing_one;
            float b = missing_two;
            return p;
        }
    "};
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    let (_, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(!success);
    let unresolved = diagnostics
        .iter()
        .filter(|d| d.kind == ReportKind::UnresolvedSymbol)
        .count();
    assert!(unresolved >= 2, "{:?}", diagnostics);
}

#[test]
fn test_errors_grouped_before_warnings() {
    let source = indoc! {"
        float4 VS(float4 p : POSITION) : SV_Position
        {
            float2 truncated = p;
            float bad = missing;
            return p;
        }
    "};
    let mut options = Options::default();
    options.warnings = true;
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    let (_, _, diagnostics) = run_translation(&mut input, options);

    let first_warning = diagnostics
        .iter()
        .position(|d| d.severity == Severity::Warning);
    let last_error = diagnostics
        .iter()
        .rposition(|d| d.severity == Severity::Error);
    if let (Some(first_warning), Some(last_error)) = (first_warning, last_error) {
        assert!(last_error < first_warning, "{:?}", diagnostics);
    } else {
        panic!("expected both errors and warnings: {:?}", diagnostics);
    }
}

#[test]
fn test_predefined_macros() {
    let source = "float4 VS(float4 p : POSITION) : SV_Position { return p * SCALE; }";
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    input.predefined_macros = vec![("SCALE".to_string(), Some("2.0".to_string()))];
    let (output, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(success, "{:?}", diagnostics);
    assert!(output.contains("p * 2.0"), "{}", output);
}

struct MapResolver(Vec<(&'static str, &'static str)>);

impl IncludeResolver for MapResolver {
    fn resolve(&mut self, name: &str) -> std::io::Result<String> {
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| text.to_string())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, name.to_string()))
    }
}

#[test]
fn test_include_resolution() {
    let source = indoc! {"
        #include \"common.hlsl\"

        float4 VS(float4 p : POSITION) : SV_Position
        {
            return transform(p);
        }
    "};
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    input.include_resolver = Some(Box::new(MapResolver(vec![(
        "common.hlsl",
        "float4 transform(float4 p) { return p * 2.0; }",
    )])));
    let (output, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(success, "{:?}", diagnostics);
    assert!(output.contains("vec4 transform(vec4 p)"), "{}", output);
}

#[test]
fn test_missing_include_is_io_error() {
    let source = "#include \"nope.hlsl\"\nfloat4 VS() : SV_Position { return float4(0.0, 0.0, 0.0, 1.0); }";
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    let (_, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(!success);
    assert!(diagnostics.iter().any(|d| d.kind == ReportKind::IoError));
}

#[test]
fn test_preprocess_only() {
    let source = indoc! {"
        #define WIDTH 4
        float data[WIDTH];
    "};
    let mut options = Options::default();
    options.preprocess_only = true;
    let mut input = ShaderInput::new(source, "ignored", ShaderTarget::Vertex);
    let (output, success, _) = run_translation(&mut input, options);
    assert!(success);
    assert_eq!(output.trim(), "float data[4];");
}

#[test]
fn test_comments_preserved() {
    let source = indoc! {"
        // The transform constant.
        float4x4 world;

        float4 VS(float4 p : POSITION) : SV_Position
        {
            return mul(world, p);
        }
    "};
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    let (output, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(success, "{:?}", diagnostics);
    assert!(output.contains("// The transform constant."), "{}", output);

    let mut options = Options::default();
    options.keep_comments = false;
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    let (output, _, _) = run_translation(&mut input, options);
    assert!(!output.contains("transform constant"), "{}", output);
}

#[test]
fn test_dump_ast_reaches_log() {
    let mut options = Options::default();
    options.dump_ast = true;
    let mut input = ShaderInput::new(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
    );
    let (_, success, diagnostics) = run_translation(&mut input, options);
    assert!(success);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.severity == Severity::Info && d.message.contains("VS")),
        "{:?}",
        diagnostics
    );
}

#[test]
fn test_static_global_stays_value_global() {
    let source = indoc! {"
        static float counter = 0.0;
        static const float3 up = { 0.0, 1.0, 0.0 };

        float4 VS(float4 p : POSITION) : SV_Position
        {
            return p + float4(up, counter);
        }
    "};
    let mut input = ShaderInput::new(source, "VS", ShaderTarget::Vertex);
    let (output, success, diagnostics) = run_translation(&mut input, Options::default());
    assert!(success, "{:?}", diagnostics);
    assert!(!output.contains("uniform float counter"), "{}", output);
    assert!(output.contains("float counter = 0.0;"), "{}", output);
}

#[test]
fn test_groupshared_becomes_shared() {
    let source = indoc! {"
        groupshared float tile[64];

        [numthreads(64, 1, 1)]
        void CS(uint idx : SV_GroupIndex)
        {
            tile[idx] = 0.0;
            GroupMemoryBarrierWithGroupSync();
        }
    "};
    let mut sink = Vec::new();
    let mut log = MemoryLog::default();
    let mut input = ShaderInput::new(source, "CS", ShaderTarget::Compute);
    let success = {
        let mut output = ShaderOutput {
            sink: &mut sink,
            version: OutputVersion::GLSL430,
            options: Options::default(),
        };
        translate(&mut input, &mut output, &mut log)
    };
    let output = String::from_utf8(sink).unwrap();
    assert!(success, "{:?}", log.0);
    assert!(output.contains("shared float tile[64];"), "{}", output);
    assert!(output.contains("tile[gl_LocalInvocationIndex] = 0.0;"), "{}", output);
    assert!(output.contains("barrier();"), "{}", output);
}
