use crate::report::{Diagnostic, Log, ReportKind};
use crate::target::{OutputVersion, ShaderTarget};
use crate::{translate, Options, ShaderInput, ShaderOutput};
use indoc::indoc;

#[derive(Default)]
struct MemoryLog(Vec<Diagnostic>);

impl Log for MemoryLog {
    fn submit(&mut self, diagnostic: &Diagnostic) {
        self.0.push(diagnostic.clone());
    }
}

struct Translation {
    output: String,
    success: bool,
    diagnostics: Vec<Diagnostic>,
}

fn translate_with(
    source: &str,
    entry: &str,
    target: ShaderTarget,
    version: OutputVersion,
    options: Options,
) -> Translation {
    let mut input = ShaderInput::new(source, entry, target);
    let mut sink = Vec::new();
    let mut log = MemoryLog::default();
    let success = {
        let mut output = ShaderOutput {
            sink: &mut sink,
            version,
            options,
        };
        translate(&mut input, &mut output, &mut log)
    };
    Translation {
        output: String::from_utf8(sink).unwrap(),
        success,
        diagnostics: log.0,
    }
}

fn translate_source(
    source: &str,
    entry: &str,
    target: ShaderTarget,
    version: OutputVersion,
) -> Translation {
    translate_with(source, entry, target, version, Options::default())
}

fn assert_translated(translation: &Translation) {
    assert!(
        translation.success,
        "translation failed: {:?}\noutput:\n{}",
        translation.diagnostics, translation.output
    );
}

#[test]
fn test_identity_passthrough() {
    let translation = translate_source(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL330,
    );
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("#version 330"), "{}", output);
    assert!(
        output.contains("layout(location = 0) in vec4 p;"),
        "{}",
        output
    );
    assert!(output.contains("void main()"), "{}", output);
    assert!(output.contains("gl_Position = p;"), "{}", output);
}

#[test]
fn test_mul_operand_reordering() {
    let translation = translate_source(
        "float4 VS(float4 p : POSITION, float4x4 m) : SV_Position { return mul(m, p); }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL330,
    );
    assert_translated(&translation);

    let output = &translation.output;
    // Parameters without semantics lower to uniforms.
    assert!(output.contains("uniform mat4 m;"), "{}", output);
    // HLSL row-major mul becomes a swapped GLSL multiply.
    assert!(output.contains("gl_Position = p * m;"), "{}", output);
}

#[test]
fn test_clip_helper_emitted_once() {
    let source = indoc! {"
        float4 PS(float4 c : COLOR) : SV_Target
        {
            clip(c.x - 0.5);
            clip(c.y - 0.5);
            return c;
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("discard"), "{}", output);
    // One helper for the one referenced argument type.
    assert_eq!(output.matches("void clip(float x)").count(), 1, "{}", output);
    assert!(output.contains("if (x < 0.0) discard;"), "{}", output);
    assert_eq!(output.matches("clip(").count(), 3, "{}", output);
}

#[test]
fn test_clip_vector_helper() {
    let source = indoc! {"
        float4 PS(float4 c : COLOR) : SV_Target
        {
            clip(c.xyz);
            return c;
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("void clip(vec3 x)"), "{}", output);
    assert!(
        output.contains("if (any(lessThan(x, vec3(0.0)))) discard;"),
        "{}",
        output
    );
}

#[test]
fn test_compute_numthreads() {
    let source = indoc! {"
        [numthreads(8, 4, 1)]
        void CS(uint3 id : SV_DispatchThreadID)
        {
        }
    "};
    let translation = translate_source(source, "CS", ShaderTarget::Compute, OutputVersion::GLSL430);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("#version 430"), "{}", output);
    assert!(
        output.contains("layout(local_size_x=8, local_size_y=4, local_size_z=1) in;"),
        "{}",
        output
    );
}

#[test]
fn test_compute_builtin_remapping() {
    let source = indoc! {"
        RWStructuredBuffer<float> data : register(u0);

        [numthreads(64, 1, 1)]
        void CS(uint3 id : SV_DispatchThreadID)
        {
            data[id.x] = 1.0;
        }
    "};
    let translation = translate_source(source, "CS", ShaderTarget::Compute, OutputVersion::GLSL430);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("gl_GlobalInvocationID"), "{}", output);
    assert!(output.contains("buffer dataBlock"), "{}", output);
    assert!(output.contains("float data[];"), "{}", output);
    assert!(
        output.contains("data[gl_GlobalInvocationID.x] = 1.0;"),
        "{}",
        output
    );
}

#[test]
fn test_version_auto_detection() {
    // Vertex shader with user locations needs at least GLSL 330.
    let translation = translate_source(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL,
    );
    assert_translated(&translation);
    assert!(translation.output.contains("#version 330"), "{}", translation.output);

    // Compute shaders need 430.
    let translation = translate_source(
        "[numthreads(1, 1, 1)] void CS() {}",
        "CS",
        ShaderTarget::Compute,
        OutputVersion::GLSL,
    );
    assert_translated(&translation);
    assert!(translation.output.contains("#version 430"), "{}", translation.output);
}

#[test]
fn test_old_version_uses_location_extension() {
    let translation = translate_source(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL150,
    );
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("#version 150"), "{}", output);
    assert!(
        output.contains("#extension GL_ARB_explicit_attrib_location : enable"),
        "{}",
        output
    );
}

#[test]
fn test_compute_on_old_version_is_unsupported() {
    let translation = translate_source(
        "[numthreads(1, 1, 1)] void CS() {}",
        "CS",
        ShaderTarget::Compute,
        OutputVersion::GLSL330,
    );
    assert!(!translation.success);
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| d.kind == ReportKind::UnsupportedFeature));
}

#[test]
fn test_essl_rejected() {
    let translation = translate_source(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::ESSL300,
    );
    assert!(!translation.success);
    assert!(translation
        .diagnostics
        .iter()
        .any(|d| d.kind == ReportKind::UnsupportedFeature));
}

#[test]
fn test_struct_io_flattening() {
    let source = indoc! {"
        struct VSIn
        {
            float4 pos : POSITION;
            float2 uv : TEXCOORD0;
        };
        struct VSOut
        {
            float4 pos : SV_Position;
            float2 uv : TEXCOORD0;
        };

        VSOut VS(VSIn input)
        {
            VSOut output;
            output.pos = input.pos;
            output.uv = input.uv;
            return output;
        }
    "};
    let translation = translate_source(source, "VS", ShaderTarget::Vertex, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    // Inputs keep their member names, varyings are named by semantic.
    assert!(output.contains("layout(location = 0) in vec4 pos;"), "{}", output);
    assert!(output.contains("layout(location = 1) in vec2 uv;"), "{}", output);
    assert!(output.contains("out vec2 _TEXCOORD0;"), "{}", output);
    // Structs survive for the local copies; `input`/`output` collide
    // with GLSL keywords and get the mangling prefix.
    assert!(output.contains("struct VSIn"), "{}", output);
    assert!(output.contains("VSIn _input;"), "{}", output);
    assert!(output.contains("_input.pos = pos;"), "{}", output);
    assert!(output.contains("gl_Position"), "{}", output);
    assert!(output.contains("_TEXCOORD0 ="), "{}", output);
}

#[test]
fn test_fragment_builtins() {
    let source = indoc! {"
        float4 PS(float4 screen : SV_Position) : SV_Target
        {
            return screen;
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    // Fragment SV_Position input reads gl_FragCoord; the target output
    // is a generated location-0 out variable.
    assert!(output.contains("gl_FragCoord"), "{}", output);
    assert!(
        output.contains("layout(location = 0) out vec4 _fragColor;"),
        "{}",
        output
    );
    assert!(output.contains("_fragColor = gl_FragCoord;"), "{}", output);
}

#[test]
fn test_saturate_and_rcp_rewrites() {
    let source = indoc! {"
        float4 PS(float4 c : COLOR) : SV_Target
        {
            float x = saturate(c.x);
            float y = rcp(c.y);
            int n = saturate(2);
            return float4(x, y, 0.0, 1.0);
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    // Fragment inputs are renamed to their semantics for cross-stage
    // linking.
    assert!(output.contains("clamp(_COLOR.x, 0.0, 1.0)"), "{}", output);
    assert!(output.contains("(1.0 / _COLOR.y)"), "{}", output);
    // Integer saturate uses type-matched literals.
    assert!(output.contains("clamp(2, 0, 1)"), "{}", output);
}

#[test]
fn test_intrinsic_renames() {
    let source = indoc! {"
        float4 PS(float4 c : COLOR) : SV_Target
        {
            float a = frac(c.x);
            float b = lerp(c.x, c.y, 0.5);
            float d = rsqrt(c.z);
            float e = atan2(c.x, c.y);
            float f = fmod(c.x, c.y);
            return float4(a, b, d, e + f);
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("fract(_COLOR.x)"), "{}", output);
    assert!(output.contains("mix(_COLOR.x, _COLOR.y, 0.5)"), "{}", output);
    assert!(output.contains("inversesqrt(_COLOR.z)"), "{}", output);
    assert!(output.contains("atan(_COLOR.x, _COLOR.y)"), "{}", output);
    assert!(output.contains("mod(_COLOR.x, _COLOR.y)"), "{}", output);
}

#[test]
fn test_texture_sampling() {
    let source = indoc! {"
        Texture2D colorMap : register(t0);
        SamplerState linearSampler : register(s0);

        float4 PS(float2 uv : TEXCOORD0) : SV_Target
        {
            return colorMap.Sample(linearSampler, uv);
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("uniform sampler2D colorMap;"), "{}", output);
    // The sampler state vanishes into the combined sampler.
    assert!(output.contains("texture(colorMap, _TEXCOORD0)"), "{}", output);
    assert!(!output.contains("linearSampler"), "{}", output);
}

#[test]
fn test_cbuffer_becomes_uniform_block() {
    let source = indoc! {"
        cbuffer Scene : register(b0)
        {
            float4x4 viewProjection;
        };

        float4 VS(float4 p : POSITION) : SV_Position
        {
            return mul(viewProjection, p);
        }
    "};
    let translation = translate_source(source, "VS", ShaderTarget::Vertex, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("layout(std140) uniform Scene"), "{}", output);
    assert!(output.contains("mat4 viewProjection;"), "{}", output);
    assert!(output.contains("gl_Position = p * viewProjection;"), "{}", output);
}

#[test]
fn test_cbuffer_binding_on_420() {
    let source = indoc! {"
        cbuffer Scene : register(b2)
        {
            float4 tint;
        };

        float4 VS(float4 p : POSITION) : SV_Position
        {
            return p * tint;
        }
    "};
    let translation = translate_source(source, "VS", ShaderTarget::Vertex, OutputVersion::GLSL420);
    assert_translated(&translation);
    assert!(
        translation
            .output
            .contains("layout(std140, binding = 2) uniform Scene"),
        "{}",
        translation.output
    );
}

#[test]
fn test_atomic_rewrite() {
    let source = indoc! {"
        RWStructuredBuffer<uint> counters : register(u0);

        [numthreads(64, 1, 1)]
        void CS(uint3 id : SV_DispatchThreadID)
        {
            InterlockedAdd(counters[0], 1u);
            uint previous;
            InterlockedAdd(counters[1], 1u, previous);
        }
    "};
    let translation = translate_source(source, "CS", ShaderTarget::Compute, OutputVersion::GLSL430);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("atomicAdd(counters[0], 1u);"), "{}", output);
    assert!(
        output.contains("previous = atomicAdd(counters[1], 1u);"),
        "{}",
        output
    );
}

#[test]
fn test_line_marks() {
    let mut options = Options::default();
    options.line_marks = true;
    let translation = translate_with(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL330,
        options,
    );
    assert_translated(&translation);
    assert!(translation.output.contains("#line 1"), "{}", translation.output);
}

#[test]
fn test_custom_indent() {
    let mut options = Options::default();
    options.indent = "\t".to_string();
    let translation = translate_with(
        "float4 VS(float4 p : POSITION) : SV_Position { return p; }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL330,
        options,
    );
    assert_translated(&translation);
    assert!(translation.output.contains("\tgl_Position"), "{}", translation.output);
}

#[test]
fn test_empty_prefix_disables_mangling() {
    let mut options = Options::default();
    options.prefix.clear();
    let source = indoc! {"
        struct VSOut
        {
            float4 pos : SV_Position;
            float2 uv : TEXCOORD0;
        };
        VSOut VS(float4 p : POSITION)
        {
            VSOut result;
            result.pos = p;
            result.uv = p.xy;
            return result;
        }
    "};
    let translation = translate_with(
        source,
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL330,
        options,
    );
    assert_translated(&translation);
    // Varying names lose the prefix.
    assert!(translation.output.contains("out vec2 TEXCOORD0;"), "{}", translation.output);
}

#[test]
fn test_helper_function_emitted() {
    let source = indoc! {"
        float brightness(float3 color)
        {
            return dot(color, float3(0.299, 0.587, 0.114));
        }

        float4 PS(float4 c : COLOR) : SV_Target
        {
            float b = brightness(c.rgb);
            return float4(b, b, b, 1.0);
        }
    "};
    let translation = translate_source(source, "PS", ShaderTarget::Fragment, OutputVersion::GLSL330);
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("float brightness(vec3 color)"), "{}", output);
    assert!(
        output.contains("return dot(color, vec3(0.299, 0.587, 0.114));"),
        "{}",
        output
    );
    assert!(output.contains("brightness(_COLOR.rgb)"), "{}", output);
}

#[test]
fn test_builtins_match_emitted_version() {
    // gl_VertexID requires GLSL 130+; the auto-detected version must be
    // at least that.
    let translation = translate_source(
        "float4 VS(uint id : SV_VertexID) : SV_Position { float x = (float)id; return float4(x, 0.0, 0.0, 1.0); }",
        "VS",
        ShaderTarget::Vertex,
        OutputVersion::GLSL,
    );
    assert_translated(&translation);

    let output = &translation.output;
    assert!(output.contains("gl_VertexID"), "{}", output);
    let version: u32 = output
        .lines()
        .next()
        .unwrap()
        .trim_start_matches("#version ")
        .trim()
        .parse()
        .unwrap();
    assert!(version >= 130, "{}", output);
}
