//! HLSL intrinsic functions: lookup, arity, result typing and the GLSL
//! rename table. Special-case rewrites (`mul`, `rcp`, `clip`, `saturate`,
//! atomics) live in the GLSL emitter; this module only describes them.

use crate::ast::Program;
use crate::ty::{DataType, ScalarType, TypeDenoter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Abs,
    Acos,
    All,
    Any,
    Asin,
    Atan,
    Atan2,
    Ceil,
    Clamp,
    Clip,
    Cos,
    Cosh,
    Cross,
    Ddx,
    Ddy,
    Degrees,
    Determinant,
    Distance,
    Dot,
    Exp,
    Exp2,
    Floor,
    Fmod,
    Frac,
    IsInf,
    IsNan,
    Length,
    Lerp,
    Log,
    Log2,
    Max,
    Min,
    Mul,
    Normalize,
    Pow,
    Radians,
    Rcp,
    Reflect,
    Refract,
    Round,
    Rsqrt,
    Saturate,
    Sign,
    Sin,
    SinCos,
    Sinh,
    SmoothStep,
    Sqrt,
    Step,
    Tan,
    Tanh,
    Tex2D,
    Transpose,

    InterlockedAdd,
    InterlockedAnd,
    InterlockedOr,
    InterlockedXor,
    InterlockedMin,
    InterlockedMax,
    InterlockedExchange,
    InterlockedCompareExchange,

    GroupMemoryBarrier,
    GroupMemoryBarrierWithGroupSync,
    DeviceMemoryBarrier,
    DeviceMemoryBarrierWithGroupSync,
    AllMemoryBarrier,
    AllMemoryBarrierWithGroupSync,

    // Object methods on texture/buffer types.
    Sample,
    SampleLevel,
    Load,
}

impl Intrinsic {
    pub fn parse(ident: &str) -> Option<Intrinsic> {
        use Intrinsic::*;
        let intrinsic = match ident {
            "abs" => Abs,
            "acos" => Acos,
            "all" => All,
            "any" => Any,
            "asin" => Asin,
            "atan" => Atan,
            "atan2" => Atan2,
            "ceil" => Ceil,
            "clamp" => Clamp,
            "clip" => Clip,
            "cos" => Cos,
            "cosh" => Cosh,
            "cross" => Cross,
            "ddx" => Ddx,
            "ddy" => Ddy,
            "degrees" => Degrees,
            "determinant" => Determinant,
            "distance" => Distance,
            "dot" => Dot,
            "exp" => Exp,
            "exp2" => Exp2,
            "floor" => Floor,
            "fmod" => Fmod,
            "frac" => Frac,
            "isinf" => IsInf,
            "isnan" => IsNan,
            "length" => Length,
            "lerp" => Lerp,
            "log" => Log,
            "log2" => Log2,
            "max" => Max,
            "min" => Min,
            "mul" => Mul,
            "normalize" => Normalize,
            "pow" => Pow,
            "radians" => Radians,
            "rcp" => Rcp,
            "reflect" => Reflect,
            "refract" => Refract,
            "round" => Round,
            "rsqrt" => Rsqrt,
            "saturate" => Saturate,
            "sign" => Sign,
            "sin" => Sin,
            "sincos" => SinCos,
            "sinh" => Sinh,
            "smoothstep" => SmoothStep,
            "sqrt" => Sqrt,
            "step" => Step,
            "tan" => Tan,
            "tanh" => Tanh,
            "tex2D" => Tex2D,
            "transpose" => Transpose,
            "InterlockedAdd" => InterlockedAdd,
            "InterlockedAnd" => InterlockedAnd,
            "InterlockedOr" => InterlockedOr,
            "InterlockedXor" => InterlockedXor,
            "InterlockedMin" => InterlockedMin,
            "InterlockedMax" => InterlockedMax,
            "InterlockedExchange" => InterlockedExchange,
            "InterlockedCompareExchange" => InterlockedCompareExchange,
            "GroupMemoryBarrier" => GroupMemoryBarrier,
            "GroupMemoryBarrierWithGroupSync" => GroupMemoryBarrierWithGroupSync,
            "DeviceMemoryBarrier" => DeviceMemoryBarrier,
            "DeviceMemoryBarrierWithGroupSync" => DeviceMemoryBarrierWithGroupSync,
            "AllMemoryBarrier" => AllMemoryBarrier,
            "AllMemoryBarrierWithGroupSync" => AllMemoryBarrierWithGroupSync,
            _ => return None,
        };
        Some(intrinsic)
    }

    /// Methods callable on texture/buffer objects (`tex.Sample(...)`).
    pub fn parse_method(ident: &str) -> Option<Intrinsic> {
        match ident {
            "Sample" => Some(Intrinsic::Sample),
            "SampleLevel" => Some(Intrinsic::SampleLevel),
            "Load" => Some(Intrinsic::Load),
            _ => None,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Intrinsic::Sample | Intrinsic::SampleLevel | Intrinsic::Load)
    }

    /// Atomics take their destination by reference.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Intrinsic::InterlockedAdd
                | Intrinsic::InterlockedAnd
                | Intrinsic::InterlockedOr
                | Intrinsic::InterlockedXor
                | Intrinsic::InterlockedMin
                | Intrinsic::InterlockedMax
                | Intrinsic::InterlockedExchange
                | Intrinsic::InterlockedCompareExchange
        )
    }

    /// Permitted argument count as `(min, max)`.
    pub fn arity(&self) -> (usize, usize) {
        use Intrinsic::*;
        match self {
            GroupMemoryBarrier | GroupMemoryBarrierWithGroupSync | DeviceMemoryBarrier
            | DeviceMemoryBarrierWithGroupSync | AllMemoryBarrier
            | AllMemoryBarrierWithGroupSync => (0, 0),

            Abs | Acos | All | Any | Asin | Atan | Ceil | Clip | Cos | Cosh | Ddx | Ddy
            | Degrees | Determinant | Exp | Exp2 | Floor | Frac | IsInf | IsNan | Length
            | Log | Log2 | Normalize | Radians | Rcp | Round | Rsqrt | Saturate | Sign | Sin
            | Sinh | Sqrt | Tan | Tanh | Transpose => (1, 1),

            Atan2 | Cross | Distance | Dot | Fmod | Max | Min | Mul | Pow | Reflect | Step
            | Tex2D => (2, 2),

            Clamp | Lerp | Refract | SinCos | SmoothStep => (3, 3),

            InterlockedAdd | InterlockedAnd | InterlockedOr | InterlockedXor | InterlockedMin
            | InterlockedMax | InterlockedExchange => (2, 3),
            InterlockedCompareExchange => (4, 4),

            Sample => (2, 3),
            SampleLevel => (3, 3),
            Load => (1, 2),
        }
    }

    /// GLSL counterpart for intrinsics that lower to a plain call.
    /// Special-cased intrinsics return their HLSL spelling; the emitter
    /// never uses this name for them.
    pub fn glsl_name(&self) -> &'static str {
        use Intrinsic::*;
        match self {
            Abs => "abs",
            Acos => "acos",
            All => "all",
            Any => "any",
            Asin => "asin",
            Atan | Atan2 => "atan",
            Ceil => "ceil",
            Clamp => "clamp",
            Clip => "clip",
            Cos => "cos",
            Cosh => "cosh",
            Cross => "cross",
            Ddx => "dFdx",
            Ddy => "dFdy",
            Degrees => "degrees",
            Determinant => "determinant",
            Distance => "distance",
            Dot => "dot",
            Exp => "exp",
            Exp2 => "exp2",
            Floor => "floor",
            Fmod => "mod",
            Frac => "fract",
            IsInf => "isinf",
            IsNan => "isnan",
            Length => "length",
            Lerp => "mix",
            Log => "log",
            Log2 => "log2",
            Max => "max",
            Min => "min",
            Mul => "mul",
            Normalize => "normalize",
            Pow => "pow",
            Radians => "radians",
            Rcp => "rcp",
            Reflect => "reflect",
            Refract => "refract",
            Round => "round",
            Rsqrt => "inversesqrt",
            Saturate => "saturate",
            Sign => "sign",
            Sin => "sin",
            SinCos => "sincos",
            Sinh => "sinh",
            SmoothStep => "smoothstep",
            Sqrt => "sqrt",
            Step => "step",
            Tan => "tan",
            Tanh => "tanh",
            Tex2D => "texture",
            Transpose => "transpose",

            InterlockedAdd => "atomicAdd",
            InterlockedAnd => "atomicAnd",
            InterlockedOr => "atomicOr",
            InterlockedXor => "atomicXor",
            InterlockedMin => "atomicMin",
            InterlockedMax => "atomicMax",
            InterlockedExchange => "atomicExchange",
            InterlockedCompareExchange => "atomicCompSwap",

            GroupMemoryBarrier => "groupMemoryBarrier",
            GroupMemoryBarrierWithGroupSync => "barrier",
            DeviceMemoryBarrier => "memoryBarrier",
            DeviceMemoryBarrierWithGroupSync => "barrier",
            AllMemoryBarrier => "memoryBarrier",
            AllMemoryBarrierWithGroupSync => "barrier",

            Sample | SampleLevel => "texture",
            Load => "texelFetch",
        }
    }

    /// Result type from the (already derived) argument types. For method
    /// intrinsics `object` is the receiver's type.
    pub fn return_type(
        &self,
        object: Option<&TypeDenoter>,
        args: &[TypeDenoter],
        program: &Program,
    ) -> Result<TypeDenoter, String> {
        use Intrinsic::*;

        let arg_base = |index: usize| -> Result<DataType, String> {
            args.get(index)
                .ok_or_else(|| format!("missing argument {} for intrinsic", index + 1))?
                .get(program)?
                .base_type()
                .ok_or_else(|| "intrinsic argument must have a primitive type".to_string())
        };

        let denoter = match self {
            // Component-wise: result type mirrors the first argument.
            Abs | Acos | Asin | Atan | Atan2 | Ceil | Clamp | Cos | Cosh | Ddx | Ddy
            | Degrees | Exp | Exp2 | Floor | Fmod | Frac | Lerp | Log | Log2 | Max | Min
            | Normalize | Pow | Radians | Rcp | Reflect | Refract | Round | Rsqrt | Saturate
            | Sin | Sinh | SmoothStep | Sqrt | Step | Tan | Tanh => {
                TypeDenoter::Base(arg_base(0)?)
            }

            All | Any => TypeDenoter::bool_(),

            IsInf | IsNan => {
                let base = arg_base(0)?;
                TypeDenoter::Base(DataType {
                    scalar: ScalarType::Bool,
                    ..base
                })
            }

            Sign => {
                let base = arg_base(0)?;
                TypeDenoter::Base(DataType {
                    scalar: ScalarType::Int,
                    ..base
                })
            }

            Dot => TypeDenoter::Base(DataType::scalar(arg_base(0)?.scalar)),

            Length | Distance | Determinant => {
                TypeDenoter::Base(DataType::scalar(ScalarType::Float))
            }

            Cross => TypeDenoter::Base(DataType::vector(arg_base(0)?.scalar, 3)),

            Transpose => {
                let base = arg_base(0)?;
                TypeDenoter::Base(DataType::matrix(base.scalar, base.cols, base.rows))
            }

            Mul => {
                let lhs = arg_base(0)?;
                let rhs = arg_base(1)?;
                mul_result_type(lhs, rhs)?
            }

            Clip | SinCos => TypeDenoter::void(),

            InterlockedAdd | InterlockedAnd | InterlockedOr | InterlockedXor | InterlockedMin
            | InterlockedMax | InterlockedExchange | InterlockedCompareExchange => {
                TypeDenoter::void()
            }

            GroupMemoryBarrier | GroupMemoryBarrierWithGroupSync | DeviceMemoryBarrier
            | DeviceMemoryBarrierWithGroupSync | AllMemoryBarrier
            | AllMemoryBarrierWithGroupSync => TypeDenoter::void(),

            Tex2D => TypeDenoter::Base(DataType::vector(ScalarType::Float, 4)),

            Sample | SampleLevel | Load => sampled_type(object, program)?,
        };
        Ok(denoter)
    }
}

/// HLSL `mul` typing: scalar x any, vector x matrix, matrix x vector and
/// matrix x matrix with matching inner dimensions.
fn mul_result_type(lhs: DataType, rhs: DataType) -> Result<TypeDenoter, String> {
    let result = if lhs.is_scalar() {
        rhs
    } else if rhs.is_scalar() {
        lhs
    } else if lhs.is_vector() && rhs.is_matrix() {
        if lhs.cols != rhs.rows {
            return Err(format!("can not multiply '{}' with '{}'", lhs, rhs));
        }
        DataType::vector(lhs.scalar, rhs.cols)
    } else if lhs.is_matrix() && rhs.is_vector() {
        if lhs.cols != rhs.cols {
            return Err(format!("can not multiply '{}' with '{}'", lhs, rhs));
        }
        DataType::vector(lhs.scalar, lhs.rows)
    } else if lhs.is_matrix() && rhs.is_matrix() {
        if lhs.cols != rhs.rows {
            return Err(format!("can not multiply '{}' with '{}'", lhs, rhs));
        }
        DataType::matrix(lhs.scalar, lhs.rows, rhs.cols)
    } else {
        // vector x vector multiplies component-wise.
        lhs
    };
    Ok(TypeDenoter::Base(result))
}

/// Element type of a texture/buffer object access; `float4` when the
/// declaration has no generic argument.
fn sampled_type(object: Option<&TypeDenoter>, program: &Program) -> Result<TypeDenoter, String> {
    let float4 = TypeDenoter::Base(DataType::vector(ScalarType::Float, 4));
    let Some(object) = object else {
        return Err("texture method call without an object".to_string());
    };
    match object.get(program)? {
        TypeDenoter::Buffer(id) => match &program.buffer(id).generic_type {
            Some(var_type) => var_type.type_denoter(program),
            None => Ok(float4),
        },
        other => Err(format!(
            "'{}' does not support texture methods",
            other.to_string(program)
        )),
    }
}
