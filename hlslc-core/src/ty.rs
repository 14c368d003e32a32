//! Semantic types: scalar/vector/matrix base types and type denoters.
//!
//! A type denoter is the derived type of an expression or declaration.
//! Struct, buffer, sampler and alias denoters carry arena indices into the
//! owning [`Program`]; operations that must look through those references
//! take the program as context. All operations are pure and produce new
//! denoters.

use crate::ast::{BufferId, Program, SamplerId, StructId, VarIdent};
use crate::ast::{AliasId, BufferType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Void,
    Bool,
    Int,
    UInt,
    Half,
    Float,
    Double,
}

impl ScalarType {
    pub fn parse(ident: &str) -> Option<ScalarType> {
        match ident {
            "void" => Some(ScalarType::Void),
            "bool" => Some(ScalarType::Bool),
            "int" => Some(ScalarType::Int),
            "uint" | "dword" => Some(ScalarType::UInt),
            "half" => Some(ScalarType::Half),
            "float" => Some(ScalarType::Float),
            "double" => Some(ScalarType::Double),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::UInt)
    }

    pub fn is_real(&self) -> bool {
        matches!(self, ScalarType::Half | ScalarType::Float | ScalarType::Double)
    }

    fn spelling(&self) -> &'static str {
        match self {
            ScalarType::Void => "void",
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Half => "half",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }
}

/// A primitive scalar, vector or matrix type. Scalars are 1x1, vectors a
/// single row (`float3` = 1x3), matrices `rows` x `cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    pub scalar: ScalarType,
    pub rows: u8,
    pub cols: u8,
}

impl DataType {
    pub fn scalar(scalar: ScalarType) -> Self {
        DataType {
            scalar,
            rows: 1,
            cols: 1,
        }
    }

    pub fn vector(scalar: ScalarType, size: u8) -> Self {
        DataType {
            scalar,
            rows: 1,
            cols: size,
        }
    }

    pub fn matrix(scalar: ScalarType, rows: u8, cols: u8) -> Self {
        DataType { scalar, rows, cols }
    }

    pub fn void() -> Self {
        DataType::scalar(ScalarType::Void)
    }

    pub fn is_void(&self) -> bool {
        self.scalar == ScalarType::Void
    }

    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    pub fn is_vector(&self) -> bool {
        self.rows == 1 && self.cols > 1
    }

    pub fn is_matrix(&self) -> bool {
        self.rows > 1
    }

    pub fn is_integral(&self) -> bool {
        self.scalar.is_integral()
    }

    pub fn num_components(&self) -> u32 {
        self.rows as u32 * self.cols as u32
    }

    /// Parse an HLSL type keyword: `float`, `float3`, `float4x4`, `uint2`,
    /// `bool`, `half3`, ...
    pub fn parse(ident: &str) -> Option<DataType> {
        if let Some(scalar) = ScalarType::parse(ident) {
            return Some(DataType::scalar(scalar));
        }

        let split = ident.find(|c: char| c.is_ascii_digit())?;
        let scalar = ScalarType::parse(&ident[..split])?;
        if scalar == ScalarType::Void {
            return None;
        }

        let dims = &ident[split..];
        let mut parts = dims.split('x');
        let first: u8 = parts.next()?.parse().ok()?;
        if !(1..=4).contains(&first) {
            return None;
        }
        match parts.next() {
            None => Some(DataType::vector(scalar, first)),
            Some(second) => {
                let second: u8 = second.parse().ok()?;
                if !(1..=4).contains(&second) || parts.next().is_some() {
                    return None;
                }
                Some(DataType::matrix(scalar, first, second))
            }
        }
    }

    /// The GLSL spelling of this type. `half` widens to `float`.
    pub fn to_glsl(&self) -> String {
        let scalar = match self.scalar {
            ScalarType::Half => ScalarType::Float,
            other => other,
        };
        if self.is_scalar() {
            return scalar.spelling().to_string();
        }

        let prefix = match scalar {
            ScalarType::Bool => "b",
            ScalarType::Int => "i",
            ScalarType::UInt => "u",
            ScalarType::Double => "d",
            _ => "",
        };
        if self.is_vector() {
            format!("{}vec{}", prefix, self.cols)
        } else if self.rows == self.cols {
            format!("{}mat{}", prefix, self.rows)
        } else {
            format!("{}mat{}x{}", prefix, self.rows, self.cols)
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scalar() {
            write!(f, "{}", self.scalar.spelling())
        } else if self.is_vector() {
            write!(f, "{}{}", self.scalar.spelling(), self.cols)
        } else {
            write!(f, "{}{}x{}", self.scalar.spelling(), self.rows, self.cols)
        }
    }
}

/// Type of a swizzle access (`v.xyz`) on a scalar or vector type.
pub fn swizzle_type(base: DataType, swizzle: &str) -> Result<DataType, String> {
    if base.is_matrix() {
        return Err(format!("invalid swizzle '{}' on matrix type", swizzle));
    }
    if swizzle.is_empty() || swizzle.len() > 4 {
        return Err(format!("invalid swizzle '{}'", swizzle));
    }

    let xyzw = ['x', 'y', 'z', 'w'];
    let rgba = ['r', 'g', 'b', 'a'];
    let set = if swizzle.chars().all(|c| xyzw.contains(&c)) {
        &xyzw
    } else if swizzle.chars().all(|c| rgba.contains(&c)) {
        &rgba
    } else {
        return Err(format!("invalid swizzle '{}'", swizzle));
    };

    for c in swizzle.chars() {
        let index = set.iter().position(|&s| s == c).unwrap() as u8;
        if index >= base.cols {
            return Err(format!(
                "swizzle component '{}' out of range for '{}'",
                c, base
            ));
        }
    }

    let size = swizzle.len() as u8;
    if size == 1 {
        Ok(DataType::scalar(base.scalar))
    } else {
        Ok(DataType::vector(base.scalar, size))
    }
}

/* ----- TypeDenoter ----- */

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDenoter {
    Base(DataType),
    Array {
        element: Box<TypeDenoter>,
        /// One entry per dimension; `None` = unsized.
        dims: Vec<Option<u64>>,
    },
    Struct(StructId),
    Buffer(BufferId),
    Sampler(SamplerId),
    Alias(AliasId),
}

impl TypeDenoter {
    pub fn void() -> Self {
        TypeDenoter::Base(DataType::void())
    }

    pub fn bool_() -> Self {
        TypeDenoter::Base(DataType::scalar(ScalarType::Bool))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeDenoter::Base(data_type) if data_type.is_void())
    }

    pub fn base_type(&self) -> Option<DataType> {
        match self {
            TypeDenoter::Base(data_type) => Some(*data_type),
            _ => None,
        }
    }

    /// Strip alias indirection.
    pub fn get(&self, program: &Program) -> Result<TypeDenoter, String> {
        match self {
            TypeDenoter::Alias(id) => program
                .alias(*id)
                .aliased_type_denoter(program)?
                .get(program),
            other => Ok(other.clone()),
        }
    }

    /// Wrap in an array denoter; a no-op for an empty dimension list.
    pub fn as_array(&self, dims: &[Option<u64>]) -> TypeDenoter {
        if dims.is_empty() {
            self.clone()
        } else {
            TypeDenoter::Array {
                element: Box::new(self.clone()),
                dims: dims.to_vec(),
            }
        }
    }

    /// Structural equality. Alias indirection is looked through; array
    /// ranks must agree and sizes must agree where both are known.
    pub fn equals(&self, other: &TypeDenoter, program: &Program) -> bool {
        let (Ok(lhs), Ok(rhs)) = (self.get(program), other.get(program)) else {
            return false;
        };
        match (&lhs, &rhs) {
            (TypeDenoter::Base(a), TypeDenoter::Base(b)) => a == b,
            (TypeDenoter::Struct(a), TypeDenoter::Struct(b)) => a == b,
            (TypeDenoter::Buffer(a), TypeDenoter::Buffer(b)) => a == b,
            (TypeDenoter::Sampler(a), TypeDenoter::Sampler(b)) => a == b,
            (
                TypeDenoter::Array {
                    element: lhs_element,
                    dims: lhs_dims,
                },
                TypeDenoter::Array {
                    element: rhs_element,
                    dims: rhs_dims,
                },
            ) => {
                lhs_dims.len() == rhs_dims.len()
                    && lhs_dims.iter().zip(rhs_dims).all(|(a, b)| match (a, b) {
                        (Some(a), Some(b)) => a == b,
                        _ => true,
                    })
                    && lhs_element.equals(rhs_element, program)
            }
            _ => false,
        }
    }

    /// HLSL implicit conversion rules: scalar widening, scalar splat,
    /// truncation of vectors and matrices (legal, warned elsewhere),
    /// structs only when identical, arrays by element type and rank.
    pub fn is_castable_to(&self, target: &TypeDenoter, program: &Program) -> bool {
        if self.equals(target, program) {
            return true;
        }
        let (Ok(src), Ok(dst)) = (self.get(program), target.get(program)) else {
            return false;
        };
        match (&src, &dst) {
            (TypeDenoter::Base(a), TypeDenoter::Base(b)) => {
                if a.is_void() || b.is_void() {
                    return false;
                }
                if a.is_scalar() {
                    // Scalars widen and splat to anything numeric.
                    true
                } else if b.is_scalar() {
                    // Vector and matrix truncation to scalar.
                    true
                } else if a.is_vector() && b.is_vector() {
                    b.cols <= a.cols
                } else if a.is_matrix() && b.is_matrix() {
                    b.rows <= a.rows && b.cols <= a.cols
                } else {
                    false
                }
            }
            (TypeDenoter::Struct(a), TypeDenoter::Struct(b)) => a == b,
            (
                TypeDenoter::Array {
                    element: src_element,
                    dims: src_dims,
                },
                TypeDenoter::Array {
                    element: dst_element,
                    dims: dst_dims,
                },
            ) => {
                src_dims.len() == dst_dims.len()
                    && src_dims.iter().zip(dst_dims).all(|(a, b)| match (a, b) {
                        (Some(a), Some(b)) => a == b,
                        _ => true,
                    })
                    && src_element.is_castable_to(dst_element, program)
            }
            _ => false,
        }
    }

    /// True if converting to `target` drops vector or matrix components
    /// (legal in HLSL, but reported as a warning).
    pub fn truncates_to(&self, target: &TypeDenoter, program: &Program) -> bool {
        let (Ok(src), Ok(dst)) = (self.get(program), target.get(program)) else {
            return false;
        };
        match (src.base_type(), dst.base_type()) {
            (Some(a), Some(b)) => !a.is_scalar() && b.num_components() < a.num_components(),
            _ => false,
        }
    }

    /// Peel `num_indices` array (or matrix/vector) dimensions, then
    /// optionally descend one member access.
    pub fn get_from_array(
        &self,
        num_indices: usize,
        next: Option<&VarIdent>,
        program: &Program,
    ) -> Result<TypeDenoter, String> {
        let mut denoter = self.get(program)?;
        for _ in 0..num_indices {
            denoter = match denoter {
                TypeDenoter::Array { element, dims } => {
                    if dims.len() > 1 {
                        TypeDenoter::Array {
                            element,
                            dims: dims[1..].to_vec(),
                        }
                    } else {
                        element.get(program)?
                    }
                }
                TypeDenoter::Base(data_type) if data_type.is_matrix() => {
                    TypeDenoter::Base(DataType::vector(data_type.scalar, data_type.cols))
                }
                TypeDenoter::Base(data_type) if data_type.is_vector() => {
                    TypeDenoter::Base(DataType::scalar(data_type.scalar))
                }
                // Indexing a buffer object yields its element type.
                TypeDenoter::Buffer(id) => match &program.buffer(id).generic_type {
                    Some(var_type) => var_type.type_denoter(program)?.get(program)?,
                    None => TypeDenoter::Base(DataType::vector(ScalarType::Float, 4)),
                },
                other => {
                    return Err(format!(
                        "array access to non-array type '{}'",
                        other.to_string(program)
                    ))
                }
            };
        }
        match next {
            Some(ident) => denoter.get_member(ident, program),
            None => Ok(denoter),
        }
    }

    /// Descend a member access (struct field or vector swizzle), applying
    /// the segment's own array indices and chain tail.
    pub fn get_member(&self, ident: &VarIdent, program: &Program) -> Result<TypeDenoter, String> {
        let denoter = self.get(program)?;
        match denoter {
            TypeDenoter::Struct(id) => {
                let struct_decl = program.struct_(id);
                let var = struct_decl.fetch(program, &ident.ident).ok_or_else(|| {
                    format!(
                        "undeclared member '{}' in '{}'",
                        ident.ident,
                        struct_decl.signature_to_string()
                    )
                })?;
                program.var_type_denoter(var)?.get_from_array(
                    ident.array_indices.len(),
                    ident.next.as_deref(),
                    program,
                )
            }
            TypeDenoter::Base(data_type) => {
                let swizzled = swizzle_type(data_type, &ident.ident)?;
                TypeDenoter::Base(swizzled).get_from_array(
                    ident.array_indices.len(),
                    ident.next.as_deref(),
                    program,
                )
            }
            other => Err(format!(
                "type '{}' has no member '{}'",
                other.to_string(program),
                ident.ident
            )),
        }
    }

    pub fn to_string(&self, program: &Program) -> String {
        match self {
            TypeDenoter::Base(data_type) => data_type.to_string(),
            TypeDenoter::Array { element, dims } => {
                let mut s = element.to_string(program);
                for dim in dims {
                    match dim {
                        Some(size) => s += &format!("[{}]", size),
                        None => s += "[]",
                    }
                }
                s
            }
            TypeDenoter::Struct(id) => program.struct_(*id).signature_to_string(),
            TypeDenoter::Buffer(id) => {
                let buffer = program.buffer(*id);
                match buffer.kind {
                    BufferType::Texture1D => "Texture1D".to_string(),
                    BufferType::Texture2D => "Texture2D".to_string(),
                    BufferType::Texture3D => "Texture3D".to_string(),
                    BufferType::TextureCube => "TextureCube".to_string(),
                    _ => format!("{:?}", buffer.kind),
                }
            }
            TypeDenoter::Sampler(_) => "SamplerState".to_string(),
            TypeDenoter::Alias(id) => program.alias(*id).ident.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float() -> TypeDenoter {
        TypeDenoter::Base(DataType::scalar(ScalarType::Float))
    }

    fn float_n(n: u8) -> TypeDenoter {
        TypeDenoter::Base(DataType::vector(ScalarType::Float, n))
    }

    #[test]
    fn test_parse_data_types() {
        assert_eq!(DataType::parse("float"), Some(DataType::scalar(ScalarType::Float)));
        assert_eq!(
            DataType::parse("float3"),
            Some(DataType::vector(ScalarType::Float, 3))
        );
        assert_eq!(
            DataType::parse("float4x4"),
            Some(DataType::matrix(ScalarType::Float, 4, 4))
        );
        assert_eq!(
            DataType::parse("uint2"),
            Some(DataType::vector(ScalarType::UInt, 2))
        );
        assert_eq!(DataType::parse("float5"), None);
        assert_eq!(DataType::parse("foo"), None);
        assert_eq!(DataType::parse("void"), Some(DataType::void()));
    }

    #[test]
    fn test_glsl_spelling() {
        assert_eq!(DataType::parse("float4").unwrap().to_glsl(), "vec4");
        assert_eq!(DataType::parse("int3").unwrap().to_glsl(), "ivec3");
        assert_eq!(DataType::parse("float4x4").unwrap().to_glsl(), "mat4");
        assert_eq!(DataType::parse("float2x3").unwrap().to_glsl(), "mat2x3");
        assert_eq!(DataType::parse("half2").unwrap().to_glsl(), "vec2");
        assert_eq!(DataType::parse("bool").unwrap().to_glsl(), "bool");
    }

    #[test]
    fn test_castable_reflexive() {
        let program = Program::new();
        for denoter in [
            float(),
            float_n(4),
            TypeDenoter::Base(DataType::matrix(ScalarType::Float, 4, 4)),
            float().as_array(&[Some(3)]),
            float().as_array(&[None]),
        ] {
            assert!(denoter.is_castable_to(&denoter, &program), "{:?}", denoter);
        }
    }

    #[test]
    fn test_scalar_splat_and_truncation() {
        let program = Program::new();
        assert!(float().is_castable_to(&float_n(4), &program));
        assert!(float_n(4).is_castable_to(&float(), &program));
        assert!(float_n(4).is_castable_to(&float_n(2), &program));
        assert!(!float_n(2).is_castable_to(&float_n(4), &program));

        assert!(float_n(4).truncates_to(&float_n(2), &program));
        assert!(!float().truncates_to(&float_n(4), &program));
    }

    #[test]
    fn test_void_not_castable() {
        let program = Program::new();
        assert!(!TypeDenoter::void().is_castable_to(&float(), &program));
        assert!(!float().is_castable_to(&TypeDenoter::void(), &program));
    }

    #[test]
    fn test_array_peeling() {
        let program = Program::new();
        let arr = float_n(4).as_array(&[Some(8), Some(2)]);
        let peeled = arr.get_from_array(1, None, &program).unwrap();
        assert_eq!(peeled, float_n(4).as_array(&[Some(2)]));
        let full = arr.get_from_array(2, None, &program).unwrap();
        assert_eq!(full, float_n(4));
        // Indexing continues into the vector itself.
        let component = arr.get_from_array(3, None, &program).unwrap();
        assert_eq!(component, float());
        assert!(arr.get_from_array(4, None, &program).is_err());
    }

    #[test]
    fn test_swizzle() {
        let vec4 = DataType::vector(ScalarType::Float, 4);
        assert_eq!(
            swizzle_type(vec4, "xyz").unwrap(),
            DataType::vector(ScalarType::Float, 3)
        );
        assert_eq!(swizzle_type(vec4, "w").unwrap(), DataType::scalar(ScalarType::Float));
        assert_eq!(
            swizzle_type(vec4, "rgba").unwrap(),
            DataType::vector(ScalarType::Float, 4)
        );
        let vec2 = DataType::vector(ScalarType::Float, 2);
        assert!(swizzle_type(vec2, "z").is_err());
        assert!(swizzle_type(vec4, "xq").is_err());
    }
}
