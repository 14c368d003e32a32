//! Shader stages and language versions.
//!
//! Output versions are encoded as tagged 32-bit integers: the lower 16
//! bits hold the numeric version, the upper 16 bits the language family
//! (0 = GLSL, 1 = ESSL, 2 = VKSL). A lower half of `0xFFFF` means
//! "auto-detect the minimum viable version".

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderTarget {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderTarget {
    pub fn is_vertex(&self) -> bool {
        matches!(self, ShaderTarget::Vertex)
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, ShaderTarget::Fragment)
    }

    pub fn is_compute(&self) -> bool {
        matches!(self, ShaderTarget::Compute)
    }
}

impl fmt::Display for ShaderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShaderTarget::Vertex => "vertex",
            ShaderTarget::TessControl => "tess-control",
            ShaderTarget::TessEval => "tess-evaluation",
            ShaderTarget::Geometry => "geometry",
            ShaderTarget::Fragment => "fragment",
            ShaderTarget::Compute => "compute",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ShaderTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertex" => Ok(ShaderTarget::Vertex),
            "fragment" => Ok(ShaderTarget::Fragment),
            "geometry" => Ok(ShaderTarget::Geometry),
            "tess-control" => Ok(ShaderTarget::TessControl),
            "tess-evaluation" => Ok(ShaderTarget::TessEval),
            "compute" => Ok(ShaderTarget::Compute),
            _ => Err(format!("invalid shader target \"{}\"", s)),
        }
    }
}

/// HLSL shader model of the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InputVersion {
    Hlsl3,
    Hlsl4,
    Hlsl5,
}

impl fmt::Display for InputVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputVersion::Hlsl3 => "HLSL3",
            InputVersion::Hlsl4 => "HLSL4",
            InputVersion::Hlsl5 => "HLSL5",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for InputVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HLSL3" => Ok(InputVersion::Hlsl3),
            "HLSL4" => Ok(InputVersion::Hlsl4),
            "HLSL5" => Ok(InputVersion::Hlsl5),
            _ => Err(format!("invalid input shader version \"{}\"", s)),
        }
    }
}

const FAMILY_GLSL: u32 = 0x0000;
const FAMILY_ESSL: u32 = 0x0001;
const FAMILY_VKSL: u32 = 0x0002;
const VERSION_AUTO: u32 = 0xFFFF;

/// Output language and version, with the tagged 32-bit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputVersion(u32);

impl OutputVersion {
    pub const GLSL110: OutputVersion = OutputVersion::glsl(110);
    pub const GLSL120: OutputVersion = OutputVersion::glsl(120);
    pub const GLSL130: OutputVersion = OutputVersion::glsl(130);
    pub const GLSL140: OutputVersion = OutputVersion::glsl(140);
    pub const GLSL150: OutputVersion = OutputVersion::glsl(150);
    pub const GLSL330: OutputVersion = OutputVersion::glsl(330);
    pub const GLSL400: OutputVersion = OutputVersion::glsl(400);
    pub const GLSL410: OutputVersion = OutputVersion::glsl(410);
    pub const GLSL420: OutputVersion = OutputVersion::glsl(420);
    pub const GLSL430: OutputVersion = OutputVersion::glsl(430);
    pub const GLSL440: OutputVersion = OutputVersion::glsl(440);
    pub const GLSL450: OutputVersion = OutputVersion::glsl(450);
    /// Auto-detect the minimum viable GLSL version.
    pub const GLSL: OutputVersion = OutputVersion(VERSION_AUTO);

    pub const ESSL100: OutputVersion = OutputVersion::essl(100);
    pub const ESSL300: OutputVersion = OutputVersion::essl(300);
    pub const ESSL310: OutputVersion = OutputVersion::essl(310);
    pub const ESSL320: OutputVersion = OutputVersion::essl(320);
    pub const ESSL: OutputVersion = OutputVersion((FAMILY_ESSL << 16) | VERSION_AUTO);

    pub const VKSL450: OutputVersion = OutputVersion::vksl(450);
    pub const VKSL: OutputVersion = OutputVersion((FAMILY_VKSL << 16) | VERSION_AUTO);

    const fn glsl(version: u32) -> Self {
        OutputVersion((FAMILY_GLSL << 16) | version)
    }

    const fn essl(version: u32) -> Self {
        OutputVersion((FAMILY_ESSL << 16) | version)
    }

    const fn vksl(version: u32) -> Self {
        OutputVersion((FAMILY_VKSL << 16) | version)
    }

    /// Numeric version in the lower 16 bits; `0xFFFF` means auto-detect.
    pub fn value(&self) -> u32 {
        self.0 & 0xFFFF
    }

    pub fn family(&self) -> u32 {
        self.0 >> 16
    }

    pub fn is_auto(&self) -> bool {
        self.value() == VERSION_AUTO
    }

    pub fn is_glsl(&self) -> bool {
        self.family() == FAMILY_GLSL
    }

    pub fn is_essl(&self) -> bool {
        self.family() == FAMILY_ESSL
    }

    pub fn is_vksl(&self) -> bool {
        self.family() == FAMILY_VKSL
    }
}

impl fmt::Display for OutputVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self.family() {
            FAMILY_GLSL => "GLSL",
            FAMILY_ESSL => "ESSL",
            FAMILY_VKSL => "VKSL",
            _ => "?",
        };
        if self.is_auto() {
            write!(f, "{}", family)
        } else {
            write!(f, "{}{}", family, self.value())
        }
    }
}

impl FromStr for OutputVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = match s {
            "GLSL110" => Self::GLSL110,
            "GLSL120" => Self::GLSL120,
            "GLSL130" => Self::GLSL130,
            "GLSL140" => Self::GLSL140,
            "GLSL150" => Self::GLSL150,
            "GLSL330" => Self::GLSL330,
            "GLSL400" => Self::GLSL400,
            "GLSL410" => Self::GLSL410,
            "GLSL420" => Self::GLSL420,
            "GLSL430" => Self::GLSL430,
            "GLSL440" => Self::GLSL440,
            "GLSL450" => Self::GLSL450,
            "GLSL" => Self::GLSL,
            "ESSL100" => Self::ESSL100,
            "ESSL300" => Self::ESSL300,
            "ESSL310" => Self::ESSL310,
            "ESSL320" => Self::ESSL320,
            "ESSL" => Self::ESSL,
            "VKSL450" => Self::VKSL450,
            "VKSL" => Self::VKSL,
            _ => return Err(format!("invalid output shader version \"{}\"", s)),
        };
        Ok(version)
    }
}

/// Features that raise the minimum GLSL version of the emitted shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFeature {
    /// `layout(location = n)` on in/out globals.
    ExplicitLocations,
    /// `gl_InstanceID` input.
    InstanceId,
    /// Geometry shader stage.
    GeometryStage,
    /// Tessellation stages.
    TessellationStage,
    /// `layout(binding = n)` on blocks and samplers.
    ExplicitBindings,
    /// Compute stage, storage buffers, atomics on buffer memory.
    ComputeStage,
    /// `layout(early_fragment_tests)`.
    EarlyFragmentTests,
}

impl VersionFeature {
    /// Minimum GLSL version supporting the feature.
    pub fn min_version(&self) -> u32 {
        match self {
            VersionFeature::ExplicitLocations => 330,
            VersionFeature::InstanceId => 140,
            VersionFeature::GeometryStage => 150,
            VersionFeature::TessellationStage => 400,
            VersionFeature::ExplicitBindings => 420,
            VersionFeature::ComputeStage => 430,
            VersionFeature::EarlyFragmentTests => 420,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_encoding() {
        assert_eq!(OutputVersion::GLSL330.value(), 330);
        assert_eq!(OutputVersion::GLSL330.family(), 0);
        assert!(OutputVersion::GLSL330.is_glsl());
        assert!(!OutputVersion::GLSL330.is_auto());

        assert_eq!(OutputVersion::ESSL310.value(), 310);
        assert_eq!(OutputVersion::ESSL310.family(), 1);
        assert!(OutputVersion::ESSL310.is_essl());

        assert_eq!(OutputVersion::VKSL450.value(), 450);
        assert_eq!(OutputVersion::VKSL450.family(), 2);
        assert!(OutputVersion::VKSL450.is_vksl());

        assert!(OutputVersion::GLSL.is_auto());
        assert!(OutputVersion::VKSL.is_auto());
    }

    #[test]
    fn test_version_round_trip() {
        for name in ["GLSL130", "GLSL330", "GLSL450", "ESSL300", "VKSL450", "GLSL"] {
            let version: OutputVersion = name.parse().unwrap();
            assert_eq!(version.to_string(), name);
        }
        assert!("GLSL999".parse::<OutputVersion>().is_err());
    }

    #[test]
    fn test_target_round_trip() {
        for name in [
            "vertex",
            "fragment",
            "geometry",
            "tess-control",
            "tess-evaluation",
            "compute",
        ] {
            let target: ShaderTarget = name.parse().unwrap();
            assert_eq!(target.to_string(), name);
        }
    }
}
