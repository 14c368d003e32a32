//! HLSL semantics (`SV_Position`, `TEXCOORD0`, ...) and their GLSL
//! builtin counterparts.

use crate::target::ShaderTarget;
use std::fmt;

/// System-value semantics recognized by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemValue {
    Position,
    Target,
    Depth,
    VertexId,
    InstanceId,
    DispatchThreadId,
    GroupId,
    GroupThreadId,
    GroupIndex,
}

impl SystemValue {
    fn spelling(&self) -> &'static str {
        match self {
            SystemValue::Position => "SV_Position",
            SystemValue::Target => "SV_Target",
            SystemValue::Depth => "SV_Depth",
            SystemValue::VertexId => "SV_VertexID",
            SystemValue::InstanceId => "SV_InstanceID",
            SystemValue::DispatchThreadId => "SV_DispatchThreadID",
            SystemValue::GroupId => "SV_GroupID",
            SystemValue::GroupThreadId => "SV_GroupThreadID",
            SystemValue::GroupIndex => "SV_GroupIndex",
        }
    }
}

/// A parsed semantic: either a system value or a user semantic, both with
/// an optional trailing index (`TEXCOORD3`, `SV_Target1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Semantic {
    System(SystemValue, u32),
    User(String, u32),
}

impl Semantic {
    /// Parse a semantic identifier. Trailing digits become the index;
    /// system-value names are matched case-insensitively as HLSL does.
    pub fn parse(ident: &str) -> Semantic {
        let trimmed = ident.trim_end_matches(|c: char| c.is_ascii_digit());
        let index: u32 = ident[trimmed.len()..].parse().unwrap_or(0);

        let lower = trimmed.to_ascii_lowercase();
        let system = match lower.as_str() {
            "sv_position" => Some(SystemValue::Position),
            "sv_target" => Some(SystemValue::Target),
            "sv_depth" => Some(SystemValue::Depth),
            "sv_vertexid" => Some(SystemValue::VertexId),
            "sv_instanceid" => Some(SystemValue::InstanceId),
            "sv_dispatchthreadid" => Some(SystemValue::DispatchThreadId),
            "sv_groupid" => Some(SystemValue::GroupId),
            "sv_groupthreadid" => Some(SystemValue::GroupThreadId),
            "sv_groupindex" => Some(SystemValue::GroupIndex),
            _ => None,
        };

        match system {
            Some(value) => Semantic::System(value, index),
            None => Semantic::User(trimmed.to_string(), index),
        }
    }

    pub fn is_system_value(&self) -> bool {
        matches!(self, Semantic::System(..))
    }

    pub fn index(&self) -> u32 {
        match self {
            Semantic::System(_, index) | Semantic::User(_, index) => *index,
        }
    }

    /// True if the semantic is valid as an input of the given stage.
    pub fn is_valid_input(&self, target: ShaderTarget) -> bool {
        match self {
            Semantic::User(..) => !target.is_compute(),
            Semantic::System(value, _) => matches!(
                (value, target),
                (SystemValue::VertexId, ShaderTarget::Vertex)
                    | (SystemValue::InstanceId, ShaderTarget::Vertex)
                    | (SystemValue::Position, ShaderTarget::Fragment)
                    | (SystemValue::DispatchThreadId, ShaderTarget::Compute)
                    | (SystemValue::GroupId, ShaderTarget::Compute)
                    | (SystemValue::GroupThreadId, ShaderTarget::Compute)
                    | (SystemValue::GroupIndex, ShaderTarget::Compute)
            ),
        }
    }

    /// True if the semantic is valid as an output of the given stage.
    pub fn is_valid_output(&self, target: ShaderTarget) -> bool {
        match self {
            Semantic::User(..) => !target.is_compute() && !target.is_fragment(),
            Semantic::System(value, _) => matches!(
                (value, target),
                (SystemValue::Position, ShaderTarget::Vertex)
                    | (SystemValue::Position, ShaderTarget::TessEval)
                    | (SystemValue::Position, ShaderTarget::Geometry)
                    | (SystemValue::Target, ShaderTarget::Fragment)
                    | (SystemValue::Depth, ShaderTarget::Fragment)
            ),
        }
    }

    /// The GLSL builtin an input with this semantic reads from, if any.
    pub fn input_builtin(&self, target: ShaderTarget) -> Option<&'static str> {
        let Semantic::System(value, _) = self else {
            return None;
        };
        match (value, target) {
            (SystemValue::Position, ShaderTarget::Fragment) => Some("gl_FragCoord"),
            (SystemValue::VertexId, _) => Some("gl_VertexID"),
            (SystemValue::InstanceId, _) => Some("gl_InstanceID"),
            (SystemValue::DispatchThreadId, _) => Some("gl_GlobalInvocationID"),
            (SystemValue::GroupId, _) => Some("gl_WorkGroupID"),
            (SystemValue::GroupThreadId, _) => Some("gl_LocalInvocationID"),
            (SystemValue::GroupIndex, _) => Some("gl_LocalInvocationIndex"),
            _ => None,
        }
    }

    /// The GLSL builtin an output with this semantic writes to, if any.
    /// `SV_Target` has no builtin: it lowers to a `layout(location = n)`
    /// fragment output.
    pub fn output_builtin(&self, _target: ShaderTarget) -> Option<&'static str> {
        let Semantic::System(value, _) = self else {
            return None;
        };
        match value {
            SystemValue::Position => Some("gl_Position"),
            SystemValue::Depth => Some("gl_FragDepth"),
            _ => None,
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantic::System(value, 0) => write!(f, "{}", value.spelling()),
            Semantic::System(value, index) => write!(f, "{}{}", value.spelling(), index),
            Semantic::User(name, 0) => write!(f, "{}", name),
            Semantic::User(name, index) => write!(f, "{}{}", name, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_system_values() {
        assert_eq!(
            Semantic::parse("SV_Position"),
            Semantic::System(SystemValue::Position, 0)
        );
        assert_eq!(
            Semantic::parse("SV_POSITION"),
            Semantic::System(SystemValue::Position, 0)
        );
        assert_eq!(
            Semantic::parse("SV_Target2"),
            Semantic::System(SystemValue::Target, 2)
        );
        assert!(Semantic::parse("SV_DispatchThreadID").is_system_value());
    }

    #[test]
    fn test_parse_user_semantics() {
        assert_eq!(
            Semantic::parse("TEXCOORD3"),
            Semantic::User("TEXCOORD".to_string(), 3)
        );
        assert_eq!(
            Semantic::parse("POSITION"),
            Semantic::User("POSITION".to_string(), 0)
        );
        assert!(!Semantic::parse("COLOR0").is_system_value());
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["SV_Position", "SV_Target1", "TEXCOORD2", "NORMAL"] {
            assert_eq!(Semantic::parse(name).to_string(), name);
        }
    }

    #[test]
    fn test_stage_validity() {
        let pos = Semantic::parse("SV_Position");
        assert!(pos.is_valid_output(ShaderTarget::Vertex));
        assert!(pos.is_valid_input(ShaderTarget::Fragment));
        assert!(!pos.is_valid_input(ShaderTarget::Vertex));

        let tid = Semantic::parse("SV_DispatchThreadID");
        assert!(tid.is_valid_input(ShaderTarget::Compute));
        assert!(!tid.is_valid_input(ShaderTarget::Fragment));
    }
}
