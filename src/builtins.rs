//! Built-in variables and functions, available to every effect program.
//!
//! These tables are immutable statics, shared by every compilation.

use crate::{
    symbols::{Qualifier, Signature},
    types::{BaseType, Type},
};

#[derive(Debug, PartialEq, Eq)]
pub struct BuiltinVar {
    pub name: &'static str,
    pub ty: Type,
    pub qualifier: Qualifier,
}

pub static VARIABLES: &[BuiltinVar] = &[
    // Texture coordinates of the primary and secondary inputs.
    BuiltinVar {
        name: "pos0",
        ty: Type::Float2,
        qualifier: Qualifier::Input,
    },
    BuiltinVar {
        name: "pos1",
        ty: Type::Float2,
        qualifier: Qualifier::Input,
    },
    // Window-space coordinate of the current pixel.
    BuiltinVar {
        name: "pixcoord",
        ty: Type::Float2,
        qualifier: Qualifier::Input,
    },
    BuiltinVar {
        name: "jsl_vertexColor",
        ty: Type::Float4,
        qualifier: Qualifier::Input,
    },
    // The pixel being produced.
    BuiltinVar {
        name: "color",
        ty: Type::Float4,
        qualifier: Qualifier::Output,
    },
];

/// The overload family of a built-in function. `G` stands for any of
/// `float`, `float2`, `float3` and `float4`.
#[derive(Debug, PartialEq, Eq)]
pub enum Family {
    /// `G f(G)`
    Map1,
    /// `G f(G, G)`
    Map2,
    /// `G f(G, G)` and `G f(G, float)`
    Map2Scalar,
    /// `G f(G, G, G)` and `G f(G, float, float)`
    Clamp,
    /// `G f(G, G, G)` and `G f(G, G, float)`
    Mix,
    /// `G f(G, G, G)` and `G f(float, float, G)`
    SmoothStep,
    /// `float f(G)`
    Reduce1,
    /// `float f(G, G)`
    Reduce2,
    /// A single, fixed signature.
    Fixed {
        params: &'static [Type],
        ret: Type,
    },
    /// `float4 f(S, float2)` for every sampler type `S`.
    Sample,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    pub family: Family,
}

const GEN_TYPES: [Type; 4] = [Type::Float, Type::Float2, Type::Float3, Type::Float4];

const SAMPLERS: [Type; 3] = [Type::Sampler, Type::LSampler, Type::FSampler];

impl Builtin {
    /// Expands the family into its concrete signatures.
    pub fn overloads(&self) -> Vec<Signature> {
        let sig = |params: &[Type], ret: Type| Signature {
            params: params.to_vec(),
            ret,
        };
        let f = Type::Float;
        let mut out = Vec::with_capacity(8);
        match &self.family {
            Family::Map1 => out.extend(GEN_TYPES.map(|g| sig(&[g], g))),
            Family::Map2 => out.extend(GEN_TYPES.map(|g| sig(&[g, g], g))),
            Family::Map2Scalar => {
                out.extend(GEN_TYPES.map(|g| sig(&[g, g], g)));
                out.extend(GEN_TYPES[1..].iter().map(|&g| sig(&[g, f], g)));
            }
            Family::Clamp => {
                out.extend(GEN_TYPES.map(|g| sig(&[g, g, g], g)));
                out.extend(GEN_TYPES[1..].iter().map(|&g| sig(&[g, f, f], g)));
            }
            Family::Mix => {
                out.extend(GEN_TYPES.map(|g| sig(&[g, g, g], g)));
                out.extend(GEN_TYPES[1..].iter().map(|&g| sig(&[g, g, f], g)));
            }
            Family::SmoothStep => {
                out.extend(GEN_TYPES.map(|g| sig(&[g, g, g], g)));
                out.extend(GEN_TYPES[1..].iter().map(|&g| sig(&[f, f, g], g)));
            }
            Family::Reduce1 => out.extend(GEN_TYPES.map(|g| sig(&[g], f))),
            Family::Reduce2 => out.extend(GEN_TYPES.map(|g| sig(&[g, g], f))),
            Family::Fixed { params, ret } => out.push(sig(params, *ret)),
            Family::Sample => {
                out.extend(SAMPLERS.map(|s| sig(&[s, Type::Float2], Type::Float4)));
            }
        }
        debug_assert!(out
            .iter()
            .all(|s| s.params.iter().all(|p| p.base() != BaseType::Void)));
        out
    }
}

pub fn function(name: &str) -> Option<&'static Builtin> {
    FUNCTIONS.iter().find(|b| b.name == name)
}

pub fn variable(name: &str) -> Option<&'static BuiltinVar> {
    VARIABLES.iter().find(|v| v.name == name)
}

macro_rules! builtins {
    ($($name:literal => $family:expr),* $(,)?) => {
        &[$(Builtin { name: $name, family: $family }),*]
    };
}

pub static FUNCTIONS: &[Builtin] = builtins! {
    "abs" => Family::Map1,
    "sign" => Family::Map1,
    "floor" => Family::Map1,
    "ceil" => Family::Map1,
    "fract" => Family::Map1,
    "sqrt" => Family::Map1,
    "inversesqrt" => Family::Map1,
    "sin" => Family::Map1,
    "cos" => Family::Map1,
    "tan" => Family::Map1,
    "asin" => Family::Map1,
    "acos" => Family::Map1,
    "atan" => Family::Map1,
    "exp" => Family::Map1,
    "log" => Family::Map1,
    "exp2" => Family::Map1,
    "log2" => Family::Map1,
    "radians" => Family::Map1,
    "degrees" => Family::Map1,
    "normalize" => Family::Map1,
    "pow" => Family::Map2,
    "step" => Family::Map2,
    "min" => Family::Map2Scalar,
    "max" => Family::Map2Scalar,
    "mod" => Family::Map2Scalar,
    "clamp" => Family::Clamp,
    "mix" => Family::Mix,
    "smoothstep" => Family::SmoothStep,
    "length" => Family::Reduce1,
    "dot" => Family::Reduce2,
    "distance" => Family::Reduce2,
    "cross" => Family::Fixed {
        params: &[Type::Float3, Type::Float3],
        ret: Type::Float3,
    },
    "sample" => Family::Sample,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_expansion() {
        let clamp = function("clamp").unwrap();
        let overloads = clamp.overloads();
        assert_eq!(overloads.len(), 7);
        assert!(overloads.contains(&Signature {
            params: vec![Type::Float3, Type::Float, Type::Float],
            ret: Type::Float3,
        }));

        let sample = function("sample").unwrap();
        assert_eq!(sample.overloads().len(), 3);
        assert!(sample
            .overloads()
            .iter()
            .all(|s| s.ret == Type::Float4 && s.params[1] == Type::Float2));
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in FUNCTIONS.iter().enumerate() {
            assert!(FUNCTIONS[i + 1..].iter().all(|b| b.name != a.name));
            assert!(variable(a.name).is_none());
        }
    }
}
