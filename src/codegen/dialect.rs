use std::format as f;

use crate::{
    ast::{AssignOp, BinaryOp},
    codegen::Target,
    symbols::Qualifier,
    types::Type,
};

/// What differs between the C-like shading languages the text generator
/// targets.
pub trait Dialect {
    const TARGET: Target;

    /// Emitted before any declaration.
    const PROLOGUE: &str;

    /// Whether `while` and `do`-`while` loops can be expressed.
    const SUPPORTS_WHILE: bool;

    /// Spelling of `ty`, or `None` if the target can't express it.
    fn type_name(ty: Type) -> Option<&'static str>;

    /// Keywords placed before a global declaration.
    fn global_qualifier(qualifier: Qualifier, ty: Type) -> &'static str;

    /// Spelling of a built-in variable.
    fn builtin_var(name: &'static str) -> &'static str;

    /// Spelling of a built-in function.
    fn builtin_function(name: &'static str) -> &'static str;

    /// Spelling of the user's `main`.
    const MAIN: &str = "main";

    /// Words the target keeps for itself, beyond the JSL ones.
    const RESERVED: &[&str];

    /// Whether a user identifier would clash with the target's own names.
    fn is_reserved(name: &str) -> bool {
        Self::RESERVED.contains(&name)
    }

    fn binary(op: BinaryOp, lhs: Operand<'_>, rhs: Operand<'_>) -> String {
        f!("{} {} {}", lhs.text, op.symbol(), rhs.text)
    }

    /// A constructor taking a single scalar, replicated into every lane.
    fn splat(ty: &str, arg: &str) -> String {
        f!("{ty}({arg})")
    }

    fn assignment(op: AssignOp, target: Operand<'_>, value: Operand<'_>) -> String {
        f!("{} {} {}", target.text, op.symbol(), value.text)
    }

    /// Emitted once every function was emitted.
    fn epilogue(_out: &mut String) {}
}

/// An already emitted operand and its type.
#[derive(Copy, Clone)]
pub struct Operand<'a> {
    pub ty: Type,
    pub text: &'a str,
}

impl Dialect for Glsl {
    const TARGET: Target = Target::Glsl;

    const PROLOGUE: &str = concat!(
        "#ifdef GL_ES\n",
        "precision highp float;\n",
        "precision highp int;\n",
        "#endif\n",
        "\n",
        "varying vec2 pos0;\n",
        "varying vec2 pos1;\n",
        "varying vec4 jsl_vertexColor;\n",
    );

    // ES 2.0 fragment shaders only guarantee `for` loops.
    const SUPPORTS_WHILE: bool = false;

    fn type_name(ty: Type) -> Option<&'static str> {
        use Type::*;
        let name = match ty {
            Void => "void",
            Float => "float",
            Float2 => "vec2",
            Float3 => "vec3",
            Float4 => "vec4",
            Int => "int",
            Int2 => "ivec2",
            Int3 => "ivec3",
            Int4 => "ivec4",
            Bool => "bool",
            Bool2 => "bvec2",
            Bool3 => "bvec3",
            Bool4 => "bvec4",
            Float2x2 => "mat2",
            Float3x3 => "mat3",
            Float4x4 => "mat4",
            Sampler | LSampler | FSampler => "sampler2D",
        };
        Some(name)
    }

    fn global_qualifier(qualifier: Qualifier, _: Type) -> &'static str {
        match qualifier {
            Qualifier::Param => "uniform ",
            Qualifier::Const => "const ",
            _ => "",
        }
    }

    fn builtin_var(name: &'static str) -> &'static str {
        match name {
            "color" => "gl_FragColor",
            "pixcoord" => "gl_FragCoord.xy",
            _ => name,
        }
    }

    fn builtin_function(name: &'static str) -> &'static str {
        match name {
            "sample" => "texture2D",
            _ => name,
        }
    }

    const RESERVED: &[&str] = &[
        "main", "attribute", "uniform", "varying", "in", "out", "inout", "struct", "precision",
        "highp", "mediump", "lowp", "invariant", "vec2", "vec3", "vec4", "ivec2", "ivec3",
        "ivec4", "bvec2", "bvec3", "bvec4", "mat2", "mat3", "mat4", "sampler2D",
        "samplerCube", "asm", "class", "union", "enum", "typedef", "template", "this",
        "packed", "goto", "switch", "default", "inline", "noinline", "volatile", "public",
        "static", "extern", "external", "interface", "flat", "long", "short", "double",
        "half", "fixed", "unsigned", "superp", "input", "output", "hvec2", "hvec3", "hvec4",
        "dvec2", "dvec3", "dvec4", "fvec2", "fvec3", "fvec4", "sampler1D", "sampler3D",
        "sampler1DShadow", "sampler2DShadow", "sampler2DRect", "sampler3DRect",
        "sampler2DRectShadow", "sizeof", "cast", "namespace", "using", "texture2D",
        "texture2DProj", "texture2DLod", "texture2DProjLod", "textureCube",
        "textureCubeLod", "radians", "degrees", "tan", "asin", "acos", "atan", "exp2",
        "log2", "sign", "ceil", "distance", "faceforward", "reflect", "refract",
        "matrixCompMult", "lessThan", "lessThanEqual", "greaterThan", "greaterThanEqual",
        "equal", "notEqual", "any", "all", "not",
    ];

    // `gl_` names and double underscores are reserved by the language.
    fn is_reserved(name: &str) -> bool {
        name.starts_with("gl_") || name.contains("__") || Self::RESERVED.contains(&name)
    }
}

impl Dialect for Hlsl {
    const TARGET: Target = Target::Hlsl;

    const PROLOGUE: &str = concat!(
        "static float2 pos0;\n",
        "static float2 pos1;\n",
        "static float2 pixcoord;\n",
        "static float4 jsl_vertexColor;\n",
        "static float4 color;\n",
        "\n",
        // `fmod` truncates; JSL's `mod` floors.
        "float jsl_mod(float x, float y) { return x - y * floor(x / y); }\n",
        "float2 jsl_mod(float2 x, float2 y) { return x - y * floor(x / y); }\n",
        "float3 jsl_mod(float3 x, float3 y) { return x - y * floor(x / y); }\n",
        "float4 jsl_mod(float4 x, float4 y) { return x - y * floor(x / y); }\n",
        "float2 jsl_mod(float2 x, float y) { return x - y * floor(x / y); }\n",
        "float3 jsl_mod(float3 x, float y) { return x - y * floor(x / y); }\n",
        "float4 jsl_mod(float4 x, float y) { return x - y * floor(x / y); }\n",
    );

    const SUPPORTS_WHILE: bool = true;

    fn type_name(ty: Type) -> Option<&'static str> {
        match ty {
            Type::Sampler | Type::LSampler => Some("sampler2D"),
            Type::FSampler => None,
            ty => Some(ty.name()),
        }
    }

    fn global_qualifier(qualifier: Qualifier, ty: Type) -> &'static str {
        match qualifier {
            // The host uploads columns, which become the rows held here.
            Qualifier::Param if ty.is_matrix() => "row_major ",
            Qualifier::Param => "",
            Qualifier::Const => "static const ",
            _ => "static ",
        }
    }

    fn builtin_var(name: &'static str) -> &'static str {
        name
    }

    fn builtin_function(name: &'static str) -> &'static str {
        match name {
            "sample" => "tex2D",
            "mix" => "lerp",
            "fract" => "frac",
            "inversesqrt" => "rsqrt",
            "mod" => "jsl_mod",
            _ => name,
        }
    }

    // The entry point is generated, see `epilogue`.
    const MAIN: &str = "jsl_main";

    const RESERVED: &[&str] = &[
        "main", "in", "out", "inout", "uniform", "static", "extern", "shared", "volatile",
        "struct", "class", "interface", "typedef", "namespace", "register", "packoffset",
        "cbuffer", "tbuffer", "buffer", "switch", "case", "default", "goto", "inline",
        "string", "technique", "technique10", "pass", "compile", "vector", "matrix",
        "row_major", "column_major", "linear", "centroid", "nointerpolation",
        "noperspective", "sample", "precise", "snorm", "unorm", "half", "double", "uint",
        "dword", "min16float", "min10float", "min16int", "min12int", "min16uint", "sampler",
        "sampler1D", "sampler2D", "sampler3D", "samplerCUBE", "sampler_state", "texture",
        "Texture1D", "Texture2D", "Texture3D", "TextureCube", "SamplerState", "tex1D",
        "tex2D", "tex3D", "texCUBE", "lerp", "frac", "rsqrt", "fmod", "mul", "all", "any",
        "saturate", "clip", "ddx", "ddy", "asin", "acos", "atan", "atan2", "tan", "sign",
        "ceil", "exp2", "log2", "log10", "radians", "degrees", "distance", "reflect",
        "refract", "transpose", "determinant", "half2", "half3", "half4", "double2",
        "double3", "double4", "uint2", "uint3", "uint4", "float1", "int1", "bool1",
        "float2x3", "float2x4", "float3x2", "float3x4", "float4x2", "float4x3",
    ];

    fn binary(op: BinaryOp, lhs: Operand<'_>, rhs: Operand<'_>) -> String {
        let (l, r) = (lhs.text, rhs.text);
        let is_product = op == BinaryOp::Mul
            && (lhs.ty.is_matrix() || rhs.ty.is_matrix())
            && !lhs.ty.is_scalar()
            && !rhs.ty.is_scalar();
        let is_composite = !lhs.ty.is_scalar() && !lhs.ty.is_sampler();
        match op {
            _ if is_product => f!("mul({r}, {l})"),
            BinaryOp::EqEq if is_composite => f!("all({l} == {r})"),
            BinaryOp::NotEq if is_composite => f!("any({l} != {r})"),
            // `!=` binds tighter than `^^` did.
            BinaryOp::Xor => f!("({l} != {r})"),
            _ => f!("{l} {} {r}", op.symbol()),
        }
    }

    fn splat(ty: &str, arg: &str) -> String {
        f!("(({ty}) {arg})")
    }

    fn assignment(op: AssignOp, target: Operand<'_>, value: Operand<'_>) -> String {
        let (t, v) = (target.text, value.text);
        match op.binary() {
            Some(bin @ BinaryOp::Mul) if target.ty.is_matrix() || value.ty.is_matrix() => {
                if value.ty.is_scalar() {
                    f!("{t} *= {v}")
                } else {
                    f!("{t} = {}", Self::binary(bin, target, value))
                }
            }
            _ => f!("{t} {} {v}", op.symbol()),
        }
    }

    fn epilogue(out: &mut String) {
        out.push_str(concat!(
            "float4 main(\n",
            "    in float2 pos0_in : TEXCOORD0,\n",
            "    in float2 pos1_in : TEXCOORD1,\n",
            "    in float2 pixcoord_in : VPOS,\n",
            "    in float4 jsl_vertexColor_in : COLOR0) : COLOR0\n",
            "{\n",
            "    pos0 = pos0_in;\n",
            "    pos1 = pos1_in;\n",
            "    pixcoord = pixcoord_in;\n",
            "    jsl_vertexColor = jsl_vertexColor_in;\n",
            "    color = float4(0.0, 0.0, 0.0, 0.0);\n",
            "    jsl_main();\n",
            "    return color;\n",
            "}\n",
        ));
    }
}

pub struct Glsl;

/// HLSL fills matrices row by row, so a JSL matrix is held as its transpose:
/// constructors and indexing carry over unchanged, and products swap their
/// operands.
pub struct Hlsl;
