#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum Target {
    Glsl,
    Hlsl,
    Bytecode,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        jsl::codegen::Target::from(*self).fmt(f)
    }
}

impl Target {
    /// Extension of the files written for this target.
    pub const fn extension(self) -> &'static str {
        match self {
            Target::Glsl => "frag",
            Target::Hlsl => "hlsl",
            Target::Bytecode => "jslb",
        }
    }
}

impl From<Target> for jsl::codegen::Target {
    fn from(value: Target) -> Self {
        match value {
            Target::Glsl => jsl::codegen::Target::Glsl,
            Target::Hlsl => jsl::codegen::Target::Hlsl,
            Target::Bytecode => jsl::codegen::Target::Bytecode,
        }
    }
}

// Direct3D on Windows, OpenGL elsewhere.
cfg_if::cfg_if! {
    if #[cfg(windows)] {
        pub const DEFAULT_TARGET: Target = Target::Hlsl;
    } else {
        pub const DEFAULT_TARGET: Target = Target::Glsl;
    }
}
