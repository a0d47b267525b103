use std::fmt;

/// Every type expressible in an effect program.
///
/// Types are structural: two values have the same type if and only if their
/// `Type`s compare equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
    Bool2,
    Bool3,
    Bool4,
    Float2x2,
    Float3x3,
    Float4x4,
    /// Nearest-neighbour image sampler.
    Sampler,
    /// Linearly filtered image sampler.
    LSampler,
    /// Image sampler over floating point texels.
    FSampler,
}

/// The scalar kind underlying a [`Type`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseType {
    Void,
    Float,
    Int,
    Bool,
    Sampler,
}

impl Type {
    pub const ALL: &[Type] = &[
        Type::Void,
        Type::Float,
        Type::Float2,
        Type::Float3,
        Type::Float4,
        Type::Int,
        Type::Int2,
        Type::Int3,
        Type::Int4,
        Type::Bool,
        Type::Bool2,
        Type::Bool3,
        Type::Bool4,
        Type::Float2x2,
        Type::Float3x3,
        Type::Float4x4,
        Type::Sampler,
        Type::LSampler,
        Type::FSampler,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::Float => "float",
            Type::Float2 => "float2",
            Type::Float3 => "float3",
            Type::Float4 => "float4",
            Type::Int => "int",
            Type::Int2 => "int2",
            Type::Int3 => "int3",
            Type::Int4 => "int4",
            Type::Bool => "bool",
            Type::Bool2 => "bool2",
            Type::Bool3 => "bool3",
            Type::Bool4 => "bool4",
            Type::Float2x2 => "float2x2",
            Type::Float3x3 => "float3x3",
            Type::Float4x4 => "float4x4",
            Type::Sampler => "sampler",
            Type::LSampler => "lsampler",
            Type::FSampler => "fsampler",
        }
    }

    pub const fn base(self) -> BaseType {
        use Type::*;
        match self {
            Void => BaseType::Void,
            Float | Float2 | Float3 | Float4 | Float2x2 | Float3x3 | Float4x4 => BaseType::Float,
            Int | Int2 | Int3 | Int4 => BaseType::Int,
            Bool | Bool2 | Bool3 | Bool4 => BaseType::Bool,
            Sampler | LSampler | FSampler => BaseType::Sampler,
        }
    }

    /// Number of lanes of a scalar (1) or vector (2..=4) type. `None` for
    /// matrices, samplers and `void`.
    pub const fn vector_len(self) -> Option<u8> {
        use Type::*;
        match self {
            Float | Int | Bool => Some(1),
            Float2 | Int2 | Bool2 => Some(2),
            Float3 | Int3 | Bool3 => Some(3),
            Float4 | Int4 | Bool4 => Some(4),
            _ => None,
        }
    }

    /// Side of a square matrix type.
    pub const fn matrix_dim(self) -> Option<u8> {
        match self {
            Type::Float2x2 => Some(2),
            Type::Float3x3 => Some(3),
            Type::Float4x4 => Some(4),
            _ => None,
        }
    }

    /// Number of scalar components a value of this type is made of; this is
    /// what constructor arguments are counted in.
    pub const fn components(self) -> u8 {
        match (self.vector_len(), self.matrix_dim()) {
            (Some(len), _) => len,
            (None, Some(dim)) => dim * dim,
            (None, None) => 0,
        }
    }

    /// Builds the scalar or vector type with the given base and lane count.
    pub const fn vector(base: BaseType, len: u8) -> Option<Type> {
        use Type::*;
        let ty = match (base, len) {
            (BaseType::Float, 1) => Float,
            (BaseType::Float, 2) => Float2,
            (BaseType::Float, 3) => Float3,
            (BaseType::Float, 4) => Float4,
            (BaseType::Int, 1) => Int,
            (BaseType::Int, 2) => Int2,
            (BaseType::Int, 3) => Int3,
            (BaseType::Int, 4) => Int4,
            (BaseType::Bool, 1) => Bool,
            (BaseType::Bool, 2) => Bool2,
            (BaseType::Bool, 3) => Bool3,
            (BaseType::Bool, 4) => Bool4,
            _ => return None,
        };
        Some(ty)
    }

    pub const fn is_scalar(self) -> bool {
        matches!(self.vector_len(), Some(1))
    }

    pub const fn is_vector(self) -> bool {
        matches!(self.vector_len(), Some(2..=4))
    }

    pub const fn is_matrix(self) -> bool {
        self.matrix_dim().is_some()
    }

    pub const fn is_sampler(self) -> bool {
        matches!(self.base(), BaseType::Sampler)
    }

    /// Whether arithmetic is defined on values of this type.
    pub const fn is_numeric(self) -> bool {
        matches!(self.base(), BaseType::Float | BaseType::Int)
    }

    /// The element type of an indexed vector (its scalar) or matrix (a
    /// column vector).
    pub const fn element(self) -> Option<Type> {
        match (self.vector_len(), self.matrix_dim()) {
            (Some(2..=4), _) => Type::vector(self.base(), 1),
            (_, Some(dim)) => Type::vector(BaseType::Float, dim),
            _ => None,
        }
    }

    /// Whether a value of type `self` may be stored into a location of type
    /// `target`. The only implicit conversion is int to float widening, which
    /// applies lane by lane.
    pub fn widens_to(self, target: Type) -> bool {
        if self == target {
            return true;
        }
        self.base() == BaseType::Int
            && target.base() == BaseType::Float
            && self.vector_len().is_some()
            && self.vector_len() == target.vector_len()
    }

    /// The common type both `a` and `b` widen to, if any.
    pub fn unify(a: Type, b: Type) -> Option<Type> {
        if a.widens_to(b) {
            Some(b)
        } else if b.widens_to(a) {
            Some(a)
        } else {
            None
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening() {
        assert!(Type::Int.widens_to(Type::Float));
        assert!(Type::Int3.widens_to(Type::Float3));
        assert!(Type::Float.widens_to(Type::Float));

        assert!(!Type::Float.widens_to(Type::Int));
        assert!(!Type::Int2.widens_to(Type::Float3));
        assert!(!Type::Bool.widens_to(Type::Float));
        assert!(!Type::Int.widens_to(Type::Float2x2));
    }

    #[test]
    fn unify() {
        assert_eq!(Type::unify(Type::Int, Type::Float), Some(Type::Float));
        assert_eq!(Type::unify(Type::Float4, Type::Int4), Some(Type::Float4));
        assert_eq!(Type::unify(Type::Bool, Type::Bool), Some(Type::Bool));
        assert_eq!(Type::unify(Type::Float2, Type::Float3), None);
        assert_eq!(Type::unify(Type::Sampler, Type::LSampler), None);
    }

    #[test]
    fn shapes() {
        assert_eq!(Type::Float3x3.components(), 9);
        assert_eq!(Type::Int4.components(), 4);
        assert_eq!(Type::Sampler.components(), 0);
        assert_eq!(Type::Float4x4.element(), Some(Type::Float4));
        assert_eq!(Type::Bool3.element(), Some(Type::Bool));
        assert_eq!(Type::Float.element(), None);
        assert_eq!(Type::vector(BaseType::Int, 3), Some(Type::Int3));
        assert_eq!(Type::vector(BaseType::Sampler, 1), None);
    }
}
