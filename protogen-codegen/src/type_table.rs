//! Mapping from native primitive type tokens to IDL scalar types.

/// IDL scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtoScalar {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
}

impl ProtoScalar {
    /// Maps a native primitive token (`int16_t`, `s-float`, `stl-string`, ...).
    #[must_use]
    pub fn from_native(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "int8_t" | "int16_t" | "int32_t" => Some(Self::Int32),
            "int64_t" | "long" => Some(Self::Int64),
            "uint8_t" | "uint16_t" | "uint32_t" => Some(Self::Uint32),
            "uint64_t" => Some(Self::Uint64),
            "s-float" => Some(Self::Float),
            "d-float" => Some(Self::Double),
            "stl-string" | "static-string" | "ptr-string" => Some(Self::String),
            "stl-fstream" | "padding" => Some(Self::Bytes),
            _ => None,
        }
    }

    /// Returns the IDL keyword.
    #[must_use]
    pub const fn proto_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for ProtoScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.proto_name())
    }
}

/// Returns true if `name` is a native primitive token.
#[must_use]
pub fn is_primitive(name: Option<&str>) -> bool {
    name.and_then(ProtoScalar::from_native).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths() {
        assert_eq!(ProtoScalar::from_native("int8_t"), Some(ProtoScalar::Int32));
        assert_eq!(ProtoScalar::from_native("int16_t"), Some(ProtoScalar::Int32));
        assert_eq!(ProtoScalar::from_native("uint16_t"), Some(ProtoScalar::Uint32));
        assert_eq!(ProtoScalar::from_native("long"), Some(ProtoScalar::Int64));
        assert_eq!(ProtoScalar::from_native("uint64_t"), Some(ProtoScalar::Uint64));
    }

    #[test]
    fn test_other_primitives() {
        assert_eq!(ProtoScalar::from_native("s-float").map(ProtoScalar::proto_name), Some("float"));
        assert_eq!(ProtoScalar::from_native("d-float").map(ProtoScalar::proto_name), Some("double"));
        assert_eq!(ProtoScalar::from_native("ptr-string"), Some(ProtoScalar::String));
        assert_eq!(ProtoScalar::from_native("padding"), Some(ProtoScalar::Bytes));
        assert_eq!(ProtoScalar::Bool.to_string(), "bool");
    }

    #[test]
    fn test_non_primitives() {
        assert_eq!(ProtoScalar::from_native("coord"), None);
        assert_eq!(ProtoScalar::from_native("flag-bit"), None);
        assert!(is_primitive(Some("int32_t")));
        assert!(!is_primitive(Some("unit")));
        assert!(!is_primitive(None));
    }
}
