use std::fmt;

///
/// ColumnType
///
/// Semantic column type. This is intentionally small: it carries exactly what
/// the expression layer needs for operand compatibility and result mapping.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ColumnType {
    Bool,
    /// Enumerated text; values are the declared variant names.
    Enum {
        variants: &'static [&'static str],
    },
    Int,
    Long,
    Text,
}

impl ColumnType {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long)
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::Enum { .. })
    }

    /// True when `variant` is a declared member of an enum column.
    /// Non-enum columns accept nothing.
    #[must_use]
    pub fn accepts_variant(self, variant: &str) -> bool {
        match self {
            Self::Enum { variants } => variants.contains(&variant),
            _ => false,
        }
    }

    /// Whether two column types may be equated in a foreign-key join.
    #[must_use]
    pub fn is_join_compatible(self, other: Self) -> bool {
        (self.is_numeric() && other.is_numeric()) || self == other
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Enum { variants } => write!(f, "enum({})", variants.join("|")),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Text => f.write_str("text"),
        }
    }
}
