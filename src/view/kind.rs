//! Column classification.

use crate::source::SqlType;

/// Semantic kind of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Boolean,
    Integer,
    Real,
    Text,
    Other,
}

impl ColumnKind {
    /// Numeric kinds are the only ones eligible for bars and statistics.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
            Self::Text => write!(f, "text"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Map a driver type code to its semantic kind.
pub fn classify(sql_type: &SqlType) -> ColumnKind {
    match sql_type {
        SqlType::Bit | SqlType::Boolean | SqlType::Binary => ColumnKind::Boolean,
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            ColumnKind::Integer
        }
        SqlType::Float | SqlType::Double | SqlType::Decimal | SqlType::Numeric | SqlType::Real => {
            ColumnKind::Real
        }
        SqlType::Char
        | SqlType::NChar
        | SqlType::VarChar
        | SqlType::NVarChar
        | SqlType::LongVarChar
        | SqlType::LongNVarChar => ColumnKind::Text,
        _ => ColumnKind::Other,
    }
}
