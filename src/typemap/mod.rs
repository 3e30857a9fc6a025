pub mod mysql;
pub mod sqlite;

use std::fmt;

/// Vendor-neutral column type. Every native type name reported by a
/// dialect's catalog is mapped onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortableType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    /// An integer column holding a unix timestamp, detected from column
    /// metadata rather than the native type itself.
    IntegerTimestamp,
    Real,
    Float,
    Double,
    Decimal,
    Numeric,
    Char,
    Varchar,
    LongVarchar,
    Clob,
    Date,
    Time,
    Timestamp,
    Binary,
    Blob,
}

impl PortableType {
    /// The fallback used when a native type has no mapping.
    pub const DEFAULT: PortableType = PortableType::Varchar;

    pub fn as_str(&self) -> &'static str {
        match self {
            PortableType::Boolean => "BOOLEAN",
            PortableType::TinyInt => "TINYINT",
            PortableType::SmallInt => "SMALLINT",
            PortableType::Integer => "INTEGER",
            PortableType::BigInt => "BIGINT",
            PortableType::IntegerTimestamp => "INTEGER_TIMESTAMP",
            PortableType::Real => "REAL",
            PortableType::Float => "FLOAT",
            PortableType::Double => "DOUBLE",
            PortableType::Decimal => "DECIMAL",
            PortableType::Numeric => "NUMERIC",
            PortableType::Char => "CHAR",
            PortableType::Varchar => "VARCHAR",
            PortableType::LongVarchar => "LONGVARCHAR",
            PortableType::Clob => "CLOB",
            PortableType::Date => "DATE",
            PortableType::Time => "TIME",
            PortableType::Timestamp => "TIMESTAMP",
            PortableType::Binary => "BINARY",
            PortableType::Blob => "BLOB",
        }
    }

    /// Large-object types. These never carry a column default.
    pub fn is_lob(&self) -> bool {
        matches!(
            self,
            PortableType::Blob | PortableType::Binary | PortableType::Clob | PortableType::LongVarchar
        )
    }
}

impl fmt::Display for PortableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
