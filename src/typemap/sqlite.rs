use super::PortableType;

/// Map a SQLite declared type name to its portable type.
///
/// SQLite column types are declarations, not storage classes, so the
/// names seen here are whatever the CREATE TABLE statement said. The
/// match is done on the lowercased base name with any size stripped.
pub fn portable_type(native: &str) -> Option<PortableType> {
    let mapped = match native {
        "tinyint" => PortableType::TinyInt,
        "smallint" | "mediumint" => PortableType::SmallInt,
        "int" | "integer" => PortableType::Integer,
        "bigint" | "int8" => PortableType::BigInt,
        "real" => PortableType::Real,
        "float" => PortableType::Float,
        "double" => PortableType::Double,
        "decimal" => PortableType::Decimal,
        "numeric" => PortableType::Numeric,
        "boolean" | "bool" => PortableType::Boolean,
        "char" | "character" | "nchar" => PortableType::Char,
        "varchar" | "nvarchar" => PortableType::Varchar,
        "text" => PortableType::LongVarchar,
        "clob" => PortableType::Clob,
        "blob" => PortableType::Blob,
        "date" => PortableType::Date,
        "time" => PortableType::Time,
        "datetime" | "timestamp" => PortableType::Timestamp,
        _ => return None,
    };
    Some(mapped)
}
