use super::PortableType;

/// Map a MySQL native type name to its portable type.
pub fn portable_type(native: &str) -> Option<PortableType> {
    let mapped = match native {
        "tinyint" => PortableType::TinyInt,
        "smallint" | "mediumint" => PortableType::SmallInt,
        "int" | "integer" | "year" => PortableType::Integer,
        "bigint" | "int24" => PortableType::BigInt,
        "real" => PortableType::Real,
        "float" => PortableType::Float,
        "decimal" => PortableType::Decimal,
        "numeric" => PortableType::Numeric,
        "double" => PortableType::Double,
        "char" | "enum" | "set" => PortableType::Char,
        "varchar" | "tinytext" => PortableType::Varchar,
        "date" => PortableType::Date,
        "time" => PortableType::Time,
        "datetime" | "timestamp" => PortableType::Timestamp,
        "tinyblob" => PortableType::Binary,
        "blob" | "mediumblob" | "longblob" => PortableType::Blob,
        "longtext" => PortableType::Clob,
        "mediumtext" | "text" => PortableType::LongVarchar,
        "bit" => PortableType::Boolean,
        _ => return None,
    };
    Some(mapped)
}

/// Display sizes MySQL reports when none was asked for. A column whose
/// reported size equals the default is treated as having no explicit size.
pub fn default_size(native: &str) -> Option<u32> {
    match native {
        "char" => Some(1),
        "tinyint" => Some(4),
        "smallint" => Some(6),
        "int" => Some(11),
        "bigint" => Some(20),
        "decimal" => Some(10),
        _ => None,
    }
}
