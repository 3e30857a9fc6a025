use std::sync::LazyLock;

use regex::Regex;
use sqlx::MySqlConnection;

use crate::error::AdapterError;
use crate::introspect::parse_native_type;
use crate::schema::{Column, DefaultValue};
use crate::typemap::{mysql as mysql_types, PortableType};

static BLOB_OR_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("blob|text").expect("blob/text pattern"));

#[derive(sqlx::FromRow)]
struct ColumnRow {
    #[sqlx(rename = "Field")]
    field: String,
    #[sqlx(rename = "Type")]
    column_type: String,
    #[sqlx(rename = "Null")]
    null: String,
    #[sqlx(rename = "Default")]
    default: Option<String>,
    #[sqlx(rename = "Extra")]
    extra: String,
    #[sqlx(rename = "Comment")]
    comment: Option<String>,
}

pub async fn query_columns(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<Vec<Column>, AdapterError> {
    let sql = format!("SHOW FULL COLUMNS FROM `{table}`");
    let rows: Vec<ColumnRow> = sqlx::query_as(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AdapterError::introspection(table, e))?;

    Ok(rows
        .into_iter()
        .map(|row| column_from_row(table, row))
        .collect())
}

fn column_from_row(table: &str, row: ColumnRow) -> Column {
    let (native, mut size, scale) = parse_native_type(&row.column_type);

    // A size equal to the dialect default was never asked for.
    if let (Some(s), Some(default_size)) = (size, mysql_types::default_size(&native)) {
        if s == default_size {
            size = None;
        }
    }

    let mut portable = match mysql_types::portable_type(&native) {
        Some(t) => t,
        None => {
            tracing::warn!(
                "column [{table}.{}] has a native type ({native}) with no portable mapping",
                row.field
            );
            PortableType::DEFAULT
        }
    };

    // Integer columns documented as unix timestamps get the dedicated tag.
    let comment = row.comment.unwrap_or_default();
    if matches!(portable, PortableType::Integer | PortableType::BigInt)
        && comment.starts_with("timestamp")
    {
        portable = PortableType::IntegerTimestamp;
    }

    // BLOB and TEXT columns cannot carry defaults in MySQL; ignore
    // whatever the catalog claims.
    let default = if BLOB_OR_TEXT.is_match(&native) {
        None
    } else {
        row.default.map(|raw| normalize_default(portable, raw))
    };

    let mut column = Column::new(row.field, portable);
    column.native_type = native;
    column.nullable = row.null == "YES";
    column.size = size;
    column.scale = scale;
    column.auto_increment = row.extra.contains("auto_increment");
    column.default = default;
    column
}

fn normalize_default(portable: PortableType, raw: String) -> DefaultValue {
    let mut value = raw;
    if portable == PortableType::Boolean {
        if value == "1" {
            value = "true".to_string();
        } else if value == "0" {
            value = "false".to_string();
        }
    }
    if value.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
        || value.eq_ignore_ascii_case("CURRENT_TIMESTAMP()")
    {
        DefaultValue::expression(value)
    } else {
        DefaultValue::literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DefaultKind;

    fn row(column_type: &str) -> ColumnRow {
        ColumnRow {
            field: "c".to_string(),
            column_type: column_type.to_string(),
            null: "NO".to_string(),
            default: None,
            extra: String::new(),
            comment: None,
        }
    }

    #[test]
    fn default_display_size_is_cleared() {
        let column = column_from_row("t", row("int(11)"));
        assert_eq!(column.portable_type, PortableType::Integer);
        assert_eq!(column.size, None);

        let column = column_from_row("t", row("int(10)"));
        assert_eq!(column.size, Some(10));
    }

    #[test]
    fn explicit_varchar_size_is_kept() {
        let column = column_from_row("t", row("varchar(50)"));
        assert_eq!(column.portable_type, PortableType::Varchar);
        assert_eq!(column.size, Some(50));
    }

    #[test]
    fn decimal_scale_survives_size_clearing() {
        let column = column_from_row("t", row("decimal(10,2)"));
        assert_eq!(column.size, None);
        assert_eq!(column.scale, Some(2));

        let column = column_from_row("t", row("decimal(12,2)"));
        assert_eq!(column.size, Some(12));
        assert_eq!(column.scale, Some(2));
    }

    #[test]
    fn auto_increment_and_nullability() {
        let mut r = row("int(11)");
        r.null = "YES".to_string();
        r.extra = "auto_increment".to_string();
        let column = column_from_row("t", r);
        assert!(column.auto_increment);
        assert!(column.nullable);
    }

    #[test]
    fn blob_and_text_never_carry_defaults() {
        let mut r = row("text");
        r.default = Some("boom".to_string());
        assert!(column_from_row("t", r).default.is_none());

        let mut r = row("longblob");
        r.default = Some("0x00".to_string());
        assert!(column_from_row("t", r).default.is_none());
    }

    #[test]
    fn boolean_defaults_are_normalized() {
        let mut r = row("bit(1)");
        r.default = Some("1".to_string());
        let column = column_from_row("t", r);
        assert_eq!(column.portable_type, PortableType::Boolean);
        assert_eq!(
            column.default,
            Some(DefaultValue::literal("true"))
        );

        let mut r = row("bit(1)");
        r.default = Some("0".to_string());
        assert_eq!(
            column_from_row("t", r).default,
            Some(DefaultValue::literal("false"))
        );
    }

    #[test]
    fn current_timestamp_is_an_expression_default() {
        let mut r = row("timestamp");
        r.default = Some("CURRENT_TIMESTAMP".to_string());
        let column = column_from_row("t", r);
        let default = column.default.unwrap();
        assert_eq!(default.kind, DefaultKind::Expression);
        assert_eq!(default.value, "CURRENT_TIMESTAMP");
    }

    #[test]
    fn literal_defaults_stay_literal() {
        let mut r = row("varchar(20)");
        r.default = Some("pending".to_string());
        let default = column_from_row("t", r).default.unwrap();
        assert_eq!(default.kind, DefaultKind::Literal);
        assert_eq!(default.value, "pending");
    }

    #[test]
    fn timestamp_comment_promotes_integers() {
        let mut r = row("int(11)");
        r.comment = Some("timestamp of last login".to_string());
        assert_eq!(
            column_from_row("t", r).portable_type,
            PortableType::IntegerTimestamp
        );

        let mut r = row("varchar(50)");
        r.comment = Some("timestamp-ish but not an integer".to_string());
        assert_eq!(column_from_row("t", r).portable_type, PortableType::Varchar);
    }

    #[test]
    fn unmapped_types_fall_back_to_varchar() {
        let column = column_from_row("t", row("geometry"));
        assert_eq!(column.portable_type, PortableType::DEFAULT);
        assert_eq!(column.native_type, "geometry");
    }
}
