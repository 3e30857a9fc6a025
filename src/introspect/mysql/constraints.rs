use std::sync::LazyLock;

use regex::Regex;
use sqlx::{MySqlConnection, Row};

use crate::error::AdapterError;
use crate::introspect::referential_action;
use crate::schema::{ForeignKey, Index, Unique};

/// One line of SHOW CREATE TABLE output per constraint; the trailing
/// group captures the referential actions up to the end of the line.
static FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CONSTRAINT `([^`]+)` FOREIGN KEY \((.+)\) REFERENCES `([^`]+)` \((.+)\)(.*)")
        .expect("foreign key pattern")
});

/// Fetch the CREATE TABLE text for a table.
pub async fn table_ddl(conn: &mut MySqlConnection, table: &str) -> Result<String, AdapterError> {
    let sql = format!("SHOW CREATE TABLE `{table}`");
    let row = sqlx::query(&sql)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AdapterError::introspection(table, e))?;
    row.try_get::<String, _>(1)
        .map_err(|e| AdapterError::introspection(table, e))
}

/// Extract foreign keys from CREATE TABLE text.
///
/// MySQL's information_schema had no usable referential-constraint view
/// when this scheme was established, so the DDL text is the source of
/// truth. No match means the table simply has no foreign keys. Rows
/// sharing a constraint name merge into one entity, preserving column
/// order.
pub fn foreign_keys_from_ddl(ddl: &str) -> Vec<ForeignKey> {
    let mut foreign_keys: Vec<ForeignKey> = Vec::new();

    for caps in FOREIGN_KEY.captures_iter(ddl) {
        let name = &caps[1];
        let local_columns = split_column_list(&caps[2]);
        let foreign_table = &caps[3];
        let foreign_columns = split_column_list(&caps[4]);
        let actions = &caps[5];

        if let Some(existing) = foreign_keys.iter_mut().find(|fk| fk.name == name) {
            for (local, foreign) in local_columns.into_iter().zip(foreign_columns) {
                existing.add_reference(local, foreign);
            }
        } else {
            let mut fk = ForeignKey::new(name, foreign_table);
            fk.on_delete = referential_action(actions, "ON DELETE");
            fk.on_update = referential_action(actions, "ON UPDATE");
            for (local, foreign) in local_columns.into_iter().zip(foreign_columns) {
                fk.add_reference(local, foreign);
            }
            foreign_keys.push(fk);
        }
    }

    foreign_keys
}

fn split_column_list(raw: &str) -> Vec<String> {
    raw.split("`, `")
        .map(|piece| piece.trim_matches(|c| c == '`' || c == ' ').to_string())
        .collect()
}

#[derive(sqlx::FromRow)]
struct IndexRow {
    #[sqlx(rename = "Key_name")]
    key_name: String,
    #[sqlx(rename = "Non_unique")]
    non_unique: i64,
    #[sqlx(rename = "Column_name")]
    column_name: Option<String>,
}

/// Group SHOW INDEX rows by key name, classifying unique keys apart from
/// plain indexes. The primary key's own entry is skipped — it lives as
/// column flags.
pub async fn query_indexes(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<(Vec<Index>, Vec<Unique>), AdapterError> {
    let sql = format!("SHOW INDEX FROM `{table}`");
    let rows: Vec<IndexRow> = sqlx::query_as(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AdapterError::introspection(table, e))?;

    let mut indexes: Vec<Index> = Vec::new();
    let mut uniques: Vec<Unique> = Vec::new();

    for row in rows {
        if row.key_name == "PRIMARY" {
            continue;
        }
        // functional index parts have no column name
        let Some(column) = row.column_name else {
            continue;
        };

        if row.non_unique == 0 {
            match uniques.iter_mut().find(|u| u.name == row.key_name) {
                Some(unique) => unique.columns.push(column),
                None => uniques.push(Unique {
                    name: row.key_name,
                    columns: vec![column],
                }),
            }
        } else {
            match indexes.iter_mut().find(|i| i.name == row.key_name) {
                Some(index) => index.columns.push(column),
                None => indexes.push(Index {
                    name: row.key_name,
                    columns: vec![column],
                }),
            }
        }
    }

    Ok((indexes, uniques))
}

/// The primary key's column names, in key order.
pub async fn query_primary_key(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<Vec<String>, AdapterError> {
    let sql = format!("SHOW KEYS FROM `{table}`");
    let rows: Vec<IndexRow> = sqlx::query_as(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AdapterError::introspection(table, e))?;

    Ok(rows
        .into_iter()
        .filter(|row| row.key_name == "PRIMARY")
        .filter_map(|row| row.column_name)
        .collect())
}
