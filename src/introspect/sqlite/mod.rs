use std::sync::LazyLock;

use regex::Regex;
use sqlx::SqliteConnection;

use super::{parse_native_type, referential_action};
use crate::error::AdapterError;
use crate::schema::{Column, Database, DefaultValue, ForeignKey, Index, Table, Unique};
use crate::typemap::{sqlite as sqlite_types, PortableType};

static BLOB_OR_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("blob|text").expect("blob/text pattern"));

/// SQLite keeps each table's CREATE statement verbatim in sqlite_master;
/// constraint names never make it into the pragmas, so foreign keys are
/// read back out of that text. The optional leading CONSTRAINT clause
/// carries the name, quoted in whatever style the author used.
static FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+["`\[]?(\w+)["`\]]?\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+["`\[]?(\w+)["`\]]?\s*\(([^)]+)\)([^,\n)]*)"#,
    )
    .expect("foreign key pattern")
});

/// Reverse engineer a SQLite database into a schema model, in the same
/// three phases as every other dialect: tables, then columns, then
/// constraints.
pub async fn introspect(
    conn: &mut SqliteConnection,
    db_name: &str,
    migration_table: Option<&str>,
) -> Result<Database, AdapterError> {
    let mut database = Database::new(db_name);

    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AdapterError::introspection("table discovery", e))?;
    for name in names {
        if Some(name.as_str()) == migration_table {
            continue;
        }
        tracing::debug!(table = %name, "adding table");
        database.add_table(Table::new(name));
    }

    for i in 0..database.tables.len() {
        let name = database.tables[i].name.clone();
        tracing::debug!(table = %name, "adding columns");
        let ddl = table_ddl(conn, &name).await?;
        database.tables[i].columns = query_columns(conn, &name, ddl.as_deref()).await?;
    }

    for i in 0..database.tables.len() {
        let name = database.tables[i].name.clone();
        tracing::debug!(table = %name, "adding indices and constraints");

        let ddl = table_ddl(conn, &name).await?;
        database.tables[i].foreign_keys = ddl
            .as_deref()
            .map(|ddl| foreign_keys_from_ddl(&name, ddl))
            .unwrap_or_default();

        let (indexes, uniques) = query_indexes(conn, &name).await?;
        database.tables[i].indexes = indexes;
        database.tables[i].uniques = uniques;
    }

    Ok(database)
}

async fn table_ddl(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Option<String>, AdapterError> {
    let ddl: Option<Option<String>> =
        sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AdapterError::introspection(table, e))?;
    Ok(ddl.flatten())
}

#[derive(sqlx::FromRow)]
struct TableInfoRow {
    name: String,
    #[sqlx(rename = "type")]
    declared_type: String,
    notnull: i64,
    dflt_value: Option<String>,
    pk: i64,
}

async fn query_columns(
    conn: &mut SqliteConnection,
    table: &str,
    ddl: Option<&str>,
) -> Result<Vec<Column>, AdapterError> {
    let sql = format!("PRAGMA table_info({})", pragma_arg(table));
    let rows: Vec<TableInfoRow> = sqlx::query_as(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AdapterError::introspection(table, e))?;

    // The AUTOINCREMENT keyword only shows up in the stored DDL.
    let declares_autoincrement = ddl
        .map(|d| d.to_ascii_uppercase().contains("AUTOINCREMENT"))
        .unwrap_or(false);

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let (native, size, scale) = parse_native_type(&row.declared_type);

        let portable = match sqlite_types::portable_type(&native) {
            Some(t) => t,
            None => {
                tracing::warn!(
                    "column [{table}.{}] has a declared type ({native}) with no portable mapping",
                    row.name
                );
                PortableType::DEFAULT
            }
        };

        let primary_key = row.pk > 0;
        // INTEGER PRIMARY KEY reports notnull = 0 but can never hold NULL
        let nullable = row.notnull == 0 && !primary_key;
        let auto_increment =
            primary_key && portable == PortableType::Integer && declares_autoincrement;

        let default = if BLOB_OR_TEXT.is_match(&native) {
            None
        } else {
            row.dflt_value.map(normalize_default)
        };

        let mut column = Column::new(row.name, portable);
        column.native_type = native;
        column.nullable = nullable;
        column.size = size;
        column.scale = scale;
        column.primary_key = primary_key;
        column.auto_increment = auto_increment;
        column.default = default;
        columns.push(column);
    }

    Ok(columns)
}

/// Pragma defaults keep their source spelling: literals arrive quoted,
/// expressions bare.
fn normalize_default(raw: String) -> DefaultValue {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
        || trimmed.eq_ignore_ascii_case("CURRENT_DATE")
        || trimmed.eq_ignore_ascii_case("CURRENT_TIME")
        || trimmed.starts_with('(')
    {
        return DefaultValue::expression(trimmed.to_string());
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return DefaultValue::literal(trimmed[1..trimmed.len() - 1].replace("''", "'"));
    }
    DefaultValue::literal(trimmed.to_string())
}

/// Extract foreign keys from CREATE TABLE text. No match means no
/// foreign keys. Anonymous constraints get a synthesized name keyed by
/// position so the model stays addressable.
fn foreign_keys_from_ddl(table: &str, ddl: &str) -> Vec<ForeignKey> {
    let mut foreign_keys = Vec::new();

    for (position, caps) in FOREIGN_KEY.captures_iter(ddl).enumerate() {
        let name = match caps.get(1) {
            Some(m) => m.as_str().to_string(),
            None => format!("{table}_fk_{}", position + 1),
        };
        let foreign_table = &caps[3];
        let local_columns = split_column_list(&caps[2]);
        let foreign_columns = split_column_list(&caps[4]);
        let actions = &caps[5];

        let mut fk = ForeignKey::new(name, foreign_table);
        fk.on_delete = referential_action(actions, "ON DELETE");
        fk.on_update = referential_action(actions, "ON UPDATE");
        for (local, foreign) in local_columns.into_iter().zip(foreign_columns) {
            fk.add_reference(local, foreign);
        }
        foreign_keys.push(fk);
    }

    foreign_keys
}

fn split_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|piece| {
            piece
                .trim_matches(|c: char| c.is_whitespace() || matches!(c, '`' | '"' | '[' | ']'))
                .to_string()
        })
        .collect()
}

#[derive(sqlx::FromRow)]
struct IndexListRow {
    name: String,
    #[sqlx(rename = "unique")]
    is_unique: i64,
    origin: String,
}

#[derive(sqlx::FromRow)]
struct IndexInfoRow {
    name: Option<String>,
}

async fn query_indexes(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<(Vec<Index>, Vec<Unique>), AdapterError> {
    let sql = format!("PRAGMA index_list({})", pragma_arg(table));
    let rows: Vec<IndexListRow> = sqlx::query_as(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AdapterError::introspection(table, e))?;

    let mut indexes = Vec::new();
    let mut uniques = Vec::new();

    for row in rows {
        // the primary key is column flags, never an index entry
        if row.origin == "pk" {
            continue;
        }

        let info_sql = format!("PRAGMA index_info({})", pragma_arg(&row.name));
        let info: Vec<IndexInfoRow> = sqlx::query_as(&info_sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AdapterError::introspection(table, e))?;
        let columns: Vec<String> = info.into_iter().filter_map(|i| i.name).collect();

        if row.is_unique != 0 {
            uniques.push(Unique {
                name: row.name,
                columns,
            });
        } else {
            indexes.push(Index {
                name: row.name,
                columns,
            });
        }
    }

    Ok((indexes, uniques))
}

fn pragma_arg(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use indoc::indoc;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::ConnectOptions;

    use super::*;
    use crate::schema::{DefaultKind, FkAction};

    async fn memory_conn() -> SqliteConnection {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("memory options")
            .connect()
            .await
            .expect("memory connection")
    }

    async fn seed(conn: &mut SqliteConnection, statements: &[&str]) {
        for statement in statements {
            sqlx::query(statement).execute(&mut *conn).await.unwrap();
        }
    }

    #[tokio::test]
    async fn round_trips_a_live_schema() {
        let mut conn = memory_conn().await;
        seed(
            &mut conn,
            &[
                indoc! {"
                    CREATE TABLE author (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        name VARCHAR(50) NOT NULL,
                        bio TEXT,
                        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                    )"},
                indoc! {"
                    CREATE TABLE book (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        author_id INTEGER NOT NULL,
                        editor_id INTEGER,
                        title VARCHAR(100) NOT NULL,
                        CONSTRAINT book_author_fk FOREIGN KEY (author_id) REFERENCES author (id) ON DELETE CASCADE,
                        CONSTRAINT book_editor_fk FOREIGN KEY (editor_id) REFERENCES author (id)
                    )"},
                "CREATE UNIQUE INDEX author_name_uq ON author (name)",
                "CREATE INDEX book_title_idx ON book (title, author_id)",
            ],
        )
        .await;

        let database = introspect(&mut conn, "main", None).await.unwrap();
        assert_eq!(database.tables.len(), 2);

        let author = database.table("author").unwrap();
        let id = author.column("id").unwrap();
        assert_eq!(id.portable_type, PortableType::Integer);
        assert!(id.primary_key);
        assert!(id.auto_increment);
        assert!(!id.nullable);

        let name = author.column("name").unwrap();
        assert_eq!(name.portable_type, PortableType::Varchar);
        assert_eq!(name.size, Some(50));
        assert!(!name.nullable);
        assert!(name.default.is_none());

        let bio = author.column("bio").unwrap();
        assert_eq!(bio.portable_type, PortableType::LongVarchar);
        assert!(bio.nullable);
        assert!(bio.default.is_none());

        let created_at = author.column("created_at").unwrap();
        assert_eq!(created_at.portable_type, PortableType::Timestamp);
        let default = created_at.default.clone().unwrap();
        assert_eq!(default.kind, DefaultKind::Expression);
        assert_eq!(default.value, "CURRENT_TIMESTAMP");

        let book = database.table("book").unwrap();
        assert_eq!(book.foreign_keys.len(), 2);

        let by_author = &book.foreign_keys[0];
        assert_eq!(by_author.name, "book_author_fk");
        assert_eq!(by_author.foreign_table, "author");
        assert_eq!(by_author.local_columns(), vec!["author_id"]);
        assert_eq!(by_author.foreign_columns(), vec!["id"]);
        assert_eq!(by_author.on_delete, Some(FkAction::Cascade));
        assert_eq!(by_author.on_update, None);

        let by_editor = &book.foreign_keys[1];
        assert_eq!(by_editor.name, "book_editor_fk");
        assert_eq!(by_editor.on_delete, None);

        assert_eq!(author.uniques.len(), 1);
        assert_eq!(author.uniques[0].name, "author_name_uq");
        assert_eq!(author.uniques[0].columns, vec!["name"]);

        assert_eq!(book.indexes.len(), 1);
        assert_eq!(book.indexes[0].name, "book_title_idx");
        assert_eq!(book.indexes[0].columns, vec!["title", "author_id"]);
    }

    #[tokio::test]
    async fn skips_the_migration_bookkeeping_table() {
        let mut conn = memory_conn().await;
        seed(
            &mut conn,
            &[
                "CREATE TABLE schema_history (version INTEGER PRIMARY KEY)",
                "CREATE TABLE data (id INTEGER PRIMARY KEY)",
            ],
        )
        .await;

        let database = introspect(&mut conn, "main", Some("schema_history"))
            .await
            .unwrap();
        assert_eq!(database.tables.len(), 1);
        assert_eq!(database.tables[0].name, "data");
    }

    #[tokio::test]
    async fn literal_defaults_are_unquoted() {
        let mut conn = memory_conn().await;
        seed(
            &mut conn,
            &["CREATE TABLE job (id INTEGER PRIMARY KEY, state VARCHAR(20) DEFAULT 'pending')"],
        )
        .await;

        let database = introspect(&mut conn, "main", None).await.unwrap();
        let state = database.table("job").unwrap().column("state").unwrap();
        assert_eq!(state.default, Some(DefaultValue::literal("pending")));
    }

    #[tokio::test]
    async fn composite_primary_key_flags_every_column() {
        let mut conn = memory_conn().await;
        seed(
            &mut conn,
            &[indoc! {"
                CREATE TABLE grant_map (
                    role_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    PRIMARY KEY (role_id, user_id)
                )"}],
        )
        .await;

        let database = introspect(&mut conn, "main", None).await.unwrap();
        let table = database.table("grant_map").unwrap();
        let pk = table.primary_key();
        assert_eq!(pk.len(), 2);
        assert_eq!(pk[0].name, "role_id");
        assert_eq!(pk[1].name, "user_id");
        // plain composite keys are not autoincrement
        assert!(!pk[0].auto_increment);
    }

    #[test]
    fn anonymous_foreign_keys_get_synthesized_names() {
        let ddl = indoc! {"
            CREATE TABLE track (
                id INTEGER PRIMARY KEY,
                album_id INTEGER,
                FOREIGN KEY (album_id) REFERENCES album (id) ON DELETE SET NULL
            )"};
        let fks = foreign_keys_from_ddl("track", ddl);
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].name, "track_fk_1");
        assert_eq!(fks[0].foreign_table, "album");
        assert_eq!(fks[0].on_delete, Some(FkAction::SetNull));
    }

    #[test]
    fn quoted_identifiers_are_stripped() {
        let ddl = r#"CREATE TABLE "x" (CONSTRAINT "x_parent_fk" FOREIGN KEY ("parent_id") REFERENCES "parent" ("id"))"#;
        let fks = foreign_keys_from_ddl("x", ddl);
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].name, "x_parent_fk");
        assert_eq!(fks[0].local_columns(), vec!["parent_id"]);
        assert_eq!(fks[0].foreign_columns(), vec!["id"]);
    }

    #[test]
    fn default_normalization() {
        assert_eq!(
            normalize_default("'it''s'".to_string()),
            DefaultValue::literal("it's")
        );
        assert_eq!(
            normalize_default("42".to_string()),
            DefaultValue::literal("42")
        );
        assert_eq!(
            normalize_default("CURRENT_TIMESTAMP".to_string()),
            DefaultValue::expression("CURRENT_TIMESTAMP")
        );
        assert_eq!(
            normalize_default("(datetime('now'))".to_string()),
            DefaultValue::expression("(datetime('now'))")
        );
    }
}
