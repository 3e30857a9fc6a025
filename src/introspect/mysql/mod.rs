mod columns;
mod constraints;

use sqlx::MySqlConnection;

use crate::error::AdapterError;
use crate::schema::{Database, Table};

/// Reverse engineer a MySQL database into a schema model.
///
/// Three strictly ordered phases: every table is created empty first,
/// then columns are filled in for all tables, then foreign keys, indexes
/// and primary-key flags. The ordering matters — foreign-key resolution
/// expects every referenced table and column to already exist.
pub async fn introspect(
    conn: &mut MySqlConnection,
    db_name: &str,
    migration_table: Option<&str>,
) -> Result<Database, AdapterError> {
    let mut database = Database::new(db_name);

    let names: Vec<String> = sqlx::query_scalar("SHOW TABLES")
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
        database.tables[i].columns = columns::query_columns(conn, &name).await?;
    }

    for i in 0..database.tables.len() {
        let name = database.tables[i].name.clone();
        tracing::debug!(table = %name, "adding indices and constraints");

        let ddl = constraints::table_ddl(conn, &name).await?;
        database.tables[i].foreign_keys = constraints::foreign_keys_from_ddl(&ddl);

        let (indexes, uniques) = constraints::query_indexes(conn, &name).await?;
        database.tables[i].indexes = indexes;
        database.tables[i].uniques = uniques;

        for column in constraints::query_primary_key(conn, &name).await? {
            if let Some(col) = database.tables[i].column_mut(&column) {
                col.primary_key = true;
            }
        }
    }

    Ok(database)
}
