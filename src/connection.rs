use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::AdapterError;

/// A live backend connection handle, one variant per native client.
///
/// The adapter layer needs exactly two primitives from a backend —
/// execute a statement, and fetch a single integer — so that is all this
/// enum exposes. Introspectors work against the concrete variant instead,
/// because catalog queries need typed row access.
pub enum Conn {
    MySql(sqlx::MySqlConnection),
    Postgres(sqlx::PgConnection),
    Sqlite(sqlx::SqliteConnection),
    Mssql(Box<tiberius::Client<Compat<TcpStream>>>),
}

impl Conn {
    pub fn backend(&self) -> &'static str {
        match self {
            Conn::MySql(_) => "mysql",
            Conn::Postgres(_) => "postgres",
            Conn::Sqlite(_) => "sqlite",
            Conn::Mssql(_) => "mssql",
        }
    }

    /// Execute a statement, returning the affected row count.
    pub async fn exec(&mut self, sql: &str) -> Result<u64, AdapterError> {
        tracing::debug!(sql, "exec");
        match self {
            Conn::MySql(conn) => Ok(sqlx::query(sql).execute(&mut *conn).await?.rows_affected()),
            Conn::Postgres(conn) => Ok(sqlx::query(sql).execute(&mut *conn).await?.rows_affected()),
            Conn::Sqlite(conn) => Ok(sqlx::query(sql).execute(&mut *conn).await?.rows_affected()),
            Conn::Mssql(client) => Ok(client.execute(sql, &[]).await?.total()),
        }
    }

    /// Run a query expected to produce a single string scalar.
    pub async fn fetch_string(&mut self, sql: &str) -> Result<String, AdapterError> {
        tracing::debug!(sql, "fetch scalar");
        match self {
            Conn::MySql(conn) => Ok(sqlx::query_scalar(sql).fetch_one(&mut *conn).await?),
            Conn::Postgres(conn) => Ok(sqlx::query_scalar(sql).fetch_one(&mut *conn).await?),
            Conn::Sqlite(conn) => Ok(sqlx::query_scalar(sql).fetch_one(&mut *conn).await?),
            Conn::Mssql(client) => {
                let row = client
                    .simple_query(sql)
                    .await?
                    .into_row()
                    .await?
                    .ok_or_else(|| AdapterError::NoRows(sql.to_string()))?;
                row.get::<&str, _>(0)
                    .map(str::to_string)
                    .ok_or_else(|| AdapterError::NoRows(sql.to_string()))
            }
        }
    }

    /// Run a query expected to produce a single integer scalar.
    pub async fn fetch_i64(&mut self, sql: &str) -> Result<i64, AdapterError> {
        tracing::debug!(sql, "fetch scalar");
        match self {
            Conn::MySql(conn) => Ok(sqlx::query_scalar(sql).fetch_one(&mut *conn).await?),
            Conn::Postgres(conn) => Ok(sqlx::query_scalar(sql).fetch_one(&mut *conn).await?),
            Conn::Sqlite(conn) => Ok(sqlx::query_scalar(sql).fetch_one(&mut *conn).await?),
            Conn::Mssql(client) => {
                let row = client
                    .simple_query(sql)
                    .await?
                    .into_row()
                    .await?
                    .ok_or_else(|| AdapterError::NoRows(sql.to_string()))?;
                row.get::<i64, _>(0)
                    .ok_or_else(|| AdapterError::NoRows(sql.to_string()))
            }
        }
    }
}
