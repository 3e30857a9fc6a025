use crate::config::{ConnectionSettings, Driver};
use crate::connection::Conn;
use crate::dialect::Dialect;
use crate::error::AdapterError;
use crate::introspect;
use crate::schema::Database;

/// A live, capability-complete handle onto one database connection.
///
/// Pure SQL-building capabilities delegate to the [`Dialect`]; operations
/// that talk to the server (transactions, id generation, introspection)
/// go through the owned connection. One adapter wraps exactly one
/// connection and is not meant to be shared across threads — the
/// transaction-depth counter assumes a single writer.
pub struct Adapter {
    conn: Conn,
    dialect: Dialect,
    driver: Driver,
    db_name: Option<String>,
    migration_table: Option<String>,
    transaction_depth: u32,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("backend", &self.conn.backend())
            .field("dialect", &self.dialect)
            .field("driver", &self.driver)
            .field("db_name", &self.db_name)
            .field("migration_table", &self.migration_table)
            .field("transaction_depth", &self.transaction_depth)
            .finish()
    }
}

impl Adapter {
    pub(crate) fn new(conn: Conn, driver: Driver, db_name: Option<String>) -> Self {
        Adapter {
            conn,
            dialect: driver.dialect(),
            driver,
            db_name,
            migration_table: None,
            transaction_depth: 0,
        }
    }

    pub fn db_name(&self) -> Option<&str> {
        self.db_name.as_deref()
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Name of an internal migration-bookkeeping table that introspection
    /// should skip.
    pub fn set_migration_table(&mut self, name: impl Into<String>) {
        self.migration_table = Some(name.into());
    }

    // ---- capability surface (pure SQL building) ----

    pub fn quote_identifier(&self, text: &str, force: bool) -> String {
        self.dialect.quote_identifier(text, force)
    }

    pub fn string_delimiter(&self) -> char {
        self.dialect.string_delimiter()
    }

    pub fn to_upper_case(&self, input: &str) -> String {
        self.dialect.to_upper_case(input)
    }

    pub fn ignore_case(&self, input: &str) -> String {
        self.dialect.ignore_case(input)
    }

    pub fn ignore_case_in_order_by(&self, input: &str) -> String {
        self.dialect.ignore_case_in_order_by(input)
    }

    pub fn hour_start(&self, date: &str) -> Result<String, AdapterError> {
        self.dialect.hour_start(date)
    }

    pub fn day_start(&self, date: &str) -> Result<String, AdapterError> {
        self.dialect.day_start(date)
    }

    pub fn week_start(&self, date: &str) -> Result<String, AdapterError> {
        self.dialect.week_start(date)
    }

    pub fn month_start(&self, date: &str) -> Result<String, AdapterError> {
        self.dialect.month_start(date)
    }

    pub fn convert_time_zone(
        &self,
        date: &str,
        to_tz: &str,
        from_tz: Option<&str>,
    ) -> Result<String, AdapterError> {
        self.dialect.convert_time_zone(date, to_tz, from_tz)
    }

    pub fn concat_string(&self, s1: &str, s2: &str) -> String {
        self.dialect.concat_string(s1, s2)
    }

    pub fn sub_string(&self, s: &str, pos: u32, len: u32) -> String {
        self.dialect.sub_string(s, pos, len)
    }

    pub fn str_length(&self, s: &str) -> String {
        self.dialect.str_length(s)
    }

    pub fn random(&self, seed: Option<i64>) -> String {
        self.dialect.random(seed)
    }

    pub fn apply_limit(&self, sql: &str, offset: u64, limit: u64) -> Result<String, AdapterError> {
        self.dialect.apply_limit(sql, offset, limit)
    }

    // ---- connection-bound operations ----

    /// Execute a statement, returning the affected row count.
    pub async fn exec(&mut self, sql: &str) -> Result<u64, AdapterError> {
        self.conn.exec(sql).await
    }

    /// Run a query expected to produce a single integer.
    pub async fn fetch_i64(&mut self, sql: &str) -> Result<i64, AdapterError> {
        self.conn.fetch_i64(sql).await
    }

    /// Run a query expected to produce a single string.
    pub async fn fetch_string(&mut self, sql: &str) -> Result<String, AdapterError> {
        self.conn.fetch_string(sql).await
    }

    /// Post-connect initialization: the session charset first (where the
    /// dialect has one), then any configured statements, in order.
    pub async fn init_connection(
        &mut self,
        settings: &ConnectionSettings,
    ) -> Result<(), AdapterError> {
        if let Some(charset) = &settings.charset {
            self.set_charset(charset).await?;
        }
        for query in &settings.init_queries {
            self.conn.exec(query).await?;
        }
        Ok(())
    }

    /// Set the session character set. A no-op where the dialect has no
    /// session charset concept.
    pub async fn set_charset(&mut self, charset: &str) -> Result<(), AdapterError> {
        if let Some(sql) = self.dialect.charset_statement(charset) {
            self.conn.exec(&sql).await?;
        }
        Ok(())
    }

    pub fn transaction_depth(&self) -> u32 {
        self.transaction_depth
    }

    /// Open a transaction level. The first level starts a real
    /// transaction; inner levels are emulated with savepoints so each
    /// level keeps all-or-nothing semantics.
    pub async fn begin(&mut self) -> Result<(), AdapterError> {
        if self.transaction_depth == 0 {
            self.conn.exec(self.dialect.begin_sql()).await?;
        } else {
            let sql = self.dialect.savepoint_sql(self.transaction_depth);
            self.conn.exec(&sql).await?;
        }
        self.transaction_depth += 1;
        Ok(())
    }

    /// Commit the current level: the real transaction at depth 1,
    /// otherwise the corresponding savepoint is released.
    pub async fn commit(&mut self) -> Result<(), AdapterError> {
        if self.transaction_depth == 0 {
            return Err(AdapterError::NoActiveTransaction);
        }
        self.transaction_depth -= 1;
        if self.transaction_depth == 0 {
            self.conn.exec(self.dialect.commit_sql()).await?;
        } else if let Some(sql) = self.dialect.release_savepoint_sql(self.transaction_depth) {
            self.conn.exec(&sql).await?;
        }
        Ok(())
    }

    /// Roll back the current level: the real transaction at depth 1,
    /// otherwise back to the corresponding savepoint, leaving the outer
    /// transaction open.
    pub async fn rollback(&mut self) -> Result<(), AdapterError> {
        if self.transaction_depth == 0 {
            return Err(AdapterError::NoActiveTransaction);
        }
        self.transaction_depth -= 1;
        if self.transaction_depth == 0 {
            self.conn.exec(self.dialect.rollback_sql()).await?;
        } else {
            let sql = self.dialect.rollback_savepoint_sql(self.transaction_depth);
            self.conn.exec(&sql).await?;
        }
        Ok(())
    }

    /// Fetch a generated id: the last insert id for autoincrement
    /// dialects, the next value of the named sequence for sequence
    /// dialects (which must be called before the insert).
    pub async fn get_id(&mut self, name: Option<&str>) -> Result<i64, AdapterError> {
        let sql = self.dialect.identity_sql(name)?;
        self.conn.fetch_i64(&sql).await
    }

    /// Reverse engineer the connected database into a schema model.
    pub async fn get_database_schema(&mut self) -> Result<Database, AdapterError> {
        let db_name = self.db_name.clone().unwrap_or_default();
        let migration_table = self.migration_table.clone();
        let mut database = match &mut self.conn {
            Conn::MySql(conn) => {
                introspect::mysql::introspect(conn, &db_name, migration_table.as_deref()).await?
            }
            Conn::Sqlite(conn) => {
                introspect::sqlite::introspect(conn, &db_name, migration_table.as_deref()).await?
            }
            Conn::Postgres(_) | Conn::Mssql(_) => {
                return Err(AdapterError::NotImplemented("schema introspection"));
            }
        };
        database.do_final_initialization();
        Ok(database)
    }
}
