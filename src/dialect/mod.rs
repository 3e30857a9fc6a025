mod limit;

use crate::error::AdapterError;

/// Supported SQL dialects. Driver identifiers map many-to-one onto these
/// (see [`crate::config::Driver::dialect`]); everything here is pure
/// string building, so the capability surface is testable without a
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Mssql,
    Oracle,
    Postgres,
    Sqlite,
    Access,
}

/// How a dialect generates row identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMethod {
    None,
    /// The id is produced by the insert itself and fetched afterwards.
    AutoIncrement,
    /// The id comes from a named sequence and must be fetched before the
    /// insert.
    Sequence,
}

impl Dialect {
    fn identifier_quotes(&self) -> (char, char) {
        match self {
            Dialect::MySql => ('`', '`'),
            Dialect::Mssql | Dialect::Access => ('[', ']'),
            Dialect::Oracle | Dialect::Postgres | Dialect::Sqlite => ('"', '"'),
        }
    }

    /// Quote a database object identifier (table, column, sequence).
    ///
    /// Unless `force` is set, text that already contains the quoting
    /// character, a space, a parenthesis or a wildcard is passed through
    /// untouched — it is assumed to be already quoted or an expression.
    /// Dotted paths are quoted per segment.
    pub fn quote_identifier(&self, text: &str, force: bool) -> String {
        let (open, close) = self.identifier_quotes();
        if !force
            && (text.contains(open)
                || text.contains(' ')
                || text.contains('(')
                || text.contains('*'))
        {
            return text.to_string();
        }
        let separator = format!("{close}.{open}");
        format!("{open}{}{close}", text.replace('.', &separator))
    }

    /// The delimiter for string literals.
    pub fn string_delimiter(&self) -> char {
        '\''
    }

    pub fn to_upper_case(&self, input: &str) -> String {
        format!("UPPER({input})")
    }

    /// Case-insensitive comparison form of an expression.
    pub fn ignore_case(&self, input: &str) -> String {
        format!("UPPER({input})")
    }

    /// Case-insensitive form for ORDER BY. Identical to [`ignore_case`]
    /// everywhere today; kept separate because some servers treat ORDER
    /// BY expressions differently.
    ///
    /// [`ignore_case`]: Dialect::ignore_case
    pub fn ignore_case_in_order_by(&self, input: &str) -> String {
        self.ignore_case(input)
    }

    /// SQL truncating a date/time expression to the start of its hour.
    pub fn hour_start(&self, date: &str) -> Result<String, AdapterError> {
        match self {
            Dialect::MySql => Ok(format!("DATE_FORMAT({date}, '%Y-%m-%d %H:00:00')")),
            Dialect::Mssql => Ok(format!("DATEADD(HOUR, DATEDIFF(HOUR, 0, {date}), 0)")),
            Dialect::Oracle => Ok(format!("TRUNC({date}, 'HH')")),
            Dialect::Postgres => Ok(format!("DATE_TRUNC('hour', {date})")),
            Dialect::Sqlite => Ok(format!(
                "datetime({date}, '-' || STRFTIME('%M', {date}) || ' minutes', \
                 '-' || STRFTIME('%S', {date}) || ' seconds')"
            )),
            Dialect::Access => Err(AdapterError::NotImplemented("hour_start")),
        }
    }

    /// SQL truncating a date/time expression to the start of its day.
    pub fn day_start(&self, date: &str) -> Result<String, AdapterError> {
        match self {
            Dialect::MySql => Ok(format!("DATE({date})")),
            Dialect::Mssql => Ok(format!("CAST({date} AS DATE)")),
            Dialect::Oracle => Ok(format!("TO_DATE({date})")),
            Dialect::Postgres => Ok(format!("DATE_TRUNC('day', {date})")),
            Dialect::Sqlite => Ok(format!("DATE({date}, 'start of day')")),
            Dialect::Access => Err(AdapterError::NotImplemented("day_start")),
        }
    }

    /// SQL truncating a date/time expression to the first day of its
    /// week. Weeks start on Sunday; MSSQL anchors the arithmetic to
    /// 1905-01-01, a known Sunday, because DATEDIFF weeks are otherwise
    /// @@DATEFIRST-dependent.
    pub fn week_start(&self, date: &str) -> Result<String, AdapterError> {
        match self {
            Dialect::MySql => Ok(format!(
                "DATE(DATE_ADD({date}, INTERVAL(1 - DAYOFWEEK({date})) DAY))"
            )),
            Dialect::Mssql => Ok(format!(
                "CAST(DATEADD(WEEK, DATEDIFF(WEEK, '19050101', {date}), '19050101') AS DATE)"
            )),
            Dialect::Oracle => Ok(format!("TRUNC({date}, 'DY')")),
            Dialect::Postgres => Ok(format!(
                "(DATE_TRUNC('week', {date} + INTERVAL '1 day') - INTERVAL '1 day')"
            )),
            Dialect::Sqlite => Ok(format!(
                "CASE DATE({date}, 'weekday 0') \
                 WHEN DATE({date}) THEN DATE({date}) \
                 ELSE DATE({date}, 'weekday 0', '-7 days') \
                 END"
            )),
            Dialect::Access => Err(AdapterError::NotImplemented("week_start")),
        }
    }

    /// SQL truncating a date/time expression to the first day of its
    /// month.
    pub fn month_start(&self, date: &str) -> Result<String, AdapterError> {
        match self {
            Dialect::MySql => Ok(format!(
                "ADDDATE(LAST_DAY(SUBDATE({date}, INTERVAL 1 MONTH)), 1)"
            )),
            Dialect::Mssql => Ok(format!(
                "CAST(DATEADD(MONTH, DATEDIFF(MONTH, 0, {date}), 0) AS DATE)"
            )),
            Dialect::Oracle => Ok(format!("TRUNC({date}, 'MONTH')")),
            Dialect::Postgres => Ok(format!("DATE_TRUNC('month', {date})")),
            Dialect::Sqlite => Ok(format!("DATE({date}, 'start of month')")),
            Dialect::Access => Err(AdapterError::NotImplemented("month_start")),
        }
    }

    /// SQL converting a date expression between named time zones. When
    /// `from_tz` is omitted the connection's session zone is assumed.
    pub fn convert_time_zone(
        &self,
        date: &str,
        to_tz: &str,
        from_tz: Option<&str>,
    ) -> Result<String, AdapterError> {
        match self {
            Dialect::MySql => {
                let from = match from_tz {
                    Some(tz) => format!("'{tz}'"),
                    None => "@@session.time_zone".to_string(),
                };
                Ok(format!("CONVERT_TZ({date}, {from}, '{to_tz}')"))
            }
            Dialect::Postgres => Ok(match from_tz {
                Some(from) => format!("((({date}) AT TIME ZONE '{from}') AT TIME ZONE '{to_tz}')"),
                None => format!("((({date})::timestamptz) AT TIME ZONE '{to_tz}')"),
            }),
            // SQLite stores naive date-times; normalize the format and
            // leave the zone alone.
            Dialect::Sqlite => Ok(format!("DATETIME({date})")),
            Dialect::Mssql | Dialect::Oracle | Dialect::Access => {
                Err(AdapterError::NotImplemented("time zone conversion"))
            }
        }
    }

    /// SQL concatenating the second string expression onto the first.
    pub fn concat_string(&self, s1: &str, s2: &str) -> String {
        match self {
            Dialect::MySql | Dialect::Oracle | Dialect::Access => format!("CONCAT({s1}, {s2})"),
            Dialect::Mssql => format!("({s1} + {s2})"),
            Dialect::Postgres | Dialect::Sqlite => format!("({s1} || {s2})"),
        }
    }

    /// SQL extracting `len` characters starting at the 1-based `pos`.
    pub fn sub_string(&self, s: &str, pos: u32, len: u32) -> String {
        match self {
            Dialect::Oracle => format!("SUBSTR({s}, {pos}, {len})"),
            Dialect::Sqlite => format!("substr({s}, {pos}, {len})"),
            _ => format!("SUBSTRING({s}, {pos}, {len})"),
        }
    }

    /// SQL computing the length in characters of a string expression.
    pub fn str_length(&self, s: &str) -> String {
        match self {
            Dialect::MySql | Dialect::Access | Dialect::Postgres => format!("CHAR_LENGTH({s})"),
            Dialect::Mssql => format!("LEN({s})"),
            Dialect::Oracle => format!("LENGTH({s})"),
            Dialect::Sqlite => format!("length({s})"),
        }
    }

    /// SQL producing a random number. Dialects without seed support
    /// ignore the seed.
    pub fn random(&self, seed: Option<i64>) -> String {
        match self {
            Dialect::MySql | Dialect::Mssql | Dialect::Access => {
                format!("rand({})", seed.unwrap_or(0))
            }
            Dialect::Oracle => "dbms_random.value".to_string(),
            Dialect::Postgres | Dialect::Sqlite => "random()".to_string(),
        }
    }

    /// Rewrite `sql` to return at most `limit` rows starting `offset`
    /// rows in. `offset == 0 && limit == 0` leaves the statement alone.
    pub fn apply_limit(&self, sql: &str, offset: u64, limit: u64) -> Result<String, AdapterError> {
        limit::apply_limit(*self, sql, offset, limit)
    }

    pub fn id_method(&self) -> IdMethod {
        match self {
            Dialect::Oracle => IdMethod::Sequence,
            _ => IdMethod::AutoIncrement,
        }
    }

    pub fn is_get_id_before_insert(&self) -> bool {
        self.id_method() == IdMethod::Sequence
    }

    pub fn is_get_id_after_insert(&self) -> bool {
        self.id_method() == IdMethod::AutoIncrement
    }

    /// The statement fetching a generated id: the next sequence value for
    /// sequence dialects (requires the sequence name), the last insert id
    /// otherwise.
    pub fn identity_sql(&self, sequence: Option<&str>) -> Result<String, AdapterError> {
        match self {
            Dialect::Oracle => {
                let name = sequence.ok_or(AdapterError::MissingSequenceName)?;
                Ok(format!("SELECT {name}.nextval FROM dual"))
            }
            Dialect::Postgres => Ok(match sequence {
                Some(name) => format!("SELECT CURRVAL('{name}')"),
                None => "SELECT LASTVAL()".to_string(),
            }),
            Dialect::MySql => Ok("SELECT CAST(LAST_INSERT_ID() AS SIGNED)".to_string()),
            Dialect::Sqlite => Ok("SELECT last_insert_rowid()".to_string()),
            Dialect::Mssql => Ok("SELECT CAST(SCOPE_IDENTITY() AS BIGINT)".to_string()),
            Dialect::Access => Ok("SELECT @@IDENTITY".to_string()),
        }
    }

    /// The session charset statement, where the dialect has one. SQLite
    /// has no per-session charset; the TDS and Oracle families set it at
    /// connect time.
    pub fn charset_statement(&self, charset: &str) -> Option<String> {
        match self {
            Dialect::MySql | Dialect::Postgres => Some(format!("SET NAMES '{charset}'")),
            _ => None,
        }
    }

    pub fn begin_sql(&self) -> &'static str {
        match self {
            Dialect::Mssql => "BEGIN TRANSACTION",
            Dialect::MySql => "START TRANSACTION",
            Dialect::Oracle => "SET TRANSACTION READ WRITE",
            _ => "BEGIN",
        }
    }

    pub fn commit_sql(&self) -> &'static str {
        match self {
            Dialect::Mssql => "COMMIT TRANSACTION",
            _ => "COMMIT",
        }
    }

    pub fn rollback_sql(&self) -> &'static str {
        match self {
            Dialect::Mssql => "ROLLBACK TRANSACTION",
            _ => "ROLLBACK",
        }
    }

    pub fn savepoint_sql(&self, depth: u32) -> String {
        match self {
            Dialect::Mssql => format!("SAVE TRANSACTION LEVEL{depth}"),
            _ => format!("SAVEPOINT LEVEL{depth}"),
        }
    }

    /// `None` where the dialect has no RELEASE form (TDS and Oracle
    /// savepoints are simply abandoned on commit).
    pub fn release_savepoint_sql(&self, depth: u32) -> Option<String> {
        match self {
            Dialect::Mssql | Dialect::Oracle => None,
            _ => Some(format!("RELEASE SAVEPOINT LEVEL{depth}")),
        }
    }

    pub fn rollback_savepoint_sql(&self, depth: u32) -> String {
        match self {
            Dialect::Mssql => format!("ROLLBACK TRANSACTION LEVEL{depth}"),
            _ => format!("ROLLBACK TO SAVEPOINT LEVEL{depth}"),
        }
    }
}
