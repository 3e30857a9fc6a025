use std::sync::LazyLock;

use regex::Regex;

use super::Dialect;
use crate::error::AdapterError;

/// MySQL's comma form of LIMIT has no offset-only spelling; paging past
/// an offset with no row cap uses the documented all-rows sentinel.
const MYSQL_ALL_ROWS: &str = "18446744073709551615";

static SELECT_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\Aselect(.*)from(.*)").expect("select/from pattern"));
static SELECT_DISTINCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\Aselect\s+distinct").expect("distinct pattern"));
static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("order by pattern"));

/// Rewrite `sql` so it returns at most `limit` rows starting `offset`
/// rows into the result. A zero offset and zero limit leaves the
/// statement untouched for every dialect.
pub fn apply_limit(
    dialect: Dialect,
    sql: &str,
    offset: u64,
    limit: u64,
) -> Result<String, AdapterError> {
    if offset == 0 && limit == 0 {
        return Ok(sql.to_string());
    }
    match dialect {
        Dialect::MySql | Dialect::Access => Ok(mysql_limit(sql, offset, limit)),
        Dialect::Sqlite => Ok(sqlite_limit(sql, offset, limit)),
        Dialect::Postgres => Ok(postgres_limit(sql, offset, limit)),
        Dialect::Mssql => mssql_limit(sql, offset, limit),
        Dialect::Oracle => Ok(oracle_limit(sql, offset, limit)),
    }
}

fn mysql_limit(sql: &str, offset: u64, limit: u64) -> String {
    if limit > 0 {
        if offset > 0 {
            format!("{sql} LIMIT {offset}, {limit}")
        } else {
            format!("{sql} LIMIT {limit}")
        }
    } else {
        format!("{sql} LIMIT {offset}, {MYSQL_ALL_ROWS}")
    }
}

fn sqlite_limit(sql: &str, offset: u64, limit: u64) -> String {
    if limit > 0 {
        if offset > 0 {
            format!("{sql} LIMIT {limit} OFFSET {offset}")
        } else {
            format!("{sql} LIMIT {limit}")
        }
    } else {
        format!("{sql} LIMIT -1 OFFSET {offset}")
    }
}

fn postgres_limit(sql: &str, offset: u64, limit: u64) -> String {
    if limit > 0 {
        if offset > 0 {
            format!("{sql} LIMIT {limit} OFFSET {offset}")
        } else {
            format!("{sql} LIMIT {limit}")
        }
    } else {
        format!("{sql} LIMIT ALL OFFSET {offset}")
    }
}

/// TDS servers grew OFFSET/FETCH late and still require an ORDER BY for
/// it, so the statement is split at its top-level SELECT ... FROM and
/// reassembled: TOP for plain caps, OFFSET ... FETCH NEXT (with a
/// constant ordering injected when the query has none) for real offsets.
/// Anything that does not start with SELECT ... FROM is rejected.
fn mssql_limit(sql: &str, offset: u64, limit: u64) -> Result<String, AdapterError> {
    let caps = SELECT_FROM.captures(sql).ok_or_else(|| {
        AdapterError::MalformedQuery(
            "could not locate the SELECT statement at the start of the query".to_string(),
        )
    })?;
    let mut select_list = caps[1].trim();
    let from_clause = caps[2].trim();

    let mut select_text = String::from("SELECT ");
    if SELECT_DISTINCT.is_match(sql) {
        select_text.push_str("DISTINCT ");
        if let Some(rest) = strip_prefix_ignore_case(select_list, "distinct ") {
            select_list = rest.trim_start();
        }
    }

    // At offset 0 there is nothing to simulate: grab the top rows.
    if offset == 0 {
        return Ok(format!(
            "{select_text}TOP {limit} {select_list} FROM {from_clause}"
        ));
    }

    let mut out = sql.to_string();
    if !ORDER_BY.is_match(&out) {
        out.push_str(" ORDER BY (SELECT 1)");
    }
    out.push_str(&format!(" OFFSET {offset} ROWS"));
    if limit != 0 {
        out.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
    }
    Ok(out)
}

/// ROWNUM is assigned before ORDER BY and filtering on it only makes
/// sense after the inner query has materialized, hence the two levels:
/// the first exposes ROWNUM as a sentinel column under a cap, the second
/// discards the leading `offset` rows.
fn oracle_limit(sql: &str, offset: u64, limit: u64) -> String {
    let max = offset + limit;

    let mut out = format!(
        "SELECT A.*, rownum AS rnum\nFROM (\n  {sql}\n) A\nWHERE rownum <= {max}"
    );

    if offset > 0 {
        out = format!("SELECT B.*\nFROM (\n  {out}\n) B\nWHERE B.rnum > {offset}");
    }

    out
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
