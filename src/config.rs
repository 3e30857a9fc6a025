use std::fmt;
use std::str::FromStr;

use crate::dialect::Dialect;
use crate::error::AdapterError;

/// Recognized driver identifiers. Several identifiers share a dialect
/// (e.g. `sqlsrv`, `mssql`, `sybase` and `dblib` are all TDS servers);
/// the identifier is kept verbatim because descriptor assembly differs
/// per driver even within a dialect family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Access,
    Sqlite,
    Sqlite2,
    Mysql,
    Oracle,
    Oci,
    Pgsql,
    Redshift,
    Sqlsrv,
    Mssql,
    Sybase,
    Dblib,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Access => "access",
            Driver::Sqlite => "sqlite",
            Driver::Sqlite2 => "sqlite2",
            Driver::Mysql => "mysql",
            Driver::Oracle => "oracle",
            Driver::Oci => "oci",
            Driver::Pgsql => "pgsql",
            Driver::Redshift => "redshift",
            Driver::Sqlsrv => "sqlsrv",
            Driver::Mssql => "mssql",
            Driver::Sybase => "sybase",
            Driver::Dblib => "dblib",
        }
    }

    /// The dialect whose capability surface this driver gets.
    pub fn dialect(&self) -> Dialect {
        match self {
            Driver::Access => Dialect::Access,
            Driver::Sqlite | Driver::Sqlite2 => Dialect::Sqlite,
            Driver::Mysql => Dialect::MySql,
            Driver::Oracle | Driver::Oci => Dialect::Oracle,
            Driver::Pgsql | Driver::Redshift => Dialect::Postgres,
            Driver::Sqlsrv | Driver::Mssql | Driver::Sybase | Driver::Dblib => Dialect::Mssql,
        }
    }
}

impl FromStr for Driver {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Driver::Access),
            "sqlite" => Ok(Driver::Sqlite),
            "sqlite2" => Ok(Driver::Sqlite2),
            "mysql" => Ok(Driver::Mysql),
            "oracle" => Ok(Driver::Oracle),
            "oci" => Ok(Driver::Oci),
            "pgsql" => Ok(Driver::Pgsql),
            "redshift" => Ok(Driver::Redshift),
            "sqlsrv" => Ok(Driver::Sqlsrv),
            "mssql" => Ok(Driver::Mssql),
            "sybase" => Ok(Driver::Sybase),
            "dblib" => Ok(Driver::Dblib),
            other => Err(AdapterError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connection configuration, independent of any driver's native
/// option set.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    /// Driver identifier; must parse as a [`Driver`].
    pub driver: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database name, schema, or file path depending on the driver.
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub unix_socket: Option<String>,
    pub charset: Option<String>,
    /// Application name, forwarded where the server supports it.
    pub appname: Option<String>,
    pub persistent: bool,
    /// Trust the server certificate without validation (MSSQL family).
    pub trust_cert: bool,
    /// Statements executed in order right after the connection is
    /// established (after the charset, if any).
    pub init_queries: Vec<String>,
}

impl ConnectionSettings {
    pub fn new(driver: impl Into<String>) -> Self {
        ConnectionSettings {
            driver: driver.into(),
            ..Default::default()
        }
    }

    pub fn driver(&self) -> Result<Driver, AdapterError> {
        self.driver.parse()
    }
}

/// Truthiness rules for loosely-typed flag values (URL query parameters,
/// environment strings): exactly `"true"` or `"1"`, or `"on"` in any case.
pub fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1" || value.eq_ignore_ascii_case("on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_round_trip() {
        for name in [
            "access", "sqlite", "sqlite2", "mysql", "oracle", "oci", "pgsql", "redshift",
            "sqlsrv", "mssql", "sybase", "dblib",
        ] {
            let driver: Driver = name.parse().unwrap();
            assert_eq!(driver.as_str(), name);
        }
    }

    #[test]
    fn unknown_driver_is_fatal() {
        let err = "mongodb".parse::<Driver>().unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedDriver(ref d) if d == "mongodb"));
    }

    #[test]
    fn driver_aliases_share_a_dialect() {
        assert_eq!("sqlsrv".parse::<Driver>().unwrap().dialect(), Dialect::Mssql);
        assert_eq!("sybase".parse::<Driver>().unwrap().dialect(), Dialect::Mssql);
        assert_eq!("dblib".parse::<Driver>().unwrap().dialect(), Dialect::Mssql);
        assert_eq!("oci".parse::<Driver>().unwrap().dialect(), Dialect::Oracle);
        assert_eq!("redshift".parse::<Driver>().unwrap().dialect(), Dialect::Postgres);
        assert_eq!("sqlite2".parse::<Driver>().unwrap().dialect(), Dialect::Sqlite);
    }

    #[test]
    fn truthy_variants() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy("on"));
        assert!(is_truthy("ON"));
        assert!(!is_truthy("TRUE"));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
