use std::path::Path;
use std::str::FromStr;

use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::ConnectOptions;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use crate::adapter::Adapter;
use crate::config::{ConnectionSettings, Driver};
use crate::connection::Conn;
use crate::dialect::Dialect;
use crate::error::AdapterError;

/// Build a live, capability-complete adapter from a logical connection
/// configuration.
///
/// The driver identifier is validated first (fatal on unknown values),
/// the dialect-specific connection descriptor is assembled, the native
/// connection is opened, and post-connect initialization (charset, init
/// statements) runs before the adapter is handed out. Low-level connect
/// failures surface as [`AdapterError::ConnectionFailed`] carrying the
/// driver's message; the raw client error type never escapes.
pub async fn connect(settings: &ConnectionSettings) -> Result<Adapter, AdapterError> {
    let driver = settings.driver()?;
    let descriptor = descriptor(driver, settings)?;
    tracing::debug!(driver = driver.as_str(), descriptor, "opening connection");
    if settings.persistent {
        // PDO-style persistent handles have no equivalent here; the flag
        // is accepted for configuration parity.
        tracing::debug!("ignoring persistent flag: connections are not pooled at this layer");
    }

    let conn = open(driver, settings).await?;
    let mut adapter = Adapter::new(conn, driver, settings.dbname.clone());
    adapter.init_connection(settings).await?;
    Ok(adapter)
}

/// Assemble the dialect-specific connection-descriptor string.
///
/// This is the canonical, loggable description of where the adapter is
/// pointed, with each driver's quirks applied: ODBC/Access checks that
/// the database file exists and escapes `;` inside values, the
/// PostgreSQL family folds user/password into space-separated key/value
/// pairs (escaping spaces) instead of passing them as discrete fields,
/// and dblib pins the TDS version for UTF-8 support.
pub fn descriptor(driver: Driver, settings: &ConnectionSettings) -> Result<String, AdapterError> {
    let mut parts: Vec<String> = Vec::new();

    let dsn = match driver {
        Driver::Access => {
            if let Some(dbname) = &settings.dbname {
                if !Path::new(dbname).exists() {
                    return Err(AdapterError::FileNotFound(dbname.into()));
                }
                parts.push(format!("Dbq={dbname}"));
            }
            if let Some(user) = &settings.user {
                parts.push(format!("Uid={user}"));
            }
            if let Some(password) = &settings.password {
                parts.push(format!("Pwd={password}"));
            }
            format!(
                "odbc:Driver={{Microsoft Access Driver (*.mdb, *.accdb)}};{}",
                join_escaped(&parts, ';')
            )
        }

        Driver::Sqlite | Driver::Sqlite2 => {
            format!("{}:{}", driver, settings.dbname.as_deref().unwrap_or(""))
        }

        Driver::Mysql => {
            if let Some(host) = &settings.host {
                parts.push(format!("host={host}"));
            }
            if let Some(port) = settings.port {
                parts.push(format!("port={port}"));
            }
            if let Some(socket) = &settings.unix_socket {
                parts.push(format!("unix_socket={socket}"));
            }
            if let Some(dbname) = &settings.dbname {
                parts.push(format!("dbname={dbname}"));
            }
            format!("mysql:{}", join_escaped(&parts, ';'))
        }

        Driver::Oracle | Driver::Oci => {
            if let Some(host) = &settings.host {
                let mut dbname = format!("dbname=//{host}");
                if let Some(port) = settings.port {
                    dbname.push_str(&format!(":{port}"));
                }
                if let Some(db) = &settings.dbname {
                    dbname.push_str(&format!("/{db}"));
                }
                parts.push(dbname);
            } else if let Some(db) = &settings.dbname {
                parts.push(format!("dbname={db}"));
            }
            if let Some(charset) = &settings.charset {
                parts.push(format!("charset={charset}"));
            }
            format!("oci:{}", join_escaped(&parts, ';'))
        }

        Driver::Pgsql | Driver::Redshift => {
            if let Some(host) = &settings.host {
                parts.push(format!("host={host}"));
            }
            if let Some(port) = settings.port {
                parts.push(format!("port={port}"));
            }
            if let Some(dbname) = &settings.dbname {
                parts.push(format!("dbname={dbname}"));
            }
            if let Some(user) = &settings.user {
                parts.push(format!("user={user}"));
            }
            if let Some(password) = &settings.password {
                parts.push(format!("password={password}"));
            }
            format!("pgsql:{}", join_escaped(&parts, ' '))
        }

        Driver::Sqlsrv => {
            if let Some(host) = &settings.host {
                parts.push(format!("server={host}"));
            }
            if let Some(dbname) = &settings.dbname {
                parts.push(format!("database={dbname}"));
            }
            if let Some(charset) = &settings.charset {
                parts.push(format!("charset={charset}"));
            }
            if let Some(appname) = &settings.appname {
                parts.push(format!("appname={appname}"));
            }
            format!("sqlsrv:{}", join_escaped(&parts, ';'))
        }

        Driver::Mssql | Driver::Sybase | Driver::Dblib => {
            if let Some(host) = &settings.host {
                let mut part = format!("host={host}");
                if let Some(port) = settings.port {
                    part.push_str(&format!(":{port}"));
                }
                parts.push(part);
            }
            if let Some(dbname) = &settings.dbname {
                parts.push(format!("dbname={dbname}"));
            }
            if let Some(charset) = &settings.charset {
                parts.push(format!("charset={charset}"));
            }
            if let Some(appname) = &settings.appname {
                parts.push(format!("appname={appname}"));
            }
            // UTF-8 over dblib needs at least TDS 7.0
            if driver == Driver::Dblib {
                parts.push("version=7.0".to_string());
            }
            format!("{}:{}", driver, join_escaped(&parts, ';'))
        }
    };

    Ok(dsn)
}

fn join_escaped(parts: &[String], separator: char) -> String {
    let escaped: Vec<String> = parts
        .iter()
        .map(|p| p.replace(separator, &format!("\\{separator}")))
        .collect();
    escaped.join(&separator.to_string())
}

async fn open(driver: Driver, settings: &ConnectionSettings) -> Result<Conn, AdapterError> {
    match driver.dialect() {
        Dialect::MySql => {
            let mut opts = MySqlConnectOptions::new();
            if let Some(host) = &settings.host {
                opts = opts.host(host);
            }
            if let Some(port) = settings.port {
                opts = opts.port(port);
            }
            if let Some(socket) = &settings.unix_socket {
                opts = opts.socket(socket);
            }
            if let Some(dbname) = &settings.dbname {
                opts = opts.database(dbname);
            }
            if let Some(user) = &settings.user {
                opts = opts.username(user);
            }
            if let Some(password) = &settings.password {
                opts = opts.password(password);
            }
            if let Some(charset) = &settings.charset {
                opts = opts.charset(charset);
            }
            let conn = opts
                .connect()
                .await
                .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
            Ok(Conn::MySql(conn))
        }

        Dialect::Postgres => {
            let mut opts = PgConnectOptions::new();
            if let Some(host) = &settings.host {
                opts = opts.host(host);
            }
            if let Some(port) = settings.port {
                opts = opts.port(port);
            }
            if let Some(dbname) = &settings.dbname {
                opts = opts.database(dbname);
            }
            if let Some(user) = &settings.user {
                opts = opts.username(user);
            }
            if let Some(password) = &settings.password {
                opts = opts.password(password);
            }
            if let Some(appname) = &settings.appname {
                opts = opts.application_name(appname);
            }
            let conn = opts
                .connect()
                .await
                .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
            Ok(Conn::Postgres(conn))
        }

        Dialect::Sqlite => {
            let dbname = settings.dbname.as_deref().unwrap_or(":memory:");
            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{dbname}"))
                .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?
                .create_if_missing(true);
            let conn = opts
                .connect()
                .await
                .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
            Ok(Conn::Sqlite(conn))
        }

        Dialect::Mssql => {
            let mut config = Config::new();
            if let Some(host) = &settings.host {
                config.host(host);
            }
            if let Some(port) = settings.port {
                config.port(port);
            }
            if let Some(dbname) = &settings.dbname {
                config.database(dbname);
            }
            if let Some(user) = &settings.user {
                let password = settings.password.as_deref().unwrap_or("");
                config.authentication(AuthMethod::sql_server(user, password));
            }
            if let Some(appname) = &settings.appname {
                config.application_name(appname);
            }
            config.encryption(EncryptionLevel::Required);
            if settings.trust_cert {
                config.trust_cert();
            }

            let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
                AdapterError::ConnectionFailed(format!(
                    "TCP connection to {} failed: {e}",
                    config.get_addr()
                ))
            })?;
            tcp.set_nodelay(true)
                .map_err(|e| AdapterError::ConnectionFailed(format!("set TCP_NODELAY: {e}")))?;
            let client = Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
            Ok(Conn::Mssql(Box::new(client)))
        }

        // No native Rust client for these; the descriptor is still built
        // and validated so configuration errors surface early.
        Dialect::Oracle | Dialect::Access => {
            Err(AdapterError::NotImplemented("a native connection"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(driver: &str) -> ConnectionSettings {
        ConnectionSettings::new(driver)
    }

    #[test]
    fn mysql_descriptor() {
        let mut s = settings("mysql");
        s.host = Some("localhost".to_string());
        s.port = Some(3306);
        s.dbname = Some("app".to_string());
        let driver = s.driver().unwrap();
        assert_eq!(
            descriptor(driver, &s).unwrap(),
            "mysql:host=localhost;port=3306;dbname=app"
        );
    }

    #[test]
    fn mysql_descriptor_with_socket() {
        let mut s = settings("mysql");
        s.unix_socket = Some("/run/mysqld/mysqld.sock".to_string());
        s.dbname = Some("app".to_string());
        assert_eq!(
            descriptor(Driver::Mysql, &s).unwrap(),
            "mysql:unix_socket=/run/mysqld/mysqld.sock;dbname=app"
        );
    }

    #[test]
    fn pgsql_descriptor_folds_credentials_and_escapes_spaces() {
        let mut s = settings("pgsql");
        s.host = Some("db.internal".to_string());
        s.dbname = Some("app".to_string());
        s.user = Some("report user".to_string());
        s.password = Some("secret".to_string());
        assert_eq!(
            descriptor(Driver::Pgsql, &s).unwrap(),
            "pgsql:host=db.internal dbname=app user=report\\ user password=secret"
        );
    }

    #[test]
    fn redshift_uses_the_pgsql_descriptor() {
        let mut s = settings("redshift");
        s.host = Some("cluster".to_string());
        s.dbname = Some("warehouse".to_string());
        assert_eq!(
            descriptor(Driver::Redshift, &s).unwrap(),
            "pgsql:host=cluster dbname=warehouse"
        );
    }

    #[test]
    fn oracle_descriptor_with_host_port_service() {
        let mut s = settings("oci");
        s.host = Some("ora1".to_string());
        s.port = Some(1521);
        s.dbname = Some("XE".to_string());
        s.charset = Some("AL32UTF8".to_string());
        assert_eq!(
            descriptor(Driver::Oci, &s).unwrap(),
            "oci:dbname=//ora1:1521/XE;charset=AL32UTF8"
        );
    }

    #[test]
    fn oracle_descriptor_without_host() {
        let mut s = settings("oracle");
        s.dbname = Some("XE".to_string());
        assert_eq!(descriptor(Driver::Oracle, &s).unwrap(), "oci:dbname=XE");
    }

    #[test]
    fn dblib_descriptor_pins_tds_version() {
        let mut s = settings("dblib");
        s.host = Some("db.example.com".to_string());
        s.port = Some(1433);
        s.dbname = Some("app".to_string());
        assert_eq!(
            descriptor(Driver::Dblib, &s).unwrap(),
            "dblib:host=db.example.com:1433;dbname=app;version=7.0"
        );
    }

    #[test]
    fn sqlsrv_descriptor() {
        let mut s = settings("sqlsrv");
        s.host = Some("db".to_string());
        s.dbname = Some("app".to_string());
        s.appname = Some("reporting".to_string());
        assert_eq!(
            descriptor(Driver::Sqlsrv, &s).unwrap(),
            "sqlsrv:server=db;database=app;appname=reporting"
        );
    }

    #[test]
    fn mssql_descriptor_escapes_separators() {
        let mut s = settings("mssql");
        s.host = Some("db".to_string());
        s.dbname = Some("app;extra".to_string());
        assert_eq!(
            descriptor(Driver::Mssql, &s).unwrap(),
            "mssql:host=db;dbname=app\\;extra"
        );
    }

    #[test]
    fn sqlite_descriptor() {
        let mut s = settings("sqlite");
        s.dbname = Some(":memory:".to_string());
        assert_eq!(descriptor(Driver::Sqlite, &s).unwrap(), "sqlite::memory:");
    }

    #[test]
    fn access_requires_an_existing_file() {
        let mut s = settings("access");
        s.dbname = Some("/no/such/file.accdb".to_string());
        let err = descriptor(Driver::Access, &s).unwrap_err();
        assert!(matches!(err, AdapterError::FileNotFound(_)));
    }

    #[test]
    fn access_descriptor_for_existing_file() {
        let path = std::env::temp_dir().join("sqlbridge_access_test.accdb");
        std::fs::write(&path, b"").unwrap();
        let mut s = settings("access");
        s.dbname = Some(path.to_string_lossy().into_owned());
        s.user = Some("admin".to_string());
        let dsn = descriptor(Driver::Access, &s).unwrap();
        assert!(dsn.starts_with("odbc:Driver={Microsoft Access Driver (*.mdb, *.accdb)};Dbq="));
        assert!(dsn.ends_with(";Uid=admin"));
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn unsupported_driver_is_fatal() {
        let err = connect(&settings("mongodb")).await.unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedDriver(_)));
    }

    #[tokio::test]
    async fn oracle_connections_are_declined() {
        let mut s = settings("oracle");
        s.dbname = Some("XE".to_string());
        let err = connect(&s).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotImplemented(_)));
    }
}
