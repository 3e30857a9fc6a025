use crate::adapter::Adapter;
use crate::config::ConnectionSettings;
use crate::connect::connect;

/// An adapter over a fresh in-memory SQLite database.
pub async fn sqlite_adapter() -> Adapter {
    let mut settings = ConnectionSettings::new("sqlite");
    settings.dbname = Some(":memory:".to_string());
    connect(&settings).await.expect("in-memory sqlite connection")
}
