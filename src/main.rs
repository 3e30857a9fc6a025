mod cli;

use std::fs;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlbridge::schema::{Database, DefaultKind};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = cli.parse_connection()?;

    tracing::debug!("Connecting to database...");
    let mut adapter = sqlbridge::connect(&settings).await?;
    if let Some(table) = &cli.migration_table {
        adapter.set_migration_table(table);
    }

    tracing::debug!("Introspecting schema...");
    let database = adapter.get_database_schema().await?;
    tracing::debug!("Found {} tables", database.tables.len());

    let output = render(&database);
    match cli.outfile {
        Some(ref path) => {
            fs::write(path, &output)?;
            tracing::info!("Output written to {path}");
        }
        None => {
            print!("{output}");
        }
    }

    Ok(())
}

/// Plain-text schema report.
fn render(database: &Database) -> String {
    let mut out = String::new();
    out.push_str(&format!("database {}\n", database.name));

    for table in &database.tables {
        out.push_str(&format!("\ntable {}\n", table.name));

        for column in &table.columns {
            let mut line = format!("  {} {}", column.name, column.portable_type);
            if let Some(size) = column.size {
                match column.scale {
                    Some(scale) => line.push_str(&format!("({size},{scale})")),
                    None => line.push_str(&format!("({size})")),
                }
            }
            if column.primary_key {
                line.push_str(" PRIMARY KEY");
            }
            if column.auto_increment {
                line.push_str(" AUTOINCREMENT");
            }
            if !column.nullable {
                line.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                match default.kind {
                    DefaultKind::Expression => line.push_str(&format!(" DEFAULT {}", default.value)),
                    DefaultKind::Literal => line.push_str(&format!(" DEFAULT '{}'", default.value)),
                }
            }
            out.push_str(&line);
            out.push('\n');
        }

        for unique in &table.uniques {
            out.push_str(&format!(
                "  unique {} ({})\n",
                unique.name,
                unique.columns.join(", ")
            ));
        }
        for index in &table.indexes {
            out.push_str(&format!(
                "  index {} ({})\n",
                index.name,
                index.columns.join(", ")
            ));
        }
        for fk in &table.foreign_keys {
            let mut line = format!(
                "  foreign key {} ({}) references {} ({})",
                fk.name,
                fk.local_columns().join(", "),
                fk.foreign_table,
                fk.foreign_columns().join(", ")
            );
            if let Some(action) = fk.on_delete {
                line.push_str(&format!(" on delete {}", action.as_str()));
            }
            if let Some(action) = fk.on_update {
                line.push_str(&format!(" on update {}", action.as_str()));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}
