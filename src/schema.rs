use crate::typemap::PortableType;

/// A fully introspected database: an ordered collection of tables, in
/// discovery order. Built once per introspection run and handed to the
/// caller by value; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Database {
    pub name: String,
    pub tables: Vec<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Database {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: Table) {
        debug_assert!(
            self.table(&table.name).is_none(),
            "duplicate table {}",
            table.name
        );
        self.tables.push(table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Post-build finalization. Foreign keys are recorded by name while
    /// tables are still being populated, so cross-table references are
    /// only checked once the whole graph exists. A dangling reference
    /// (e.g. to a table excluded from introspection) is reported but kept.
    pub fn do_final_initialization(&mut self) {
        for table in &self.tables {
            for fk in &table.foreign_keys {
                match self.table(&fk.foreign_table) {
                    None => {
                        tracing::warn!(
                            "foreign key {} on {} references unknown table {}",
                            fk.name,
                            table.name,
                            fk.foreign_table
                        );
                    }
                    Some(foreign) => {
                        for (_, foreign_column) in &fk.references {
                            if foreign.column(foreign_column).is_none() {
                                tracing::warn!(
                                    "foreign key {} on {} references unknown column {}.{}",
                                    fk.name,
                                    table.name,
                                    fk.foreign_table,
                                    foreign_column
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Metadata for a single table. Mutable only while the introspector is
/// populating it.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub uniques: Vec<Unique>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            uniques: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// The primary key, as the ordered subset of columns flagged primary.
    /// The key is never represented as an index entry.
    pub fn primary_key(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }
}

/// Metadata for a single column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub portable_type: PortableType,
    /// The native type name as the catalog reported it, lowercased and
    /// without any size suffix.
    pub native_type: String,
    pub nullable: bool,
    /// Display size or numeric precision. `None` means the native type
    /// carries no meaningful constraint (or only the dialect default).
    pub size: Option<u32>,
    pub scale: Option<u32>,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub default: Option<DefaultValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, portable_type: PortableType) -> Self {
        Column {
            name: name.into(),
            portable_type,
            native_type: String::new(),
            nullable: true,
            size: None,
            scale: None,
            auto_increment: false,
            primary_key: false,
            default: None,
        }
    }
}

/// A column default. Expression defaults (e.g. `CURRENT_TIMESTAMP`) must
/// never be quoted when the value is rendered back into SQL, so the kind
/// is tracked alongside the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue {
    pub kind: DefaultKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Literal,
    Expression,
}

impl DefaultValue {
    pub fn literal(value: impl Into<String>) -> Self {
        DefaultValue {
            kind: DefaultKind::Literal,
            value: value.into(),
        }
    }

    pub fn expression(value: impl Into<String>) -> Self {
        DefaultValue {
            kind: DefaultKind::Expression,
            value: value.into(),
        }
    }
}

/// A plain index. Column order is the index's key order and is preserved.
#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
}

/// A unique constraint. Structurally an index, semantically distinct.
#[derive(Debug, Clone)]
pub struct Unique {
    pub name: String,
    pub columns: Vec<String>,
}

/// Referential action on delete/update. `RESTRICT` is the vendor default
/// and is represented as "no action specified" (`None`) on the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FkAction {
    Cascade,
    SetNull,
}

impl FkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
        }
    }

    /// Parse a catalog/DDL action keyword. Vendor-default keywords
    /// (`RESTRICT`, `NO ACTION`) come back as `None`.
    pub fn parse(raw: &str) -> Option<FkAction> {
        match raw.trim() {
            "CASCADE" => Some(FkAction::Cascade),
            "SET NULL" => Some(FkAction::SetNull),
            _ => None,
        }
    }
}

/// A foreign key. The referenced table is held by name and resolved
/// against the database graph lazily; reference pairs are (local column,
/// foreign column) in constraint-definition order.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub name: String,
    pub foreign_table: String,
    pub references: Vec<(String, String)>,
    pub on_delete: Option<FkAction>,
    pub on_update: Option<FkAction>,
}

impl ForeignKey {
    pub fn new(name: impl Into<String>, foreign_table: impl Into<String>) -> Self {
        ForeignKey {
            name: name.into(),
            foreign_table: foreign_table.into(),
            references: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn add_reference(&mut self, local: impl Into<String>, foreign: impl Into<String>) {
        self.references.push((local.into(), foreign.into()));
    }

    pub fn local_columns(&self) -> Vec<&str> {
        self.references.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn foreign_columns(&self) -> Vec<&str> {
        self.references.iter().map(|(_, f)| f.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_by_name() {
        let mut db = Database::new("test");
        db.add_table(Table::new("author"));
        db.add_table(Table::new("book"));
        assert!(db.table("author").is_some());
        assert!(db.table("missing").is_none());
        assert_eq!(db.tables.len(), 2);
    }

    #[test]
    fn primary_key_is_column_flags() {
        let mut table = Table::new("t");
        let mut id = Column::new("id", PortableType::Integer);
        id.primary_key = true;
        table.columns.push(id);
        table.columns.push(Column::new("name", PortableType::Varchar));
        let pk = table.primary_key();
        assert_eq!(pk.len(), 1);
        assert_eq!(pk[0].name, "id");
    }

    #[test]
    fn fk_action_parse_treats_restrict_as_absent() {
        assert_eq!(FkAction::parse("CASCADE"), Some(FkAction::Cascade));
        assert_eq!(FkAction::parse("SET NULL"), Some(FkAction::SetNull));
        assert_eq!(FkAction::parse("RESTRICT"), None);
        assert_eq!(FkAction::parse("NO ACTION"), None);
    }

    #[test]
    fn fk_reference_order_is_preserved() {
        let mut fk = ForeignKey::new("fk_order_line", "orders");
        fk.add_reference("order_id", "id");
        fk.add_reference("order_rev", "rev");
        assert_eq!(fk.local_columns(), vec!["order_id", "order_rev"]);
        assert_eq!(fk.foreign_columns(), vec!["id", "rev"]);
    }
}
