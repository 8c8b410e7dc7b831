//! Declarative table model.
//!
//! A `declarativeTable` source file owns exactly one `CREATE TABLE`; this
//! module holds the structural representation extracted from it and the
//! inverse formatting used when re-emitting definitions into migrations.

mod ddl;

pub use ddl::{parse_column, parse_create_table};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema a table belongs to when no dotted prefix is present.
pub const DEFAULT_SCHEMA: &str = "public";

/// Parsed definition of a single declarative table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Schema name, `public` unless the source qualified the table.
    pub schema: String,
    /// Table name without schema prefix.
    pub name: String,
    /// Column definitions in source order.
    pub columns: Vec<Column>,
}

impl TableDefinition {
    /// `<schema>.<table>`, the form every emitted statement uses.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Look up a column by name (case-sensitive).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_create_table(self))
    }
}

/// One column of a declarative table. Equality is structural on all fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as written (quotes removed).
    pub name: String,
    /// Data type text, verbatim from the source (e.g. `NUMERIC(12,2)`).
    pub data_type: String,
    /// False when the source says `NOT NULL`.
    pub nullable: bool,
    /// `DEFAULT` expression, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Inline `PRIMARY KEY`.
    #[serde(default)]
    pub primary_key: bool,
    /// Inline `UNIQUE`.
    #[serde(default)]
    pub unique: bool,
    /// Inline `REFERENCES` clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ForeignKeyRef>,
    /// Inline `CHECK` expression (parenthesis content).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl Column {
    /// A plain nullable column with no constraints.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            references: None,
            check: None,
        }
    }
}

/// Inline foreign key reference on a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table (possibly schema-qualified, verbatim).
    pub table: String,
    /// Referenced column.
    pub column: String,
    /// `ON DELETE` action, uppercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    /// `ON UPDATE` action, uppercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

/// Format a column definition the way migrations emit it.
pub fn format_column(col: &Column) -> String {
    let mut out = format!("{} {}", col.name, col.data_type);
    if !col.nullable {
        out.push_str(" NOT NULL");
    }
    if let Some(default) = &col.default {
        out.push_str(" DEFAULT ");
        out.push_str(default);
    }
    if col.primary_key {
        out.push_str(" PRIMARY KEY");
    }
    if col.unique {
        out.push_str(" UNIQUE");
    }
    if let Some(fk) = &col.references {
        out.push_str(&format!(" REFERENCES {}({})", fk.table, fk.column));
        if let Some(action) = &fk.on_delete {
            out.push_str(" ON DELETE ");
            out.push_str(action);
        }
        if let Some(action) = &fk.on_update {
            out.push_str(" ON UPDATE ");
            out.push_str(action);
        }
    }
    if let Some(check) = &col.check {
        out.push_str(&format!(" CHECK ({check})"));
    }
    out
}

/// Render a full `CREATE TABLE` statement for the definition.
///
/// The output parses back to a structurally equal definition; the renderer
/// and the snapshot tests both rely on that round trip.
pub fn render_create_table(table: &TableDefinition) -> String {
    let mut out = format!("CREATE TABLE {} (\n", table.qualified_name());
    for (i, col) in table.columns.iter().enumerate() {
        out.push_str("    ");
        out.push_str(&format_column(col));
        if i + 1 < table.columns.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(");");
    out
}
