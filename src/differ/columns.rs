//! Column-level diffing for declarative tables.
//!
//! Translates two parsed `CREATE TABLE` definitions into incremental
//! `ALTER TABLE` statements. Columns are matched by name, case-sensitive;
//! renames are not inferred, so a renamed column surfaces as a drop plus an
//! add for the operator to review.

use crate::schema::{format_column, Column, TableDefinition};
use ahash::AHashMap;

/// A pure table rename: same columns, different qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    /// Old qualified name.
    pub from: String,
    /// New bare table name.
    pub to: String,
}

/// One column present in both definitions with differing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnModification {
    pub name: String,
    pub old: Column,
    pub new: Column,
}

/// Structural difference between two versions of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDiff {
    /// New qualified table name; target of every emitted statement.
    pub table: String,
    /// Bare new table name, used for generated constraint identifiers.
    table_name: String,
    /// Set on a pure rename; the column lists are then empty.
    pub rename: Option<Rename>,
    /// Columns only in the new definition, new-definition order.
    pub added: Vec<Column>,
    /// Columns in both with field changes, new-definition order.
    pub modified: Vec<ColumnModification>,
    /// Columns only in the old definition, old-definition order.
    pub dropped: Vec<Column>,
}

impl TableDiff {
    pub fn has_changes(&self) -> bool {
        self.rename.is_some()
            || !self.added.is_empty()
            || !self.modified.is_empty()
            || !self.dropped.is_empty()
    }

    /// `ALTER TABLE … ADD COLUMN` statements, new-definition order.
    pub fn added_statements(&self) -> Vec<String> {
        self.added
            .iter()
            .map(|col| format!("ALTER TABLE {} ADD COLUMN {};", self.table, format_column(col)))
            .collect()
    }

    /// Per-field `ALTER COLUMN` statements for every modified column, in
    /// the fixed field order: TYPE, NOT NULL, DEFAULT, then constraints.
    pub fn modified_statements(&self) -> Vec<String> {
        let mut out = Vec::new();
        for change in &self.modified {
            out.extend(self.column_statements(change));
        }
        out
    }

    /// `ALTER TABLE … DROP COLUMN` statements, old-definition order.
    pub fn dropped_statements(&self) -> Vec<String> {
        self.dropped
            .iter()
            .map(|col| format!("ALTER TABLE {} DROP COLUMN {};", self.table, col.name))
            .collect()
    }

    /// The single rename statement, when this diff is a pure rename.
    pub fn rename_statement(&self) -> Option<String> {
        self.rename.as_ref().map(|r| {
            format!("ALTER TABLE {} RENAME TO {};", r.from, r.to)
        })
    }

    fn column_statements(&self, change: &ColumnModification) -> Vec<String> {
        let table = &self.table;
        let name = &change.name;
        let (old, new) = (&change.old, &change.new);
        let mut out = Vec::new();

        if old.data_type != new.data_type {
            out.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {name} TYPE {};",
                new.data_type
            ));
        }
        if old.nullable != new.nullable {
            let verb = if new.nullable { "DROP" } else { "SET" };
            out.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {name} {verb} NOT NULL;"
            ));
        }
        if old.default != new.default {
            match &new.default {
                Some(expr) => out.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {name} SET DEFAULT {expr};"
                )),
                None => out.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {name} DROP DEFAULT;"
                )),
            }
        }
        if old.primary_key != new.primary_key {
            if new.primary_key {
                out.push(format!("ALTER TABLE {table} ADD PRIMARY KEY ({name});"));
            } else {
                out.push(format!(
                    "ALTER TABLE {table} DROP CONSTRAINT {}_pkey;",
                    self.table_name
                ));
            }
        }
        if old.unique != new.unique {
            if new.unique {
                out.push(format!("ALTER TABLE {table} ADD UNIQUE ({name});"));
            } else {
                out.push(format!(
                    "ALTER TABLE {table} DROP CONSTRAINT {}_{name}_key;",
                    self.table_name
                ));
            }
        }
        if old.references != new.references {
            if old.references.is_some() {
                out.push(format!(
                    "ALTER TABLE {table} DROP CONSTRAINT {}_{name}_fkey;",
                    self.table_name
                ));
            }
            if let Some(fk) = &new.references {
                let mut stmt = format!(
                    "ALTER TABLE {table} ADD FOREIGN KEY ({name}) REFERENCES {}({})",
                    fk.table, fk.column
                );
                if let Some(action) = &fk.on_delete {
                    stmt.push_str(&format!(" ON DELETE {action}"));
                }
                if let Some(action) = &fk.on_update {
                    stmt.push_str(&format!(" ON UPDATE {action}"));
                }
                stmt.push(';');
                out.push(stmt);
            }
        }
        if old.check != new.check {
            if old.check.is_some() {
                out.push(format!(
                    "ALTER TABLE {table} DROP CONSTRAINT {}_{name}_check;",
                    self.table_name
                ));
            }
            if let Some(expr) = &new.check {
                out.push(format!("ALTER TABLE {table} ADD CHECK ({expr});"));
            }
        }
        out
    }
}

/// Compare two definitions of the same source file's table.
pub fn compare_tables(old: &TableDefinition, new: &TableDefinition) -> TableDiff {
    let mut diff = TableDiff {
        table: new.qualified_name(),
        table_name: new.name.clone(),
        rename: None,
        added: Vec::new(),
        modified: Vec::new(),
        dropped: Vec::new(),
    };

    let renamed = old.schema != new.schema || old.name != new.name;
    if renamed && old.columns == new.columns {
        diff.rename = Some(Rename {
            from: old.qualified_name(),
            to: new.name.clone(),
        });
        return diff;
    }

    let old_by_name: AHashMap<&str, &Column> =
        old.columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let new_by_name: AHashMap<&str, &Column> =
        new.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    for col in &new.columns {
        match old_by_name.get(col.name.as_str()) {
            None => diff.added.push(col.clone()),
            Some(old_col) if *old_col != col => diff.modified.push(ColumnModification {
                name: col.name.clone(),
                old: (*old_col).clone(),
                new: col.clone(),
            }),
            Some(_) => {}
        }
    }

    for col in &old.columns {
        if !new_by_name.contains_key(col.name.as_str()) {
            diff.dropped.push(col.clone());
        }
    }

    diff
}
