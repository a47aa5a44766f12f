mod split;

use crate::types::{Field, FieldType, TableNode};
use std::fmt::Write;

pub use split::split_statements;

/// Target SQL flavour for column types and identity columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Postgres,
    Sqlite,
}

impl SqlDialect {
    /// Concrete column type for an abstract field type
    pub fn column_type(self, ty: &FieldType) -> &'static str {
        match ty {
            FieldType::Ints => "INTEGER",
            FieldType::Text => "TEXT",
            FieldType::Bool => "BOOLEAN",
            FieldType::Date => "TIMESTAMP",
            FieldType::Float => "DECIMAL",
            FieldType::Json => match self {
                SqlDialect::Postgres => "JSONB",
                SqlDialect::Sqlite => "TEXT",
            },
            FieldType::Other(_) => "TEXT",
        }
    }

    fn primary_key(self, ty: &FieldType) -> String {
        match (self, ty) {
            (SqlDialect::Postgres, FieldType::Ints) => "SERIAL PRIMARY KEY".to_string(),
            (SqlDialect::Sqlite, FieldType::Ints) => {
                "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
            }
            _ => format!("{} PRIMARY KEY", self.column_type(ty)),
        }
    }
}

/// Render one `CREATE TABLE` statement per table, in input order
pub fn generate_sql(tables: &[TableNode], dialect: SqlDialect) -> String {
    let mut sql = String::new();

    for table in tables {
        let _ = writeln!(sql, "-- Create {} table", table.label);
        let _ = writeln!(sql, "CREATE TABLE {} (", table.label);

        let columns: Vec<String> = table
            .fields
            .iter()
            .map(|field| column_definition(field, dialect))
            .collect();
        if !columns.is_empty() {
            sql.push_str(&columns.join(",\n"));
            sql.push('\n');
        }

        sql.push_str(");\n\n");
    }

    sql
}

fn column_definition(field: &Field, dialect: SqlDialect) -> String {
    if field.is_primary {
        return format!("  {} {}", field.name, dialect.primary_key(&field.field_type));
    }

    let mut def = format!("  {} {}", field.name, dialect.column_type(&field.field_type));

    if field.is_foreign {
        if let Some(target) = &field.references {
            let _ = write!(def, " REFERENCES {}(id)", target);
        }
        return def;
    }

    if field.not_null {
        def.push_str(" NOT NULL");
    }
    if field.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &field.default {
        let _ = write!(def, " DEFAULT {}", default);
    }
    def
}
