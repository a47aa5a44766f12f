use crate::types::TableNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

/// Short description of a generated table shown under an assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub description: String,
}

impl TableSummary {
    pub fn from_table(table: &TableNode) -> Self {
        let lead = table.purpose.as_deref().unwrap_or("Stores and manages");
        let purpose = table
            .purpose
            .clone()
            .unwrap_or_else(|| format!("Manages core data for {}", table.label));
        let columns = table
            .fields
            .iter()
            .map(|f| {
                let mut col = f.name.clone();
                if f.is_primary {
                    col.push_str(" (Primary Key)");
                }
                if f.is_foreign {
                    col.push_str(" (Foreign Key)");
                }
                if let Some(desc) = &f.description {
                    col.push_str(" - ");
                    col.push_str(desc);
                }
                col
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            name: table.label.clone(),
            description: format!(
                "{} {} data.\n\nPurpose: {}\nColumns: {}",
                lead,
                table.label.to_lowercase(),
                purpose,
                columns
            ),
        }
    }
}

/// One entry of the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub tables: Vec<TableSummary>,
    /// Placeholder shown while a generation is in flight
    pub loading: bool,
}

impl ChatMessage {
    pub fn user(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            tables: Vec::new(),
            loading: false,
        }
    }

    pub fn assistant(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            tables: Vec::new(),
            loading: false,
        }
    }

    pub fn loading(id: u64) -> Self {
        Self {
            loading: true,
            ..Self::assistant(id, "Working on it")
        }
    }

    pub fn with_tables(mut self, tables: Vec<TableSummary>) -> Self {
        self.tables = tables;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType};

    #[test]
    fn summary_lists_keys_and_descriptions() {
        let mut table = TableNode::new("2", "Comments").with_fields(vec![
            Field::new("id", FieldType::Ints).primary(),
            Field::new("post_id", FieldType::Ints).foreign("posts"),
            Field {
                description: Some("comment body".into()),
                ..Field::new("body", FieldType::Text)
            },
        ]);
        table.purpose = Some("Holds reader feedback on".into());

        let summary = TableSummary::from_table(&table);
        assert_eq!(summary.name, "Comments");
        assert!(summary
            .description
            .starts_with("Holds reader feedback on comments data."));
        assert!(summary.description.contains(
            "Columns: id (Primary Key), post_id (Foreign Key), body - comment body"
        ));
    }

    #[test]
    fn summary_without_purpose_uses_defaults() {
        let table = TableNode::new("1", "posts");
        let summary = TableSummary::from_table(&table);
        assert!(summary.description.starts_with("Stores and manages posts data."));
        assert!(summary.description.contains("Purpose: Manages core data for posts"));
    }
}
