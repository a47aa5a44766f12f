//! One generation round: description → model → schema → SQL.

use crate::extract::{extract_schema, Extraction};
use crate::llm::{schema_prompt, ModelClient, ModelError};
use crate::sql::{generate_sql, SqlDialect};
use crate::types::{Schema, TableSummary};
use thiserror::Error;
use tracing::info;

/// Chat reply used for every failed generation
pub const GENERATION_ERROR_REPLY: &str = "Error while generating the diagram. Please try again.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("the model returned a schema without tables")]
    EmptySchema,
}

/// Result of a successful round
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub schema: Schema,
    /// `None` when the schema is the error placeholder
    pub sql: Option<String>,
    /// Why extraction fell back, if it did
    pub fallback: Option<String>,
}

impl Generation {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

pub fn generate(
    client: &dyn ModelClient,
    description: &str,
    dialect: SqlDialect,
) -> Result<Generation, GenerationError> {
    let raw = client.generate(&schema_prompt(description))?;

    match extract_schema(&raw) {
        Extraction::Parsed(schema) if schema.is_empty() => Err(GenerationError::EmptySchema),
        Extraction::Parsed(schema) => {
            let sql = generate_sql(&schema.tables, dialect);
            info!(
                tables = schema.tables.len(),
                relationships = schema.relationships.len(),
                "schema generated"
            );
            Ok(Generation {
                schema,
                sql: Some(sql),
                fallback: None,
            })
        }
        Extraction::Fallback { schema, reason } => Ok(Generation {
            schema,
            sql: None,
            fallback: Some(reason),
        }),
    }
}

/// Assistant text for a successful generation
pub fn assistant_reply(description: &str, schema: &Schema) -> (String, Vec<TableSummary>) {
    let content = schema.description.clone().unwrap_or_else(|| {
        format!(
            "The {} schema has been created with the following structure:",
            description.to_lowercase()
        )
    });
    let tables = schema.tables.iter().map(TableSummary::from_table).collect();
    (content, tables)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Model stub answering every prompt with the same text
    pub struct CannedModel {
        pub answer: Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                answer: Err(reason.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ModelClient for CannedModel {
        fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer
                .clone()
                .map_err(ModelError::InvalidResponse)
        }

        fn probe(&self) -> Result<String, ModelError> {
            match &self.answer {
                Ok(_) => Ok("0.0.0-test".to_string()),
                Err(reason) => Err(ModelError::InvalidResponse(reason.clone())),
            }
        }
    }

    pub const BLOG_ANSWER: &str = r#"Here is the schema for your blog:
{
  "nodes": [
    {"id": "1", "type": "dbTable", "data": {"label": "posts", "fields": [
      {"name": "id", "type": "ints", "isPrimary": true},
      {"name": "title", "type": "text"},
      {"name": "created_at", "type": "date"}
    ]}, "position": {"x": 0, "y": 0}},
    {"id": "2", "type": "dbTable", "data": {"label": "comments", "fields": [
      {"name": "id", "type": "ints", "isPrimary": true},
      {"name": "post_id", "type": "ints", "isForeign": true, "references": "posts"},
      {"name": "content", "type": "text"}
    ]}, "position": {"x": 300, "y": 250}}
  ],
  "edges": [{"id": "e2-1", "source": "2", "target": "1", "type": "smoothstep", "animated": true}]
}"#;

    #[test]
    fn blog_description_becomes_two_tables() {
        let model = CannedModel::answering(BLOG_ANSWER);
        let generation = generate(
            &model,
            "A simple blog with posts and comments",
            SqlDialect::Postgres,
        )
        .unwrap();

        assert!(!generation.is_fallback());
        let sql = generation.sql.unwrap();
        assert_eq!(sql.matches("CREATE TABLE").count(), 2);
        let posts = sql.find("CREATE TABLE posts").unwrap();
        let comments = sql.find("CREATE TABLE comments").unwrap();
        assert!(posts < comments);
        assert!(sql.contains("  post_id INTEGER REFERENCES posts(id)"));

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Context: A simple blog with posts and comments"));
    }

    #[test]
    fn unparseable_answer_gives_placeholder_without_sql() {
        let model = CannedModel::answering("I am not sure what you mean.");
        let generation = generate(&model, "???", SqlDialect::Postgres).unwrap();
        assert!(generation.is_fallback());
        assert_eq!(generation.sql, None);
        assert_eq!(generation.schema.tables.len(), 1);
    }

    #[test]
    fn empty_schema_is_an_error() {
        let model = CannedModel::answering(r#"{"nodes": [], "edges": []}"#);
        let err = generate(&model, "nothing", SqlDialect::Postgres).unwrap_err();
        assert!(matches!(err, GenerationError::EmptySchema));
    }

    #[test]
    fn model_errors_propagate() {
        let model = CannedModel::failing("connection refused");
        let err = generate(&model, "shop", SqlDialect::Postgres).unwrap_err();
        assert!(matches!(err, GenerationError::Model(_)));
    }

    #[test]
    fn reply_prefers_model_description() {
        let model = CannedModel::answering(BLOG_ANSWER);
        let schema = generate(&model, "A Blog", SqlDialect::Postgres).unwrap().schema;
        let (content, tables) = assistant_reply("A Blog", &schema);
        assert_eq!(
            content,
            "The a blog schema has been created with the following structure:"
        );
        assert_eq!(tables.len(), 2);

        let described = Schema {
            description: Some("Blog schema".into()),
            ..schema
        };
        assert_eq!(assistant_reply("A Blog", &described).0, "Blog schema");
    }
}
