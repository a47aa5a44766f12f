//! Turns free-form model output into a [`Schema`].
//!
//! The model is asked for JSON but routinely wraps it in prose or markdown
//! fences, truncates it, or invents extra keys. Extraction therefore never
//! fails: anything unusable resolves to a one-table placeholder so the
//! diagram always has something to draw.

use crate::types::{Field, Position, Relationship, Schema, TableNode};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Label of the table shown when the response could not be understood
pub const PLACEHOLDER_LABEL: &str = "Error: Invalid AI Response";

/// Upper bound on candidate objects tried by the balanced scan
const MAX_CANDIDATES: usize = 32;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("response contains no JSON object")]
    NoJson,
    #[error("response JSON is invalid: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response JSON has no `nodes` array")]
    MissingNodes,
    #[error("response JSON has no `edges` array")]
    MissingEdges,
}

/// Outcome of one extraction pass
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(Schema),
    Fallback { schema: Schema, reason: String },
}

impl Extraction {
    pub fn schema(&self) -> &Schema {
        match self {
            Extraction::Parsed(schema) | Extraction::Fallback { schema, .. } => schema,
        }
    }

    pub fn into_schema(self) -> Schema {
        match self {
            Extraction::Parsed(schema) | Extraction::Fallback { schema, .. } => schema,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback { .. })
    }
}

/// Extract a schema from a raw model response
pub fn extract_schema(raw: &str) -> Extraction {
    debug!(response = raw, "raw model response");

    match locate_json(raw).and_then(|value| normalize(&value)) {
        Ok(schema) => Extraction::Parsed(schema),
        Err(e) => {
            warn!(error = %e, "could not parse model response, using placeholder schema");
            Extraction::Fallback {
                schema: placeholder_schema(),
                reason: e.to_string(),
            }
        }
    }
}

/// Single-table schema used when extraction fails
pub fn placeholder_schema() -> Schema {
    Schema {
        description: None,
        tables: vec![TableNode {
            id: "1".to_string(),
            label: PLACEHOLDER_LABEL.to_string(),
            purpose: None,
            fields: Vec::new(),
            position: Some(Position { x: 400.0, y: 0.0 }),
        }],
        relationships: Vec::new(),
    }
}

fn locate_json(raw: &str) -> Result<Value, ExtractError> {
    let start = raw.find('{').ok_or(ExtractError::NoJson)?;
    let end = raw
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or(ExtractError::NoJson)?;

    let first_error = match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Prose around the JSON may itself contain braces; try each balanced
    // object in turn and keep the first one that looks like a diagram.
    let mut fallback = None;
    for (offset, _) in raw
        .match_indices('{')
        .take(MAX_CANDIDATES)
    {
        let Some(candidate) = balanced_object(raw, offset) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if value.get("nodes").is_some() {
                return Ok(value);
            }
            fallback.get_or_insert(value);
        }
    }

    fallback.ok_or(ExtractError::InvalidJson(first_error))
}

/// Slice of the object starting at `start`, matched by brace depth outside strings
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..=start + idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn normalize(value: &Value) -> Result<Schema, ExtractError> {
    let nodes = value
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(ExtractError::MissingNodes)?;
    let edges = value
        .get("edges")
        .and_then(Value::as_array)
        .ok_or(ExtractError::MissingEdges)?;

    let mut seen_ids = HashSet::new();
    let mut tables = Vec::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        if !node.is_object() {
            warn!(index = idx, "skipping node that is not an object");
            continue;
        }
        let mut table = normalize_node(node, idx);
        if !seen_ids.insert(table.id.clone()) {
            let unique = format!("{}_{}", table.id, idx + 1);
            warn!(id = %table.id, renamed = %unique, "duplicate table id");
            table.id = unique.clone();
            seen_ids.insert(unique);
        }
        tables.push(table);
    }

    let relationships = edges
        .iter()
        .filter_map(|edge| {
            let source = edge.get("source").and_then(scalar_string)?;
            let target = edge.get("target").and_then(scalar_string)?;
            let id = edge
                .get("id")
                .and_then(scalar_string)
                .unwrap_or_else(|| format!("e{}-{}", source, target));
            Some(Relationship { id, source, target })
        })
        .collect();

    let mut schema = Schema {
        description: value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        tables,
        relationships,
    };
    repair_foreign_keys(&mut schema);
    Ok(schema)
}

fn normalize_node(node: &Value, idx: usize) -> TableNode {
    // React Flow nests the payload under `data`; some models flatten it
    let data = node
        .get("data")
        .filter(|d| d.is_object())
        .unwrap_or(node);

    let id = node
        .get("id")
        .and_then(scalar_string)
        .unwrap_or_else(|| (idx + 1).to_string());
    let label = data
        .get("label")
        .or_else(|| data.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());

    let fields = match data.get("fields").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(|item| match serde_json::from_value::<Field>(item.clone()) {
                Ok(field) => Some(field),
                Err(e) => {
                    warn!(table = %label, error = %e, "skipping malformed field");
                    None
                }
            })
            .collect(),
        None => Vec::new(),
    };

    TableNode {
        purpose: data
            .get("purpose")
            .and_then(Value::as_str)
            .map(str::to_string),
        position: node
            .get("position")
            .and_then(|p| serde_json::from_value::<Position>(p.clone()).ok()),
        id,
        label,
        fields,
    }
}

/// Give every foreign field a `references` target, or demote it.
///
/// A missing target is taken from the table's only outgoing relationship.
fn repair_foreign_keys(schema: &mut Schema) {
    let inferred: Vec<Option<String>> = schema
        .tables
        .iter()
        .map(|table| {
            let mut targets = schema.outgoing(&table.id);
            match (targets.next(), targets.next()) {
                (Some(rel), None) => schema.table(&rel.target).map(|t| t.label.clone()),
                _ => None,
            }
        })
        .collect();

    for (table, target) in schema.tables.iter_mut().zip(inferred) {
        for field in table.fields.iter_mut() {
            if field.references.as_deref().is_some_and(|r| r.trim().is_empty()) {
                field.references = None;
            }
            if field.is_primary || !field.is_foreign || field.references.is_some() {
                continue;
            }
            match &target {
                Some(label) => field.references = Some(label.clone()),
                None => {
                    warn!(
                        table = %table.label,
                        field = %field.name,
                        "foreign key without a target table, treating as plain column"
                    );
                    field.is_foreign = false;
                }
            }
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use proptest::prelude::*;

    const BLOG: &str = r#"Sure! Here is your schema:
```json
{
  "description": "A tiny blog",
  "nodes": [
    {"id": "1", "type": "dbTable", "data": {"label": "posts", "purpose": "Stores articles", "fields": [
      {"name": "id", "type": "ints", "isPrimary": true},
      {"name": "title", "type": "text", "notNull": true},
      {"name": "published", "type": "bool"}
    ]}, "position": {"x": 0, "y": 0}},
    {"id": "2", "type": "dbTable", "data": {"label": "comments", "fields": [
      {"name": "id", "type": "ints", "isPrimary": true},
      {"name": "post_id", "type": "ints", "isForeign": true, "references": "posts"},
      {"name": "body", "type": "text"}
    ]}, "position": {"x": 300, "y": 250}}
  ],
  "edges": [{"id": "e2-1", "source": "2", "target": "1", "type": "smoothstep", "animated": true}]
}
```
Let me know if you need anything else."#;

    #[test]
    fn parses_wrapped_response() {
        let extraction = extract_schema(BLOG);
        assert!(!extraction.is_fallback());

        let schema = extraction.schema();
        assert_eq!(schema.description.as_deref(), Some("A tiny blog"));
        assert_eq!(schema.tables.len(), 2);
        assert_eq!(schema.relationships.len(), 1);

        let names: Vec<_> = schema.tables[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "title", "published"]);
        assert_eq!(schema.tables[0].purpose.as_deref(), Some("Stores articles"));
        assert_eq!(schema.tables[1].position, Some(Position { x: 300.0, y: 250.0 }));
        assert_eq!(schema.tables[1].fields[1].references.as_deref(), Some("posts"));
    }

    #[test]
    fn odd_field_types_keep_the_field() {
        let raw = r#"{"nodes": [{"id": "1", "data": {"label": "people", "fields": [
            {"name": "id", "type": "ints", "isPrimary": true},
            {"name": "age", "type": null},
            {"name": "score", "type": 5},
            {"name": "nickname"}
        ]}}], "edges": []}"#;
        let schema = extract_schema(raw).into_schema();
        let fields = &schema.tables[0].fields;
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "age", "score", "nickname"]);
        assert_eq!(fields[1].field_type, FieldType::Text);
        assert_eq!(fields[2].field_type, FieldType::Other("5".into()));
        assert_eq!(fields[3].field_type, FieldType::Text);

        let sql = crate::sql::generate_sql(&schema.tables, crate::sql::SqlDialect::Postgres);
        assert!(sql.contains("  age TEXT"), "{sql}");
        assert!(sql.contains("  score TEXT"), "{sql}");
    }

    #[test]
    fn text_without_json_yields_placeholder() {
        let extraction = extract_schema("I could not think of a schema, sorry.");
        assert!(extraction.is_fallback());
        let schema = extraction.into_schema();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].label, PLACEHOLDER_LABEL);
        assert!(schema.tables[0].fields.is_empty());
        assert!(schema.relationships.is_empty());
    }

    #[test]
    fn missing_edges_is_a_failure() {
        let extraction = extract_schema(r#"{"nodes": [{"id": "1", "data": {"label": "users"}}]}"#);
        match extraction {
            Extraction::Fallback { reason, .. } => assert!(reason.contains("edges")),
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn truncated_json_is_a_failure() {
        let extraction = extract_schema(r#"{"nodes": [{"id": "1", "data": {"label": "users""#);
        assert!(extraction.is_fallback());
    }

    #[test]
    fn braces_in_prose_are_skipped() {
        let raw = r#"Use {snake_case} names. {"nodes": [{"id": 7, "label": "users", "fields": []}], "edges": []} Done {ok}"#;
        let schema = extract_schema(raw).into_schema();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].id, "7");
        assert_eq!(schema.tables[0].label, "users");
    }

    #[test]
    fn malformed_fields_default_to_empty() {
        let raw = r#"{"nodes": [
            {"id": "1", "data": {"label": "a", "fields": "id, name"}},
            {"id": "2", "data": {"label": "b", "fields": [{"type": "text"}, {"name": "kept", "type": "uuid"}]}}
        ], "edges": []}"#;
        let schema = extract_schema(raw).into_schema();
        assert!(schema.tables[0].fields.is_empty());
        assert_eq!(schema.tables[1].fields.len(), 1);
        assert_eq!(schema.tables[1].fields[0].field_type, FieldType::Other("uuid".into()));
    }

    #[test]
    fn missing_ids_and_duplicates_are_made_unique() {
        let raw = r#"{"nodes": [
            {"data": {"label": "a"}},
            {"id": "1", "data": {"label": "b"}},
            {"data": {}}
        ], "edges": [{"source": "1", "target": "3"}, {"source": "1"}]}"#;
        let schema = extract_schema(raw).into_schema();
        let ids: Vec<_> = schema.tables.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "1_2", "3"]);
        assert_eq!(schema.tables[2].label, "3");
        assert_eq!(schema.relationships.len(), 1);
        assert_eq!(schema.relationships[0].id, "e1-3");
    }

    #[test]
    fn foreign_key_target_inferred_from_single_edge() {
        let raw = r#"{"nodes": [
            {"id": "1", "data": {"label": "users", "fields": [{"name": "id", "type": "ints", "isPrimary": true}]}},
            {"id": "2", "data": {"label": "orders", "fields": [{"name": "user_id", "type": "ints", "isForeign": true}]}}
        ], "edges": [{"id": "e", "source": "2", "target": "1"}]}"#;
        let schema = extract_schema(raw).into_schema();
        let field = &schema.tables[1].fields[0];
        assert!(field.is_foreign);
        assert_eq!(field.references.as_deref(), Some("users"));
    }

    #[test]
    fn foreign_key_without_target_is_demoted() {
        let raw = r#"{"nodes": [
            {"id": "1", "data": {"label": "orders", "fields": [{"name": "user_id", "type": "ints", "isForeign": true, "references": ""}]}}
        ], "edges": []}"#;
        let schema = extract_schema(raw).into_schema();
        let field = &schema.tables[0].fields[0];
        assert!(!field.is_foreign);
        assert_eq!(field.references, None);
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_text(raw in ".{0,200}") {
            let extraction = extract_schema(&raw);
            prop_assert!(!extraction.schema().tables.is_empty() || !extraction.is_fallback());
        }

        #[test]
        fn counts_and_order_survive(labels in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
            let nodes: Vec<_> = labels
                .iter()
                .enumerate()
                .map(|(i, l)| serde_json::json!({
                    "id": (i + 1).to_string(),
                    "data": {"label": l, "fields": [{"name": "id", "type": "ints"}, {"name": l, "type": "text"}]}
                }))
                .collect();
            let edges: Vec<_> = (1..labels.len())
                .map(|i| serde_json::json!({"id": format!("e{}", i), "source": (i + 1).to_string(), "target": "1"}))
                .collect();
            let raw = format!("Here you go: {}", serde_json::json!({"nodes": nodes, "edges": edges}));

            let schema = extract_schema(&raw).into_schema();
            prop_assert_eq!(schema.tables.len(), labels.len());
            prop_assert_eq!(schema.relationships.len(), labels.len() - 1);
            for (table, label) in schema.tables.iter().zip(&labels) {
                prop_assert_eq!(&table.label, label);
                prop_assert_eq!(&table.fields[1].name, label);
            }
        }
    }
}
