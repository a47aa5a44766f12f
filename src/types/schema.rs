use serde::{Deserialize, Deserializer, Serialize};

/// Abstract column type vocabulary used by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Ints,
    #[default]
    Text,
    Bool,
    Date,
    Float,
    Json,
    /// Anything the model invented; kept verbatim for display
    Other(String),
}

impl FieldType {
    /// Parse a type name, accepting the synonyms models tend to emit
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ints" | "int" | "integer" | "bigint" | "smallint" | "serial" => FieldType::Ints,
            "text" | "string" | "varchar" | "char" => FieldType::Text,
            "bool" | "boolean" => FieldType::Bool,
            "date" | "datetime" | "timestamp" | "time" => FieldType::Date,
            "float" | "double" | "decimal" | "number" | "numeric" | "real" => FieldType::Float,
            "json" | "jsonb" | "object" => FieldType::Json,
            _ => FieldType::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Ints => "ints",
            FieldType::Text => "text",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Float => "float",
            FieldType::Json => "json",
            FieldType::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::parse(&raw)
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_string()
    }
}

/// A column of a table node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_type")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_primary: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_foreign: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    #[serde(default, alias = "required", deserialize_with = "lenient_bool")]
    pub not_null: bool,
    #[serde(default, alias = "isUnique", deserialize_with = "lenient_bool")]
    pub unique: bool,
    #[serde(
        default,
        alias = "defaultValue",
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_primary: false,
            is_foreign: false,
            description: None,
            references: None,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn foreign(mut self, references: impl Into<String>) -> Self {
        self.is_foreign = true;
        self.references = Some(references.into());
        self
    }
}

/// Canvas position suggested by the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One table of the diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl TableNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            purpose: None,
            fields: Vec::new(),
            position: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }
}

/// Directed edge: `source` holds a foreign key referencing `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Normalized output of one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tables: Vec<TableNode>,
    pub relationships: Vec<Relationship>,
}

impl Schema {
    pub fn table(&self, id: &str) -> Option<&TableNode> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Relationships leaving the given table
    pub fn outgoing<'a>(&'a self, table_id: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.source == table_id)
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// Null falls back to text; numbers and bools are kept as their literal text
fn lenient_type<'de, D>(deserializer: D) -> Result<FieldType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => FieldType::parse(&s),
        serde_json::Value::Null => FieldType::Text,
        serde_json::Value::Number(_) | serde_json::Value::Bool(_) => FieldType::Other(value.to_string()),
        _ => FieldType::Text,
    })
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
