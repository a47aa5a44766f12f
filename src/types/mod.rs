pub mod chat;
pub mod schema;

pub use chat::{ChatMessage, Role, TableSummary};
pub use schema::{Field, FieldType, Position, Relationship, Schema, TableNode};
