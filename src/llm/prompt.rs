/// Build the generation prompt for a user's database description
pub fn schema_prompt(description: &str) -> String {
    format!(
        r#"Create a detailed database schema as JSON for React Flow.
Context: {description}

Rules for table structure:
1. Each table must have:
   - Primary key 'id' of type 'ints'
   - Relevant fields with proper types (ints, text, bool, date, float, json)
   - Foreign keys when referencing other tables, with "references" set to the referenced table name
2. Use clear naming conventions:
   - Table names in plural (users, orders, etc.)
   - Field names in snake_case
   - Foreign keys as table_name_id
3. Give every table a short "purpose" and the whole schema a one sentence "description".

Rules for layout:
1. Position tables in a logical flow:
   - Main tables at top (y: 0-200)
   - Related tables below (y: 250+)
   - Space horizontally by 300px
2. Connections must show actual relationships:
   - Source: table with foreign key
   - Target: referenced table

Respond only with valid JSON matching this structure:
{{
  "description": string,
  "nodes": [{{
    "id": string,
    "type": "dbTable",
    "data": {{
      "label": string,
      "purpose": string,
      "fields": [{{
        "name": string,
        "type": string,
        "isPrimary": boolean,
        "isForeign": boolean,
        "references": string,
        "description": string
      }}]
    }},
    "position": {{ "x": number, "y": number }}
  }}],
  "edges": [{{
    "id": string,
    "source": string,
    "target": string
  }}]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_description_and_shape() {
        let prompt = schema_prompt("A library with books and loans");
        assert!(prompt.contains("Context: A library with books and loans\n"));
        assert!(prompt.contains("\"nodes\": [{\n"));
        assert!(prompt.contains("\"edges\": [{\n"));
    }
}
