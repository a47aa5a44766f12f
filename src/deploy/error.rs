/// User-friendly SQLite error text for a failed migration statement
pub fn format_sql_error(error: &rusqlite::Error, statement: &str) -> String {
    match error {
        rusqlite::Error::SqliteFailure(err, Some(msg)) => {
            format_sqlite_error(err.extended_code, msg, statement)
        }
        rusqlite::Error::SqliteFailure(err, None) => {
            format_sqlite_error(err.extended_code, &err.to_string(), statement)
        }
        _ => {
            format!("SQL error: {}\n\nStatement: {}", error, truncate_statement(statement))
        }
    }
}

fn format_sqlite_error(code: i32, message: &str, statement: &str) -> String {
    let mut result = String::new();

    match code & 0xff {
        1 => {
            // SQLITE_ERROR
            if message.contains("already exists") {
                result.push_str(&format!("{}\n\n", capitalize(message)));
                result.push_str("Hint: the target database already has this table; reset it or deploy to a fresh file");
            } else if message.contains("no such table") {
                result.push_str(&format!("Referenced table missing: {}\n\n", message));
                result.push_str("Hint: statements run in diagram order; a referenced table may be declared later");
            } else if message.contains("syntax error") {
                result.push_str(&format!("Syntax error: {}\n", message));
            } else {
                result.push_str(&format!("SQL error: {}\n", message));
            }
        }
        5 => {
            // SQLITE_BUSY
            result.push_str("Database is locked\n\n");
            result.push_str("Another process is using the database. Try again in a moment.");
        }
        8 => {
            // SQLITE_READONLY
            result.push_str("Database is read-only\n");
        }
        19 => {
            // SQLITE_CONSTRAINT
            result.push_str(&format!("Constraint violation: {}\n", message));
        }
        _ => {
            result.push_str(&format!("SQL error (code {}): {}\n", code, message));
        }
    }

    result.push_str(&format!("\nStatement: {}", truncate_statement(statement)));
    result
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_statement(statement: &str) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 100 {
        format!("{}...", flat.chars().take(97).collect::<String>())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn explains_duplicate_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE posts (id INTEGER)").unwrap();
        let stmt = "CREATE TABLE posts (id INTEGER)";
        let err = conn.execute_batch(stmt).unwrap_err();

        let text = format_sql_error(&err, stmt);
        assert!(text.starts_with("Table posts already exists"), "{text}");
        assert!(text.ends_with("Statement: CREATE TABLE posts (id INTEGER)"));
    }

    #[test]
    fn bare_failures_keep_statement() {
        let err = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(19), None);
        let text = format_sql_error(&err, "INSERT INTO posts VALUES (1)");
        assert!(text.starts_with("Constraint violation:"), "{text}");
        assert!(text.ends_with("Statement: INSERT INTO posts VALUES (1)"));
    }

    #[test]
    fn long_statements_are_flattened_and_truncated() {
        let stmt = format!("CREATE TABLE t (\n  {}\n)", "x INTEGER, ".repeat(20));
        let short = truncate_statement(&stmt);
        assert!(short.ends_with("..."));
        assert!(!short.contains('\n'));
        assert_eq!(short.chars().count(), 100);
    }
}
