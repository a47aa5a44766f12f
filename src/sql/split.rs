/// Split a script into individual statements on `;`.
///
/// Semicolons inside quotes or `--` comments do not split. Chunks are
/// trimmed and chunks holding only comments or whitespace are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let script = script.replace("\r\n", "\n");
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = script.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_comment {
            current.push(ch);
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }

        match (ch, quote) {
            ('\'' | '"', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(ch);
            }
            ('-', None) if chars.peek() == Some(&'-') => {
                in_comment = true;
                current.push(ch);
            }
            (';', None) => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    let has_code = trimmed
        .lines()
        .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"));
    if has_code {
        statements.push(trimmed.to_string());
    }
}
