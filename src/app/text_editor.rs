use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Byte offset of the `chars`-th character
fn byte_index(buffer: &str, chars: usize) -> usize {
    buffer
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(buffer.len())
}

/// Handle single-line editing for a buffer whose cursor counts characters.
/// Returns true if the event was handled, false otherwise
pub fn handle_text_editor_input(event: KeyEvent, buffer: &mut String, cursor_pos: &mut usize) -> bool {
    let len = buffer.chars().count();
    let pos = (*cursor_pos).min(len);

    match event.code {
        KeyCode::Char(c) => {
            if event.modifiers.contains(KeyModifiers::CONTROL) {
                match c {
                    'u' => {
                        // Clear to start
                        buffer.drain(..byte_index(buffer, pos));
                        *cursor_pos = 0;
                    }
                    'k' => {
                        // Clear to end
                        let at = byte_index(buffer, pos);
                        buffer.truncate(at);
                        *cursor_pos = pos;
                    }
                    'a' => *cursor_pos = 0,
                    'e' => *cursor_pos = len,
                    'w' => {
                        // Delete word before cursor
                        let chars: Vec<char> = buffer.chars().collect();
                        let mut new_pos = pos;
                        while new_pos > 0 && chars[new_pos - 1].is_whitespace() {
                            new_pos -= 1;
                        }
                        while new_pos > 0 && !chars[new_pos - 1].is_whitespace() {
                            new_pos -= 1;
                        }
                        let start = byte_index(buffer, new_pos);
                        let end = byte_index(buffer, pos);
                        buffer.drain(start..end);
                        *cursor_pos = new_pos;
                    }
                    _ => return false,
                }
            } else {
                buffer.insert(byte_index(buffer, pos), c);
                *cursor_pos = pos + 1;
            }
            true
        }
        KeyCode::Backspace => {
            if pos > 0 {
                buffer.remove(byte_index(buffer, pos - 1));
                *cursor_pos = pos - 1;
            }
            true
        }
        KeyCode::Delete => {
            if pos < len {
                buffer.remove(byte_index(buffer, pos));
            }
            true
        }
        KeyCode::Left => {
            *cursor_pos = pos.saturating_sub(1);
            true
        }
        KeyCode::Right => {
            *cursor_pos = (pos + 1).min(len);
            true
        }
        KeyCode::Home => {
            *cursor_pos = 0;
            true
        }
        KeyCode::End => {
            *cursor_pos = len;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(buffer: &mut String, cursor: &mut usize, text: &str) {
        for c in text.chars() {
            handle_text_editor_input(key(KeyCode::Char(c)), buffer, cursor);
        }
    }

    #[test]
    fn edits_multibyte_text() {
        let mut buffer = String::new();
        let mut cursor = 0;
        type_str(&mut buffer, &mut cursor, "café crème");
        assert_eq!(cursor, 10);

        handle_text_editor_input(key(KeyCode::Left), &mut buffer, &mut cursor);
        handle_text_editor_input(key(KeyCode::Backspace), &mut buffer, &mut cursor);
        assert_eq!(buffer, "café crèe");
        assert_eq!(cursor, 8);

        handle_text_editor_input(key(KeyCode::Home), &mut buffer, &mut cursor);
        handle_text_editor_input(key(KeyCode::Delete), &mut buffer, &mut cursor);
        assert_eq!(buffer, "afé crèe");
    }

    #[test]
    fn control_shortcuts() {
        let mut buffer = String::new();
        let mut cursor = 0;
        type_str(&mut buffer, &mut cursor, "an online shop");

        handle_text_editor_input(ctrl('w'), &mut buffer, &mut cursor);
        assert_eq!(buffer, "an online ");

        handle_text_editor_input(ctrl('a'), &mut buffer, &mut cursor);
        handle_text_editor_input(key(KeyCode::Right), &mut buffer, &mut cursor);
        handle_text_editor_input(ctrl('k'), &mut buffer, &mut cursor);
        assert_eq!(buffer, "a");

        handle_text_editor_input(ctrl('e'), &mut buffer, &mut cursor);
        handle_text_editor_input(ctrl('u'), &mut buffer, &mut cursor);
        assert!(buffer.is_empty());
        assert_eq!(cursor, 0);
    }

    #[test]
    fn unknown_control_keys_fall_through() {
        let mut buffer = String::from("x");
        let mut cursor = 1;
        assert!(!handle_text_editor_input(ctrl('d'), &mut buffer, &mut cursor));
        assert!(!handle_text_editor_input(key(KeyCode::Enter), &mut buffer, &mut cursor));
        assert_eq!(buffer, "x");
    }
}
