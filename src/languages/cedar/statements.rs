//! Top-level statement splitting for Cedar source
//!
//! Cedar's policy-set parser is all-or-nothing. Splitting the source on `;`
//! first lets each policy be parsed on its own, so one broken policy does not
//! hide the others. Cedar has no `;` inside a policy body, so brackets are not
//! tracked: an unbalanced bracket stays inside its own statement.

/// Split `source` into top-level statements
///
/// A statement ends at a `;` outside string literals and `//` comments.
/// Text after the last `;` that is not blank is returned as a final
/// (unterminated) statement. Statements made only of whitespace and
/// comments are dropped.
pub fn split_statements(source: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;

    let mut chars = source.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '/' if matches!(chars.peek(), Some((_, '/'))) => in_comment = true,
            ';' => {
                push_statement(&mut statements, &source[start..pos + 1]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    push_statement(&mut statements, &source[start..]);
    statements
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    if has_code(text) {
        statements.push(text.trim().to_string());
    }
}

/// True when `text` has anything besides whitespace and line comments
fn has_code(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("//")
    })
}
