//! Inspection of migration script bodies
//!
//! A script that issues its own `BEGIN`/`COMMIT`/`ROLLBACK`/`END`, or that
//! carries a `-- migrun:no-transaction` line, is applied without a runner
//! transaction around it.

/// Opt-out line for scripts that must not run inside a transaction
pub const NO_TRANSACTION_DIRECTIVE: &str = "-- migrun:no-transaction";

/// Whether `sql` controls transactions itself
///
/// Comments, quoted text and trigger bodies are skipped, so a trigger's
/// closing `END` does not count.
///
/// ```
/// use migrun_core::script::manages_own_transaction;
///
/// assert!(manages_own_transaction("BEGIN; CREATE TABLE a (id INTEGER); COMMIT;"));
/// assert!(!manages_own_transaction("CREATE TABLE a (id INTEGER);"));
/// ```
pub fn manages_own_transaction(sql: &str) -> bool {
    has_directive(sql) || has_transaction_statement(sql)
}

fn has_directive(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .any(|line| line.eq_ignore_ascii_case(NO_TRANSACTION_DIRECTIVE))
}

fn has_transaction_statement(sql: &str) -> bool {
    let mut in_trigger = false;
    for text in split_statements(sql) {
        let upper = text.to_ascii_uppercase();
        let words: Vec<&str> = upper.split_whitespace().collect();
        let word = |i: usize| words.get(i).copied();

        if in_trigger {
            if words == ["END"] {
                in_trigger = false;
            }
            continue;
        }
        if word(0) == Some("CREATE") && (word(1) == Some("TRIGGER") || word(2) == Some("TRIGGER")) {
            in_trigger = true;
            continue;
        }

        let controls_transaction = match word(0) {
            Some("BEGIN") | Some("COMMIT") | Some("END") => true,
            // ROLLBACK TO a savepoint stays inside the transaction
            Some("ROLLBACK") => !words.contains(&"TO"),
            _ => false,
        };
        if controls_transaction {
            return true;
        }
    }
    false
}

/// Split on `;`, dropping comments and the contents of quoted text
fn split_statements(sql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                current.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                current.push(' ');
            }
            '\'' | '"' | '`' => {
                for inner in chars.by_ref() {
                    if inner == c {
                        break;
                    }
                }
                current.push_str(" '' ");
            }
            ';' => push_statement(&mut out, &mut current),
            _ => current.push(c),
        }
    }
    push_statement(&mut out, &mut current);
    out
}

fn push_statement(out: &mut Vec<String>, current: &mut String) {
    let text = current.trim();
    if !text.is_empty() {
        out.push(text.to_string());
    }
    current.clear();
}
