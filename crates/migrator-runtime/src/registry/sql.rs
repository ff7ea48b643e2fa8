use std::iter::Peekable;
use std::str::Chars;

/// Lexical context of the splitter. A `;` ends a statement only in `Code`.
#[derive(Debug, Clone, PartialEq)]
enum Scan {
    Code,
    /// Inside `'...'`.
    Literal,
    /// Inside `"..."`.
    Identifier,
    /// Inside `-- ...` up to the end of the line.
    LineComment,
    /// Inside `/* ... */`, which nests in PostgreSQL.
    BlockComment(usize),
    /// Inside `$tag$ ... $tag$`.
    DollarQuote(String),
}

/// Split SQL into individual statements.
///
/// Semicolons inside string literals, quoted identifiers, comments and
/// dollar-quoted bodies (PL/pgSQL functions) do not end a statement.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut scan = Scan::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        let next = match &scan {
            Scan::Code => match c {
                '\'' => Some(Scan::Literal),
                '"' => Some(Scan::Identifier),
                '-' if next_is(&mut chars, &mut current, '-') => Some(Scan::LineComment),
                '/' if next_is(&mut chars, &mut current, '*') => Some(Scan::BlockComment(1)),
                '$' => read_dollar_tag(&mut chars, &mut current).map(Scan::DollarQuote),
                ';' => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    None
                }
                _ => None,
            },
            // a doubled quote is an escaped quote, not the end
            Scan::Literal if c == '\'' && !next_is(&mut chars, &mut current, '\'') => {
                Some(Scan::Code)
            }
            Scan::Identifier if c == '"' && !next_is(&mut chars, &mut current, '"') => {
                Some(Scan::Code)
            }
            Scan::LineComment if c == '\n' => Some(Scan::Code),
            Scan::BlockComment(depth) => {
                let depth = *depth;
                if c == '*' && next_is(&mut chars, &mut current, '/') {
                    Some(if depth == 1 {
                        Scan::Code
                    } else {
                        Scan::BlockComment(depth - 1)
                    })
                } else if c == '/' && next_is(&mut chars, &mut current, '*') {
                    Some(Scan::BlockComment(depth + 1))
                } else {
                    None
                }
            }
            Scan::DollarQuote(tag) if c == '$' => read_dollar_tag(&mut chars, &mut current)
                .filter(|closing| closing == tag)
                .map(|_| Scan::Code),
            _ => None,
        };

        if let Some(next) = next {
            scan = next;
        }
    }

    // The last statement may not end with ;
    push_statement(&mut statements, &current);

    statements
}

/// Consume the next char into `current` if it is `expected`.
fn next_is(chars: &mut Peekable<Chars<'_>>, current: &mut String, expected: char) -> bool {
    if chars.peek() == Some(&expected) {
        chars.next();
        current.push(expected);
        true
    } else {
        false
    }
}

/// Read the rest of a `$tag$` after its opening `$`. Returns `None` for a
/// positional parameter such as `$1` or a lone `$`.
fn read_dollar_tag(chars: &mut Peekable<Chars<'_>>, current: &mut String) -> Option<String> {
    let mut tag = String::from("$");
    while let Some(&c) = chars.peek() {
        if c == '$' {
            chars.next();
            current.push(c);
            tag.push(c);
            return Some(tag);
        }
        let starts_with_digit = tag.len() == 1 && c.is_ascii_digit();
        if starts_with_digit || !(c.is_alphanumeric() || c == '_') {
            return None;
        }
        chars.next();
        current.push(c);
        tag.push(c);
    }
    None
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim().trim_end_matches(';').trim();
    let comment_only = stmt.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with("--")
    });
    if !comment_only {
        statements.push(stmt.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_statements() {
        let stmts = split_sql_statements("SELECT 1; SELECT 2; SELECT 3;");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_split_without_trailing_semicolon() {
        let stmts = split_sql_statements("SELECT 1;\nSELECT 2");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_split_skips_comment_only_blocks() {
        let stmts = split_sql_statements("-- nothing here\n;\nSELECT 1;\n-- trailing");
        assert_eq!(stmts, vec!["SELECT 1"]);
    }

    #[test]
    fn test_split_with_dollar_quoted_function() {
        let sql = r#"
CREATE FUNCTION test() RETURNS void AS $$
BEGIN
    SELECT 1;
    SELECT 2;
END;
$$ LANGUAGE plpgsql;

SELECT 3;
"#;
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("CREATE FUNCTION"));
        assert!(stmts[0].contains("$$ LANGUAGE plpgsql"));
        assert!(stmts[1].contains("SELECT 3"));
    }

    #[test]
    fn test_split_with_tagged_dollar_quote() {
        let sql = "DO $body$ BEGIN PERFORM 1; END $body$; SELECT 2;";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("PERFORM 1;"));
    }

    #[test]
    fn test_semicolon_in_string_literal() {
        let stmts = split_sql_statements("INSERT INTO t (s) VALUES ('a;b');");
        assert_eq!(stmts, vec!["INSERT INTO t (s) VALUES ('a;b')"]);
    }

    #[test]
    fn test_escaped_quote_in_string_literal() {
        let stmts = split_sql_statements("INSERT INTO t (s) VALUES ('it''s; fine'); SELECT 2;");
        assert_eq!(
            stmts,
            vec!["INSERT INTO t (s) VALUES ('it''s; fine')", "SELECT 2"]
        );
    }

    #[test]
    fn test_semicolon_in_quoted_identifier() {
        let stmts = split_sql_statements(r#"CREATE TABLE "odd;name" (id INT); SELECT 2;"#);
        assert_eq!(stmts, vec![r#"CREATE TABLE "odd;name" (id INT)"#, "SELECT 2"]);
    }

    #[test]
    fn test_semicolon_in_line_comment() {
        let stmts = split_sql_statements("SELECT 1 -- first; not a break
;
SELECT 2;");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("SELECT 1"));
        assert_eq!(stmts[1], "SELECT 2");
    }

    #[test]
    fn test_semicolon_in_block_comment() {
        let stmts = split_sql_statements("SELECT /* a; /* nested; */ b; */ 1; SELECT 2;");
        assert_eq!(stmts, vec!["SELECT /* a; /* nested; */ b; */ 1", "SELECT 2"]);
    }

    #[test]
    fn test_positional_parameter_is_not_a_dollar_quote() {
        let stmts = split_sql_statements("PREPARE q AS SELECT $1; SELECT 2;");
        assert_eq!(stmts, vec!["PREPARE q AS SELECT $1", "SELECT 2"]);
    }

    #[test]
    fn test_quotes_inside_dollar_quote() {
        let sql = "DO $$ BEGIN RAISE NOTICE 'x;y'; END $$; SELECT 'z';";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts, vec!["DO $$ BEGIN RAISE NOTICE 'x;y'; END $$", "SELECT 'z'"]);
    }
}
