use std::mem::take;

/// Splits comma-separated text into rows of cells.
///
/// Handles double-quoted fields (with `""` escapes and embedded newlines)
/// and both LF and CRLF line endings. Blank lines are dropped.
pub(crate) fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                push_row(&mut rows, take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row);
    }
    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_rows() {
        let rows = parse_rows("a,b,c\n1,2,3\n");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn quoted_cells_and_crlf() {
        let rows = parse_rows("\"Time, CST\",\"Say \"\"hi\"\"\"\r\n\"two\nlines\",x");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Time, CST", "Say \"hi\""]);
        assert_eq!(rows[1], vec!["two\nlines", "x"]);
    }

    #[test]
    fn keeps_empty_cells_drops_blank_lines() {
        let rows = parse_rows("a,,c\n\n,,\n");
        assert_eq!(rows, vec![vec!["a", "", "c"], vec!["", "", ""]]);
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let rows = parse_rows("5\" screen,ok");
        assert_eq!(rows, vec![vec!["5\" screen", "ok"]]);
    }
}
