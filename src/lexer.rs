//! Lexical analysis: turning a raw input line into word tokens.
//!
//! Words are separated by whitespace only. There is no quoting or escaping, so a
//! word can never contain one of the delimiter characters. Operators such as `|`,
//! `&&` or `>` are recognised later, and only when they stand as words of their own.

/// Characters that separate words: space, tab, carriage return, newline and bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// Separator between independent statements on one line.
pub const STATEMENT_SEPARATOR: char = ';';

fn is_delimiter(ch: char) -> bool {
    DELIMITERS.contains(&ch)
}

/// Split a line into an ordered sequence of word tokens.
///
/// The input is left untouched. Empty or whitespace-only input yields no tokens.
///
/// ```
/// use utsh::lexer::split_into_tokens;
/// assert_eq!(split_into_tokens("a  b\tc\n"), vec!["a", "b", "c"]);
/// ```
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split(is_delimiter)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split a line into `;`-separated statements.
///
/// Statements that contain nothing but whitespace are dropped, so `ls;;pwd;`
/// produces two statements.
pub fn split_statements(line: &str) -> Vec<&str> {
    line.split(STATEMENT_SEPARATOR)
        .map(|stmt| stmt.trim_matches(is_delimiter))
        .filter(|stmt| !stmt.is_empty())
        .collect()
}
