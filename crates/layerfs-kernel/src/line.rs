//! Splitting a command line into words.
//!
//! Whitespace separates words. Single quotes keep everything literal;
//! double quotes keep whitespace and honor `\"` and `\\`; a backslash outside
//! quotes escapes the next character. `''` produces an empty word.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
    #[error("trailing backslash")]
    TrailingBackslash,
}

pub fn split_words(line: &str) -> Result<Vec<String>, LineError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(LineError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(LineError::UnterminatedQuote('"')),
                        },
                        Some(c) => current.push(c),
                        None => return Err(LineError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(LineError::TrailingBackslash),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", &[])]
    #[case("   ", &[])]
    #[case("ls", &["ls"])]
    #[case("cp /simple.txt   /Desktop", &["cp", "/simple.txt", "/Desktop"])]
    #[case("cat 'my file.txt'", &["cat", "my file.txt"])]
    #[case(r#"cat "a \"b\" c""#, &["cat", r#"a "b" c"#])]
    #[case(r"cat my\ file", &["cat", "my file"])]
    #[case("touch ''", &["touch", ""])]
    #[case("a'b'\"c\"", &["abc"])]
    fn splits(#[case] line: &str, #[case] expected: &[&str]) {
        assert_eq!(split_words(line).unwrap(), expected);
    }

    #[test]
    fn unterminated_quotes_fail() {
        assert_eq!(
            split_words("cat 'oops").unwrap_err(),
            LineError::UnterminatedQuote('\'')
        );
        assert_eq!(
            split_words("cat \"oops").unwrap_err(),
            LineError::UnterminatedQuote('"')
        );
        assert_eq!(split_words("cat x\\").unwrap_err(), LineError::TrailingBackslash);
    }
}
