use std::iter::Peekable;
use std::str::Chars;

use crate::shell::error::{ShellError, ShellResult};

/// 把一行输入切分成单词，在这里处理引号和转义。
/// `|`、`2>>` 等操作符也作为普通单词输出，只按值区分。
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn tokenize(mut self) -> ShellResult<Vec<String>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// 读取一个以空白分隔的单词，相邻片段直接拼接。
    fn next_token(&mut self) -> ShellResult<Option<String>> {
        self.skip_whitespace();
        if self.peek_char().is_none() {
            return Ok(None);
        }

        let mut word = String::new();
        while let Some(c) = self.peek_char() {
            match c {
                c if c.is_whitespace() => break,
                '\'' => {
                    self.read_char();
                    self.read_single_quoted(&mut word)?;
                }
                '"' => {
                    self.read_char();
                    self.read_double_quoted(&mut word)?;
                }
                '\\' => {
                    self.read_char();
                    // 行尾的单独反斜杠按字面保留
                    word.push(self.read_char().unwrap_or('\\'));
                }
                _ => self.read_plain(&mut word),
            }
        }

        Ok(Some(word))
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn read_plain(&mut self, word: &mut String) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || matches!(c, '\'' | '"' | '\\') {
                break;
            }
            word.push(c);
            self.read_char();
        }
    }

    fn read_single_quoted(&mut self, word: &mut String) -> ShellResult<()> {
        loop {
            match self.read_char() {
                Some('\'') => return Ok(()),
                Some(c) => word.push(c),
                None => return Err(ShellError::UnterminatedQuote("single")),
            }
        }
    }

    /// 双引号内只有 `\"` 和 `\\` 是转义。
    fn read_double_quoted(&mut self, word: &mut String) -> ShellResult<()> {
        loop {
            match self.read_char() {
                Some('"') => return Ok(()),
                Some('\\') => match self.peek_char() {
                    Some(c @ ('"' | '\\')) => {
                        word.push(c);
                        self.read_char();
                    }
                    _ => word.push('\\'),
                },
                Some(c) => word.push(c),
                None => return Err(ShellError::UnterminatedQuote("double")),
            }
        }
    }
}

pub fn tokenize(line: &str) -> ShellResult<Vec<String>> {
    Lexer::new(line).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn words(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(words("ls -l"), vec!["ls", "-l"]);
        assert_eq!(words("  echo   a\tb  "), vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_blank_line() {
        assert!(words("").is_empty());
        assert!(words(" \t ").is_empty());
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(
            words(r#"echo 'a b' "c\"d""#),
            vec!["echo", "a b", "c\"d"]
        );
    }

    #[test]
    fn test_single_quotes_are_literal() {
        assert_eq!(words(r#"echo 'a\nb\' x"#), vec!["echo", "a\\nb\\", "x"]);
        assert_eq!(words(r#"'say "hi"'"#), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(words(r#""a\\b""#), vec!["a\\b"]);
        assert_eq!(words(r#""a\nb\$c""#), vec!["a\\nb\\$c"]);
        assert_eq!(words(r#""it's""#), vec!["it's"]);
    }

    #[test]
    fn test_backslash_outside_quotes() {
        assert_eq!(words(r"a\ b"), vec!["a b"]);
        assert_eq!(words(r#"\'\"\\"#), vec![r#"'"\"#]);
        assert_eq!(words(r"a\nb"), vec!["anb"]);
        assert_eq!(words(r"end\"), vec!["end\\"]);
    }

    #[test]
    fn test_adjacent_chunks_concatenate() {
        assert_eq!(words(r#"foo'bar'"baz"\ qux"#), vec!["foobarbaz qux"]);
        assert_eq!(words(r#"'a' 'b'"#), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_quotes_make_empty_word() {
        assert_eq!(words("echo '' \"\" x"), vec!["echo", "", "", "x"]);
    }

    #[test]
    fn test_operators_are_plain_words() {
        assert_eq!(
            words("ls | wc -l 2>> err.txt"),
            vec!["ls", "|", "wc", "-l", "2>>", "err.txt"]
        );
        assert_eq!(words("a|b"), vec!["a|b"]);
        assert_eq!(words("'|'"), vec!["|"]);
    }

    #[test]
    fn test_unterminated_quotes() {
        assert!(matches!(
            tokenize("echo 'abc"),
            Err(ShellError::UnterminatedQuote("single"))
        ));
        assert!(matches!(
            tokenize(r#"echo "abc\""#),
            Err(ShellError::UnterminatedQuote("double"))
        ));
    }
}
