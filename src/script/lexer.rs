//! Tokenizer for policy scripts.

use super::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Str(String),
    Number(f64),
    Ident(String),
    Let,
    Const,
    Return,
    Throw,
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Colon,
    Plus,
    Minus,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize `source`, skipping whitespace and `//` comments.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                            break;
                        }
                    }
                } else {
                    return Err(ScriptError::parse(line, "unexpected character `/`"));
                }
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        '\n' => {
                            return Err(ScriptError::parse(line, "unterminated string"));
                        }
                        '\\' => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some('r') => text.push('\r'),
                            Some('\\') => text.push('\\'),
                            Some('\'') => text.push('\''),
                            Some('"') => text.push('"'),
                            Some('0') => text.push('\0'),
                            Some(other) => {
                                return Err(ScriptError::parse(
                                    line,
                                    format!("unknown escape `\\{}`", other),
                                ));
                            }
                            None => {
                                return Err(ScriptError::parse(line, "unterminated string"));
                            }
                        },
                        c => text.push(c),
                    }
                }
                if !closed {
                    return Err(ScriptError::parse(line, "unterminated string"));
                }
                tokens.push(Spanned {
                    token: Token::Str(text),
                    line,
                });
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek() == Some(&'.') {
                    // Only consume the dot for a fraction, not for `1.toSQL()`.
                    let mut ahead = chars.clone();
                    ahead.next();
                    if ahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                        text.push('.');
                        chars.next();
                        while let Some(&c) = chars.peek() {
                            if c.is_ascii_digit() {
                                text.push(c);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                let value: f64 = text
                    .parse()
                    .map_err(|_| ScriptError::parse(line, format!("bad number `{}`", text)))?;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    line,
                });
            }
            c if is_ident_start(c) => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if is_ident_continue(c) {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match text.as_str() {
                    "let" => Token::Let,
                    "const" => Token::Const,
                    "return" => Token::Return,
                    "throw" => Token::Throw,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(text),
                };
                tokens.push(Spanned { token, line });
            }
            _ => {
                let token = match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ',' => Token::Comma,
                    '.' => Token::Dot,
                    ';' => Token::Semi,
                    ':' => Token::Colon,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '=' => Token::Assign,
                    other => {
                        return Err(ScriptError::parse(
                            line,
                            format!("unexpected character `{}`", other),
                        ));
                    }
                };
                chars.next();
                tokens.push(Spanned { token, line });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn tokenizes_a_builder_chain() {
        let toks = kinds("let p = policy('x');");
        assert_eq!(
            toks,
            vec![
                Token::Let,
                Token::Ident("p".into()),
                Token::Assign,
                Token::Ident("policy".into()),
                Token::LParen,
                Token::Str("x".into()),
                Token::RParen,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn both_quote_styles_and_escapes() {
        assert_eq!(
            kinds(r#"'a\'b' "c\nd""#),
            vec![Token::Str("a'b".into()), Token::Str("c\nd".into())]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_tracked() {
        let toks = tokenize("// header\nreturn 1;").unwrap();
        assert_eq!(toks[0].token, Token::Return);
        assert_eq!(toks[0].line, 2);
    }

    #[test]
    fn number_followed_by_method_call_keeps_the_dot() {
        assert_eq!(
            kinds("1.5 2.toSQL"),
            vec![
                Token::Number(1.5),
                Token::Number(2.0),
                Token::Dot,
                Token::Ident("toSQL".into()),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("return 'oops").unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(kinds("null"), vec![Token::Null]);
        assert_eq!(kinds("nullable"), vec![Token::Ident("nullable".into())]);
    }
}
