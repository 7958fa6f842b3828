use super::{token::*, Column, Error};

type Result<T> = std::result::Result<T, Error>;

/// Split one line of assembly into tokens with their columns.
/// Everything after `;` outside a literal is a comment.
pub fn lex(s: &str) -> Result<Vec<(Column, Token)>> {
    AsmLexer::lex(s)
}

fn is_asm_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct AsmLexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    col: usize,
}

impl<'a> AsmLexer<'a> {
    fn lex(s: &'a str) -> Result<Vec<(Column, Token)>> {
        let mut lexer = AsmLexer {
            chars: s.char_indices().peekable(),
            col: 0,
        };
        let mut tokens = vec![];
        while let Some(&(_, pk)) = lexer.chars.peek() {
            if is_asm_whitespace(pk) {
                lexer.next();
                continue;
            }
            if pk == ';' {
                break;
            }
            let start = lexer.col;
            let token = lexer.token(pk).map_err(|e| e.in_column(&(start..lexer.col)))?;
            tokens.push((start..lexer.col, token));
        }
        Ok(tokens)
    }

    fn next(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        self.col += 1;
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn token(&mut self, pk: char) -> Result<Token> {
        if pk == ':' {
            self.next();
            return Ok(Token::Colon);
        }
        if pk == '"' {
            return self.string();
        }
        if pk == '\'' {
            return self.character();
        }
        if pk == '.' {
            self.next();
            return match self.word() {
                Some(word) => Ok(Token::Directive(word)),
                None => Err(error!(SyntaxError; "EXPECTED DIRECTIVE NAME")),
            };
        }
        if pk == '-' || pk.is_ascii_digit() {
            return self.number();
        }
        if is_ident_start(pk) {
            if let Some(word) = self.word() {
                return Ok(Token::Ident(word));
            }
        }
        self.next();
        Err(error!(SyntaxError; "UNEXPECTED CHARACTER {:?}", pk))
    }

    fn word(&mut self) -> Option<String> {
        let mut s = String::new();
        while let Some(pk) = self.peek() {
            if s.is_empty() && !is_ident_start(pk) || !is_ident_char(pk) {
                break;
            }
            s.push(pk);
            self.next();
        }
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }

    fn number(&mut self) -> Result<Token> {
        let mut s = String::new();
        let mut decimal = false;
        if let Some('-') = self.peek() {
            s.push('-');
            self.next();
        }
        while let Some(pk) = self.peek() {
            if pk.is_ascii_digit() {
                s.push(pk);
            } else if pk == '.' && !decimal {
                decimal = true;
                s.push(pk);
            } else {
                break;
            }
            self.next();
        }
        if !s.chars().any(|c| c.is_ascii_digit()) {
            return Err(error!(SyntaxError; "EXPECTED NUMBER"));
        }
        if decimal {
            Ok(Token::Float(s))
        } else {
            Ok(Token::Integer(s))
        }
    }

    fn escaped(&mut self) -> Result<char> {
        match self.next() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some(ch) => Err(error!(SyntaxError; "UNKNOWN ESCAPE \\{}", ch)),
            None => Err(error!(SyntaxError; "UNTERMINATED ESCAPE")),
        }
    }

    fn string(&mut self) -> Result<Token> {
        let mut s = String::new();
        self.next();
        loop {
            match self.next() {
                Some('"') => return Ok(Token::String(s)),
                Some('\\') => s.push(self.escaped()?),
                Some(ch) => s.push(ch),
                None => return Err(error!(SyntaxError; "UNTERMINATED STRING")),
            }
        }
    }

    fn character(&mut self) -> Result<Token> {
        self.next();
        let ch = match self.next() {
            Some('\\') => self.escaped()?,
            Some('\'') | None => return Err(error!(SyntaxError; "EMPTY CHARACTER")),
            Some(ch) => ch,
        };
        match self.next() {
            Some('\'') => Ok(Token::Char(ch)),
            _ => Err(error!(SyntaxError; "UNTERMINATED CHARACTER")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        lex(s).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_instruction_with_comment() {
        assert_eq!(
            tokens("  push_int -12 ; the answer"),
            vec![
                Token::Ident("push_int".to_string()),
                Token::Integer("-12".to_string())
            ]
        );
    }

    #[test]
    fn test_label_and_directive() {
        assert_eq!(
            tokens("loop: .function add 2 2"),
            vec![
                Token::Ident("loop".to_string()),
                Token::Colon,
                Token::Directive("function".to_string()),
                Token::Ident("add".to_string()),
                Token::Integer("2".to_string()),
                Token::Integer("2".to_string()),
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            tokens(r#"push_string "a;\"b\"\n" 'x' '\t' 1.5"#),
            vec![
                Token::Ident("push_string".to_string()),
                Token::String("a;\"b\"\n".to_string()),
                Token::Char('x'),
                Token::Char('\t'),
                Token::Float("1.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_columns() {
        let lexed = lex("get_local 3").unwrap();
        assert_eq!(lexed[0].0, 0..9);
        assert_eq!(lexed[1].0, 10..11);
    }

    #[test]
    fn test_errors() {
        let err = lex(r#"push_string "open"#).unwrap_err();
        assert_eq!(err.text(), "UNTERMINATED STRING");
        assert_eq!(err.column(), 12..17);
        assert!(lex("push_int 4 $").is_err());
    }
}
