#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    /// Mnemonic, label or function name.
    Ident(String),
    /// `.name`, without the dot.
    Directive(String),
    Integer(String),
    Float(String),
    /// String literal with escapes already applied.
    String(String),
    Char(char),
    Colon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Ident(s) => write!(f, "{}", s),
            Directive(s) => write!(f, ".{}", s),
            Integer(s) => write!(f, "{}", s),
            Float(s) => write!(f, "{}", s),
            String(s) => write!(f, "{:?}", s),
            Char(c) => write!(f, "{:?}", c),
            Colon => write!(f, ":"),
        }
    }
}
