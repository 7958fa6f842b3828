/*!
# Rust Language Module

This Rust module provides errors shared by the whole crate and a text
assembler for the Tern instruction set.

*/

#[macro_use]
mod error;
mod lex;
mod parse;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::lex;
pub use parse::assemble;
pub use token::Token;

/// 1-based source line, `None` for errors without a text origin.
pub type LineNumber = Option<usize>;
/// Character span within a line.
pub type Column = std::ops::Range<usize>;
