use super::{lex::lex, token::Token, Column, Error};
use crate::mach::{Assembler, Bytecode, Opcode, Operand};
use std::convert::TryFrom;
use std::str::FromStr;

type Result<T> = std::result::Result<T, Error>;

/// Assemble a text program into bytecode.
///
/// One statement per line: `label:`, `.function name args locals`, or a
/// mnemonic with at most one operand. `;` starts a comment. Errors from
/// every line are collected, then any unresolved labels and functions.
pub fn assemble(source: &str) -> std::result::Result<Bytecode, Vec<Error>> {
    let mut asm = Assembler::new();
    let mut errors = vec![];
    for (index, line) in source.lines().enumerate() {
        let line_number = Some(index + 1);
        let result = lex(line).and_then(|tokens| statement(&mut asm, line_number, tokens));
        if let Err(error) = result {
            let error = match error.line_number() {
                Some(_) => error,
                None => error.in_line_number(line_number),
            };
            errors.push(error);
        }
    }
    match asm.finish() {
        Ok(code) if errors.is_empty() => Ok(code),
        Ok(_) => Err(errors),
        Err(mut more) => {
            errors.append(&mut more);
            Err(errors)
        }
    }
}

fn statement(
    asm: &mut Assembler,
    line_number: Option<usize>,
    tokens: Vec<(Column, Token)>,
) -> Result<()> {
    let mut tokens = tokens.into_iter();
    let (col, first) = match tokens.next() {
        Some(first) => first,
        None => return Ok(()),
    };
    asm.at(line_number, col.clone());
    let rest: Vec<(Column, Token)> = tokens.collect();
    match first {
        Token::Ident(name) if matches!(rest.first(), Some((_, Token::Colon))) => {
            expect_end(&rest[1..])?;
            asm.label(&name);
        }
        Token::Directive(directive) if directive == "function" => {
            function(asm, &col, &rest)?;
        }
        Token::Ident(mnemonic) => match Opcode::from_mnemonic(&mnemonic) {
            Some(op) => instruction(asm, line_number, op, &col, &rest)?,
            None => return Err(error!(SyntaxError; "UNKNOWN MNEMONIC {}", mnemonic).in_column(&col)),
        },
        other => return Err(error!(SyntaxError; "UNEXPECTED {}", other).in_column(&col)),
    }
    Ok(())
}

fn expect_end(rest: &[(Column, Token)]) -> Result<()> {
    match rest.first() {
        None => Ok(()),
        Some((col, token)) => Err(error!(SyntaxError; "UNEXPECTED {}", token).in_column(col)),
    }
}

fn function(asm: &mut Assembler, col: &Column, rest: &[(Column, Token)]) -> Result<()> {
    match rest {
        [(_, Token::Ident(name)), (args_col, args), (locals_col, locals), tail @ ..] => {
            expect_end(tail)?;
            let args = byte(args, args_col)?;
            let locals = byte(locals, locals_col)?;
            asm.function(name, args, locals);
            Ok(())
        }
        _ => Err(error!(SyntaxError; "EXPECTED .function NAME ARGS LOCALS").in_column(col)),
    }
}

fn instruction(
    asm: &mut Assembler,
    line_number: Option<usize>,
    op: Opcode,
    col: &Column,
    rest: &[(Column, Token)],
) -> Result<()> {
    if op.operand() == Operand::None {
        expect_end(rest)?;
        asm.op(op);
        return Ok(());
    }
    let (operand_col, operand) = match rest.first() {
        Some(first) => first,
        None => return Err(error!(SyntaxError; "{} NEEDS AN OPERAND", op).in_column(col)),
    };
    expect_end(&rest[1..])?;
    asm.at(line_number, operand_col.clone());
    match (op.operand(), operand) {
        (Operand::Address, Token::Ident(label)) => {
            asm.jump(op, label);
        }
        (Operand::Address, Token::Integer(_)) => {
            let addr = number::<u64>(operand, operand_col)?;
            asm.jump_to(op, addr as usize);
        }
        (Operand::Function, Token::Ident(name)) => {
            asm.call_local(name);
        }
        (Operand::Local, _) | (Operand::Count, _) | (Operand::Function, _) => {
            let b = byte(operand, operand_col)?;
            asm.op_u8(op, b);
        }
        (Operand::Int, Token::Integer(_)) => {
            let n = number::<i32>(operand, operand_col)?;
            asm.push_int(n);
        }
        (Operand::Id, Token::String(s)) => {
            asm.push_string(s);
        }
        (Operand::Float, Token::Float(_)) | (Operand::Float, Token::Integer(_)) => {
            let n = number::<f32>(operand, operand_col)?;
            asm.push_float(n);
        }
        (Operand::Char, Token::Char(c)) => {
            asm.push_char(*c);
        }
        (_, token) => {
            return Err(error!(SyntaxError; "BAD OPERAND {} FOR {}", token, op).in_column(operand_col))
        }
    }
    Ok(())
}

fn number<T: FromStr>(token: &Token, col: &Column) -> Result<T> {
    let text = match token {
        Token::Integer(s) | Token::Float(s) => s,
        other => return Err(error!(SyntaxError; "EXPECTED NUMBER, FOUND {}", other).in_column(col)),
    };
    text.parse::<T>()
        .map_err(|_| error!(SyntaxError; "NUMBER {} OUT OF RANGE", text).in_column(col))
}

fn byte(token: &Token, col: &Column) -> Result<u8> {
    let n = number::<i64>(token, col)?;
    u8::try_from(n).map_err(|_| error!(SyntaxError; "{} IS NOT IN 0..=255", n).in_column(col))
}
