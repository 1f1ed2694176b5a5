//! Dice expression grammar
//!
//! An expression is a sequence of signed terms. A term is an integer
//! literal, a die roll `NdS` (`N` optional, `S` digits or `F` for fate), or
//! a bracketed sub-expression, optionally marked exploding with a trailing
//! `!!`. A target comparison (`\u{2265}`, `>=` or `=` plus a number)
//! attaches once to the whole expression. Whitespace between tokens is
//! insignificant.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::ast::{BinOp, CompareOp, DiceExpr, DieSides};
use super::expander;

/// Upper bound for die counts and numbered die sides.
pub const DIE_BOUND: i64 = 1000;
/// Upper bound for comparison targets.
pub const TARGET_BOUND: i64 = 1000;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid dice expression: {0}")]
    Syntax(String),
    #[error("value out of range: {0}")]
    Range(String),
    #[error("unsupported expression structure: {0}")]
    Structure(String),
}

pub fn parse(text: &str) -> Result<DiceExpr, ParseError> {
    let mut cursor = Cursor::new(text);
    cursor.skip_whitespace();
    if cursor.peek().is_none() {
        return Err(ParseError::Syntax("expression is empty".to_owned()));
    }

    let expr = parse_sum(&mut cursor)?;
    cursor.skip_whitespace();
    let expr = match parse_compare_op(&mut cursor)? {
        Some(op) => {
            cursor.skip_whitespace();
            let target = read_number(&mut cursor).ok_or_else(|| {
                ParseError::Syntax("expected a target number after the comparison".to_owned())
            })?;
            if !(0..=TARGET_BOUND).contains(&target) {
                return Err(ParseError::Range(format!(
                    "target number {target} must be between 0 and {TARGET_BOUND}"
                )));
            }
            DiceExpr::ThresholdCompare { inner: Box::new(expr), op, target: target as i32 }
        }
        None => expr,
    };

    cursor.skip_whitespace();
    match cursor.peek() {
        None => Ok(expr),
        Some(ch) => Err(ParseError::Syntax(format!("unexpected `{ch}` after the expression"))),
    }
}

/// Grammar check without materializing results, repetition wrapper
/// included. Returns the user-facing explanation for invalid input.
pub fn validate(text: &str) -> Option<String> {
    expander::plan(text)
        .and_then(|(_, expression)| parse(expression).map(|_| ()))
        .err()
        .map(|error| error.to_string())
}

/// Checks a labeled button set (`expression@Label` entries). Invalid
/// entries are reported together in one user-facing message.
pub fn validate_list(
    entries: &[String],
    label_delimiter: char,
    config_delimiter: char,
    help_hint: &str,
) -> Option<String> {
    let invalid: Vec<&str> = entries
        .iter()
        .filter(|entry| !labeled_entry_is_valid(entry, label_delimiter, config_delimiter))
        .map(String::as_str)
        .collect();

    if invalid.is_empty() {
        None
    } else {
        Some(format!(
            "The following dice expression are invalid: {}. \
             Use {help_hint} to get more information on how to use the command.",
            invalid.join(",")
        ))
    }
}

fn labeled_entry_is_valid(entry: &str, label_delimiter: char, config_delimiter: char) -> bool {
    if entry.contains(config_delimiter) {
        return false;
    }
    let (expression, label) = match entry.split_once(label_delimiter) {
        Some((expression, label)) => (expression.trim(), Some(label.trim())),
        None => (entry.trim(), None),
    };
    if let Some(label) = label {
        if label.is_empty() || label.len() > 80 || label.contains(label_delimiter) {
            return false;
        }
    }
    if expression.is_empty() || expression.len() > 80 {
        return false;
    }
    validate(expression.trim_start_matches(['+', '-'])).is_none()
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { chars: text.chars().peekable() }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(ch) if ch.is_whitespace()) {
            self.chars.next();
        }
    }
}

fn parse_sum(cursor: &mut Cursor) -> Result<DiceExpr, ParseError> {
    cursor.skip_whitespace();
    let negative = match cursor.peek() {
        Some('-') => {
            cursor.bump();
            true
        }
        Some('+') => {
            cursor.bump();
            false
        }
        _ => false,
    };

    let first = parse_term(cursor)?;
    let mut expr = if negative { negate(first) } else { first };

    loop {
        cursor.skip_whitespace();
        let op = match cursor.peek() {
            Some('+') => BinOp::Add,
            Some('-') => BinOp::Subtract,
            _ => break,
        };
        cursor.bump();
        cursor.skip_whitespace();
        if cursor.peek().is_none() {
            return Err(ParseError::Syntax("expression ends with an operator".to_owned()));
        }
        let right = parse_term(cursor)?;
        expr = DiceExpr::BinaryOp { op, left: Box::new(expr), right: Box::new(right) };
    }

    Ok(expr)
}

fn negate(expr: DiceExpr) -> DiceExpr {
    match expr {
        DiceExpr::Literal(value) => DiceExpr::Literal(-value),
        other => DiceExpr::BinaryOp {
            op: BinOp::Subtract,
            left: Box::new(DiceExpr::Literal(0)),
            right: Box::new(other),
        },
    }
}

fn parse_term(cursor: &mut Cursor) -> Result<DiceExpr, ParseError> {
    cursor.skip_whitespace();
    let term = match cursor.peek() {
        Some('[') => {
            cursor.bump();
            let inner = parse_sum(cursor)?;
            cursor.skip_whitespace();
            if cursor.bump() != Some(']') {
                return Err(ParseError::Syntax("bracket `[` is never closed".to_owned()));
            }
            DiceExpr::Group(Box::new(inner))
        }
        Some('d') | Some('D') => {
            cursor.bump();
            parse_die(cursor, 1)?
        }
        Some(ch) if ch.is_ascii_digit() => {
            let number = read_number(cursor)
                .ok_or_else(|| ParseError::Syntax("expected a number".to_owned()))?;
            match cursor.peek() {
                Some('d') | Some('D') => {
                    cursor.bump();
                    parse_die(cursor, number)?
                }
                _ => {
                    if number > i64::from(i32::MAX) {
                        return Err(ParseError::Range(format!("number {number} is too large")));
                    }
                    DiceExpr::Literal(number as i32)
                }
            }
        }
        Some(ch) => return Err(ParseError::Syntax(format!("unexpected character `{ch}`"))),
        None => return Err(ParseError::Syntax("expected a term".to_owned())),
    };

    parse_explode_suffix(cursor, term)
}

fn parse_die(cursor: &mut Cursor, count: i64) -> Result<DiceExpr, ParseError> {
    if !(1..=DIE_BOUND).contains(&count) {
        return Err(ParseError::Range(format!(
            "die count {count} must be between 1 and {DIE_BOUND}"
        )));
    }
    let sides = match cursor.peek() {
        Some('F') | Some('f') => {
            cursor.bump();
            DieSides::Fate
        }
        Some(ch) if ch.is_ascii_digit() => {
            let faces = read_number(cursor)
                .ok_or_else(|| ParseError::Syntax("expected die sides".to_owned()))?;
            if !(1..=DIE_BOUND).contains(&faces) {
                return Err(ParseError::Range(format!(
                    "die sides {faces} must be between 1 and {DIE_BOUND}"
                )));
            }
            DieSides::Faces(faces as u32)
        }
        _ => return Err(ParseError::Syntax("expected die sides after `d`".to_owned())),
    };
    Ok(DiceExpr::DieRoll { count: count as u32, sides })
}

fn parse_explode_suffix(cursor: &mut Cursor, term: DiceExpr) -> Result<DiceExpr, ParseError> {
    cursor.skip_whitespace();
    if cursor.peek() != Some('!') {
        return Ok(term);
    }
    cursor.bump();
    if cursor.bump() != Some('!') {
        return Err(ParseError::Syntax("exploding dice are written with `!!`".to_owned()));
    }
    match term.underlying_die() {
        Some((_, DieSides::Faces(_))) => Ok(DiceExpr::Explode(Box::new(term))),
        Some((_, DieSides::Fate)) => Err(ParseError::Syntax("fate dice cannot explode".to_owned())),
        None => Err(ParseError::Syntax("`!!` must follow a die roll".to_owned())),
    }
}

fn read_number(cursor: &mut Cursor) -> Option<i64> {
    let mut value: i64 = 0;
    let mut seen_digit = false;
    while let Some(ch) = cursor.peek() {
        let Some(digit) = ch.to_digit(10) else { break };
        cursor.bump();
        seen_digit = true;
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }
    seen_digit.then_some(value)
}

fn parse_compare_op(cursor: &mut Cursor) -> Result<Option<CompareOp>, ParseError> {
    match cursor.peek() {
        Some('\u{2265}') => {
            cursor.bump();
            Ok(Some(CompareOp::GreaterEqual))
        }
        Some('>') => {
            cursor.bump();
            if cursor.peek() == Some('=') {
                cursor.bump();
                Ok(Some(CompareOp::GreaterEqual))
            } else {
                Err(ParseError::Syntax("expected `>=` for a target comparison".to_owned()))
            }
        }
        Some('=') => {
            cursor.bump();
            Ok(Some(CompareOp::Equal))
        }
        _ => Ok(None),
    }
}
