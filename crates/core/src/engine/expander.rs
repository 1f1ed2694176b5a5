//! Top-level repetition wrapper `Nx[inner]`: N independent evaluations of
//! the inner expression. Recognized only at the outermost level.

use super::evaluator::{evaluate, RollOutcome};
use super::parser::{parse, ParseError};
use super::random::RandomSource;

/// Requests above this count are clamped, not rejected.
pub const REPETITION_CAP: u64 = 25;

pub fn is_repeated(text: &str) -> bool {
    split_repetition(text).is_some()
}

/// The text between the wrapper brackets, empty for non-repeated input.
pub fn inner_expression(text: &str) -> &str {
    split_repetition(text).map(|(_, inner)| inner).unwrap_or("")
}

pub fn expand(
    text: &str,
    random: &mut dyn RandomSource,
) -> Result<Vec<RollOutcome>, ParseError> {
    let (count, expression) = plan(text)?;
    let expr = parse(expression)?;
    Ok((0..count).map(|_| evaluate(&expr, random)).collect())
}

/// Resolves the repetition wrapper to an evaluation count and the
/// expression text to parse. Plain input runs once.
pub(crate) fn plan(text: &str) -> Result<(u32, &str), ParseError> {
    match split_repetition(text) {
        None => Ok((1, text)),
        Some((head, inner)) => {
            let count = repetition_count(head)?;
            if is_repeated(inner.trim()) {
                return Err(ParseError::Structure(
                    "nested repetition is not supported".to_owned(),
                ));
            }
            Ok((count, inner))
        }
    }
}

fn split_repetition(text: &str) -> Option<(&str, &str)> {
    let (head, tail) = text.split_once('x')?;
    let well_formed = !head.is_empty()
        && head.bytes().all(|byte| byte.is_ascii_digit())
        && tail.starts_with('[')
        && tail.ends_with(']');
    well_formed.then(|| (head, &tail[1..tail.len() - 1]))
}

fn repetition_count(head: &str) -> Result<u32, ParseError> {
    let count: u64 = head
        .parse()
        .map_err(|_| ParseError::Range(format!("repetition count {head} is out of range")))?;
    if count == 0 {
        return Err(ParseError::Range("repetition count must be greater than zero".to_owned()));
    }
    Ok(count.min(REPETITION_CAP) as u32)
}
