use dicey_core::engine::{
    expand, fold_outcomes, validate_list, RandomSource, SeededSource, ThreadRngSource,
};

use crate::commands::CommandResult;

/// Rolls one expression locally. A seed makes the roll reproducible, a
/// trailing `@Label` names the result.
pub fn run(raw: &str, seed: Option<u64>) -> CommandResult {
    let raw = raw.trim();
    if let Some(message) = validate_list(&[raw.to_owned()], '@', ',', "'dicey validate'") {
        return CommandResult { exit_code: 2, output: message };
    }

    let (expression, label) = match raw.split_once('@') {
        Some((expression, label)) => (expression, Some(label.trim())),
        None => (raw, None),
    };

    let mut seeded;
    let mut thread_rng;
    let random: &mut dyn RandomSource = match seed {
        Some(seed) => {
            seeded = SeededSource::new(seed);
            &mut seeded
        }
        None => {
            thread_rng = ThreadRngSource;
            &mut thread_rng
        }
    };

    let answer = match expand(expression, random) {
        Ok(outcomes) => fold_outcomes(outcomes, label),
        Err(error) => return CommandResult { exit_code: 2, output: error.to_string() },
    };

    let mut lines = vec![answer.title];
    if !answer.detail.is_empty() {
        lines.push(answer.detail);
    }
    for (title, detail) in answer.fields {
        lines.push(format!("{title}  {detail}"));
    }
    CommandResult { exit_code: 0, output: lines.join("\n") }
}
