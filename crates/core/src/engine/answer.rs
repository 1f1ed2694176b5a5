use super::evaluator::RollOutcome;

pub const MULTIPLE_RESULTS_TITLE: &str = "Multiple Results";

/// Rendering contract consumed by the interaction layer: an embed title,
/// a detail body and optional named fields for multi-roll results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollAnswer {
    pub title: String,
    pub detail: String,
    pub fields: Vec<(String, String)>,
}

impl RollAnswer {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { title: title.into(), detail: detail.into(), fields: Vec::new() }
    }
}

/// Folds expander output into one answer. A label that differs from the
/// rolled expression prefixes the title of a single result.
pub fn fold_outcomes(mut outcomes: Vec<RollOutcome>, label: Option<&str>) -> RollAnswer {
    if outcomes.len() == 1 {
        let outcome = outcomes.remove(0);
        let title = match label {
            Some(label) => format!("{label}: {}", outcome.title),
            None => outcome.title,
        };
        return RollAnswer { title, detail: outcome.detail, fields: Vec::new() };
    }

    RollAnswer {
        title: MULTIPLE_RESULTS_TITLE.to_owned(),
        detail: String::new(),
        fields: outcomes.into_iter().map(|outcome| (outcome.title, outcome.detail)).collect(),
    }
}
