//! State of an accumulating dice-set message. The message content itself is
//! the only store: it either shows a prompt (empty set), a bare expression
//! (open set) or `{user}∶ {expression}` (set locked to its first clicker).
//! The ratio character `\u{2236}` is reserved as the lock delimiter and is
//! stripped from user names before rendering.

/// Prompt shown while the set is empty.
pub const EMPTY_MESSAGE: &str = "Click the buttons to add dice to the set and then on Roll";
/// Prompt written by earlier releases, still accepted on decode.
pub const EMPTY_MESSAGE_LEGACY: &str = "Click on the buttons to add dice to the set";
/// Separates the locking user from the expression.
pub const USER_DELIMITER: &str = "\u{2236} ";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetMessageState {
    pub expression: String,
    pub locked_user: Option<String>,
}

impl SetMessageState {
    pub fn new(expression: impl Into<String>, locked_user: Option<String>) -> Self {
        Self { expression: expression.into(), locked_user }
    }

    /// Reconstructs the state from a previously rendered message content.
    pub fn parse(content: &str) -> Self {
        let (locked_user, body) = match content.split_once(USER_DELIMITER) {
            Some((user, rest)) => (Some(user.to_owned()), rest),
            None => (None, content),
        };
        let expression = if body == EMPTY_MESSAGE || body == EMPTY_MESSAGE_LEGACY {
            String::new()
        } else {
            body.to_owned()
        };
        Self { expression, locked_user }
    }

    pub fn render(&self) -> String {
        if self.expression.is_empty() {
            return EMPTY_MESSAGE.to_owned();
        }
        match &self.locked_user {
            Some(user) => {
                format!("{}{USER_DELIMITER}{}", user.replace(USER_DELIMITER, ""), self.expression)
            }
            None => self.expression.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }

    pub fn locked_by_other(&self, actor: &str) -> bool {
        self.locked_user.as_deref().map_or(false, |user| user != actor)
    }

    /// Appends one term. A leading `+` or `-` on the term selects the
    /// operator, everything else joins with `+`; the very first term keeps
    /// its sign without an operator.
    pub fn append(&mut self, term: &str) {
        let (operator, value) = match term.strip_prefix('-') {
            Some(value) => ("-", value),
            None => ("+", term.strip_prefix('+').unwrap_or(term)),
        };
        if self.expression.is_empty() {
            self.expression =
                if operator == "-" { format!("-{value}") } else { value.to_owned() };
        } else {
            self.expression = format!("{}{operator}{value}", self.expression);
        }
    }

    /// Removes the last appended term by cutting at the last operator. A
    /// lone leading sign counts as part of the first term, so undoing it
    /// empties the set.
    pub fn undo(&mut self) {
        let cut = match (self.expression.rfind('+'), self.expression.rfind('-')) {
            (Some(plus), Some(minus)) => Some(plus.max(minus)),
            (plus, minus) => plus.or(minus),
        };
        match cut {
            Some(index) if index > 0 => self.expression.truncate(index),
            _ => self.expression.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.expression.clear();
        self.locked_user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{SetMessageState, EMPTY_MESSAGE, EMPTY_MESSAGE_LEGACY};

    #[test]
    fn accumulates_terms_with_operators() {
        let mut state = SetMessageState::default();

        state.append("1d6");
        assert_eq!(state.expression, "1d6");

        state.append("1d6");
        assert_eq!(state.expression, "1d6+1d6");

        state.append("-1d4");
        assert_eq!(state.expression, "1d6+1d6-1d4");

        state.append("+2");
        assert_eq!(state.expression, "1d6+1d6-1d4+2");
    }

    #[test]
    fn first_term_keeps_its_sign() {
        let mut state = SetMessageState::default();
        state.append("-1d6");

        assert_eq!(state.expression, "-1d6");
    }

    #[test]
    fn undo_cuts_at_the_last_operator() {
        let mut state = SetMessageState::new("1d6+1d6-1d4", None);

        state.undo();
        assert_eq!(state.expression, "1d6+1d6");

        state.undo();
        assert_eq!(state.expression, "1d6");

        state.undo();
        assert_eq!(state.expression, "");
    }

    #[test]
    fn undo_on_a_single_negative_term_empties_the_set() {
        let mut state = SetMessageState::new("-1d6", None);

        state.undo();

        assert_eq!(state.expression, "");
    }

    #[test]
    fn renders_prompt_expression_or_locked_form() {
        assert_eq!(SetMessageState::default().render(), EMPTY_MESSAGE);
        assert_eq!(SetMessageState::new("1d6+2", None).render(), "1d6+2");
        assert_eq!(
            SetMessageState::new("1d6+2", Some("Alice".to_owned())).render(),
            "Alice\u{2236} 1d6+2"
        );
    }

    #[test]
    fn strips_the_lock_delimiter_from_user_names() {
        let state = SetMessageState::new("1d6", Some("Al\u{2236} ice".to_owned()));

        assert_eq!(state.render(), "Alice\u{2236} 1d6");
    }

    #[test]
    fn parse_reverses_render() {
        for state in [
            SetMessageState::default(),
            SetMessageState::new("1d6+1d20", None),
            SetMessageState::new("2d4-1", Some("Bob".to_owned())),
        ] {
            assert_eq!(SetMessageState::parse(&state.render()), state);
        }
    }

    #[test]
    fn parse_accepts_the_legacy_prompt() {
        let state = SetMessageState::parse(EMPTY_MESSAGE_LEGACY);

        assert!(state.is_empty());
        assert_eq!(state.locked_user, None);
    }

    #[test]
    fn lock_only_blocks_other_actors() {
        let state = SetMessageState::new("1d6", Some("Alice".to_owned()));

        assert!(state.locked_by_other("Bob"));
        assert!(!state.locked_by_other("Alice"));
        assert!(!SetMessageState::new("1d6", None).locked_by_other("Bob"));
    }
}
