use dicey_core::engine::validate_list;

use crate::commands::CommandResult;

pub fn run(expression: &str) -> CommandResult {
    let expression = expression.trim();
    match validate_list(&[expression.to_owned()], '@', ',', "'dicey roll --help'") {
        None => CommandResult::success(
            "validate",
            format!("'{expression}' is a valid dice expression"),
        ),
        Some(message) => CommandResult::failure("validate", "invalid_expression", message, 2),
    }
}
