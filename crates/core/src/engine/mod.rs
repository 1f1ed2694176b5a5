pub mod answer;
pub mod ast;
pub mod evaluator;
pub mod expander;
pub mod parser;
pub mod random;

pub use answer::{fold_outcomes, RollAnswer, MULTIPLE_RESULTS_TITLE};
pub use ast::{BinOp, CompareOp, DiceExpr, DieSides};
pub use evaluator::{evaluate, make_bold, RollOutcome, EXPLOSION_CAP};
pub use expander::{expand, inner_expression, is_repeated, REPETITION_CAP};
pub use parser::{parse, validate, validate_list, ParseError};
pub use random::{RandomSource, SeededSource, SequenceSource, ThreadRngSource};
