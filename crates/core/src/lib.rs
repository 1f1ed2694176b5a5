pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod flows;
pub mod protocol;

pub use cache::{ActiveMessageCache, ChannelId, MessageId};
pub use engine::{
    evaluate, expand, fold_outcomes, make_bold, parse, validate, validate_list, DiceExpr,
    ParseError, RandomSource, RollAnswer, RollOutcome, SeededSource, SequenceSource,
    ThreadRngSource,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FlowEngine, FlowEvent, FlowState, FlowTransitionError, SetFlow};
pub use protocol::{ConfigFingerprint, CustomId, SetMessageState};
