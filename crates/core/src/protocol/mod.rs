pub mod custom_id;
pub mod fingerprint;
pub mod message_state;

pub use custom_id::{
    decode, decode_list, encode, encode_list, field_or, matches_command, CustomId, EncodeError,
    CONFIG_DELIMITER, CUSTOM_ID_CEILING, EMPTY_FIELD, LIST_DELIMITER,
};
pub use fingerprint::ConfigFingerprint;
pub use message_state::{SetMessageState, EMPTY_MESSAGE, EMPTY_MESSAGE_LEGACY, USER_DELIMITER};
