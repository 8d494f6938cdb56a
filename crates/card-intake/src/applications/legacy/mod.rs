//! The primary table's composite text columns.
//!
//! Relatives, addresses, references, and bank lists are stored as single text columns. Decoding
//! never fails: malformed text yields empty fields. Encoding writes the same grammar back.

pub mod decode;
pub mod encode;

pub use decode::{
    parse_address, parse_bank_preferences, parse_business_address, parse_personal_reference,
    parse_relative_name,
};
pub use encode::{
    encode_address, encode_bank_preferences, encode_business_address, encode_personal_reference,
    encode_relative_name,
};
