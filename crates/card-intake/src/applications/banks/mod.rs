//! Per-bank record shapes and the status rules each bank's columns imply.

pub mod records;
pub mod rules;

pub use records::{
    AubRecord, BankAccount, BankRecord, BpiRecord, EastwestRecord, Flag, MaybankRecord,
    MetrobankRecord, PnbRecord, RcbcRecord,
};
pub use rules::{derive_bank_status, derive_status_for, is_true};
