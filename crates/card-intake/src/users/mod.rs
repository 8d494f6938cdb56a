//! Account administration for admins and moderators.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{BankCodeAssignment, Role, User};
pub use router::admin_router;
pub use service::{ManagedUser, NewUser, UserAdminError, UserAdminService, UserUpdate};
