//! Mailbox management.
//!
//! Provides the stored mailbox list, credential validation and the
//! create/login/delete flows.

mod model;
mod repository;
pub mod service;
mod validation;

pub use model::GeneratedAccount;
pub use repository::{ACCOUNTS_FILE, AccountStore};
pub use service::{
    CreatedAccount, create_account, create_random_account, current_account,
    delete_current_account, login, login_stored,
};
pub use validation::{
    MIN_PASSWORD_LEN, ValidationError, ValidationResult, validate_login, validate_new_account,
};
