pub mod error;
pub mod password;
pub mod response;
pub mod validation;

pub use error::{AppError, DbError, InternalError, SessionError};
pub use password::{PASSWORD_COST, PasswordError, hash_password, verify_password};
pub use response::ResponseBuilder;
pub use validation::Validator;
