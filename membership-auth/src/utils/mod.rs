pub mod clock;
pub mod password;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    HashingFailure, Password, PasswordHashString,
};
pub use validation::ValidatedJson;
