//! Domain models.

pub mod password;
pub mod product;
pub mod token;
pub mod user;

pub use password::{HashedPassword, PasswordError};
pub use product::{NewProduct, Product, ProductChanges};
pub use token::{AccessToken, NewAccessToken, NewToken};
pub use user::{NewUser, User, UserFlags, UserSummary};
