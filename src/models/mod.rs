//! Data models for the Cheap Eats application.

mod restaurant;
mod review;
mod user;

pub use restaurant::*;
pub use review::*;
pub use user::*;
