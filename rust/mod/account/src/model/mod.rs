mod request;
mod token;
mod user;

pub use request::*;
pub use token::*;
pub use user::*;
