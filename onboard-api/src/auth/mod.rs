pub mod guards;
pub mod token;

pub use guards::*;
pub use token::*;
