pub mod employee;
pub mod notification;
pub mod request;
pub mod request_history;
pub mod request_type;
pub mod user;

// Re-export models for easier access
pub use employee::*;
pub use notification::*;
pub use request::*;
pub use request_history::*;
pub use request_type::*;
pub use user::*;
