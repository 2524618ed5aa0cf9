mod db;
pub mod employee;
pub mod notification;
pub mod request;
pub mod request_type;
pub mod testing;
pub mod user;

pub use db::*;
