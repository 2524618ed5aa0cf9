pub mod alert;
pub mod auth;
pub mod employee;
pub mod notification;
pub mod request;
pub mod status;
