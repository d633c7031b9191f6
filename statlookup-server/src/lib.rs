pub mod error;
pub mod http;
pub mod proxy;
pub mod ui;
