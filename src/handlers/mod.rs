pub mod critique;
pub mod http;
