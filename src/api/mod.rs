pub mod demo;
pub mod error;
pub mod http;
pub mod provider;
