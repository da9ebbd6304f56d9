pub mod call;
pub mod config;
pub mod endpoints;
pub mod schemas;
pub mod spec;
pub mod tools;
