pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod filter;
pub mod highlight;
pub mod logging;
pub mod output;
pub mod render;
pub mod session;
pub mod sync;

#[cfg(test)]
mod tests;
