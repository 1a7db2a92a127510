pub mod chain;
pub mod config;
pub mod error;
pub mod execution;
pub mod prices;
pub mod quote;
pub mod swappers;
#[cfg(test)]
pub mod tests;
pub mod utils;
