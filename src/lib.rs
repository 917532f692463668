pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod normalizer;
pub mod processor;
pub mod resolver;
pub mod scanner;
pub mod strategy;
pub mod sync;
