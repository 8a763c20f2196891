pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod eutils;
pub mod output;
pub mod resolve;
pub mod search;
