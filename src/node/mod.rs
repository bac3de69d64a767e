//! Node-backed services

pub mod client;

pub use client::NodeTransactionBuilder;
