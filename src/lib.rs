//! DrTransfer administration console
//!
//! A terminal client for the DrTransfer REST backend: registries of people
//! and specialties, hospital beds, transfer requests and transfers.

pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod models;
