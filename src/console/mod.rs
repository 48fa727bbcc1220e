//! DrTransfer terminal console
//!
//! Registry pages for patients, doctors, regulatory doctors and specialties,
//! the hospital bed board, transfer requests and the transfer board.

pub mod app;
pub mod components;
pub mod events;
pub mod operations;
pub mod screens;
pub mod traits;
pub mod ui;

pub use app::{App, Screen};
pub use events::AppEvent;
