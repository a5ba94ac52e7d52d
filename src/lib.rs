//! Dispatch: shipping-notification scanner for Gmail.

pub mod config;
pub mod error;
pub mod mail;
pub mod routes;
pub mod scan;
pub mod ui;
