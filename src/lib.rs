//! Data-acquisition and state layer for browsing the Punk API beer catalog.

pub mod app;
pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod favorites;
pub mod logging;
pub mod net;
pub mod report;
pub mod session;
pub mod task;
