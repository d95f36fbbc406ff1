//! mayhost: Interactive terminal client for MayHost servers
//!
//! Connects to a MayHost server, relays typed commands to it and prints the
//! output it streams back.

pub mod app;
pub mod console;
pub mod editor;
pub mod input;
pub mod output;
pub mod router;
