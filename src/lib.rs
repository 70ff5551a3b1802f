//! Notch Tasks - a notch-anchored task panel for macOS
//!
//! This library provides the panel lifecycle state machine, the session
//! orchestrator that opens and closes it from pointer activity, and the
//! Cocoa plumbing that backs them. The core is platform-free and driven by
//! explicit timestamps, so the whole timing surface is testable off-device.

pub mod config;
pub mod content;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod host;
pub mod hotkeys;
pub mod logging;
pub mod panel;
pub mod platform;
pub mod screen;
pub mod tasks;
#[cfg(not(test))]
pub mod tray;
