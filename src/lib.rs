//! Student Gate Bot Library
//!
//! A Telegram bot that answers students' questions behind a login gate.
//!
//! This crate provides the core functionality for:
//! - Authenticating students by ID or shared passcode, with per-user rate limiting
//! - Routing questions to certificate links, resources and calendar dates
//! - Forwarding everything else to a hosted assistant
//! - Recording emails and interactions in spreadsheet webhooks

pub mod commands;
pub mod config;
pub mod gate;
pub mod integrations;
pub mod routing;
pub mod telegram;
