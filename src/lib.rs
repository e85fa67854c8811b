//! # Dinner Registration
//!
//! Event-registration backend for a recurring dinner series. One checkout
//! request charges the guest through the payment processor, records the
//! registration in a shared spreadsheet, and emails a confirmation with a
//! calendar invite.
//!
//! ## Architecture
//!
//! The interesting part is the **checkout orchestration**: four strictly
//! sequential payment-processor calls (find-or-create customer → create
//! order → pay order → fetch product), then two concurrent
//! fire-and-forget side effects (spreadsheet row, confirmation email)
//! whose failures never reach the caller.
//!
//! Both side-effect components consume **memoized shared connection
//! futures** created once at process start: the mail relay retries
//! forever until it verifies, the spreadsheet document connects exactly
//! once and memoizes its failure.
//!
//! ## Module Organization
//!
//! - [`web`] - HTTP surface: router, handlers, API error mapping
//! - [`clients`] - outbound service clients behind trait seams
//! - [`bootstrap`] - process-lifetime connection futures
//! - [`recorder`] - worksheet-backed registration recording
//! - [`notifier`] - confirmation email and calendar invite
//! - [`models`] - transient domain records
//! - [`config`] - environment-backed settings groups
//! - [`error`] - structured error handling
//! - [`logging`] - tracing initialization

pub mod bootstrap;
pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod recorder;
pub mod web;

pub use error::{RegistrationError, Result};
