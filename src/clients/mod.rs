//! # Outbound Service Clients
//!
//! One client per external collaborator, each behind a trait seam so the
//! workflow components can be exercised against in-process fakes.

pub mod mail;
pub mod payment;
pub mod sheets;

pub use mail::{EmailAttachment, Mailer, OutgoingEmail, SmtpMailer};
pub use payment::{PaymentGateway, StripeGateway};
pub use sheets::{SheetsClient, SpreadsheetService, Worksheet};
