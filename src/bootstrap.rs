//! # Connection Bootstrapper
//!
//! Establishes the two long-lived external connections once per process
//! and hands every consumer the same memoized future:
//!
//! - **Mail relay**: retried unconditionally with no backoff until it
//!   verifies. The process runs without mail until then; it never crashes
//!   over it. The loop logs every failed attempt, which is also the only
//!   signal of a permanently misconfigured host — an accepted
//!   operational risk (see DESIGN.md).
//! - **Spreadsheet document**: one attempt; a failure resolves the shared
//!   future to an error that every consumer observes when it awaits.

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::{error, info};

use crate::clients::{Mailer, SheetsClient, SmtpMailer, SpreadsheetService};
use crate::config::{MailSettings, SheetsSettings};
use crate::error::RegistrationError;

/// Resolves once the relay has been verified; infallible by construction.
pub type MailConnection = Shared<BoxFuture<'static, Arc<dyn Mailer>>>;

/// Resolves to the authenticated document handle, or the one error every
/// consumer will see.
pub type SpreadsheetConnection =
    Shared<BoxFuture<'static, Result<Arc<dyn SpreadsheetService>, Arc<RegistrationError>>>>;

/// The process-lifetime connection handles.
#[derive(Clone)]
pub struct Connections {
    pub mailer: MailConnection,
    pub spreadsheet: SpreadsheetConnection,
}

impl Connections {
    /// Create both shared futures and start driving them in the
    /// background, so connecting begins at process start rather than on
    /// the first request.
    pub fn establish() -> Self {
        let connections = Self {
            mailer: mail_connection(),
            spreadsheet: spreadsheet_connection(),
        };
        tokio::spawn(connections.mailer.clone().map(|_| ()));
        tokio::spawn(connections.spreadsheet.clone().map(|_| ()));
        connections
    }
}

/// Shared mail-relay connection with unbounded, immediate retry.
pub fn mail_connection() -> MailConnection {
    async {
        loop {
            match MailSettings::from_env() {
                Ok(settings) => {
                    let username = settings.smtp_username.clone();
                    match SmtpMailer::connect(settings).await {
                        Ok(mailer) => {
                            info!(account = %username, "connected to mail relay");
                            return Arc::new(mailer) as Arc<dyn Mailer>;
                        }
                        Err(err) => {
                            error!(error = %err, "unable to connect to mail relay, retrying");
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "mail relay is not configured, retrying");
                }
            }
            // Config failures never reach the network; yield so the retry
            // loop stays cooperative on the runtime.
            tokio::task::yield_now().await;
        }
    }
    .boxed()
    .shared()
}

/// Shared spreadsheet connection; a single attempt whose outcome is
/// memoized for every consumer.
pub fn spreadsheet_connection() -> SpreadsheetConnection {
    async {
        let settings = SheetsSettings::from_env().map_err(Arc::new)?;
        let document = SheetsClient::connect(settings).await.map_err(Arc::new)?;
        info!(title = %document.title(), "connected to spreadsheet document");
        Ok(Arc::new(document) as Arc<dyn SpreadsheetService>)
    }
    .boxed()
    .shared()
}
