//! Service entry point: logging, settings, connection bootstrap, listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use dinner_registration::bootstrap::Connections;
use dinner_registration::clients::StripeGateway;
use dinner_registration::config::ServerSettings;
use dinner_registration::logging;
use dinner_registration::notifier::ConfirmationNotifier;
use dinner_registration::recorder::RegistrationRecorder;
use dinner_registration::web::{self, AppState, PaymentState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let connections = Connections::establish();

    // A missing payment configuration disables checkout and catalog
    // requests but must not take the process down; the other
    // connections keep operating.
    let payment = match StripeGateway::from_env() {
        Ok(gateway) => {
            let settings = gateway.settings().clone();
            Some(PaymentState {
                gateway: Arc::new(gateway),
                publishable_key: settings.stripe_publishable_key,
                default_product_id: settings.stripe_product_id,
                currency: settings.currency,
            })
        }
        Err(err) => {
            error!(error = %err, "payment processor is not configured; checkout disabled");
            None
        }
    };

    let state = AppState {
        payment,
        recorder: Arc::new(RegistrationRecorder::new(connections.spreadsheet.clone())),
        notifier: Arc::new(ConfirmationNotifier::new(connections.mailer.clone())),
    };

    let server = ServerSettings::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "invalid server settings, using defaults");
        ServerSettings::default()
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "listening");
    axum::serve(listener, web::router(state)).await?;

    Ok(())
}
