//! # Spreadsheet Client
//!
//! REST client for the spreadsheet service, authenticated as a service
//! account: an RS256-signed assertion is exchanged for a bearer token,
//! which is cached and refreshed transparently when it nears expiry. The
//! client binds to one fixed spreadsheet document for its whole lifetime.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::config::SheetsSettings;
use crate::error::{RegistrationError, Result};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Operations the recorder needs from the spreadsheet document.
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Current worksheets of the document, in service order.
    async fn list_worksheets(&self) -> Result<Vec<Worksheet>>;

    /// Create a worksheet with the given title.
    async fn add_worksheet(&self, title: &str) -> Result<Worksheet>;

    /// Write the header row of a worksheet.
    async fn set_header_row(&self, worksheet: &Worksheet, fields: &[&str]) -> Result<()>;

    /// Append one row; returns the created row's range identifier.
    async fn append_row(&self, worksheet: &Worksheet, values: &[String]) -> Result<String>;
}

/// One tab of the spreadsheet document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: i64,
}

fn default_token_lifetime() -> i64 {
    3600
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    properties: DocumentProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Default, Deserialize)]
struct SheetProperties {
    #[serde(default, rename = "sheetId")]
    sheet_id: i64,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchUpdateReply>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchUpdateReply {
    #[serde(rename = "addSheet")]
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    updates: AppendUpdates,
}

#[derive(Debug, Deserialize)]
struct AppendUpdates {
    #[serde(rename = "updatedRange")]
    updated_range: String,
}

/// Error envelope the service returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// A1 range addressing the first row of a worksheet.
fn header_range(title: &str) -> String {
    format!("'{title}'!A1")
}

/// Service-account REST implementation of [`SpreadsheetService`].
pub struct SheetsClient {
    client: Client,
    settings: SheetsSettings,
    signing_key: EncodingKey,
    title: String,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsClient {
    /// Authenticate the service account and fetch document metadata.
    /// Called once per process by the bootstrapper; there is no retry.
    pub async fn connect(settings: SheetsSettings) -> Result<Self> {
        let pem = settings.private_key_pem()?;
        let signing_key = EncodingKey::from_rsa_pem(&pem).map_err(|e| {
            RegistrationError::config(format!("service-account key is not a valid RSA PEM: {e}"))
        })?;
        let client = Client::builder().build().map_err(|e| {
            RegistrationError::spreadsheet(format!("failed to build HTTP client: {e}"))
        })?;

        let mut this = Self {
            client,
            settings,
            signing_key,
            title: String::new(),
            token: Mutex::new(None),
        };
        let metadata = this.fetch_metadata().await?;
        this.title = metadata.properties.title;
        Ok(this)
    }

    /// Title of the bound spreadsheet document.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Bearer token for the spreadsheet scope, refreshed when within a
    /// minute of expiry. Refreshes are serialized behind the mutex so
    /// concurrent callers share one exchange.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at - Utc::now() > Duration::seconds(60) {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.exchange_token().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    async fn exchange_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.settings.google_client_email,
            scope: SHEETS_SCOPE,
            aud: &self.settings.google_token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| RegistrationError::spreadsheet(format!("failed to sign assertion: {e}")))?;

        debug!(client_email = %self.settings.google_client_email, "exchanging service-account assertion");
        let response = self
            .client
            .post(&self.settings.google_token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RegistrationError::spreadsheet(e.to_string()))?;
        let token: TokenResponse = Self::decode("token", response).await?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }

    fn document_url(&self, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}{}",
            self.settings.sheets_api_base, self.settings.google_sheet_id, suffix
        )
    }

    async fn fetch_metadata(&self) -> Result<SpreadsheetMetadata> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.document_url("?fields=properties.title,sheets.properties"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RegistrationError::spreadsheet(e.to_string()))?;
        Self::decode("metadata", response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                RegistrationError::spreadsheet(format!("malformed {operation} response: {e}"))
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(operation, status = %status, body = %body, "spreadsheet API call failed");
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error.message,
                Err(_) => format!("spreadsheet API returned {status}"),
            };
            Err(RegistrationError::spreadsheet(message))
        }
    }
}

#[async_trait]
impl SpreadsheetService for SheetsClient {
    async fn list_worksheets(&self) -> Result<Vec<Worksheet>> {
        let metadata = self.fetch_metadata().await?;
        Ok(metadata
            .sheets
            .into_iter()
            .map(|entry| Worksheet {
                id: entry.properties.sheet_id,
                title: entry.properties.title,
            })
            .collect())
    }

    async fn add_worksheet(&self, title: &str) -> Result<Worksheet> {
        let token = self.access_token().await?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self
            .client
            .post(self.document_url(":batchUpdate"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistrationError::spreadsheet(e.to_string()))?;
        let reply: BatchUpdateResponse = Self::decode("addSheet", response).await?;

        reply
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|entry| Worksheet {
                id: entry.properties.sheet_id,
                title: entry.properties.title,
            })
            .ok_or_else(|| {
                RegistrationError::spreadsheet("addSheet reply missing sheet properties")
            })
    }

    async fn set_header_row(&self, worksheet: &Worksheet, fields: &[&str]) -> Result<()> {
        let token = self.access_token().await?;
        let range = header_range(&worksheet.title);
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [fields],
        });
        let response = self
            .client
            .put(self.document_url(&format!("/values/{range}?valueInputOption=RAW")))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistrationError::spreadsheet(e.to_string()))?;
        Self::decode::<serde_json::Value>("setHeaderRow", response).await?;
        Ok(())
    }

    async fn append_row(&self, worksheet: &Worksheet, values: &[String]) -> Result<String> {
        let token = self.access_token().await?;
        let range = header_range(&worksheet.title);
        let body = json!({ "values": [values] });
        let response = self
            .client
            .post(self.document_url(&format!(
                "/values/{range}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
            )))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistrationError::spreadsheet(e.to_string()))?;
        let reply: AppendResponse = Self::decode("appendRow", response).await?;
        Ok(reply.updates.updated_range)
    }
}
