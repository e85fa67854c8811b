//! # Confirmation Notifier
//!
//! Emails the registrant an HTML confirmation with a calendar invite
//! attached. Like the recorder, this is fire-and-forget: every failure is
//! logged and absorbed here. The invite itself is best-effort — if it
//! cannot be built, the confirmation still goes out without it.

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use crate::bootstrap::MailConnection;
use crate::clients::{EmailAttachment, OutgoingEmail};
use crate::error::{RegistrationError, Result};
use crate::models::RegistrationContext;

const CONFIRMATION_SUBJECT: &str = "We'll see you for dinner!";
const CALENDAR_PRODID: &str = "-//dinner-registration/cal//1.0//EN";

/// Event length used for the invite window.
const EVENT_DURATION_MINUTES: i64 = 150;

pub struct ConfirmationNotifier {
    mailer: MailConnection,
}

impl ConfirmationNotifier {
    pub fn new(mailer: MailConnection) -> Self {
        Self { mailer }
    }

    /// Send the confirmation for a completed registration. Returns the
    /// relay acknowledgement, or `None` after logging if sending failed.
    pub async fn confirm(&self, context: &RegistrationContext) -> Option<String> {
        match self.send_confirmation(context).await {
            Ok(receipt) => {
                info!(receipt = %receipt, "confirmation email sent");
                Some(receipt)
            }
            Err(err) => {
                error!(error = %err, "failed to send confirmation email");
                None
            }
        }
    }

    async fn send_confirmation(&self, context: &RegistrationContext) -> Result<String> {
        let mailer = self.mailer.clone().await;

        let mut attachments = Vec::new();
        match calendar_invite(context, mailer.bcc_address()) {
            Ok(invite) => attachments.push(invite),
            Err(err) => {
                warn!(error = %err, "calendar invite could not be built, sending without it");
            }
        }

        info!(
            email = %context.customer.email,
            sku = %context.product.id,
            "sending confirmation"
        );
        mailer
            .send(OutgoingEmail {
                to: context.customer.email.clone(),
                subject: CONFIRMATION_SUBJECT.to_string(),
                html_body: confirmation_html(context),
                attachments,
            })
            .await
    }
}

/// Order reference for display: last eight characters, upper-cased.
pub fn display_order_ref(order_id: &str) -> String {
    let chars: Vec<char> = order_id.chars().collect();
    let tail = chars.len().saturating_sub(8);
    chars[tail..].iter().collect::<String>().to_uppercase()
}

/// The HTML confirmation body.
pub fn confirmation_html(context: &RegistrationContext) -> String {
    let attributes = &context.product.attributes;
    let date_display = match parse_event_start(&attributes.datetime) {
        Ok(start) => start.format("%B %-d, %Y %-I:%M %p UTC").to_string(),
        Err(_) => attributes.datetime.clone(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
	<title>Alumni Dinner Confirmation</title>
</head>
<body style="background-color:#b89e8b;color:#333;font:16px/1.5 sans-serif;padding:1rem">
	<header style="margin-bottom:1rem">
		<h1 style="margin:0;padding:0;color:#754c29;line-height:1">ALUMNI DINNER</h1>
	</header>
	<main style="background-color:#fff;border-radius:3px;padding:1rem 2rem">
		<p>Hey {first_name},</p>
		<p>
		Thanks for registering for Dinner {event_number}.<br/>
		Your registration details are below, for your records:
		</p>
		<table border="1" cellpadding="8" style="width:100%;border-color:#DDD;border-collapse:collapse">
			<tbody>
				<tr><td align="right">Date</td> <td>{date}</td></tr>
				<tr><td align="right">Theme</td> <td>{theme}</td></tr>
				<tr><td align="right">Venue</td> <td>{venue}</td></tr>
				<tr><td align="right">Chef</td> <td>{chef}</td></tr>
				<tr><td align="right">Menu</td> <td>{menu}</td></tr>
			</tbody>
			<tfoot style="background-color:#EEE">
				<tr><td align="right">Order #</td><td>{order_ref}</td></tr>
				<tr><td align="right">Paid</td><td>${amount}</td></tr>
			</tfoot>
		</table>
		<p>We'll see you soon!</p>
		<p>- Jon</p>
	</main>
</body>
</html>
"#,
        first_name = context.customer.first_name(),
        event_number = context.product.event_number(),
        date = date_display,
        theme = attributes.theme,
        venue = attributes.venue,
        chef = attributes.chef,
        menu = attributes.menu,
        order_ref = display_order_ref(&context.order.id),
        amount = context.order.amount_decimal(),
    )
}

/// Build the `invite.ics` attachment: a single event starting at the
/// product's scheduled datetime, 2.5 hours long, with the order id as the
/// globally unique event identifier.
pub fn calendar_invite(context: &RegistrationContext, organizer: &str) -> Result<EmailAttachment> {
    let start = parse_event_start(&context.product.attributes.datetime)?;
    let end = start + Duration::minutes(EVENT_DURATION_MINUTES);

    let content = format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:{prodid}\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{stamp}\r\n\
         ORGANIZER:MAILTO:{organizer}\r\n\
         DTSTART:{start}\r\n\
         DTEND:{end}\r\n\
         SUMMARY:Dinner {number} - {theme}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        prodid = CALENDAR_PRODID,
        uid = context.order.id,
        stamp = ical_datetime(Utc::now()),
        organizer = organizer,
        start = ical_datetime(start),
        end = ical_datetime(end),
        number = context.product.event_number(),
        theme = context.product.attributes.theme,
    );

    Ok(EmailAttachment {
        filename: "invite.ics".to_string(),
        content_type: "text/calendar".to_string(),
        content,
    })
}

/// Parse the product's scheduled start as RFC 3339.
fn parse_event_start(datetime: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(datetime)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            RegistrationError::template(format!("unparseable event datetime {datetime:?}: {e}"))
        })
}

/// UTC basic format required inside calendar bodies: `20190214T183000Z`.
fn ical_datetime(datetime: DateTime<Utc>) -> String {
    datetime.format("%Y%m%dT%H%M%SZ").to_string()
}
