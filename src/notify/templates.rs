use serde_json::{json, Value};

use crate::types::{row_id, Row};

/// Notification kinds and the facts each one renders
#[derive(Debug, Clone)]
pub enum Template {
    Request {
        request_id: i64,
        subject: String,
        status: String,
    },
    Permit {
        permit_id: i64,
        permit_number: Option<String>,
        permit_type: String,
        status: String,
    },
    Payment {
        payment_id: i64,
        reference_number: Option<String>,
        amount: Value,
        status: String,
        receipt_number: Option<String>,
    },
    /// Sent to admins when a citizen pays
    AdminPayment {
        payment_id: i64,
        reference_number: Option<String>,
        amount: Value,
        citizen_name: String,
    },
    Welcome {
        name: String,
    },
    PasswordReset {
        email: String,
        token: String,
    },
}

/// A template rendered for delivery: stored row fields plus mail body
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub data: Value,
}

fn humanize(status: &str) -> String {
    status.replace('_', " ")
}

impl Template {
    pub fn kind(&self) -> &'static str {
        match self {
            Template::Request { .. } => "request",
            Template::Permit { .. } => "permit",
            Template::Payment { .. } => "payment",
            Template::AdminPayment { .. } => "admin_payment",
            Template::Welcome { .. } => "welcome",
            Template::PasswordReset { .. } => "password_reset",
        }
    }

    /// Status template for a stored request, permit or payment row
    pub fn for_row(table: &str, row: &Row) -> Option<Template> {
        let id = row_id(row)?;
        let text = |key: &str| row.get(key).and_then(Value::as_str).map(str::to_string);
        let status = text("status").unwrap_or_default();
        match table {
            "requests" => Some(Template::Request { request_id: id, subject: text("subject")?, status }),
            "permits" => Some(Template::Permit {
                permit_id: id,
                permit_number: text("permit_number"),
                permit_type: text("type")?,
                status,
            }),
            "payments" => Some(Template::Payment {
                payment_id: id,
                reference_number: text("reference_number"),
                amount: row.get("amount").cloned().unwrap_or(Value::Null),
                status,
                receipt_number: text("receipt_number"),
            }),
            _ => None,
        }
    }

    pub fn render(&self, portal_url: &str) -> Rendered {
        let portal_url = portal_url.trim_end_matches('/');
        let (title, message, data) = match self {
            Template::Request { request_id, subject, status } => {
                let message = if status == "pending" {
                    format!("Request \"{}\" has been submitted and is awaiting review.", subject)
                } else {
                    format!("Request \"{}\" is now {}.", subject, humanize(status))
                };
                (
                    format!("Request #{} {}", request_id, humanize(status)),
                    message,
                    json!({
                        "request_id": request_id,
                        "subject": subject,
                        "status": status,
                        "url": format!("{}/requests/{}", portal_url, request_id),
                    }),
                )
            }
            Template::Permit { permit_id, permit_number, permit_type, status } => {
                let label = permit_number.clone().unwrap_or_else(|| format!("#{}", permit_id));
                let message = if status == "pending" {
                    format!("Permit application {} ({}) has been received.", label, permit_type)
                } else {
                    format!("Permit {} ({}) is now {}.", label, permit_type, humanize(status))
                };
                (
                    format!("Permit {} {}", label, humanize(status)),
                    message,
                    json!({
                        "permit_id": permit_id,
                        "permit_number": permit_number,
                        "type": permit_type,
                        "status": status,
                        "url": format!("{}/permits/{}", portal_url, permit_id),
                    }),
                )
            }
            Template::Payment { payment_id, reference_number, amount, status, receipt_number } => {
                let label = reference_number.clone().unwrap_or_else(|| format!("#{}", payment_id));
                let message = match (status.as_str(), receipt_number) {
                    ("completed", Some(receipt)) => {
                        format!("Payment {} of {} was received. Receipt: {}.", label, amount, receipt)
                    }
                    _ => format!("Payment {} of {} is now {}.", label, amount, humanize(status)),
                };
                (
                    format!("Payment {} {}", label, humanize(status)),
                    message,
                    json!({
                        "payment_id": payment_id,
                        "reference_number": reference_number,
                        "amount": amount,
                        "status": status,
                        "receipt_number": receipt_number,
                        "url": format!("{}/payments/{}", portal_url, payment_id),
                    }),
                )
            }
            Template::AdminPayment { payment_id, reference_number, amount, citizen_name } => {
                let label = reference_number.clone().unwrap_or_else(|| format!("#{}", payment_id));
                (
                    format!("Payment {} received", label),
                    format!("{} paid {} for payment {}.", citizen_name, amount, label),
                    json!({
                        "payment_id": payment_id,
                        "reference_number": reference_number,
                        "amount": amount,
                        "citizen": citizen_name,
                    }),
                )
            }
            Template::Welcome { name } => (
                "Welcome to the citizen portal".to_string(),
                format!("Hello {}, your citizen profile is ready. Sign in at {}.", name, portal_url),
                json!({ "name": name, "url": portal_url }),
            ),
            Template::PasswordReset { email, token } => {
                let url = format!("{}/reset-password?token={}&email={}", portal_url, token, email);
                (
                    "Reset your password".to_string(),
                    format!("A password reset was requested for {}. Continue at {}", email, url),
                    json!({ "email": email, "url": url }),
                )
            }
        };

        Rendered { kind: self.kind(), title, message, data }
    }
}
