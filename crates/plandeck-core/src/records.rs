//! # Stored Records
//!
//! The record families persisted by the workspace store: projects (with
//! their canvas documents), invoices, takeoffs, and calendar events.
//!
//! Records are plain data. Ids and timestamps are minted by the app layer;
//! the core stores them opaquely and never reads a clock.

use crate::canvas::CanvasDoc;
use crate::limits::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};
use crate::types::PlandeckError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

/// Validate a human-facing name/title field.
pub fn validate_name(field: &str, value: &str) -> Result<(), PlandeckError> {
    if value.is_empty() {
        return Err(PlandeckError::InvalidInput(format!(
            "{field} must be non-empty"
        )));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(PlandeckError::InvalidInput(format!(
            "{field} length {} exceeds maximum {} bytes",
            value.len(),
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Validate a client email field. Structural checks only; deliverability is
/// not this system's problem.
pub fn validate_email(value: &str) -> Result<(), PlandeckError> {
    if value.is_empty() || value.len() > MAX_EMAIL_LENGTH || !value.contains('@') {
        return Err(PlandeckError::InvalidInput(
            "client email must be a non-empty address".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// PROJECT
// =============================================================================

/// A canvas project: ownership metadata plus the page document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub canvas: CanvasDoc,
}

// =============================================================================
// INVOICES & TAKEOFFS
// =============================================================================

/// Status of an invoice or takeoff document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl DocumentStatus {
    /// Parse a wire name; unknown strings are rejected rather than
    /// defaulted so a typo never silently marks a document pending.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let status = match s {
            "Pending" => Self::Pending,
            "Approved" => Self::Approved,
            "Rejected" => Self::Rejected,
            "Paid" => Self::Paid,
            _ => return None,
        };
        Some(status)
    }
}

/// A client invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub owner: String,
    /// Generated number of the form `INV-YYMMDD-XXXX`.
    pub number: String,
    pub client_name: String,
    pub client_email: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A takeoff quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeoffRecord {
    pub id: String,
    pub owner: String,
    /// Generated number of the form `QTE-YYMMDD-XXXX`.
    pub number: String,
    pub client_name: String,
    pub client_email: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// CALENDAR
// =============================================================================

/// Default event color swatch.
pub const DEFAULT_EVENT_COLOR: &str = "#FF5F1F";

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRecord {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub location: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarEventRecord {
    /// Check the event's time window is well-formed.
    pub fn validate(&self) -> Result<(), PlandeckError> {
        validate_name("title", &self.title)?;
        if self.end_time < self.start_time {
            return Err(PlandeckError::InvalidInput(
                "event end time precedes start time".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation_bounds() {
        assert!(validate_name("name", "Site plan").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn email_needs_an_at_sign() {
        assert!(validate_email("client@example.com").is_ok());
        assert!(validate_email("client.example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(DocumentStatus::parse("Paid"), Some(DocumentStatus::Paid));
        assert_eq!(DocumentStatus::parse("paid"), None);
    }

    #[test]
    fn event_time_window_validated() {
        let start = DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .expect("parse")
            .with_timezone(&Utc);
        let event = CalendarEventRecord {
            id: "e1".to_string(),
            owner: "default".to_string(),
            title: "Site walk".to_string(),
            description: None,
            start_time: start,
            end_time: start - chrono::Duration::hours(1),
            all_day: false,
            location: None,
            color: DEFAULT_EVENT_COLOR.to_string(),
            created_at: start,
            updated_at: start,
        };
        assert!(event.validate().is_err());
    }
}
