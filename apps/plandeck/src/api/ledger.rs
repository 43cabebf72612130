//! # Invoice & Takeoff Handlers
//!
//! Plain form-backed CRUD for the two client-document families, plus a
//! duplicate operation for each. Document numbers are generated
//! server-side as `<prefix>-YYMMDD-XXXX`.

use super::AppState;
use super::types::{
    ApiMessage, CreateDocumentRequest, DuplicateRequest, UpdateDocumentRequest, bad_request,
    store_error,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use plandeck_core::records::{validate_email, validate_name};
use plandeck_core::{DocumentStatus, InvoiceRecord, PlandeckError, TakeoffRecord};
use uuid::Uuid;

// =============================================================================
// HELPERS
// =============================================================================

/// Generate a document number of the form `<prefix>-YYMMDD-XXXX`.
///
/// The serial is derived from the record's UUID instead of a separate
/// random source; it is a display discriminator, not an identifier.
fn document_number(prefix: &str, now: DateTime<Utc>, id: &Uuid) -> String {
    let serial = 1000 + (id.as_u128() % 9000) as u16;
    format!("{prefix}-{}-{serial:04}", now.format("%y%m%d"))
}

/// Parse an optional status string, defaulting to `Pending`.
fn parse_status(status: Option<&str>) -> Result<DocumentStatus, (StatusCode, Json<ApiMessage>)> {
    match status {
        None => Ok(DocumentStatus::Pending),
        Some(s) => DocumentStatus::parse(s)
            .ok_or_else(|| bad_request(format!("unknown document status: {s}"))),
    }
}

fn validate_client_fields(
    name: &str,
    email: &str,
) -> Result<(), (StatusCode, Json<ApiMessage>)> {
    validate_name("client name", name).map_err(|e| store_error(&e))?;
    validate_email(email).map_err(|e| store_error(&e))?;
    Ok(())
}

// =============================================================================
// INVOICES
// =============================================================================

/// Create an invoice.
pub async fn create_invoice_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<InvoiceRecord>, (StatusCode, Json<ApiMessage>)> {
    validate_client_fields(&request.client_name, &request.client_email)?;
    let status = parse_status(request.status.as_deref())?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let record = InvoiceRecord {
        id: id.to_string(),
        owner: request.owner.unwrap_or_else(|| "default".to_string()),
        number: document_number("INV", now, &id),
        client_name: request.client_name,
        client_email: request.client_email,
        status,
        created_at: now,
        updated_at: now,
    };

    let mut workspace = state.workspace.write().await;
    workspace
        .upsert_invoice(&record)
        .map_err(|e| store_error(&e))?;
    tracing::info!(invoice = %record.number, "created invoice");
    Ok(Json(record))
}

/// List all invoices, oldest first.
pub async fn list_invoices_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceRecord>>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    let mut invoices = workspace.invoices().map_err(|e| store_error(&e))?;
    invoices.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(invoices))
}

/// Fetch one invoice.
pub async fn get_invoice_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceRecord>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    workspace
        .invoice(&id)
        .map_err(|e| store_error(&e))?
        .map(Json)
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("invoice {id}"))))
}

/// Partially update an invoice.
pub async fn update_invoice_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<Json<InvoiceRecord>, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    let mut record = workspace
        .invoice(&id)
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("invoice {id}"))))?;

    if let Some(name) = request.client_name {
        validate_name("client name", &name).map_err(|e| store_error(&e))?;
        record.client_name = name;
    }
    if let Some(email) = request.client_email {
        validate_email(&email).map_err(|e| store_error(&e))?;
        record.client_email = email;
    }
    if let Some(status) = request.status.as_deref() {
        record.status = DocumentStatus::parse(status)
            .ok_or_else(|| bad_request(format!("unknown document status: {status}")))?;
    }
    record.updated_at = Utc::now();

    workspace
        .upsert_invoice(&record)
        .map_err(|e| store_error(&e))?;
    Ok(Json(record))
}

/// Delete an invoice.
pub async fn delete_invoice_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    if workspace.remove_invoice(&id).map_err(|e| store_error(&e))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(store_error(&PlandeckError::NotFound(format!(
            "invoice {id}"
        ))))
    }
}

/// Duplicate an invoice: fresh id, fresh number, status back to pending.
pub async fn duplicate_invoice_handler(
    State(state): State<AppState>,
    Json(request): Json<DuplicateRequest>,
) -> Result<Json<InvoiceRecord>, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    let source = workspace
        .invoice(&request.id)
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("invoice {}", request.id))))?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let copy = InvoiceRecord {
        id: id.to_string(),
        number: document_number("INV", now, &id),
        status: DocumentStatus::Pending,
        created_at: now,
        updated_at: now,
        ..source
    };
    workspace
        .upsert_invoice(&copy)
        .map_err(|e| store_error(&e))?;
    Ok(Json(copy))
}

// =============================================================================
// TAKEOFFS
// =============================================================================

/// Create a takeoff quote.
pub async fn create_takeoff_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<TakeoffRecord>, (StatusCode, Json<ApiMessage>)> {
    validate_client_fields(&request.client_name, &request.client_email)?;
    let status = parse_status(request.status.as_deref())?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let record = TakeoffRecord {
        id: id.to_string(),
        owner: request.owner.unwrap_or_else(|| "default".to_string()),
        number: document_number("QTE", now, &id),
        client_name: request.client_name,
        client_email: request.client_email,
        status,
        created_at: now,
        updated_at: now,
    };

    let mut workspace = state.workspace.write().await;
    workspace
        .upsert_takeoff(&record)
        .map_err(|e| store_error(&e))?;
    tracing::info!(takeoff = %record.number, "created takeoff");
    Ok(Json(record))
}

/// List all takeoffs, oldest first.
pub async fn list_takeoffs_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<TakeoffRecord>>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    let mut takeoffs = workspace.takeoffs().map_err(|e| store_error(&e))?;
    takeoffs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(takeoffs))
}

/// Fetch one takeoff.
pub async fn get_takeoff_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TakeoffRecord>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    workspace
        .takeoff(&id)
        .map_err(|e| store_error(&e))?
        .map(Json)
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("takeoff {id}"))))
}

/// Partially update a takeoff.
pub async fn update_takeoff_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<Json<TakeoffRecord>, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    let mut record = workspace
        .takeoff(&id)
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("takeoff {id}"))))?;

    if let Some(name) = request.client_name {
        validate_name("client name", &name).map_err(|e| store_error(&e))?;
        record.client_name = name;
    }
    if let Some(email) = request.client_email {
        validate_email(&email).map_err(|e| store_error(&e))?;
        record.client_email = email;
    }
    if let Some(status) = request.status.as_deref() {
        record.status = DocumentStatus::parse(status)
            .ok_or_else(|| bad_request(format!("unknown document status: {status}")))?;
    }
    record.updated_at = Utc::now();

    workspace
        .upsert_takeoff(&record)
        .map_err(|e| store_error(&e))?;
    Ok(Json(record))
}

/// Delete a takeoff.
pub async fn delete_takeoff_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    if workspace.remove_takeoff(&id).map_err(|e| store_error(&e))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(store_error(&PlandeckError::NotFound(format!(
            "takeoff {id}"
        ))))
    }
}

/// Duplicate a takeoff: fresh id, fresh number, status back to pending.
pub async fn duplicate_takeoff_handler(
    State(state): State<AppState>,
    Json(request): Json<DuplicateRequest>,
) -> Result<Json<TakeoffRecord>, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    let source = workspace
        .takeoff(&request.id)
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("takeoff {}", request.id))))?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let copy = TakeoffRecord {
        id: id.to_string(),
        number: document_number("QTE", now, &id),
        status: DocumentStatus::Pending,
        created_at: now,
        updated_at: now,
        ..source
    };
    workspace
        .upsert_takeoff(&copy)
        .map_err(|e| store_error(&e))?;
    Ok(Json(copy))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn document_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("ts");
        let id = Uuid::nil();
        let number = document_number("INV", now, &id);
        assert_eq!(number, "INV-260301-1000");
    }

    #[test]
    fn document_number_serial_is_four_digits() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).single().expect("ts");
        for _ in 0..50 {
            let id = Uuid::new_v4();
            let number = document_number("QTE", now, &id);
            let serial: u16 = number
                .rsplit('-')
                .next()
                .and_then(|s| s.parse().ok())
                .expect("serial");
            assert!((1000..=9999).contains(&serial));
        }
    }
}
