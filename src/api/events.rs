use actix_web::{HttpResponse, web};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::error::AppError;
use crate::model::leave_request::LeaveRequestSnapshot;
use crate::models::{ErrorResponse, LeaveRequestEvent};
use crate::services::{AttendanceMaterializer, LeaveRequestUpdate, Outcome};
use crate::store::{DocPath, Fields, path::match_leave_request};

fn snapshot(fields: Fields, side: &str) -> Result<LeaveRequestSnapshot, AppError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::validation(format!("Invalid {side} snapshot: {e}")))
}

/// Leave request document updated
///
/// Delivered by the document store for every write on
/// `users/{userId}/leave_requests/{requestId}`. A 500 asks the sender to retry.
#[utoipa::path(
    post,
    path = "/events/leave-request-updated",
    request_body = LeaveRequestEvent,
    responses(
        (status = 200, description = "Event handled", example = json!({
            "outcome": "generated",
            "records": 6
        })),
        (status = 400, description = "Not a leave request document", body = ErrorResponse),
        (status = 500, description = "Materialization failed", body = ErrorResponse)
    ),
    tag = "Events"
)]
#[instrument(name = "leave_request_updated", skip_all, fields(document = %event.document))]
pub async fn leave_request_updated(
    materializer: web::Data<AttendanceMaterializer>,
    event: web::Json<LeaveRequestEvent>,
) -> Result<HttpResponse, AppError> {
    let LeaveRequestEvent {
        document,
        before,
        after,
    } = event.into_inner();

    let (user_id, request_id) = DocPath::parse(&document)
        .as_ref()
        .and_then(match_leave_request)
        .ok_or_else(|| AppError::validation(format!("Not a leave request document: {document}")))?;

    // creations and deletions carry only one side
    let (Some(before), Some(after)) = (before, after) else {
        debug!("Event without both snapshots, skipping");
        return Ok(HttpResponse::Ok().json(Outcome::Ignored));
    };

    let update = LeaveRequestUpdate {
        user_id,
        request_id,
        before: snapshot(before, "before")?,
        after: snapshot(after, "after")?,
    };

    let outcome = materializer
        .on_leave_request_updated(update)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to materialize attendance"))?;

    Ok(HttpResponse::Ok().json(outcome))
}
