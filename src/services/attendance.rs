//! Turns approved "Attendance Request" leave requests into clock-in/clock-out records
//! and removes them again when the request is rejected.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::model::attendance::{ActivityType, AttendanceRecord, attendance_collection};
use crate::model::leave_request::{
    ATTENDANCE_GENERATED, ATTENDANCE_REQUEST, LeaveRequestSnapshot, LeaveStatus,
    leave_request_doc,
};
use crate::model::user::profile_doc;
use crate::store::{
    DocPath, DocumentStore, Fields, MAX_BATCH_WRITES, Precondition, StoreError, WriteBatch,
    to_fields,
};
use crate::utils::date_window::AttendanceClock;

/// Fallback when neither the request nor the profile carries an email.
pub const UNKNOWN_EMAIL: &str = "unknown";

#[derive(Debug, Clone)]
pub struct LeaveRequestUpdate {
    pub user_id: String,
    pub request_id: String,
    pub before: LeaveRequestSnapshot,
    pub after: LeaveRequestSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Not an attendance request.
    Ignored,
    /// Status change that neither generates nor retracts.
    NoTransition,
    Generated { records: usize },
    /// Another invocation generated first.
    AlreadyGenerated,
    Retracted { records: usize },
    /// Another invocation retracted first.
    AlreadyRetracted,
    /// The stored request no longer matches the event, nothing written.
    Stale,
    /// The leave request document does not exist.
    RequestMissing,
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Leave request {request_id} has no {field}")]
    MissingField {
        request_id: String,
        field: &'static str,
    },

    #[error("Leave request {request_id} has dates outside the supported range")]
    DateOutOfRange { request_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AttendanceMaterializer {
    store: Arc<dyn DocumentStore>,
    clock: AttendanceClock,
}

impl AttendanceMaterializer {
    pub fn new(store: Arc<dyn DocumentStore>, clock: AttendanceClock) -> Self {
        Self { store, clock }
    }

    #[instrument(
        name = "on_leave_request_updated",
        skip_all,
        fields(user_id = %update.user_id, request_id = %update.request_id)
    )]
    pub async fn on_leave_request_updated(
        &self,
        update: LeaveRequestUpdate,
    ) -> Result<Outcome, MaterializeError> {
        let LeaveRequestUpdate { before, after, .. } = &update;

        info!(
            before_status = before.status().as_ref().map(LeaveStatus::as_str),
            after_status = after.status().as_ref().map(LeaveStatus::as_str),
            attendance_generated = ?after.attendance_generated,
            "Leave request update received"
        );

        if !after.is_attendance_request() {
            debug!(leave_type = ?after.leave_type, "Not an attendance request, skipping");
            return Ok(Outcome::Ignored);
        }

        if !before.is_approved() && after.is_approved() && !after.attendance_generated() {
            return self.generate(&update).await;
        }

        if before.is_approved() && after.is_rejected() && after.attendance_generated() {
            return self.retract(&update).await;
        }

        debug!("No attendance transition");
        Ok(Outcome::NoTransition)
    }

    async fn generate(&self, update: &LeaveRequestUpdate) -> Result<Outcome, MaterializeError> {
        let missing = |field| MaterializeError::MissingField {
            request_id: update.request_id.clone(),
            field,
        };
        let start = update.after.start_date.ok_or_else(|| missing("startDate"))?;
        let end = update.after.end_date.ok_or_else(|| missing("endDate"))?;

        let window = self
            .clock
            .window(start, end)
            .ok_or_else(|| MaterializeError::DateOutOfRange {
                request_id: update.request_id.clone(),
            })?;

        // two records per day plus the flag update
        let writes = window.len().saturating_mul(2).saturating_add(1);
        if writes > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge {
                len: writes,
                max: MAX_BATCH_WRITES,
            }
            .into());
        }
        debug!(%start, %end, days = window.len(), "Generating attendance records");

        let user_email = self.resolve_email(update).await?;
        let attendance = attendance_collection(&update.user_id);
        let leave_doc = leave_request_doc(&update.user_id, &update.request_id);

        let mut batch = WriteBatch::new();
        batch
            .require(field_equals(&leave_doc, "leaveType", ATTENDANCE_REQUEST))
            .require(field_equals(&leave_doc, "status", LeaveStatus::Approved.as_str()))
            .require(Precondition::FieldNotTrue {
                path: leave_doc.clone(),
                field: ATTENDANCE_GENERATED.to_string(),
            });

        for day in window.days() {
            let (clock_in, clock_out) = self.clock.shift(day);

            for (activity, at) in [
                (ActivityType::ClockIn, clock_in),
                (ActivityType::ClockOut, clock_out),
            ] {
                debug!(%day, %activity, %at, "Adding attendance");
                let record =
                    AttendanceRecord::generated(activity, at, &user_email, &update.request_id);
                batch.set(attendance.doc(&self.store.new_doc_id()), to_fields(&record)?);
            }
        }
        batch.update(leave_doc.clone(), flag(true));

        let records = window.len() * 2;
        let committed = self.store.commit(batch).await;
        if committed.is_ok() {
            info!(records, "Attendance records committed, attendanceGenerated = true");
        }
        self.settle(
            committed,
            &leave_doc,
            Outcome::Generated { records },
            true,
            Outcome::AlreadyGenerated,
        )
        .await
    }

    async fn retract(&self, update: &LeaveRequestUpdate) -> Result<Outcome, MaterializeError> {
        let attendance = attendance_collection(&update.user_id);
        let leave_doc = leave_request_doc(&update.user_id, &update.request_id);

        let matches = self
            .store
            .query_eq(
                &attendance,
                "requestId",
                &Value::String(update.request_id.clone()),
            )
            .await?;

        if matches.is_empty() {
            info!("No attendance found for request");
        }

        let mut batch = WriteBatch::new();
        batch
            .require(field_equals(&leave_doc, "status", LeaveStatus::Rejected.as_str()))
            .require(Precondition::FieldTrue {
                path: leave_doc.clone(),
                field: ATTENDANCE_GENERATED.to_string(),
            });
        for doc in &matches {
            debug!(doc_id = doc.id(), "Deleting attendance doc");
            batch.delete(doc.path.clone());
        }
        batch.update(leave_doc.clone(), flag(false));

        let committed = self.store.commit(batch).await;
        if committed.is_ok() {
            info!(
                records = matches.len(),
                "Attendance deleted, attendanceGenerated = false"
            );
        }
        self.settle(
            committed,
            &leave_doc,
            Outcome::Retracted {
                records: matches.len(),
            },
            false,
            Outcome::AlreadyRetracted,
        )
        .await
    }

    /// Maps a commit result to an outcome. A refused batch wrote nothing; the stored
    /// flag tells a lost race (`already`) from an event that no longer matches.
    async fn settle(
        &self,
        committed: Result<(), StoreError>,
        leave_doc: &DocPath,
        applied: Outcome,
        flag_when_applied: bool,
        already: Outcome,
    ) -> Result<Outcome, MaterializeError> {
        match committed {
            Ok(()) => Ok(applied),
            Err(StoreError::NotFound(path)) if path == leave_doc.to_string() => {
                warn!("Leave request document not found, nothing written");
                Ok(Outcome::RequestMissing)
            }
            Err(StoreError::PreconditionFailed(_)) => {
                let stored = self.store.get(leave_doc).await?;
                let flag = stored
                    .as_ref()
                    .and_then(|doc| doc.data.get(ATTENDANCE_GENERATED))
                    == Some(&Value::Bool(true));

                if flag == flag_when_applied {
                    warn!(outcome = ?already, "Handled by a concurrent invocation");
                    Ok(already)
                } else {
                    warn!("Stored leave request does not match the event, nothing written");
                    Ok(Outcome::Stale)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Request email, else profile email, else `"unknown"`.
    async fn resolve_email(&self, update: &LeaveRequestUpdate) -> Result<String, StoreError> {
        if let Some(email) = update.after.user_email() {
            return Ok(email.to_string());
        }

        let profile = self.store.get(&profile_doc(&update.user_id)).await?;
        Ok(profile
            .as_ref()
            .and_then(|doc| doc.get_str("email"))
            .filter(|email| !email.is_empty())
            .unwrap_or(UNKNOWN_EMAIL)
            .to_string())
    }
}

fn field_equals(path: &DocPath, field: &str, value: &str) -> Precondition {
    Precondition::FieldEquals {
        path: path.clone(),
        field: field.to_string(),
        value: Value::String(value.to_string()),
    }
}

fn flag(value: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert(ATTENDANCE_GENERATED.to_string(), Value::Bool(value));
    fields
}
