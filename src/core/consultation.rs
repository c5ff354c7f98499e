//! Consultation business logic - Handles the consultation lifecycle.
//!
//! A student creates a request (`pending`, no mentor). A consultant accepts it, which
//! assigns the mentor and moves it to `scheduled` in one statement. Either party can
//! cancel while it is pending or scheduled; completing it allows a rating and feedback
//! to be attached. Updates go through [`ConsultationPatch`], which can only express the
//! whitelisted fields and is validated against the lifecycle before it is written.

use crate::{
    core::{
        auth::{AuthUser, UserRole},
        directory,
    },
    entities::{
        Consultation,
        consultation::{
            self, ConsultationMethod, ConsultationStatus, ConsultationType, SessionDuration,
        },
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// A consultation together with the display name of its mentor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultationView {
    /// The stored consultation
    pub consultation: consultation::Model,
    /// Mentor display name; None when unassigned or when the lookup failed
    pub mentor_name: Option<String>,
}

/// Fields a student supplies when requesting a consultation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewConsultation {
    /// Short subject line
    pub topic: String,
    /// What the student needs help with
    pub description: String,
    /// Subject area
    pub consultation_type: ConsultationType,
    /// Session method, defaults to video
    #[serde(default)]
    pub method: Option<ConsultationMethod>,
    /// Session length, defaults to 60 minutes
    #[serde(default)]
    pub duration: Option<SessionDuration>,
    /// Optional date hint
    #[serde(default)]
    pub preferred_date: Option<DateTimeUtc>,
}

/// Partial update of a consultation.
///
/// Only the whitelisted fields exist here; anything else about a consultation is
/// fixed at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsultationPatch {
    /// New lifecycle state
    pub status: Option<ConsultationStatus>,
    /// Mentor to assign
    pub mentor_id: Option<String>,
    /// Agreed session date
    pub scheduled_date: Option<DateTimeUtc>,
    /// Completion time
    pub completed_at: Option<DateTimeUtc>,
    /// Rating 1-5
    pub rating: Option<i32>,
    /// Feedback text
    pub feedback: Option<String>,
}

impl ConsultationPatch {
    /// Patch that only changes the status.
    #[must_use]
    pub fn status(status: ConsultationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Retrieves a consultation by id.
pub async fn get_consultation_by_id(
    db: &DatabaseConnection,
    consultation_id: i64,
) -> Result<Option<consultation::Model>> {
    Consultation::find_by_id(consultation_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the consultations the viewer is allowed to see, newest first.
///
/// - students see their own requests
/// - consultants and teachers see requests assigned to them plus every unclaimed one
/// - admins see everything
/// - nobody signed in sees nothing
///
/// Mentor names are resolved best-effort: a failed directory lookup leaves the name
/// empty instead of failing the list.
#[instrument(skip(db, viewer), fields(viewer = viewer.map(|v| v.id.as_str())))]
pub async fn list_consultations_for_viewer(
    db: &DatabaseConnection,
    viewer: Option<&AuthUser>,
) -> Result<Vec<ConsultationView>> {
    let Some(viewer) = viewer else {
        return Ok(Vec::new());
    };

    let query = match viewer.role {
        UserRole::Student => {
            Consultation::find().filter(consultation::Column::StudentId.eq(viewer.id.as_str()))
        }
        UserRole::Consultant | UserRole::Teacher => Consultation::find().filter(
            Condition::any()
                .add(consultation::Column::MentorId.eq(viewer.id.as_str()))
                .add(consultation::Column::MentorId.is_null()),
        ),
        UserRole::Admin => Consultation::find(),
    };

    let consultations = query
        .order_by_desc(consultation::Column::CreatedAt)
        .order_by_desc(consultation::Column::Id)
        .all(db)
        .await?;
    debug!("Fetched {} consultation(s)", consultations.len());

    let mentor_names = resolve_mentor_names(db, &consultations).await;

    Ok(consultations
        .into_iter()
        .map(|consultation| {
            let mentor_name = consultation
                .mentor_id
                .as_ref()
                .and_then(|id| mentor_names.get(id).cloned().flatten());
            ConsultationView {
                consultation,
                mentor_name,
            }
        })
        .collect())
}

/// Looks up each distinct mentor once. Failures and unknown ids map to None.
async fn resolve_mentor_names(
    db: &DatabaseConnection,
    consultations: &[consultation::Model],
) -> HashMap<String, Option<String>> {
    let mut names = HashMap::new();

    for mentor_id in consultations.iter().filter_map(|c| c.mentor_id.as_ref()) {
        if names.contains_key(mentor_id) {
            continue;
        }
        let name = match directory::get_user_by_id(db, mentor_id).await {
            Ok(user) => user.map(|u| u.name),
            Err(e) => {
                warn!("Could not resolve mentor '{}': {}", mentor_id, e);
                None
            }
        };
        names.insert(mentor_id.clone(), name);
    }

    names
}

/// Creates a consultation request on behalf of the signed-in student.
///
/// # Errors
/// Returns an error if:
/// - Nobody is signed in ([`Error::AuthenticationRequired`])
/// - The topic or description is blank
/// - The database insert fails
#[instrument(skip(db, viewer, new), fields(topic = %new.topic))]
pub async fn create_consultation(
    db: &DatabaseConnection,
    viewer: Option<&AuthUser>,
    new: NewConsultation,
) -> Result<consultation::Model> {
    let viewer = AuthUser::require(viewer)?;

    if new.topic.trim().is_empty() {
        return Err(Error::validation("Topic cannot be empty"));
    }
    if new.description.trim().is_empty() {
        return Err(Error::validation("Description cannot be empty"));
    }

    let consultation = consultation::ActiveModel {
        student_id: Set(viewer.id.clone()),
        mentor_id: Set(None),
        topic: Set(new.topic.trim().to_string()),
        description: Set(new.description.trim().to_string()),
        consultation_type: Set(new.consultation_type),
        method: Set(new.method.unwrap_or_default()),
        duration: Set(new.duration.unwrap_or_default()),
        status: Set(ConsultationStatus::Pending),
        scheduled_date: Set(None),
        preferred_date: Set(new.preferred_date),
        completed_at: Set(None),
        rating: Set(None),
        feedback: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    };

    let created = consultation.insert(db).await?;
    info!("Consultation {} created by {}", created.id, viewer.id);
    Ok(created)
}

/// Checks a patch against the stored consultation before anything is written.
fn validate_patch(existing: &consultation::Model, patch: &ConsultationPatch) -> Result<()> {
    let next_status = patch.status.unwrap_or(existing.status);

    if !existing.status.can_transition_to(next_status) {
        return Err(Error::InvalidTransition {
            from: existing.status,
            to: next_status,
        });
    }

    if let Some(rating) = patch.rating {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidRating { rating });
        }
    }

    if (patch.rating.is_some() || patch.feedback.is_some())
        && next_status != ConsultationStatus::Completed
    {
        return Err(Error::RatingNotAllowed {
            status: next_status,
        });
    }

    let has_mentor = patch.mentor_id.is_some() || existing.mentor_id.is_some();
    if matches!(
        next_status,
        ConsultationStatus::Scheduled | ConsultationStatus::Completed
    ) && !has_mentor
    {
        return Err(Error::validation(format!(
            "A {next_status} consultation needs an assigned mentor"
        )));
    }

    Ok(())
}

/// Applies a whitelisted patch to a consultation and stamps `updated_at`.
///
/// # Errors
/// Returns an error if:
/// - The consultation does not exist
/// - The status change is not allowed by the lifecycle
/// - The rating is outside 1-5, or rating/feedback is set on a non-completed consultation
/// - The result would be scheduled or completed without a mentor
/// - The database update fails
#[instrument(skip(db, patch))]
pub async fn update_consultation(
    db: &DatabaseConnection,
    consultation_id: i64,
    patch: ConsultationPatch,
) -> Result<consultation::Model> {
    let existing = get_consultation_by_id(db, consultation_id)
        .await?
        .ok_or(Error::ConsultationNotFound {
            id: consultation_id,
        })?;

    validate_patch(&existing, &patch)?;

    let mut consultation: consultation::ActiveModel = existing.into();
    if let Some(status) = patch.status {
        consultation.status = Set(status);
    }
    if let Some(mentor_id) = patch.mentor_id {
        consultation.mentor_id = Set(Some(mentor_id));
    }
    if let Some(scheduled_date) = patch.scheduled_date {
        consultation.scheduled_date = Set(Some(scheduled_date));
    }
    if let Some(completed_at) = patch.completed_at {
        consultation.completed_at = Set(Some(completed_at));
    }
    if let Some(rating) = patch.rating {
        consultation.rating = Set(Some(rating));
    }
    if let Some(feedback) = patch.feedback {
        consultation.feedback = Set(Some(feedback));
    }
    consultation.updated_at = Set(Some(Utc::now()));

    consultation.update(db).await.map_err(Into::into)
}

/// Accepts a consultation on behalf of the signed-in mentor.
///
/// Mentor, status and (optionally) the scheduled date are written by a single UPDATE
/// statement, so the consultation is never observable with a mentor but without the
/// `scheduled` status or the other way round. Completed and cancelled consultations
/// are left untouched. There is no check that another mentor accepted first; the last
/// accept wins.
///
/// # Errors
/// Returns an error if:
/// - Nobody is signed in ([`Error::AuthenticationRequired`])
/// - The consultation does not exist
/// - The consultation is already completed or cancelled
/// - The database update fails
#[instrument(skip(db, viewer))]
pub async fn accept_consultation(
    db: &DatabaseConnection,
    viewer: Option<&AuthUser>,
    consultation_id: i64,
    scheduled_date: Option<DateTimeUtc>,
) -> Result<consultation::Model> {
    let viewer = AuthUser::require(viewer)?;

    let mut update = Consultation::update_many()
        .col_expr(consultation::Column::MentorId, Expr::value(viewer.id.clone()))
        .col_expr(
            consultation::Column::Status,
            Expr::value(ConsultationStatus::Scheduled.as_str()),
        )
        .col_expr(consultation::Column::UpdatedAt, Expr::value(Utc::now()));
    if let Some(date) = scheduled_date {
        update = update.col_expr(consultation::Column::ScheduledDate, Expr::value(date));
    }

    let result = update
        .filter(consultation::Column::Id.eq(consultation_id))
        .filter(consultation::Column::Status.is_not_in([
            ConsultationStatus::Completed.as_str(),
            ConsultationStatus::Cancelled.as_str(),
        ]))
        .exec(db)
        .await?;

    let consultation = get_consultation_by_id(db, consultation_id)
        .await?
        .ok_or(Error::ConsultationNotFound {
            id: consultation_id,
        })?;

    if result.rows_affected == 0 {
        return Err(Error::InvalidTransition {
            from: consultation.status,
            to: ConsultationStatus::Scheduled,
        });
    }

    info!("Consultation {} accepted by {}", consultation_id, viewer.id);
    Ok(consultation)
}

/// Cancels a pending or scheduled consultation.
pub async fn cancel_consultation(
    db: &DatabaseConnection,
    consultation_id: i64,
) -> Result<consultation::Model> {
    update_consultation(
        db,
        consultation_id,
        ConsultationPatch::status(ConsultationStatus::Cancelled),
    )
    .await
}

/// Marks a scheduled consultation as completed now.
pub async fn complete_consultation(
    db: &DatabaseConnection,
    consultation_id: i64,
) -> Result<consultation::Model> {
    update_consultation(
        db,
        consultation_id,
        ConsultationPatch {
            status: Some(ConsultationStatus::Completed),
            completed_at: Some(Utc::now()),
            ..ConsultationPatch::default()
        },
    )
    .await
}

/// Attaches a rating and optional feedback to a completed consultation.
pub async fn rate_consultation(
    db: &DatabaseConnection,
    consultation_id: i64,
    rating: i32,
    feedback: Option<String>,
) -> Result<consultation::Model> {
    update_consultation(
        db,
        consultation_id,
        ConsultationPatch {
            rating: Some(rating),
            feedback: feedback.filter(|f| !f.trim().is_empty()),
            ..ConsultationPatch::default()
        },
    )
    .await
}
