//! Consultation entity - A student's request for time with a mentor.
//!
//! A consultation starts `pending` with no mentor, becomes `scheduled` when a
//! consultant accepts it, and ends either `completed` (optionally rated) or `cancelled`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consultation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consultations")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User id of the student who requested the consultation
    pub student_id: String,
    /// User id of the accepting mentor, None while unassigned
    pub mentor_id: Option<String>,
    /// Short subject line
    pub topic: String,
    /// Free-text description of what the student needs
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Subject area of the request
    pub consultation_type: ConsultationType,
    /// How the session is held
    pub method: ConsultationMethod,
    /// Booked length of the session
    pub duration: SessionDuration,
    /// Lifecycle state
    pub status: ConsultationStatus,
    /// Agreed date, set once accepted
    pub scheduled_date: Option<DateTimeUtc>,
    /// Date hint supplied by the student
    pub preferred_date: Option<DateTimeUtc>,
    /// When the session was marked completed
    pub completed_at: Option<DateTimeUtc>,
    /// Student rating 1-5, only on completed consultations
    pub rating: Option<i32>,
    /// Free-text feedback attached with the rating
    pub feedback: Option<String>,
    /// When the request was created
    pub created_at: DateTimeUtc,
    /// Last time any whitelisted field was patched
    pub updated_at: Option<DateTimeUtc>,
}

/// Consultations reference users by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle state of a consultation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    /// Waiting for a mentor
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by a mentor
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Session held
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Withdrawn by either party
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ConsultationStatus {
    /// Whether no further transitions are defined out of this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Re-applying the current status is allowed and changes nothing.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Pending | Self::Scheduled | Self::Cancelled)
                | (Self::Scheduled, Self::Scheduled | Self::Completed | Self::Cancelled)
                | (Self::Completed, Self::Completed)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject area of a consultation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    /// Programming and tooling questions
    #[sea_orm(string_value = "technical")]
    Technical,
    /// Coursework and study planning
    #[sea_orm(string_value = "academic")]
    Academic,
    /// Internships, jobs and career paths
    #[sea_orm(string_value = "career")]
    Career,
    /// Help with a specific project
    #[sea_orm(string_value = "project")]
    Project,
}

/// How a consultation session is held.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ConsultationMethod {
    /// Video call
    #[default]
    #[sea_orm(string_value = "video")]
    Video,
    /// Phone call
    #[sea_orm(string_value = "phone")]
    Phone,
    /// Text chat
    #[sea_orm(string_value = "chat")]
    Chat,
    /// Shared screen session
    #[sea_orm(string_value = "screen_share")]
    ScreenShare,
}

/// Bookable session lengths.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum SessionDuration {
    /// 30 minutes
    #[sea_orm(num_value = 30)]
    HalfHour,
    /// 60 minutes
    #[default]
    #[sea_orm(num_value = 60)]
    Hour,
    /// 90 minutes
    #[sea_orm(num_value = 90)]
    HourAndHalf,
    /// 120 minutes
    #[sea_orm(num_value = 120)]
    TwoHours,
}

impl SessionDuration {
    /// Length in minutes.
    #[must_use]
    pub const fn minutes(self) -> i32 {
        match self {
            Self::HalfHour => 30,
            Self::Hour => 60,
            Self::HourAndHalf => 90,
            Self::TwoHours => 120,
        }
    }

    /// Maps a minute count onto one of the bookable lengths.
    #[must_use]
    pub const fn from_minutes(minutes: i32) -> Option<Self> {
        match minutes {
            30 => Some(Self::HalfHour),
            60 => Some(Self::Hour),
            90 => Some(Self::HourAndHalf),
            120 => Some(Self::TwoHours),
            _ => None,
        }
    }

    /// Length in hours, used for billing.
    #[must_use]
    pub fn hours(self) -> f64 {
        f64::from(self.minutes()) / 60.0
    }
}
