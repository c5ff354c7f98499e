//! Dashboard read models built from a loaded consultation list.
//!
//! These functions never touch the store. They take the list the board already holds
//! and derive filtered views, status counts, the mentor partition and revenue figures
//! that the pages render.

use crate::{
    core::consultation::ConsultationView,
    entities::{
        consultant,
        consultation::{ConsultationStatus, ConsultationType},
    },
};
use std::collections::{BTreeMap, HashMap};

/// Filter selected on the consultation list page. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ConsultationFilter {
    /// Only this subject area
    pub consultation_type: Option<ConsultationType>,
    /// Only this status
    pub status: Option<ConsultationStatus>,
    /// Case-insensitive substring of the topic or description
    pub search: Option<String>,
}

impl ConsultationFilter {
    /// Whether a consultation passes the filter.
    #[must_use]
    pub fn matches(&self, view: &ConsultationView) -> bool {
        let consultation = &view.consultation;

        if self
            .consultation_type
            .is_some_and(|t| t != consultation.consultation_type)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != consultation.status) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                consultation.topic.to_lowercase().contains(&term)
                    || consultation.description.to_lowercase().contains(&term)
            }
        }
    }
}

/// Applies a filter, keeping the input order.
#[must_use]
pub fn filter_consultations<'a>(
    views: &'a [ConsultationView],
    filter: &ConsultationFilter,
) -> Vec<&'a ConsultationView> {
    views.iter().filter(|view| filter.matches(view)).collect()
}

/// Number of consultations in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// All consultations
    pub total: usize,
    /// Waiting for a mentor
    pub pending: usize,
    /// Accepted
    pub scheduled: usize,
    /// Held
    pub completed: usize,
    /// Withdrawn
    pub cancelled: usize,
}

/// Counts consultations by status for the dashboard summary cards.
#[must_use]
pub fn status_counts(views: &[ConsultationView]) -> StatusCounts {
    views
        .iter()
        .fold(StatusCounts::default(), |mut counts, view| {
            counts.total += 1;
            match view.consultation.status {
                ConsultationStatus::Pending => counts.pending += 1,
                ConsultationStatus::Scheduled => counts.scheduled += 1,
                ConsultationStatus::Completed => counts.completed += 1,
                ConsultationStatus::Cancelled => counts.cancelled += 1,
            }
            counts
        })
}

/// The consultant view of the list.
#[derive(Debug, Default)]
pub struct MentorPartition<'a> {
    /// Consultations assigned to the mentor
    pub mine: Vec<&'a ConsultationView>,
    /// Pending requests nobody has accepted yet
    pub unassigned: Vec<&'a ConsultationView>,
}

/// Splits a list into the mentor's own consultations and the unassigned pool.
///
/// Anything else (e.g. a request cancelled before anyone accepted it) is in neither.
#[must_use]
pub fn partition_for_mentor<'a>(
    views: &'a [ConsultationView],
    mentor_id: &str,
) -> MentorPartition<'a> {
    let mut partition = MentorPartition::default();

    for view in views {
        let consultation = &view.consultation;
        match consultation.mentor_id.as_deref() {
            Some(id) if id == mentor_id => partition.mine.push(view),
            None if consultation.status == ConsultationStatus::Pending => {
                partition.unassigned.push(view);
            }
            _ => {}
        }
    }

    partition
}

/// Revenue earned by one mentor from completed consultations.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorRevenue {
    /// Mentor user id
    pub mentor_id: String,
    /// Completed sessions counted
    pub sessions: usize,
    /// Billed hours
    pub hours: f64,
    /// Hourly rate used
    pub hourly_rate: f64,
    /// hours x rate
    pub revenue: f64,
}

/// Computes revenue per mentor over completed consultations.
///
/// A mentor's own published hourly rate is used when the directory has one; otherwise
/// `default_hourly_rate` applies. Results are ordered by mentor id.
#[must_use]
pub fn consultant_revenue(
    views: &[ConsultationView],
    consultants: &[consultant::Model],
    default_hourly_rate: f64,
) -> Vec<MentorRevenue> {
    let rates: HashMap<&str, f64> = consultants
        .iter()
        .filter_map(|c| c.hourly_rate.map(|rate| (c.id.as_str(), rate)))
        .collect();

    let mut by_mentor: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for view in views {
        let consultation = &view.consultation;
        if consultation.status != ConsultationStatus::Completed {
            continue;
        }
        let Some(mentor_id) = consultation.mentor_id.as_deref() else {
            continue;
        };
        let entry = by_mentor.entry(mentor_id).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += consultation.duration.hours();
    }

    by_mentor
        .into_iter()
        .map(|(mentor_id, (sessions, hours))| {
            let hourly_rate = rates.get(mentor_id).copied().unwrap_or(default_hourly_rate);
            MentorRevenue {
                mentor_id: mentor_id.to_string(),
                sessions,
                hours,
                hourly_rate,
                revenue: hours * hourly_rate,
            }
        })
        .collect()
}

/// Average rating over rated consultations, None when nothing has been rated.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_rating(views: &[ConsultationView]) -> Option<f64> {
    let ratings: Vec<i32> = views
        .iter()
        .filter_map(|view| view.consultation.rating)
        .collect();

    if ratings.is_empty() {
        return None;
    }

    let sum: i32 = ratings.iter().sum();
    Some(f64::from(sum) / ratings.len() as f64)
}
