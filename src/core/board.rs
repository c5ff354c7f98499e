//! Consultation board - the per-session view of the viewer's consultations.
//!
//! The board keeps the last fetched list, a loading flag, an advisory busy flag and
//! the last error message behind a shared lock, so a rendering task can read while an
//! action is in flight. Every mutation is followed by a full re-fetch. Each fetch takes
//! a generation number when it starts and its result is only applied if no newer fetch
//! has started since, so the most recently issued request always wins regardless of
//! the order in which responses arrive.

use crate::{
    core::{
        auth::AuthUser,
        consultation::{self, ConsultationPatch, ConsultationView, NewConsultation},
    },
    entities::consultation::Model as ConsultationModel,
    errors::Result,
};
use sea_orm::{DatabaseConnection, prelude::DateTimeUtc};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// What the page renders from.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    /// Consultations visible to the viewer, newest first
    pub consultations: Vec<ConsultationView>,
    /// A fetch is in flight
    pub loading: bool,
    /// A mutation is in flight; the triggering control should be disabled
    pub busy: bool,
    /// User-facing message of the last failure, cleared by the next successful fetch
    pub error: Option<String>,
}

/// Result of a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the previous one
    Applied,
    /// The fetch failed; the previous list was kept
    Failed,
    /// A newer refresh started while this one was in flight; its result was dropped
    Superseded,
}

/// Session-scoped consultation manager for one viewer.
pub struct ConsultationBoard {
    db: Arc<DatabaseConnection>,
    viewer: Option<AuthUser>,
    state: Arc<RwLock<BoardState>>,
    generation: AtomicU64,
}

impl ConsultationBoard {
    /// Creates an empty board. Call [`ConsultationBoard::refresh`] to load it.
    ///
    /// Boards for different viewers can share one connection.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, viewer: Option<AuthUser>) -> Self {
        Self {
            db,
            viewer,
            state: Arc::new(RwLock::new(BoardState::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// The signed-in user this board belongs to.
    #[must_use]
    pub const fn viewer(&self) -> Option<&AuthUser> {
        self.viewer.as_ref()
    }

    /// Shared handle to the state for readers that outlive a borrow of the board.
    #[must_use]
    pub fn shared_state(&self) -> Arc<RwLock<BoardState>> {
        Arc::clone(&self.state)
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> BoardState {
        self.state.read().await.clone()
    }

    /// Re-fetches the viewer's consultations.
    ///
    /// Store failures are recorded in the state and leave the previous list in place;
    /// they are not returned to the caller.
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = self.begin_refresh().await;
        let result =
            consultation::list_consultations_for_viewer(&self.db, self.viewer.as_ref()).await;
        self.finish_refresh(generation, result).await
    }

    /// Marks a fetch as started and returns its generation.
    async fn begin_refresh(&self) -> u64 {
        let mut state = self.state.write().await;
        state.loading = true;
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies a fetch result if it belongs to the latest generation.
    async fn finish_refresh(
        &self,
        generation: u64,
        result: Result<Vec<ConsultationView>>,
    ) -> RefreshOutcome {
        let mut state = self.state.write().await;

        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(
                "Dropping consultation list from refresh {} (latest is {})",
                generation, latest
            );
            return RefreshOutcome::Superseded;
        }

        state.loading = false;
        match result {
            Ok(consultations) => {
                info!("Consultation board refreshed with {} items", consultations.len());
                state.consultations = consultations;
                state.error = None;
                RefreshOutcome::Applied
            }
            Err(e) => {
                error!("Failed to refresh consultations: {}", e);
                state.error = Some(e.user_message());
                RefreshOutcome::Failed
            }
        }
    }

    /// Runs a mutation with the busy flag raised, records a failure in the state and
    /// re-fetches the list after a success. The mutation's error is always returned.
    async fn run_mutation<T, F>(&self, action: &str, mutation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.state.write().await.busy = true;
        let result = mutation.await;

        {
            let mut state = self.state.write().await;
            state.busy = false;
            if let Err(e) = &result {
                error!("Failed to {}: {}", action, e);
                state.error = Some(e.user_message());
            }
        }

        if result.is_ok() {
            self.refresh().await;
        }
        result
    }

    /// Requests a consultation as the viewer.
    pub async fn create(&self, new: NewConsultation) -> Result<ConsultationModel> {
        self.run_mutation(
            "create consultation",
            consultation::create_consultation(&self.db, self.viewer.as_ref(), new),
        )
        .await
    }

    /// Applies a whitelisted patch.
    pub async fn update(&self, id: i64, patch: ConsultationPatch) -> Result<ConsultationModel> {
        self.run_mutation(
            "update consultation",
            consultation::update_consultation(&self.db, id, patch),
        )
        .await
    }

    /// Accepts a consultation as the viewer.
    pub async fn accept(
        &self,
        id: i64,
        scheduled_date: Option<DateTimeUtc>,
    ) -> Result<ConsultationModel> {
        self.run_mutation(
            "accept consultation",
            consultation::accept_consultation(&self.db, self.viewer.as_ref(), id, scheduled_date),
        )
        .await
    }

    /// Cancels a pending or scheduled consultation.
    pub async fn cancel(&self, id: i64) -> Result<ConsultationModel> {
        self.run_mutation(
            "cancel consultation",
            consultation::cancel_consultation(&self.db, id),
        )
        .await
    }

    /// Marks a scheduled consultation as completed.
    pub async fn complete(&self, id: i64) -> Result<ConsultationModel> {
        self.run_mutation(
            "complete consultation",
            consultation::complete_consultation(&self.db, id),
        )
        .await
    }

    /// Rates a completed consultation.
    pub async fn rate(
        &self,
        id: i64,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<ConsultationModel> {
        self.run_mutation(
            "rate consultation",
            consultation::rate_consultation(&self.db, id, rating, feedback),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        directory,
        report::{self, ConsultationFilter},
    };
    use crate::entities::consultation::ConsultationStatus;
    use crate::errors::{Error, STORE_FAILURE_MESSAGE};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let row = test_consultation_row(1, "s-1", None, ConsultationStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![row.clone()]])
            .append_query_errors([DbErr::Custom("offline".to_string())])
            .into_connection();
        let board = ConsultationBoard::new(Arc::new(db), Some(test_student("s-1")));

        assert_eq!(board.refresh().await, RefreshOutcome::Applied);
        assert_eq!(board.refresh().await, RefreshOutcome::Failed);

        let state = board.snapshot().await;
        assert_eq!(state.consultations.len(), 1);
        assert_eq!(state.consultations[0].consultation, row);
        assert_eq!(state.error.as_deref(), Some(STORE_FAILURE_MESSAGE));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_stale_refresh_is_discarded() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let board = ConsultationBoard::new(Arc::new(db), Some(test_admin("a-1")));
        let old_row = test_consultation_row(1, "s-1", None, ConsultationStatus::Pending);
        let new_row = test_consultation_row(2, "s-1", None, ConsultationStatus::Pending);

        let first = board.begin_refresh().await;
        let second = board.begin_refresh().await;

        let applied = board
            .finish_refresh(
                second,
                Ok(vec![ConsultationView {
                    consultation: new_row,
                    mentor_name: None,
                }]),
            )
            .await;
        // the older request resolves last
        let dropped = board
            .finish_refresh(
                first,
                Ok(vec![ConsultationView {
                    consultation: old_row,
                    mentor_name: None,
                }]),
            )
            .await;

        assert_eq!(applied, RefreshOutcome::Applied);
        assert_eq!(dropped, RefreshOutcome::Superseded);
        let state = board.snapshot().await;
        assert_eq!(state.consultations.len(), 1);
        assert_eq!(state.consultations[0].consultation.id, 2);
    }

    #[tokio::test]
    async fn test_mutation_failure_is_recorded_and_returned() -> Result<()> {
        let db = setup_test_db().await?;
        let board = ConsultationBoard::new(Arc::new(db), None);

        let result = board.create(test_new_consultation("X", "Y")).await;
        assert!(matches!(result, Err(Error::AuthenticationRequired)));

        let state = board.snapshot().await;
        assert_eq!(state.error.as_deref(), Some("Please sign in to continue."));
        assert!(!state.busy);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_on_accept_is_returned() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_errors([DbErr::Custom("write rejected".to_string())])
            .into_connection();
        let board = ConsultationBoard::new(Arc::new(db), Some(test_mentor("m-1", "A")));

        let result = board.accept(1, None).await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(
            board.snapshot().await.error.as_deref(),
            Some(STORE_FAILURE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_end_to_end_consultation_flow() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        let student = test_student("s-1");
        let mentor = test_mentor("m-1", "Dr. Sara Ahmed");
        let other_mentor = test_mentor("m-2", "Omar Hassan");
        directory::upsert_user(&db, &mentor).await?;

        let student_board = ConsultationBoard::new(Arc::clone(&db), Some(student));
        let mentor_board = ConsultationBoard::new(Arc::clone(&db), Some(mentor));
        let other_board = ConsultationBoard::new(Arc::clone(&db), Some(other_mentor));

        // student requests
        let created = student_board.create(test_new_consultation("X", "Y")).await?;
        let state = student_board.snapshot().await;
        assert_eq!(state.consultations.len(), 1);
        assert_eq!(
            state.consultations[0].consultation.status,
            ConsultationStatus::Pending
        );
        assert_eq!(state.consultations[0].consultation.mentor_id, None);

        // consultant accepts
        mentor_board.refresh().await;
        mentor_board.accept(created.id, None).await?;
        student_board.refresh().await;
        for board in [&student_board, &mentor_board] {
            let state = board.snapshot().await;
            let view = &state.consultations[0];
            assert_eq!(view.consultation.status, ConsultationStatus::Scheduled);
            assert_eq!(view.consultation.mentor_id.as_deref(), Some("m-1"));
            assert_eq!(view.mentor_name.as_deref(), Some("Dr. Sara Ahmed"));
        }

        // consultant completes with a rating
        mentor_board
            .update(
                created.id,
                ConsultationPatch {
                    status: Some(ConsultationStatus::Completed),
                    completed_at: Some(chrono::Utc::now()),
                    rating: Some(5),
                    ..ConsultationPatch::default()
                },
            )
            .await?;

        student_board.refresh().await;
        let state = student_board.snapshot().await;
        let completed = report::filter_consultations(
            &state.consultations,
            &ConsultationFilter {
                status: Some(ConsultationStatus::Completed),
                ..ConsultationFilter::default()
            },
        );
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].consultation.rating, Some(5));

        other_board.refresh().await;
        let state = other_board.snapshot().await;
        let partition = report::partition_for_mentor(&state.consultations, "m-2");
        assert!(partition.unassigned.is_empty());
        assert!(partition.mine.is_empty());
        Ok(())
    }
}
