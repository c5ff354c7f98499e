//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database and building users, consultations
//! and catalog items with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::settings::ConsultantConfig,
    core::{
        auth::{AuthUser, UserRole},
        consultation::{self, NewConsultation},
        pricing::CatalogItem,
    },
    entities::consultation::{
        ConsultationMethod, ConsultationStatus, ConsultationType, Model as ConsultationModel,
        SessionDuration,
    },
    errors::Result,
};
use chrono::{TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

fn test_user(id: &str, name: &str, role: UserRole) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        role,
        name: name.to_string(),
        email: format!("{id}@campus.test"),
        phone: None,
    }
}

/// A signed-in student.
pub fn test_student(id: &str) -> AuthUser {
    test_user(id, "Test Student", UserRole::Student)
}

/// A signed-in consultant.
pub fn test_mentor(id: &str, name: &str) -> AuthUser {
    test_user(id, name, UserRole::Consultant)
}

/// A signed-in admin.
pub fn test_admin(id: &str) -> AuthUser {
    test_user(id, "Test Admin", UserRole::Admin)
}

/// A technical consultation request with default method and duration.
pub fn test_new_consultation(topic: &str, description: &str) -> NewConsultation {
    NewConsultation {
        topic: topic.to_string(),
        description: description.to_string(),
        consultation_type: ConsultationType::Technical,
        method: None,
        duration: None,
        preferred_date: None,
    }
}

/// Creates a pending consultation for `student_id`.
pub async fn create_test_consultation(
    db: &DatabaseConnection,
    student_id: &str,
) -> Result<ConsultationModel> {
    consultation::create_consultation(
        db,
        Some(&test_student(student_id)),
        test_new_consultation("Test topic", "Test description"),
    )
    .await
}

/// A consultation row as the store would return it, for mock databases and
/// read-model tests.
pub fn test_consultation_row(
    id: i64,
    student_id: &str,
    mentor_id: Option<&str>,
    status: ConsultationStatus,
) -> ConsultationModel {
    ConsultationModel {
        id,
        student_id: student_id.to_string(),
        mentor_id: mentor_id.map(ToString::to_string),
        topic: format!("Topic {id}"),
        description: format!("Description {id}"),
        consultation_type: ConsultationType::Technical,
        method: ConsultationMethod::Video,
        duration: SessionDuration::Hour,
        status,
        scheduled_date: None,
        preferred_date: None,
        completed_at: None,
        rating: None,
        feedback: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        updated_at: None,
    }
}

/// A consultant directory entry with one specialty.
pub fn test_consultant_config(id: &str, name: &str, hourly_rate: Option<f64>) -> ConsultantConfig {
    ConsultantConfig {
        id: id.to_string(),
        name: name.to_string(),
        title: "Senior Software Engineer".to_string(),
        specialties: vec!["Web Development".to_string()],
        rating: 4.8,
        reviews_count: 12,
        experience: "8 years".to_string(),
        hourly_rate,
        availability: "Available today".to_string(),
        languages: vec!["Arabic".to_string(), "English".to_string()],
        location: "Riyadh".to_string(),
    }
}

/// A catalog item.
pub fn test_item(id: &str, price: f64) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("Item {id}"),
        price,
    }
}
