//! Consultant entity - Read-mostly directory of mentors offering consultations.
//!
//! Rows are seeded from configuration; the consultation core never mutates them.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Consultant directory model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consultants")]
pub struct Model {
    /// Same id as the consultant's user record
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Job title, e.g. "Senior Software Engineer"
    pub title: String,
    /// Areas the consultant covers
    #[sea_orm(column_type = "Json")]
    pub specialties: Tags,
    /// Average rating shown in the directory
    pub rating: f64,
    /// Number of reviews behind the rating
    pub reviews_count: i32,
    /// Experience label, e.g. "8 years"
    pub experience: String,
    /// Hourly rate, None when not published
    pub hourly_rate: Option<f64>,
    /// Availability label, e.g. "Available today"
    pub availability: String,
    /// Languages the consultant speaks
    #[sea_orm(column_type = "Json")]
    pub languages: Tags,
    /// City or region
    pub location: String,
}

/// A list of short labels stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Tags(pub Vec<String>);

impl Tags {
    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.0.iter().any(|tag| tag.eq_ignore_ascii_case(needle))
    }
}

impl From<Vec<String>> for Tags {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

/// `Consultant` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
