//! User entity - The user directory used to resolve display names.
//!
//! Ids are the identity provider's opaque user ids.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User directory model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Identity provider user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional contact phone
    pub phone: Option<String>,
    /// Role that decides what the user may see
    pub role: UserRole,
}

/// Users are referenced by id from other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Role of a signed-in user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Requests consultations
    #[sea_orm(string_value = "student")]
    Student,
    /// Fulfils consultations
    #[sea_orm(string_value = "consultant")]
    Consultant,
    /// Fulfils consultations, same visibility as a consultant
    #[sea_orm(string_value = "teacher")]
    Teacher,
    /// Sees everything
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Consultants and teachers act as mentors.
    #[must_use]
    pub const fn is_mentor(self) -> bool {
        matches!(self, Self::Consultant | Self::Teacher)
    }
}
