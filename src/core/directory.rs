//! Consultant and user directory lookups.
//!
//! The directory is reference data: users are upserted when they sign in and
//! consultants are seeded from configuration. Nothing in the consultation lifecycle
//! writes to either table.

use crate::{
    config::settings::ConsultantConfig,
    core::auth::AuthUser,
    entities::{Consultant, User, consultant, user},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

/// Looks up a user by id, returning None when the id is unknown.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: &str) -> Result<Option<user::Model>> {
    User::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts the signed-in user into the directory, or refreshes their profile fields.
pub async fn upsert_user(db: &DatabaseConnection, auth_user: &AuthUser) -> Result<user::Model> {
    let existing = User::find_by_id(auth_user.id.clone()).one(db).await?;

    if let Some(existing) = existing {
        let mut active: user::ActiveModel = existing.into();
        active.name = Set(auth_user.name.clone());
        active.email = Set(auth_user.email.clone());
        active.phone = Set(auth_user.phone.clone());
        active.role = Set(auth_user.role);
        return active.update(db).await.map_err(Into::into);
    }

    let active = user::ActiveModel {
        id: Set(auth_user.id.clone()),
        name: Set(auth_user.name.clone()),
        email: Set(auth_user.email.clone()),
        phone: Set(auth_user.phone.clone()),
        role: Set(auth_user.role),
    };
    active.insert(db).await.map_err(Into::into)
}

/// Retrieves every consultant in the directory, ordered alphabetically by name.
pub async fn get_all_consultants(db: &DatabaseConnection) -> Result<Vec<consultant::Model>> {
    Consultant::find()
        .order_by_asc(consultant::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a consultant by id.
pub async fn get_consultant_by_id(
    db: &DatabaseConnection,
    consultant_id: &str,
) -> Result<Option<consultant::Model>> {
    Consultant::find_by_id(consultant_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Seeds the consultant directory from configuration.
///
/// Entries whose id already exists are left alone, so running this on every start is
/// safe. Returns the number of consultants inserted.
#[instrument(skip(db, entries), fields(entries = entries.len()))]
pub async fn seed_consultants(
    db: &DatabaseConnection,
    entries: &[ConsultantConfig],
) -> Result<usize> {
    let mut inserted = 0;

    for entry in entries {
        if Consultant::find_by_id(entry.id.clone()).one(db).await?.is_some() {
            debug!("Consultant '{}' already present, skipping", entry.id);
            continue;
        }

        let active = consultant::ActiveModel {
            id: Set(entry.id.clone()),
            name: Set(entry.name.trim().to_string()),
            title: Set(entry.title.clone()),
            specialties: Set(entry.specialties.clone().into()),
            rating: Set(entry.rating),
            reviews_count: Set(entry.reviews_count),
            experience: Set(entry.experience.clone()),
            hourly_rate: Set(entry.hourly_rate),
            availability: Set(entry.availability.clone()),
            languages: Set(entry.languages.clone().into()),
            location: Set(entry.location.clone()),
        };
        active.insert(db).await?;
        inserted += 1;
    }

    info!("Seeded {} consultant(s)", inserted);
    Ok(inserted)
}

/// Filters a loaded consultant list for the directory page.
///
/// `query` matches case-insensitively against name, title and specialties; an empty
/// query matches everyone. `specialty`, when given, must be one of the consultant's
/// specialties (case-insensitive).
#[must_use]
pub fn search_consultants<'a>(
    consultants: &'a [consultant::Model],
    query: &str,
    specialty: Option<&str>,
) -> Vec<&'a consultant::Model> {
    let needle = query.trim().to_lowercase();

    consultants
        .iter()
        .filter(|c| specialty.is_none_or(|s| c.specialties.contains_ignore_case(s)))
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.title.to_lowercase().contains(&needle)
                || c
                    .specialties
                    .0
                    .iter()
                    .any(|s| s.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::auth::UserRole;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_upsert_and_get_user() -> Result<()> {
        let db = setup_test_db().await?;
        let mut student = test_student("s-1");

        upsert_user(&db, &student).await?;
        student.name = "Renamed Student".to_string();
        upsert_user(&db, &student).await?;

        let found = get_user_by_id(&db, "s-1").await?.unwrap();
        assert_eq!(found.name, "Renamed Student");
        assert_eq!(found.role, UserRole::Student);

        assert!(get_user_by_id(&db, "missing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_consultants_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let entries = vec![
            test_consultant_config("c-2", "Omar Hassan", None),
            test_consultant_config("c-1", "Dr. Sara Ahmed", Some(200.0)),
        ];

        assert_eq!(seed_consultants(&db, &entries).await?, 2);
        assert_eq!(seed_consultants(&db, &entries).await?, 0);

        let all = get_all_consultants(&db).await?;
        assert_eq!(all.len(), 2);
        // alphabetical
        assert_eq!(all[0].name, "Dr. Sara Ahmed");
        assert_eq!(all[0].specialties.0, vec!["Web Development".to_string()]);

        let sara = get_consultant_by_id(&db, "c-1").await?.unwrap();
        assert_eq!(sara.hourly_rate, Some(200.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_consultants() -> Result<()> {
        let db = setup_test_db().await?;
        let mut career = test_consultant_config("c-2", "Omar Hassan", None);
        career.title = "Career Coach".to_string();
        career.specialties = vec!["Interviews".to_string()];
        seed_consultants(
            &db,
            &[test_consultant_config("c-1", "Dr. Sara Ahmed", None), career],
        )
        .await?;
        let all = get_all_consultants(&db).await?;

        assert_eq!(search_consultants(&all, "", None).len(), 2);
        assert_eq!(search_consultants(&all, "coach", None)[0].id, "c-2");
        assert_eq!(search_consultants(&all, "WEB", None)[0].id, "c-1");
        assert_eq!(
            search_consultants(&all, "", Some("interviews"))[0].id,
            "c-2"
        );
        assert!(search_consultants(&all, "sara", Some("Interviews")).is_empty());
        Ok(())
    }
}
