//! Resolves a document submitter to a relational user row.

use diesel::prelude::*;
use roadreport_core::reports::synthetic_email;
use roadreport_core::Result;

use crate::errors::StorageError;
use crate::schema::users;

/// Finds the shadow user for a mobile submitter by synthetic email, creating
/// it on first sight. Runs on the caller's connection so it participates in
/// the surrounding ingestion transaction.
pub(crate) fn resolve_or_create_user(
    conn: &mut SqliteConnection,
    submitter_id: &str,
) -> Result<i64> {
    let email = synthetic_email(submitter_id);

    let existing = users::table
        .filter(users::email.eq(&email))
        .select(users::id)
        .first::<i64>(conn)
        .optional()
        .map_err(StorageError::from)?;
    if let Some(user_id) = existing {
        return Ok(user_id);
    }

    let user_id = diesel::insert_into(users::table)
        .values((users::username.eq(submitter_id), users::email.eq(&email)))
        .returning(users::id)
        .get_result::<i64>(conn)
        .map_err(StorageError::from)?;
    log::debug!("created shadow user {email} (id {user_id})");
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};

    #[test]
    fn resolver_is_idempotent_per_submitter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("resolver.db");
        let pool = create_pool(db_path.to_str().expect("db path")).expect("pool");
        let mut conn = pool.get().expect("connection");
        run_migrations(&mut conn).expect("migrations");

        let first = resolve_or_create_user(&mut conn, "u1").expect("first resolve");
        let second = resolve_or_create_user(&mut conn, "u1").expect("second resolve");
        let other = resolve_or_create_user(&mut conn, "u2").expect("other resolve");

        assert_eq!(first, second);
        assert_ne!(first, other);

        let email = users::table
            .filter(users::id.eq(first))
            .select(users::email)
            .first::<String>(&mut conn)
            .expect("email");
        assert_eq!(email, "u1@local");
    }
}
