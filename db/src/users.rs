use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use log::info;

use crate::error::LedgerError;
use crate::models::{NewUser, User, UserRow};
use crate::schema::users;

/// Inserts a user. Uniqueness is enforced by the index on `username`, so two
/// concurrent registrations of one name cannot both succeed.
pub fn create_user(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    starting_cash: &BigDecimal,
) -> Result<User, LedgerError> {
    let new_user = NewUser {
        username,
        hash: password_hash,
        cash: starting_cash.to_string(),
    };

    let row = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(UserRow::as_returning())
        .get_result(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                LedgerError::UsernameTaken(username.to_string())
            }
            other => LedgerError::Query(other),
        })?;

    info!("Registered user {} ({})", row.id, row.username);
    User::try_from(row)
}

pub fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, LedgerError> {
    users::table
        .filter(users::username.eq(username))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .map(User::try_from)
        .transpose()
}

pub fn find(conn: &mut SqliteConnection, user_id: i32) -> Result<User, LedgerError> {
    users::table
        .find(user_id)
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(LedgerError::UserNotFound(user_id))
        .and_then(User::try_from)
}
