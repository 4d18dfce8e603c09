use fleet::database::DatabaseError;

pub mod position;
pub mod route;
pub mod user;
pub mod vehicle;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            DatabaseError::Conflict(conflicting_field(db.constraint()).to_owned())
        }
        _ => DatabaseError::Other(Box::new(why)),
    }
}

/// Maps the unique constraints of the migrations back to the field they guard.
fn conflicting_field(constraint: Option<&str>) -> &str {
    match constraint {
        Some("users_email_unique") => "email",
        Some("vehicles_plate_unique") => "plate",
        Some(other) => other,
        None => "unique field",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_constraints_name_their_field() {
        assert_eq!(conflicting_field(Some("users_email_unique")), "email");
        assert_eq!(conflicting_field(Some("vehicles_plate_unique")), "plate");
        assert_eq!(conflicting_field(Some("other_key")), "other_key");
        assert_eq!(conflicting_field(None), "unique field");
    }

    #[test]
    fn missing_rows_are_not_found() {
        assert!(matches!(
            convert_error(sqlx::Error::RowNotFound),
            DatabaseError::NotFound
        ));
    }
}
