use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{DbConn, DbErr, EntityTrait, PrimaryKeyTrait, RuntimeErr};

use agora_core::error::RepoError;
use agora_core::ports::BaseRepository;

/// Generic PostgreSQL repository: primary-key lookups and deletes for any
/// entity whose model converts into a domain record.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: Sync + Send,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Foreign keys from a row to the user acting on it. Breaking one means the
/// account was deleted while one of its sessions lived on.
const ACTOR_FOREIGN_KEYS: [&str; 2] = ["fk_votes_user", "fk_posts_creator"];

/// What Postgres reported about a failed statement, when it got that far.
#[derive(Debug, Default, PartialEq, Eq)]
struct PgFailure {
    code: Option<String>,
    constraint: Option<String>,
}

impl PgFailure {
    fn of(err: &DbErr) -> Self {
        let (DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime)) = err else {
            return Self::default();
        };
        let RuntimeErr::SqlxError(sqlx_err) = runtime else {
            return Self::default();
        };

        match sqlx_err.as_database_error() {
            Some(db_err) => Self {
                code: db_err.code().map(|code| code.into_owned()),
                constraint: db_err.constraint().map(str::to_owned),
            },
            None => Self::default(),
        }
    }
}

/// Translate a SeaORM error into the repository taxonomy.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    let failure = PgFailure::of(&err);
    classify(err, &failure)
}

fn classify(err: DbErr, failure: &PgFailure) -> RepoError {
    let message = err.to_string();

    match failure.code.as_deref() {
        Some(UNIQUE_VIOLATION) => return RepoError::Constraint(message),
        Some(FOREIGN_KEY_VIOLATION) => {
            let actor_gone = failure
                .constraint
                .as_deref()
                .is_some_and(|name| ACTOR_FOREIGN_KEYS.contains(&name));
            return if actor_gone {
                RepoError::MissingUser
            } else {
                RepoError::NotFound
            };
        }
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => return RepoError::Conflict(message),
        _ => {}
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(message),
        DbErr::RecordNotFound(_) => RepoError::NotFound,
        _ => RepoError::Query(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: &str, constraint: Option<&str>) -> PgFailure {
        PgFailure {
            code: Some(code.to_owned()),
            constraint: constraint.map(str::to_owned),
        }
    }

    fn exec_err() -> DbErr {
        DbErr::Exec(RuntimeErr::Internal("statement failed".into()))
    }

    #[test]
    fn test_unique_violation_is_constraint() {
        let err = classify(exec_err(), &failure("23505", Some("users_username_key")));
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[test]
    fn test_retryable_states_are_conflicts() {
        for code in ["40001", "40P01"] {
            let err = classify(exec_err(), &failure(code, None));
            assert!(matches!(err, RepoError::Conflict(_)), "{code} should retry");
        }
    }

    #[test]
    fn test_missing_post_reference_is_not_found() {
        let err = classify(exec_err(), &failure("23503", Some("fk_votes_post")));
        assert!(matches!(err, RepoError::NotFound));
    }

    #[test]
    fn test_missing_actor_reference_is_missing_user() {
        for constraint in ACTOR_FOREIGN_KEYS {
            let err = classify(exec_err(), &failure("23503", Some(constraint)));
            assert!(matches!(err, RepoError::MissingUser), "{constraint}");
        }
    }

    #[test]
    fn test_errors_without_sqlstate() {
        let none = PgFailure::default();

        let err = classify(DbErr::Conn(RuntimeErr::Internal("refused".into())), &none);
        assert!(matches!(err, RepoError::Connection(_)));

        let err = classify(DbErr::RecordNotFound("posts".into()), &none);
        assert!(matches!(err, RepoError::NotFound));

        // Wording alone never makes an error retryable.
        let err = classify(
            DbErr::Custom("could not serialize access due to concurrent update".into()),
            &none,
        );
        assert!(matches!(err, RepoError::Query(_)));
    }

    #[test]
    fn test_non_driver_errors_carry_no_sqlstate() {
        assert_eq!(PgFailure::of(&exec_err()), PgFailure::default());
        assert_eq!(
            PgFailure::of(&DbErr::Custom("boom".into())),
            PgFailure::default()
        );
    }
}
