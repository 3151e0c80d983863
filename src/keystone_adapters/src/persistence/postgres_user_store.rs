use async_trait::async_trait;
use keystone_core::{Email, TxScope, User, UserId, UserStore, UserStoreError};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use super::{
    postgres_transaction::{PgExecutor, PgTransaction, is_serialization_failure, is_unique_violation},
    user_record::UserRecord,
};

const SELECT_USER: &str = r#"
    SELECT id, email, password_hash, confirmed,
           refresh_token, refresh_token_expires_at,
           register_token, register_token_expires_at
    FROM users
"#;

#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresUserStore { pool }
    }

    async fn fetch_one_where(
        &self,
        scope: &TxScope<PgTransaction>,
        condition: &str,
        value: &str,
    ) -> Result<User, UserStoreError> {
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;
        let sql = format!("{SELECT_USER} WHERE {condition} = $1");

        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(value)
            .fetch_optional(executor.connection().map_err(store_error)?)
            .await
            .map_err(store_error)?
            .ok_or(UserStoreError::UserNotFound)?;

        User::try_from(record)
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    type Handle = PgTransaction;

    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn create(&self, scope: &TxScope<PgTransaction>, user: &User) -> Result<(), UserStoreError> {
        let record = UserRecord::from(user);
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;

        sqlx::query(
            r#"
                INSERT INTO users (
                    id, email, password_hash, confirmed,
                    refresh_token, refresh_token_expires_at,
                    register_token, register_token_expires_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.confirmed)
        .bind(&record.refresh_token)
        .bind(record.refresh_token_expires_at)
        .bind(&record.register_token)
        .bind(record.register_token_expires_at)
        .execute(executor.connection().map_err(store_error)?)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return UserStoreError::UserAlreadyExists;
            }
            store_error(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Updating user in PostgreSQL", skip_all)]
    async fn update(&self, scope: &TxScope<PgTransaction>, user: &User) -> Result<(), UserStoreError> {
        let record = UserRecord::from(user);
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;

        let result = sqlx::query(
            r#"
                UPDATE users
                SET email = $2,
                    password_hash = $3,
                    confirmed = $4,
                    refresh_token = $5,
                    refresh_token_expires_at = $6,
                    register_token = $7,
                    register_token_expires_at = $8
                WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.confirmed)
        .bind(&record.refresh_token)
        .bind(record.refresh_token_expires_at)
        .bind(&record.register_token)
        .bind(record.register_token_expires_at)
        .execute(executor.connection().map_err(store_error)?)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return UserStoreError::UserAlreadyExists;
            }
            store_error(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::UserNotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Retrieving user by id from PostgreSQL", skip_all)]
    async fn get_by_id(
        &self,
        scope: &TxScope<PgTransaction>,
        id: UserId,
    ) -> Result<User, UserStoreError> {
        let mut executor = PgExecutor::acquire(&self.pool, scope)
            .await
            .map_err(store_error)?;
        let sql = format!("{SELECT_USER} WHERE id = $1");

        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(executor.connection().map_err(store_error)?)
            .await
            .map_err(store_error)?
            .ok_or(UserStoreError::UserNotFound)?;

        User::try_from(record)
    }

    #[tracing::instrument(name = "Retrieving user by email from PostgreSQL", skip_all)]
    async fn get_by_email(
        &self,
        scope: &TxScope<PgTransaction>,
        email: &Email,
    ) -> Result<User, UserStoreError> {
        self.fetch_one_where(scope, "email", email.as_ref().expose_secret())
            .await
    }

    #[tracing::instrument(name = "Retrieving user by refresh token from PostgreSQL", skip_all)]
    async fn get_by_refresh_token(
        &self,
        scope: &TxScope<PgTransaction>,
        refresh_token: &str,
    ) -> Result<User, UserStoreError> {
        self.fetch_one_where(scope, "refresh_token", refresh_token)
            .await
    }
}

fn store_error(error: sqlx::Error) -> UserStoreError {
    if is_serialization_failure(&error) {
        UserStoreError::SerializationConflict
    } else {
        UserStoreError::UnexpectedError(error.to_string())
    }
}
