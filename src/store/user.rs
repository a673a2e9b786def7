use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::models::user::{NewUser, UserModel};
use crate::store::clause::{push_assignments, push_filter, push_id_match, push_insert, Fragment};

const SELECT_USERS: &str = "SELECT id, first_name, last_name, nickname, password, email, country, created_at, updated_at FROM users";

/// Storage for users. Identifiers and timestamps are owned by the implementation.
///
/// Ids arrive exactly as the caller sent them; an id the storage cannot
/// interpret is a storage error, not a miss.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<()>;

    /// All users matching every fragment, or every user when `filter` is empty.
    async fn list_users(&self, filter: &[Fragment]) -> anyhow::Result<Vec<UserModel>>;

    /// Returns the number of rows changed.
    async fn update_user(&self, id: &str, assignments: &[Fragment]) -> anyhow::Result<u64>;

    /// Returns the number of rows removed.
    async fn delete_user(&self, id: &str) -> anyhow::Result<u64>;
}

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[instrument(name = "Saving new user to database", skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<()> {
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO users");
        push_insert(&mut builder, user);

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                e
            })?;
        Ok(())
    }

    #[instrument(name = "Fetching users from database", skip(self, filter), fields(predicates = filter.len()))]
    async fn list_users(&self, filter: &[Fragment]) -> anyhow::Result<Vec<UserModel>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_USERS);
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY id");

        let users = builder
            .build_query_as::<UserModel>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch users: {:?}", e);
                e
            })?;
        Ok(users)
    }

    #[instrument(name = "Updating user in database", skip(self, assignments), fields(assignments = assignments.len()))]
    async fn update_user(&self, id: &str, assignments: &[Fragment]) -> anyhow::Result<u64> {
        if assignments.is_empty() {
            anyhow::bail!("refusing to update user {id} without assignments");
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users");
        push_assignments(&mut builder, assignments);
        push_id_match(&mut builder, id);

        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to update user: {:?}", e);
            e
        })?;
        Ok(result.rows_affected())
    }

    #[instrument(name = "Deleting user from database", skip(self))]
    async fn delete_user(&self, id: &str) -> anyhow::Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM users");
        push_id_match(&mut builder, id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user: {:?}", e);
                e
            })?;
        Ok(result.rows_affected())
    }
}
