use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    models::{Notification, NotificationInput, User, UserChanges},
    pagination::PageRequest,
};

/// Repository
///
/// Persistence contract used by the handlers. Handlers never see SQL; tests swap in
/// an in-memory implementation.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn count_users(&self) -> Result<i64, sqlx::Error>;
    async fn list_users(&self, page: &PageRequest) -> Result<Vec<User>, sqlx::Error>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    /// Matches either the username or the email.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error>;
    async fn create_user(&self, user: UserChanges) -> Result<User, sqlx::Error>;
    /// Only the `Some` fields of `changes` are written.
    async fn update_user(&self, id: i64, changes: UserChanges)
    -> Result<Option<User>, sqlx::Error>;
    /// Returns the deleted row, if there was one.
    async fn delete_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn delete_users(&self, ids: &[i64]) -> Result<u64, sqlx::Error>;

    // --- Notifications ---
    async fn count_notifications(&self) -> Result<i64, sqlx::Error>;
    async fn list_notifications(&self, page: &PageRequest)
    -> Result<Vec<Notification>, sqlx::Error>;
    async fn get_notification(&self, id: i64) -> Result<Option<Notification>, sqlx::Error>;
    async fn create_notification(
        &self,
        input: NotificationInput,
    ) -> Result<Notification, sqlx::Error>;
    async fn update_notification(
        &self,
        id: i64,
        input: NotificationInput,
    ) -> Result<Option<Notification>, sqlx::Error>;
    async fn delete_notification(&self, id: i64) -> Result<Option<Notification>, sqlx::Error>;
    async fn delete_notifications(&self, ids: &[i64]) -> Result<u64, sqlx::Error>;
}

pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, username, name, password, email, gender, institute, \
     arrival_date, departure_date, room, diet_requirement, talk_title, talk_abstract, \
     phone, status, authority, created_at, updated_at";

const NOTIFICATION_COLUMNS: &str = "id, title, content, created_at, updated_at";

/// PostgresRepository
///
/// `Repository` backed by a Postgres pool. Queries are built at runtime; ORDER BY
/// clauses only ever contain whitelisted column names from `PageRequest`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn count_users(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    async fn list_users(&self, page: &PageRequest) -> Result<Vec<User>, sqlx::Error> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {} LIMIT $1 OFFSET $2",
            page.order_by()
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(page.page_size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1 ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_user
    ///
    /// Missing fields take the column defaults: empty strings, `status = false`,
    /// `authority = 'user'`.
    async fn create_user(&self, user: UserChanges) -> Result<User, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (
                username, name, password, email, gender, institute, arrival_date,
                departure_date, room, diet_requirement, talk_title, talk_abstract,
                phone, status, authority
            ) VALUES (
                COALESCE($1, ''), COALESCE($2, ''), $3, COALESCE($4, ''), COALESCE($5, ''),
                COALESCE($6, ''), $7, $8, COALESCE($9, ''), COALESCE($10, ''),
                COALESCE($11, ''), COALESCE($12, ''), COALESCE($13, ''),
                COALESCE($14, false), COALESCE($15, 'user')
            )
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.username)
            .bind(user.name)
            .bind(user.password_hash)
            .bind(user.email)
            .bind(user.gender)
            .bind(user.institute)
            .bind(user.arrival_date)
            .bind(user.departure_date)
            .bind(user.room)
            .bind(user.diet_requirement)
            .bind(user.talk_title)
            .bind(user.talk_abstract)
            .bind(user.phone)
            .bind(user.status)
            .bind(user.authority)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                name = COALESCE($3, name),
                password = COALESCE($4, password),
                email = COALESCE($5, email),
                gender = COALESCE($6, gender),
                institute = COALESCE($7, institute),
                arrival_date = COALESCE($8, arrival_date),
                departure_date = COALESCE($9, departure_date),
                room = COALESCE($10, room),
                diet_requirement = COALESCE($11, diet_requirement),
                talk_title = COALESCE($12, talk_title),
                talk_abstract = COALESCE($13, talk_abstract),
                phone = COALESCE($14, phone),
                status = COALESCE($15, status),
                authority = COALESCE($16, authority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.username)
            .bind(changes.name)
            .bind(changes.password_hash)
            .bind(changes.email)
            .bind(changes.gender)
            .bind(changes.institute)
            .bind(changes.arrival_date)
            .bind(changes.departure_date)
            .bind(changes.room)
            .bind(changes.diet_requirement)
            .bind(changes.talk_title)
            .bind(changes.talk_abstract)
            .bind(changes.phone)
            .bind(changes.status)
            .bind(changes.authority)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_users(&self, ids: &[i64]) -> Result<u64, sqlx::Error> {
        delete_many(&self.pool, "users", ids).await
    }

    async fn count_notifications(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await
    }

    async fn list_notifications(
        &self,
        page: &PageRequest,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications {} LIMIT $1 OFFSET $2",
            page.order_by()
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(page.page_size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
    }

    async fn get_notification(&self, id: i64) -> Result<Option<Notification>, sqlx::Error> {
        let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_notification(
        &self,
        input: NotificationInput,
    ) -> Result<Notification, sqlx::Error> {
        let sql = format!(
            "INSERT INTO notifications (title, content) VALUES (COALESCE($1, ''), COALESCE($2, '')) \
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(input.title)
            .bind(input.content)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_notification(
        &self,
        id: i64,
        input: NotificationInput,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let sql = format!(
            "UPDATE notifications SET title = COALESCE($2, title), content = COALESCE($3, content), \
             updated_at = NOW() WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(input.title)
            .bind(input.content)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_notification(&self, id: i64) -> Result<Option<Notification>, sqlx::Error> {
        let sql =
            format!("DELETE FROM notifications WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}");
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_notifications(&self, ids: &[i64]) -> Result<u64, sqlx::Error> {
        delete_many(&self.pool, "notifications", ids).await
    }
}

async fn delete_many(pool: &PgPool, table: &'static str, ids: &[i64]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("DELETE FROM {table} WHERE id IN ("));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}
