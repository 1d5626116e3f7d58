#[cfg(test)]
pub mod memory;
pub mod models;

use async_trait::async_trait;
use roadsheet_core::{Audience, Role, SheetStatus};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use models::{
    Message, MessageRow, MessageView, NewMessage, NewSheet, NewUser, SheetChanges, SheetRecord,
    SheetRow, Stats, User, UserRow,
};

/// Persistence used by the HTTP handlers
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert an account; a taken email is a `Conflict`
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Newest sheets first, limited to one driver when `driver` is set
    async fn list_sheets(
        &self,
        driver: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<SheetRecord>, AppError>;

    async fn get_sheet(&self, id: Uuid) -> Result<Option<SheetRecord>, AppError>;

    async fn create_sheet(&self, sheet: NewSheet) -> Result<Uuid, AppError>;

    async fn update_sheet(&self, id: Uuid, changes: SheetChanges) -> Result<(), AppError>;

    async fn set_sheet_status(&self, id: Uuid, status: SheetStatus) -> Result<(), AppError>;

    /// Returns false when there was no such sheet
    async fn delete_sheet(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_message(&self, message: NewMessage) -> Result<Message, AppError>;

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, AppError>;

    /// Published messages visible to `role`, newest first, with `user`'s read state
    async fn list_messages(&self, user: Uuid, role: Role) -> Result<Vec<MessageView>, AppError>;

    /// Published, visible messages `user` has not read yet
    async fn unread_messages(
        &self,
        user: Uuid,
        role: Role,
        limit: i64,
    ) -> Result<Vec<Message>, AppError>;

    /// Record read markers; existing markers and unknown ids are skipped
    async fn mark_read(&self, user: Uuid, ids: &[Uuid]) -> Result<(), AppError>;

    async fn stats(&self) -> Result<Stats, AppError>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

const SHEET_SELECT: &str = r#"
    SELECT s.id, s.date, s.notes, s.miles, s.status, s.materials, s.driver_id, s.job_id,
           s.vehicle_id, s.created_at, s.updated_at,
           u.name AS driver_name, u.email AS driver_email,
           j.name AS job_name, v.label AS vehicle_label
    FROM sheets s
    JOIN users u ON u.id = s.driver_id
    LEFT JOIN jobs j ON j.id = s.job_id
    LEFT JOIN vehicles v ON v.id = s.vehicle_id
"#;

fn visible_tags(role: Role) -> Vec<String> {
    Audience::visible_tags(role).map(String::from).to_vec()
}

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => User::try_from(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_sheets(
        &self,
        driver: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<SheetRecord>, AppError> {
        let rows = sqlx::query_as::<_, SheetRow>(&format!(
            "{} WHERE ($1::uuid IS NULL OR s.driver_id = $1) ORDER BY s.created_at DESC LIMIT $2",
            SHEET_SELECT
        ))
        .bind(driver)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SheetRecord::try_from).collect()
    }

    async fn get_sheet(&self, id: Uuid) -> Result<Option<SheetRecord>, AppError> {
        let row = sqlx::query_as::<_, SheetRow>(&format!("{} WHERE s.id = $1", SHEET_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SheetRecord::try_from).transpose()
    }

    async fn create_sheet(&self, sheet: NewSheet) -> Result<Uuid, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO sheets (date, notes, miles, materials, driver_id)
               VALUES ($1, $2, $3, $4, $5) RETURNING id"#,
        )
        .bind(sheet.date)
        .bind(&sheet.notes)
        .bind(sheet.miles)
        .bind(&sheet.materials)
        .bind(sheet.driver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_sheet(&self, id: Uuid, changes: SheetChanges) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE sheets SET date = $1, notes = $2, miles = $3, materials = $4, updated_at = NOW()
               WHERE id = $5"#,
        )
        .bind(changes.date)
        .bind(&changes.notes)
        .bind(changes.miles)
        .bind(&changes.materials)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Not found".to_string()));
        }
        Ok(())
    }

    async fn set_sheet_status(&self, id: Uuid, status: SheetStatus) -> Result<(), AppError> {
        let result =
            sqlx::query(r#"UPDATE sheets SET status = $1, updated_at = NOW() WHERE id = $2"#)
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Not found".to_string()));
        }
        Ok(())
    }

    async fn delete_sheet(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM sheets WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"INSERT INTO messages (title, body, audience, published) VALUES ($1, $2, $3, $4)
               RETURNING id, title, body, audience, published, created_at"#,
        )
        .bind(&message.title)
        .bind(&message.body)
        .bind(message.audience.as_str())
        .bind(message.published)
        .fetch_one(&self.pool)
        .await?;

        Ok(MessageView::try_from(row)?.message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"SELECT id, title, body, audience, published, created_at FROM messages WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MessageView::try_from).transpose()?.map(|view| view.message))
    }

    async fn list_messages(&self, user: Uuid, role: Role) -> Result<Vec<MessageView>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"SELECT m.id, m.title, m.body, m.audience, m.published, m.created_at,
                      EXISTS (
                          SELECT 1 FROM message_reads r
                          WHERE r.message_id = m.id AND r.user_id = $1
                      ) AS read
               FROM messages m
               WHERE m.published AND m.audience = ANY($2)
               ORDER BY m.created_at DESC"#,
        )
        .bind(user)
        .bind(visible_tags(role))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MessageView::try_from).collect()
    }

    async fn unread_messages(
        &self,
        user: Uuid,
        role: Role,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"SELECT m.id, m.title, m.body, m.audience, m.published, m.created_at
               FROM messages m
               WHERE m.published AND m.audience = ANY($2)
                 AND NOT EXISTS (
                     SELECT 1 FROM message_reads r
                     WHERE r.message_id = m.id AND r.user_id = $1
                 )
               ORDER BY m.created_at DESC
               LIMIT $3"#,
        )
        .bind(user)
        .bind(visible_tags(role))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| MessageView::try_from(row).map(|view| view.message))
            .collect()
    }

    async fn mark_read(&self, user: Uuid, ids: &[Uuid]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"INSERT INTO message_reads (user_id, message_id)
               SELECT $1, m.id FROM messages m WHERE m.id = ANY($2)
               ON CONFLICT (user_id, message_id) DO NOTHING"#,
        )
        .bind(user)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stats(&self) -> Result<Stats, AppError> {
        let stats = sqlx::query_as::<_, Stats>(
            r#"SELECT (SELECT COUNT(*) FROM users) AS users,
                      (SELECT COUNT(*) FROM sheets) AS sheets,
                      (SELECT COUNT(*) FROM jobs) AS jobs,
                      (SELECT COUNT(*) FROM vehicles) AS vehicles"#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
