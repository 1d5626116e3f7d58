use chrono::{DateTime, Utc};
use roadsheet_core::{Audience, Role, SheetStatus};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;

/// User account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Fields of an account about to be created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Road sheet as stored
#[derive(Debug, Clone)]
pub struct Sheet {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub miles: f64,
    pub status: SheetStatus,
    pub materials: Value,
    pub driver_id: Uuid,
    pub job_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sheet with the names of its driver, job and vehicle
#[derive(Debug, Clone)]
pub struct SheetRecord {
    pub sheet: Sheet,
    pub driver_name: String,
    pub driver_email: String,
    pub job_name: Option<String>,
    pub vehicle_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSheet {
    pub date: DateTime<Utc>,
    pub notes: String,
    pub miles: f64,
    pub materials: Value,
    pub driver_id: Uuid,
}

/// Replacement values written by a sheet edit
#[derive(Debug, Clone)]
pub struct SheetChanges {
    pub date: DateTime<Utc>,
    pub notes: String,
    pub miles: f64,
    pub materials: Value,
}

/// Announcement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub published: bool,
}

/// Message together with the viewer's read state
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub read: bool,
}

/// Row counts shown on the admin dashboard
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct Stats {
    pub users: i64,
    pub sheets: i64,
    pub jobs: i64,
    pub vehicles: i64,
}

/// User database row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| AppError::Internal(format!("user {}: {}", row.id, e)))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

/// Sheet row joined with driver, job and vehicle names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SheetRow {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub miles: f64,
    pub status: String,
    pub materials: Value,
    pub driver_id: Uuid,
    pub job_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub driver_name: String,
    pub driver_email: String,
    pub job_name: Option<String>,
    pub vehicle_label: Option<String>,
}

impl TryFrom<SheetRow> for SheetRecord {
    type Error = AppError;

    fn try_from(row: SheetRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| AppError::Internal(format!("sheet {}: {}", row.id, e)))?;
        Ok(Self {
            sheet: Sheet {
                id: row.id,
                date: row.date,
                notes: row.notes,
                miles: row.miles,
                status,
                materials: row.materials,
                driver_id: row.driver_id,
                job_id: row.job_id,
                vehicle_id: row.vehicle_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            driver_name: row.driver_name,
            driver_email: row.driver_email,
            job_name: row.job_name,
            vehicle_label: row.vehicle_label,
        })
    }
}

/// Message database row, with the viewer's read state when queried for one
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub read: bool,
}

impl TryFrom<MessageRow> for MessageView {
    type Error = AppError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let audience = row
            .audience
            .parse()
            .map_err(|e| AppError::Internal(format!("message {}: {}", row.id, e)))?;
        Ok(Self {
            message: Message {
                id: row.id,
                title: row.title,
                body: row.body,
                audience,
                published: row.published,
                created_at: row.created_at,
            },
            read: row.read,
        })
    }
}
