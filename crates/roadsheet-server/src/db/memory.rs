//! In-process store backing the HTTP tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use roadsheet_core::{ReadMarkers, Role, SheetStatus};
use uuid::Uuid;

use super::models::{
    Message, MessageView, NewMessage, NewSheet, NewUser, Sheet, SheetChanges, SheetRecord, Stats,
    User,
};
use super::Store;
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sheets: Vec<Sheet>,
    messages: Vec<Message>,
    reads: ReadMarkers,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    pub fn read_marker_count(&self) -> usize {
        self.inner.lock().unwrap().reads.len()
    }

    pub fn sheet(&self, id: Uuid) -> Option<Sheet> {
        let inner = self.inner.lock().unwrap();
        inner.sheets.iter().find(|sheet| sheet.id == id).cloned()
    }

    fn record(inner: &Inner, sheet: &Sheet) -> SheetRecord {
        let driver = inner.users.iter().find(|user| user.id == sheet.driver_id);
        SheetRecord {
            sheet: sheet.clone(),
            driver_name: driver.map(|user| user.name.clone()).unwrap_or_default(),
            driver_email: driver.map(|user| user.email.clone()).unwrap_or_default(),
            job_name: None,
            vehicle_label: None,
        }
    }

    fn visible(inner: &Inner, role: Role) -> Vec<Message> {
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|message| message.published && message.audience.is_visible_to(role))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages
    }

    /// Later inserts get later timestamps even within one clock tick
    fn next_timestamp(count: usize) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::milliseconds(count as i64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|user| user.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn list_sheets(
        &self,
        driver: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<SheetRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut sheets: Vec<&Sheet> = inner
            .sheets
            .iter()
            .filter(|sheet| driver.map_or(true, |id| sheet.driver_id == id))
            .collect();
        sheets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sheets
            .into_iter()
            .take(limit as usize)
            .map(|sheet| Self::record(&inner, sheet))
            .collect())
    }

    async fn get_sheet(&self, id: Uuid) -> Result<Option<SheetRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sheets
            .iter()
            .find(|sheet| sheet.id == id)
            .map(|sheet| Self::record(&inner, sheet)))
    }

    async fn create_sheet(&self, sheet: NewSheet) -> Result<Uuid, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::next_timestamp(inner.sheets.len());
        let id = Uuid::new_v4();
        inner.sheets.push(Sheet {
            id,
            date: sheet.date,
            notes: sheet.notes,
            miles: sheet.miles,
            status: SheetStatus::Submitted,
            materials: sheet.materials,
            driver_id: sheet.driver_id,
            job_id: None,
            vehicle_id: None,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_sheet(&self, id: Uuid, changes: SheetChanges) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let sheet = inner
            .sheets
            .iter_mut()
            .find(|sheet| sheet.id == id)
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
        sheet.date = changes.date;
        sheet.notes = changes.notes;
        sheet.miles = changes.miles;
        sheet.materials = changes.materials;
        sheet.updated_at = Utc::now();
        Ok(())
    }

    async fn set_sheet_status(&self, id: Uuid, status: SheetStatus) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let sheet = inner
            .sheets
            .iter_mut()
            .find(|sheet| sheet.id == id)
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
        sheet.status = status;
        Ok(())
    }

    async fn delete_sheet(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.sheets.len();
        inner.sheets.retain(|sheet| sheet.id != id);
        Ok(inner.sheets.len() < before)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let message = Message {
            id: Uuid::new_v4(),
            title: message.title,
            body: message.body,
            audience: message.audience,
            published: message.published,
            created_at: Self::next_timestamp(inner.messages.len()),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.messages.iter().find(|message| message.id == id).cloned())
    }

    async fn list_messages(&self, user: Uuid, role: Role) -> Result<Vec<MessageView>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::visible(&inner, role)
            .into_iter()
            .map(|message| MessageView {
                read: inner.reads.is_read(user, message.id),
                message,
            })
            .collect())
    }

    async fn unread_messages(
        &self,
        user: Uuid,
        role: Role,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::visible(&inner, role)
            .into_iter()
            .filter(|message| !inner.reads.is_read(user, message.id))
            .take(limit as usize)
            .collect())
    }

    async fn mark_read(&self, user: Uuid, ids: &[Uuid]) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        for id in ids {
            if inner.messages.iter().any(|message| message.id == *id) {
                inner.reads.mark(user, *id);
            }
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Stats, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(Stats {
            users: inner.users.len() as i64,
            sheets: inner.sheets.len() as i64,
            jobs: 0,
            vehicles: 0,
        })
    }
}
