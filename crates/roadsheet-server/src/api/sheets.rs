use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use roadsheet_core::{
    coerce_miles, layout_report, merge_over, normalize, normalize::coerce_text, Materials,
    Metrics, ReportSheet, SearchFields, Shape, SheetStatus, StoredMaterials,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::ResourceId;
use crate::auth::Session;
use crate::db::models::{NewSheet, SheetChanges, SheetRecord};
use crate::error::AppError;
use crate::mail::{Attachment, OutgoingEmail};
use crate::{pdf, AppState};

const LIST_LIMIT: i64 = 100;
/// Rows scanned for a text search before the page is cut to `LIST_LIMIT`
const SEARCH_WINDOW: i64 = 1000;

const CONFIRM_TEXT: &str = "Attached is the confirmed road sheet PDF.";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Row of the sheet list
#[derive(Debug, Serialize)]
pub struct SheetSummary {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub status: SheetStatus,
    pub miles: f64,
    pub road_name: Option<String>,
    pub driver_name: String,
    pub job_name: Option<String>,
    pub vehicle_label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&SheetRecord> for SheetSummary {
    fn from(record: &SheetRecord) -> Self {
        let doc = StoredMaterials::classify(&record.sheet.materials);
        Self {
            id: record.sheet.id,
            date: record.sheet.date,
            status: record.sheet.status,
            miles: record.sheet.miles,
            road_name: doc.text("road_name").filter(|name| !name.is_empty()),
            driver_name: record.driver_name.clone(),
            job_name: record.job_name.clone(),
            vehicle_label: record.vehicle_label.clone(),
            created_at: record.sheet.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Full sheet, with the stored document and its upgraded form
#[derive(Debug, Serialize)]
pub struct SheetDetail {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub status: SheetStatus,
    pub notes: String,
    pub miles: f64,
    pub driver: DriverSummary,
    pub job_name: Option<String>,
    pub vehicle_label: Option<String>,
    pub shape: Shape,
    pub materials: Value,
    pub upgraded: Materials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SheetRecord> for SheetDetail {
    fn from(record: SheetRecord) -> Self {
        let doc = StoredMaterials::classify(&record.sheet.materials);
        let sheet = record.sheet;
        Self {
            id: sheet.id,
            date: sheet.date,
            status: sheet.status,
            notes: sheet.notes,
            miles: sheet.miles,
            driver: DriverSummary {
                id: sheet.driver_id,
                name: record.driver_name,
                email: record.driver_email,
            },
            job_name: record.job_name,
            vehicle_label: record.vehicle_label,
            shape: doc.shape(),
            upgraded: doc.upgrade(),
            materials: sheet.materials,
            created_at: sheet.created_at,
            updated_at: sheet.updated_at,
        }
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp
fn parse_submitted_date(value: Option<&Value>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(text) = value.and_then(Value::as_str).map(str::trim) else {
        return Ok(None);
    };
    if text.is_empty() {
        return Ok(None);
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(date.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| Some(datetime.and_utc()))
        .ok_or_else(|| AppError::BadRequest("Invalid date_submitted".to_string()))
}

fn form_body(body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(form) => Ok(form),
        _ => Err(AppError::BadRequest("Expected a JSON object".to_string())),
    }
}

/// Fetch a sheet the caller may see
async fn load_sheet(
    state: &AppState,
    session: &Session,
    id: Uuid,
) -> Result<SheetRecord, AppError> {
    let record = state
        .store
        .get_sheet(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    if !session.actor().can_access_sheet(record.sheet.driver_id) {
        return Err(AppError::unauthorized());
    }
    Ok(record)
}

fn report_filename(id: Uuid) -> String {
    format!("sheet-{}.pdf", id)
}

/// Subject line names the road, else the job, else the sheet id
fn confirm_subject(record: &SheetRecord) -> String {
    let doc = StoredMaterials::classify(&record.sheet.materials);
    let name = doc
        .text("road_name")
        .filter(|road| !road.trim().is_empty())
        .or_else(|| record.job_name.clone().filter(|job| !job.trim().is_empty()))
        .unwrap_or_else(|| record.sheet.id.to_string());
    format!("Road Sheet Confirmation: {}", name)
}

/// Where a rendered report goes
enum Destination {
    Download,
    Email { to: String },
}

fn render_report(state: &AppState, record: &SheetRecord) -> Result<Vec<u8>, AppError> {
    let doc = StoredMaterials::classify(&record.sheet.materials);
    let sheet = ReportSheet {
        date: record.sheet.date.date_naive(),
        notes: &record.sheet.notes,
    };
    let layout = layout_report(&sheet, &doc, &state.config.letterhead, &Metrics::default());
    if layout.overflows() {
        tracing::warn!("Report for sheet {} runs past the page", record.sheet.id);
    }
    pdf::render(&layout)
}

async fn deliver_report(
    state: &AppState,
    record: &SheetRecord,
    destination: Destination,
) -> Result<Response, AppError> {
    let bytes = render_report(state, record)?;
    let filename = report_filename(record.sheet.id);

    match destination {
        Destination::Download => Ok((
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response()),
        Destination::Email { to } => {
            state
                .mailer
                .send(OutgoingEmail {
                    to,
                    subject: confirm_subject(record),
                    text: CONFIRM_TEXT.to_string(),
                    attachments: vec![Attachment {
                        filename,
                        content: bytes,
                    }],
                })
                .await?;
            Ok(Json(json!({ "ok": true })).into_response())
        }
    }
}

/// List sheets, newest first
async fn list_sheets(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SheetSummary>>, AppError> {
    let query = query.q.unwrap_or_default();
    let searching = !query.trim().is_empty();
    let window = if searching { SEARCH_WINDOW } else { LIST_LIMIT };

    let records = state
        .store
        .list_sheets(session.actor().sheet_scope(), window)
        .await?;

    let response = records
        .iter()
        .filter(|record| {
            if !searching {
                return true;
            }
            let doc = StoredMaterials::classify(&record.sheet.materials);
            let road = doc.text("road_name").unwrap_or_default();
            let contractor = doc.text("contractor").unwrap_or_default();
            SearchFields {
                road: &road,
                job: record.job_name.as_deref().unwrap_or(""),
                contractor: &contractor,
                driver: &record.driver_name,
                notes: &record.sheet.notes,
            }
            .matches(&query)
        })
        .take(LIST_LIMIT as usize)
        .map(SheetSummary::from)
        .collect();

    Ok(Json(response))
}

/// Submit a new sheet
async fn create_sheet(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let form = form_body(body)?;
    let date = parse_submitted_date(form.get("date_submitted"))?.unwrap_or_else(Utc::now);

    let id = state
        .store
        .create_sheet(NewSheet {
            date,
            notes: coerce_text(form.get("notes")),
            miles: coerce_miles(form.get("miles")),
            materials: normalize(&form).to_value(),
            driver_id: session.user_id,
        })
        .await?;
    tracing::info!("Sheet {} submitted by {}", id, session.email);

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Get a sheet by ID
async fn get_sheet(
    State(state): State<AppState>,
    session: Session,
    ResourceId(id): ResourceId,
) -> Result<Json<SheetDetail>, AppError> {
    let record = load_sheet(&state, &session, id).await?;
    Ok(Json(record.into()))
}

/// Edit a sheet; submitted fields replace stored ones, others are kept
async fn update_sheet(
    State(state): State<AppState>,
    session: Session,
    ResourceId(id): ResourceId,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let form = form_body(body)?;
    let record = load_sheet(&state, &session, id).await?;
    let sheet = record.sheet;

    let date = parse_submitted_date(form.get("date_submitted"))?.unwrap_or(sheet.date);
    let notes = if form.contains_key("notes") {
        coerce_text(form.get("notes"))
    } else {
        sheet.notes
    };
    let miles = if form.contains_key("miles") {
        coerce_miles(form.get("miles"))
    } else {
        sheet.miles
    };

    state
        .store
        .update_sheet(
            id,
            SheetChanges {
                date,
                notes,
                miles,
                materials: merge_over(&sheet.materials, &normalize(&form)),
            },
        )
        .await?;

    Ok(Json(json!({ "id": id })))
}

/// Delete a sheet
async fn delete_sheet(
    State(state): State<AppState>,
    session: Session,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, AppError> {
    if !session.actor().can_delete_sheet() {
        return Err(AppError::unauthorized());
    }

    if state.store.delete_sheet(id).await? {
        tracing::info!("Sheet {} deleted by {}", id, session.email);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Not found".to_string()))
    }
}

/// Download the sheet report as a PDF
async fn download_sheet(
    State(state): State<AppState>,
    session: Session,
    ResourceId(id): ResourceId,
) -> Result<Response, AppError> {
    let record = load_sheet(&state, &session, id).await?;
    deliver_report(&state, &record, Destination::Download).await
}

/// Mark a sheet confirmed and email its report to the DOT employee
async fn confirm_sheet(
    State(state): State<AppState>,
    session: Session,
    ResourceId(id): ResourceId,
) -> Result<Response, AppError> {
    let record = load_sheet(&state, &session, id).await?;

    let to = StoredMaterials::classify(&record.sheet.materials)
        .text("dot_employee_email")
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::BadRequest("DOT employee email required".to_string()))?;

    state
        .store
        .set_sheet_status(id, SheetStatus::Confirmed)
        .await?;
    tracing::info!("Sheet {} confirmed, sending report to {}", id, to);

    deliver_report(&state, &record, Destination::Email { to }).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sheets", get(list_sheets).post(create_sheet))
        .route(
            "/api/sheets/{id}",
            get(get_sheet).put(update_sheet).delete(delete_sheet),
        )
        .route("/api/sheets/{id}/download", get(download_sheet))
        .route("/api/sheets/{id}/confirm", post(confirm_sheet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submitted_date() {
        let day = parse_submitted_date(Some(&json!("2024-03-05"))).unwrap().unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-05T00:00:00+00:00");

        let stamp = parse_submitted_date(Some(&json!("2024-03-05T14:30:00-05:00")))
            .unwrap()
            .unwrap();
        assert_eq!(stamp.to_rfc3339(), "2024-03-05T19:30:00+00:00");

        assert!(parse_submitted_date(Some(&json!(""))).unwrap().is_none());
        assert!(parse_submitted_date(None).unwrap().is_none());
        assert!(parse_submitted_date(Some(&json!("yesterday"))).is_err());
    }

    #[test]
    fn test_report_filename() {
        let id = Uuid::nil();
        assert_eq!(
            report_filename(id),
            "sheet-00000000-0000-0000-0000-000000000000.pdf"
        );
    }
}
