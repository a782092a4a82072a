use crate::auth::auth::AuthUser;
use crate::auth::guard::GuardedStore;
use crate::error::ApiError;
use crate::model::attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceSummary, DATE_FORMAT, Month, Status, parse_date,
    parse_in_time,
};
use crate::model::directory::Directory;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    /// Replaces everything stored for the office on that date
    pub records: Vec<AttendanceRecord>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// Calendar month, `YYYY-MM`
    #[param(example = "2024-01")]
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceEntry>,
    #[schema(example = 2)]
    pub total: usize,
}

impl From<Vec<AttendanceEntry>> for AttendanceListResponse {
    fn from(data: Vec<AttendanceEntry>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DailyRosterResponse {
    #[schema(example = "Hyderabad")]
    pub office: String,
    #[schema(example = "2024-01-10")]
    pub date: String,
    pub records: Vec<AttendanceRecord>,
    pub summary: AttendanceSummary,
}

#[derive(Serialize, ToSchema)]
pub struct DailyOverview {
    #[schema(example = "2024-01-10")]
    pub date: String,
    pub offices_reported: Vec<String>,
    #[schema(example = 5)]
    pub offices_total: usize,
    #[schema(example = 12)]
    pub total_records: usize,
    pub data: Vec<AttendanceEntry>,
}

/// Parses a `YYYY-MM-DD` path segment into the key format used by the store.
pub(crate) fn canonical_date(value: &str) -> Result<String, ApiError> {
    parse_date(value)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(ApiError::Validation)
}

pub(crate) fn parse_month(value: &str) -> Result<Month, ApiError> {
    value.parse().map_err(ApiError::Validation)
}

fn optional_month(query: &MonthQuery) -> Result<Option<Month>, ApiError> {
    query.month.as_deref().map(parse_month).transpose()
}

/// Checks a submitted batch against the office roster and normalizes check-in
/// times. Any invalid record rejects the whole batch.
pub fn prepare_records(
    directory: &Directory,
    office: &str,
    records: Vec<AttendanceRecord>,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    let roster = directory
        .roster(office)
        .ok_or_else(|| ApiError::validation(format!("Unknown office '{office}'")))?;

    records
        .into_iter()
        .map(|mut record| {
            if !roster.contains(&record.employee_name) {
                return Err(ApiError::validation(format!(
                    "'{}' is not on the {office} roster",
                    record.employee_name
                )));
            }

            if record.status != Status::Present {
                record.in_time.clear();
            } else if !record.in_time.is_empty() {
                parse_in_time(&record.in_time).map_err(|e| {
                    ApiError::validation(format!("{e} for {}", record.employee_name))
                })?;
            }

            Ok(record)
        })
        .collect()
}

/// Save the attendance of one office for one date
#[utoipa::path(
    put,
    path = "/api/offices/{office}/attendance/{date}",
    params(
        ("office" = String, Path, description = "Office name", example = "Hyderabad"),
        ("date" = String, Path, description = "Date, YYYY-MM-DD", example = "2024-01-10")
    ),
    request_body(
        content = MarkAttendance,
        description = "Attendance records for the day",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Attendance saved", body = Object, example = json!({
            "message": "Attendance saved",
            "office": "Hyderabad",
            "date": "2024-01-10",
            "records": 2,
            "replaced": false
        })),
        (status = 400, description = "Invalid date, time or employee"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Attendance could not be saved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    directory: web::Data<Directory>,
    path: web::Path<(String, String)>,
    payload: web::Json<MarkAttendance>,
) -> Result<HttpResponse, ApiError> {
    let (office, date) = path.into_inner();
    let handle = store.office(&auth, &office)?;

    let date = canonical_date(&date)?;
    let records = prepare_records(&directory, &office, payload.into_inner().records)?;
    let count = records.len();
    let replaced = handle.daily_roster(&date).is_some();

    // the write reloads, fsyncs and renames the document; keep it off the worker
    let write = {
        let (store, user, office, date) = (store.clone(), auth.clone(), office.clone(), date.clone());
        web::block(move || -> Result<(), ApiError> {
            store.office(&user, &office)?.mark_attendance(&date, records)?;
            Ok(())
        })
    };
    write
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
        .and_then(|saved| saved)
        .map_err(|e| {
            error!(error = %e, office = %office, date = %date, "Saving attendance failed");
            e
        })?;

    info!(
        username = %auth.username,
        office = %office,
        date = %date,
        records = count,
        replaced,
        "Attendance saved"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance saved",
        "office": office,
        "date": date,
        "records": count,
        "replaced": replaced
    })))
}

/// Attendance stored for one office on one date
#[utoipa::path(
    get,
    path = "/api/offices/{office}/attendance/{date}",
    params(
        ("office" = String, Path, description = "Office name", example = "Hyderabad"),
        ("date" = String, Path, description = "Date, YYYY-MM-DD", example = "2024-01-10")
    ),
    responses(
        (status = 200, description = "Stored records and counts", body = DailyRosterResponse),
        (status = 400, description = "Invalid date"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No attendance recorded for that date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_daily_roster(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (office, date) = path.into_inner();
    let handle = store.office(&auth, &office)?;
    let date = canonical_date(&date)?;

    let records = handle.daily_roster(&date).ok_or_else(|| {
        ApiError::not_found(format!("No attendance records found for {office} on {date}"))
    })?;

    Ok(HttpResponse::Ok().json(DailyRosterResponse {
        summary: AttendanceSummary::tally(&records),
        office,
        date,
        records,
    }))
}

/// All attendance of one office, optionally for one month
#[utoipa::path(
    get,
    path = "/api/offices/{office}/attendance",
    params(
        ("office" = String, Path, description = "Office name", example = "Hyderabad"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Attendance entries, date ascending", body = AttendanceListResponse),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_office_attendance(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    path: web::Path<String>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let office = path.into_inner();
    let handle = store.office(&auth, &office)?;
    let month = optional_month(&query)?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse::from(handle.attendance(month))))
}

/// Attendance across every office (Admin)
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(MonthQuery),
    responses(
        (status = 200, description = "Attendance entries, office by office", body = AttendanceListResponse),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_all_attendance(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let all = store.all_offices(&auth)?;
    let month = optional_month(&query)?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse::from(all.attendance(month))))
}

/// Which offices reported on a date, and what they reported (Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/daily/{date}",
    params(
        ("date" = String, Path, description = "Date, YYYY-MM-DD", example = "2024-01-10")
    ),
    responses(
        (status = 200, description = "Daily overview", body = DailyOverview),
        (status = 400, description = "Invalid date"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn daily_overview(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    directory: web::Data<Directory>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let all = store.all_offices(&auth)?;
    let date = canonical_date(&path.into_inner())?;

    let data: Vec<AttendanceEntry> = all
        .attendance(None)
        .into_iter()
        .filter(|entry| entry.date == date)
        .collect();

    Ok(HttpResponse::Ok().json(DailyOverview {
        offices_reported: all.offices_reported(&date),
        offices_total: directory.offices().count(),
        total_records: data.len(),
        date,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        Directory::load(None).unwrap()
    }

    #[test]
    fn non_present_records_lose_their_check_in_time() {
        let records = vec![
            AttendanceRecord::new("Ramesh Kumar", Status::Absent, "09:00"),
            AttendanceRecord::new("Suresh Reddy", Status::Present, "09:15"),
        ];
        let prepared = prepare_records(&directory(), "Hyderabad", records).unwrap();

        assert_eq!(prepared[0].in_time, "");
        assert_eq!(prepared[1].in_time, "09:15");
    }

    #[test]
    fn present_without_time_is_accepted() {
        let records = vec![AttendanceRecord::new("Ramesh Kumar", Status::Present, "")];
        assert!(prepare_records(&directory(), "Hyderabad", records).is_ok());
    }

    #[test]
    fn malformed_time_rejects_the_batch() {
        let records = vec![
            AttendanceRecord::new("Ramesh Kumar", Status::Present, "09:15"),
            AttendanceRecord::new("Suresh Reddy", Status::Present, "9am"),
        ];
        let err = prepare_records(&directory(), "Hyderabad", records).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("Suresh Reddy")));
    }

    #[test]
    fn employee_from_another_roster_is_rejected() {
        let records = vec![AttendanceRecord::new("Biswa Ranjan", Status::Absent, "")];
        assert!(prepare_records(&directory(), "Hyderabad", records).is_err());
    }

    #[test]
    fn unknown_office_is_rejected() {
        assert!(prepare_records(&directory(), "Atlantis", Vec::new()).is_err());
    }

    #[test]
    fn dates_are_normalized_to_store_keys() {
        assert_eq!(canonical_date("2024-01-05").unwrap(), "2024-01-05");
        assert!(canonical_date("2024-02-30").is_err());
        assert!(canonical_date("05/01/2024").is_err());
        assert!(parse_month("2024-1").is_err());
    }
}
