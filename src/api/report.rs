use crate::api::attendance::{canonical_date, parse_month};
use crate::auth::auth::AuthUser;
use crate::auth::guard::{AllOfficesHandle, GuardedStore, OfficeHandle};
use crate::error::ApiError;
use crate::model::attendance::{AttendanceEntry, AttendanceSummary, Month};
use crate::model::directory::Directory;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

pub const REPORT_COLUMNS: [&str; 6] = [
    "Date",
    "Office",
    "Employee_Name",
    "Status",
    "In_Time",
    "Remarks",
];

const ALL_OFFICES_LABEL: &str = "All Offices";

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Office to report on. Admins get every office when omitted, office
    /// users get their own.
    #[param(example = "Hyderabad")]
    pub office: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfficeSummary {
    #[schema(example = "Hyderabad")]
    pub office: String,
    /// Size of the office roster
    #[schema(example = 5)]
    pub total_employees: usize,
    #[schema(example = 110)]
    pub records: usize,
    #[schema(example = 98)]
    pub present: usize,
    #[schema(example = 7)]
    pub absent: usize,
    #[schema(example = 3)]
    pub leave: usize,
    #[schema(example = 2)]
    pub half_day: usize,
    #[schema(example = "89.1%")]
    pub attendance_percent: String,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyAnalytics {
    #[schema(example = "2024-01")]
    pub month: String,
    pub offices: Vec<OfficeSummary>,
}

enum ReportScope<'a> {
    All(AllOfficesHandle<'a>),
    Office(OfficeHandle<'a>),
}

impl ReportScope<'_> {
    fn resolve<'a>(
        store: &'a GuardedStore,
        auth: &AuthUser,
        office: Option<&str>,
    ) -> Result<ReportScope<'a>, ApiError> {
        match office.or(auth.office.office()) {
            Some(office) => store.office(auth, office).map(ReportScope::Office),
            None => store.all_offices(auth).map(ReportScope::All),
        }
    }

    fn entries(&self, month: Option<Month>) -> Vec<AttendanceEntry> {
        match self {
            ReportScope::All(all) => all.attendance(month),
            ReportScope::Office(handle) => handle.attendance(month),
        }
    }

    fn label(&self) -> &str {
        match self {
            ReportScope::All(_) => ALL_OFFICES_LABEL,
            ReportScope::Office(handle) => handle.office(),
        }
    }
}

/// Renders entries as CSV with a header row. Office-user exports leave out
/// the `Office` column.
pub fn render_csv(entries: &[AttendanceEntry], include_office: bool) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header: Vec<&str> = REPORT_COLUMNS
        .iter()
        .copied()
        .filter(|column| include_office || *column != "Office")
        .collect();
    writer.write_record(&header)?;

    for entry in entries {
        let record = &entry.record;
        let mut row = vec![
            entry.date.as_str(),
            entry.office.as_str(),
            record.employee_name.as_str(),
            record.status.as_ref(),
            record.in_time.as_str(),
            record.remarks.as_str(),
        ];
        if !include_office {
            row.remove(1);
        }
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

fn report_filename(auth: &AuthUser, scope: &ReportScope<'_>, period: &str) -> String {
    if auth.is_admin() {
        format!("sagittal_attendance_{}_{}.csv", scope.label(), period)
    } else {
        format!("attendance_{}_{}.csv", scope.label(), period)
    }
}

fn csv_response(
    auth: &AuthUser,
    scope: &ReportScope<'_>,
    period: &str,
    entries: &[AttendanceEntry],
) -> Result<HttpResponse, ApiError> {
    if entries.is_empty() {
        return Err(ApiError::not_found("No data available for the selected criteria"));
    }

    let body = render_csv(entries, auth.is_admin()).map_err(|e| {
        error!(error = %e, "Rendering CSV report failed");
        ApiError::Internal(e.to_string())
    })?;
    let filename = report_filename(auth, scope, period);

    info!(
        username = %auth.username,
        report = %filename,
        rows = entries.len(),
        "Report generated"
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(body))
}

/// Daily attendance report as CSV
#[utoipa::path(
    get,
    path = "/api/reports/daily/{date}",
    params(
        ("date" = String, Path, description = "Date, YYYY-MM-DD", example = "2024-01-10"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid date"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No data available for the selected criteria")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn daily_report(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = ReportScope::resolve(&store, &auth, query.office.as_deref())?;
    let date = canonical_date(&path.into_inner())?;

    let entries: Vec<AttendanceEntry> = scope
        .entries(None)
        .into_iter()
        .filter(|entry| entry.date == date)
        .collect();

    csv_response(&auth, &scope, &date, &entries)
}

/// Monthly attendance report as CSV
#[utoipa::path(
    get,
    path = "/api/reports/monthly/{month}",
    params(
        ("month" = String, Path, description = "Month, YYYY-MM", example = "2024-01"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No data available for the selected criteria")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn monthly_report(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = ReportScope::resolve(&store, &auth, query.office.as_deref())?;
    let month = parse_month(&path.into_inner())?;

    let entries = scope.entries(Some(month));
    csv_response(&auth, &scope, &month.to_string(), &entries)
}

pub fn attendance_percent(present: usize, records: usize) -> String {
    if records == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", present as f64 / records as f64 * 100.0)
}

/// One summary row per office, in the order offices appear in `entries`.
pub fn office_summaries(directory: &Directory, entries: &[AttendanceEntry]) -> Vec<OfficeSummary> {
    entries
        .chunk_by(|a, b| a.office == b.office)
        .map(|chunk| {
            let office = chunk[0].office.clone();
            let counts = AttendanceSummary::tally(chunk.iter().map(|e| &e.record));
            OfficeSummary {
                total_employees: directory.roster(&office).map_or(0, <[String]>::len),
                records: counts.total,
                present: counts.present,
                absent: counts.absent,
                leave: counts.leave,
                half_day: counts.half_day,
                attendance_percent: attendance_percent(counts.present, counts.total),
                office,
            }
        })
        .collect()
}

/// Office-wise monthly summary (Admin)
#[utoipa::path(
    get,
    path = "/api/analytics/{month}",
    params(
        ("month" = String, Path, description = "Month, YYYY-MM", example = "2024-01")
    ),
    responses(
        (status = 200, description = "Office-wise summary", body = MonthlyAnalytics),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn monthly_analytics(
    auth: AuthUser,
    store: web::Data<GuardedStore>,
    directory: web::Data<Directory>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let all = store.all_offices(&auth)?;
    let month = parse_month(&path.into_inner())?;

    let entries = all.attendance(Some(month));
    Ok(HttpResponse::Ok().json(MonthlyAnalytics {
        month: month.to_string(),
        offices: office_summaries(&directory, &entries),
    }))
}
