use crate::api::attendance::{
    AttendanceListResponse, DailyOverview, DailyRosterResponse, MarkAttendance,
};
use crate::api::report::{MonthlyAnalytics, OfficeSummary};
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceSummary, Status};
use crate::model::directory::OfficeRoster;
use crate::model::role::Role;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Office Attendance API",
        version = "1.0.0",
        description = r#"
## Office Attendance

Daily attendance for the company's regional offices.

### 🔹 Key Features
- **Attendance entry**
  - Each office records status, check-in time and remarks per employee per day
  - Saving a day again replaces what was stored for that day
- **Reports**
  - Daily and monthly CSV exports
  - Office-wise monthly analytics (Admin)
- **Rosters**
  - Employees of each office

### 🔐 Security
Log in at `/auth/login` and send the token as a **Bearer** header.
The **admin** account sees every office; each office account only sees its own office.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::office::list_offices,
        crate::api::office::get_roster,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::get_daily_roster,
        crate::api::attendance::list_office_attendance,
        crate::api::attendance::list_all_attendance,
        crate::api::attendance::daily_overview,

        crate::api::report::daily_report,
        crate::api::report::monthly_report,
        crate::api::report::monthly_analytics
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            Status,
            AttendanceRecord,
            AttendanceEntry,
            AttendanceSummary,
            MarkAttendance,
            AttendanceListResponse,
            DailyRosterResponse,
            DailyOverview,
            OfficeRoster,
            OfficeSummary,
            MonthlyAnalytics
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and session APIs"),
        (name = "Offices", description = "Office roster APIs"),
        (name = "Attendance", description = "Attendance entry and lookup APIs"),
        (name = "Reports", description = "CSV exports and analytics APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
