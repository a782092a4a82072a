use crate::{
    api::{attendance, office, report},
    auth::{handlers, middleware::auth_middleware},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Builds the limiter once so every worker shares the same quota.
pub fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &LimiterConfig) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(web::resource("/login").route(web::post().to(handlers::login))),
    );

    // Protected routes
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(Governor::new(limiter)) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/offices")
                    // /offices
                    .service(web::resource("").route(web::get().to(office::list_offices)))
                    // /offices/{office}/employees
                    .service(
                        web::resource("/{office}/employees")
                            .route(web::get().to(office::get_roster)),
                    )
                    // /offices/{office}/attendance
                    .service(
                        web::resource("/{office}/attendance")
                            .route(web::get().to(attendance::list_office_attendance)),
                    )
                    // /offices/{office}/attendance/{date}
                    .service(
                        web::resource("/{office}/attendance/{date}")
                            .route(web::get().to(attendance::get_daily_roster))
                            .route(web::put().to(attendance::mark_attendance)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::get().to(attendance::list_all_attendance)),
                    )
                    // /attendance/daily/{date}
                    .service(
                        web::resource("/daily/{date}")
                            .route(web::get().to(attendance::daily_overview)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/daily/{date}").route(web::get().to(report::daily_report)),
                    )
                    .service(
                        web::resource("/monthly/{month}")
                            .route(web::get().to(report::monthly_report)),
                    ),
            )
            .service(
                web::resource("/analytics/{month}")
                    .route(web::get().to(report::monthly_analytics)),
            ),
    );
}

// LOGIN
//  └─ access_token (8 h by default)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ log in again; there is no refresh token
