use crate::{
    api::{attendance, session, students},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    // finish() only rejects a zero period or burst, both ruled out above
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::resource("/students")
                    .route(web::get().to(students::list_students))
                    .route(web::post().to(students::enroll_student)),
            )
            .service(
                web::resource("/attendance").route(web::get().to(attendance::list_attendance)),
            )
            .service(
                web::scope("/session")
                    // /session
                    .service(web::resource("").route(web::get().to(session::get_session)))
                    .service(web::resource("/scan").route(web::post().to(session::start_scan)))
                    .service(web::resource("/identify").route(web::post().to(session::identify)))
                    // /session/verification
                    .service(
                        web::resource("/verification")
                            .route(web::get().to(session::await_verification))
                            .route(web::post().to(session::confirm_verification))
                            .route(web::delete().to(session::dismiss_verification)),
                    )
                    .service(web::resource("/stop").route(web::post().to(session::stop_session)))
                    .service(
                        web::resource("/reset").route(web::post().to(session::reset_session)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new pair, the old refresh token is revoked

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_builds_for_any_rate() {
        // zero and rates above one per millisecond are clamped
        for rate in [0, 1, 60, 1000, 120_000] {
            let _ = build_limiter(rate);
        }
    }
}
