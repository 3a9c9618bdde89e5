use crate::{
    api::{events, identity, users},
    config::Config,
    error::AppError,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{http::header, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst size");
    Governor::new(&cfg)
}

/// Body parse failures answer with the same `{ "error": ... }` shape as handler errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation(err.to_string()).into())
}

/// Only the web client's origin may call the user endpoints from a browser.
pub fn cors(config: &Config) -> Cors {
    Cors::default()
        .allowed_origin(&config.cors_origin)
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_header(header::CONTENT_TYPE)
        .max_age(3600)
}

/// Events go first: an empty `api_prefix` scope would otherwise shadow them.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    configure_events(cfg);
    configure_users(cfg, config);
}

pub fn configure_users(cfg: &mut web::ServiceConfig, config: &Config) {
    let user_admin_limiter = Arc::new(build_limiter(config.rate_user_admin_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(user_admin_limiter) // rate limiting
            .app_data(json_config())
            .service(web::resource("/create-user").route(web::post().to(users::create_user)))
            .service(web::resource("/delete-user").route(web::post().to(users::delete_user)))
            .service(web::resource("/edit-user").route(web::post().to(users::edit_user))),
    );
}

/// Identity creation on its own, served by the `create-user-server` binary.
pub fn configure_identity(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::resource("/create-user").route(web::post().to(identity::create_identity)),
    );
}

pub fn configure_events(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .app_data(json_config())
            .service(
                web::resource("/leave-request-updated")
                    .route(web::post().to(events::leave_request_updated)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_still_builds_a_limiter() {
        let _ = build_limiter(0);
        let _ = build_limiter(60);
    }
}
