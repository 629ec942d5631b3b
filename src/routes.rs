use crate::{
    api::{attendance, device, report},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub type IpLimiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> Option<IpLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

#[derive(Clone)]
pub struct Limiters {
    code: Arc<IpLimiter>,
    record: Arc<IpLimiter>,
    register: Arc<IpLimiter>,
    admin: Arc<IpLimiter>,
}

impl Limiters {
    pub fn new(
        code: Arc<IpLimiter>,
        record: Arc<IpLimiter>,
        register: Arc<IpLimiter>,
        admin: Arc<IpLimiter>,
    ) -> Self {
        Self {
            code,
            record,
            register,
            admin,
        }
    }

    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self::new(
            Arc::new(build_limiter(config.rate_code_per_min)?),
            Arc::new(build_limiter(config.rate_record_per_min)?),
            Arc::new(build_limiter(config.rate_register_per_min)?),
            Arc::new(build_limiter(config.rate_admin_per_min)?),
        ))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiters: &Limiters) {
    cfg.service(
        web::scope(api_prefix)
            // /code
            .service(
                web::resource("/code")
                    .wrap(limiters.code.clone())
                    .route(web::post().to(attendance::generate_code)),
            )
            // /attendance
            .service(
                web::resource("/attendance")
                    .wrap(limiters.record.clone())
                    .route(web::post().to(attendance::record_attendance)),
            )
            .service(
                web::scope("/devices")
                    // /devices/identify
                    .service(
                        web::resource("/identify")
                            .wrap(limiters.record.clone())
                            .route(web::post().to(device::identify_device)),
                    )
                    // /devices
                    .service(
                        web::resource("")
                            .wrap(limiters.register.clone())
                            .route(web::post().to(device::register_device))
                            .route(web::get().to(device::list_devices)),
                    )
                    // /devices/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .wrap(limiters.admin.clone())
                            .route(web::put().to(device::update_device))
                            .route(web::delete().to(device::delete_device)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .wrap(limiters.admin.clone())
                    .route("/zone", web::get().to(report::by_zone))
                    .route("/employee", web::get().to(report::by_employee))
                    .route("/range", web::get().to(report::in_range))
                    .route("/summary", web::get().to(report::summary))
                    .route("/zones", web::get().to(report::zone_summary)),
            ),
    );
}
