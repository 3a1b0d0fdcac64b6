use crate::{
    api::{account, attendance, classes, reports, students, teachers},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/setup-admin")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::setup_admin)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                // Relay to the legacy PHP service, kept off the main path
                web::resource("/legacy-register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::legacy_register)),
            )
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::resource("/account/password")
                    .route(web::put().to(account::change_password)),
            )
            .service(
                web::scope("/students")
                    // /students
                    .service(
                        web::resource("")
                            .route(web::post().to(students::create_student))
                            .route(web::get().to(students::list_students)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::get().to(students::export_students_csv)),
                    )
                    // /students/{id}
                    .service(
                        web::resource("/{id}/attendance")
                            .route(web::get().to(students::student_attendance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(students::get_student))
                            .route(web::put().to(students::update_student))
                            .route(web::delete().to(students::delete_student)),
                    ),
            )
            .service(
                web::scope("/teachers")
                    // /teachers
                    .service(
                        web::resource("")
                            .route(web::post().to(teachers::create_teacher))
                            .route(web::get().to(teachers::list_teachers)),
                    )
                    .service(
                        web::resource("/pending")
                            .route(web::get().to(teachers::pending_teachers)),
                    )
                    // /teachers/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(teachers::approve_teacher)),
                    )
                    // /teachers/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(teachers::reject_teacher)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(teachers::get_teacher))
                            .route(web::put().to(teachers::update_teacher))
                            .route(web::delete().to(teachers::delete_teacher)),
                    ),
            )
            .service(
                web::scope("/classes")
                    // /classes
                    .service(
                        web::resource("")
                            .route(web::post().to(classes::create_class))
                            .route(web::get().to(classes::list_classes)),
                    )
                    .service(
                        web::resource("/{id}/enroll")
                            .route(web::post().to(classes::enroll_student)),
                    )
                    .service(
                        web::resource("/{id}/attendance/export")
                            .route(web::get().to(attendance::export_class_csv)),
                    )
                    // /classes/{id}/attendance
                    .service(
                        web::resource("/{id}/attendance")
                            .route(web::post().to(attendance::save_session))
                            .route(web::get().to(attendance::list_sessions)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(classes::get_class))
                            .route(web::put().to(classes::update_class))
                            .route(web::delete().to(classes::delete_class)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}/mark")
                            .route(web::post().to(attendance::quick_mark)),
                    )
                    .service(
                        web::resource("/{id}/toggle")
                            .route(web::post().to(attendance::toggle_status)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::edit_session)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/summary").route(web::get().to(reports::summary)))
                    .service(web::resource("/trends").route(web::get().to(reports::trends)))
                    .service(web::resource("/export").route(web::get().to(reports::export))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
