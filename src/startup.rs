use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionService;
use crate::configuration::{ApplicationSettings, JwtSettings};
use crate::metrics::{AtomicCounter, Counter};
use crate::middleware::{JwtMiddleware, LoggerMiddleware};
use crate::routes::{
    create_user, health_check, login, metrics, refresh, reset, revoke, update_user,
};
use crate::store::{RefreshTokenStore, UserStore};

/// Everything the handlers share
pub struct AppState {
    pub session: SessionService,
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub failed_logins: Arc<dyn Counter>,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        application: ApplicationSettings,
        jwt: JwtSettings,
    ) -> Self {
        let failed_logins: Arc<dyn Counter> = Arc::new(AtomicCounter::new());
        let session = SessionService::new(
            users.clone(),
            refresh_tokens.clone(),
            jwt.clone(),
            failed_logins.clone(),
        );

        Self {
            session,
            users,
            refresh_tokens,
            failed_logins,
            application,
            jwt,
        }
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let secret = state.jwt.secret.clone();

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            .app_data(state.clone())

            .route("/api/healthz", web::get().to(health_check))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))

            // Access token required; registered before the open POST resource
            .service(
                web::resource("/api/users")
                    .guard(guard::Put())
                    .route(web::put().to(update_user))
                    .wrap(JwtMiddleware::new(&secret)),
            )
            .service(web::resource("/api/users").route(web::post().to(create_user)))

            .route("/admin/reset", web::post().to(reset))
            .route("/admin/metrics", web::get().to(metrics))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
