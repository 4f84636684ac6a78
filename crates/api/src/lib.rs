pub mod calendar;
mod error;
pub mod event;
mod holiday;
mod resource;
pub mod shared;
mod status;

pub use error::ApiError;
pub use shared::directory::Directory;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use calgate_infra::Context;
use std::net::TcpListener;
use tracing::debug;
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    calendar::configure_routes(cfg);
    event::configure_routes(cfg);
    holiday::configure_routes(cfg);
    resource::configure_routes(cfg);
    status::configure_routes(cfg);
}

fn build_cors(allowed_origins: &[String], debug_cors: bool) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }

    let mut cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials();

    for origin in allowed_origins {
        if debug_cors {
            debug!(origin = %origin, "allowing CORS origin");
        }
        cors = cors.allowed_origin(origin);
    }

    cors
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: Context) -> anyhow::Result<Self> {
        let directory = Directory::from_context(&context);
        directory.start(context.shutdown.clone());

        let address = context.config.bind_address();
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let allowed_origins = context.config.allowed_origins.clone();
        let debug_cors = std::env::var("DEBUG_CORS").is_ok();

        let directory = web::Data::new(directory);
        let context = web::Data::new(context);

        let server = HttpServer::new(move || {
            App::new()
                .wrap(build_cors(&allowed_origins, debug_cors))
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(context.clone())
                .app_data(directory.clone())
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .run();

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
