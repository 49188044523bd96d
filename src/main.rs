use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

#[macro_use]
extern crate diesel;

mod admin;
mod cache;
mod config;
mod errors;
mod handlers;
mod models;
mod schema;
mod store;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Parser)]
#[command(name = "notepad", version, about = "Minimal note-taking web app")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<admin::AdminCommand>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = CliArgs::parse();

    if let Some(command) = args.command {
        return admin::run(command)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()));
    }

    let config = config::Config::from_env().expect("env DATABASE_URL");
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("failed to create a pg pool");
    let mut connection = pool.get().expect("failed to check out a pg connection");
    connection
        .run_pending_migrations(MIGRATIONS)
        .expect("failed to run database migrations");
    drop(connection);

    let recent_notes_cache = match &config.cache_memcached_servers {
        Some(servers) => match cache::MemcachedBackend::connect(servers) {
            Ok(backend) => {
                log::info!(
                    "caching the last {} notes for up to {}s",
                    config.notes_to_display,
                    config.cache_default_timeout
                );
                cache::RecentNotesCache::new(Arc::new(backend), config.cache_default_timeout)
            }
            Err(err) => {
                log::warn!("memcached unavailable, running without a cache: {}", err);
                cache::RecentNotesCache::disabled()
            }
        },
        None => {
            log::info!("no cache backend configured, every read queries the database");
            cache::RecentNotesCache::disabled()
        }
    };

    let port = config.port;
    let state = web::Data::new(handlers::AppState {
        store: Arc::new(store::PgNoteStore::new(pool)),
        cache: recent_notes_cache,
        config,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .route("/", web::get().to(handlers::index))
            .route("/new", web::post().to(handlers::new))
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}
