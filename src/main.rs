use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Duration;
use std::sync::Arc;

use taskboard::auth::{BcryptHasher, Sha256Hasher, TokenService};
use taskboard::clock::{Clock, SystemClock};
use taskboard::config::Config;
use taskboard::reminder::{
    spawn_reminder_loop, DailyAt, LogNotifier, Notifier, ReminderJob, SmtpNotifier,
};
use taskboard::routes;
use taskboard::store::PgStore;
use taskboard::upload::LocalBlobStore;
use taskboard::{AppState, Dependencies};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn notifier(config: &Config) -> Arc<dyn Notifier> {
    match &config.smtp {
        Some(smtp) => match SmtpNotifier::from_config(smtp) {
            Ok(notifier) => {
                log::info!("Sending reminders through {}:{}", smtp.host, smtp.port);
                Arc::new(notifier)
            }
            Err(e) => {
                log::error!("SMTP setup failed, reminders will only be logged: {}", e);
                Arc::new(LogNotifier)
            }
        },
        None => {
            log::warn!("SMTP_HOST not set, reminders will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let store = Arc::new(
        PgStore::connect(&config.database_url)
            .await
            .map_err(|e| startup_error("Failed to connect to database", e))?,
    );
    store
        .migrate()
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = Arc::new(
        TokenService::new(&config.jwt_secret, &config.jwt_refresh_secret, clock.clone())
            .with_ttls(
                Duration::seconds(config.access_token_ttl_secs),
                Duration::seconds(config.refresh_token_ttl_secs),
            ),
    );

    let state = web::Data::new(AppState::new(Dependencies {
        credentials: store.clone(),
        tasks: store.clone(),
        categories: store.clone(),
        tokens,
        password_hasher: Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        refresh_hasher: Arc::new(Sha256Hasher),
        blobs: Arc::new(LocalBlobStore::new(config.upload_dir.clone(), clock.clone())),
        clock: clock.clone(),
        max_upload_bytes: config.max_upload_bytes,
    }));
    let token_data = state.token_data();

    let job = Arc::new(ReminderJob::new(store.clone(), notifier(&config), clock.clone()));
    spawn_reminder_loop(job, Arc::new(DailyAt::new(config.reminder_time)), clock);

    log::info!("Starting Taskboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .app_data(token_data.clone())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
