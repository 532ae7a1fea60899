use gtp_apply::*;
use config::{Config, ConfigBuilder};
use server::Server;
use submission::ApplicationRequest;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing_appender::non_blocking::WorkerGuard;


#[tokio::main]
async fn main() {

    let dotenv = dotenvy::dotenv();

    let args = Args::build();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let _logging_guard = setup_tracing(&config.general.log_dir);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let result = match args.command {
        Some(Command::GenerateConfig { path }) => Config::write_template_config(&path),
        Some(Command::Preview { name, fullname, email, language, text }) => {
            preview(config, ApplicationRequest {
                name: Some(name),
                fullname: Some(fullname),
                email: Some(email),
                language: Some(language),
            }, text).await
        }
        Some(Command::CheckEmail { email }) => check_email(config, &email).await,
        None => serve(config).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<Config, anyhow::Error> {
    let builder = if args.config.exists() {
        ConfigBuilder::from_file(&args.config)?
    } else {
        eprintln!("No config file at {}, using defaults", args.config.display());
        ConfigBuilder::new()
    };

    let mut builder = builder.with_env();

    if let Some(port) = args.port {
        builder = builder.with_port(port);
    }

    Ok(builder.build()?)
}

async fn serve(config: Config) -> Result<(), anyhow::Error> {
    let state = AppState::new(config).await?;

    info!("Starting application mailer...");

    Server::new(state).run().await
}

async fn preview(config: Config, request: ApplicationRequest, text: bool) -> Result<(), anyhow::Error> {
    let state = AppState::with_services(config, None, None)?;

    let submission = request.validate()?;
    let rendered = state.templates.render_confirmation(&submission, Utc::now())?;

    println!("Subject: {}\n", rendered.subject);

    if text {
        let email = email::OutgoingEmail::new(&submission.email, &rendered.subject, rendered.html);
        println!("{}", email.text.unwrap_or_default());
    } else {
        println!("{}", rendered.html);
    }

    Ok(())
}

async fn check_email(config: Config, email: &str) -> Result<(), anyhow::Error> {
    let state = AppState::new(config).await?;

    let Some(duplicates) = state.duplicates.as_ref() else {
        warn!("DATABASE_URL is not configured");
        return Err(anyhow::anyhow!("Applicant record store not configured"));
    };

    let exists = duplicates.is_duplicate(email).await?;

    if exists {
        println!("{} has already applied", email.trim());
    } else {
        println!("{} has not applied yet", email.trim());
    }

    Ok(())
}

pub fn setup_tracing(log_dir: &str) -> WorkerGuard {
    let env_filter = if cfg!(debug_assertions) {
        "debug,hyper_util=off,hyper=off,tower_http=info,reqwest=off,sqlx=info"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(env_filter));

    let file_appender = tracing_appender::rolling::daily(log_dir, "gtp-apply.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer().pretty();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Tracing initialized with file logging");

    guard
}
