//! NIC Intranet - IP allocation and network discovery for a district NIC office
//!
//! Serves the employee and administrator JSON API, the uploaded application
//! forms, and the live subnet scan.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, StatusCode},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use nic_intranet::{
    api,
    config::{LogFormat, LogTarget, LoggingConfig},
    db, middleware,
    services::{
        seed::seed_demo_data, AuthService, DiscoveryScanner, FileStore, IcmpProbe, LogMailer,
        Mailer, OtpStore, ReachabilityProber, SmtpMailer, SystemCommandRunner,
    },
    AppConfig, AppState,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("NIC Intranet {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let seed = args.iter().any(|arg| arg == "--seed");

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard flushes file logs on drop; keep it for the whole run
    let _log_guard = init_logging(&config.logging);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()
        .context("Failed to build async runtime")?
        .block_on(run(config, seed))
}

async fn run(config: AppConfig, seed: bool) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "NIC Intranet starting up");

    ensure_data_directory(&config)?;
    std::fs::create_dir_all(&config.uploads.dir)
        .with_context(|| format!("Failed to create upload directory {:?}", config.uploads.dir))?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    if let Some(ref admin) = config.bootstrap_admin {
        AuthService::new(db.clone(), &config.auth)
            .ensure_bootstrap_admin(admin)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    if seed {
        seed_demo_data(&db).await.context("Failed to seed database")?;
    }

    let runner = Arc::new(SystemCommandRunner);
    let prober = Arc::new(ReachabilityProber::new(
        &config.network,
        Arc::new(IcmpProbe),
        runner.clone(),
    ));
    let scanner = Arc::new(DiscoveryScanner::new(&config.network, runner));

    let mailer: Arc<dyn Mailer> = match config.mail {
        Some(ref mail) => {
            info!(host = %mail.smtp_host, port = mail.smtp_port, "SMTP mailer configured");
            Arc::new(SmtpMailer::new(mail).context("Failed to configure SMTP mailer")?)
        }
        None => {
            warn!("Mail not configured, password reset codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState {
        config: config.clone(),
        db,
        prober,
        scanner,
        otp: OtpStore::new(&config.otp),
        mailer,
        files: FileStore::new(&config.uploads),
    };

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server error")?;

    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging/tracing infrastructure
fn init_logging(
    log_config: &LoggingConfig,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if matches!(log_config.target, LogTarget::Console | LogTarget::Both) {
        layers.push(fmt_layer(&log_config.format, std::io::stdout));
    }

    let guard = if matches!(log_config.target, LogTarget::File | LogTarget::Both) {
        let (writer, guard) = create_file_writer(log_config);
        layers.push(fmt_layer(&log_config.format, writer));
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    guard
}

fn fmt_layer<W>(format: &LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

/// Ensure the directory holding the SQLite file exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    let Some(path) = config.database.url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            info!("Created data directory: {:?}", parent);
        }
    }
    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: AppState, config: &AppConfig) -> Router {
    // The browser client is served from a different origin in development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api_rate_limit = middleware::RateLimitState::new(middleware::api_rate_limit_config());
    let auth_rate_limit = middleware::RateLimitState::new(middleware::auth_rate_limit_config());
    middleware::spawn_rate_limit_cleanup(api_rate_limit.clone());
    middleware::spawn_rate_limit_cleanup(auth_rate_limit.clone());

    // Public routes (login, registration, OTP reset) get the stricter limiter;
    // the token middleware wraps only the protected tree.
    let api_router = Router::new()
        .nest(
            "/api/v1",
            api::public_routes().layer(axum::middleware::from_fn_with_state(
                auth_rate_limit,
                middleware::rate_limit_middleware,
            )),
        )
        .nest(
            "/api/v1",
            api::protected_routes()
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::auth::auth_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    api_rate_limit,
                    middleware::rate_limit_middleware,
                )),
        )
        .layer(axum::middleware::from_fn(
            middleware::api_cache_control_middleware,
        ))
        .with_state(state);

    info!("Serving uploaded forms from {:?}", config.uploads.dir);
    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(&config.uploads.dir))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("private, no-cache"),
        ));

    with_request_timeout(api_router.merge(uploads), config.server.request_timeout_secs)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
}

/// Print help message
fn print_help() {
    println!(
        r#"NIC Intranet {}

USAGE:
    nic-intranet [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --seed                  Populate an empty database with demo users,
                            ranges, complaints and addresses

ENVIRONMENT:
    NIC_CONFIG          Path to configuration file (default: config.yaml)
    RUST_LOG            Overrides the configured log level

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by NIC_CONFIG environment variable
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/nic-intranet/config.yaml
    5. The user configuration directory (nic-intranet/config.yaml)"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Answer 408 once a request runs longer than the configured limit
fn with_request_timeout(router: Router, secs: Option<u64>) -> Router {
    match secs {
        Some(secs) => router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(secs),
        )),
        None => router,
    }
}
