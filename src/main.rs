use std::{process, sync::Arc, time::Duration};

use bookgate::{
    application::{content::ContentService, error::AppError, gateway::UpstreamGateway},
    cache::{CacheConfig, ResponseStore, build_store},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::HttpGateway,
    },
};
use metrics::counter;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CheckConfig => {
            info!(
                target = "bookgate::config",
                addr = %settings.server.addr,
                upstream = %settings.upstream.base_url,
                cache_enabled = settings.cache.enabled,
                cache_ttl_seconds = settings.cache.ttl_seconds.get(),
                default_take = settings.listing.default_take.get(),
                "configuration is valid"
            );
            Ok(())
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let gateway: Arc<dyn UpstreamGateway> = Arc::new(HttpGateway::new(&settings.upstream)?);
    let cache_config = CacheConfig::from(&settings.cache);
    let store = build_store(&cache_config);
    let content = Arc::new(ContentService::new(
        gateway,
        store.clone(),
        settings.listing.default_take,
    ));

    let upload_limit_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::unexpected("upload request limit does not fit in memory"))?;
    let state = HttpState {
        content,
        upload_limit_bytes,
    };

    let purge_handle = cache_config
        .purge_interval
        .filter(|_| cache_config.enabled)
        .map(|period| spawn_cache_purge(store, period));

    let result = serve_http(&settings, state).await;

    if let Some(handle) = purge_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

fn spawn_cache_purge(store: Arc<dyn ResponseStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            let purged = store.purge_stale();
            if purged > 0 {
                counter!("bookgate_cache_purged_total").increment(purged as u64);
            }
            debug!(
                target = "bookgate::cache",
                purged,
                remaining = store.len(),
                "stale cache sweep finished"
            );
        }
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "bookgate::server",
        addr = %settings.server.addr,
        upstream = %settings.upstream.base_url,
        "listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(InfraError::from)?;
        }
    }

    info!(
        target = "bookgate::server",
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "shutdown requested, draining connections"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                target = "bookgate::server",
                "graceful shutdown window elapsed, aborting open connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}
