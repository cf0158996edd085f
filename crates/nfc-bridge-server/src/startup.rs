//! Actix server startup + app wiring.
//!
//! Builds the shared state, routes, middleware, and OpenAPI endpoints.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use actix_web::Error;
use actix_web::{web, App, HttpServer};
use anyhow::{Context as _, Result};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::catalog_db::CatalogDb;
use crate::config;
use crate::jellyfin::{JellyfinClient, MediaDirectory};
use crate::models::MediaKind;
use crate::openapi;
use crate::session_registry::ActiveSessionRegistry;
use crate::state::AppState;

/// Build server state and start the Actix HTTP server.
pub(crate) async fn run(args: crate::Args) -> Result<()> {
    let config_path = resolve_config_path(args.config)?;
    let cfg = config::ServerConfig::load(&config_path)?;
    let bind = resolve_bind(args.bind, &cfg)?;
    let media_server = config::media_server_from_config(&cfg)?;
    let catalog_path = config::catalog_db_path_from_config(&cfg, &config_path);
    let tls = config::tls_from_config(&cfg)?;
    tracing::info!(
        bind = %bind,
        config = %config_path.display(),
        catalog = %catalog_path.display(),
        media_server = %media_server.base_url,
        target_user = %media_server.target_username,
        tls = tls.is_some(),
        "starting nfc-bridge-server"
    );

    let catalog = CatalogDb::new(&catalog_path)?;
    if config::seed_examples_from_config(&cfg) {
        catalog.seed_examples()?;
    }
    for kind in MediaKind::ALL {
        tracing::info!(kind = %kind, count = catalog.count(kind)?, "catalog loaded");
    }

    let sessions = ActiveSessionRegistry::from_config(&cfg, &config_path);
    let directory: Arc<dyn MediaDirectory> = Arc::new(JellyfinClient::new(&media_server)?);
    let state = web::Data::new(AppState::new(
        catalog,
        sessions,
        directory,
        media_server.target_username.clone(),
    ));

    // One worker keeps request handling strictly sequential.
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(FilteredLogger)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .configure(api::configure)
    })
    .workers(1);

    let server = match tls {
        Some((cert, key)) => server.bind_rustls_0_22(bind, load_rustls_config(&cert, &key)?)?,
        None => server.bind(bind)?,
    };
    server.run().await?;

    Ok(())
}

/// Return true when the request path should be logged.
fn should_log_path(path: &str) -> bool {
    path != "/health" && !path.starts_with("/swagger-ui/")
}

/// Actix middleware that filters noisy paths from logging.
struct FilteredLogger;

impl<S, B> actix_web::dev::Transform<S, ServiceRequest> for FilteredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = FilteredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(FilteredLoggerMiddleware { service })
    }
}

/// Service wrapper that applies the logging filter.
struct FilteredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for FilteredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let should_log = should_log_path(&path);
        let method = req.method().clone();
        let peer = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("-")
            .to_string();
        let ua = req
            .headers()
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let start = std::time::Instant::now();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            if should_log {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = %res.status().as_u16(),
                    user_agent = %ua,
                    peer = %peer,
                    elapsed_ms = %start.elapsed().as_millis(),
                    "http request"
                );
            }
            Ok(res)
        })
    }
}

/// Pick the config file: `--config`, else `config.toml` next to the executable.
fn resolve_config_path(path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }
    let auto_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("config.toml")));
    match auto_path {
        Some(path) if path.exists() => Ok(path),
        _ => Err(anyhow::anyhow!("config file is required; use --config")),
    }
}

/// Resolve the final bind address from args + config.
fn resolve_bind(
    bind: Option<std::net::SocketAddr>,
    cfg: &config::ServerConfig,
) -> Result<std::net::SocketAddr> {
    match bind {
        Some(addr) => Ok(addr),
        None => config::bind_from_config(cfg),
    }
}

fn load_rustls_config(cert_path: &Path, key_path: &Path) -> Result<rustls::ServerConfig> {
    let mut cert_reader = BufReader::new(
        File::open(cert_path).with_context(|| format!("open tls cert {:?}", cert_path))?,
    );
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parse tls cert {:?}", cert_path))?;
    if certs.is_empty() {
        return Err(anyhow::anyhow!("no certificates found in {:?}", cert_path));
    }

    let mut key_reader = BufReader::new(
        File::open(key_path).with_context(|| format!("open tls key {:?}", key_path))?,
    );
    let key = rustls_pemfile::private_key(&mut key_reader)
        .with_context(|| format!("parse tls key {:?}", key_path))?
        .ok_or_else(|| anyhow::anyhow!("no private key found in {:?}", key_path))?;

    rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("build tls config")
}
