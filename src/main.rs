use anyhow::{bail, Context, Result};
use axum::{serve, Router};
use pin_registry::core::config::Config;
use pin_registry::core::routes::build_router;
use pin_registry::core::startup::{build_notifier, load_store};
use pin_registry::core::state::AppState;
use pin_registry::core::tracing_init::init_tracing;
use pin_registry::wal::wal::Wal;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        Copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    init_tracing(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        max_serial_id = config.registry.max_serial_id,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "PIN registry starting"
    );

    let wal = Wal::new(config.registry.wal_path.clone()).context("Failed to initialize WAL")?;
    info!(wal_path = %wal.path().display(), "WAL initialized");

    let store = load_store(wal, config.registry.max_serial_id)?;
    let notifier = build_notifier(&config.notify)?;

    let state = AppState::new(config.clone(), store, notifier);

    info!(
        users = state.store.count(),
        active_users = state.store.find_by_active(true).len(),
        capacity = state.capacity(),
        "PIN registry startup complete"
    );

    let app = build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let tcp_handle = if let Some(port) = config.server.port {
        let addr = format!("0.0.0.0:{}", port);

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind TCP listener to {}", addr))?;

        info!(address = %addr, "TCP listener bound");

        let app = app.clone();
        Some(tokio::spawn(async move {
            serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
        }))
    } else {
        None
    };

    let unix_handle = if let Some(unix_socket) = &config.server.unix_socket {
        if unix_socket.exists() {
            std::fs::remove_file(unix_socket).context(format!(
                "Failed to remove existing Unix socket: {}",
                unix_socket.display()
            ))?;
        }

        let listener = UnixListener::bind(unix_socket).context(format!(
            "Failed to bind Unix socket listener to {}",
            unix_socket.display()
        ))?;

        info!(path = %unix_socket.display(), "Unix socket listener bound");

        Some(tokio::spawn(serve_unix(listener, app)))
    } else {
        None
    };

    match (tcp_handle, unix_handle) {
        (Some(tcp), Some(unix)) => {
            tokio::select! {
                result = tcp => log_server_exit("TCP", result),
                result = unix => log_server_exit("Unix socket", result),
            }
        }
        (Some(tcp), None) => log_server_exit("TCP", tcp.await),
        (None, Some(unix)) => {
            // The Unix accept loop has no graceful shutdown of its own
            tokio::select! {
                result = unix => log_server_exit("Unix socket", result),
                _ = shutdown_signal() => {}
            }
        }
        (None, None) => {
            bail!("No listeners configured");
        }
    }

    info!("Shutting down");

    Ok(())
}

/// Accept loop for the Unix socket listener; runs until the task is dropped
async fn serve_unix(listener: UnixListener, app: Router) -> Result<()> {
    use tower::Service;

    let mut make_service = app.into_make_service();

    loop {
        let (socket, _remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "Failed to accept Unix socket connection");
                continue;
            }
        };

        let tower_service = match make_service.call(&socket).await {
            Ok(svc) => svc,
            Err(infallible) => match infallible {},
        };

        tokio::spawn(async move {
            let socket = hyper_util::rt::TokioIo::new(socket);

            let hyper_service = hyper::service::service_fn(
                move |request: hyper::Request<hyper::body::Incoming>| {
                    tower_service.clone().call(request)
                },
            );

            if let Err(err) = hyper_util::server::conn::auto::Builder::new(
                hyper_util::rt::TokioExecutor::new(),
            )
            .serve_connection_with_upgrades(socket, hyper_service)
            .await
            {
                error!(error = %err, "Error serving Unix socket connection");
            }
        });
    }
}

fn log_server_exit(listener: &str, result: Result<Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(listener, error = %e, "Server stopped with error"),
        Err(e) => error!(listener, error = %e, "Server task failed"),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
