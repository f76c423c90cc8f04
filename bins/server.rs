use std::process::ExitCode;

use configs::AppConfig;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use uuid::Uuid;

fn init_logging() {
    // 先加载 .env，RUST_LOG / LOG_FORMAT 才能生效
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "cart", event = "logger_init", "tracing subscriber initialized");
}

fn install_panic_hook(instance: Uuid) {
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "cart", event = "panic", %instance, message = %info, "unhandled panic occurred");
    }));
}

fn build_runtime(cfg: &AppConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    // 线程数来自配置（已合并 TOKIO_WORKER_THREADS）
    if let Some(w) = cfg.server.worker_threads {
        builder.worker_threads(w);
    }
    builder.build()
}

/// Serve until the server stops on its own or Ctrl+C arrives.
async fn serve(cfg: AppConfig, instance: Uuid) -> ExitCode {
    let server_task = tokio::spawn(server::run_with_config(cfg));

    tokio::select! {
        res = server_task => match res {
            Ok(Ok(())) => {
                info!(service = "cart", event = "stop", %instance, "cart service stopped");
                ExitCode::SUCCESS
            }
            // 包括启动时存储不可达
            Ok(Err(e)) => {
                error!(service = "cart", event = "run_failed", error = %e, "cart service failed");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(service = "cart", event = "task_join_error", error = %e, "server task join error");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!(service = "cart", event = "shutdown_signal", %instance, "received Ctrl+C, shutting down");
            ExitCode::SUCCESS
        }
    }
}

fn main() -> ExitCode {
    init_logging();

    let instance = Uuid::new_v4();
    install_panic_hook(instance);

    // 配置只加载一次，失败直接退出
    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "cart", event = "config_invalid", error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let rt = match build_runtime(&cfg) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "cart", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "cart",
        event = "start",
        %instance,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        backend = ?cfg.store.backend,
        "cart service starting"
    );

    rt.block_on(serve(cfg, instance))
}
