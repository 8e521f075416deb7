use tracing::{error, info};
use uuid::Uuid;

fn main() -> std::process::ExitCode {
    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "datalayer", event = "panic", %service_id, pid, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to build tokio runtime: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    rt.block_on(async move {
        // logging is initialised inside server::run once the config is known
        let server_task = tokio::spawn(server::run());

        tokio::select! {
            res = server_task => match res {
                Ok(Ok(())) => {
                    info!(service = "datalayer", event = "stop", %service_id, pid, version, "server stopped");
                    std::process::ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    error!(service = "datalayer", event = "run_failed", error = %e, "server::run returned error");
                    eprintln!("server error: {e:#}");
                    std::process::ExitCode::FAILURE
                }
                Err(e) => {
                    error!(service = "datalayer", event = "join_failed", error = %e, "server task panicked");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "datalayer", event = "shutdown", %service_id, pid, "ctrl-c received, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
