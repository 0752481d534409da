//! Serves the tomato store until Ctrl+C.
//!
//! ```text
//! curl localhost:8080/tomatoes/0
//! curl -X POST -d name=Cherry localhost:8080/tomatoes
//! curl -X PUT -d '{"name":"Roma"}' localhost:8080/tomatoes/1
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use httper_framework::SessionConfig;
use httper_runtime::LoggingBuilder;
use httper_transport::HttpServer;
use tomatoes::{Controller, ControllerHttp, routes};
use tracing::{error, info};

const ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> ExitCode {
    LoggingBuilder::new()
        .directive("tomatoes=debug")
        .directive("httper_transport=debug")
        .init();

    let controller = Controller::with_tomatoes(["Red"]);
    let adapter = Arc::new(ControllerHttp::new(controller, Some(SessionConfig::in_memory())));
    let router = routes(adapter).into_router();

    let handle = match HttpServer::listen(ADDR, router).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Failed to start server");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %handle.local_addr(), "Serving tomatoes");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
    }
    handle.stop();
    ExitCode::SUCCESS
}
