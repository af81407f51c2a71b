//! Shared fixtures for unit tests.

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub(crate) async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("mock server should bind");
    let address = listener.local_addr().expect("mock server address");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::warn!(%error, "mock server stopped");
        }
    });

    format!("http://{address}")
}
