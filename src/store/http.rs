use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used by [`super::firebase::FirebaseStore`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// [`HttpClient`] backed by a shared `reqwest` connection pool.
///
/// No client-wide timeout is set, since subscriptions hold a response open
/// indefinitely. Point reads and writes carry a per-request timeout instead.
#[derive(Debug, Clone, Default)]
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}
