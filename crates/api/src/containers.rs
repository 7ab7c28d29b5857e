//! Container execution history and logs.

use reqwest::Method;
use xcs_types::{HistoryEntry, Scope};

use crate::{ApiResult, XnatClient, scoped_prefix};

impl XnatClient {
    /// `GET /xapi/containers` or `/xapi/projects/{id}/containers`.
    pub async fn list_containers(&self, scope: &Scope) -> ApiResult<Vec<HistoryEntry>> {
        let path = format!("{}/containers", scoped_prefix(scope));
        self.send_json(self.request(Method::GET, &path)).await
    }

    /// Raw text of a container log (`stdout` or `stderr`).
    pub async fn container_log(&self, container_id: &str, log_file: &str) -> ApiResult<String> {
        let path = format!(
            "/xapi/containers/{}/logs/{}",
            crate::segment(container_id),
            crate::segment(log_file)
        );
        let builder = self.request(Method::GET, &path).header(reqwest::header::ACCEPT, "text/plain");
        self.send_text(builder).await
    }
}
