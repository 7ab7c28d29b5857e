//! Command definitions, wrapper configuration and enabled flags.

use reqwest::Method;
use serde_json::Value;
use xcs_types::{AvailableCommand, Command, CommandConfig, ConfigSubmission, Scope};

use crate::{ApiResult, XnatClient, scoped_prefix, segment};

impl XnatClient {
    /// `GET /xapi/commands`, optionally narrowed to one image.
    pub async fn list_commands(&self, image: Option<&str>) -> ApiResult<Vec<Command>> {
        let mut builder = self.request(Method::GET, "/xapi/commands");
        if let Some(image) = image {
            builder = builder.query(&[("image", image)]);
        }
        self.send_json(builder).await
    }

    pub async fn get_command(&self, command_id: i64) -> ApiResult<Command> {
        self.send_json(self.request(Method::GET, &format!("/xapi/commands/{command_id}")))
            .await
    }

    /// Register a command definition, associating it with `image` when given.
    pub async fn create_command(&self, image: Option<&str>, definition: &Value) -> ApiResult<()> {
        let mut builder = self.request(Method::POST, "/xapi/commands").json(definition);
        if let Some(image) = image {
            builder = builder.query(&[("image", image)]);
        }
        self.send_empty(builder).await
    }

    pub async fn update_command(&self, command_id: i64, definition: &Value) -> ApiResult<()> {
        let builder = self
            .request(Method::POST, &format!("/xapi/commands/{command_id}"))
            .json(definition);
        self.send_empty(builder).await
    }

    pub async fn delete_command(&self, command_id: i64) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/xapi/commands/{command_id}")))
            .await
    }

    pub async fn get_config(&self, scope: &Scope, command_id: i64, wrapper_name: &str) -> ApiResult<CommandConfig> {
        let path = wrapper_path(scope, command_id, wrapper_name, "config");
        self.send_json(self.request(Method::GET, &path)).await
    }

    /// Store a configuration and mark it enabled (`?enabled=true`).
    pub async fn save_config(
        &self,
        scope: &Scope,
        command_id: i64,
        wrapper_name: &str,
        config: &ConfigSubmission,
    ) -> ApiResult<()> {
        let path = wrapper_path(scope, command_id, wrapper_name, "config");
        let builder = self
            .request(Method::POST, &path)
            .query(&[("enabled", "true")])
            .json(config);
        self.send_empty(builder).await
    }

    /// Drop a stored configuration so the command definition's defaults apply.
    pub async fn reset_config(&self, scope: &Scope, command_id: i64, wrapper_name: &str) -> ApiResult<()> {
        let path = wrapper_path(scope, command_id, wrapper_name, "config");
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    pub async fn get_enabled(&self, scope: &Scope, command_id: i64, wrapper_name: &str) -> ApiResult<bool> {
        let path = wrapper_path(scope, command_id, wrapper_name, "enabled");
        let body = self.send_text(self.request(Method::GET, &path)).await?;
        Ok(body.trim().trim_matches('"').eq_ignore_ascii_case("true"))
    }

    /// `PUT .../wrappers/{name}/enabled` or `.../disabled`.
    pub async fn set_enabled(&self, scope: &Scope, command_id: i64, wrapper_name: &str, enabled: bool) -> ApiResult<()> {
        let flag = if enabled { "enabled" } else { "disabled" };
        let path = wrapper_path(scope, command_id, wrapper_name, flag);
        self.send_empty(self.request(Method::PUT, &path)).await
    }

    /// Wrappers that can run against `xsi_type` data in `project`.
    pub async fn list_available(&self, project: &str, xsi_type: &str) -> ApiResult<Vec<AvailableCommand>> {
        let builder = self
            .request(Method::GET, "/xapi/commands/available")
            .query(&[("project", project), ("xsiType", xsi_type)]);
        self.send_json(builder).await
    }
}

fn wrapper_path(scope: &Scope, command_id: i64, wrapper_name: &str, leaf: &str) -> String {
    format!(
        "{}/commands/{command_id}/wrappers/{}/{leaf}",
        scoped_prefix(scope),
        segment(wrapper_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_paths_follow_scope() {
        assert_eq!(
            wrapper_path(&Scope::Site, 4, "dcm2niix-scan", "config"),
            "/xapi/commands/4/wrappers/dcm2niix-scan/config"
        );
        assert_eq!(
            wrapper_path(&Scope::project("CT1"), 4, "dcm2niix-scan", "disabled"),
            "/xapi/projects/CT1/commands/4/wrappers/dcm2niix-scan/disabled"
        );
    }
}
