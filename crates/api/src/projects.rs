//! Projects, scans and the sitewide-command opt-in settings.

use reqwest::Method;
use serde_json::Value;
use xcs_types::{ConfigContents, ProjectRecord, ProjectSettings, ResultSet, ScanRecord};

use crate::{ApiError, ApiResult, XnatClient, segment};

impl XnatClient {
    /// `GET /data/projects?format=json`.
    pub async fn list_projects(&self) -> ApiResult<Vec<ProjectRecord>> {
        let builder = self.request(Method::GET, "/data/projects").query(&[("format", "json")]);
        let result: ResultSet<ProjectRecord> = self.send_json(builder).await?;
        Ok(result.into_rows())
    }

    /// Scans of an image session, for scan-level launches.
    pub async fn list_scans(&self, session_id: &str) -> ApiResult<Vec<ScanRecord>> {
        let path = format!("/data/experiments/{}/scans", segment(session_id));
        let builder = self.request(Method::GET, &path).query(&[("format", "json")]);
        let result: ResultSet<ScanRecord> = self.send_json(builder).await?;
        Ok(result.into_rows())
    }

    /// The project's stored container-service settings. The stored document
    /// is JSON text nested inside the result set.
    pub async fn get_project_settings(&self, project_id: &str) -> ApiResult<ProjectSettings> {
        let builder = self.request(Method::GET, &project_settings_path(project_id)).query(&[("format", "json")]);
        let result: ResultSet<ConfigContents> = self.send_json(builder).await?;
        let contents = result
            .into_rows()
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Configuration(format!("project {project_id} has no container-service settings")))?;
        Ok(xcs_util::http::parse_response_json_strict(&contents.contents, None)?)
    }

    pub async fn set_project_settings(&self, project_id: &str, settings: &ProjectSettings) -> ApiResult<()> {
        let builder = self
            .request(Method::PUT, &project_settings_path(project_id))
            .query(&[("inbody", "true")])
            .json(settings);
        self.send_empty(builder).await
    }

    /// Sitewide default for new projects' opt-in setting.
    pub async fn get_site_opt_in(&self) -> ApiResult<bool> {
        let value: Value = self
            .send_json(self.request(Method::GET, "/xapi/siteConfig/optIntoSitewideCommands"))
            .await?;
        Ok(match value {
            Value::Bool(flag) => flag,
            Value::String(text) => text.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }

    pub async fn set_site_opt_in(&self, opt_in: bool) -> ApiResult<()> {
        let body = ProjectSettings {
            opt_into_sitewide_commands: opt_in,
        };
        self.send_empty(self.request(Method::POST, "/xapi/siteConfig").json(&body))
            .await
    }
}

fn project_settings_path(project_id: &str) -> String {
    format!("/data/projects/{}/config/container-service/general", segment(project_id))
}
