//! Launch UI resolution and single/bulk launches.

use indexmap::IndexMap;
use reqwest::Method;
use xcs_types::{BulkLaunchReport, LaunchReport, LaunchUi, Scope};

use crate::{ApiResult, XnatClient, scoped_prefix};

impl XnatClient {
    /// Resolve launch controls for one target: `?{root_element}={value}`.
    pub async fn launch_ui(&self, scope: &Scope, wrapper_id: i64, root_element: &str, value: &str) -> ApiResult<LaunchUi> {
        let path = format!("{}/wrappers/{wrapper_id}/launch", scoped_prefix(scope));
        let builder = self.request(Method::GET, &path).query(&[(root_element, value)]);
        self.send_json(builder).await
    }

    /// Resolve launch controls for several targets at once (comma-joined values).
    pub async fn bulk_launch_ui(
        &self,
        scope: &Scope,
        wrapper_id: i64,
        root_element: &str,
        values: &[String],
    ) -> ApiResult<LaunchUi> {
        let path = format!("{}/wrappers/{wrapper_id}/bulklaunch", scoped_prefix(scope));
        let joined = values.join(",");
        let builder = self.request(Method::GET, &path).query(&[(root_element, joined.as_str())]);
        self.send_json(builder).await
    }

    pub async fn launch(&self, scope: &Scope, wrapper_id: i64, params: &IndexMap<String, String>) -> ApiResult<LaunchReport> {
        let path = format!("{}/wrappers/{wrapper_id}/launch", scoped_prefix(scope));
        self.send_json(self.request(Method::POST, &path).json(params)).await
    }

    /// Post one parameter object per target.
    pub async fn bulk_launch(
        &self,
        scope: &Scope,
        wrapper_id: i64,
        params: &[IndexMap<String, String>],
    ) -> ApiResult<BulkLaunchReport> {
        let path = format!("{}/wrappers/{wrapper_id}/bulklaunch", scoped_prefix(scope));
        self.send_json(self.request(Method::POST, &path).json(params)).await
    }
}
