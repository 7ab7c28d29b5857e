//! Command event mappings (`/xapi/commandeventmapping`).

use reqwest::Method;
use xcs_types::{CommandEventMapping, NewEventMapping};

use crate::{ApiResult, XnatClient};

impl XnatClient {
    pub async fn list_event_mappings(&self) -> ApiResult<Vec<CommandEventMapping>> {
        self.send_json(self.request(Method::GET, "/xapi/commandeventmapping")).await
    }

    pub async fn create_event_mapping(&self, mapping: &NewEventMapping) -> ApiResult<()> {
        self.send_empty(self.request(Method::POST, "/xapi/commandeventmapping").json(mapping))
            .await
    }

    pub async fn delete_event_mapping(&self, id: i64) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/xapi/commandeventmapping/{id}")))
            .await
    }

    pub async fn set_event_mapping_enabled(&self, id: i64, enabled: bool) -> ApiResult<()> {
        let flag = if enabled { "enable" } else { "disable" };
        self.send_empty(self.request(Method::PUT, &format!("/xapi/commandeventmapping/{id}/{flag}")))
            .await
    }
}
