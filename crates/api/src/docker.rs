//! Container host, image hub and image endpoints under `/xapi/docker`.

use reqwest::Method;
use xcs_types::{ContainerHost, DockerImage, ImageHub};

use crate::{ApiResult, XnatClient};

impl XnatClient {
    pub async fn get_host(&self) -> ApiResult<ContainerHost> {
        self.send_json(self.request(Method::GET, "/xapi/docker/server")).await
    }

    /// Replace the container host definition.
    pub async fn set_host(&self, host: &ContainerHost) -> ApiResult<()> {
        self.send_empty(self.request(Method::POST, "/xapi/docker/server").json(host))
            .await
    }

    pub async fn delete_host(&self, id: i64) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/xapi/docker/server/{id}")))
            .await
    }

    pub async fn list_hubs(&self) -> ApiResult<Vec<ImageHub>> {
        self.send_json(self.request(Method::GET, "/xapi/docker/hubs")).await
    }

    /// Create a hub, or update hub `id` when given. `make_default` adds
    /// `?default=true`, which clears the flag on every other hub server-side.
    pub async fn save_hub(&self, id: Option<i64>, hub: &ImageHub, make_default: bool) -> ApiResult<()> {
        let path = match id {
            Some(id) => format!("/xapi/docker/hubs/{id}"),
            None => "/xapi/docker/hubs".to_string(),
        };
        let mut builder = self.request(Method::POST, &path).json(hub);
        if make_default {
            builder = builder.query(&[("default", "true")]);
        }
        self.send_empty(builder).await
    }

    pub async fn set_default_hub(&self, id: i64) -> ApiResult<()> {
        let builder = self
            .request(Method::POST, &format!("/xapi/docker/hubs/{id}"))
            .query(&[("default", "true")]);
        self.send_empty(builder).await
    }

    pub async fn delete_hub(&self, id: i64) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/xapi/docker/hubs/{id}")))
            .await
    }

    pub async fn list_images(&self) -> ApiResult<Vec<DockerImage>> {
        self.send_json(self.request(Method::GET, "/xapi/docker/images")).await
    }

    /// Pull `image` (with tag) and save any command labels it carries.
    /// Pulls through hub `hub_id` when given, otherwise the default hub.
    pub async fn pull_image(&self, image: &str, hub_id: Option<i64>) -> ApiResult<()> {
        let path = match hub_id {
            Some(id) => format!("/xapi/docker/hubs/{id}/pull"),
            None => "/xapi/docker/pull".to_string(),
        };
        let builder = self
            .request(Method::POST, &path)
            .query(&[("save-commands", "true"), ("image", image)]);
        self.send_empty(builder).await
    }

    /// Delete an image; `force` removes it even when containers used it.
    pub async fn delete_image(&self, image_id: &str, force: bool) -> ApiResult<()> {
        let mut builder = self.request(Method::DELETE, &format!("/xapi/docker/images/{}", crate::segment(image_id)));
        if force {
            builder = builder.query(&[("force", "true")]);
        }
        self.send_empty(builder).await
    }
}
