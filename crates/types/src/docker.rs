//! Docker server, image registry and image models.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::flex;

/// The container host the service runs containers on (`/xapi/docker/server`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerHost {
    #[serde(default, deserialize_with = "flex::optional_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub swarm_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_translation_xnat_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_translation_docker_prefix: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_bool", skip_serializing)]
    pub ping: Option<bool>,
}

/// A Docker image registry (`/xapi/docker/hubs`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ImageHub {
    #[serde(default, deserialize_with = "flex::optional_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default, deserialize_with = "flex::optional_bool", skip_serializing)]
    pub ping: Option<bool>,
}

/// An image present on the container host (`/xapi/docker/images`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct DockerImage {
    #[serde(default)]
    pub image_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "flex::string_map")]
    pub labels: IndexMap<String, String>,
}

impl DockerImage {
    /// First tag, or the image id for dangling `<none>:<none>` images.
    pub fn title(&self) -> &str {
        match self.tags.first() {
            Some(tag) if tag != "<none>:<none>" => tag,
            _ => &self.image_id,
        }
    }

    /// Repository part of the title, used to look up commands by image.
    pub fn repository(&self) -> &str {
        let title = self.title();
        match title.rsplit_once(':') {
            Some((repository, tag)) if !tag.contains('/') => repository,
            _ => title,
        }
    }
}

/// Informational reachability reported alongside hosts and hubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingStatus {
    Ok,
    Down,
    NoResponse,
}

impl From<Option<bool>> for PingStatus {
    fn from(ping: Option<bool>) -> Self {
        match ping {
            Some(true) => PingStatus::Ok,
            Some(false) => PingStatus::Down,
            None => PingStatus::NoResponse,
        }
    }
}

impl fmt::Display for PingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PingStatus::Ok => "OK",
            PingStatus::Down => "Down",
            PingStatus::NoResponse => "No response to ping",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dangling_images_use_their_id_as_title() {
        let image: DockerImage = serde_json::from_value(json!({
            "image-id": "sha256:abc",
            "tags": ["<none>:<none>"],
            "labels": {"org.nrg.commands": "[]"}
        }))
        .unwrap();
        assert_eq!(image.title(), "sha256:abc");
    }

    #[test]
    fn repository_strips_tag_but_keeps_registry_port() {
        let image = DockerImage {
            image_id: "sha256:1".into(),
            tags: vec!["registry.local:5000/xnat/debug".into()],
            ..Default::default()
        };
        assert_eq!(image.repository(), "registry.local:5000/xnat/debug");

        let tagged = DockerImage {
            tags: vec!["xnat/debug:1.0".into()],
            ..Default::default()
        };
        assert_eq!(tagged.repository(), "xnat/debug");
    }

    #[test]
    fn host_ping_is_not_posted_back() {
        let host: ContainerHost = serde_json::from_value(json!({
            "id": 1,
            "host": "unix:///var/run/docker.sock",
            "swarm-mode": false,
            "ping": true
        }))
        .unwrap();
        assert_eq!(PingStatus::from(host.ping).to_string(), "OK");
        let body = serde_json::to_value(&host).unwrap();
        assert!(body.get("ping").is_none());
        assert_eq!(PingStatus::from(None).to_string(), "No response to ping");
    }
}
