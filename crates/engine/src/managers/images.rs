use serde_json::Value;
use tracing::{info, warn};
use xcs_types::{Cell, Command, DockerImage, Table, TableRow};

use crate::error::{ComponentError, ComponentResult, require_fields};
use crate::store::{Snapshot, Store};
use crate::{Outcome, View};

pub const NO_IMAGES_MESSAGE: &str = "There are no images installed in this XNAT.";

pub async fn list_images(store: &Store) -> ComponentResult<Vec<DockerImage>> {
    store
        .client()
        .list_images()
        .await
        .map_err(ComponentError::api("Could not retrieve images"))
}

/// Installed images with the commands registered against each.
pub fn images_table(images: &[DockerImage], snapshot: &Snapshot) -> Table {
    let mut table = Table::new(["Image", "Image ID", "Commands"]).with_empty_message(NO_IMAGES_MESSAGE);
    for image in images {
        let commands = snapshot
            .commands
            .iter()
            .filter(|command| image.tags.iter().any(|tag| tag == command.image_name()))
            .map(|command| command.name.clone())
            .collect();
        table.push(TableRow::new(
            image.image_id.clone(),
            vec![
                Cell::text(image.title()),
                Cell::text(xcs_util::ellipsize_middle_if_sha_like(&image.image_id, 16)),
                Cell::List { items: commands },
            ],
        ));
    }
    table
}

pub fn find_image<'a>(images: &'a [DockerImage], key: &str) -> ComponentResult<&'a DockerImage> {
    images
        .iter()
        .find(|image| image.image_id == key || image.tags.iter().any(|tag| tag == key))
        .ok_or_else(|| ComponentError::MissingReference(format!("No image matching \"{key}\" was found.")))
}

/// Commands registered for one image.
pub async fn image_commands(store: &Store, image: &str) -> ComponentResult<Vec<Command>> {
    store
        .client()
        .list_commands(Some(image))
        .await
        .map_err(ComponentError::api("Could not retrieve commands"))
}

/// Command name, XNAT actions with their contexts, and version.
pub fn image_commands_table(commands: &[Command]) -> Table {
    let mut table = Table::new(["Command", "XNAT Actions", "Site-wide Config", "Version", "Actions"])
        .with_empty_message("No Commands Found");
    for command in commands {
        let actions = if command.wrappers.is_empty() {
            vec!["N/A".to_string()]
        } else {
            command
                .wrappers
                .iter()
                .map(|wrapper| match wrapper.contexts.as_slice() {
                    [] => wrapper.display_label().to_string(),
                    contexts => format!("{} ({})", wrapper.display_label(), contexts.join(", ")),
                })
                .collect()
        };
        table.push(TableRow::new(
            command.id.to_string(),
            vec![
                Cell::text(&command.name),
                Cell::List { items: actions },
                Cell::text("N/A"),
                Cell::text(command.version_label()),
                Cell::action("Delete"),
            ],
        ));
    }
    table
}

/// Image pull form. `tag` may be given with or without its leading colon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    pub image: String,
    pub tag: String,
    pub hub_id: Option<i64>,
}

impl PullRequest {
    pub fn validate(&self) -> ComponentResult<()> {
        require_fields([("image", self.image.as_str()), ("tag", self.tag.as_str())])
    }

    /// `image:tag`, adding the colon when the tag lacks one.
    pub fn image_name(&self) -> String {
        let tag = self.tag.trim();
        if tag.is_empty() || tag.contains(':') {
            format!("{}{tag}", self.image.trim())
        } else {
            format!("{}:{tag}", self.image.trim())
        }
    }
}

pub async fn pull_image(store: &Store, request: &PullRequest) -> ComponentResult<Outcome> {
    request.validate()?;
    let image = request.image_name();
    store
        .client()
        .pull_image(&image, request.hub_id)
        .await
        .map_err(ComponentError::api("Could Not Pull Image"))?;
    info!(%image, "pulled image");
    Ok(Outcome::new("Pull request complete.", &[View::Images, View::Commands]))
}

/// Confirmation text for deleting an image; `force` is the second prompt
/// shown after the server refused because containers used the image.
pub fn delete_confirmation(image: &DockerImage, force: bool) -> String {
    if force {
        format!(
            "Containers have been run using {}. Please confirm that you want to delete this image.",
            image.title()
        )
    } else {
        format!(
            "Are you sure you'd like to delete the {} image? This action cannot be undone.",
            image.title()
        )
    }
}

#[derive(Debug)]
pub enum ImageDeletion {
    Deleted(Outcome),
    /// The server answered 500 to a plain delete. Ask again with this text,
    /// then retry with `force`.
    InUse { confirmation: String },
}

pub async fn delete_image(store: &Store, image: &DockerImage, force: bool) -> ComponentResult<ImageDeletion> {
    match store.client().delete_image(&image.image_id, force).await {
        Ok(()) => {
            info!(image = %image.title(), force, "deleted image");
            Ok(ImageDeletion::Deleted(Outcome::new(
                format!("{} image deleted.", image.title()),
                &[View::Images, View::Commands, View::History],
            )))
        }
        Err(error) if !force && error.status() == Some(500) => {
            warn!(image = %image.title(), "image is in use; asking to force delete");
            Ok(ImageDeletion::InUse {
                confirmation: delete_confirmation(image, true),
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Register a command definition, optionally against an image.
pub async fn add_command(store: &Store, image: Option<&str>, definition: &Value) -> ComponentResult<Outcome> {
    if !definition.is_object() {
        return Err(ComponentError::rejected(
            "Could Not Save",
            "A command definition must be a JSON object.",
        ));
    }
    store
        .client()
        .create_command(image, definition)
        .await
        .map_err(ComponentError::api("Could Not Save"))?;
    info!(image = image.unwrap_or(""), "saved command definition");
    Ok(Outcome::new("Command definition saved.", &[View::Images, View::Commands]))
}

/// Replace an existing command definition.
pub async fn replace_command(store: &Store, command_id: i64, definition: &Value) -> ComponentResult<Outcome> {
    store
        .client()
        .update_command(command_id, definition)
        .await
        .map_err(ComponentError::api("Could Not Save"))?;
    info!(command_id, "replaced command definition");
    Ok(Outcome::new("Command definition saved.", &[View::Images, View::Commands]))
}

pub fn delete_command_confirmation(command: &Command) -> String {
    format!(
        "Are you sure you'd like to delete the {} command definition? This action cannot be undone.",
        command.name
    )
}

pub async fn delete_command(store: &Store, command: &Command) -> ComponentResult<Outcome> {
    store.client().delete_command(command.id).await?;
    info!(command = %command.name, "deleted command");
    Ok(Outcome::new(
        format!("\"{}\" deleted.", command.name),
        &[View::Images, View::Commands, View::History],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_commands;
    use xcs_types::Scope;

    #[test]
    fn pull_prefixes_tag_with_colon() {
        let mut request = PullRequest {
            image: "xnat/dcm2niix".into(),
            tag: "latest".into(),
            hub_id: None,
        };
        assert_eq!(request.image_name(), "xnat/dcm2niix:latest");
        request.tag = ":1.5".into();
        assert_eq!(request.image_name(), "xnat/dcm2niix:1.5");
    }

    #[test]
    fn pull_needs_image_and_tag() {
        let error = PullRequest::default().validate().unwrap_err();
        assert_eq!(
            error.modal().message,
            "Errors found:\n  • image requires a value.\n  • tag requires a value."
        );
    }

    #[test]
    fn images_list_their_registered_commands() {
        let snapshot = Snapshot::from_commands(Scope::Site, sample_commands());
        let images = vec![DockerImage {
            image_id: "sha256:0123456789abcdef0123456789abcdef".into(),
            tags: vec!["xnat/debug:2.0".into()],
            ..Default::default()
        }];
        let table = images_table(&images, &snapshot);
        assert_eq!(table.rows[0].cells[0].as_text(), Some("xnat/debug:2.0"));
        assert_eq!(table.rows[0].cells[2], Cell::List { items: vec!["debug".into()] });
        assert!(images_table(&[], &snapshot).empty_message.starts_with("There are no images"));
    }

    #[test]
    fn command_table_lists_actions_with_contexts() {
        let table = image_commands_table(&sample_commands());
        assert_eq!(
            table.rows[0].cells[1],
            Cell::List {
                items: vec![
                    "Convert scan (xnat:imageScanData)".into(),
                    "dcm2niix-session (xnat:imageSessionData)".into()
                ]
            }
        );
    }

    #[test]
    fn force_confirmation_mentions_prior_containers() {
        let image = DockerImage {
            image_id: "sha256:1".into(),
            tags: vec!["xnat/debug:2.0".into()],
            ..Default::default()
        };
        assert!(delete_confirmation(&image, true).starts_with("Containers have been run using xnat/debug:2.0."));
    }
}
