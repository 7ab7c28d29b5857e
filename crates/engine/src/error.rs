//! Component failures and their conversion into error modals.

use thiserror::Error;
use xcs_api::ApiError;
use xcs_types::ErrorModal;

/// Everything a component operation can fail with.
///
/// None of these are retried. The caller shows [`ComponentError::modal`] and
/// the user re-runs the operation.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Required fields left empty, one message per field.
    #[error("Errors found: {}", .0.join(" "))]
    Validation(Vec<String>),
    /// The operation referenced something that is not there, such as a root
    /// element missing from a wrapper's inputs.
    #[error("{0}")]
    MissingReference(String),
    /// A client-side refusal that never reaches the server.
    #[error("{message}")]
    Rejected { title: String, message: String },
    /// The server call failed. `title` names the action when known.
    #[error("{source}")]
    Api {
        title: Option<String>,
        #[source]
        source: ApiError,
    },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl ComponentError {
    pub fn rejected(title: impl Into<String>, message: impl Into<String>) -> Self {
        ComponentError::Rejected {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Wrap an API failure under an action title, for use with `map_err`.
    pub fn api(title: impl Into<String>) -> impl FnOnce(ApiError) -> ComponentError {
        let title = title.into();
        move |source| ComponentError::Api {
            title: Some(title),
            source,
        }
    }

    /// HTTP status of a failed server call.
    pub fn status(&self) -> Option<u16> {
        match self {
            ComponentError::Api { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The blocking modal shown for this failure.
    pub fn modal(&self) -> ErrorModal {
        match self {
            ComponentError::Validation(errors) => {
                let bullets: Vec<String> = errors.iter().map(|error| format!("  • {error}")).collect();
                ErrorModal {
                    title: "Validation Error".into(),
                    message: format!("Errors found:\n{}", bullets.join("\n")),
                }
            }
            ComponentError::MissingReference(message) => ErrorModal {
                title: "Error".into(),
                message: message.clone(),
            },
            ComponentError::Rejected { title, message } => ErrorModal {
                title: title.clone(),
                message: message.clone(),
            },
            ComponentError::Api { title, source } => {
                let title = match title {
                    Some(title) => format!("Error Found: {title}"),
                    None => "Error".into(),
                };
                let message = match source {
                    ApiError::Http { body, .. } if !body.trim().is_empty() => format!("{source}\n{}", body.trim()),
                    _ => source.to_string(),
                };
                ErrorModal { title, message }
            }
        }
    }
}

impl From<ApiError> for ComponentError {
    fn from(source: ApiError) -> Self {
        ComponentError::Api { title: None, source }
    }
}

/// Required-field check: `<name> requires a value.` for each empty field.
pub(crate) fn require_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> ComponentResult<()> {
    let errors: Vec<String> = fields
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| format!("{name} requires a value."))
        .collect();
    if errors.is_empty() { Ok(()) } else { Err(ComponentError::Validation(errors)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_failures_show_status_text_and_body() {
        let error = ComponentError::api("Could Not Pull Image")(ApiError::Http {
            status: 404,
            status_text: "Not Found".into(),
            body: "no such image\n".into(),
        });
        let modal = error.modal();
        assert_eq!(modal.title, "Error Found: Could Not Pull Image");
        assert_eq!(modal.message, "Error 404: Not Found\nno such image");
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn untitled_api_failures_use_plain_error_title() {
        let error: ComponentError = ApiError::Configuration("boom".into()).into();
        assert_eq!(error.modal().title, "Error");
    }

    #[test]
    fn validation_lists_every_empty_field() {
        let error = require_fields([("url", ""), ("name", "  "), ("tag", "latest")]).unwrap_err();
        let modal = error.modal();
        assert_eq!(modal.title, "Validation Error");
        assert_eq!(modal.message, "Errors found:\n  • url requires a value.\n  • name requires a value.");
    }
}
