//! Form state and the register/search action cycle
//!
//! One [`FormState`] per form instance, owned by whoever drives the form
//! (the HTTP server, or a single CLI invocation). Every step takes a state
//! and hands back a new one:
//!
//! ```text
//! Idle ──begin──► Submitting ──finish──► Succeeded | Failed ──settle──► Idle
//! ```
//!
//! A failed action keeps the previous response. The failure is logged and
//! recorded as a [`FailureKind`]; nothing else changes.

mod internal;

use serde::{Deserialize, Serialize};

use crate::matching::{Category, Entry, Revision};

pub use internal::{run_action, submit, Services};

/// The two things a user can do with the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Register,
    Search,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Register => "register",
            Action::Search => "search",
        }
    }
}

/// Where a form instance is in its action cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "action")]
pub enum Phase {
    Idle,
    Submitting(Action),
    Succeeded(Action),
    Failed(Action),
}

/// Which external collaborator an action failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Embedding,
    VectorStore,
}

/// Result shown to the user, rendered verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    /// Human-readable summary; search summaries embed the cleaned matches as JSON
    pub content: String,
    pub action: Action,
}

/// Errors an action can end with
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("content is required")]
    EmptyContent,
    #[error("another action is still in flight")]
    Busy,
    #[error("embedding request failed: {0:#}")]
    Embedding(anyhow::Error),
    #[error("vector store request failed: {0:#}")]
    VectorStore(anyhow::Error),
    /// The action stopped without producing an outcome (a panic)
    #[error("action aborted before completing")]
    Aborted,
}

impl ActionError {
    /// External collaborator at fault, if any
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ActionError::Embedding(_) => Some(FailureKind::Embedding),
            ActionError::VectorStore(_) => Some(FailureKind::VectorStore),
            ActionError::EmptyContent | ActionError::Busy | ActionError::Aborted => None,
        }
    }
}

/// Everything one form instance holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub revision: Revision,
    pub content: String,
    pub id: String,
    pub category: Option<Category>,
    pub phase: Phase,
    pub last_response: Option<ApiResponse>,
    pub last_failure: Option<FailureKind>,
}

impl FormState {
    /// Fresh form. The categorized revision starts with `engineer` selected.
    pub fn new(revision: Revision) -> Self {
        Self {
            revision,
            content: String::new(),
            id: String::new(),
            category: revision.has_categories().then(Category::default),
            phase: Phase::Idle,
            last_response: None,
            last_failure: None,
        }
    }

    /// Replace the field values, dropping fields the revision does not have.
    ///
    /// A categorized form always has a selection: `None` keeps the current one.
    pub fn with_fields(
        mut self,
        content: impl Into<String>,
        id: impl Into<String>,
        category: Option<Category>,
    ) -> Self {
        self.content = content.into();
        self.id = if self.revision.has_id_field() {
            id.into()
        } else {
            String::new()
        };
        self.category = if self.revision.has_categories() {
            category.or(self.category).or(Some(Category::default()))
        } else {
            None
        };
        self
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Submitting(_))
    }

    /// Both action controls are enabled only when this is true
    pub fn can_submit(&self) -> bool {
        !self.content.is_empty() && !self.is_busy()
    }

    /// Current field values as an entry
    pub fn entry(&self) -> Entry {
        Entry {
            content: self.content.clone(),
            id: self.id.clone(),
            category: self.category,
        }
        .for_revision(self.revision)
    }

    /// Enter `Submitting`, or refuse if the controls would be disabled
    pub fn begin(&self, action: Action) -> Result<FormState, ActionError> {
        if self.is_busy() {
            return Err(ActionError::Busy);
        }
        if self.content.is_empty() {
            return Err(ActionError::EmptyContent);
        }

        tracing::debug!(action = action.as_str(), "form submitting");
        Ok(FormState {
            phase: Phase::Submitting(action),
            ..self.clone()
        })
    }

    /// Record the outcome of the in-flight action
    pub fn finish(self, outcome: Result<ApiResponse, ActionError>) -> FormState {
        let action = match self.phase {
            Phase::Submitting(action) => action,
            other => {
                tracing::warn!(phase = ?other, "finish called with no action in flight");
                return self;
            }
        };

        match outcome {
            Ok(response) => FormState {
                phase: Phase::Succeeded(action),
                last_response: Some(response),
                last_failure: None,
                ..self
            },
            Err(error) => {
                tracing::error!(
                    action = action.as_str(),
                    kind = ?error.failure_kind(),
                    error = %error,
                    "form action failed"
                );
                FormState {
                    phase: Phase::Failed(action),
                    last_failure: error.failure_kind(),
                    ..self
                }
            }
        }
    }

    /// Back to `Idle` after an outcome
    pub fn settle(self) -> FormState {
        match self.phase {
            Phase::Succeeded(_) | Phase::Failed(_) => FormState {
                phase: Phase::Idle,
                ..self
            },
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(action: Action) -> ApiResponse {
        ApiResponse {
            message: "Success".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            content: "ok".to_string(),
            action,
        }
    }

    #[test]
    fn test_new_form_defaults() {
        let form = FormState::new(Revision::Categorized);
        assert_eq!(form.category, Some(Category::Engineer));
        assert_eq!(form.phase, Phase::Idle);
        assert!(!form.can_submit());

        let form = FormState::new(Revision::Embedded);
        assert_eq!(form.category, None);
    }

    #[test]
    fn test_with_fields_respects_revision() {
        let form = FormState::new(Revision::Mock).with_fields("text", "E-1", Some(Category::Project));
        assert_eq!(form.id, "");
        assert_eq!(form.category, None);

        let form =
            FormState::new(Revision::Categorized).with_fields("text", "E-1", Some(Category::Project));
        assert_eq!(form.id, "E-1");
        assert_eq!(form.category, Some(Category::Project));

        let form = form.with_fields("other", "", None);
        assert_eq!(form.category, Some(Category::Project));
    }

    #[test]
    fn test_begin_requires_content() {
        let form = FormState::new(Revision::Embedded);
        assert!(matches!(form.begin(Action::Search), Err(ActionError::EmptyContent)));
    }

    #[test]
    fn test_begin_refuses_overlap() {
        let form = FormState::new(Revision::Embedded).with_fields("text", "", None);
        let submitting = form.begin(Action::Register).unwrap();

        assert!(submitting.is_busy());
        assert!(!submitting.can_submit());
        assert!(matches!(submitting.begin(Action::Search), Err(ActionError::Busy)));
    }

    #[test]
    fn test_success_cycle() {
        let form = FormState::new(Revision::Embedded).with_fields("text", "", None);
        let done = form
            .begin(Action::Register)
            .unwrap()
            .finish(Ok(response(Action::Register)));

        assert_eq!(done.phase, Phase::Succeeded(Action::Register));
        let idle = done.settle();
        assert_eq!(idle.phase, Phase::Idle);
        assert_eq!(idle.last_response, Some(response(Action::Register)));
        assert!(idle.can_submit());
    }

    #[test]
    fn test_failure_keeps_previous_response() {
        let form = FormState::new(Revision::Embedded)
            .with_fields("text", "", None)
            .begin(Action::Register)
            .unwrap()
            .finish(Ok(response(Action::Register)))
            .settle();

        let failed = form
            .begin(Action::Search)
            .unwrap()
            .finish(Err(ActionError::VectorStore(anyhow::anyhow!("503"))));

        assert_eq!(failed.phase, Phase::Failed(Action::Search));
        assert_eq!(failed.last_response, Some(response(Action::Register)));
        assert_eq!(failed.last_failure, Some(FailureKind::VectorStore));
        assert_eq!(failed.settle().phase, Phase::Idle);
    }

    #[test]
    fn test_success_clears_failure() {
        let form = FormState::new(Revision::Embedded)
            .with_fields("text", "", None)
            .begin(Action::Search)
            .unwrap()
            .finish(Err(ActionError::Embedding(anyhow::anyhow!("401"))))
            .settle();
        assert_eq!(form.last_failure, Some(FailureKind::Embedding));

        let form = form
            .begin(Action::Search)
            .unwrap()
            .finish(Ok(response(Action::Search)));
        assert_eq!(form.last_failure, None);
    }

    #[test]
    fn test_aborted_action_returns_to_idle() {
        let form = FormState::new(Revision::Embedded)
            .with_fields("text", "", None)
            .begin(Action::Register)
            .unwrap()
            .finish(Err(ActionError::Aborted))
            .settle();

        assert_eq!(form.phase, Phase::Idle);
        assert_eq!(form.last_failure, None);
        assert!(form.can_submit());
    }

    #[test]
    fn test_finish_without_begin_is_noop() {
        let form = FormState::new(Revision::Embedded).with_fields("text", "", None);
        let after = form.clone().finish(Ok(response(Action::Search)));
        assert_eq!(after, form);
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_value(Phase::Submitting(Action::Search)).unwrap();
        assert_eq!(json, serde_json::json!({"state": "submitting", "action": "search"}));
        let json = serde_json::to_value(Phase::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"state": "idle"}));
    }

    #[test]
    fn test_error_display_includes_chain() {
        let err = ActionError::Embedding(
            anyhow::anyhow!("401 Unauthorized").context("Embedding service returned an error"),
        );
        let message = err.to_string();
        assert!(message.contains("embedding request failed"));
        assert!(message.contains("401 Unauthorized"));
    }
}
