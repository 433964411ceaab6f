//! Visibility rules deciding whether a variation applies to a request.

use serde::{Deserialize, Serialize};

use crate::nested::Tree;

/// One configured visibility condition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionConfig {
    /// Condition plugin id, for example `request_path`.
    pub id: String,
    /// Invert the evaluated result.
    pub negate: bool,
    /// Condition-specific settings.
    pub settings: Tree,
}

impl ConditionConfig {
    /// Create a non-negated condition `id` with no settings.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Invert this condition.
    #[must_use]
    pub const fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}

/// Evaluates a visibility condition against the current request context.
///
/// Implemented for closures so callers can supply ad hoc evaluators.
pub trait ConditionEvaluator: Send + Sync {
    /// Whether `condition`, ignoring negation, holds for the current context.
    fn evaluate(&self, condition: &ConditionConfig) -> bool;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&ConditionConfig) -> bool + Send + Sync,
{
    fn evaluate(&self, condition: &ConditionConfig) -> bool {
        self(condition)
    }
}

/// Set of visibility conditions attached to a variation.
///
/// Every condition must apply; an empty set always applies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityRules {
    conditions: Vec<ConditionConfig>,
}

impl VisibilityRules {
    /// Create a rule set from `conditions`.
    #[must_use]
    pub const fn new(conditions: Vec<ConditionConfig>) -> Self {
        Self { conditions }
    }

    /// Configured conditions.
    #[must_use]
    pub fn conditions(&self) -> &[ConditionConfig] {
        &self.conditions
    }

    /// Whether no conditions are configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether every condition applies under `evaluator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use settings_variants::variation::{ConditionConfig, VisibilityRules};
    ///
    /// let rules = VisibilityRules::new(vec![ConditionConfig::new("admin_route").negated()]);
    /// let on_admin_route = |c: &ConditionConfig| c.id == "admin_route";
    /// assert!(!rules.applies(&on_admin_route));
    /// ```
    #[must_use]
    pub fn applies(&self, evaluator: &dyn ConditionEvaluator) -> bool {
        self.conditions
            .iter()
            .all(|condition| evaluator.evaluate(condition) != condition.negate)
    }
}
