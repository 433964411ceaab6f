//! Access decisions for variation operations.

use std::fmt;

use crate::definition::PluginDefinition;
use crate::variation::{ConditionEvaluator, VariationEntity};

/// Reason reported when deletion of a locked variation is refused.
pub const LOCKED_REASON: &str = "A locked settings config cannot be removed.";

/// Operation whose access is checked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Resolve the variation for the current request.
    View,
    /// Edit the variation.
    Update,
    /// Remove the variation.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Account whose permissions are checked.
pub trait Account: Send + Sync {
    /// Whether the account holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}

/// Account holding every permission.
#[derive(Clone, Copy, Debug, Default)]
pub struct Superuser;

impl Account for Superuser {
    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}

/// Account holding an explicit permission list.
#[derive(Clone, Debug, Default)]
pub struct Permissions(pub Vec<String>);

impl Account for Permissions {
    fn has_permission(&self, permission: &str) -> bool {
        self.0.iter().any(|p| p == permission)
    }
}

/// Outcome of an access check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AccessResult {
    /// Access granted.
    Allowed,
    /// No grant applies.
    Neutral,
    /// Access refused outright.
    Forbidden(String),
}

impl AccessResult {
    /// Whether access is granted.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Access rules for variations.
///
/// Deleting a locked variation is always forbidden. Updates and deletes
/// require the plugin type's admin permission. Viewing is decided by the
/// variation's visibility rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettingsAccess;

impl SettingsAccess {
    /// Decide whether `account` may perform `operation` on `entity`.
    #[must_use]
    pub fn check(
        entity: &VariationEntity,
        definition: &PluginDefinition,
        operation: Operation,
        account: &dyn Account,
        conditions: &dyn ConditionEvaluator,
    ) -> AccessResult {
        if operation == Operation::Delete && entity.lock {
            return AccessResult::Forbidden(LOCKED_REASON.to_owned());
        }
        if operation != Operation::View {
            return if account.has_permission(&definition.admin_permission) {
                AccessResult::Allowed
            } else {
                AccessResult::Neutral
            };
        }
        if entity.visibility.applies(conditions) {
            AccessResult::Allowed
        } else {
            AccessResult::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::definition::DEFAULT_ADMIN_PERMISSION;
    use crate::variation::{ConditionConfig, VisibilityRules};

    fn on_front(condition: &ConditionConfig) -> bool {
        condition.id == "front"
    }

    fn editor() -> Permissions {
        Permissions(vec![DEFAULT_ADMIN_PERMISSION.to_owned()])
    }

    #[rstest]
    #[case::locked_delete(true, Operation::Delete, true, AccessResult::Forbidden(LOCKED_REASON.to_owned()))]
    #[case::unlocked_delete(false, Operation::Delete, true, AccessResult::Allowed)]
    #[case::locked_update(true, Operation::Update, true, AccessResult::Allowed)]
    #[case::update_without_permission(false, Operation::Update, false, AccessResult::Neutral)]
    #[case::delete_without_permission(false, Operation::Delete, false, AccessResult::Neutral)]
    fn edits_need_the_admin_permission(
        #[case] lock: bool,
        #[case] operation: Operation,
        #[case] permitted: bool,
        #[case] expected: AccessResult,
    ) {
        let mut entity = VariationEntity::new("theme", "Dark").with_id("theme_dark");
        entity.lock = lock;
        let account = if permitted { editor() } else { Permissions::default() };
        let outcome = SettingsAccess::check(
            &entity,
            &PluginDefinition::new("theme"),
            operation,
            &account,
            &on_front,
        );
        assert_eq!(outcome, expected);
    }

    #[rstest]
    #[case(vec![], true)]
    #[case(vec![ConditionConfig::new("front")], true)]
    #[case(vec![ConditionConfig::new("front").negated()], false)]
    fn viewing_follows_visibility(#[case] conditions: Vec<ConditionConfig>, #[case] allowed: bool) {
        let mut entity = VariationEntity::new("theme", "Dark");
        entity.visibility = VisibilityRules::new(conditions);
        let outcome = SettingsAccess::check(
            &entity,
            &PluginDefinition::new("theme"),
            Operation::View,
            &Permissions::default(),
            &on_front,
        );
        assert_eq!(outcome.is_allowed(), allowed);
    }

    #[rstest]
    fn operations_display_in_lowercase() {
        assert_eq!(Operation::Delete.to_string(), "delete");
        assert!(Superuser.has_permission("anything"));
    }
}
