//! Action types carried by graph vertices and change steps.

use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};

use super::change::{
    ChangeStepFilterFunc, create_change_step_filter, delete_change_step_filter,
    un_change_change_step_filter, update_change_step_filter,
};

/// The action planned for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// The resource will be created.
    #[serde(alias = "create")]
    Create,
    /// The resource will be updated in place.
    #[serde(alias = "update")]
    Update,
    /// The resource will be deleted.
    #[serde(alias = "delete")]
    Delete,
    /// The resource stays as it is.
    #[serde(alias = "unchange", alias = "unchanged")]
    UnChange,
}

impl ActionType {
    /// Every action type, in display order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Update, Self::Delete, Self::UnChange];

    /// Returns the present-participle label of the action.
    #[must_use]
    pub const fn ing(self) -> &'static str {
        match self {
            Self::Create => "Creating",
            Self::Update => "Updating",
            Self::Delete => "Deleting",
            Self::UnChange => "Unchanged",
        }
    }

    /// Returns the presentation color of the action.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Create => Color::Green,
            Self::Update => Color::Blue,
            Self::Delete => Color::Red,
            Self::UnChange => Color::BrightBlack,
        }
    }

    /// Returns the colorized present-participle label.
    #[must_use]
    pub fn pretty_string(self) -> String {
        self.ing().color(self.color()).to_string()
    }

    /// Returns the built-in change step filter selecting this action.
    #[must_use]
    pub fn filter<S>(self) -> ChangeStepFilterFunc<S> {
        match self {
            Self::Create => create_change_step_filter,
            Self::Update => update_change_step_filter,
            Self::Delete => delete_change_step_filter,
            Self::UnChange => un_change_change_step_filter,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::UnChange => "unchange",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ing() {
        assert_eq!(ActionType::Create.ing(), "Creating");
        assert_eq!(ActionType::Delete.ing(), "Deleting");
        assert_eq!(ActionType::Update.ing(), "Updating");
        assert_eq!(ActionType::UnChange.ing(), "Unchanged");
    }

    #[test]
    fn test_colors() {
        assert_eq!(ActionType::Create.color(), Color::Green);
        assert_eq!(ActionType::Delete.color(), Color::Red);
        assert_eq!(ActionType::Update.color(), Color::Blue);
        assert_eq!(ActionType::UnChange.color(), Color::BrightBlack);
        for action in ActionType::ALL {
            assert!(action.pretty_string().contains(action.ing()));
        }
    }

    #[test]
    fn test_deserialize_aliases() {
        let action: ActionType = serde_json::from_str("\"create\"").unwrap();
        assert_eq!(action, ActionType::Create);
        let action: ActionType = serde_json::from_str("\"UnChange\"").unwrap();
        assert_eq!(action, ActionType::UnChange);
    }
}
