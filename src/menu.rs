//! Menu

use serde::{Deserialize, Serialize};

/// A snapshot of a sellable menu item.
///
/// Line items own a copy of this, so an upstream price change never rewrites
/// what is already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Menu item identifier, as issued by the restaurant API.
    pub id: String,

    /// Display name
    pub name: String,

    /// Base price in minor currency units
    pub price: u64,

    /// Option groups that can be configured on this item
    #[serde(default)]
    pub options: Vec<MenuOption>,
}

impl MenuItem {
    /// Create a menu item without any configurable options.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            options: Vec::new(),
        }
    }

    /// Add an option group to the item.
    #[must_use]
    pub fn with_option(mut self, option: MenuOption) -> Self {
        self.options.push(option);
        self
    }

    /// Look up an option group by id.
    pub fn option(&self, option_id: &str) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Look up a single choice within an option group.
    pub fn choice(&self, option_id: &str, choice_id: &str) -> Option<&OptionChoice> {
        self.option(option_id)?.choice(choice_id)
    }
}

/// A group of choices on a menu item, e.g. "Size" or "Extras".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    /// Option identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Whether a choice must be made before the item can be ordered
    #[serde(default)]
    pub required: bool,

    /// Available choices
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
}

impl MenuOption {
    /// Create an option group with no choices.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, required: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            required,
            choices: Vec::new(),
        }
    }

    /// Add a choice to the option group.
    #[must_use]
    pub fn with_choice(mut self, choice: OptionChoice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Look up a choice by id.
    pub fn choice(&self, choice_id: &str) -> Option<&OptionChoice> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }
}

/// A single selectable choice and its surcharge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChoice {
    /// Choice identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Surcharge in minor currency units
    #[serde(default)]
    pub price: u64,
}

impl OptionChoice {
    /// Create a choice.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// The choices a guest picked for one option group.
///
/// `choice_ids` is a set: order and duplicates carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option group identifier
    pub option_id: String,

    /// Chosen choice identifiers
    pub choice_ids: Vec<String>,
}

impl SelectedOption {
    /// Create a selection for an option group.
    pub fn new<I, S>(option_id: impl Into<String>, choice_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            option_id: option_id.into(),
            choice_ids: choice_ids.into_iter().map(Into::into).collect(),
        }
    }
}
