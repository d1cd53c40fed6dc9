//! The module contains the `ExpenseItem` type, a single dated financial event.
//!
//! Both expenses and earnings are represented by `ExpenseItem`, told apart by
//! their [`Category`].
use core::fmt;

use crate::Amount;

/// Whether money came in or went out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Category {
    Earn,
    #[default]
    Spend,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Earn => write!(f, "EARN"),
            Category::Spend => write!(f, "SPEND"),
        }
    }
}

/// Represent an item recorded for a date. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseItem {
    pub amount: Amount,
    pub description: String,
    pub category: Category,
}

impl ExpenseItem {
    pub fn new(amount: Amount, description: impl Into<String>, category: Category) -> Self {
        Self {
            amount,
            description: description.into(),
            category,
        }
    }

    /// Shortcut for the default `Spend` category.
    pub fn spend(amount: Amount, description: impl Into<String>) -> Self {
        Self::new(amount, description, Category::Spend)
    }

    pub fn earn(amount: Amount, description: impl Into<String>) -> Self {
        Self::new(amount, description, Category::Earn)
    }
}

impl fmt::Display for ExpenseItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${} ({})", self.description, self.amount, self.category)
    }
}
