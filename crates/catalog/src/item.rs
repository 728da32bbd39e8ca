use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scoopstock_core::{DomainError, DomainResult, ItemId};

/// Item lifecycle status.
///
/// `Archived` is terminal; the automatic sweep only ever moves items from
/// `Active` to `Discontinued`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Discontinued,
    Archived,
}

/// Categories eligible for automatic retirement when uncounted too long.
pub fn is_specialty_category(category: &str) -> bool {
    matches!(
        category.trim().to_ascii_lowercase().as_str(),
        "specialty" | "seasonal" | "specials"
    )
}

/// One distinct product line (counted and produced in multiple forms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    /// Cached timestamp of the most recent count, refreshed best-effort after
    /// count submission. Drives the lifecycle sweep.
    pub last_counted_at: Option<DateTime<Utc>>,
    pub discontinued_at: Option<DateTime<Utc>>,
    /// Set by an explicit operator discontinuation so the automatic sweep never
    /// reverses (or re-applies over) a manual decision.
    pub manually_discontinued: bool,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        category: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            category: category.into(),
            status: ItemStatus::Active,
            created_at,
            last_counted_at: None,
            discontinued_at: None,
            manually_discontinued: false,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ItemStatus::Active
    }

    pub fn is_specialty(&self) -> bool {
        is_specialty_category(&self.category)
    }

    /// Operator-initiated discontinuation (typically a sold-out specialty).
    pub fn discontinue_manually(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            ItemStatus::Archived => Err(DomainError::invariant(
                "archived items cannot be discontinued",
            )),
            ItemStatus::Discontinued => {
                Err(DomainError::conflict("item is already discontinued"))
            }
            ItemStatus::Active => {
                self.status = ItemStatus::Discontinued;
                self.discontinued_at = Some(now);
                self.manually_discontinued = true;
                Ok(())
            }
        }
    }

    /// Sweep-initiated discontinuation. The caller is responsible for checking
    /// eligibility (specialty category, staleness, no manual flag).
    pub fn auto_discontinue(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ItemStatus::Active {
            return Err(DomainError::conflict("only active items can be swept"));
        }
        if self.manually_discontinued {
            return Err(DomainError::invariant(
                "sweep must not touch manually discontinued items",
            ));
        }
        self.status = ItemStatus::Discontinued;
        self.discontinued_at = Some(now);
        Ok(())
    }

    /// Bring a discontinued item back. Always resets to `Active` and clears the
    /// discontinuation metadata, regardless of how the item was retired.
    pub fn reactivate(&mut self) -> DomainResult<()> {
        match self.status {
            ItemStatus::Archived => {
                Err(DomainError::invariant("archived items cannot be reactivated"))
            }
            ItemStatus::Active => Err(DomainError::conflict("item is already active")),
            ItemStatus::Discontinued => {
                self.status = ItemStatus::Active;
                self.discontinued_at = None;
                self.manually_discontinued = false;
                Ok(())
            }
        }
    }

    /// Terminal removal from the roster. Allowed from any non-archived state.
    pub fn archive(&mut self) -> DomainResult<()> {
        if self.status == ItemStatus::Archived {
            return Err(DomainError::conflict("item is already archived"));
        }
        self.status = ItemStatus::Archived;
        Ok(())
    }

    /// Rename and/or recategorize. Archived items are read-only.
    pub fn update_details(
        &mut self,
        name: Option<String>,
        category: Option<String>,
    ) -> DomainResult<()> {
        if self.status == ItemStatus::Archived {
            return Err(DomainError::invariant("archived items cannot be edited"));
        }
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(category) = category {
            self.category = category;
        }
        Ok(())
    }

    /// Advance the `last_counted_at` cache. Never moves backwards.
    pub fn record_counted(&mut self, at: DateTime<Utc>) {
        match self.last_counted_at {
            Some(prev) if prev >= at => {}
            _ => self.last_counted_at = Some(at),
        }
    }
}
