//! Core domain types
//!
//! Defines the values shared by the collection model and the harness:
//! - Account identity and role grants
//! - Exploration and collection identifiers
//! - Exploration records and their search text
//! - Collection metadata and publication status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an exploration, assigned by the system under test
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExplorationId(pub String);

impl ExplorationId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw identifier string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExplorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a collection, assigned by the system under test
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub String);

impl CollectionId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw identifier string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Player (read-only) view path
    #[must_use]
    pub fn player_path(&self) -> String {
        format!("/collection/{}", self.0)
    }

    /// Editor view path
    #[must_use]
    pub fn editor_path(&self) -> String {
        format!("/collection_editor/create/{}", self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role granted to an account
///
/// New users start as exploration editors. Only an admin can grant the
/// collection editor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Default role of a freshly registered user
    #[default]
    ExplorationEditor,
    /// May create and edit collections
    CollectionEditor,
    /// Full administrative capability
    Admin,
}

impl Role {
    /// Whether this role may create or edit collections
    #[inline]
    #[must_use]
    pub fn can_edit_collections(&self) -> bool {
        matches!(self, Role::CollectionEditor | Role::Admin)
    }

    /// Name as shown in the admin role selector
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::ExplorationEditor => "exploration editor",
            Role::CollectionEditor => "collection editor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Part an account plays in a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorTag {
    Admin,
    Editor,
    Player,
    Creator,
}

impl fmt::Display for ActorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorTag::Admin => "admin",
            ActorTag::Editor => "editor",
            ActorTag::Player => "player",
            ActorTag::Creator => "creator",
        };
        f.write_str(name)
    }
}

/// A registered user
///
/// The part the account plays in a scenario ([`ActorTag`]) is tracked by
/// whoever registers it; the system under test only knows credentials and
/// the granted role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Account {
    /// Create account with the default role
    #[must_use]
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            role: Role::default(),
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Whether the account is an administrator
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Publication status of an exploration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationStatus {
    Draft,
    Published,
}

/// A published unit of content that collections reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exploration {
    pub id: ExplorationId,
    pub title: String,
    pub category: String,
    pub objective: String,
    pub status: ExplorationStatus,
}

impl Exploration {
    /// Case-insensitive substring match over title and objective
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&needle)
            || self.objective.to_lowercase().contains(&needle)
    }

    /// Summary as returned by the search layer
    #[must_use]
    pub fn summary(&self) -> ExplorationSummary {
        ExplorationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
        }
    }
}

/// Search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationSummary {
    pub id: ExplorationId,
    pub title: String,
    pub category: String,
}

/// Publication status of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Unpublished,
    DraftSaved,
    Published,
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublicationStatus::Unpublished => "unpublished",
            PublicationStatus::DraftSaved => "draft-saved",
            PublicationStatus::Published => "published",
        };
        f.write_str(name)
    }
}

/// Collection metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub title: String,
    pub objective: String,
    pub category: String,
}

/// A positioned reference to an exploration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNode {
    pub exploration_id: ExplorationId,
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_magician() -> Exploration {
        Exploration {
            id: ExplorationId::new("exp-1"),
            title: "The Lazy Magician".to_string(),
            category: "Algorithms".to_string(),
            objective: "discover the binary search algorithm".to_string(),
            status: ExplorationStatus::Published,
        }
    }

    #[test]
    fn search_matches_title_and_objective() {
        let exp = lazy_magician();
        assert!(exp.matches("Lazy"));
        assert!(exp.matches("lazy"));
        assert!(exp.matches("binary search"));
        assert!(!exp.matches("Linear"));
        assert!(!exp.matches("   "));
    }

    #[test]
    fn collection_paths() {
        let id = CollectionId::new("abc123");
        assert_eq!(id.player_path(), "/collection/abc123");
        assert_eq!(id.editor_path(), "/collection_editor/create/abc123");
    }

    #[test]
    fn only_granted_roles_edit_collections() {
        assert!(!Role::ExplorationEditor.can_edit_collections());
        assert!(Role::CollectionEditor.can_edit_collections());
        assert!(Role::Admin.can_edit_collections());
        assert_eq!(Role::CollectionEditor.to_string(), "collection editor");
    }
}
