//! # Kind & Role Module
//!
//! A `Kind` is a parser-defined category of tag (e.g. "function", "struct").
//! A `Role` is a non-definition use of an identifier a parser may want to
//! record (e.g. "imported", "included"). Both are plain value types owned
//! by whichever parser declares them; this crate only stores and renders
//! them.

use crate::entry::{RoleIndex, ROLE_DEFINITION};

/// A non-definition use of a tag's name, such as an import or an include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
        }
    }
}

/// A parser-defined tag category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kind {
    /// Single-letter code shown in the `kind` extension field.
    pub letter: char,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    /// Kinds used only as the target of references (never a definition).
    pub reference_only: bool,
    pub roles: Vec<Role>,
}

impl Kind {
    pub fn new(letter: char, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            letter,
            name: name.into(),
            description: description.into(),
            enabled: true,
            reference_only: false,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    /// Name of the role at `role_index`, or "unknown" if it doesn't exist.
    ///
    /// `role_index == 0` is always the distinguished "definition" role and
    /// is not stored in `roles`.
    pub fn role_name(&self, role_index: RoleIndex) -> &str {
        if role_index == ROLE_DEFINITION {
            return "definition";
        }
        self.roles
            .get((role_index - 1) as usize)
            .map(|r| r.name.as_str())
            .unwrap_or("unknown")
    }

    /// Whether `role_index` names a role that exists on this kind and is
    /// enabled. `ROLE_DEFINITION` is always valid.
    pub fn role_valid(&self, role_index: RoleIndex) -> bool {
        if role_index == ROLE_DEFINITION {
            return true;
        }
        self.roles
            .get((role_index - 1) as usize)
            .map(|r| r.enabled)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_role_is_always_valid() {
        let kind = Kind::new('f', "function", "functions");
        assert!(kind.role_valid(ROLE_DEFINITION));
        assert_eq!(kind.role_name(ROLE_DEFINITION), "definition");
    }

    #[test]
    fn declared_role_is_looked_up_by_index() {
        let kind = Kind::new('f', "function", "functions")
            .with_roles(vec![Role::new("imported", "imported symbol")]);
        assert!(kind.role_valid(1));
        assert_eq!(kind.role_name(1), "imported");
    }

    #[test]
    fn unknown_role_index_is_invalid() {
        let kind = Kind::new('f', "function", "functions");
        assert!(!kind.role_valid(1));
        assert_eq!(kind.role_name(1), "unknown");
    }

    #[test]
    fn disabled_role_is_invalid() {
        let mut role = Role::new("imported", "imported symbol");
        role.enabled = false;
        let kind = Kind::new('f', "function", "functions").with_roles(vec![role]);
        assert!(!kind.role_valid(1));
    }
}
