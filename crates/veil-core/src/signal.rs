//! Names of the in-page unlock signals.
//!
//! Listeners choose between the generic signal (react to every unlock) and
//! the scope-qualified one (react only to a given scope).

use crate::scope::{Scope, ScopeId};

/// Fired after any unlock.
pub const UNLOCKED: &str = "veil:unlocked";

/// Fired once the page becomes interactive and storage can be read.
pub const INTERACTIVE: &str = "veil:interactive";

/// Scope-qualified unlock signal name.
pub fn scoped(id: &ScopeId) -> String {
    format!("{}:{}", UNLOCKED, id)
}

/// Every signal name emitted by an unlock of `scope`, generic first.
pub fn names_for(scope: &Scope) -> Vec<String> {
    let mut names = vec![UNLOCKED.to_string()];
    if let Some(id) = scope.id() {
        names.push(scoped(id));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_unlock_emits_generic_only() {
        assert_eq!(names_for(&Scope::global()), vec!["veil:unlocked"]);
    }

    #[test]
    fn named_unlock_emits_both() {
        assert_eq!(
            names_for(&Scope::isolated("iq-plugin")),
            vec!["veil:unlocked", "veil:unlocked:iq-plugin"]
        );
    }
}
