//! Convention fallback: derive controller/action/params from path shape.
//!
//! When no explicit route matches, a path of the form
//! `/namespace/Controller/action/param1/param2` resolves structurally: a
//! chain of lowercase-initial namespace segments, one capitalized-initial
//! controller segment (the disambiguator against ordinary path routes), a
//! required action segment, and any remaining segments as positional
//! parameters. Whether the controller and action actually exist is checked
//! later, against the registry — a convention guess that resolves to
//! nothing is a 404, never a crash.

use once_cell::sync::Lazy;
use regex::Regex;

static CONVENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^/(?<controller>(?:[a-z0-9_]\w*/)*[A-Z]\w*)/(?<action>\w+)(?:/(?<params>[^?]*?))?/?$",
    )
    .expect("convention pattern is valid")
});

/// A structural match against the convention pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionMatch {
    /// Dotted controller name (`admin/User` becomes `admin.User`).
    pub controller: String,
    pub action: String,
    /// Remaining path segments, in order.
    pub params: Vec<String>,
}

/// Resolve a path against the convention, or report no match.
pub fn resolve(path: &str) -> Option<ConventionMatch> {
    let caps = CONVENTION.captures(path)?;
    let controller = caps.name("controller")?.as_str().replace('/', ".");
    let action = caps.name("action")?.as_str().to_string();
    let params = caps
        .name("params")
        .map(|m| {
            m.as_str()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(ConventionMatch {
        controller,
        action,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_controller_action_params() {
        let m = resolve("/User/profile/42").unwrap();
        assert_eq!(m.controller, "User");
        assert_eq!(m.action, "profile");
        assert_eq!(m.params, vec!["42"]);
    }

    #[test]
    fn resolves_namespaced_controllers() {
        let m = resolve("/admin/User/edit/7/full").unwrap();
        assert_eq!(m.controller, "admin.User");
        assert_eq!(m.action, "edit");
        assert_eq!(m.params, vec!["7", "full"]);
    }

    #[test]
    fn rejects_lowercase_controller() {
        assert!(resolve("/user/profile").is_none());
    }

    #[test]
    fn rejects_missing_action() {
        assert!(resolve("/User").is_none());
        assert!(resolve("/User/").is_none());
    }

    #[test]
    fn tolerates_trailing_slash() {
        let m = resolve("/User/profile/").unwrap();
        assert_eq!(m.action, "profile");
        assert!(m.params.is_empty());
    }
}
