//! Route pattern compilation and target substitution.
//!
//! A route specification is a regular expression over request paths. Specs
//! without explicit anchors are anchored to the whole path, so `/user` never
//! matches `/user/10/edit`. Named capture groups use the `(?<name>...)`
//! syntax and surface as named parameter bindings on a match.
//!
//! Targets (`"Index.$1"`, `"Test.${named}"`) are parsed once at registration
//! into a controller template and an action template; substitution happens
//! per side, so a captured value containing `.` can never change where the
//! controller name ends and the action name begins.

use crate::error::PatternError;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum capture groups kept on the stack; route specs rarely bind more.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated named parameter storage for the dispatch hot path.
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// A compiled, whole-path-anchored route matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    spec: Arc<str>,
    regex: Regex,
    group_names: Arc<Vec<Option<String>>>,
}

impl CompiledPattern {
    /// Compile a route specification.
    ///
    /// Fails on an empty spec, on invalid regex syntax, and on a pattern
    /// that would accept the empty path (such a route could shadow every
    /// lookup for its method).
    pub fn compile(spec: &str) -> Result<Self, PatternError> {
        if spec.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let anchored = if !spec.starts_with('^') && !spec.ends_with('$') {
            format!("^{spec}$")
        } else {
            spec.to_string()
        };

        let regex = Regex::new(&anchored).map_err(|e| PatternError::Invalid {
            spec: spec.to_string(),
            reason: e.to_string(),
        })?;

        if regex.is_match("") {
            return Err(PatternError::MatchesEmpty {
                spec: spec.to_string(),
            });
        }

        let group_names: Vec<Option<String>> = regex
            .capture_names()
            .map(|n| n.map(str::to_string))
            .collect();

        Ok(Self {
            spec: Arc::from(spec),
            regex,
            group_names: Arc::new(group_names),
        })
    }

    /// The specification string as registered, without implicit anchors.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Match a request path, returning capture bindings on success.
    pub fn matches(&self, path: &str) -> Option<PatternCaptures> {
        let caps = self.regex.captures(path)?;
        let values = (0..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        Some(PatternCaptures {
            spec: Arc::clone(&self.spec),
            values,
            group_names: Arc::clone(&self.group_names),
        })
    }
}

/// Capture bindings produced by a successful pattern match.
///
/// Group 0 is the full match. A group that is declared by the pattern but
/// did not participate in the match is present with no value.
#[derive(Debug, Clone)]
pub struct PatternCaptures {
    spec: Arc<str>,
    values: SmallVec<[Option<String>; MAX_INLINE_PARAMS]>,
    group_names: Arc<Vec<Option<String>>>,
}

impl PatternCaptures {
    /// The full matched path.
    pub fn full(&self) -> &str {
        self.values[0].as_deref().unwrap_or("")
    }

    /// Number of capture groups, excluding the full match.
    pub fn group_count(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// Value of a named group, if it participated in the match.
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self
            .group_names
            .iter()
            .position(|n| n.as_deref() == Some(name))?;
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    /// Value of a group by position (1-based, as in `$1`).
    pub fn position(&self, idx: usize) -> Option<&str> {
        if idx == 0 {
            return None;
        }
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    fn has_group(&self, name: &str) -> bool {
        self.group_names
            .iter()
            .any(|n| n.as_deref() == Some(name))
    }

    /// Named bindings that participated in the match, in group order.
    pub fn named_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.group_names
            .iter()
            .enumerate()
            .filter_map(move |(idx, name)| {
                let name = name.as_deref()?;
                let value = self.values.get(idx)?.as_deref()?;
                Some((name, value))
            })
    }
}

/// Substitute `$1`-style and `${name}`-style placeholders with captures.
///
/// A placeholder that names a group the pattern does not define is a
/// [`PatternError`]; a defined group that did not participate substitutes
/// the empty string. `$$` escapes a literal dollar sign.
pub fn substitute(template: &str, caps: &PatternCaptures) -> Result<String, PatternError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some((_, '$')) => {
                chars.next();
                out.push('$');
            }
            Some((start, '{')) => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed || name.is_empty() || !caps.has_group(&name) {
                    return Err(PatternError::Placeholder {
                        spec: caps.spec.to_string(),
                        placeholder: template[start - 1..].to_string(),
                    });
                }
                out.push_str(caps.get(&name).unwrap_or(""));
            }
            Some((_, c)) if c.is_ascii_digit() => {
                let mut idx = 0usize;
                while let Some((_, c)) = chars.peek().copied() {
                    if let Some(d) = c.to_digit(10) {
                        idx = idx * 10 + d as usize;
                        chars.next();
                    } else {
                        break;
                    }
                }
                if idx == 0 || idx > caps.group_count() {
                    return Err(PatternError::Placeholder {
                        spec: caps.spec.to_string(),
                        placeholder: format!("${idx}"),
                    });
                }
                out.push_str(caps.position(idx).unwrap_or(""));
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

/// A route target parsed into its controller and action templates.
///
/// The split happens once, at registration, on the last `.` of the raw
/// target; substituted capture values never move it.
#[derive(Debug, Clone)]
pub struct TargetTemplate {
    raw: String,
    controller: String,
    action: String,
}

impl TargetTemplate {
    pub fn parse(target: &str) -> Result<Self, PatternError> {
        let raw = target.trim();
        let (controller, action) = raw.rsplit_once('.').ok_or_else(|| PatternError::Target {
            target: raw.to_string(),
        })?;
        if controller.is_empty() || action.is_empty() {
            return Err(PatternError::Target {
                target: raw.to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            controller: controller.to_string(),
            action: action.to_string(),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Resolve to a concrete `(controller, action)` pair for one match.
    ///
    /// Namespace separators in the controller side normalize to the dotted
    /// registry form (`admin/User` becomes `admin.User`).
    pub fn resolve(&self, caps: &PatternCaptures) -> Result<(String, String), PatternError> {
        let controller = substitute(&self.controller, caps)?.replace('/', ".");
        let action = substitute(&self.action, caps)?;
        Ok((controller, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_are_implicit() {
        let p = CompiledPattern::compile("/user").unwrap();
        assert!(p.matches("/user").is_some());
        assert!(p.matches("/user/10").is_none());
    }

    #[test]
    fn explicit_anchors_are_kept() {
        let p = CompiledPattern::compile("^/files/.*$").unwrap();
        assert!(p.matches("/files/a/b").is_some());
    }

    #[test]
    fn empty_spec_is_rejected() {
        assert!(matches!(
            CompiledPattern::compile("  "),
            Err(PatternError::Empty)
        ));
    }

    #[test]
    fn empty_path_match_is_rejected() {
        assert!(matches!(
            CompiledPattern::compile("(\\w*)"),
            Err(PatternError::MatchesEmpty { .. })
        ));
    }

    #[test]
    fn named_groups_bind() {
        let p = CompiledPattern::compile("/user/(?<id>\\d+)").unwrap();
        let caps = p.matches("/user/42").unwrap();
        assert_eq!(caps.get("id"), Some("42"));
        assert_eq!(caps.position(1), Some("42"));
        assert_eq!(caps.named_pairs().collect::<Vec<_>>(), vec![("id", "42")]);
    }

    #[test]
    fn substitution_resolves_placeholders() {
        let p = CompiledPattern::compile("/t/(?<name>\\w+)/(\\d+)").unwrap();
        let caps = p.matches("/t/list/7").unwrap();
        assert_eq!(substitute("${name}-$2", &caps).unwrap(), "list-7");
        assert_eq!(substitute("$$${name}", &caps).unwrap(), "$list");
        assert!(matches!(
            substitute("${missing}", &caps),
            Err(PatternError::Placeholder { .. })
        ));
        assert!(matches!(
            substitute("$3", &caps),
            Err(PatternError::Placeholder { .. })
        ));
    }

    #[test]
    fn target_splits_once_at_registration() {
        let t = TargetTemplate::parse("Test.${named}").unwrap();
        let p = CompiledPattern::compile("/test/(?<named>[\\w.]+)").unwrap();
        let caps = p.matches("/test/v1.2").unwrap();
        // the captured dot stays inside the action name
        assert_eq!(t.resolve(&caps).unwrap(), ("Test".into(), "v1.2".into()));
    }

    #[test]
    fn target_namespaces_normalize() {
        let t = TargetTemplate::parse("admin/User.index").unwrap();
        let p = CompiledPattern::compile("/admin").unwrap();
        let caps = p.matches("/admin").unwrap();
        assert_eq!(
            t.resolve(&caps).unwrap(),
            ("admin.User".into(), "index".into())
        );
    }

    #[test]
    fn bare_target_is_rejected() {
        assert!(TargetTemplate::parse("noseparator").is_err());
        assert!(TargetTemplate::parse(".action").is_err());
    }
}
