use fxhash::FxHashMap;

use crate::{
    errors::VerbosityError,
    level::{LevelSetting, LevelTable, LevelValue},
    verbosity::{resolver::VerbosityLevelResolver, Verbosity},
};

/// A per-sink gate that applies verbosity-resolved level floors to chosen
/// logger-name scopes.
///
/// A scope matches a record's logger name when the name equals the scope or
/// is its dotted descendant. Where several scopes match, the longest one
/// wins. The filter is opt-in per scope and default-open everywhere else:
/// an empty map, an unset process verbosity or an unmatched name all pass.
///
/// This is an *additional* floor on top of the sink's own level, checked
/// independently by the dispatcher; it can only make a matched scope
/// stricter.
#[derive(Debug, Default)]
pub struct VerbosityLevelsFilter {
    // Sorted longest-scope-first, so the first match is the most specific.
    scopes: Box<[(String, VerbosityLevelResolver)]>,
}

impl VerbosityLevelsFilter {
    pub fn new(scopes: impl IntoIterator<Item = (String, VerbosityLevelResolver)>) -> Self {
        // Deduplicate by name first, then order by specificity.
        let map: FxHashMap<_, _> = scopes.into_iter().collect();
        let mut scopes: Vec<_> = map.into_iter().collect();
        scopes.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self {
            scopes: scopes.into(),
        }
    }

    /// Builds a filter from raw `(scope, [(verbosity, level)])` settings.
    pub fn from_settings<S, L>(table: &LevelTable, scopes: S) -> Result<Self, VerbosityError>
    where
        S: IntoIterator<Item = (String, L)>,
        L: IntoIterator<Item = (Verbosity, LevelSetting)>,
    {
        let mut compiled = Vec::new();
        for (scope, levels) in scopes {
            compiled.push((scope, VerbosityLevelResolver::new(table, levels)?));
        }
        Ok(Self::new(compiled))
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Whether a record of this logger name and level passes the gate.
    pub fn should_pass(
        &self,
        logger_name: &str,
        level: LevelValue,
        verbosity: Option<Verbosity>,
    ) -> bool {
        if self.scopes.is_empty() {
            return true;
        }

        // Filtering only activates once a verbosity has been set.
        let Some(verbosity) = verbosity else {
            return true;
        };

        for (scope, resolver) in self.scopes.iter() {
            if is_scope_of(logger_name, scope) {
                return match resolver.get_level(verbosity) {
                    Some(required) => level >= required,
                    // No applicable range for this verbosity.
                    None => true,
                };
            }
        }

        true
    }
}

/// Checks whether `name` is `scope` itself or its dotted descendant:
/// `"pkg.sub"` matches scope `"pkg"`, but `"pkgx"` does not.
pub(crate) fn is_scope_of(name: &str, scope: &str) -> bool {
    match name.strip_prefix(scope) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{DEBUG, INFO, WARNING};

    fn filter(scopes: &[(&str, &[(Verbosity, LevelValue)])]) -> VerbosityLevelsFilter {
        let table = LevelTable::default();
        VerbosityLevelsFilter::from_settings(
            &table,
            scopes.iter().map(|(scope, levels)| {
                (
                    scope.to_string(),
                    levels
                        .iter()
                        .map(|(verbosity, level)| (*verbosity, LevelSetting::from(*level)))
                        .collect::<Vec<_>>(),
                )
            }),
        )
        .unwrap()
    }

    #[test]
    fn scope_name_matching() {
        assert!(is_scope_of("pkg", "pkg"));
        assert!(is_scope_of("pkg.sub", "pkg"));
        assert!(is_scope_of("pkg.sub.deep", "pkg"));
        assert!(!is_scope_of("pkg", "blah"));
        assert!(!is_scope_of("pkgx", "pkg"));
        assert!(!is_scope_of("pkg", "pkg.sub"));
    }

    #[test]
    fn empty_filter_passes_everything() {
        let filter = filter(&[]);
        assert!(filter.should_pass("anything", DEBUG, Some(0)));
    }

    #[test]
    fn unset_verbosity_passes_everything() {
        let filter = filter(&[("pkg", &[(0, WARNING)])]);
        assert!(filter.should_pass("pkg.sub", DEBUG, None));
    }

    #[test]
    fn blocks_below_the_resolved_floor() {
        let filter = filter(&[("pkg", &[(0, WARNING), (2, DEBUG)])]);

        // Verbosity 1 falls in [0, 2) → WARNING; INFO is below the floor.
        assert!(!filter.should_pass("pkg.sub", INFO, Some(1)));
        // Verbosity 2 falls in [2, ∞) → DEBUG; INFO passes.
        assert!(filter.should_pass("pkg.sub", INFO, Some(2)));
    }

    #[test]
    fn unmatched_names_pass() {
        let filter = filter(&[("pkg", &[(0, WARNING)])]);
        assert!(filter.should_pass("other", DEBUG, Some(0)));
    }

    #[test]
    fn below_lowest_range_passes() {
        let filter = filter(&[("pkg", &[(3, INFO)])]);
        assert!(filter.should_pass("pkg", DEBUG, Some(1)));
    }

    #[test]
    fn longest_scope_wins() {
        let filter = filter(&[
            ("pkg", &[(0, DEBUG)]),
            ("pkg.sub", &[(0, WARNING)]),
        ]);

        // "pkg.sub" is gated by its own, stricter scope.
        assert!(!filter.should_pass("pkg.sub", INFO, Some(0)));
        // Its siblings stay on the parent scope.
        assert!(filter.should_pass("pkg.other", INFO, Some(0)));
    }
}
