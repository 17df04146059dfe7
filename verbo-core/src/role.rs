//! Roles: named verbosity policies for classes of loggers.

use crate::{
    errors::RoleError,
    level::{LevelSetting, LevelTable, LevelValue, DEBUG, INFO, WARNING},
    verbosity::{Verbosity, VerbosityLevelResolver},
};

/// The role name that targets every assigned logger in sink operations.
pub const WILDCARD_ROLE_NAME: &str = "*";

/// The level a role resolves to when no verbosity applies.
pub const DEFAULT_ROLE_LEVEL: LevelValue = WARNING;

/// A named bundle of verbosity-range rules plus a default level,
/// representing a class of logger ("app", "lib", "service", ...).
///
/// Role tables must be monotone: a higher verbosity never resolves to a
/// *more* severe level than a lower one, so turning verbosity up can only
/// produce more output.
#[derive(Debug)]
pub struct Role {
    name: String,
    resolver: VerbosityLevelResolver,
    default_level: LevelValue,
    description: Option<String>,
    builtin: bool,
}

impl Role {
    pub fn new(
        table: &LevelTable,
        name: impl Into<String>,
        verbosity_levels: impl IntoIterator<Item = (Verbosity, LevelSetting)>,
        default_level: impl Into<LevelSetting>,
        description: Option<String>,
    ) -> Result<Self, RoleError> {
        let name = name.into();
        if name.is_empty() || name == WILDCARD_ROLE_NAME {
            return Err(RoleError::InvalidName);
        }

        let resolver = VerbosityLevelResolver::new(table, verbosity_levels)?;
        let default_level = table
            .resolve(default_level)
            .map_err(crate::errors::VerbosityError::from)?;

        Ok(Self {
            name,
            resolver,
            default_level,
            description,
            builtin: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_level(&self) -> LevelValue {
        self.default_level
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// The `(verbosity, level)` pairs this role was declared with.
    pub fn verbosity_levels(&self) -> &[(Verbosity, LevelValue)] {
        self.resolver.levels()
    }

    /// The level for a verbosity: the resolver's answer, or the default
    /// level when verbosity is unset or below the lowest declared range.
    pub fn get_level(&self, verbosity: Option<Verbosity>) -> LevelValue {
        verbosity
            .and_then(|verbosity| self.resolver.get_level(verbosity))
            .unwrap_or(self.default_level)
    }
}

/// The roles every manager ships with.
///
/// The concrete thresholds are policy, not contract: an application is the
/// loudest, a service is quieter, a library only speaks up when verbosity
/// is turned well up.
pub(crate) fn builtin_roles(table: &LevelTable) -> Vec<Role> {
    let role = |name: &str, levels: &[(Verbosity, LevelValue)], description: &str| {
        let levels = levels
            .iter()
            .map(|(verbosity, level)| (*verbosity, LevelSetting::from(*level)));
        let mut role = Role::new(
            table,
            name,
            levels,
            DEFAULT_ROLE_LEVEL,
            Some(description.to_owned()),
        )
        .expect("built-in role tables are valid");
        role.builtin = true;
        role
    };

    vec![
        role(
            "app",
            &[(0, INFO), (1, DEBUG)],
            "an application: informative by default",
        ),
        role(
            "service",
            &[(0, WARNING), (1, INFO), (2, DEBUG)],
            "a long-running service: warnings by default",
        ),
        role(
            "lib",
            &[(0, WARNING), (3, INFO), (4, DEBUG)],
            "a library: quiet unless verbosity is turned well up",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LevelTable {
        LevelTable::default()
    }

    fn app_role(table: &LevelTable) -> Role {
        Role::new(
            table,
            "app",
            vec![
                (0, LevelSetting::from(INFO)),
                (1, LevelSetting::from(DEBUG)),
            ],
            LevelSetting::from(WARNING),
            None,
        )
        .unwrap()
    }

    #[test]
    fn resolves_verbosity_to_level() {
        let table = table();
        let role = app_role(&table);

        assert_eq!(role.get_level(None), WARNING);
        assert_eq!(role.get_level(Some(0)), INFO);
        assert_eq!(role.get_level(Some(1)), DEBUG);
        assert_eq!(role.get_level(Some(5)), DEBUG);
    }

    #[test]
    fn falls_back_to_default_below_lowest_range() {
        let table = table();
        let role = Role::new(
            &table,
            "late",
            vec![(2, LevelSetting::from(DEBUG))],
            LevelSetting::from(WARNING),
            None,
        )
        .unwrap();

        assert_eq!(role.get_level(Some(0)), WARNING);
        assert_eq!(role.get_level(Some(2)), DEBUG);
    }

    #[test]
    fn rejects_bad_names() {
        let table = table();
        let no_levels = Vec::<(Verbosity, LevelSetting)>::new;

        let err =
            Role::new(&table, "", no_levels(), LevelSetting::from(WARNING), None).unwrap_err();
        assert_eq!(err, RoleError::InvalidName);

        let err =
            Role::new(&table, "*", no_levels(), LevelSetting::from(WARNING), None).unwrap_err();
        assert_eq!(err, RoleError::InvalidName);
    }

    #[test]
    fn builtin_tables_are_monotone() {
        let table = table();
        for role in builtin_roles(&table) {
            let mut prev = LevelValue::MAX;
            let mut levels = role.verbosity_levels().to_vec();
            levels.sort_by_key(|(verbosity, _)| *verbosity);
            for (_, level) in levels {
                assert!(
                    level <= prev,
                    "role {} table is not monotone",
                    role.name()
                );
                prev = level;
            }
        }
    }
}
