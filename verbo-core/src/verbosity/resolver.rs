use std::ops::Range;

use crate::{
    errors::VerbosityError,
    level::{LevelSetting, LevelTable, LevelValue, NOTSET},
    verbosity::{check_verbosity, Verbosity, MAX_VERBOSITY},
};

/// A half-open verbosity range resolved to one level.
pub type VerbosityRange = (Range<Verbosity>, LevelValue);

/// Resolves a verbosity count to a level through a precompiled step
/// function.
///
/// Built from a list of `(verbosity, level)` pairs: sorted by verbosity,
/// each declared verbosity opens a half-open range that ends at the next
/// declared one, and the last range extends to [`MAX_VERBOSITY`]. A query
/// below the lowest declared verbosity resolves to nothing; the caller
/// supplies its own default for that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbosityLevelResolver {
    levels: Box<[(Verbosity, LevelValue)]>,
    ranges: Box<[VerbosityRange]>,
}

impl VerbosityLevelResolver {
    pub fn new(
        table: &LevelTable,
        levels: impl IntoIterator<Item = (Verbosity, LevelSetting)>,
    ) -> Result<Self, VerbosityError> {
        let mut resolved = Vec::new();
        for (verbosity, setting) in levels {
            resolved.push((check_verbosity(verbosity)?, table.resolve(setting)?));
        }
        let ranges = compute_ranges(&resolved)?;

        Ok(Self {
            levels: resolved.into(),
            ranges,
        })
    }

    /// The `(verbosity, level)` pairs as they were passed in, resolved.
    pub fn levels(&self) -> &[(Verbosity, LevelValue)] {
        &self.levels
    }

    /// The compiled ranges, ascending by verbosity.
    pub fn ranges(&self) -> &[VerbosityRange] {
        &self.ranges
    }

    /// The level for a verbosity, or `None` if no range contains it.
    pub fn get_level(&self, verbosity: Verbosity) -> Option<LevelValue> {
        // A linear scan: the list is a handful of entries at most.
        self.ranges
            .iter()
            .find(|(range, _)| range.contains(&verbosity))
            .map(|(_, level)| *level)
    }
}

fn compute_ranges(
    levels: &[(Verbosity, LevelValue)],
) -> Result<Box<[VerbosityRange]>, VerbosityError> {
    let mut sorted = levels.to_vec();
    // The upper cap of the last real range. Its own level is unreachable,
    // so the value doesn't matter.
    sorted.push((MAX_VERBOSITY, NOTSET));
    sorted.sort_by_key(|(verbosity, _)| *verbosity);

    for pair in sorted.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(VerbosityError::DuplicateVerbosity {
                verbosity: pair[0].0,
            });
        }
    }

    Ok(sorted
        .windows(2)
        .map(|pair| (pair[0].0..pair[1].0, pair[0].1))
        .collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::level::{DEBUG, INFO, WARNING};

    fn resolver(levels: &[(Verbosity, LevelValue)]) -> VerbosityLevelResolver {
        let table = LevelTable::default();
        let levels = levels
            .iter()
            .map(|(verbosity, level)| (*verbosity, LevelSetting::from(*level)));
        VerbosityLevelResolver::new(&table, levels).unwrap()
    }

    #[test]
    fn step_function() {
        let resolver = resolver(&[(0, WARNING), (3, INFO), (4, DEBUG)]);

        assert_eq!(resolver.get_level(0), Some(WARNING));
        assert_eq!(resolver.get_level(1), Some(WARNING));
        assert_eq!(resolver.get_level(2), Some(WARNING));
        assert_eq!(resolver.get_level(3), Some(INFO));
        assert_eq!(resolver.get_level(4), Some(DEBUG));
        // The last declared level extends to infinity.
        assert_eq!(resolver.get_level(100), Some(DEBUG));
    }

    #[test]
    fn none_below_lowest_declared() {
        // The smallest declared verbosity need not be 0.
        let resolver = resolver(&[(2, INFO), (4, DEBUG)]);

        assert_eq!(resolver.get_level(0), None);
        assert_eq!(resolver.get_level(1), None);
        assert_eq!(resolver.get_level(2), Some(INFO));
    }

    #[test]
    fn empty_list_resolves_nothing() {
        let resolver = resolver(&[]);
        assert_eq!(resolver.get_level(0), None);
        assert_eq!(resolver.get_level(42), None);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let resolver = resolver(&[(4, DEBUG), (0, WARNING), (3, INFO)]);
        assert_eq!(resolver.get_level(1), Some(WARNING));
        assert_eq!(resolver.get_level(3), Some(INFO));
    }

    #[test]
    fn rejects_duplicates() {
        let table = LevelTable::default();
        let err = VerbosityLevelResolver::new(
            &table,
            vec![
                (0, LevelSetting::from(WARNING)),
                (2, LevelSetting::from(INFO)),
                (2, LevelSetting::from(DEBUG)),
            ],
        )
        .unwrap_err();

        assert_eq!(err, VerbosityError::DuplicateVerbosity { verbosity: 2 });
    }

    #[test]
    fn rejects_the_sentinel_verbosity() {
        let table = LevelTable::default();
        let err = VerbosityLevelResolver::new(
            &table,
            vec![(MAX_VERBOSITY, LevelSetting::from(DEBUG))],
        )
        .unwrap_err();

        assert_eq!(
            err,
            VerbosityError::InvalidVerbosity {
                verbosity: MAX_VERBOSITY
            }
        );
    }

    #[test]
    fn rejects_unknown_levels() {
        let table = LevelTable::default();
        let err =
            VerbosityLevelResolver::new(&table, vec![(0, LevelSetting::from("silly"))])
                .unwrap_err();

        assert!(matches!(err, VerbosityError::InvalidLevel(_)));
    }

    proptest! {
        // For every queried verbosity within the declared span, the result
        // is the level of the greatest declared verbosity not above it.
        #[test]
        fn monotonic_step_function(
            declared in proptest::collection::btree_map(0u64..64, 0i32..6, 1..6),
            query in 0u64..64,
        ) {
            let levels: Vec<_> = declared
                .iter()
                .map(|(verbosity, step)| (*verbosity, [50, 40, 30, 20, 10, 0][*step as usize]))
                .collect();
            let resolver = resolver(&levels);

            let expected = declared
                .range(..=query)
                .next_back()
                .map(|(_, step)| [50, 40, 30, 20, 10, 0][*step as usize]);
            prop_assert_eq!(resolver.get_level(query), expected);
        }
    }
}
