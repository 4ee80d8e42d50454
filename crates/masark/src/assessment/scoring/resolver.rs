use tracing::debug;

use super::super::domain::{Dimension, Letter, PersonalityTypeCode};
use super::tally::{DimensionCount, DimensionTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedDimension {
    pub(crate) dimension: Dimension,
    pub(crate) letter: Letter,
    pub(crate) tie_broken: bool,
}

pub(crate) fn resolve_dimension(count: DimensionCount) -> ResolvedDimension {
    let dimension = count.dimension;
    if count.is_tied() {
        let letter = dimension.tie_break();
        debug!(
            dimension = dimension.code(),
            votes = count.first,
            assigned = %letter,
            "tied dimension resolved by tie-break rule"
        );
        return ResolvedDimension {
            dimension,
            letter,
            tie_broken: true,
        };
    }

    let letter = if count.first > count.second {
        dimension.first()
    } else {
        dimension.second()
    };

    ResolvedDimension {
        dimension,
        letter,
        tie_broken: false,
    }
}

pub(crate) fn resolve_type(tally: &DimensionTally) -> (PersonalityTypeCode, [ResolvedDimension; 4]) {
    let resolved = (*tally.counts()).map(resolve_dimension);
    let code = PersonalityTypeCode::from_aligned(resolved.map(|dimension| dimension.letter));
    (code, resolved)
}
