use thiserror::Error;

/// Failures while driving a search.
///
/// Running out of nodes before reaching the goal is not one of them, that's
/// reported as `SearchOutcome::NoSolution`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// `Frontier::remove` was called on an empty frontier. A driver bug.
    #[error("Empty Frontier")]
    EmptyFrontier,
    #[error("Gave up after exploring {limit} nodes")]
    ExpansionLimit { limit: usize },
    /// The search succeeded without recording the node that reached the goal.
    /// A driver bug.
    #[error("Search succeeded without a goal node")]
    MissingGoalNode,
}
