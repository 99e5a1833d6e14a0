use std::fmt::Debug;
use std::marker::PhantomData;

use derive_more::Display;
use rustc_hash::FxHashSet;

use crate::algorithms::frontier::AStar;
use crate::algorithms::frontier::BreadthFirst;
use crate::algorithms::frontier::DepthFirst;
use crate::algorithms::frontier::Frontier;
use crate::algorithms::frontier::FrontierEntry;
use crate::algorithms::frontier::FrontierPolicy;
use crate::algorithms::frontier::GreedyBestFirst;
use crate::algorithms::frontier::Strategy;
use crate::error::SearchError;
use crate::problem::Problem;
use crate::search::SearchTree;
use crate::search::SearchTreeIndex;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::ObjectiveHeuristic;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum SearchStatus {
    #[display("RUNNING")]
    Running,
    #[display("SUCCEEDED")]
    Succeeded,
    #[display("FAILED")]
    Failed,
}

/// How a finished search ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    Solved {
        path: Path<St, A, C>,
        nodes_explored: usize,
    },
    /// The frontier ran out before reaching the goal.
    NoSolution { nodes_explored: usize },
}

impl<St, A, C> SearchOutcome<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub fn is_solved(&self) -> bool {
        matches!(self, SearchOutcome::Solved { .. })
    }
    pub fn nodes_explored(&self) -> usize {
        match self {
            SearchOutcome::Solved { nodes_explored, .. } => *nodes_explored,
            SearchOutcome::NoSolution { nodes_explored } => *nodes_explored,
        }
    }
    pub fn path(&self) -> Option<&Path<St, A, C>> {
        match self {
            SearchOutcome::Solved { path, .. } => Some(path),
            SearchOutcome::NoSolution { .. } => None,
        }
    }
}

/// Drives a `Frontier` over a `Problem` until the goal is removed from it, or
/// it runs out of nodes.
///
/// States are pruned when already explored or already waiting in the
/// frontier, so every State has at most one entry in the frontier. Policies
/// with `FrontierPolicy::IMPROVES_PENDING` still take a cheaper path to a
/// waiting State, through a new node that replaces the old one.
#[derive(Debug)]
pub struct Solver<P, OH, OP, Sp, St, A, C>
where
    P: FrontierPolicy,
    OH: ObjectiveHeuristic<Sp, St, A, C>,
    OP: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    /// All the Search Nodes. Forms a Search Tree rooted at the start.
    search_tree: SearchTree<St, A, C>,
    open: Frontier<P, St, C>,
    /// States whose node was removed from the frontier and expanded.
    closed: FxHashSet<St>,

    nodes_explored: usize,
    status: SearchStatus,
    /// The node that reached the goal, once `Succeeded`.
    goal_node: Option<SearchTreeIndex>,
    max_expansions: Option<usize>,

    problem: OP,

    _phantom_heuristic: PhantomData<OH>,
    _phantom_space: PhantomData<Sp>,
}

impl<P, OH, OP, Sp, St, A, C> Solver<P, OH, OP, Sp, St, A, C>
where
    P: FrontierPolicy,
    OH: ObjectiveHeuristic<Sp, St, A, C>,
    OP: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(op: OP) -> Self {
        let start = op.start();

        let mut search = Self {
            search_tree: SearchTree::<St, A, C>::new(),
            open: Frontier::new(),
            closed: FxHashSet::default(),
            nodes_explored: 0,
            status: SearchStatus::Running,
            goal_node: None,
            max_expansions: None,

            problem: op,

            _phantom_heuristic: PhantomData,
            _phantom_space: PhantomData,
        };

        log::debug!("{} search from {:?} to {:?}", P::NAME, start, search.problem.goal());
        search.push_new(start, None, C::zero());
        search
    }

    /// Fails with `SearchError::ExpansionLimit` instead of exploring more
    /// than `limit` nodes.
    #[must_use]
    pub fn with_max_expansions(mut self, limit: Option<usize>) -> Self {
        self.max_expansions = limit;
        self
    }

    /// Runs the search to completion.
    pub fn solve(mut self) -> Result<SearchOutcome<St, A, C>, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Solve");

        while self.step()? == SearchStatus::Running {}

        // Only `Succeeded` without a goal node yields no outcome here.
        let outcome = self.outcome().ok_or(SearchError::MissingGoalNode)?;
        log::debug!(
            "{} search {} after exploring {} nodes",
            P::NAME,
            self.status,
            self.nodes_explored
        );
        Ok(outcome)
    }

    /// Removes and expands a single node.
    pub fn step(&mut self) -> Result<SearchStatus, SearchError> {
        if self.status != SearchStatus::Running {
            return Ok(self.status);
        }
        if self.open.empty() {
            self.status = SearchStatus::Failed;
            return Ok(self.status);
        }
        if let Some(limit) = self.max_expansions {
            if self.nodes_explored >= limit {
                log::warn!("{} search gave up after {limit} nodes", P::NAME);
                return Err(SearchError::ExpansionLimit { limit });
            }
        }

        #[cfg(feature = "coz_profile")]
        coz::scope!("NodeExpansion");

        let FrontierEntry {
            node_index, state, ..
        } = self.open.remove()?;
        self.nodes_explored += 1;
        log::trace!("Exploring {:?} (#{})", state, self.nodes_explored);

        if self.problem.is_goal(&state) {
            #[cfg(feature = "coz_profile")]
            coz::progress!("GoalFound");
            self.status = SearchStatus::Succeeded;
            self.goal_node = Some(node_index);
            return Ok(self.status);
        }

        self.closed.insert(state);

        let g: C = self.search_tree[node_index].g();
        for (s, a) in self.problem.space().neighbours(&state) {
            if self.closed.contains(&s) {
                continue;
            }
            let c: C = self.problem.space().cost(&state, &a);
            let new_g = g.saturating_add(&c);

            match self.open.pending_g(&s) {
                None => self.push_new(s, Some((node_index, a)), new_g),
                Some(pending_g) => {
                    if P::IMPROVES_PENDING && new_g < pending_g {
                        // Found better path to a pending node
                        let better = self.search_tree.push(SearchTreeNode::<St, A, C>::new(
                            s,
                            Some((node_index, a)),
                            new_g,
                        ));
                        self.open.improve(&s, better, new_g);
                    }
                }
            }
        }

        self.verify_frontier();
        Ok(self.status)
    }

    /// The result of a finished search, `None` while still `Running`.
    pub fn outcome(&self) -> Option<SearchOutcome<St, A, C>> {
        let nodes_explored = self.nodes_explored;
        match self.status {
            SearchStatus::Running => None,
            SearchStatus::Failed => Some(SearchOutcome::NoSolution { nodes_explored }),
            SearchStatus::Succeeded => {
                let goal_node = self.goal_node?;
                let path = self.search_tree.path(self.problem.space(), goal_node);
                debug_assert_eq!(path.start, self.problem.start());
                Some(SearchOutcome::Solved {
                    path,
                    nodes_explored,
                })
            }
        }
    }

    #[inline(always)]
    pub fn status(&self) -> SearchStatus {
        self.status
    }
    #[inline(always)]
    pub fn nodes_explored(&self) -> usize {
        self.nodes_explored
    }
    #[inline(always)]
    pub fn is_explored(&self, s: &St) -> bool {
        self.closed.contains(s)
    }
    #[inline(always)]
    pub fn is_pending(&self, s: &St) -> bool {
        self.open.contains(s)
    }
    #[inline(always)]
    pub fn problem(&self) -> &OP {
        &self.problem
    }

    #[inline(always)]
    fn push_new(&mut self, s: St, parent: Option<(SearchTreeIndex, A)>, g: C) {
        debug_assert!(!self.closed.contains(&s));
        debug_assert!(!self.open.contains(&s));

        let h: C = if P::USES_HEURISTIC {
            OH::h(&s, &self.problem.goal())
        } else {
            C::zero()
        };
        let node_index = self
            .search_tree
            .push(SearchTreeNode::<St, A, C>::new(s, parent, g));
        self.open.add(FrontierEntry {
            node_index,
            state: s,
            g,
            h,
        });
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_frontier(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_frontier(&self) {
        for e in self.open.iter() {
            // Pending and explored States never overlap.
            assert!(!self.closed.contains(&e.state), "{:?} is explored", e.state);
            assert!(self.open.contains(&e.state));
            // Entries mirror their node.
            let node = &self.search_tree[e.node_index];
            assert_eq!(*node.state(), e.state);
            assert_eq!(node.g(), e.g);
        }
        // At least a node per reached State.
        assert!(self.search_tree.len() >= self.open.len() + self.closed.len());
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use std::mem::size_of;
        use thousands::Separable;

        writeln!(out, "{} Search Stats:", P::NAME)?;
        let s = size_of::<SearchTreeNode<St, A, C>>();
        let l = self.search_tree.len();
        writeln!(
            out,
            "  - |Nodes|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;

        let s = size_of::<FrontierEntry<St, C>>();
        let l = self.open.len();
        let c = self.open.capacity();
        writeln!(
            out,
            "  - |Open|:    {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Open|*:   {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;
        writeln!(
            out,
            "  - |Open|^:   {}",
            self.open.high_water().separate_with_commas()
        )?;

        let s = size_of::<St>();
        let l = self.closed.len();
        let c = self.closed.capacity();
        writeln!(
            out,
            "  - |Closed|:  {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Closed|*: {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        writeln!(
            out,
            "  - Explored nodes: {}",
            self.nodes_explored.separate_with_commas()
        )?;

        Ok(())
    }
}

/// Solves `problem` with the frontier policy `strategy` names.
pub fn solve<OH, OP, Sp, St, A, C>(
    problem: OP,
    strategy: Strategy,
    max_expansions: Option<usize>,
) -> Result<SearchOutcome<St, A, C>, SearchError>
where
    OH: ObjectiveHeuristic<Sp, St, A, C>,
    OP: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    match strategy {
        Strategy::DepthFirst => Solver::<DepthFirst, OH, OP, Sp, St, A, C>::new(problem)
            .with_max_expansions(max_expansions)
            .solve(),
        Strategy::BreadthFirst => Solver::<BreadthFirst, OH, OP, Sp, St, A, C>::new(problem)
            .with_max_expansions(max_expansions)
            .solve(),
        Strategy::GreedyBestFirst => {
            Solver::<GreedyBestFirst, OH, OP, Sp, St, A, C>::new(problem)
                .with_max_expansions(max_expansions)
                .solve()
        }
        Strategy::AStar => Solver::<AStar, OH, OP, Sp, St, A, C>::new(problem)
            .with_max_expansions(max_expansions)
            .solve(),
    }
}
