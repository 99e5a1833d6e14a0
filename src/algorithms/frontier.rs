use std::collections::VecDeque;
use std::fmt::Debug;
use std::marker::PhantomData;

use derive_more::Display;
use rustc_hash::FxHashMap;

use crate::error::SearchError;
use crate::search::SearchTreeIndex;
use crate::space::Cost;
use crate::space::State;

/// A reached, but not yet expanded, Search Node.
///
/// Carries copies of what the policies rank on so that selection doesn't need
/// to look into the `SearchTree`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrontierEntry<St, C>
where
    St: State,
    C: Cost,
{
    /// The index of this node in the Search Tree.
    pub node_index: SearchTreeIndex,
    pub state: St,
    /// Path cost from the start.
    pub g: C,
    /// Heuristic estimate to the goal. Zero for uninformed policies.
    pub h: C,
}

/// The removal rule of a `Frontier`.
///
/// Policies only differ on which entry they pick. Ties between equally ranked
/// entries go to the earliest inserted one.
pub trait FrontierPolicy: Debug {
    const NAME: &'static str;
    /// Whether `select` reads `FrontierEntry::h`.
    const USES_HEURISTIC: bool;
    /// Whether a pending State reached again through a cheaper path takes the
    /// new path. Only matters to policies ranking on `g`.
    const IMPROVES_PENDING: bool = false;

    /// Position of the next entry to remove, `None` only when `entries` is
    /// empty.
    fn select<St: State, C: Cost>(entries: &VecDeque<FrontierEntry<St, C>>) -> Option<usize>;
}

/// Last-in-first-out.
#[derive(Debug)]
pub struct DepthFirst;

impl FrontierPolicy for DepthFirst {
    const NAME: &'static str = "Depth-First";
    const USES_HEURISTIC: bool = false;

    #[inline(always)]
    fn select<St: State, C: Cost>(entries: &VecDeque<FrontierEntry<St, C>>) -> Option<usize> {
        entries.len().checked_sub(1)
    }
}

/// First-in-first-out.
#[derive(Debug)]
pub struct BreadthFirst;

impl FrontierPolicy for BreadthFirst {
    const NAME: &'static str = "Breadth-First";
    const USES_HEURISTIC: bool = false;

    #[inline(always)]
    fn select<St: State, C: Cost>(entries: &VecDeque<FrontierEntry<St, C>>) -> Option<usize> {
        (!entries.is_empty()).then_some(0)
    }
}

/// Lowest `h`.
#[derive(Debug)]
pub struct GreedyBestFirst;

impl FrontierPolicy for GreedyBestFirst {
    const NAME: &'static str = "Greedy Best-First";
    const USES_HEURISTIC: bool = true;

    fn select<St: State, C: Cost>(entries: &VecDeque<FrontierEntry<St, C>>) -> Option<usize> {
        // `min_by_key` keeps the first of equal minimums.
        entries
            .iter()
            .enumerate()
            .min_by_key(|(_i, e)| e.h)
            .map(|(i, _e)| i)
    }
}

/// Lowest `g + h`.
#[derive(Debug)]
pub struct AStar;

impl FrontierPolicy for AStar {
    const NAME: &'static str = "A*";
    const USES_HEURISTIC: bool = true;
    const IMPROVES_PENDING: bool = true;

    fn select<St: State, C: Cost>(entries: &VecDeque<FrontierEntry<St, C>>) -> Option<usize> {
        entries
            .iter()
            .enumerate()
            .min_by_key(|(_i, e)| e.g.saturating_add(&e.h))
            .map(|(i, _e)| i)
    }
}

/// Run-time choice of `FrontierPolicy`.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    #[display("Depth-First")]
    DepthFirst,
    #[display("Breadth-First")]
    BreadthFirst,
    #[display("Greedy Best-First")]
    GreedyBestFirst,
    #[default]
    #[display("A*")]
    AStar,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::DepthFirst,
        Strategy::BreadthFirst,
        Strategy::GreedyBestFirst,
        Strategy::AStar,
    ];
}

/// Discovered but not yet expanded nodes, removed according to `P`.
///
/// Entries are kept in insertion order, with a side map from their states to
/// their `g` for constant-time membership checks.
#[derive(Debug)]
pub struct Frontier<P, St, C>
where
    P: FrontierPolicy,
    St: State,
    C: Cost,
{
    entries: VecDeque<FrontierEntry<St, C>>,
    members: FxHashMap<St, C>,
    high_water: usize,

    _phantom_policy: PhantomData<P>,
}

impl<P, St, C> Frontier<P, St, C>
where
    P: FrontierPolicy,
    St: State,
    C: Cost,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            members: FxHashMap::default(),
            high_water: 0,
            _phantom_policy: PhantomData,
        }
    }

    #[inline(always)]
    pub fn add(&mut self, entry: FrontierEntry<St, C>) {
        let previous = self.members.insert(entry.state, entry.g);
        debug_assert!(
            previous.is_none(),
            "{:?} was already in the frontier",
            entry.state
        );
        self.entries.push_back(entry);
        self.high_water = self.high_water.max(self.entries.len());
    }

    #[inline(always)]
    pub fn empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the entry `P` picks.
    ///
    /// Callers are expected to check `empty()` first.
    pub fn remove(&mut self) -> Result<FrontierEntry<St, C>, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("FrontierRemove");

        let i = P::select(&self.entries).ok_or(SearchError::EmptyFrontier)?;
        let entry = self
            .entries
            .remove(i)
            .ok_or(SearchError::EmptyFrontier)?;
        self.members.remove(&entry.state);
        Ok(entry)
    }

    #[inline(always)]
    pub fn contains(&self, s: &St) -> bool {
        self.members.contains_key(s)
    }

    /// Path cost of a pending State.
    #[inline(always)]
    pub fn pending_g(&self, s: &St) -> Option<C> {
        self.members.get(s).copied()
    }

    /// Points the pending entry for `s` at a cheaper node.
    ///
    /// The entry keeps its position, so tie-breaks still follow the order in
    /// which States were first reached. Returns whether anything changed.
    pub fn improve(&mut self, s: &St, node_index: SearchTreeIndex, g: C) -> bool {
        match self.members.get_mut(s) {
            Some(pending_g) if g < *pending_g => {
                *pending_g = g;
            }
            _ => return false,
        }
        match self.entries.iter_mut().find(|e| e.state == *s) {
            Some(entry) => {
                entry.node_index = node_index;
                entry.g = g;
                true
            }
            None => unreachable!("{:?} is a member without an entry", s),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
    /// Largest length seen so far.
    #[inline(always)]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrontierEntry<St, C>> {
        self.entries.iter()
    }
}

impl<P, St, C> Default for Frontier<P, St, C>
where
    P: FrontierPolicy,
    St: State,
    C: Cost,
{
    fn default() -> Self {
        Self::new()
    }
}
