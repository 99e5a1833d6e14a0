use std::fmt::Debug;
use std::hash::Hash;

use num_traits::SaturatingAdd;
use num_traits::sign::Unsigned;
use smallvec::SmallVec;

/// Most grid-like spaces have at most 4 orthogonal neighbours.
pub const INLINE_NEIGHBOURS: usize = 4;

pub type Neighbours<St, A> = SmallVec<[(St, A); INLINE_NEIGHBOURS]>;

pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}
pub trait State: Copy + Clone + Debug + PartialEq + Eq + Hash {}
pub trait Cost:
    Copy
    + Clone
    + Debug
    + std::fmt::Display
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + SaturatingAdd
    + Unsigned
    + num_traits::bounds::UpperBounded
    + std::ops::Add
    + std::ops::AddAssign
{
    #[inline(always)]
    fn valid(&self) -> bool {
        *self != Self::max_value()
    }
}

/// A sequence of steps from `start` to `end`.
///
/// Each step is `(reached_state, action)`, so replaying the actions from
/// `start` visits every state in `steps` in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    pub start: S,
    pub end: S,
    pub cost: C,
    pub steps: Vec<(S, A)>,
}

impl<S, A, C> Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn new_from_start(start: S) -> Self {
        Self {
            start,
            end: start,
            cost: C::zero(),
            steps: vec![],
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn actions(&self) -> impl Iterator<Item = A> + '_ {
        self.steps.iter().map(|(_s, a)| *a)
    }

    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        std::iter::once(self.start).chain(self.steps.iter().map(|(s, _a)| *s))
    }

    /// Runs sanity checks
    #[inline(always)]
    pub fn seems_valid(&self) -> bool {
        self.cost.valid() && self.steps.last().map_or(self.start, |(s, _)| *s) == self.end
    }

    #[inline(always)]
    pub fn append(&mut self, step: (S, A), c: C) {
        let (s, _a) = step;
        self.steps.push(step);
        self.end = s;
        self.cost = self.cost.saturating_add(&c);
    }
}

impl<S, A, C> std::fmt::Display for Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Path({}, {:?}:{:?}:{:?})",
            self.cost,
            self.start,
            self.actions().take(20).collect::<Vec<_>>(),
            self.end
        )
    }
}

pub trait Space<St, A, C>: Clone + std::fmt::Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    fn apply(&self, s: &St, a: &A) -> Option<St>;

    fn cost(&self, _s: &St, _a: &A) -> C {
        C::one()
    }
    /// Expands a State into the reachable `(State, Action)` pairs.
    ///
    /// The order is stable and used as tie-break by every frontier policy.
    fn neighbours(&self, s: &St) -> Neighbours<St, A>;
    /// Verify is a State is valid.
    fn valid(&self, s: &St) -> bool;

    fn valid_path(&self, p: &Path<St, A, C>) -> bool {
        if !self.valid(&p.start) {
            return false;
        }
        let mut state: St = p.start;
        for (expected, a) in &p.steps {
            match self.apply(&state, a) {
                Some(new_state) if self.valid(&new_state) && new_state == *expected => {
                    state = new_state
                }
                _ => return false,
            }
        }
        p.end == state
    }

    fn size(&self) -> Option<usize> {
        None
    }
}

/// A heuristic estimating the cost between two states.
pub trait ObjectiveHeuristic<Sp, St, A, C>: std::fmt::Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn h(_a: &St, _b: &St) -> C {
        C::zero()
    }
}
