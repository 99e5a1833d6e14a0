use derive_more::Display;
use nonmax::NonMaxU32;
use smallvec::SmallVec;
use thiserror::Error;

use crate::problem::Problem;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Neighbours;
use crate::space::ObjectiveHeuristic;
use crate::space::Space;
use crate::space::State;

const MAX_ELEMENTS_DISPLAYED: usize = 20;
const RANDOM_STATE_MAX_TRIES: usize = 10_000;

/// Start marker in text mazes.
pub const START_MARKER: char = 'A';
/// Goal marker in text mazes.
pub const GOAL_MARKER: char = 'B';

pub(crate) type CoordIntrinsic = u32;
pub type Coord = NonMaxU32;

/// A cell of the grid, addressed by `(row, col)`.
///
/// Rows grow downwards and columns grow rightwards.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("({row},{col})")]
pub struct Maze2DState {
    pub(crate) row: Coord,
    pub(crate) col: Coord,
}

impl Maze2DState {
    pub fn new(row: CoordIntrinsic, col: CoordIntrinsic) -> Option<Maze2DState> {
        Some(Maze2DState {
            row: Coord::new(row)?,
            col: Coord::new(col)?,
        })
    }
    pub fn new_from_usize(row: usize, col: usize) -> Option<Maze2DState> {
        let row = CoordIntrinsic::try_from(row).ok()?;
        let col = CoordIntrinsic::try_from(col).ok()?;

        Self::new(row, col)
    }
    pub(crate) fn safe_dimensions(height: usize, width: usize) -> bool {
        (height < CoordIntrinsic::MAX as usize) && (width < CoordIntrinsic::MAX as usize)
    }

    #[inline(always)]
    pub fn row(&self) -> usize {
        self.row.get() as usize
    }
    #[inline(always)]
    pub fn col(&self) -> usize {
        self.col.get() as usize
    }
}
impl State for Maze2DState {}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Maze2DAction {
    #[display("↑")]
    Up, // row--
    #[display("↓")]
    Down, // row++
    #[display("←")]
    Left, // col--
    #[display("→")]
    Right, // col++
}
impl Action for Maze2DAction {}

impl Maze2DAction {
    /// Expansion order. Frontier policies break ties with it.
    pub const EXPANSION_ORDER: [Maze2DAction; 4] = [
        Maze2DAction::Right,
        Maze2DAction::Left,
        Maze2DAction::Up,
        Maze2DAction::Down,
    ];

    /// `(d_row, d_col)` using wrapping arithmetic.
    #[inline(always)]
    fn delta(&self) -> (CoordIntrinsic, CoordIntrinsic) {
        let prev = CoordIntrinsic::MAX;
        let same = 0 as CoordIntrinsic;
        let next = 1 as CoordIntrinsic;

        #[rustfmt::skip]
        let delta = match self {
            Maze2DAction::Up    => (prev, same),
            Maze2DAction::Down  => (next, same),
            Maze2DAction::Left  => (same, prev),
            Maze2DAction::Right => (same, next),
        };
        delta
    }
}

pub type Maze2DCost = CoordIntrinsic;
impl Cost for Maze2DCost {}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Maze2DCell {
    #[display("░")]
    Empty,
    #[display("█")]
    Wall,
}

impl From<char> for Maze2DCell {
    /// Whitespace is passable, anything else blocks.
    ///
    /// Markers are handled by `Maze2DProblemCell`.
    fn from(ch: char) -> Self {
        if ch.is_whitespace() {
            Maze2DCell::Empty
        } else {
            Maze2DCell::Wall
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Maze2DSpace {
    pub(crate) map: Vec<Vec<Maze2DCell>>,
}

impl Maze2DSpace {
    /// Builds a Space from rows of cells, padding short rows with
    /// `Maze2DCell::Empty` on the right.
    pub fn new_from_map(mut map: Vec<Vec<Maze2DCell>>) -> Self {
        let width = map.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut map {
            row.resize(width, Maze2DCell::Empty);
        }
        Self { map }
    }
    pub fn new_empty_with_dimensions(height: usize, width: usize) -> Self {
        Self {
            map: vec![vec![Maze2DCell::Empty; width]; height],
        }
    }

    /// `(height, width)`
    pub fn dimensions(&self) -> (usize, usize) {
        if self.map.is_empty() {
            return (0, 0);
        }
        (self.map.len(), self.map[0].len())
    }
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.dimensions().0
    }
    #[inline(always)]
    pub fn width(&self) -> usize {
        self.dimensions().1
    }

    #[inline(always)]
    pub fn in_bounds(&self, state: &Maze2DState) -> bool {
        let (height, width) = self.dimensions();
        state.row() < height && state.col() < width
    }

    /// Whether the cell is blocked. Cells outside the grid are not walls.
    #[inline(always)]
    pub fn is_wall(&self, state: &Maze2DState) -> bool {
        self.get(state) == Some(Maze2DCell::Wall)
    }

    #[inline(always)]
    pub fn get(&self, state: &Maze2DState) -> Option<Maze2DCell> {
        self.map
            .get(state.row())
            .and_then(|line| line.get(state.col()))
            .copied()
    }

    pub(crate) fn set(&mut self, state: &Maze2DState, cell: Maze2DCell) {
        debug_assert!(self.in_bounds(state));
        self.map[state.row()][state.col()] = cell;
    }

    pub fn num_open_cells(&self) -> usize {
        self.map
            .iter()
            .flatten()
            .filter(|c| **c == Maze2DCell::Empty)
            .count()
    }

    pub fn random_state<R: rand::Rng>(&self, r: &mut R) -> Option<Maze2DState> {
        let (height, width) = self.dimensions();
        if height == 0 || width == 0 {
            return None;
        }

        for _tries in 0..RANDOM_STATE_MAX_TRIES {
            let row = r.random_range(0..height);
            let col = r.random_range(0..width);
            if self.map[row][col] == Maze2DCell::Empty {
                return Maze2DState::new_from_usize(row, col);
            }
        }

        None
    }
}

impl Space<Maze2DState, Maze2DAction, Maze2DCost> for Maze2DSpace {
    #[inline(always)]
    fn apply(&self, state: &Maze2DState, action: &Maze2DAction) -> Option<Maze2DState> {
        let (d_row, d_col) = action.delta();
        Maze2DState::new(
            state.row.get().wrapping_add(d_row),
            state.col.get().wrapping_add(d_col),
        )
    }

    /// In bounds and not a wall.
    #[inline(always)]
    fn valid(&self, state: &Maze2DState) -> bool {
        self.get(state) == Some(Maze2DCell::Empty)
    }

    /// Gets the neighbours of a given position.
    ///
    /// NOTE: These states can only be used with the current Maze
    fn neighbours(&self, state: &Maze2DState) -> Neighbours<Maze2DState, Maze2DAction> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("StateExpansion");

        let mut v = SmallVec::new();
        for action in Maze2DAction::EXPANSION_ORDER {
            if let Some(s) = self.apply(state, &action) {
                if self.in_bounds(&s) && !self.is_wall(&s) {
                    v.push((s, action));
                }
            }
        }
        v
    }

    fn size(&self) -> Option<usize> {
        let (height, width) = self.dimensions();
        Some(height * width)
    }
}

impl std::fmt::Display for Maze2DSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let d = self.dimensions();
        writeln!(f, "Maze2D({}x{}):", d.0, d.1)?;
        for line in self.map.iter().take(MAX_ELEMENTS_DISPLAYED) {
            for cell in line.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Maze2DSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Maze2D{:?}", self.dimensions())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze2DProblem {
    space: Maze2DSpace,
    start: Maze2DState,
    goal: Maze2DState,
}

impl Problem<Maze2DSpace, Maze2DState, Maze2DAction, Maze2DCost> for Maze2DProblem {
    fn space(&self) -> &Maze2DSpace {
        &self.space
    }
    fn start(&self) -> Maze2DState {
        self.start
    }
    fn goal(&self) -> Maze2DState {
        self.goal
    }
}

impl Maze2DProblem {
    /// Assembles a Problem, opening the start and goal cells.
    pub fn new(mut space: Maze2DSpace, start: Maze2DState, goal: Maze2DState) -> Option<Self> {
        if !space.in_bounds(&start) || !space.in_bounds(&goal) {
            return None;
        }
        space.set(&start, Maze2DCell::Empty);
        space.set(&goal, Maze2DCell::Empty);
        Some(Self { space, start, goal })
    }

    /// Generates a random instance with distinct start and goal.
    ///
    /// Every other cell becomes a wall with probability `wall_ratio`.
    pub fn random<R: rand::Rng>(
        r: &mut R,
        height: usize,
        width: usize,
        wall_ratio: f64,
    ) -> Option<Maze2DProblem> {
        if height * width < 2 || !Maze2DState::safe_dimensions(height, width) {
            return None;
        }
        let wall_ratio = wall_ratio.clamp(0.0, 1.0);

        let mut space = Maze2DSpace::new_empty_with_dimensions(height, width);
        let start = space.random_state(r)?;
        let goal = loop {
            let goal = space.random_state(r)?;
            if goal != start {
                break goal;
            }
        };

        for line in space.map.iter_mut() {
            for cell in line.iter_mut() {
                if r.random_bool(wall_ratio) {
                    *cell = Maze2DCell::Wall;
                }
            }
        }

        Maze2DProblem::new(space, start, goal)
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum Maze2DProblemCell {
    Cell(Maze2DCell),
    #[display("A")]
    Start,
    #[display("B")]
    Goal,
}

impl From<char> for Maze2DProblemCell {
    fn from(ch: char) -> Self {
        match ch {
            START_MARKER => Maze2DProblemCell::Start,
            GOAL_MARKER => Maze2DProblemCell::Goal,
            ch => Maze2DProblemCell::Cell(Maze2DCell::from(ch)),
        }
    }
}

#[derive(Debug, Error)]
pub enum Maze2DProblemParseError {
    #[error("No start given in the Maze")]
    MissingStart,
    #[error("Multiple start positions given ({0})")]
    MultipleStarts(usize),
    #[error("No goal given in the Maze")]
    MissingGoal,
    #[error("Multiple goals given ({0})")]
    MultipleGoals(usize),
    #[error("Maze is too large ({height}x{width})")]
    TooLarge { height: usize, width: usize },
    #[error("I/O error when loading '{p}': {e}")]
    IOError {
        p: std::path::PathBuf,
        e: std::io::Error,
    },
}

/// Checks there's exactly one start and one goal marker.
fn check_markers(s: &str) -> Result<(), Maze2DProblemParseError> {
    match s.matches(START_MARKER).count() {
        0 => return Err(Maze2DProblemParseError::MissingStart),
        1 => {}
        n => return Err(Maze2DProblemParseError::MultipleStarts(n)),
    }
    match s.matches(GOAL_MARKER).count() {
        0 => Err(Maze2DProblemParseError::MissingGoal),
        1 => Ok(()),
        n => Err(Maze2DProblemParseError::MultipleGoals(n)),
    }
}

impl std::convert::TryFrom<&str> for Maze2DProblem {
    type Error = Maze2DProblemParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        check_markers(s)?;

        // Like `str::lines`, but a '\r' before '\n' is kept as whitespace.
        let lines: Vec<&str> = s
            .split_inclusive('\n')
            .map(|line| line.strip_suffix('\n').unwrap_or(line))
            .collect();

        let height = lines.len();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if !Maze2DState::safe_dimensions(height, width) {
            return Err(Maze2DProblemParseError::TooLarge { height, width });
        }

        let mut start = None;
        let mut goal = None;
        let mut map = Vec::with_capacity(height);
        for (row, line) in lines.iter().enumerate() {
            let mut cells = Vec::with_capacity(width);
            for (col, ch) in line.chars().enumerate() {
                cells.push(match Maze2DProblemCell::from(ch) {
                    Maze2DProblemCell::Start => {
                        start = Maze2DState::new_from_usize(row, col);
                        Maze2DCell::Empty
                    }
                    Maze2DProblemCell::Goal => {
                        goal = Maze2DState::new_from_usize(row, col);
                        Maze2DCell::Empty
                    }
                    Maze2DProblemCell::Cell(c) => c,
                });
            }
            map.push(cells);
        }

        let space = Maze2DSpace::new_from_map(map);
        let start = start.ok_or(Maze2DProblemParseError::MissingStart)?;
        let goal = goal.ok_or(Maze2DProblemParseError::MissingGoal)?;
        Ok(Maze2DProblem { space, start, goal })
    }
}

impl std::convert::TryFrom<&std::path::Path> for Maze2DProblem {
    type Error = Maze2DProblemParseError;

    fn try_from(p: &std::path::Path) -> Result<Self, Self::Error> {
        let s = std::fs::read_to_string(p).map_err(|e| Maze2DProblemParseError::IOError {
            p: p.to_path_buf(),
            e,
        })?;
        Maze2DProblem::try_from(s.as_str())
    }
}

impl std::fmt::Display for Maze2DProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let d = self.space.dimensions();

        writeln!(
            f,
            "Maze2DProblem({}x{}) (s:{}, g:{}):",
            d.0, d.1, self.start, self.goal
        )?;
        let map = &self.space.map;
        for (row, line) in map.iter().enumerate().take(MAX_ELEMENTS_DISPLAYED) {
            for (col, cell) in line.iter().enumerate().take(MAX_ELEMENTS_DISPLAYED) {
                let is_start = self.start.row() == row && self.start.col() == col;
                let is_goal = self.goal.row() == row && self.goal.col() == col;

                match (is_start, is_goal) {
                    (true, true) => {
                        write!(f, "!")?;
                    }
                    (true, false) => {
                        write!(f, "{START_MARKER}")?;
                    }
                    (false, true) => {
                        write!(f, "{GOAL_MARKER}")?;
                    }
                    (false, false) => {
                        write!(f, "{cell}")?;
                    }
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Maze2DHeuristicManhattanDistance;

impl ObjectiveHeuristic<Maze2DSpace, Maze2DState, Maze2DAction, Maze2DCost>
    for Maze2DHeuristicManhattanDistance
{
    /// The distance of following straight lines
    #[inline(always)]
    fn h(a: &Maze2DState, b: &Maze2DState) -> Maze2DCost {
        let delta_row = a.row.get().abs_diff(b.row.get());
        let delta_col = a.col.get().abs_diff(b.col.get());

        delta_row.saturating_add(delta_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    fn s(row: usize, col: usize) -> Maze2DState {
        Maze2DState::new_from_usize(row, col).unwrap()
    }

    #[test]
    fn parse_small_maze() {
        let maze_str = indoc! {"
          ###
          #A#
          # #
          #B#
          ###
        "};
        let problem = Maze2DProblem::try_from(maze_str).unwrap();
        assert_eq!(problem.space().dimensions(), (5, 3));
        assert_eq!(problem.start(), s(1, 1));
        assert_eq!(problem.goal(), s(3, 1));
        assert!(problem.space().is_wall(&s(0, 0)));
        assert!(!problem.space().is_wall(&s(2, 1)));
        assert!(!problem.space().is_wall(&s(1, 1)));
    }

    #[test]
    fn any_non_whitespace_is_a_wall() {
        let problem = Maze2DProblem::try_from("A.x-\nB\t ?").unwrap();
        let space = problem.space();
        assert!(space.is_wall(&s(0, 1)));
        assert!(space.is_wall(&s(0, 2)));
        assert!(space.is_wall(&s(0, 3)));
        assert!(!space.is_wall(&s(1, 1)));
        assert!(!space.is_wall(&s(1, 2)));
        assert!(space.is_wall(&s(1, 3)));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let problem = Maze2DProblem::try_from("A####\n#\n##B\n").unwrap();
        let space = problem.space();
        assert_eq!(space.dimensions(), (3, 5));
        assert!(space.map.iter().all(|line| line.len() == 5));
        assert!(!space.is_wall(&s(1, 4)));
        assert!(!space.is_wall(&s(2, 3)));
        assert_eq!(problem.goal(), s(2, 2));
    }

    #[test]
    fn carriage_returns_are_passable() {
        let problem = Maze2DProblem::try_from("A#\r\n#B\r\n").unwrap();
        let space = problem.space();
        assert_eq!(space.dimensions(), (2, 3));
        assert!(!space.is_wall(&s(0, 2)));
    }

    #[test]
    fn marker_validation() {
        assert!(matches!(
            Maze2DProblem::try_from("  \n B"),
            Err(Maze2DProblemParseError::MissingStart)
        ));
        assert!(matches!(
            Maze2DProblem::try_from("A A\n B"),
            Err(Maze2DProblemParseError::MultipleStarts(2))
        ));
        assert!(matches!(
            Maze2DProblem::try_from("A  \n  "),
            Err(Maze2DProblemParseError::MissingGoal)
        ));
        assert!(matches!(
            Maze2DProblem::try_from("AB\nBB"),
            Err(Maze2DProblemParseError::MultipleGoals(3))
        ));
        // Starts are checked first.
        assert!(matches!(
            Maze2DProblem::try_from(""),
            Err(Maze2DProblemParseError::MissingStart)
        ));
    }

    #[test]
    fn missing_file() {
        let p = std::path::Path::new("/nonexistent/maze.txt");
        assert!(matches!(
            Maze2DProblem::try_from(p),
            Err(Maze2DProblemParseError::IOError { .. })
        ));
    }

    #[test]
    fn neighbours_order_and_filtering() {
        let maze_str = indoc! {"
          A #
           B
          # #
        "};
        let problem = Maze2DProblem::try_from(maze_str).unwrap();
        let space = problem.space();

        let n: Vec<_> = space.neighbours(&s(1, 1)).into_iter().collect();
        assert_eq!(
            n,
            vec![
                (s(1, 2), Maze2DAction::Right),
                (s(1, 0), Maze2DAction::Left),
                (s(0, 1), Maze2DAction::Up),
                (s(2, 1), Maze2DAction::Down),
            ]
        );

        // Corner: up and left fall outside the grid.
        let n: Vec<_> = space.neighbours(&s(0, 0)).into_iter().collect();
        assert_eq!(
            n,
            vec![(s(0, 1), Maze2DAction::Right), (s(1, 0), Maze2DAction::Down)]
        );

        // Both neighbours of (2,1) along the row are walls.
        let n: Vec<_> = space.neighbours(&s(2, 1)).into_iter().collect();
        assert_eq!(n, vec![(s(1, 1), Maze2DAction::Up)]);

        // Right of (0,1) is a wall.
        let n: Vec<_> = space.neighbours(&s(0, 1)).into_iter().collect();
        assert_eq!(
            n,
            vec![(s(0, 0), Maze2DAction::Left), (s(1, 1), Maze2DAction::Down)]
        );
    }

    #[test]
    fn queries_outside_the_grid() {
        let space = Maze2DSpace::new_empty_with_dimensions(2, 3);
        assert!(space.in_bounds(&s(1, 2)));
        assert!(!space.in_bounds(&s(2, 0)));
        assert!(!space.in_bounds(&s(0, 3)));
        assert!(!space.is_wall(&s(10, 10)));
        assert!(space.neighbours(&s(10, 10)).is_empty());
    }

    #[test]
    fn apply_moves() {
        let space = Maze2DSpace::new_empty_with_dimensions(3, 3);
        let c = s(1, 1);
        assert_eq!(space.apply(&c, &Maze2DAction::Up), Some(s(0, 1)));
        assert_eq!(space.apply(&c, &Maze2DAction::Down), Some(s(2, 1)));
        assert_eq!(space.apply(&c, &Maze2DAction::Left), Some(s(1, 0)));
        assert_eq!(space.apply(&c, &Maze2DAction::Right), Some(s(1, 2)));
        // Wraps around to the niche value, which is not representable.
        let corner = s(0, 0);
        let up = space.apply(&corner, &Maze2DAction::Up);
        assert!(up.is_none_or(|u| !space.in_bounds(&u)));
    }

    #[test]
    fn manhattan_distance() {
        type H = Maze2DHeuristicManhattanDistance;
        assert_eq!(H::h(&s(0, 0), &s(0, 0)), 0);
        assert_eq!(H::h(&s(0, 0), &s(4, 4)), 8);
        assert_eq!(H::h(&s(4, 1), &s(2, 3)), 4);
        assert_eq!(H::h(&s(2, 3), &s(4, 1)), 4);
    }

    #[test]
    fn random_problems_are_well_formed() {
        for seed in 0..20u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let problem = Maze2DProblem::random(&mut rng, 7, 9, 0.3).unwrap();
            assert_eq!(problem.space().dimensions(), (7, 9));
            assert_ne!(problem.start(), problem.goal());
            assert!(problem.space().valid(&problem.start()));
            assert!(problem.space().valid(&problem.goal()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(Maze2DProblem::random(&mut rng, 1, 1, 0.0).is_none());
    }

    #[test]
    fn display_marks_start_and_goal() {
        let problem = Maze2DProblem::try_from("A #\n  B").unwrap();
        let shown = format!("{problem}");
        assert!(shown.starts_with("Maze2DProblem(2x3)"));
        assert!(shown.contains("A░█"));
        assert!(shown.contains("░░B"));
    }
}
