//! Presentation of solved mazes.
//!
//! A `Classification` labels every cell once, then both the console text and
//! the raster image are drawn from it.

use derive_more::Display;
use image::Rgb;
use image::RgbImage;
use owo_colors::OwoColorize;
use thiserror::Error;

use crate::problem::Problem;
use crate::problems::maze_2d::Maze2DAction;
use crate::problems::maze_2d::Maze2DCell;
use crate::problems::maze_2d::Maze2DCost;
use crate::problems::maze_2d::Maze2DProblem;
use crate::problems::maze_2d::Maze2DState;
use crate::space::Path;

pub const DEFAULT_CELL_SIZE: u32 = 100;
const OUTLINE_WIDTH: u32 = 2;

// Simple colours
const WHITE: Rgb<u8> = Rgb([u8::MAX, u8::MAX, u8::MAX]);
const BLACK: Rgb<u8> = Rgb([u8::MIN, u8::MIN, u8::MIN]);
const RED: Rgb<u8> = Rgb([u8::MAX, u8::MIN, u8::MIN]);
const GREEN: Rgb<u8> = Rgb([u8::MIN, u8::MAX, u8::MIN]);
const BLUE: Rgb<u8> = Rgb([u8::MIN, u8::MIN, u8::MAX]);
const LIGHT_GREY: Rgb<u8> = Rgb([230, 230, 230]);

const WALL_GLYPH: char = '█';

pub type Maze2DPath = Path<Maze2DState, Maze2DAction, Maze2DCost>;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum CellKind {
    #[display("█")]
    Wall,
    #[display("A")]
    Start,
    #[display("B")]
    Goal,
    #[display(" ")]
    Open,
    /// Part of the solution, reached through the given action.
    #[display("{_0}")]
    Path(Maze2DAction),
}

impl CellKind {
    pub fn colour(&self) -> Rgb<u8> {
        match self {
            CellKind::Wall => BLACK,
            CellKind::Start => RED,
            CellKind::Goal => BLUE,
            CellKind::Open => LIGHT_GREY,
            CellKind::Path(_) => GREEN,
        }
    }
}

/// A `CellKind` per cell of a problem's grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    cells: Vec<Vec<CellKind>>,
}

impl Classification {
    /// Labels the cells of `problem`, overlaying `path` if given.
    ///
    /// Start and goal keep their own kind even though the path goes through
    /// them.
    pub fn new(problem: &Maze2DProblem, path: Option<&Maze2DPath>) -> Self {
        let space = problem.space();
        let mut cells: Vec<Vec<CellKind>> = space
            .map
            .iter()
            .map(|line| {
                line.iter()
                    .map(|cell| match cell {
                        Maze2DCell::Wall => CellKind::Wall,
                        Maze2DCell::Empty => CellKind::Open,
                    })
                    .collect()
            })
            .collect();

        if let Some(path) = path {
            for (s, a) in &path.steps {
                cells[s.row()][s.col()] = CellKind::Path(*a);
            }
        }
        let start = problem.start();
        let goal = problem.goal();
        cells[start.row()][start.col()] = CellKind::Start;
        cells[goal.row()][goal.col()] = CellKind::Goal;

        Self { cells }
    }

    /// `(height, width)`
    pub fn dimensions(&self) -> (usize, usize) {
        (
            self.cells.len(),
            self.cells.first().map_or(0, |line| line.len()),
        )
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellKind> {
        self.cells.get(row).and_then(|line| line.get(col)).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellKind]> {
        self.cells.iter().map(Vec::as_slice)
    }
}

/// Console rendering of a solved maze.
///
/// Consecutive walls are joined so wall runs look solid.
#[derive(Clone, Debug)]
pub struct SolutionView {
    classification: Classification,
    nodes_explored: usize,
    colours: bool,
}

impl SolutionView {
    pub fn new(classification: Classification, nodes_explored: usize) -> Self {
        Self {
            classification,
            nodes_explored,
            colours: false,
        }
    }

    /// Highlights the solution with ANSI colours.
    pub fn with_colours(mut self, colours: bool) -> Self {
        self.colours = colours;
        self
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }
}

impl std::fmt::Display for SolutionView {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for line in self.classification.rows() {
            for (col, kind) in line.iter().enumerate() {
                let joined = *kind == CellKind::Wall && line.get(col + 1) == Some(&CellKind::Wall);
                let separator = if joined { WALL_GLYPH } else { ' ' };

                match (self.colours, kind) {
                    (true, CellKind::Path(_)) => write!(f, "{}", kind.green())?,
                    (true, CellKind::Start) => write!(f, "{}", kind.red())?,
                    (true, CellKind::Goal) => write!(f, "{}", kind.blue())?,
                    _ => write!(f, "{kind}")?,
                }
                write!(f, "{separator}")?;
            }
            writeln!(f)?;
        }
        write!(f, "States Explored: {}", self.nodes_explored)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid cell size {0}")]
    InvalidCellSize(u32),
    #[error("Maze too large for an image ({height}x{width} cells of {cell_size}px)")]
    TooLarge {
        height: usize,
        width: usize,
        cell_size: u32,
    },
    #[error("Image error when saving '{p}': {e}")]
    ImageError {
        p: std::path::PathBuf,
        e: image::ImageError,
    },
    #[error("Failed to write the solution: {0}")]
    Write(#[from] std::io::Error),
}

/// Draws every cell as a `cell_size` square with a white outline.
pub fn render_image(
    classification: &Classification,
    cell_size: u32,
) -> Result<RgbImage, RenderError> {
    if cell_size == 0 {
        return Err(RenderError::InvalidCellSize(cell_size));
    }
    let (height, width) = classification.dimensions();
    let too_large = || RenderError::TooLarge {
        height,
        width,
        cell_size,
    };
    let img_width = u32::try_from(width)
        .ok()
        .and_then(|w| w.checked_mul(cell_size))
        .ok_or_else(too_large)?;
    let img_height = u32::try_from(height)
        .ok()
        .and_then(|h| h.checked_mul(cell_size))
        .ok_or_else(too_large)?;

    let img = RgbImage::from_fn(img_width, img_height, |x, y| {
        let (col, px) = ((x / cell_size) as usize, x % cell_size);
        let (row, py) = ((y / cell_size) as usize, y % cell_size);

        let far = cell_size.saturating_sub(OUTLINE_WIDTH);
        if px < OUTLINE_WIDTH || py < OUTLINE_WIDTH || px >= far || py >= far {
            return WHITE;
        }
        classification
            .get(row, col)
            .map_or(BLACK, |kind| kind.colour())
    });

    Ok(img)
}

pub fn save_image(img: &RgbImage, p: &std::path::Path) -> Result<(), RenderError> {
    img.save(p).map_err(|e| RenderError::ImageError {
        p: p.to_path_buf(),
        e,
    })
}

/// Writes `view` to `out`, then saves its image to `image` as `(path, cell_size)`.
///
/// The text is written even if the image can't be produced.
pub fn show_and_save<W: std::io::Write>(
    out: &mut W,
    view: &SolutionView,
    image: Option<(&std::path::Path, u32)>,
) -> Result<(), RenderError> {
    writeln!(out, "{view}")?;
    out.flush()?;

    if let Some((p, cell_size)) = image {
        let img = render_image(view.classification(), cell_size)?;
        save_image(&img, p)?;
        log::info!("Saved {p:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::algorithms::frontier::Strategy;
    use crate::algorithms::solver::solve;
    use crate::problems::maze_2d::Maze2DHeuristicManhattanDistance;
    use crate::problems::maze_2d::Maze2DSpace;

    fn solved(maze_str: &str) -> (Maze2DProblem, Maze2DPath, usize) {
        let problem = Maze2DProblem::try_from(maze_str).unwrap();
        let outcome = solve::<
            Maze2DHeuristicManhattanDistance,
            Maze2DProblem,
            Maze2DSpace,
            Maze2DState,
            Maze2DAction,
            Maze2DCost,
        >(problem.clone(), Strategy::AStar, None)
        .unwrap();
        let nodes_explored = outcome.nodes_explored();
        (problem, outcome.path().unwrap().clone(), nodes_explored)
    }

    #[test]
    fn classification_marks_path() {
        let (problem, path, _) = solved("A  \n## \nB  \n");
        let c = Classification::new(&problem, Some(&path));

        assert_eq!(c.dimensions(), (3, 3));
        assert_eq!(c.get(0, 0), Some(CellKind::Start));
        assert_eq!(c.get(0, 1), Some(CellKind::Path(Maze2DAction::Right)));
        assert_eq!(c.get(0, 2), Some(CellKind::Path(Maze2DAction::Right)));
        assert_eq!(c.get(1, 2), Some(CellKind::Path(Maze2DAction::Down)));
        assert_eq!(c.get(2, 2), Some(CellKind::Path(Maze2DAction::Down)));
        assert_eq!(c.get(2, 1), Some(CellKind::Path(Maze2DAction::Left)));
        assert_eq!(c.get(2, 0), Some(CellKind::Goal));
        assert_eq!(c.get(1, 0), Some(CellKind::Wall));
        assert_eq!(c.get(3, 0), None);
    }

    #[test]
    fn classification_without_path() {
        let problem = Maze2DProblem::try_from("A #\n  B").unwrap();
        let c = Classification::new(&problem, None);
        assert_eq!(c.get(0, 1), Some(CellKind::Open));
        assert_eq!(c.get(0, 2), Some(CellKind::Wall));
        assert_eq!(c.get(1, 2), Some(CellKind::Goal));
    }

    #[test]
    fn text_rendering() {
        let (problem, path, nodes_explored) = solved("A  \n## \nB  \n");
        let view = SolutionView::new(Classification::new(&problem, Some(&path)), nodes_explored);

        let expected = "A → → \n\
                        ███ ↓ \n\
                        B ← ↓ \n\
                        States Explored: 7";
        assert_eq!(view.to_string(), expected);
        assert_eq!(nodes_explored, 7);
    }

    #[test]
    fn wall_runs_are_joined() {
        let problem = Maze2DProblem::try_from("###A\n# B#").unwrap();
        let view = SolutionView::new(Classification::new(&problem, None), 0);
        let shown = view.to_string();
        let mut lines = shown.lines();
        assert_eq!(lines.next(), Some("█████ A "));
        assert_eq!(lines.next(), Some("█   B █ "));
    }

    #[test]
    fn image_rendering() {
        let (problem, path, _) = solved("A  \n## \nB  \n");
        let c = Classification::new(&problem, Some(&path));
        let img = render_image(&c, 10).unwrap();

        assert_eq!(img.dimensions(), (30, 30));
        // Outline
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(9, 5), WHITE);
        // Centres of (row, col) are at (col * 10 + 5, row * 10 + 5).
        assert_eq!(*img.get_pixel(5, 5), RED);
        assert_eq!(*img.get_pixel(15, 5), GREEN);
        assert_eq!(*img.get_pixel(5, 15), BLACK);
        assert_eq!(*img.get_pixel(5, 25), BLUE);
    }

    #[test]
    fn image_open_cells() {
        let problem = Maze2DProblem::try_from("A \n B").unwrap();
        let img = render_image(&Classification::new(&problem, None), 4 + OUTLINE_WIDTH * 2).unwrap();
        assert_eq!(*img.get_pixel(12, 4), LIGHT_GREY);
    }

    #[test]
    fn text_is_shown_before_image_errors() {
        let (problem, path, nodes_explored) = solved("A  \n## \nB  \n");
        let view = SolutionView::new(Classification::new(&problem, Some(&path)), nodes_explored);

        let mut out = Vec::new();
        let result = show_and_save(&mut out, &view, Some((std::path::Path::new("unused.png"), 0)));
        assert!(matches!(result, Err(RenderError::InvalidCellSize(0))));
        assert_eq!(String::from_utf8(out).unwrap(), format!("{view}\n"));
    }

    #[test]
    fn text_only() {
        let problem = Maze2DProblem::try_from("AB").unwrap();
        let view = SolutionView::new(Classification::new(&problem, None), 1);

        let mut out = Vec::new();
        show_and_save(&mut out, &view, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "A B \nStates Explored: 1\n");
    }

    #[test]
    fn image_rejects_empty_cells() {
        let problem = Maze2DProblem::try_from("AB").unwrap();
        let c = Classification::new(&problem, None);
        assert!(matches!(
            render_image(&c, 0),
            Err(RenderError::InvalidCellSize(0))
        ));
    }
}
