use std::path::PathBuf;
use std::process::ExitCode;

use anstream::eprintln;
use anstream::println;
use clap::Parser;
use owo_colors::OwoColorize;

use maze_solver::algorithms::frontier::AStar;
use maze_solver::algorithms::frontier::BreadthFirst;
use maze_solver::algorithms::frontier::DepthFirst;
use maze_solver::algorithms::frontier::FrontierPolicy;
use maze_solver::algorithms::frontier::GreedyBestFirst;
use maze_solver::algorithms::frontier::Strategy;
use maze_solver::algorithms::solver::SearchOutcome;
use maze_solver::algorithms::solver::SearchStatus;
use maze_solver::algorithms::solver::Solver;
use maze_solver::error::SearchError;
use maze_solver::problems::maze_2d::Maze2DAction;
use maze_solver::problems::maze_2d::Maze2DCost;
use maze_solver::problems::maze_2d::Maze2DHeuristicManhattanDistance;
use maze_solver::problems::maze_2d::Maze2DProblem;
use maze_solver::problems::maze_2d::Maze2DSpace;
use maze_solver::problems::maze_2d::Maze2DState;
use maze_solver::render::Classification;
use maze_solver::render::DEFAULT_CELL_SIZE;
use maze_solver::render::SolutionView;
use maze_solver::render::show_and_save;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

type Maze2DSolver<P> = Solver<
    P,
    Maze2DHeuristicManhattanDistance,
    Maze2DProblem,
    Maze2DSpace,
    Maze2DState,
    Maze2DAction,
    Maze2DCost,
>;
type Maze2DOutcome = SearchOutcome<Maze2DState, Maze2DAction, Maze2DCost>;

/// Finds a path between the `A` and `B` markers of a text maze
#[derive(Parser, Debug)]
#[clap(long_version = maze_solver::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Text maze. Whitespace is open, `A` is the start, `B` the goal and
    /// anything else is a wall.
    #[arg()]
    pub maze: PathBuf,

    #[arg(short, long, env = "MAZE_STRATEGY", value_enum, default_value_t = Strategy::AStar)]
    pub strategy: Strategy,

    /// Where to save the rendered solution
    #[arg(short, long, env = "MAZE_OUTPUT", default_value = "maze_output.png")]
    pub output: PathBuf,
    #[arg(long, default_value_t = DEFAULT_CELL_SIZE)]
    pub cell_size: u32,
    /// Skip saving the rendered solution
    #[arg(long)]
    pub no_image: bool,

    /// Give up after exploring this many nodes
    #[arg(long)]
    pub max_expansions: Option<usize>,
    /// Print memory usage of the search
    #[arg(long)]
    pub stats: bool,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

fn search<P: FrontierPolicy>(
    args: &Args,
    problem: Maze2DProblem,
) -> Result<Maze2DOutcome, Box<dyn std::error::Error>> {
    let mut solver = Maze2DSolver::<P>::new(problem).with_max_expansions(args.max_expansions);
    while solver.step()? == SearchStatus::Running {}

    if args.stats {
        solver.write_memory_stats(std::io::stdout().lock())?;
    }
    let outcome = solver.outcome().ok_or(SearchError::MissingGoalNode)?;
    Ok(outcome)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let problem = Maze2DProblem::try_from(args.maze.as_path())?;
    log::info!("Loaded {:?}", args.maze);
    log::debug!("{problem}");
    println!("Solving {:?} with {}", args.maze.yellow(), args.strategy.cyan());

    let outcome = match args.strategy {
        Strategy::DepthFirst => search::<DepthFirst>(args, problem.clone())?,
        Strategy::BreadthFirst => search::<BreadthFirst>(args, problem.clone())?,
        Strategy::GreedyBestFirst => search::<GreedyBestFirst>(args, problem.clone())?,
        Strategy::AStar => search::<AStar>(args, problem.clone())?,
    };

    match outcome {
        SearchOutcome::NoSolution { nodes_explored } => {
            log::info!("Explored {nodes_explored} nodes");
            println!("{}", "No Solution".red());
        }
        SearchOutcome::Solved {
            path,
            nodes_explored,
        } => {
            log::info!("Found {path}");
            let view = SolutionView::new(Classification::new(&problem, Some(&path)), nodes_explored)
                .with_colours(true);
            let image = (!args.no_image).then_some((args.output.as_path(), args.cell_size));
            show_and_save(&mut anstream::stdout(), &view, image)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.color.write_global();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
