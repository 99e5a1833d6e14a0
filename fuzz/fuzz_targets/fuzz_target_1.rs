#![no_main]

use libfuzzer_sys::fuzz_target;

use maze_solver::algorithms::frontier::Strategy;
use maze_solver::algorithms::solver::solve;
use maze_solver::problem::Problem;
use maze_solver::problems::maze_2d::Maze2DAction;
use maze_solver::problems::maze_2d::Maze2DCost;
use maze_solver::problems::maze_2d::Maze2DHeuristicManhattanDistance;
use maze_solver::problems::maze_2d::Maze2DProblem;
use maze_solver::problems::maze_2d::Maze2DSpace;
use maze_solver::problems::maze_2d::Maze2DState;
use maze_solver::space::Space;

const MAX_EXPANSIONS: usize = 1 << 16;

fuzz_target!(|data: &[u8]| {
    let Ok(maze_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(problem) = Maze2DProblem::try_from(maze_str) else {
        return;
    };

    for strategy in Strategy::ALL {
        let outcome = solve::<
            Maze2DHeuristicManhattanDistance,
            Maze2DProblem,
            Maze2DSpace,
            Maze2DState,
            Maze2DAction,
            Maze2DCost,
        >(problem.clone(), strategy, Some(MAX_EXPANSIONS));

        if let Ok(outcome) = outcome
            && let Some(path) = outcome.path()
        {
            assert!(problem.space().valid_path(path));
            assert_eq!(path.start, problem.start());
            assert_eq!(path.end, problem.goal());
        }
    }
});
