use std::{
    fmt,
    ops::{Index, IndexMut},
};

use log::debug;
use strum::VariantArray;

use crate::{
    env::{DiscreteActionSpace, Environment, Step},
    error::{ConfigError, Result},
};

/// Reward for entering the gem cell
pub const GEM_REWARD: f64 = 10.0;
/// Reward for entering a mine cell
pub const MINE_REWARD: f64 = -10.0;
/// Cost of every ordinary move
pub const STEP_REWARD: f64 = -0.01;
/// Penalty for attempting to move off the grid or into a barrier
pub const INVALID_MOVE_REWARD: f64 = -0.1;

/// Position coordinates as `(row, col)`, 0-indexed from the top left
pub type Pos = (usize, usize);

/// Contents of a single square
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    Agent,
    Gem,
    Mine,
    Barrier,
}

impl Cell {
    /// Reward and terminal flag for moving into a cell of this kind
    fn entry(self) -> (f64, bool) {
        match self {
            Cell::Gem => (GEM_REWARD, true),
            Cell::Mine => (MINE_REWARD, true),
            _ => (STEP_REWARD, false),
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Agent => 'A',
            Cell::Gem => 'G',
            Cell::Mine => 'M',
            Cell::Barrier => '#',
        }
    }
}

#[derive(VariantArray, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Action {
    /// Number of distinct actions
    pub const COUNT: usize = 4;

    /// Coordinate change as `(d_row, d_col)`
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// Column of this action in a value table row
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A square board of [`Cell`]s stored row-major
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.0 < self.size && pos.1 < self.size
    }

    /// Iterate over the rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    /// Count the squares holding `cell`
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }
}

impl Index<Pos> for Grid {
    type Output = Cell;

    fn index(&self, (row, col): Pos) -> &Self::Output {
        &self.cells[row * self.size + col]
    }
}

impl IndexMut<Pos> for Grid {
    fn index_mut(&mut self, (row, col): Pos) -> &mut Self::Output {
        &mut self.cells[row * self.size + col]
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|c| c.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Placement of the fixed features of a [`GridWorld`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub size: usize,
    pub start: Pos,
    pub gem: Pos,
    pub mines: Vec<Pos>,
    pub barriers: Vec<Pos>,
}

impl Layout {
    /// An open `size` x `size` board with only a start and a gem
    pub fn new(size: usize, start: Pos, gem: Pos) -> Self {
        Self {
            size,
            start,
            gem,
            mines: Vec::new(),
            barriers: Vec::new(),
        }
    }

    /// The 5x5 board: barriers on the inner diagonal corners, three mines,
    /// the gem in the bottom right corner and the agent starting top left
    pub fn canonical() -> Self {
        Self::new(5, (0, 0), (4, 4))
            .with_barriers([(1, 1), (1, 3), (3, 1), (3, 3)])
            .with_mines([(2, 1), (1, 4), (4, 2)])
    }

    pub fn with_barriers(mut self, barriers: impl IntoIterator<Item = Pos>) -> Self {
        self.barriers.extend(barriers);
        self
    }

    pub fn with_mines(mut self, mines: impl IntoIterator<Item = Pos>) -> Self {
        self.mines.extend(mines);
        self
    }

    /// Check that every feature is on the board and that features don't collide
    pub fn validate(&self) -> Result<()> {
        let size = self.size;
        if size == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        let in_bounds = |feature, pos: Pos| {
            if pos.0 < size && pos.1 < size {
                Ok(())
            } else {
                Err(ConfigError::OutOfBounds { feature, pos, size })
            }
        };
        in_bounds("start", self.start)?;
        in_bounds("gem", self.gem)?;
        for &pos in &self.mines {
            in_bounds("mine", pos)?;
        }
        for &pos in &self.barriers {
            in_bounds("barrier", pos)?;
        }

        let overlap = |first, second, pos| Err(ConfigError::Overlap { first, second, pos });
        if self.start == self.gem {
            return overlap("start", "gem", self.start);
        }
        for &pos in &self.mines {
            if pos == self.start {
                return overlap("start", "mine", pos);
            }
            if pos == self.gem {
                return overlap("gem", "mine", pos);
            }
        }
        for &pos in &self.barriers {
            if pos == self.start {
                return overlap("start", "barrier", pos);
            }
            if pos == self.gem {
                return overlap("gem", "barrier", pos);
            }
            if self.mines.contains(&pos) {
                return overlap("mine", "barrier", pos);
            }
        }

        Ok(())
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::canonical()
    }
}

/// A square grid in which an agent searches for a gem while avoiding mines
///
/// Barriers block movement. Walking into a barrier or off the edge costs
/// [`INVALID_MOVE_REWARD`] and leaves the agent in place. Reaching the gem or a mine
/// ends the episode.
///
/// Intended for use with a [QTableAgent](crate::algo::tabular::q_table::QTableAgent)
#[derive(Clone, Debug)]
pub struct GridWorld {
    layout: Layout,
    grid: Grid,
    pos: Pos,
    terminal: bool,
}

impl GridWorld {
    /// Build an environment from a custom layout
    ///
    /// Fails if the layout is malformed, see [`Layout::validate`]
    pub fn new(layout: Layout) -> Result<Self> {
        layout.validate()?;
        Ok(Self::build(layout))
    }

    /// The environment on the [canonical](Layout::canonical) layout
    pub fn canonical() -> Self {
        Self::build(Layout::canonical())
    }

    fn build(layout: Layout) -> Self {
        let mut env = Self {
            grid: Grid::new(layout.size),
            pos: layout.start,
            terminal: false,
            layout,
        };
        env.reset();
        env
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Whether the last step ended the episode
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Where `action` would take the agent from `pos`, or `None` if the move
    /// leaves the grid or runs into a barrier
    pub fn destination(&self, pos: Pos, action: Action) -> Option<Pos> {
        let (dr, dc) = action.delta();
        let row = pos.0.checked_add_signed(dr)?;
        let col = pos.1.checked_add_signed(dc)?;
        let dest = (row, col);
        (self.grid.contains(dest) && self.grid[dest] != Cell::Barrier).then_some(dest)
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::canonical()
    }
}

impl Environment for GridWorld {
    type State = Pos;
    type Action = Action;

    fn step(&mut self, action: Self::Action) -> Step<Self::State> {
        // The episode is over, nothing moves
        if self.terminal {
            return (self.pos, 0.0, true).into();
        }

        let Some(dest) = self.destination(self.pos, action) else {
            return (self.pos, INVALID_MOVE_REWARD, false).into();
        };

        let prior = self.grid[dest];
        self.grid[self.pos] = Cell::Empty;
        self.pos = dest;

        let (reward, done) = prior.entry();
        // A mine keeps showing after it is stepped on
        if prior != Cell::Mine {
            self.grid[dest] = Cell::Agent;
        }
        self.terminal = done;

        (dest, reward, done).into()
    }

    fn reset(&mut self) -> Self::State {
        let Layout {
            start,
            gem,
            ref mines,
            ref barriers,
            ..
        } = self.layout;

        self.grid.clear();
        for &pos in barriers {
            self.grid[pos] = Cell::Barrier;
        }
        for &pos in mines {
            self.grid[pos] = Cell::Mine;
        }
        self.grid[gem] = Cell::Gem;
        self.grid[start] = Cell::Agent;

        self.pos = start;
        self.terminal = false;
        debug!("grid reset, agent at {start:?}");
        self.pos
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self, state: &Self::State) -> Vec<Self::Action> {
        Action::VARIANTS
            .iter()
            .copied()
            .filter(|&a| self.destination(*state, a).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Place the agent somewhere else on the canonical board
    fn env_at(pos: Pos) -> GridWorld {
        let layout = Layout {
            start: pos,
            ..Layout::canonical()
        };
        GridWorld::new(layout).unwrap()
    }

    #[test]
    fn canonical_reset() {
        let mut env = GridWorld::canonical();
        assert_eq!(env.reset(), (0, 0), "Agent starts top left");
        assert_eq!(
            env.actions(&(0, 0)),
            vec![Action::Down, Action::Right],
            "Up and Left are out of bounds"
        );

        let grid = env.grid();
        assert_eq!(grid[(0, 0)], Cell::Agent);
        assert_eq!(grid[(4, 4)], Cell::Gem);
        assert_eq!(grid.count(Cell::Barrier), 4);
        assert_eq!(grid.count(Cell::Mine), 3);
        assert_eq!(grid.count(Cell::Agent), 1, "Exactly one agent");
    }

    #[test]
    fn reset_is_idempotent() {
        let mut env = GridWorld::canonical();
        let fresh = env.grid().clone();
        env.step(Action::Right);
        env.step(Action::Right);
        assert_ne!(env.grid(), &fresh);

        assert_eq!(env.reset(), (0, 0));
        assert_eq!(env.grid(), &fresh, "Reset restores the board");
        assert_eq!(env.reset(), (0, 0));
        assert_eq!(env.grid(), &fresh, "Second reset changes nothing");
        assert!(!env.is_terminal());
    }

    #[test]
    fn step_into_empty() {
        let mut env = GridWorld::canonical();
        let step = env.step(Action::Right);
        assert_eq!(step.next_state, (0, 1));
        assert_eq!(step.reward, STEP_REWARD);
        assert!(!step.done);

        assert_eq!(env.grid()[(0, 0)], Cell::Empty, "Vacated cell is cleared");
        assert_eq!(env.grid()[(0, 1)], Cell::Agent, "Agent moved");
        assert_eq!(env.grid().count(Cell::Agent), 1);
    }

    #[test]
    fn step_into_barrier() {
        let mut env = env_at((3, 2));
        let before = env.grid().clone();
        let step = env.step(Action::Left);
        assert_eq!(step.next_state, (3, 2), "Position is unchanged");
        assert_eq!(step.reward, INVALID_MOVE_REWARD);
        assert!(!step.done);
        assert_eq!(env.grid(), &before, "Board is unchanged");
    }

    #[test]
    fn step_off_the_edge() {
        let mut env = GridWorld::canonical();
        for action in [Action::Up, Action::Left] {
            let step = env.step(action);
            assert_eq!(step, Step::from(((0, 0), INVALID_MOVE_REWARD, false)));
        }
        assert_eq!(env.pos(), (0, 0));
    }

    #[test]
    fn step_into_mine() {
        let mut env = env_at((2, 0));
        let step = env.step(Action::Right);
        assert_eq!(step.next_state, (2, 1));
        assert_eq!(step.reward, MINE_REWARD);
        assert!(step.done);

        let grid = env.grid();
        assert_eq!(grid[(2, 1)], Cell::Mine, "Mine is not overwritten");
        assert_eq!(grid[(2, 0)], Cell::Empty);
        assert_eq!(grid.count(Cell::Agent), 0, "Agent marker is removed");
        assert!(env.is_terminal());
    }

    #[test]
    fn step_into_gem() {
        let mut env = env_at((4, 3));
        let step = env.step(Action::Right);
        assert_eq!(step.next_state, (4, 4));
        assert_eq!(step.reward, GEM_REWARD);
        assert!(step.done);
        assert_eq!(env.grid()[(4, 4)], Cell::Agent);
        assert_eq!(env.grid().count(Cell::Gem), 0);
    }

    #[test]
    fn step_after_terminal() {
        let mut env = env_at((2, 0));
        env.step(Action::Right);
        let board = env.grid().clone();
        let step = env.step(Action::Up);
        assert_eq!(step, Step::from(((2, 1), 0.0, true)), "Finished episode is inert");
        assert_eq!(env.grid(), &board);
    }

    #[test]
    fn rewards_for_every_neighbor() {
        let env = GridWorld::canonical();
        let size = env.size();
        for row in 0..size {
            for col in 0..size {
                if env.grid()[(row, col)] != Cell::Empty {
                    continue;
                }
                for &action in Action::VARIANTS {
                    let mut env = env_at((row, col));
                    let target = env.destination((row, col), action);
                    let prior = target.map(|t| env.grid()[t]);
                    let step = env.step(action);
                    match prior {
                        None => {
                            assert_eq!(step.next_state, (row, col));
                            assert_eq!((step.reward, step.done), (INVALID_MOVE_REWARD, false));
                        }
                        Some(Cell::Gem) => assert_eq!((step.reward, step.done), (GEM_REWARD, true)),
                        Some(Cell::Mine) => {
                            assert_eq!((step.reward, step.done), (MINE_REWARD, true))
                        }
                        Some(Cell::Empty) => {
                            assert_eq!((step.reward, step.done), (STEP_REWARD, false))
                        }
                        Some(other) => panic!("Unexpected destination {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn valid_actions_skip_barriers() {
        let env = GridWorld::canonical();
        assert_eq!(
            env.actions(&(3, 2)),
            vec![Action::Up, Action::Down],
            "Barriers left and right"
        );
        assert_eq!(
            env.actions(&(2, 2)),
            vec![Action::Up, Action::Down, Action::Left, Action::Right]
        );
    }

    #[test]
    fn boxed_in() {
        let layout = Layout::new(3, (0, 0), (2, 2)).with_barriers([(0, 1), (1, 0)]);
        let env = GridWorld::new(layout).unwrap();
        assert!(env.actions(&(0, 0)).is_empty(), "No way out");
    }

    #[test]
    fn layout_validation() {
        assert_eq!(
            GridWorld::new(Layout::new(0, (0, 0), (0, 0))).unwrap_err(),
            ConfigError::EmptyGrid
        );
        assert!(matches!(
            GridWorld::new(Layout::new(3, (0, 0), (3, 0))),
            Err(ConfigError::OutOfBounds { feature: "gem", .. })
        ));
        assert!(matches!(
            GridWorld::new(Layout::new(3, (0, 0), (2, 2)).with_barriers([(2, 2)])),
            Err(ConfigError::Overlap {
                first: "gem",
                second: "barrier",
                ..
            })
        ));
        assert!(matches!(
            GridWorld::new(Layout::new(3, (0, 0), (2, 2)).with_mines([(0, 0)])),
            Err(ConfigError::Overlap {
                first: "start",
                second: "mine",
                ..
            })
        ));
        assert!(matches!(
            GridWorld::new(
                Layout::new(3, (0, 0), (2, 2))
                    .with_mines([(1, 1)])
                    .with_barriers([(1, 1)])
            ),
            Err(ConfigError::Overlap {
                first: "mine",
                second: "barrier",
                ..
            })
        ));
        assert!(Layout::canonical().validate().is_ok());
    }

    #[test]
    fn grid_display() {
        let env = GridWorld::canonical();
        assert_eq!(
            env.grid().to_string(),
            "A....\n.#.#M\n.M...\n.#.#.\n..M.G\n"
        );
    }
}
