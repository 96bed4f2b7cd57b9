pub mod grid_world;

pub use grid_world::{Action, Cell, Grid, GridWorld, Layout, Pos};
