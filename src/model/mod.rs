// File: ./src/model/mod.rs
pub mod display;
pub mod item;
pub mod table;

pub use display::{DateZone, DisplayRow, PriorityColumn, RowOptions, map_rows};
pub use item::{CreatedTask, NewTask, Space, Task, TaskList, Team, User};
pub use table::render_table;
