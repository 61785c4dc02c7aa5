pub mod progress;

pub use progress::{Level, LevelProgress, UserProgress};
