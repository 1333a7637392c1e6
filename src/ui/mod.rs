pub mod format;
pub mod slider;
pub mod ui;
