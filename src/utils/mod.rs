pub mod date_window;
pub mod timestamp;
