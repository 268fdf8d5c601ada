/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - Filter and text-overlay parameters (edit.rs)
/// - Zoom/pan transforms for the image panes (viewport.rs)
/// - The persisted output-format preference (prefs.rs)

pub mod data;
pub mod edit;
pub mod prefs;
pub mod viewport;
