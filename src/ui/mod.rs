/// UI widgets that need more than the stock iced building blocks
///
/// Currently just the zoomable/pannable image pane (viewer.rs); the
/// rest of the interface is composed from standard widgets in main.rs.

pub mod viewer;
