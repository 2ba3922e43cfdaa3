//! Terminal UI: deck list, study, finished, ranking and difficulty screens.

mod app;
mod theme;
mod widgets;

pub use app::App;
