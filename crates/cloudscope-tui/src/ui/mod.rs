pub mod components;
pub mod screens;
mod theme;
mod viewport;

pub use theme::Theme;
pub use viewport::{RowHeights, RowLayout, ScrollAlign, Viewport, ViewportRow};
