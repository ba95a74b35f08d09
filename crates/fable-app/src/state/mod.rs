//! # State Holders
//!
//! The pieces a UI shell binds to: [`Observable`] for pushing values into
//! a render loop, and [`ScreenState`] for reducing a flow's emissions into
//! something directly renderable.

pub mod observable;
pub mod screen;

pub use observable::Observable;
pub use screen::ScreenState;
