//! Basic board-game types

mod color;
mod kind;
mod seat;

pub use color::Color;
pub use kind::PieceKind;
pub use seat::Seat;
