pub use board::*;
pub use errors::*;
pub use game::*;
pub use goal::*;
pub use player::*;
pub use protocol::*;
pub use shelf::*;
pub use tile::*;
pub use turn::*;

#[cfg(test)]
mod arbitrary;
mod board;
mod errors;
mod game;
mod goal;
mod player;
mod protocol;
mod shelf;
mod tile;
mod turn;
