//! Course room membership.

pub mod index;

pub use index::RoomIndex;
