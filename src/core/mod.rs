pub mod deck;
pub mod knowledge;
pub mod phase;
pub mod session;
