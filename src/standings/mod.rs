//! Derived standings: folding completed events into house and player
//! leaderboards.

pub mod aggregate;

pub use aggregate::{aggregate, category_standings, HouseScore, PlayerScore, Standings};
