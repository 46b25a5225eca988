//! FIRST/FOLLOW analysis and canonical LR(1) automaton construction.

pub mod closure;
pub mod dfa;
pub mod first_follow;
pub mod grammar;
pub mod item;
pub mod syntax;
pub mod types;
pub mod util;
