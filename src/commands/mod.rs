pub mod eval;
pub mod judge;

mod judging;
