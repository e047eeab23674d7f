pub mod lifecycle;
pub mod reproduction;

pub use lifecycle::advance_lifecycles;
pub use reproduction::pair_and_breed;
