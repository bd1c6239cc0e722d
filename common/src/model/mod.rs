pub mod annotated;
pub mod column;
pub mod row;
pub mod trigger;
