pub mod ast;
pub mod criteria;
pub mod compiler;
pub mod sort;
pub mod projection;
pub mod planner;
pub mod types;
