pub mod audit;
pub mod fire;
pub mod user;
