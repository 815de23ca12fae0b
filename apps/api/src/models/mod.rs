pub mod class;
pub mod score;
pub mod student;
