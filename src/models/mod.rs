pub mod arm;
pub mod azdo;
