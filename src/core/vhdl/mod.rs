pub mod symbols;
pub mod token;
