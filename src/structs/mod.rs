pub mod derived;
pub mod parameters;
pub mod trajectory;
