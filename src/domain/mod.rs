pub mod derived;
pub mod role;
