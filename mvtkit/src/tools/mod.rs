pub mod encode;
pub mod probe;
