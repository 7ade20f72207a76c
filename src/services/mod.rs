pub mod assets;
pub mod session;
