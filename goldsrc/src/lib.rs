pub mod binaries;
pub mod config;
pub mod error;
pub mod map;
pub mod prelude;
pub mod session;
pub mod wad;
