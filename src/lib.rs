pub mod commands;
pub mod mods;
pub mod runtime;
pub mod server;
