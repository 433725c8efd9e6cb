pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod gate;
pub mod memory;
pub mod provider;
pub mod session;
pub mod translate;
pub mod ui;
