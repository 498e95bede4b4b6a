pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

pub fn init(default_level: &str) {
    infra::logging::init(default_level);
}
