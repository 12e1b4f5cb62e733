pub mod app;
pub mod inspect;
pub mod install;
