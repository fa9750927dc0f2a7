#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod api;
pub mod credentials;
pub mod models;
pub mod settings;
