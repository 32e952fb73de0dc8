#![recursion_limit = "1024"]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;

pub mod chain;
pub mod config;
pub mod directory;
pub mod errors;
pub mod identity;
pub mod util;

pub use crate::directory::{Classification, ObjectType, OperationCode};
pub use crate::identity::IdentityKeypair;
