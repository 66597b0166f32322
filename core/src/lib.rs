pub mod convert;
pub mod db;
pub mod error;
pub mod goal;
pub mod models;
pub mod registry;
pub mod service;

pub use error::{Result, TallyError};
