pub mod cli;
pub mod config;
pub mod customers;
pub mod dates;
pub mod logging;
pub mod models;
pub mod notes;
pub mod reminders;
pub mod route;
pub mod store;
pub mod tui;
pub mod utils;
pub mod visit_form;
pub mod visits;

pub use config::Config;
pub use models::{Customer, Note, VisitEntry};
pub use route::Route;
pub use store::{DocumentStore, SqliteStore};
pub use utils::Profile;
