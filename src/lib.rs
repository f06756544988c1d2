pub mod app;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod note;
pub mod notice;
pub mod search;
pub mod selection;
pub mod storage;
pub mod store;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use note::{Note, NoteId};
pub use selection::SelectionController;
pub use store::{NoteStore, StoreError};
