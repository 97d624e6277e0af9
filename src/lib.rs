// Library root
// -----------
// This crate exposes the migration pipeline as a library. The binary
// (`main.rs`) only loads configuration, sets up logging and calls
// `pipeline::run`.
//
// Module responsibilities:
// - `api`: HTTP interactions with the document service (login, projects,
//   documents, transfers).
// - `config`: the explicit run configuration and where it is loaded from.
// - `batch`: bounded concurrent execution of per-document requests.
// - `migration`: the individual stages built on `api` and `batch`.
// - `pipeline`: the end-to-end run.
// - `ui`: terminal progress bars.
pub mod api;
pub mod batch;
pub mod config;
pub mod migration;
pub mod pipeline;
pub mod ui;
