//! # Travel Sheet
//!
//! A template-merge engine for the domestic travel notification form
//! (国内移動届). It writes applicant values into fixed cells of a
//! pre-formatted template and splices a variable-length itinerary into the
//! rows the template reserves for it, keeping every other cell as it was.
//!
//! ## Features
//!
//! - **Template formats**: headerless CSV (any Windows code page, BOM aware)
//!   and single-sheet Excel workbooks (`.xlsx`, `.xlsm`), read as literal text
//! - **Fixed layout**: header coordinates and the itinerary region are named
//!   constants, validated against the template before anything is written
//! - **Itinerary splice**: any number of legs, padded to the template width,
//!   with the footer carried over unchanged
//! - **Export**: CSV (UTF-8 with BOM by default) or XLSX, with a suggested
//!   file name `<form-name>_<YYYYMMDD>.<ext>`
//! - **Session**: host-owned accumulation of legs between "add" and "generate"
//!
//! ## Example
//!
//! ```no_run
//! use travel_sheet::config::Config;
//! # fn main() -> Result<(), travel_sheet::TravelSheetError> {
//! let config = Config::default();
//! let mut session = config.session();
//! // ... session.set_fields(..), session.add_entry(..)
//! let document = session.generate(
//!     &config.merge_engine()?,
//!     &config.exporter(None),
//!     chrono::Local::now().date_naive(),
//! )?;
//! println!("{} ({} bytes)", document.file_name, document.bytes.len());
//! # Ok(())
//! # }
//! ```
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod helpers;
pub mod merge;
pub mod session;
pub mod spreadsheet;

pub use error::TravelSheetError;
pub use export::Document;
pub use export::ExportFormat;
pub use export::Exporter;
pub use form::FieldRecord;
pub use form::FormLayout;
pub use form::ItineraryRecord;
pub use merge::merge_template;
pub use merge::MergeEngine;
pub use merge::MergeResult;
pub use session::Session;
pub use spreadsheet::Sheet;
pub use spreadsheet::TemplateLoader;
pub use spreadsheet::TemplateSource;
