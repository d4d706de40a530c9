//! CLI command definitions and trip files
use crate::export::ExportFormat;
use crate::form::FieldRecord;
use crate::form::ItineraryRecord;
use crate::session::Session;
use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Fills the domestic travel notification form (国内移動届) from a trip file
#[derive(Parser, Debug)]
#[command(name = "travel-sheet", version)]
pub struct Cli {
    /// Path to config file (default: ./travel-sheet.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter, e.g. "debug" or "travel_sheet=trace"
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a completed form from a trip file
    Generate {
        /// YAML trip file with `fields`, `itinerary` and optional `swap`
        trip: PathBuf,

        /// Directory the document is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Output format, overrides the configuration
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// Generation date (YYYY-MM-DD), today when absent
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// List available templates
    Templates,

    /// Check that a template fits the form layout
    Check {
        /// Template identifier, the configured template when absent
        template: Option<String>,
    },
}

/// Everything the user entered for one document
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripFile {
    pub fields: FieldRecord,
    pub itinerary: Vec<ItineraryRecord>,
    /// Positions of legs whose departure and arrival are swapped before adding
    pub swap: Vec<usize>,
}

impl TripFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trip file {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse trip file {}", path.display()))
    }

    /// Replays the trip into a session the way a user would enter it:
    /// fields first, then each leg through the draft.
    pub fn apply(&self, session: &mut Session) -> Result<()> {
        if let Some(index) = self.swap.iter().find(|&&index| index >= self.itinerary.len()) {
            anyhow::bail!("swap refers to leg {} but the trip has {} legs", index, self.itinerary.len());
        }
        session.set_fields(self.fields.clone())?;
        for (index, record) in self.itinerary.iter().enumerate() {
            *session.draft_mut() = record.clone();
            if self.swap.contains(&index) {
                session.swap_draft_endpoints();
            }
            session.add_draft();
        }
        Ok(())
    }
}
