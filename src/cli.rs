use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::customers::CustomerDirectory;
use crate::dates::{self, format_long, format_reminder, start_of_today};
use crate::models::{Purpose, RemarkKey, SalesOption, SampleType};
use crate::notes::{NoteError, NoteStore, SaveOutcome};
use crate::store::{DocumentStore, StoreError};
use crate::visit_form::{FormError, FormField, VisitForm};
use crate::visits::{self, VisitError, VisitLog};

#[derive(Parser)]
#[command(name = "visit-tracker")]
#[command(about = "Daily notes and customer visit records in the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui {
        /// Initial route: "/" or "/YYYY-MM-DD"
        #[arg(long)]
        open: Option<String>,
    },
    /// Read or write the note of a day
    #[command(subcommand)]
    Note(NoteCommand),
    /// List notes from today onward
    Upcoming,
    /// Manage the customer directory
    #[command(subcommand)]
    Customers(CustomerCommand),
    /// List visit entries of a day
    Visits {
        /// Day (YYYY-MM-DD)
        date: String,
    },
    /// Record visits
    #[command(subcommand)]
    Visit(VisitCommand),
}

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Print the note of a day
    Show {
        /// Day (YYYY-MM-DD)
        date: String,
    },
    /// Create or update the note of a day
    Save {
        /// Day (YYYY-MM-DD)
        date: String,
        /// Note text
        text: String,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommand {
    /// Print all customer names
    List,
    /// Add a customer name
    Add { name: String },
}

#[derive(Subcommand)]
pub enum VisitCommand {
    /// Record a visit, with the same rules as the entry form
    Add {
        /// Day (YYYY-MM-DD)
        date: String,
        #[arg(long)]
        customer: String,
        /// Sales or Admin (repeatable)
        #[arg(long = "purpose")]
        purposes: Vec<Purpose>,
        #[arg(long)]
        buyer: Option<String>,
        /// regular, new-inquiry, sample-collection, sample-submission (repeatable)
        #[arg(long = "sales")]
        sales_options: Vec<SalesOption>,
        /// fabric or interline (repeatable)
        #[arg(long = "sample")]
        sample_types: Vec<SampleType>,
        /// Remark as key=text, e.g. payment="paid in full" (repeatable)
        #[arg(long = "remark", value_parser = parse_remark)]
        remarks: Vec<(RemarkKey, String)>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Note error: {0}")]
    NoteError(#[from] NoteError),
    #[error("Visit error: {0}")]
    VisitError(#[from] VisitError),
    #[error("{0}")]
    FormError(#[from] FormError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Remark '{0}' does not apply to the chosen options")]
    HiddenRemark(String),
    #[error("Unknown buyer '{0}'")]
    UnknownBuyer(String),
}

fn parse_remark(s: &str) -> Result<(RemarkKey, String), String> {
    let (key, text) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=text, got '{}'", s))?;
    Ok((key.parse()?, text.to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDate, CliError> {
    dates::parse_day(s).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", s, e)))
}

/// Handle `note show`
pub fn handle_note_show(date: &str, store: Arc<dyn DocumentStore>) -> Result<(), CliError> {
    let date = parse_date(date)?;
    let mut notes = NoteStore::new(store);
    match notes.load_for_day(date)? {
        Some(text) => println!("{}", text),
        None => println!("No note for {}", format_long(date)),
    }
    Ok(())
}

/// Handle `note save`. The day is looked up first so an existing note is
/// updated rather than duplicated.
pub fn handle_note_save(date: &str, text: &str, store: Arc<dyn DocumentStore>) -> Result<(), CliError> {
    let date = parse_date(date)?;
    let mut notes = NoteStore::new(store);
    notes.load_for_day(date)?;
    match notes.save_for_day(date, text, Local::now())? {
        SaveOutcome::Created(id) => println!("Note created (ID: {})", id),
        SaveOutcome::Updated(id) => println!("Note updated (ID: {})", id),
        SaveOutcome::Skipped => println!("Nothing to save: note text is empty"),
    }
    Ok(())
}

/// Handle `upcoming`
pub fn handle_upcoming(store: Arc<dyn DocumentStore>) -> Result<(), CliError> {
    let notes = NoteStore::new(store).upcoming(start_of_today())?;
    if notes.is_empty() {
        println!("No upcoming notes found.");
    }
    for note in notes {
        println!("{}\n  {}", format_reminder(note.created_at), note.note);
    }
    Ok(())
}

/// Handle `customers list`
pub fn handle_customers_list(store: Arc<dyn DocumentStore>) -> Result<(), CliError> {
    for name in CustomerDirectory::new(store).names()? {
        println!("{}", name);
    }
    Ok(())
}

/// Handle `customers add`
pub fn handle_customers_add(name: &str, store: Arc<dyn DocumentStore>) -> Result<(), CliError> {
    let directory = CustomerDirectory::new(store);
    let known = directory.names()?;
    if directory.add_if_missing(name, &known)? {
        println!("Customer added: {}", name.trim());
    } else {
        println!("Customer already known or empty: '{}'", name.trim());
    }
    Ok(())
}

/// Handle `visits`
pub fn handle_visits(date: &str, store: Arc<dyn DocumentStore>) -> Result<(), CliError> {
    let date = parse_date(date)?;
    let entries = VisitLog::new(store).for_day(date)?;
    println!("Date: {}", format_long(date));
    if entries.is_empty() {
        println!("No visits recorded.");
    }
    for entry in &entries {
        println!();
        for (label, value) in visits::summary_rows(entry) {
            println!("{}: {}", label, value);
        }
    }
    Ok(())
}

/// Handle `visit add`
#[allow(clippy::too_many_arguments)]
pub fn handle_visit_add(
    date: &str,
    customer: String,
    purposes: Vec<Purpose>,
    buyer: Option<String>,
    sales_options: Vec<SalesOption>,
    sample_types: Vec<SampleType>,
    remarks: Vec<(RemarkKey, String)>,
    buyer_options: &[String],
    store: Arc<dyn DocumentStore>,
) -> Result<(), CliError> {
    let date = parse_date(date)?;
    let mut form = VisitForm::new(date);
    form.customer_name = customer;
    for purpose in purposes {
        if !form.has_purpose(purpose) {
            form.toggle_purpose(purpose);
        }
    }
    for option in sales_options {
        if !form.has_sales_option(option) {
            form.toggle_sales_option(option);
        }
    }
    for sample in sample_types {
        if !form.has_sample_type(sample) {
            form.toggle_sample_type(sample);
        }
    }
    if let Some(buyer) = buyer {
        if !buyer_options.contains(&buyer) {
            return Err(CliError::UnknownBuyer(buyer));
        }
        form.buyer = Some(buyer);
    }
    for (key, text) in remarks {
        if !form.is_visible(FormField::Remark(key)) {
            return Err(CliError::HiddenRemark(key.label().to_string()));
        }
        form.set_remark(key, text);
    }

    let log = VisitLog::new(store.clone());
    let entry = form.submit(&log)?;

    // The visit is stored; a directory failure only costs the autocomplete entry
    let directory = CustomerDirectory::new(store);
    if let Err(e) = directory
        .names()
        .and_then(|known| directory.add_if_missing(&entry.customer_name, &known))
    {
        tracing::warn!(error = %e, customer = %entry.customer_name, "failed to add customer to directory");
    }

    println!("Visit recorded for {} on {}", entry.customer_name, format_long(date));
    Ok(())
}
