use clap::Parser;
use color_eyre::Result;
use std::sync::Arc;
use visit_tracker::cli::{self, Cli, Commands, CustomerCommand, NoteCommand, VisitCommand};
use visit_tracker::{Config, DocumentStore, Profile, Route, SqliteStore};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev uses separate config and data directories
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = Config::load_with_profile(profile, cli.config.as_deref())?;

    if let Err(e) = visit_tracker::logging::init(&config.get_log_path(), &config.log_level) {
        eprintln!("WARNING: logging disabled: {}", e);
    }
    for problem in config.validate() {
        tracing::warn!(%problem, "configuration problem");
    }

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&config.get_database_path())?);

    match cli.command.unwrap_or(Commands::Tui { open: None }) {
        Commands::Tui { open } => {
            let route = open.as_deref().map(Route::parse).unwrap_or(Route::Home);
            let app = visit_tracker::tui::App::new(config, store, route)?;
            visit_tracker::tui::run_event_loop(app)?;
        }
        Commands::Note(NoteCommand::Show { date }) => cli::handle_note_show(&date, store)?,
        Commands::Note(NoteCommand::Save { date, text }) => cli::handle_note_save(&date, &text, store)?,
        Commands::Upcoming => cli::handle_upcoming(store)?,
        Commands::Customers(CustomerCommand::List) => cli::handle_customers_list(store)?,
        Commands::Customers(CustomerCommand::Add { name }) => cli::handle_customers_add(&name, store)?,
        Commands::Visits { date } => cli::handle_visits(&date, store)?,
        Commands::Visit(VisitCommand::Add {
            date,
            customer,
            purposes,
            buyer,
            sales_options,
            sample_types,
            remarks,
        }) => cli::handle_visit_add(
            &date,
            customer,
            purposes,
            buyer,
            sales_options,
            sample_types,
            remarks,
            &config.buyer_options,
            store,
        )?,
    }

    Ok(())
}
