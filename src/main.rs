use anyhow::Result;
use clap::Parser;

use medley::app::App;
use medley::config::AppConfig;
use medley::logging;
use medley::menu::{Action, MenuEntry, Query};
use medley::theme::Theme;

/// Medley - a launcher-style control menu for your media players
#[derive(Parser, Debug)]
#[command(name = "medley", version, about)]
struct Args {
    /// Filter terms, or arguments for --run (a volume amount, a player id)
    query: Vec<String>,

    /// Execute an action instead of rendering the menu
    #[arg(long, value_enum)]
    run: Option<Action>,

    /// Emit menu entries as JSON lines
    #[arg(long)]
    json: bool,

    /// Icon theme override (defaults to the configured theme)
    #[arg(long, value_enum)]
    theme: Option<Theme>,

    /// Also write logs to a rolling file next to the thumbnail cache
    #[arg(long)]
    log_file: bool,
}

fn main() -> Result<()> {
    human_panic::setup_panic!();

    let args = Args::parse();
    let config = AppConfig::load();

    let log_dir = args.log_file.then(|| config.log_dir());
    logging::init(log_dir.as_deref())?;

    let theme = args.theme.unwrap_or(config.icon_theme);
    let mut app = App::new(&config, theme);

    let raw_query = args.query.join(" ");
    let entries = match args.run {
        Some(action) => app.dispatch(action, &Query::parse(&raw_query))?,
        None => app.render(&raw_query),
    };

    print_entries(&entries, args.json)
}

fn print_entries(entries: &[MenuEntry], json: bool) -> Result<()> {
    for entry in entries {
        if json {
            println!("{}", serde_json::to_string(entry)?);
        } else if entry.description.is_empty() {
            println!("{}", entry.name);
        } else {
            println!("{}\t{}", entry.name, entry.description);
        }
    }
    Ok(())
}
