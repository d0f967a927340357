use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::palette::{is_toggle_chord, shortcut_label, PaletteEntry};
use crate::query::CompletionFilter;
use crate::session::{Clipboard, Prompter, TrackerSession};
use crate::{
  champion_rows, create_set, default_catalog_source, delete_set, export_set, get_catalog_status,
  import_set, list_champions, list_sets, open_session, refresh_catalog, toggle_champion, AppState,
  ChampionDto, ListChampionsInput,
};

/// Track champion completion across named sets.
#[derive(Debug, Parser)]
#[command(name = "champion-tracker", version, arg_required_else_help = true)]
pub struct Cli {
  /// Directory holding the database and config.toml.
  #[arg(long, global = true, value_name = "DIR")]
  data_dir: Option<PathBuf>,
  /// Override config file path.
  #[arg(long, global = true, value_name = "PATH")]
  config: Option<PathBuf>,
  /// Catalog locale, e.g. en_US.
  #[arg(long, global = true)]
  locale: Option<String>,
  /// Skip the catalog fetch.
  #[arg(long, global = true)]
  offline: bool,
  /// Print JSON instead of text.
  #[arg(long, global = true)]
  json: bool,
  #[arg(short, long, global = true)]
  verbose: bool,
  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// List sets with their progress.
  Sets,
  /// Create a set, emptying any set with the same name.
  Create { name: String },
  /// Delete a set.
  Delete {
    name: String,
    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
  },
  /// Mark a champion complete, or incomplete if it already is.
  Toggle {
    #[arg(long, short)]
    set: String,
    champion_id: String,
  },
  /// List champions.
  List {
    #[arg(long, short)]
    set: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long, default_value_t = CompletionFilter::All)]
    filter: CompletionFilter,
  },
  /// Copy a set's champion ids as JSON.
  Export {
    #[arg(long, short)]
    set: String,
    /// Write to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
  },
  /// Replace a set's champion ids with pasted JSON.
  Import {
    #[arg(long, short)]
    set: String,
    /// Read the JSON from a file instead of stdin.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
  },
  #[command(subcommand)]
  Catalog(CatalogCommand),
  /// Interactive session.
  Shell,
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
  /// Show the loaded catalog and the last recorded fetch.
  Status,
  /// Fetch the latest catalog.
  Refresh,
}

struct OutputClipboard {
  out: Option<PathBuf>,
}

impl Clipboard for OutputClipboard {
  fn write_text(&self, text: &str) -> Result<(), String> {
    match &self.out {
      Some(path) => fs::write(path, text).map_err(|e| format!("{}: {}", path.display(), e)),
      None => {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text).map_err(|e| e.to_string())
      }
    }
  }
}

struct StdinPrompter {
  assume_yes: bool,
  preset: Option<String>,
}

impl StdinPrompter {
  fn interactive() -> Self {
    Self {
      assume_yes: false,
      preset: None,
    }
  }
}

impl Prompter for StdinPrompter {
  /// Reads lines until a blank line or end of input.
  fn prompt(&self, message: &str) -> Option<String> {
    if let Some(preset) = &self.preset {
      return Some(preset.clone());
    }
    eprintln!("{} (finish with an empty line)", message);
    let mut collected = String::new();
    loop {
      let mut line = String::new();
      match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => break,
        Ok(_) if line.trim().is_empty() => break,
        Ok(_) => collected.push_str(&line),
      }
    }
    (!collected.is_empty()).then_some(collected)
  }

  fn confirm(&self, message: &str) -> bool {
    if self.assume_yes {
      return true;
    }
    eprint!("{} [y/N] ", message);
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
      return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
  }
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "info" } else { "warn" };
  let _ = tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr),
    )
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .try_init();
}

fn open_default(state: &AppState) -> Result<TrackerSession, String> {
  open_session(
    state,
    Box::new(OutputClipboard { out: None }),
    Box::new(StdinPrompter::interactive()),
  )
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
  let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
  println!("{}", text);
  Ok(())
}

fn fetch_catalog(state: &AppState, session: &mut TrackerSession) {
  let result =
    default_catalog_source(state).and_then(|source| refresh_catalog(state, session, &source));
  if let Err(error) = result {
    eprintln!("warning: {} (run `catalog refresh` to retry)", error);
  }
}

fn print_sets(session: &TrackerSession, json: bool) -> Result<(), String> {
  let sets = list_sets(session);
  if json {
    return print_json(&sets);
  }
  if sets.is_empty() {
    println!("No sets yet. Create one with `create <name>`.");
  }
  for set in sets {
    let marker = if session.current_set() == Some(set.name.as_str()) {
      "*"
    } else {
      " "
    };
    println!(
      "{} {}  {} / {} champions  {:.0}%",
      marker, set.name, set.completed_count, set.total, set.completion_rate
    );
  }
  Ok(())
}

fn print_champions(rows: Vec<ChampionDto>, json: bool) -> Result<(), String> {
  if json {
    return print_json(&rows);
  }
  for row in rows {
    let mark = if row.completed { "x" } else { " " };
    println!("[{}] {:<16} {:<16} {}", mark, row.id, row.name, row.title);
  }
  Ok(())
}

fn execute(cli: Cli) -> Result<(), String> {
  let mut config =
    Config::load(cli.data_dir.as_deref(), cli.config.as_deref()).map_err(|e| e.to_string())?;
  if let Some(locale) = cli.locale {
    config.catalog.locale = locale;
    config.validate().map_err(|e| e.to_string())?;
  }
  let state = AppState::new(config);
  let json = cli.json;

  match cli.command {
    Command::Sets => {
      let mut session = open_default(&state)?;
      if !cli.offline {
        fetch_catalog(&state, &mut session);
      }
      print_sets(&session, json)
    }
    Command::Create { name } => {
      let mut session = open_default(&state)?;
      let created = create_set(&mut session, &name)?;
      println!("Created set \"{}\".", created);
      Ok(())
    }
    Command::Delete { name, yes } => {
      let prompter = StdinPrompter {
        assume_yes: yes,
        preset: None,
      };
      let mut session = open_session(
        &state,
        Box::new(OutputClipboard { out: None }),
        Box::new(prompter),
      )?;
      if delete_set(&mut session, &name)? {
        println!("Deleted set \"{}\".", name);
      } else {
        println!("Kept set \"{}\".", name);
      }
      Ok(())
    }
    Command::Toggle { set, champion_id } => {
      let mut session = open_default(&state)?;
      let completed = toggle_champion(&mut session, &set, &champion_id)?;
      let label = if completed { "complete" } else { "incomplete" };
      println!("{} is now {} in \"{}\".", champion_id, label, set);
      Ok(())
    }
    Command::List { set, search, filter } => {
      let mut session = open_default(&state)?;
      if !cli.offline {
        fetch_catalog(&state, &mut session);
      }
      let rows = list_champions(
        &mut session,
        ListChampionsInput {
          set_name: set,
          search,
          filter,
        },
      )?;
      print_champions(rows, json)
    }
    Command::Export { set, out } => {
      let to_file = out.is_some();
      let mut session = open_session(
        &state,
        Box::new(OutputClipboard { out }),
        Box::new(StdinPrompter::interactive()),
      )?;
      export_set(&mut session, &set)?;
      if to_file {
        eprintln!("Set copied to clipboard!");
      }
      Ok(())
    }
    Command::Import { set, file } => {
      let preset = match file {
        Some(path) => {
          Some(fs::read_to_string(&path).map_err(|e| format!("{}: {}", path.display(), e))?)
        }
        None => None,
      };
      let prompter = StdinPrompter {
        assume_yes: false,
        preset,
      };
      let mut session = open_session(
        &state,
        Box::new(OutputClipboard { out: None }),
        Box::new(prompter),
      )?;
      match import_set(&mut session, &set)? {
        Some(count) => println!("Set imported successfully! ({} champions)", count),
        None => println!("Nothing to import."),
      }
      Ok(())
    }
    Command::Catalog(CatalogCommand::Status) => {
      let session = open_default(&state)?;
      let status = get_catalog_status(&state, &session)?;
      if json {
        return print_json(&status);
      }
      match status.last_fetch {
        Some(fetch) => println!(
          "Last fetch: version {} ({}), {} champions at {}, hash {}",
          fetch.version, fetch.locale, fetch.item_count, fetch.fetched_at, fetch.state_hash
        ),
        None => println!("The catalog has never been fetched."),
      }
      Ok(())
    }
    Command::Catalog(CatalogCommand::Refresh) => {
      let mut session = open_default(&state)?;
      let source = default_catalog_source(&state)?;
      let count = refresh_catalog(&state, &mut session, &source)?;
      println!("Fetched {} champions for version {}.", count, session.catalog().version);
      Ok(())
    }
    Command::Shell => {
      let mut session = open_default(&state)?;
      if !cli.offline {
        fetch_catalog(&state, &mut session);
      }
      run_shell(&state, &mut session, json)
    }
  }
}

const SHELL_HELP: &str = "\
commands:
  sets                 list sets
  create <name>        create a set and select it
  delete <name>        delete a set
  use <name>           select a set
  toggle <id>          toggle a champion in the selected set
  search [text]        set or clear the search text
  filter <mode>        all | incomplete | complete
  list                 show visible champions
  export               copy the selected set
  import               paste JSON into the selected set
  palette [query]      toggle the command palette (or type ctrl+k / cmd+k)
  pick <n>             choose a palette entry
  refresh              fetch the catalog again
  quit";

fn run_shell(state: &AppState, session: &mut TrackerSession, json: bool) -> Result<(), String> {
  println!(
    "champion-tracker shell. `help` lists commands, `palette` or `{}` opens the palette.",
    shortcut_label(cfg!(target_os = "macos"))
  );
  let mut palette: Vec<PaletteEntry> = Vec::new();

  loop {
    print!("{}> ", session.current_set().unwrap_or(""));
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
      Ok(0) => return Ok(()),
      Ok(_) => {}
      Err(e) => return Err(e.to_string()),
    }
    let line = line.trim();
    let (command, argument) = if is_toggle_chord(line) {
      ("palette", "")
    } else {
      match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
      }
    };

    let result = match command {
      "" => Ok(()),
      "help" => {
        println!("{}", SHELL_HELP);
        Ok(())
      }
      "quit" | "exit" => return Ok(()),
      "sets" => print_sets(session, json),
      "create" => session
        .create_set(argument)
        .map_err(|e| e.to_string())
        .map(|created| match created {
          Some(name) => println!("Created set \"{}\".", name),
          None => println!("Set name is required."),
        }),
      "delete" => session.delete_set(argument).map(|_| ()).map_err(|e| e.to_string()),
      "use" => session.select_set(argument).map_err(|e| e.to_string()),
      "toggle" => match session.toggle(argument) {
        Ok(Some(completed)) => {
          println!("{} {}", argument, if completed { "complete" } else { "incomplete" });
          Ok(())
        }
        Ok(None) => Err("Select a set first.".to_string()),
        Err(e) => Err(e.to_string()),
      },
      "search" => {
        session.set_search(argument);
        Ok(())
      }
      "filter" => argument
        .parse::<CompletionFilter>()
        .map(|mode| session.set_filter(mode)),
      "list" => print_champions(champion_rows(session, session.visible_items()), json),
      "export" => session
        .export_current()
        .map(|_| println!("Set copied to clipboard!"))
        .map_err(|e| e.to_string()),
      "import" => match session.import_current() {
        Ok(Some(count)) => {
          println!("Set imported successfully! ({} champions)", count);
          Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e.to_string()),
      },
      "palette" => {
        if session.toggle_palette() {
          palette = session.palette_entries(argument);
          for (index, entry) in palette.iter().enumerate() {
            println!("{:>3}. {}", index + 1, entry.label());
          }
        } else {
          palette.clear();
        }
        Ok(())
      }
      "pick" => match argument
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| palette.get(index))
      {
        Some(entry) if session.selection().palette_open => {
          let entry = entry.clone();
          palette.clear();
          session.select_palette_entry(&entry).map_err(|e| e.to_string())
        }
        _ => Err("Open the palette and pick a listed number.".to_string()),
      },
      "refresh" => default_catalog_source(state)
        .and_then(|source| refresh_catalog(state, session, &source))
        .map(|count| println!("Fetched {} champions.", count)),
      other => Err(format!("Unknown command '{}'. Type `help`.", other)),
    };

    if let Err(error) = result {
      eprintln!("error: {}", error);
    }
  }
}

pub fn run() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);
  match execute(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      eprintln!("error: {}", error);
      ExitCode::FAILURE
    }
  }
}
