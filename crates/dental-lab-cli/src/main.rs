//! Dental Lab - command-line front end for the case database.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, invalid form, failed import, etc.)

mod cli;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use cli::{AddArgs, Args, Command, EditArgs, SuggestArgs, UsersCommand};
use dental_lab_core::auth::{authenticate_doctor, authenticate_owner, register_doctor};
use dental_lab_core::config::DEFAULT_CONFIG_FILE;
use dental_lab_core::export::{self, ExportFormat};
use dental_lab_core::models::{CasePatch, CaseSource, NewCase, ToothNumbers, TokenList};
use dental_lab_core::stats::{compute_stats, filter_cases, CaseStats, TallyEntry};
use dental_lab_core::validation::{validate_new_case, validate_patch, ValidationError};
use dental_lab_core::{CaseRecord, CaseStore, Config, Database};
use dental_lab_suggest::{
    build_suggestion_prompt, parse_suggestions, SuggestionInput, VocabularySuggester,
};

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Generate a default .dental-lab.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging was already initialised");
    }
}

fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()));
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

fn database_path(args: &Args, config: &Config) -> PathBuf {
    args.database
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.storage.database_path))
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let db_path = database_path(&args, &config);
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let scope = args.dentist.as_deref();

    match args.command {
        Command::Stats { json } => {
            let stats = compute_stats(&scoped_cases(&db, scope)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", format_stats(&stats));
            }
        }
        Command::List { search } => {
            let cases = scoped_cases(&db, scope)?;
            let shown = filter_cases(&cases, search.as_deref().unwrap_or(""));
            for case in &shown {
                println!("{}", format_case_line(case));
            }
            println!("{} of {} cases", shown.len(), cases.len());
        }
        Command::Add(add) => {
            let case = add_case(&db, &config, add)?;
            println!("Added case {}", case.id);
        }
        Command::Edit(edit) => {
            let case = edit_case(&db, &config, edit)?;
            println!("Updated case {}", case.id);
        }
        Command::Delete { id } => {
            if !db.remove(&id)? {
                bail!("No case with ID {}", id);
            }
            println!("Deleted case {}", id);
        }
        Command::Export { format, output } => {
            let cases = scoped_cases(&db, scope)?;
            let format = ExportFormat::from(format);
            let text = match format {
                ExportFormat::Json => export::to_json(&cases)?,
                ExportFormat::Csv => export::to_csv(&cases)?,
                ExportFormat::Report => export::generate_report(&cases, &config.lab.name),
            };
            if cases.is_empty() {
                warn!("No cases to export");
            }
            match output {
                Some(path) => {
                    std::fs::write(&path, &text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "Exported {} cases as {} to {}",
                        cases.len(),
                        format,
                        path.display()
                    );
                }
                None => println!("{}", text),
            }
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let cases = export::from_json(&text)?;
            db.replace_all(&cases)
                .context("Import failed; existing cases were left unchanged")?;
            println!("Imported {} cases from {}", cases.len(), file.display());
        }
        Command::Users { command } => run_users(&db, command)?,
        Command::Login {
            name,
            owner,
            password,
        } => {
            let session = if owner {
                authenticate_owner(&config.auth, password.expose())
            } else {
                let name = name.unwrap_or_default();
                authenticate_doctor(&db, &name, password.expose())?
            };
            let Some(session) = session else {
                bail!("Invalid name or password");
            };
            let visible = db.list_for_session(&session)?;
            println!(
                "Signed in as {} ({}); {} cases visible",
                session.user_name,
                session.role,
                visible.len()
            );
        }
        Command::Suggest(suggest) => run_suggest(&db, suggest)?,
        Command::InitConfig => handle_init_config()?,
    }

    Ok(())
}

fn scoped_cases(db: &Database, dentist: Option<&str>) -> Result<Vec<CaseRecord>> {
    let cases = match dentist {
        Some(name) => db.list_by_dentist(name)?,
        None => db.list_all()?,
    };
    Ok(cases)
}

fn add_case(db: &Database, config: &Config, add: AddArgs) -> Result<CaseRecord> {
    let new_case = NewCase {
        patient_name: add.patient.trim().to_string(),
        dentist_name: add.dentist_name.trim().to_string(),
        tooth_numbers: ToothNumbers::parse(&add.teeth),
        prosthesis_types: TokenList::parse(&add.prosthesis),
        materials: TokenList::parse(&add.material),
        shade: add.shade.trim().to_string(),
        notes: add.notes,
        photo_data_uri: add.photo_uri,
        source: Some(CaseSource::Desktop),
    };

    if let Err(e) = validate_new_case(&new_case, config.entry.max_photo_bytes) {
        return Err(report_invalid(e));
    }

    Ok(db.add(new_case)?)
}

fn edit_case(db: &Database, config: &Config, edit: EditArgs) -> Result<CaseRecord> {
    let patch = CasePatch {
        patient_name: edit.patient.map(|v| v.trim().to_string()),
        dentist_name: edit.dentist_name.map(|v| v.trim().to_string()),
        tooth_numbers: edit.teeth.as_deref().map(ToothNumbers::parse),
        prosthesis_types: edit.prosthesis.as_deref().map(TokenList::parse),
        materials: edit.material.as_deref().map(TokenList::parse),
        shade: edit.shade.map(|v| v.trim().to_string()),
        notes: edit.notes,
        photo_data_uri: edit.photo_uri,
        source: None,
    };

    if patch.is_empty() {
        bail!("Nothing to change; pass at least one field to edit");
    }
    if let Err(e) = validate_patch(&patch, config.entry.max_photo_bytes) {
        return Err(report_invalid(e));
    }

    db.update(&edit.id, &patch)
        .with_context(|| format!("Failed to update case {}", edit.id))
}

fn report_invalid(e: ValidationError) -> anyhow::Error {
    for failure in &e.failures {
        eprintln!("  {}", failure);
    }
    anyhow::anyhow!("Case not saved: {} field(s) invalid", e.failures.len())
}

fn run_users(db: &Database, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::Add { name, password } => {
            let account = register_doctor(db, &name, password.expose())?;
            println!("Registered {}", account.name);
        }
        UsersCommand::List => {
            let users = db.list_users()?;
            for user in &users {
                println!("{}  {}  since {}", user.id, user.name, user.created_at.format("%Y-%m-%d"));
            }
            println!("{} doctors", users.len());
        }
        UsersCommand::Delete { name } => {
            let Some(user) = db.get_user_by_name(&name)? else {
                bail!("No doctor named {}", name);
            };
            db.delete_user(&user.id)?;
            println!("Deleted {}", user.name);
        }
    }
    Ok(())
}

fn run_suggest(db: &Database, args: SuggestArgs) -> Result<()> {
    let input = SuggestionInput {
        field_description: args.field,
        existing_data: args.existing,
        contextual_information: args.context,
    };

    if args.prompt {
        print!("{}", build_suggestion_prompt(&input, true));
        return Ok(());
    }

    let output = match args.reply {
        Some(path) => {
            let reply = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_suggestions(&reply)?
        }
        None => {
            let dentists: BTreeSet<String> =
                db.list_all()?.into_iter().map(|c| c.dentist_name).collect();
            VocabularySuggester::new()
                .with_dentists(dentists)
                .suggest(&input)
        }
    };

    for suggestion in &output.suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}

fn format_case_line(case: &CaseRecord) -> String {
    format!(
        "{}  {}  {}  {}  teeth [{}]  {} / {}  shade {}",
        case.created_at
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string()),
        case.id,
        case.patient_name,
        case.dentist_name,
        case.tooth_numbers,
        case.prosthesis_types,
        case.materials,
        case.shade
    )
}

fn format_stats(stats: &CaseStats) -> String {
    if stats.is_empty() {
        return "No cases yet.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("Total cases: {}\n", stats.total_cases));
    out.push_str(&format!("Total teeth: {}\n", stats.total_teeth));
    out.push_str(&format!(
        "Material selections: {}\n",
        stats.total_material_selections
    ));
    push_section(&mut out, "Cases by dentist", &stats.cases_by_dentist);
    push_section(&mut out, "Material usage", &stats.material_usage);
    push_section(&mut out, "Teeth by material", &stats.teeth_by_material);
    push_section(&mut out, "Prosthesis types", &stats.prosthesis_usage);
    out
}

fn push_section(out: &mut String, title: &str, entries: &[TallyEntry]) {
    out.push_str(&format!("\n{}:\n", title));
    for entry in entries {
        out.push_str(&format!("  {:<24} {}\n", entry.name, entry.count));
    }
}
