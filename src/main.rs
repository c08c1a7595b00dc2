use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};

use setlog::config::AppConfig;
use setlog::export::{suggested_file_name, ExportManager, FileSink, StdoutSink};
use setlog::history::{activity_matrix, recent_logs, ACTIVITY_DAYS, MAX_ACTIVITY_DAYS};
use setlog::logging::init_logging;
use setlog::{
    group_exercises, CatalogStore, Equipment, ExerciseEdit, ExerciseGroup, ExerciseType, SetLogError, SetUpdate,
    SqliteCatalog, TargetOverride, Template, VolumePolicy, WorkoutSession,
};

/// SetLog - Workout logging CLI
///
/// Manage exercises and templates, record sessions, and export finished
/// workouts as Markdown notes with YAML frontmatter.
#[derive(Parser)]
#[command(name = "setlog")]
#[command(version)]
#[command(about = "Workout logging with Markdown export", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the catalog database path
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the exercise catalog
    Exercises {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Manage workout templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Record, browse and export finished workouts
    Logs {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Show or change export settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum ExerciseAction {
    /// List catalog exercises
    List {
        /// Only show one muscle group
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add an exercise
    Add {
        name: String,
        /// Muscle group (uppercased)
        #[arg(short, long, default_value = "GENERAL")]
        category: String,
        /// weighted or bodyweight
        #[arg(short = 't', long = "type", default_value = "weighted")]
        exercise_type: String,
        /// Comma-separated equipment (BAR, DUMBBELL, CABLE, BAND, MACHINE)
        #[arg(short, long, value_delimiter = ',')]
        equipment: Vec<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Edit an exercise; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// weighted or bodyweight
        #[arg(short = 't', long = "type")]
        exercise_type: Option<String>,
        /// Comma-separated equipment; replaces the current list
        #[arg(short, long, value_delimiter = ',')]
        equipment: Option<Vec<String>>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete an exercise by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List templates
    List,
    /// Import templates from a JSON file (one template or an array)
    Import { file: PathBuf },
    /// Delete a template by id
    Delete { id: String },
    /// Show a template's exercises grouped into supersets
    Preview { id: String },
}

#[derive(Subcommand)]
enum LogAction {
    /// List recent workouts
    List {
        /// Number of workouts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Log a template as performed: planned sets are recorded as completed
    Record {
        /// Template id; omit for an empty session
        #[arg(short, long)]
        template: Option<String>,
        /// Session length in minutes
        #[arg(short, long, default_value = "60")]
        minutes: u32,
        /// Set targets as INDEX:SETSxREPS, e.g. 0:3x10
        #[arg(long = "target", value_name = "TARGET")]
        targets: Vec<String>,
    },
    /// Delete a workout by id
    Delete { id: String },
    /// Export a workout as a Markdown note
    Export {
        id: String,
        /// Output directory (defaults to the configured notes directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the note instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Show the consistency matrix
    Activity {
        /// Number of days to show
        #[arg(short, long, default_value_t = ACTIVITY_DAYS, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ACTIVITY_DAYS)))]
        days: u32,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Set the body weight used for bodyweight volume, or "clear"
    Bodyweight { value: String },
    /// Replace the note tags
    Tags { tags: Vec<String> },
    /// Rename a frontmatter key: date, type, duration or tags
    Map { field: String, key: String },
    /// Minutes east of UTC used for note timestamps
    Offset {
        #[arg(allow_hyphen_values = true)]
        minutes: i32,
    },
    /// Count all sets or only completed ones toward volume
    Volume {
        #[arg(value_parser = ["all", "completed"])]
        policy: String,
    },
}

#[derive(Tabled)]
struct ExerciseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    exercise_type: String,
    #[tabled(rename = "Equipment")]
    equipment: String,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    workout_type: String,
    #[tabled(rename = "Exercises")]
    exercises: usize,
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Workout")]
    name: String,
    #[tabled(rename = "Minutes")]
    minutes: u32,
    #[tabled(rename = "Sets")]
    sets: usize,
    #[tabled(rename = "Volume")]
    volume: String,
}

fn main() {
    if let Err(err) = run() {
        let message = match err.downcast_ref::<SetLogError>() {
            Some(setlog_err) => setlog_err.user_message(),
            None => format!("{:#}", err),
        };
        eprintln!("{} {}", "✗".red().bold(), message.red());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default_from(cli.config.as_deref());
    config.logging.level = config.logging.level.raised_by(cli.verbose);
    init_logging(&config.logging)?;

    let db_path = cli.database.unwrap_or_else(|| config.storage.database_path.clone());
    let mut store = SqliteCatalog::open(&db_path)
        .map_err(SetLogError::from)
        .with_context(|| format!("Failed to open catalog at {}", db_path.display()))?;

    match cli.command {
        Commands::Exercises { action } => handle_exercises(&mut store, action),
        Commands::Templates { action } => handle_templates(&mut store, action),
        Commands::Logs { action } => handle_logs(store, &config, action),
        Commands::Settings { action } => handle_settings(&mut store, action),
    }
}

fn handle_exercises(store: &mut SqliteCatalog, action: ExerciseAction) -> Result<()> {
    match action {
        ExerciseAction::List { category } => {
            let filter = category.map(|c| c.to_uppercase());
            let mut exercises = store.get_exercises()?;
            exercises.retain(|e| filter.as_ref().map_or(true, |c| &e.category == c));
            exercises.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));

            if exercises.is_empty() {
                println!("{}", "No exercises found".yellow());
                return Ok(());
            }

            let rows: Vec<ExerciseRow> = exercises
                .iter()
                .map(|e| ExerciseRow {
                    id: e.id.clone(),
                    name: e.name.clone(),
                    category: e.category.clone(),
                    exercise_type: e.exercise_type.to_string(),
                    equipment: e.equipment_options.iter().map(|eq| eq.to_string()).collect::<Vec<_>>().join(", "),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        ExerciseAction::Add { name, category, exercise_type, equipment, notes } => {
            if name.trim().is_empty() {
                bail!(SetLogError::Validation("Exercise name must not be empty".to_string()));
            }
            let exercise_type = ExerciseType::from_str(&exercise_type).map_err(SetLogError::Validation)?;
            let equipment = parse_equipment(&equipment)?;

            let mut exercise = store.add_exercise(&name, &category, exercise_type, &equipment)?;
            if let Some(notes) = notes {
                exercise = exercise.with_notes(notes);
                store.save_exercise(&exercise)?;
            }

            println!("{} Added {} ({})", "✓".green(), exercise.name.bold(), exercise.category);
            println!("  ID: {}", exercise.id.dimmed());
        }

        ExerciseAction::Edit { id, name, category, exercise_type, equipment, notes } => {
            if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                bail!(SetLogError::Validation("Exercise name must not be empty".to_string()));
            }
            let edit = ExerciseEdit {
                name,
                category,
                notes,
                exercise_type: exercise_type
                    .map(|t| ExerciseType::from_str(&t))
                    .transpose()
                    .map_err(SetLogError::Validation)?,
                equipment: equipment.map(|e| parse_equipment(&e)).transpose()?,
            };
            if edit.is_empty() {
                println!("{} Nothing to change", "!".yellow());
                return Ok(());
            }

            let exercise = store.edit_exercise(&id, &edit)?;
            println!("{} Updated {} ({})", "✓".green(), exercise.name.bold(), exercise.category);
        }

        ExerciseAction::Delete { id } => {
            if store.delete_exercise(&id)? {
                println!("{} Deleted exercise {}", "✓".green(), id);
            } else {
                println!("{} No exercise with id {}", "!".yellow(), id);
            }
        }
    }

    Ok(())
}

fn parse_equipment(values: &[String]) -> Result<Vec<Equipment>> {
    let equipment = values
        .iter()
        .filter(|e| !e.trim().is_empty())
        .map(|e| Equipment::from_str(e.trim()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(SetLogError::Validation)?;
    Ok(equipment)
}

fn handle_templates(store: &mut SqliteCatalog, action: TemplateAction) -> Result<()> {
    match action {
        TemplateAction::List => {
            let templates = store.get_templates()?;
            if templates.is_empty() {
                println!("{}", "No templates found".yellow());
                return Ok(());
            }

            let rows: Vec<TemplateRow> = templates
                .iter()
                .map(|t| TemplateRow {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    workout_type: t.workout_type.clone().unwrap_or_default(),
                    exercises: t.exercises.len(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        TemplateAction::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read template file: {}", file.display()))?;
            let templates: Vec<Template> = match serde_json::from_str::<Vec<Template>>(&content) {
                Ok(list) => list,
                Err(_) => vec![serde_json::from_str::<Template>(&content)
                    .with_context(|| format!("Failed to parse templates in {}", file.display()))?],
            };

            for template in &templates {
                if template.name.trim().is_empty() {
                    bail!(SetLogError::Validation(format!("Template {} has no name", template.id)));
                }
                store.save_template(template)?;
                println!("{} Imported {} ({} exercises)", "✓".green(), template.name.bold(), template.exercises.len());
            }
        }

        TemplateAction::Delete { id } => {
            if store.delete_template(&id)? {
                println!("{} Deleted template {}", "✓".green(), id);
            } else {
                println!("{} No template with id {}", "!".yellow(), id);
            }
        }

        TemplateAction::Preview { id } => {
            let template = store.find_template(&id)?;
            let workout = setlog::WorkoutFactory::create_from_template(Some(&template));

            println!("{}", template.name.bold());
            if let Some(workout_type) = &template.workout_type {
                println!("  {}", workout_type.dimmed());
            }
            for group in group_exercises(&workout.exercises) {
                let (label, exercises) = match &group {
                    ExerciseGroup::Superset { exercises, .. } => ("SUPERSET".magenta().to_string(), exercises.clone()),
                    ExerciseGroup::Single(exercise) => (String::new(), vec![*exercise]),
                };
                if !label.is_empty() {
                    println!("  {}", label);
                }
                for exercise in exercises {
                    let indent = if group.is_superset() { "    " } else { "  " };
                    println!("{}{} {}", indent, exercise.name, format!("{} sets", exercise.sets.len()).dimmed());
                }
            }
        }
    }

    Ok(())
}

fn parse_target(raw: &str) -> Result<TargetOverride> {
    let invalid = || anyhow!(SetLogError::Validation(format!("Invalid target '{}', expected INDEX:SETSxREPS", raw)));
    let (index, plan) = raw.split_once(':').ok_or_else(invalid)?;
    let (sets, reps) = plan.to_lowercase().split_once('x').map(|(s, r)| (s.to_string(), r.to_string())).ok_or_else(invalid)?;

    Ok(TargetOverride {
        exercise_index: index.trim().parse().map_err(|_| invalid())?,
        target_sets: sets.trim().parse().map_err(|_| invalid())?,
        target_reps: reps.trim().parse().map_err(|_| invalid())?,
    })
}

fn handle_logs(mut store: SqliteCatalog, config: &AppConfig, action: LogAction) -> Result<()> {
    let settings = store.get_settings()?;

    match action {
        LogAction::List { limit } => {
            let logs = store.get_logs()?;
            if logs.is_empty() {
                println!("{}", "No workouts logged yet".yellow());
                return Ok(());
            }

            let calculator = settings.volume_calculator();
            let rows: Vec<LogRow> = recent_logs(&logs, limit)
                .into_iter()
                .map(|log| LogRow {
                    id: log.id.clone(),
                    date: settings.local_time(log.start_time).format("%Y-%m-%d %H:%M").to_string(),
                    name: log.template_name.clone().unwrap_or_else(|| "Freestyle".to_string()),
                    minutes: log.duration_minutes.unwrap_or(0),
                    sets: log.total_sets(),
                    volume: calculator.workout_volume(log).normalize().to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!("{} total sessions logged", logs.len());
        }

        LogAction::Record { template, minutes, targets } => {
            let template = template.map(|id| store.find_template(&id)).transpose()?;
            let overrides = targets.iter().map(|t| parse_target(t)).collect::<Result<Vec<_>>>()?;

            let mut session = WorkoutSession::new(store);
            let workout = session.start_configured(template.as_ref(), &overrides)?.clone();

            for exercise in &workout.exercises {
                for set in &exercise.sets {
                    session.update_set(&exercise.instance_id, &set.id, &SetUpdate::new().completed(true))?;
                }
            }

            let end = workout.start_time + Duration::minutes(i64::from(minutes));
            match session.finish_workout_at(end)? {
                Some(finished) => {
                    println!("{} Logged {}", "✓".green(), suggested_file_name(&finished, &settings).bold());
                    println!("  ID: {}", finished.id.dimmed());
                }
                None => println!("{}", "No workout was active".yellow()),
            }
        }

        LogAction::Delete { id } => {
            if store.delete_log(&id)? {
                println!("{} Deleted workout {}", "✓".green(), id);
            } else {
                println!("{} No workout with id {}", "!".yellow(), id);
            }
        }

        LogAction::Export { id, output, stdout } => {
            let log = store.find_log(&id)?;
            let result = if stdout {
                ExportManager::export_workout(&log, &settings, &mut StdoutSink)
            } else {
                let dir = output.unwrap_or_else(|| config.export.output_dir.clone());
                ExportManager::export_workout(&log, &settings, &mut FileSink::new(dir))
            };

            let location = result.map_err(SetLogError::from)?;
            if !stdout {
                println!("{} Exported to {}", "✓".green(), location.bold());
            }
        }

        LogAction::Activity { days } => {
            let logs = store.get_logs()?;
            let today = settings.local_time(Utc::now()).date_naive();
            let matrix = activity_matrix(&logs, today, days, settings.offset());

            println!("{}", "CONSISTENCY".bold());
            for week in matrix.chunks(7) {
                let cells: Vec<String> = week
                    .iter()
                    .map(|day| match day.count {
                        0 => "·".dimmed().to_string(),
                        1 => "■".green().to_string(),
                        _ => "■".bright_green().bold().to_string(),
                    })
                    .collect();
                let start = week.first().map(|d| d.date.format("%b %d").to_string()).unwrap_or_default();
                println!("  {}  {}", start.dimmed(), cells.join(" "));
            }
            println!("{} total sessions logged", logs.len());
        }
    }

    Ok(())
}

fn handle_settings(store: &mut SqliteCatalog, action: SettingsAction) -> Result<()> {
    let mut settings = store.get_settings()?;

    match action {
        SettingsAction::Show => {
            let mapping = &settings.yaml_mapping;
            println!("{}", "Frontmatter keys".bold());
            println!("  date:     {}", mapping.date);
            println!("  type:     {}", mapping.workout_type);
            println!("  duration: {}", mapping.duration);
            println!("  tags:     {}", mapping.tags);
            println!("{} {}", "Tags:".bold(), settings.tags.join(", "));
            println!(
                "{} {}",
                "Bodyweight:".bold(),
                settings.user_bodyweight.map_or("not set".to_string(), |bw| bw.normalize().to_string())
            );
            println!("{} {} minutes", "UTC offset:".bold(), settings.utc_offset_minutes);
            println!("{} {:?}", "Volume:".bold(), settings.volume_policy);
            for problem in settings.validation_errors() {
                println!("{} {}", "!".yellow(), problem);
            }
            return Ok(());
        }

        SettingsAction::Bodyweight { value } => {
            settings.user_bodyweight = if value.eq_ignore_ascii_case("clear") {
                None
            } else {
                let bodyweight = Decimal::from_str(value.trim())
                    .map_err(|_| SetLogError::Validation(format!("Invalid bodyweight: {}", value)))?;
                Some(bodyweight)
            };
        }

        SettingsAction::Tags { tags } => settings.set_tags(&tags),

        SettingsAction::Map { field, key } => {
            settings.yaml_mapping.set(&field, &key).map_err(SetLogError::Validation)?;
        }

        SettingsAction::Offset { minutes } => settings.utc_offset_minutes = minutes,

        SettingsAction::Volume { policy } => {
            settings.volume_policy = if policy == "completed" {
                VolumePolicy::CompletedOnly
            } else {
                VolumePolicy::AllSets
            };
        }
    }

    let problems = settings.validation_errors();
    if !problems.is_empty() {
        bail!(SetLogError::Validation(problems.join("; ")));
    }

    store.save_settings(&settings)?;
    println!("{} Settings saved", "✓".green());
    Ok(())
}
