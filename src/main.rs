//! tasktree - command-line front end
//!
//! Every command loads the workspace documents, applies one operation, and
//! prints its result as JSON on stdout. Commands that change anything save
//! both documents before printing.

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use tasktree::project::decomposition::{self, DecompositionRun};
use tasktree::registry::id::validate_task_id;
use tasktree::registry::{BackendCounts, FrontendCounts, LegacyRegistry};
use tasktree::state::AnalyzedDependencies;
use tasktree::{
    Category, CompletionDetails, DependencyGraph, NewTask, Phase, Project, ProjectStore,
    TaskNode, TaskRegistry, TaskStatus, TaskUpdate, TrackerError, Wave, WaveCategory,
};

#[derive(Parser)]
#[command(name = "tasktree")]
#[command(version)]
#[command(about = "Hierarchical task registry and phase tracker", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Workspace directory holding .claude_tasks/ (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task registry operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Phase tracker operations
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    /// Operations spanning both documents, and the dashboard
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Print the whole registry document
    Show,

    /// Record the frontend framework
    InitFrontend {
        framework: String,
        /// Defaults to TypeScript
        #[arg(long)]
        language: Option<String>,
    },

    /// Record the backend framework and database
    InitBackend {
        framework: String,
        database: String,
        /// Defaults to Python
        #[arg(long)]
        language: Option<String>,
    },

    /// Add a root task (payload: {"title": .., "type": .., ...})
    AddRoot { category: Category, payload: String },

    /// Add one subtask under a parent
    AddChild {
        parent_id: String,
        payload: String,
        /// Forest holding the parent (frontend first when omitted)
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Add subtasks in order under a parent (payload: JSON array)
    AddChildren {
        parent_id: String,
        payload: String,
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Show one task with its subtree
    Get {
        task_id: String,
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Show the root-to-task path
    Path { task_id: String },

    /// List tasks in pre-order
    List {
        #[arg(short, long)]
        level: Option<u32>,
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(short, long)]
        status: Option<TaskStatus>,
    },

    /// Merge fields into a task (payload: {"status": .., "title": .., ...})
    Update { task_id: String, payload: String },

    /// Set a task's status
    SetStatus { task_id: String, status: TaskStatus },

    /// Add a dependency edge
    Depend { task_id: String, depends_on: String },

    /// Remove a dependency edge
    Undepend { task_id: String, depends_on: String },

    /// Show the tasks a task depends on
    Dependencies { task_id: String },

    /// Show the tasks that depend on a task
    Dependents { task_id: String },

    /// Tasks waiting on an incomplete dependency
    Blocked,

    /// Ready-status tasks with every dependency completed
    Ready,

    /// Level-1 or level-2 branches whose subtree is completed
    IntegrationReady {
        level: u32,
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Show the stored execution order, or one wave of it
    Waves {
        #[arg(long)]
        wave: Option<u32>,
    },

    /// Replace the stored execution order (payload: JSON array of waves)
    SetWaves { payload: String },

    /// Overwrite frontend structure counts (payload: {"total_pages": .., ...})
    FrontendCounts { payload: String },

    /// Overwrite backend structure counts (payload: {"total_services": .., ...})
    BackendCounts { payload: String },

    /// Counts by status, category, and level
    Stats,

    /// Replace an empty registry with one converted from the flat legacy shape
    ImportLegacy {
        file: PathBuf,
        /// Replace a registry that already has tasks
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the whole state document
    Show,

    /// Show one phase's status
    Phase { phase: Phase },

    /// Record that user flows exist
    InitDesign { user_flows_file: String },

    /// Complete the design phase
    CompleteWireframes {
        count: u32,
        #[arg(long, default_value = "passed")]
        validation_status: String,
        #[arg(long, default_value = "")]
        report: String,
    },

    /// Start one stack's decomposition
    StartDecomposition { category: Category, total_modules: u32 },

    /// Overwrite decomposition counters
    DecompositionProgress {
        category: Category,
        /// Pages (frontend) or services (backend)
        #[arg(long)]
        units: Option<u32>,
        /// Components (frontend) or functions (backend)
        #[arg(long)]
        leaves: Option<u32>,
        #[arg(long)]
        last_module: Option<String>,
    },

    /// Complete one stack's decomposition
    CompleteDecomposition { category: Category },

    /// Mark the dependency phase completed
    CompleteDependencyAnalysis { total_waves: u32 },

    /// Enter development
    StartDevelopment {
        total_waves: u32,
        #[arg(long)]
        workers: Option<u32>,
    },

    /// Start a wave record
    StartWave {
        wave: u32,
        total_tasks: u32,
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(long)]
        batches: Option<u32>,
    },

    /// Show a wave record
    Wave { wave: u32 },

    /// Add a batch's counts to a wave record
    CompleteBatch { wave: u32, completed: u32, failed: u32 },

    /// Close a wave record without checking its tasks
    CompleteWave { wave: u32 },

    /// Add a task to the completed list
    CompleteTask { task_id: String },

    /// Add a task to the failed list
    FailTask { task_id: String },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Project status summary
    Dashboard {
        /// Print JSON instead of the colored summary
        #[arg(long)]
        json: bool,
    },

    /// Complete a task in both documents
    CompleteTask {
        task_id: String,
        /// Forest holding the task (frontend first when omitted)
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(long)]
        implementation_file: Option<String>,
        #[arg(long)]
        test_file: Option<String>,
        #[arg(long)]
        test_coverage: Option<f64>,
        #[arg(long)]
        duration_minutes: Option<f64>,
    },

    /// Fail a task in both documents
    FailTask {
        task_id: String,
        error: String,
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Complete a level-1 or level-2 task whose subtree is done
    CompleteIntegration {
        task_id: String,
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(long)]
        implementation_file: Option<String>,
        #[arg(long)]
        test_file: Option<String>,
    },

    /// Enter development using the stored execution order
    StartDevelopment {
        #[arg(long)]
        workers: Option<u32>,
    },

    /// Start a wave from the stored execution order
    StartWave { wave: u32 },

    /// Record a finished batch
    CompleteBatch {
        wave: u32,
        #[arg(long, value_delimiter = ',')]
        completed: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        failed: Vec<String>,
    },

    /// Close a wave once all its tasks are completed or failed
    CompleteWave { wave: u32 },

    /// Next pending tasks of a wave
    NextBatch {
        wave: u32,
        #[arg(long)]
        size: Option<usize>,
    },

    /// Whether development can resume
    Resume,

    /// Check a dependency analysis file without applying it
    ValidateAnalysis { file: PathBuf },

    /// Apply a dependency analysis file
    ApplyAnalysis { file: PathBuf },

    /// Replace the execution order with one derived from current edges
    DeriveOrder,

    /// Integrate staged decomposition files
    Integrate {
        category: Category,
        /// Directory to read (defaults to .claude_tasks/<category>_decomposition_temp)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Leave integrated files in place
        #[arg(long)]
        no_archive: bool,
    },
}

enum Output {
    Json(Value),
    Text(String),
}

struct Outcome {
    output: Output,
    changed: bool,
    archive: Option<(DecompositionRun, PathBuf)>,
}

impl Outcome {
    fn read(value: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            output: Output::Json(serde_json::to_value(value)?),
            changed: false,
            archive: None,
        })
    }

    fn changed(value: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            changed: true,
            ..Self::read(value)?
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        let code = err
            .downcast_ref::<TrackerError>()
            .map(TrackerError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "tasktree=debug,info"
    } else {
        "tasktree=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| cli.workspace.clone());
    if !workspace.is_dir() {
        return Err(TrackerError::NotFound {
            kind: "Workspace directory",
            id: workspace.display().to_string(),
        }
        .into());
    }

    let store = ProjectStore::new(&workspace);
    let mut project = Project::open(&store)?;

    let outcome = match cli.command {
        Commands::Task { action } => run_task(&mut project, action)?,
        Commands::State { action } => run_state(&mut project, action)?,
        Commands::Project { action } => run_project(&mut project, &workspace, action)?,
    };

    if outcome.changed {
        project.save(&store)?;
        debug!(workspace = %workspace.display(), "Saved documents");
    }
    if let Some((integrated, dir)) = &outcome.archive {
        let archived = decomposition::archive_files(integrated, dir)?;
        info!(count = archived.len(), dir = %dir.display(), "Archived decomposition files");
    }

    match outcome.output {
        Output::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Output::Text(text) => println!("{}", text),
    }
    Ok(())
}

fn parse_payload<T: DeserializeOwned>(field: &str, payload: &str) -> Result<T, TrackerError> {
    serde_json::from_str(payload)
        .map_err(|e| TrackerError::invalid_argument(field, format!("invalid JSON payload: {}", e)))
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, TrackerError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TrackerError::storage(path, format!("Failed to read: {}", e)))?;
    serde_json::from_str(&content).map_err(|source| TrackerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn run_task(project: &mut Project, action: TaskAction) -> anyhow::Result<Outcome> {
    let registry = &mut project.registry;
    match action {
        TaskAction::Show => Outcome::read(&*registry),
        TaskAction::InitFrontend {
            framework,
            language,
        } => {
            registry.init_frontend_metadata(&framework, language.as_deref());
            Outcome::changed(&registry.frontend_metadata)
        }
        TaskAction::InitBackend {
            framework,
            database,
            language,
        } => {
            registry.init_backend_metadata(&framework, &database, language.as_deref());
            Outcome::changed(&registry.backend_metadata)
        }
        TaskAction::AddRoot { category, payload } => {
            let data: NewTask = parse_payload("payload", &payload)?;
            let task_id = registry.insert_root(category, data);
            Outcome::changed(json!({ "task_id": task_id }))
        }
        TaskAction::AddChild {
            parent_id,
            payload,
            category,
        } => {
            let data: NewTask = parse_payload("payload", &payload)?;
            let task_id = registry.insert_child_in(category, &parent_id, data)?;
            Outcome::changed(json!({ "task_id": task_id }))
        }
        TaskAction::AddChildren {
            parent_id,
            payload,
            category,
        } => {
            let children: Vec<NewTask> = parse_payload("payload", &payload)?;
            let task_ids = registry.insert_children_in(category, &parent_id, children)?;
            Outcome::changed(json!({ "task_ids": task_ids }))
        }
        TaskAction::Get { task_id, category } => {
            Outcome::read(registry.get_in(category, &task_id)?)
        }
        TaskAction::Path { task_id } => {
            validate_task_id(&task_id)?;
            let path = registry
                .path(&task_id)
                .ok_or_else(|| TrackerError::task_not_found(&task_id))?;
            let ids: Vec<&str> = path.iter().map(|n| n.id.as_str()).collect();
            Outcome::read(ids)
        }
        TaskAction::List {
            level,
            category,
            status,
        } => {
            let tasks: Vec<&TaskNode> = match status {
                Some(status) => registry
                    .tasks_by_status(status, category)
                    .into_iter()
                    .filter(|t| level.is_none_or(|l| t.level == l))
                    .collect(),
                None => registry.flatten(level, category),
            };
            Outcome::read(summaries(&tasks))
        }
        TaskAction::Update { task_id, payload } => {
            let update: TaskUpdate = parse_payload("payload", &payload)?;
            Outcome::changed(registry.update(&task_id, update)?)
        }
        TaskAction::SetStatus { task_id, status } => {
            Outcome::changed(registry.update_task_status(&task_id, status)?)
        }
        TaskAction::Depend {
            task_id,
            depends_on,
        } => {
            registry.add_dependency(&task_id, &depends_on)?;
            Outcome::changed(json!({ "task_id": task_id, "depends_on": depends_on }))
        }
        TaskAction::Undepend {
            task_id,
            depends_on,
        } => {
            let removed = registry.remove_dependency(&task_id, &depends_on);
            Ok(Outcome {
                changed: removed,
                ..Outcome::read(json!({ "removed": removed }))?
            })
        }
        TaskAction::Dependencies { task_id } => {
            Outcome::read(summaries(&registry.dependencies_of(&task_id)?))
        }
        TaskAction::Dependents { task_id } => {
            Outcome::read(summaries(&registry.dependents_of(&task_id)))
        }
        TaskAction::Blocked => Outcome::read(summaries(&registry.blocked_tasks())),
        TaskAction::Ready => Outcome::read(summaries(&registry.ready_tasks())),
        TaskAction::IntegrationReady { level, category } => {
            Outcome::read(summaries(&registry.integration_ready(level, category)?))
        }
        TaskAction::Waves { wave } => match wave {
            Some(wave) => Outcome::read(
                registry
                    .wave(wave)
                    .ok_or_else(|| TrackerError::wave_not_found(wave))?,
            ),
            None => Outcome::read(registry.execution_order()),
        },
        TaskAction::SetWaves { payload } => {
            let waves: Vec<Wave> = parse_payload("payload", &payload)?;
            registry.set_execution_order(waves);
            Outcome::changed(json!({ "total_waves": registry.total_waves() }))
        }
        TaskAction::FrontendCounts { payload } => {
            let counts: FrontendCounts = parse_payload("payload", &payload)?;
            registry.update_frontend_counts(&counts);
            Outcome::changed(&registry.frontend_metadata)
        }
        TaskAction::BackendCounts { payload } => {
            let counts: BackendCounts = parse_payload("payload", &payload)?;
            registry.update_backend_counts(&counts);
            Outcome::changed(&registry.backend_metadata)
        }
        TaskAction::Stats => Outcome::read(registry.statistics()),
        TaskAction::ImportLegacy { file, force } => {
            if !registry.is_empty() && !force {
                return Err(TrackerError::precondition(
                    "import",
                    "registry already has tasks (use --force to replace it)",
                    Vec::new(),
                )
                .into());
            }
            let legacy: LegacyRegistry = read_json_file(&file)?;
            let (imported, id_map) = TaskRegistry::import_legacy(&legacy)?;
            *registry = imported;
            Outcome::changed(json!({ "id_map": id_map }))
        }
    }
}

/// Compact listing entry for task queries.
fn summaries(tasks: &[&TaskNode]) -> Vec<Value> {
    tasks
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "category": t.category,
                "level": t.level,
                "status": t.status,
                "title": t.title,
            })
        })
        .collect()
}

fn run_state(project: &mut Project, action: StateAction) -> anyhow::Result<Outcome> {
    let state = &mut project.state;
    match action {
        StateAction::Show => Outcome::read(&*state),
        StateAction::Phase { phase } => Outcome::read(json!({
            "phase": phase.as_str(),
            "status": state.phase_status(phase),
        })),
        StateAction::InitDesign { user_flows_file } => {
            state.init_design_phase(&user_flows_file);
            Outcome::changed(&state.design_phase)
        }
        StateAction::CompleteWireframes {
            count,
            validation_status,
            report,
        } => {
            state.complete_wireframes(count, &validation_status, &report);
            Outcome::changed(&state.design_phase)
        }
        StateAction::StartDecomposition {
            category,
            total_modules,
        } => {
            state.start_decomposition(category, total_modules);
            Outcome::changed(&state.decomposition_phase)
        }
        StateAction::DecompositionProgress {
            category,
            units,
            leaves,
            last_module,
        } => {
            match category {
                Category::Frontend => {
                    state.update_frontend_progress(units, leaves, last_module.as_deref())
                }
                Category::Backend => {
                    state.update_backend_progress(units, leaves, last_module.as_deref())
                }
            }
            Outcome::changed(&state.decomposition_phase)
        }
        StateAction::CompleteDecomposition { category } => {
            state.complete_decomposition(category);
            Outcome::changed(&state.decomposition_phase)
        }
        StateAction::CompleteDependencyAnalysis { total_waves } => {
            state.complete_dependency_analysis(total_waves, AnalyzedDependencies::all());
            Outcome::changed(&state.dependency_phase)
        }
        StateAction::StartDevelopment {
            total_waves,
            workers,
        } => {
            let workers = workers.unwrap_or(project.config.workers);
            state.start_development(total_waves, workers);
            Outcome::changed(&state.development_phase)
        }
        StateAction::StartWave {
            wave,
            total_tasks,
            category,
            batches,
        } => {
            let category = category.map(WaveCategory::from).unwrap_or_default();
            Outcome::changed(state.start_wave(wave, category, total_tasks, batches)?)
        }
        StateAction::Wave { wave } => Outcome::read(state.wave_progress(wave)?),
        StateAction::CompleteBatch {
            wave,
            completed,
            failed,
        } => Outcome::changed(state.complete_batch(wave, completed, failed)?),
        StateAction::CompleteWave { wave } => Outcome::changed(state.complete_wave(wave)?),
        StateAction::CompleteTask { task_id } => {
            state.complete_task(&task_id);
            Outcome::changed(json!({ "completed_tasks": state.completed_tasks() }))
        }
        StateAction::FailTask { task_id } => {
            state.fail_task(&task_id);
            Outcome::changed(json!({ "failed_tasks": state.failed_tasks() }))
        }
    }
}

fn run_project(
    project: &mut Project,
    workspace: &Path,
    action: ProjectAction,
) -> anyhow::Result<Outcome> {
    match action {
        ProjectAction::Dashboard { json } => {
            let dashboard = project.dashboard();
            if json {
                Outcome::read(dashboard)
            } else {
                Ok(Outcome {
                    output: Output::Text(dashboard.render()),
                    changed: false,
                    archive: None,
                })
            }
        }
        ProjectAction::CompleteTask {
            task_id,
            category,
            implementation_file,
            test_file,
            test_coverage,
            duration_minutes,
        } => {
            let details = CompletionDetails {
                implementation_file,
                test_file,
                test_coverage,
                duration_minutes,
            };
            Outcome::changed(project.complete_task_in(category, &task_id, details)?)
        }
        ProjectAction::FailTask {
            task_id,
            error,
            category,
        } => Outcome::changed(project.fail_task_in(category, &task_id, &error)?),
        ProjectAction::CompleteIntegration {
            task_id,
            category,
            implementation_file,
            test_file,
        } => {
            let details = CompletionDetails {
                implementation_file,
                test_file,
                ..CompletionDetails::default()
            };
            Outcome::changed(project.complete_integration_task_in(category, &task_id, details)?)
        }
        ProjectAction::StartDevelopment { workers } => {
            project.start_development(workers);
            Outcome::changed(&project.state.development_phase)
        }
        ProjectAction::StartWave { wave } => {
            project.start_wave(wave)?;
            Outcome::changed(project.state.wave_progress(wave)?)
        }
        ProjectAction::CompleteBatch {
            wave,
            completed,
            failed,
        } => Outcome::changed(project.complete_batch(wave, &completed, &failed)?),
        ProjectAction::CompleteWave { wave } => Outcome::changed(project.complete_wave(wave)?),
        ProjectAction::NextBatch { wave, size } => {
            Outcome::read(summaries(&project.next_batch(wave, size)))
        }
        ProjectAction::Resume => Outcome::read(project.resume_status()),
        ProjectAction::ValidateAnalysis { file } => {
            let analysis: DependencyGraph = read_json_file(&file)?;
            let config = &project.config;
            let report = project.registry.validate_execution_order(
                &analysis,
                config.min_wave_size,
                config.max_wave_size,
            );
            Outcome::read(json!({
                "valid": report.is_valid(),
                "summary": report.summary(),
                "errors": report.errors,
                "warnings": report.warnings,
            }))
        }
        ProjectAction::ApplyAnalysis { file } => {
            let analysis: DependencyGraph = read_json_file(&file)?;
            Outcome::changed(project.apply_dependency_analysis(analysis)?)
        }
        ProjectAction::DeriveOrder => Outcome::changed(project.rederive_execution_order()?),
        ProjectAction::Integrate {
            category,
            dir,
            no_archive,
        } => {
            let dir = dir.unwrap_or_else(|| decomposition::temp_dir(workspace, category));
            let run = project.integrate_decomposition_dir(&dir, category)?;
            let mut outcome = Outcome::changed(json!({
                "total_tasks": run.total_tasks(),
                "files": &run.files,
                "failures": &run.failures,
            }))?;
            outcome.changed = !run.files.is_empty();
            if !no_archive {
                outcome.archive = Some((run, decomposition::archive_dir(workspace, category)));
            }
            Ok(outcome)
        }
    }
}
