use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hmr_patcher::config::load_for_workspace;
use hmr_patcher::hmr::{Context, Report, Schematic, StepResult, TemplateSource};
use hmr_patcher::store::FsStore;
use hmr_patcher::ts::{self, NodeKind, SyntaxNode};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hmr-patcher")]
#[command(about = "Enable hot module replacement in an Angular workspace", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the workspace for HMR
    Apply {
        /// Workspace root (auto-detected if not specified)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Options file (defaults to <workspace>/hmr-patcher.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory of template files to render instead of the built-in src/hmr.ts
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Show what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Do not run `npm install` afterwards
        #[arg(long)]
        skip_install: bool,
    },

    /// Report which steps are applied, pending or skipped
    Status {
        /// Workspace root (auto-detected if not specified)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Options file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the syntax tree of a TypeScript file
    Tree {
        file: PathBuf,

        /// Only list nodes of this kind (e.g. `identifier` or `CallExpression`)
        #[arg(short, long)]
        kind: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    hmr_patcher::logging::init(cli.verbose);

    match cli.command {
        Commands::Apply {
            workspace,
            config,
            templates,
            dry_run,
            diff,
            skip_install,
        } => cmd_apply(workspace, config, templates, dry_run, diff, skip_install),

        Commands::Status { workspace, config } => cmd_status(workspace, config),

        Commands::Tree { file, kind } => cmd_tree(&file, kind.as_deref()),
    }
}

/// Resolve the workspace root.
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. HMR_WORKSPACE environment variable
/// 3. The nearest ancestor of the current directory holding an angular.json
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace {} does not exist", path.display()));
    }

    if let Ok(env_path) = env::var("HMR_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: HMR_WORKSPACE is set but path doesn't exist: {env_path}").yellow()
        );
    }

    if let Some(path) = auto_detect_workspace() {
        println!(
            "{}",
            format!("Auto-detected workspace: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find an Angular workspace.".red(),
        "Try one of:".bold(),
        "1. cd into the directory holding angular.json",
        "2. Specify explicitly: hmr-patcher apply --workspace /path/to/app",
        "3. Set environment variable: export HMR_WORKSPACE=/path/to/app"
    )
}

fn auto_detect_workspace() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;
    current
        .ancestors()
        .find(|ancestor| ancestor.join("angular.json").is_file())
        .map(Path::to_path_buf)
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{change}").red(),
                ChangeTag::Insert => format!("+{change}").green(),
                ChangeTag::Equal => format!(" {change}").normal(),
            };
            print!("{line}");
            if change.missing_newline() {
                println!();
            }
        }
    }
}

fn run_schematic(
    workspace: &Path,
    config: Option<PathBuf>,
    templates: Option<PathBuf>,
) -> Result<(FsStore, Context, Report)> {
    let options = load_for_workspace(workspace, config.as_deref())?;
    let mut store = FsStore::open(workspace)?;
    let mut ctx = Context::new();

    let mut schematic = Schematic::new(&options);
    if let Some(dir) = templates {
        schematic = schematic.with_templates(TemplateSource::Directory(dir));
    }
    let report = schematic.run(&mut store, &mut ctx);
    Ok((store, ctx, report))
}

fn cmd_apply(
    workspace: Option<PathBuf>,
    config: Option<PathBuf>,
    templates: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    skip_install: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    println!("Workspace: {}", workspace.display());
    if dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
    }
    println!();

    let (mut store, mut ctx, report) = run_schematic(&workspace, config, templates)?;

    let mut applied = 0;
    let mut already = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for (step, outcome) in &report.steps {
        match outcome {
            Ok(StepResult::Applied { path }) => {
                let verb = if dry_run { "Would apply to" } else { "Applied to" };
                println!("{} {step}: {verb} {path}", "✓".green());
                applied += 1;
            }
            Ok(StepResult::AlreadyApplied { path }) => {
                println!("{} {step}: Already applied to {path}", "⊙".yellow());
                already += 1;
            }
            Ok(StepResult::Skipped { reason }) => {
                println!("{} {step}: Skipped ({reason})", "⊘".cyan());
                skipped += 1;
            }
            Err(e) => {
                eprintln!("{} {step}: Error - {e}", "✗".red());
                failed += 1;
            }
        }
    }

    if show_diff {
        for change in store.changes() {
            display_diff(Path::new(change.path), change.before.unwrap_or(""), change.after);
        }
    }

    if !dry_run {
        let written = store.flush()?;
        if !written.is_empty() {
            println!("\n{} file(s) written", written.len());
        }
    }

    let tasks = ctx.take_tasks();
    if dry_run || skip_install {
        for task in &tasks {
            println!("{} not running `{task}`", "⊘".cyan());
        }
    } else {
        for task in &tasks {
            println!("Running `{task}`...");
            if let Err(e) = task.run(&workspace) {
                eprintln!("{} {e}", "✗".red());
                failed += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", applied.to_string().green());
    println!("  {} already applied", already.to_string().yellow());
    println!("  {} skipped", skipped.to_string().cyan());
    println!("  {} failed", failed.to_string().red());

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_status(workspace: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    println!("Workspace: {}", workspace.display());
    println!();

    let (_, _, report) = run_schematic(&workspace, config, None)?;

    for (step, outcome) in &report.steps {
        match outcome {
            Ok(StepResult::AlreadyApplied { .. }) => {
                println!("{} {}: {}", "✓".green(), step, "APPLIED".green().bold());
            }
            Ok(StepResult::Applied { path }) => {
                println!(
                    "{} {}: {} ({path})",
                    "⊙".yellow(),
                    step,
                    "PENDING".yellow().bold()
                );
            }
            Ok(StepResult::Skipped { reason }) => {
                println!("{} {}: {} ({reason})", "⊘".cyan(), step, "SKIPPED".cyan());
            }
            Err(e) => {
                println!("{} {}: {} ({e})", "✗".red(), step, "ERROR".red().bold());
            }
        }
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_tree(file: &Path, kind: Option<&str>) -> Result<()> {
    let tree = ts::parse_file(file)?;

    match kind {
        Some(name) => {
            let kind = NodeKind::from_name(name)
                .with_context(|| format!("unknown node kind `{name}`"))?;
            for node in ts::find_nodes(tree.root(), kind, None) {
                println!("{} {}", node.span(), node.text().escape_debug());
            }
        }
        None => {
            for node in tree.nodes() {
                print_node(node);
            }
        }
    }

    if tree.has_errors() {
        eprintln!(
            "{}",
            format!("{} syntax error(s) in {}", tree.error_spans().len(), file.display()).yellow()
        );
    }
    Ok(())
}

fn print_node(node: SyntaxNode<'_>) {
    let indent = "  ".repeat(node.depth());
    let label = if node.is_missing() {
        format!("{} (missing)", node.kind()).red().to_string()
    } else if node.kind() == NodeKind::Error {
        node.kind().to_string().red().to_string()
    } else {
        node.kind().to_string()
    };

    if node.child_count() == 0 {
        println!(
            "{indent}{label} {} {}",
            node.span().to_string().dimmed(),
            format!("{:?}", node.text()).green()
        );
    } else {
        println!("{indent}{label} {}", node.span().to_string().dimmed());
    }
}
