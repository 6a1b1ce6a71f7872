//! CLI interface for narrate.
//!
//! Each subcommand is non-interactive: files in, text and JSON out.
//!
//! - `narrate convert <FILE>` converts one journey.
//! - `narrate batch <DIR> --out-dir <DIR>` converts every journey under a directory.
//! - `narrate knowledge ...` inspects and edits the action knowledge store.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use ignore::WalkBuilder;

use crate::config::Config;
use crate::ingest;
use crate::knowledge::{KnowledgeBackend, KnowledgeStore, MemoryBackend};
use crate::pipeline::{self, Options, Output, RunData};
use crate::storage::Storage;

use format::{format_diagnostic, format_entry, format_variable};

/// Narrate: turn recorded UI test journeys into plain-language steps.
#[derive(Debug, Parser)]
#[command(name = "narrate", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Knowledge store file. Overrides `store-path` in the config.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Keep learned action knowledge in memory for this run only.
    #[arg(long, global = true, conflicts_with = "store")]
    ephemeral: bool,

    /// More logging: -v info, -vv debug, -vvv trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. narrate convert journey.json --environment env.json
     → prints the steps; diagnostics go to stderr
  2. narrate batch exports/ --execution execution.json --out-dir narrated/
     → narrated/<name>.txt, <name>.variables.json, <name>.diagnostics.json
  3. narrate knowledge list
  4. narrate knowledge promote DRAG_AND_DROP --template "Drag {subject} to {value}""#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert one journey file (journey record or extraction bundle).
    ///
    /// Without `--out-dir` the document (or JSON) is printed to stdout.
    Convert {
        /// Journey file.
        file: PathBuf,

        #[command(flatten)]
        sources: SourceArgs,

        /// Write `<name>.txt`, `<name>.variables.json` and diagnostics here.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Stdout format when no `--out-dir` is given.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Report this run's output for an action kind as wrong. Repeatable.
        #[arg(long, value_name = "KIND")]
        wrong: Vec<String>,
    },

    /// Convert every `*.json` journey under a directory.
    ///
    /// Respects `.gitignore`. Each journey is converted independently and
    /// merges its knowledge into the store as it finishes.
    Batch {
        /// Directory to walk.
        dir: PathBuf,

        #[command(flatten)]
        sources: SourceArgs,

        /// Where to write each journey's outputs.
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Inspect and teach the action knowledge store.
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommand,
    },
}

/// Optional run-time records shared by every journey in the run.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Execution record with initial data and test data rows.
    #[arg(long)]
    execution: Option<PathBuf>,

    /// Environment record with named variables.
    #[arg(long)]
    environment: Option<PathBuf>,

    /// API catalog used to name API call inputs.
    #[arg(long)]
    api_catalog: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum KnowledgeCommand {
    /// List every stored action handler.
    List,

    /// Replace a kind's template and mark it reviewed at full confidence.
    Promote {
        /// Action kind, e.g. `DRAG_AND_DROP`.
        kind: String,

        /// Template with `{subject}`, `{target}`, `{value}`, `{variable}` placeholders.
        #[arg(long)]
        template: String,
    },

    /// Report a kind's output as wrong, lowering its confidence.
    Flag {
        kind: String,
    },

    /// Delete a kind's handler.
    Forget {
        kind: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The step document.
    Text,
    /// Document, variable report and diagnostics as one JSON object.
    Json,
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: &Cli, config: &Config) -> Result<(), String> {
    let options = Options {
        max_text_len: config.max_text_selector_len,
    };

    match &cli.command {
        Command::Convert {
            file,
            sources,
            out_dir,
            format,
            wrong,
        } => {
            let backend = open_backend(cli, config)?;
            let data = load_run_data(sources)?;
            let output = convert_file(file, &data, &options, backend.as_ref(), wrong)?;
            cmd_convert(file, &output, out_dir.as_deref(), *format)
        }
        Command::Batch {
            dir,
            sources,
            out_dir,
        } => {
            let backend = open_backend(cli, config)?;
            let data = load_run_data(sources)?;
            cmd_batch(dir, &data, &options, backend.as_ref(), out_dir)
        }
        Command::Knowledge { command } => {
            if cli.ephemeral {
                return Err("knowledge commands need a persistent store; drop --ephemeral".to_string());
            }
            let storage = open_storage(cli, config)?;
            cmd_knowledge(&storage, command)
        }
    }
}

fn open_storage(cli: &Cli, config: &Config) -> Result<Storage, String> {
    let path = cli
        .store
        .clone()
        .or_else(|| config.store_path())
        .ok_or("could not determine home directory; pass --store")?;
    Storage::open(&path)
        .map_err(|e| format!("failed to open knowledge store at {}: {e}", path.display()))
}

fn open_backend(cli: &Cli, config: &Config) -> Result<Box<dyn KnowledgeBackend>, String> {
    if cli.ephemeral {
        return Ok(Box::new(MemoryBackend::default()));
    }
    Ok(Box::new(open_storage(cli, config)?))
}

fn load_run_data(sources: &SourceArgs) -> Result<RunData, String> {
    let mut data = RunData::default();
    if let Some(path) = &sources.execution {
        data.execution = ingest::load_execution(path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &sources.environment {
        data.environment = ingest::load_environment(path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &sources.api_catalog {
        data.api_catalog = ingest::load_api_catalog(path).map_err(|e| e.to_string())?;
    }
    Ok(data)
}

/// Convert one journey file, loading and merging knowledge around it.
///
/// Kinds in `wrong` are reported as wrong before the merge. Kinds the store
/// does not know fail the call after the merge.
fn convert_file(
    file: &Path,
    data: &RunData,
    options: &Options,
    backend: &dyn KnowledgeBackend,
    wrong: &[String],
) -> Result<Output, String> {
    let journey = ingest::load_journey(file).map_err(|e| e.to_string())?;
    let mut knowledge = KnowledgeStore::load(backend)
        .map_err(|e| format!("failed to load action knowledge: {e}"))?;

    let output = pipeline::convert(&journey, data, options, &mut knowledge);

    let mut missing = Vec::new();
    for kind in wrong {
        let kind = kind.trim().to_ascii_uppercase();
        if knowledge.report_wrong(&kind) {
            if let Some(entry) = knowledge.get(&kind) {
                tracing::info!(kind, confidence = entry.confidence, "reported wrong output");
            }
        } else {
            missing.push(kind);
        }
    }
    tracing::debug!(handlers = knowledge.entries().count(), "action knowledge after run");

    knowledge
        .save(backend)
        .map_err(|e| format!("failed to save action knowledge: {e}"))?;
    if !missing.is_empty() {
        return Err(format!("no action handler stored for {}", missing.join(", ")));
    }
    let fingerprint = output
        .fingerprint()
        .map_err(|e| format!("failed to fingerprint output: {e}"))?;
    tracing::info!(file = %file.display(), %fingerprint, "journey converted");
    Ok(output)
}

fn cmd_convert(
    file: &Path,
    output: &Output,
    out_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<(), String> {
    if let Some(out_dir) = out_dir {
        let written = write_outputs(out_dir, &stem(file), output)?;
        for path in &written {
            eprintln!("Wrote {}", path.display());
        }
    } else {
        match format {
            OutputFormat::Text => {
                print!("{}", output.document);
                if !output.variables.is_empty() {
                    eprintln!("Variables:");
                    for record in &output.variables.records {
                        eprintln!("  {}", format_variable(record));
                    }
                }
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(output)
                    .map_err(|e| format!("failed to serialize output: {e}"))?;
                println!("{json}");
            }
        }
    }

    for diagnostic in &output.diagnostics {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
    Ok(())
}

fn cmd_batch(
    dir: &Path,
    data: &RunData,
    options: &Options,
    backend: &dyn KnowledgeBackend,
    out_dir: &Path,
) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("failed to create {}: {e}", out_dir.display()))?;

    let files = journey_files(dir, out_dir);
    if files.is_empty() {
        println!("No journeys found under {}", dir.display());
        return Ok(());
    }

    let mut failed = 0;
    let mut diagnostics = 0;
    for file in &files {
        match convert_file(file, data, options, backend, &[])
            .and_then(|output| write_outputs(out_dir, &stem(file), &output).map(|_| output))
        {
            Ok(output) => {
                diagnostics += output.diagnostics.len();
                println!(
                    "{}  {} checkpoint(s), {} variable(s), {} diagnostic(s)",
                    file.display(),
                    output.document.sections.len(),
                    output.variables.len(),
                    output.diagnostics.len()
                );
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(file = %file.display(), error = %e, "journey failed");
                eprintln!("{}: {e}", file.display());
            }
        }
    }

    println!(
        "Converted {} of {} journey(s), {diagnostics} diagnostic(s)",
        files.len() - failed,
        files.len()
    );
    if failed > 0 {
        return Err(format!("{failed} journey(s) failed"));
    }
    Ok(())
}

fn cmd_knowledge(storage: &Storage, command: &KnowledgeCommand) -> Result<(), String> {
    match command {
        KnowledgeCommand::List => {
            let entries = storage
                .load()
                .map_err(|e| format!("failed to load action knowledge: {e}"))?;
            if entries.is_empty() {
                println!("No action handlers");
            }
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
        KnowledgeCommand::Promote { kind, template } => {
            let kind = kind.trim().to_ascii_uppercase();
            storage
                .promote_handler(&kind, template)
                .map_err(|e| format!("failed to promote {kind}: {e}"))?;
            eprintln!("Promoted {kind}");
        }
        KnowledgeCommand::Flag { kind } => {
            let kind = kind.trim().to_ascii_uppercase();
            storage
                .flag_handler(&kind)
                .map_err(|e| format!("failed to flag {kind}: {e}"))?;
            let entry = storage
                .load_handler(&kind)
                .map_err(|e| format!("failed to reload {kind}: {e}"))?;
            eprintln!("Flagged {}", format_entry(&entry));
        }
        KnowledgeCommand::Forget { kind } => {
            let kind = kind.trim().to_ascii_uppercase();
            storage
                .forget_handler(&kind)
                .map_err(|e| format!("failed to forget {kind}: {e}"))?;
            eprintln!("Forgot {kind}");
        }
    }
    Ok(())
}

/// Journey files under `dir`, sorted, skipping `out_dir` and our own outputs.
fn journey_files(dir: &Path, out_dir: &Path) -> Vec<PathBuf> {
    let out_dir = out_dir.canonicalize().ok();
    let mut files: Vec<PathBuf> = WalkBuilder::new(dir)
        .hidden(false)
        .filter_entry(move |entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return entry.path().canonicalize().ok() != out_dir;
            }
            true
        })
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| is_journey_file(path))
        .collect();
    files.sort();
    files
}

fn is_journey_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json")
        && !name.ends_with(".variables.json")
        && !name.ends_with(".diagnostics.json")
}

fn stem(file: &Path) -> String {
    file.file_stem()
        .map_or_else(|| "journey".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Write one journey's outputs. Returns the paths written.
///
/// A stale diagnostics file from an earlier run is removed when this run
/// has none.
fn write_outputs(out_dir: &Path, stem: &str, output: &Output) -> Result<Vec<PathBuf>, String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("failed to create {}: {e}", out_dir.display()))?;
    let write = |path: PathBuf, contents: String| -> Result<PathBuf, String> {
        fs::write(&path, contents).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        Ok(path)
    };

    let mut written = vec![write(out_dir.join(format!("{stem}.txt")), output.document.to_string())?];

    let variables = serde_json::to_string_pretty(&output.variables)
        .map_err(|e| format!("failed to serialize variables: {e}"))?;
    written.push(write(out_dir.join(format!("{stem}.variables.json")), variables)?);

    let diagnostics_path = out_dir.join(format!("{stem}.diagnostics.json"));
    if output.diagnostics.is_empty() {
        if diagnostics_path.exists() {
            fs::remove_file(&diagnostics_path)
                .map_err(|e| format!("failed to remove {}: {e}", diagnostics_path.display()))?;
        }
    } else {
        let diagnostics = serde_json::to_string_pretty(&output.diagnostics)
            .map_err(|e| format!("failed to serialize diagnostics: {e}"))?;
        written.push(write(diagnostics_path, diagnostics)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    const JOURNEY: &str = r#"{
        "cases": [ { "title": "Login", "steps": [
            { "action": "NAVIGATE", "value": "https://x/login" },
            { "action": "WRITE", "variable": "username",
              "element": { "target": { "selectors": [ { "type": "HINT", "value": "Username" } ] } } },
            { "action": "WIGGLE",
              "element": { "target": { "selectors": [ { "type": "HINT", "value": "Logo" } ] } } }
        ] } ],
        "dataAttributes": { "username": "admin" }
    }"#;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["narrate", "convert", "j.json", "--ephemeral", "-vv"]).unwrap();
        assert!(cli.ephemeral);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Convert { format: OutputFormat::Text, .. }));
    }

    #[test]
    fn store_and_ephemeral_conflict() {
        let result =
            Cli::try_parse_from(["narrate", "--store", "k.sqlite", "--ephemeral", "knowledge", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn journey_files_skip_outputs_and_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join("out")).unwrap();
        for name in [
            "a.json",
            "nested/b.json",
            "a.variables.json",
            "a.diagnostics.json",
            "notes.txt",
            "out/old.json",
        ] {
            fs::write(root.join(name), "{}").unwrap();
        }

        let files = journey_files(root, &root.join("out"));
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.json", "nested/b.json"]);
    }

    #[test]
    fn batch_writes_outputs_and_learns_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let out = dir.path().join("out");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("login.json"), JOURNEY).unwrap();
        fs::write(input.join("again.json"), JOURNEY).unwrap();
        let storage = Storage::open(dir.path().join("k.sqlite")).unwrap();

        cmd_batch(&input, &RunData::default(), &Options::default(), &storage, &out).unwrap();

        let text = fs::read_to_string(out.join("login.txt")).unwrap();
        assert!(text.starts_with("Checkpoint 1: Login\nNavigate to \"https://x/login\"\n"));
        assert!(text.contains("wiggle \"Logo\""));

        let variables: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("login.variables.json")).unwrap())
                .unwrap();
        assert_eq!(variables["$username"]["value"], "admin");

        // `again.json` sorts first, so it registers WIGGLE and reports it.
        assert!(out.join("again.diagnostics.json").exists());
        assert!(!out.join("login.diagnostics.json").exists());

        let entry = storage.load_handler("WIGGLE").unwrap();
        assert_eq!(entry.usage_count, 2);
        assert_eq!(entry.confidence, 30);
    }

    #[test]
    fn reporting_wrong_output_lowers_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("login.json");
        fs::write(&file, JOURNEY).unwrap();
        let storage = Storage::open(dir.path().join("k.sqlite")).unwrap();
        let data = RunData::default();

        convert_file(&file, &data, &Options::default(), &storage, &[]).unwrap();
        convert_file(&file, &data, &Options::default(), &storage, &["wiggle".to_string()]).unwrap();

        let entry = storage.load_handler("WIGGLE").unwrap();
        assert_eq!(entry.confidence, 5);
        assert!(entry.needs_review);

        let err = convert_file(&file, &data, &Options::default(), &storage, &["NOPE".to_string()])
            .unwrap_err();
        assert!(err.contains("NOPE"));
    }

    #[test]
    fn unknown_wrong_kind_still_saves_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("login.json");
        fs::write(&file, JOURNEY).unwrap();
        let storage = Storage::open(dir.path().join("k.sqlite")).unwrap();

        let err = convert_file(
            &file,
            &RunData::default(),
            &Options::default(),
            &storage,
            &["NOPE".to_string()],
        )
        .unwrap_err();
        assert!(err.contains("NOPE"));

        let entry = storage.load_handler("WIGGLE").unwrap();
        assert_eq!(entry.usage_count, 1);
    }

    #[test]
    fn stale_diagnostics_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("j.diagnostics.json");
        fs::write(&stale, "[]").unwrap();

        let written = write_outputs(dir.path(), "j", &Output {
            document: crate::assemble::Document::default(),
            variables: crate::model::VariableReport::default(),
            diagnostics: Vec::new(),
        })
        .unwrap();
        assert_eq!(written.len(), 2);
        assert!(!stale.exists());
    }
}
