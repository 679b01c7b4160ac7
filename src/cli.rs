//! Command line front end: check | doc | example | validate
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

use jsight_schema::compiler::{AllOfCompiler, CompileOptions, Compiler};
use jsight_schema::config::{self, ProjectConfig};
use jsight_schema::{RuleRegistry, Schema, SchemaError, TypeRegistry, collect_user_types, resolve, validate_value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSight schemas, print their documentation or example, and validate JSON documents against them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging (-v debug, -vv trace); RUST_LOG applies otherwise
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile schemas and report errors
    Check(CheckCmd),
    /// print the documentation tree of a schema as JSON
    Doc(SchemaOut),
    /// print the example value of a schema
    Example(SchemaOut),
    /// validate JSON documents against a schema
    Validate(ValidateCmd),
}

#[derive(Args, Debug, Clone)]
struct ProjectSettings {
    /// project file; `jschema.json` in the working directory is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// type files (paths or quoted glob patterns); the file stem is the type name
    #[arg(long, short, num_args = 1..)]
    types: Vec<String>,

    /// keys without an `optional` rule are optional
    #[arg(long)]
    keys_optional_by_default: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    #[command(flatten)]
    project: ProjectSettings,

    /// schema files; may be literal paths or quoted glob patterns
    #[arg(num_args = 1.., required = true)]
    schemas: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    project: ProjectSettings,

    /// schema file
    schema: PathBuf,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ValidateCmd {
    #[command(flatten)]
    project: ProjectSettings,

    /// schema file
    schema: PathBuf,

    /// JSON documents; may be literal paths or quoted glob patterns
    #[arg(num_args = 1.., required = true)]
    documents: Vec<String>,
}

/// Named types, enum rules and options shared by every schema of a run.
struct Workspace {
    types: TypeRegistry,
    rules: RuleRegistry,
    options: CompileOptions,
    /// Type name to the file it was compiled from, for locating errors.
    sources: HashMap<String, (PathBuf, Vec<u8>)>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Check(target) => {
                let workspace = Workspace::load(&target.project)?;
                let paths = resolve_file_path_patterns(&target.schemas)?;
                let results: Vec<(PathBuf, anyhow::Result<()>)> = paths
                    .into_par_iter()
                    .map(|path| {
                        let result = workspace.compile_file(&path).map(|_| ());
                        (path, result)
                    })
                    .collect();
                let mut failed = 0;
                for (path, result) in &results {
                    match result {
                        Ok(()) => println!("{} {}", "ok".green().bold(), path.display()),
                        Err(error) => {
                            failed += 1;
                            println!("{} {}: {error:#}", "error".red().bold(), path.display());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} schemas failed", results.len());
                }
                Ok(())
            }
            Command::Doc(target) => {
                let workspace = Workspace::load(&target.project)?;
                let schema = workspace.compile_file(&target.schema)?;
                let doc = serde_json::to_string_pretty(&schema.doc())?;
                write_output(target.out.as_deref(), &doc)
            }
            Command::Example(target) => {
                let workspace = Workspace::load(&target.project)?;
                let schema = workspace.compile_file(&target.schema)?;
                let example = schema.example_json(&workspace.types).map_err(|err| workspace.report(err, &target.schema, &[]))?;
                write_output(target.out.as_deref(), &example)
            }
            Command::Validate(target) => {
                let workspace = Workspace::load(&target.project)?;
                let schema = workspace.compile_file(&target.schema)?;
                let paths = resolve_file_path_patterns(&target.documents)?;
                let mut failed = 0;
                for path in &paths {
                    let source = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
                    let document: serde_json::Value = serde_json::from_slice(&source)
                        .with_context(|| format!("failed to parse JSON document {}", path.display()))?;
                    match validate_value(&schema, &workspace.types, &document) {
                        Ok(()) => println!("{} {}", "valid".green().bold(), path.display()),
                        Err(error) => {
                            failed += 1;
                            println!("{} {}: {error}", "invalid".red().bold(), path.display());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} documents are invalid", paths.len());
                }
                Ok(())
            }
        }
    }
}

impl Workspace {
    fn load(settings: &ProjectSettings) -> anyhow::Result<Self> {
        let config = load_config(settings.config.as_deref())?;
        let rules = config.rule_registry()?;
        let mut options = config.compile_options();
        options.keys_optional_by_default |= settings.keys_optional_by_default;

        let patterns: Vec<&str> = config.types.iter().chain(&settings.types).map(String::as_str).collect();
        let mut workspace = Self { types: TypeRegistry::new(), rules, options, sources: HashMap::new() };
        for path in resolve_file_path_patterns(patterns)? {
            workspace.load_type(path)?;
        }
        workspace.check_types()?;
        info!(types = workspace.types.len(), enums = workspace.rules.len(), "workspace loaded");
        Ok(workspace)
    }

    /// Type files are compiled before the others are known, so references
    /// are checked once all of them are registered.
    fn load_type(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("type file {} has no usable name", path.display()))?;
        let name = format!("@{stem}");
        let source = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let options = CompileOptions { check_type_references: false, ..self.options };
        let schema = Compiler::new(&self.types, &self.rules)
            .options(options)
            .file(path.display().to_string())
            .compile(&source)?;
        self.types.insert(name.clone(), schema)?;
        debug!(type_name = %name, path = %path.display(), "type loaded");
        self.sources.insert(name, (path, source));
        Ok(())
    }

    fn check_types(&mut self) -> anyhow::Result<()> {
        if self.options.check_type_references {
            for name in self.types.names() {
                let Some(schema) = self.types.get(name) else { continue };
                collect_user_types(schema, &self.types).map_err(|err| self.report(err.in_type(name), Path::new(""), &[]))?;
            }
        }
        let result = AllOfCompiler::new(&mut self.types).compile_registry();
        result.map_err(|err| self.report(err, Path::new(""), &[]))
    }

    fn compile_file(&self, path: &Path) -> anyhow::Result<Schema> {
        let source = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut schema = Compiler::new(&self.types, &self.rules)
            .options(self.options)
            .file(path.display().to_string())
            .compile(&source)?;
        let mut types = self.types.clone();
        resolve(&mut schema, &mut types).map_err(|err| self.report(err, path, &source))?;
        Ok(schema)
    }

    /// Locates an error in the type file it was raised in, or else in
    /// `source`.
    fn report(&self, err: SchemaError, path: &Path, source: &[u8]) -> anyhow::Error {
        let err = match err.type_name().and_then(|name| self.sources.get(name)) {
            Some((type_path, type_source)) => err.locate(type_source, Some(&type_path.display().to_string())),
            None => err.locate(source, Some(&path.display().to_string())),
        };
        anyhow::Error::new(err)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_config(explicit: Option<&Path>) -> anyhow::Result<ProjectConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(config::DEFAULT_FILE_NAME);
            if !default.exists() {
                return Ok(ProjectConfig::default());
            }
            default
        }
    };
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    ProjectConfig::from_slice(&bytes).with_context(|| format!("invalid project file {}", path.display()))
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}
