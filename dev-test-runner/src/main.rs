//! Runs the schema fixtures listed in a manifest file.
//!
//! usage: dev-test-runner [manifest.json]
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use jsight_schema::compiler::{AllOfCompiler, CompileOptions, Compiler};
use jsight_schema::{RuleRegistry, Schema, TypeRegistry, resolve, validate_value};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    schema: String,
    /// Type name to source, registered in order.
    #[serde(default)]
    types: Vec<(String, String)>,
    /// Regex the compile or resolve error must match; success expected when absent.
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    valid: Vec<Value>,
    #[serde(default)]
    invalid: Vec<Value>,
    /// Expected compact example text.
    #[serde(default)]
    example: Option<String>,
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/manifest.json")));
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_slice(&bytes);
    let cases: Vec<Case> = serde_path_to_error::deserialize(de)
        .map_err(|err| anyhow::anyhow!("at JSON path {} → {}", err.path(), err.inner()))?;

    let mut failed = 0;
    for case in &cases {
        match run_case(case) {
            Ok(()) => println!("{} {}", "pass".green().bold(), case.name),
            Err(error) => {
                failed += 1;
                println!("{} {}: {error:#}", "FAIL".red().bold(), case.name);
            }
        }
    }
    println!("{} of {} fixtures passed", cases.len() - failed, cases.len());
    if failed > 0 {
        bail!("{failed} fixtures failed");
    }
    Ok(())
}

fn run_case(case: &Case) -> Result<()> {
    let outcome = compile_case(case);
    let (schema, types) = match (&case.error, outcome) {
        (None, Ok(compiled)) => compiled,
        (None, Err(error)) => bail!("unexpected error: {error}"),
        (Some(pattern), Ok(_)) => bail!("expected an error matching {pattern:?}"),
        (Some(pattern), Err(error)) => {
            let re = Regex::new(pattern).with_context(|| format!("bad error pattern {pattern:?}"))?;
            if !re.is_match(&error.to_string()) {
                bail!("error {error:?} does not match {pattern:?}");
            }
            return Ok(());
        }
    };

    for document in &case.valid {
        validate_value(&schema, &types, document).with_context(|| format!("rejected valid document {document}"))?;
    }
    for document in &case.invalid {
        if validate_value(&schema, &types, document).is_ok() {
            bail!("accepted invalid document {document}");
        }
    }
    let example = schema.example(&types)?;
    validate_value(&schema, &types, &example).with_context(|| format!("rejected its own example {example}"))?;
    if let Some(expected) = &case.example {
        if example.to_string() != *expected {
            bail!("example {example} differs from {expected}");
        }
    }
    Ok(())
}

fn compile_case(case: &Case) -> std::result::Result<(Schema, TypeRegistry), jsight_schema::SchemaError> {
    let rules = RuleRegistry::new();
    let mut types = TypeRegistry::new();
    let unchecked = CompileOptions { check_type_references: false, ..CompileOptions::default() };
    for (name, source) in &case.types {
        let schema = Compiler::new(&types, &rules).options(unchecked).compile(source.as_bytes())?;
        types.insert(name.clone(), schema)?;
    }
    AllOfCompiler::new(&mut types).compile_registry()?;
    let mut schema = Compiler::new(&types, &rules).compile(case.schema.as_bytes())?;
    resolve(&mut schema, &mut types)?;
    Ok((schema, types))
}
