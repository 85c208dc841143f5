use super::{print_located_error, select_projects};
use crate::OutputFormat;
use anyhow::{Context, Result};
use colored::Colorize;
use graphql_typegen::{Extractor, SchemaLoader, Validator};
use std::path::PathBuf;
use std::process;

pub async fn run(
    config_path: Option<PathBuf>,
    project_name: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let projects = select_projects(config_path, project_name.as_deref())?;

    let mut total_errors = 0;

    for project in &projects {
        let human = matches!(format, OutputFormat::Human);
        if human && projects.len() > 1 {
            println!("\n{}", format!("=== Project: {} ===", project.name).bold().cyan());
        }

        let schema = match SchemaLoader::new(project.config.schema.clone())
            .with_base_path(&project.base_dir)
            .load()
            .await
        {
            Ok(schema) => {
                if human {
                    println!("{}", "✓ Schema loaded successfully".green());
                }
                schema
            }
            Err(e) => {
                if human {
                    eprintln!("{} {}", "✗ Schema error:".red(), e);
                } else {
                    eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
                }
                process::exit(1);
            }
        };

        let extractor =
            Extractor::from_project(&project.config)?.with_base_path(&project.base_dir);
        let files = extractor
            .find_files()
            .context("Failed to find documents")?;

        let mut results = Vec::new();
        for file in &files {
            match extractor.extract_file(file) {
                Ok(file_results) => results.extend(file_results),
                Err(e) => {
                    total_errors += 1;
                    match format {
                        OutputFormat::Human => eprintln!(
                            "{} {}: {e}",
                            "✗ Failed to extract GraphQL from".red(),
                            file.strip_prefix(&project.base_dir).unwrap_or(file).display()
                        ),
                        OutputFormat::Json => println!(
                            "{}",
                            serde_json::json!({ "file": file, "message": e.to_string() })
                        ),
                    }
                }
            }
        }
        if human {
            println!(
                "{} ({} literals)",
                "✓ Documents loaded successfully".green(),
                results.len()
            );
        }

        let validator = Validator::new(&schema).with_fragments(&results);
        for result in &results {
            for error in validator.validate(result) {
                total_errors += 1;
                match format {
                    OutputFormat::Human => print_located_error(&error, &project.base_dir),
                    OutputFormat::Json => {
                        let start = error.start_position();
                        println!(
                            "{}",
                            serde_json::json!({
                                "file": error.file_name,
                                "message": error.message,
                                "start": error.start,
                                "end": error.end,
                                "line": start.line + 1,
                                "column": start.column + 1,
                            })
                        );
                    }
                }
            }
        }
    }

    if matches!(format, OutputFormat::Human) {
        println!();
        if total_errors == 0 {
            println!("{}", "✓ All validations passed!".green().bold());
        } else {
            println!("{}", format!("Found {total_errors} error(s)").yellow());
        }
    }

    if total_errors > 0 {
        process::exit(1);
    }

    Ok(())
}
