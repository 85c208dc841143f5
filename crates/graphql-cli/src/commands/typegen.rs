use super::{print_located_error, select_projects};
use anyhow::{Context, Result};
use colored::Colorize;
use graphql_typegen::{Extractor, SchemaLoader, TypeGenerator, TypeScriptCompiler};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;

pub async fn run(
    config_path: Option<PathBuf>,
    project_name: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let projects = select_projects(config_path, project_name.as_deref())?;

    let mut total_errors = 0;
    let mut total_files = 0;

    for project in &projects {
        if projects.len() > 1 {
            println!("\n{}", format!("=== Project: {} ===", project.name).bold().cyan());
        }

        let typegen = project.config.typegen()?;

        let schema = SchemaLoader::new(project.config.schema.clone())
            .with_base_path(&project.base_dir)
            .load()
            .await
            .context("Failed to load schema")?;
        println!("{}", "✓ Schema loaded successfully".green());

        let extractor = Extractor::from_project(&project.config)?.with_base_path(&project.base_dir);
        let files = extractor.find_files()?;

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} Extracting [{bar:30}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        for file in &files {
            progress.set_message(
                file.strip_prefix(&project.base_dir)
                    .unwrap_or(file)
                    .display()
                    .to_string(),
            );
            match extractor.extract_file(file) {
                Ok(file_results) => results.extend(file_results),
                Err(e) => skipped.push((file, e)),
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        for (file, e) in &skipped {
            eprintln!(
                "{} {}: {e}",
                "✗ Skipped".red(),
                file.strip_prefix(&project.base_dir).unwrap_or(file).display()
            );
        }
        total_errors += skipped.len();

        let compiler = TypeScriptCompiler::new().with_scalars(typegen.scalars);
        let output = TypeGenerator::new(&project.base_dir, compiler)
            .with_output_extension(typegen.output_extension)
            .generate(&results, &schema)?;

        for file in &output.outputs {
            let display = file
                .file_name
                .strip_prefix(&project.base_dir)
                .unwrap_or(&file.file_name)
                .display();

            if dry_run {
                println!("{} {display}", "would write".dimmed());
                continue;
            }

            if let Some(parent) = file.file_name.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&file.file_name, &file.content)
                .await
                .with_context(|| format!("Failed to write {display}"))?;
            println!("{} {display}", "wrote".green());
        }

        for error in &output.errors {
            print_located_error(error, &project.base_dir);
        }

        total_files += output.outputs.len();
        total_errors += output.errors.len();
    }

    println!();
    if total_errors == 0 {
        println!(
            "{}",
            format!("✓ Generated {total_files} file(s)").green().bold()
        );
    } else {
        println!(
            "{}",
            format!("Generated {total_files} file(s), found {total_errors} error(s)").yellow()
        );
        process::exit(1);
    }

    Ok(())
}
