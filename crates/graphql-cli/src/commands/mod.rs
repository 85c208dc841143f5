pub mod typegen;
pub mod validate;

use anyhow::{Context, Result};
use colored::Colorize;
use graphql_config::{find_config, load_config, ProjectConfig};
use graphql_typegen::LocatedError;
use std::path::{Path, PathBuf};

/// A project selected from the config, with the directory its paths are
/// relative to
pub struct SelectedProject {
    pub name: String,
    pub config: ProjectConfig,
    pub base_dir: PathBuf,
}

/// Load the config (given or discovered from the current directory) and pick
/// the requested project, or all of them
pub fn select_projects(
    config_path: Option<PathBuf>,
    project_name: Option<&str>,
) -> Result<Vec<SelectedProject>> {
    let config_path = if let Some(path) = config_path {
        path
    } else {
        let current_dir = std::env::current_dir()?;
        find_config(&current_dir)
            .context("Failed to search for config")?
            .context("No GraphQL config file found")?
    };

    let config = load_config(&config_path).context("Failed to load config")?;
    let base_dir = config_path
        .parent()
        .context("Failed to get config directory")?
        .to_path_buf();

    let projects: Vec<_> = config
        .projects()
        .into_iter()
        .filter(|(name, _)| project_name.is_none_or(|wanted| wanted == *name))
        .map(|(name, project)| SelectedProject {
            name: name.to_string(),
            config: project.clone(),
            base_dir: base_dir.clone(),
        })
        .collect();

    if projects.is_empty() {
        if let Some(name) = project_name {
            anyhow::bail!("Project '{name}' not found");
        }
    }

    Ok(projects)
}

/// `file:line:col message`, path relative to `root`
pub fn print_located_error(error: &LocatedError, root: &Path) {
    println!(
        "{} {}",
        error.display_location(root).cyan(),
        error.message.red()
    );
}
