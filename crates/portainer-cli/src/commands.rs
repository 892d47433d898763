use crate::cli::{Commands, ContainerTarget, OutputFormat};
use crate::error::{CliError, Result};
use chrono::DateTime;
use colored::*;
use portainer_client::{
    Container, ContainerState, Environment, EnvironmentFilter, EnvironmentId, Portainer,
    PortainerError, StatsSummary,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::debug;

pub struct CommandHandler {
    client: Portainer,
    output_format: OutputFormat,
}

#[derive(Tabled)]
struct EnvironmentRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    environment_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Containers")]
    containers: usize,
}

#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl CommandHandler {
    pub fn new(client: Portainer) -> Self {
        Self {
            client,
            output_format: OutputFormat::Table,
        }
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub async fn execute(&self, command: Commands) -> Result<()> {
        self.client.login().await?;

        match command {
            Commands::Login => {
                println!("{}", self.login_message());
                Ok(())
            }
            Commands::Environments {
                start,
                limit,
                group_ids,
                endpoint_ids,
            } => {
                let filter = build_filter(start, limit, group_ids, endpoint_ids);
                self.list_environments(&filter).await
            }
            Commands::Containers { environment } => self.list_containers(environment).await,
            Commands::Stats(target) => self.show_stats(&target).await,
            Commands::ImageStatus(target) => self.show_image_status(&target).await,
            Commands::Start(target) => {
                self.find_container(&target).await?.start().await?;
                self.report(&target, "started");
                Ok(())
            }
            Commands::Stop(target) => {
                self.find_container(&target).await?.stop().await?;
                self.report(&target, "stopped");
                Ok(())
            }
            Commands::Restart(target) => {
                self.find_container(&target).await?.restart().await?;
                self.report(&target, "restarted");
                Ok(())
            }
            Commands::Recreate { target, no_pull } => self.recreate(&target, !no_pull).await,
        }
    }

    async fn list_environments(&self, filter: &EnvironmentFilter) -> Result<()> {
        let environments = self.client.load_environments(filter).await?;

        match self.output_format {
            OutputFormat::Json => {
                let values: Vec<Value> = environments.iter().map(environment_json).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            }
            OutputFormat::Table => {
                if environments.is_empty() {
                    println!("{}", "No environments found".yellow());
                    return Ok(());
                }
                let rows: Vec<EnvironmentRow> = environments.iter().map(environment_row).collect();
                println!("{}", Table::new(rows));
            }
        }
        Ok(())
    }

    async fn list_containers(&self, environment_id: EnvironmentId) -> Result<()> {
        let environment = self.fetch_environment(environment_id).await?;

        match self.output_format {
            OutputFormat::Json => {
                let values: Vec<Value> = environment
                    .containers()
                    .values()
                    .map(|container| container_json(container))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            }
            OutputFormat::Table => {
                println!(
                    "{} {} ({})",
                    "Environment".bold(),
                    environment.name().cyan(),
                    environment.status()
                );
                if environment.containers().is_empty() {
                    println!("{}", "No containers reported".yellow());
                    return Ok(());
                }
                let rows: Vec<ContainerRow> = environment
                    .containers()
                    .values()
                    .map(|container| container_row(container))
                    .collect();
                println!("{}", Table::new(rows));
            }
        }
        Ok(())
    }

    async fn show_stats(&self, target: &ContainerTarget) -> Result<()> {
        let container = self.find_container(target).await?;
        let stats = container.get_stats().await?;

        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Table => {
                let summary = container.stats_summary().unwrap_or_default();
                println!("{}", format_stats(container.name(), &summary));
            }
        }
        Ok(())
    }

    async fn show_image_status(&self, target: &ContainerTarget) -> Result<()> {
        let container = self.find_container(target).await?;
        let status = container.get_image_status().await?;

        match self.output_format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&json!({"name": container.name(), "image_status": status}))?
            ),
            OutputFormat::Table => {
                let colored_status = match status.as_str() {
                    "updated" => status.green(),
                    "outdated" => status.yellow(),
                    _ => status.normal(),
                };
                println!("{}: {}", container.name().bold(), colored_status);
            }
        }
        Ok(())
    }

    async fn recreate(&self, target: &ContainerTarget, pull_image: bool) -> Result<()> {
        let container = self.find_container(target).await?;
        let previous_id = container.id();
        let body = container.recreate(pull_image).await?;

        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
            OutputFormat::Table => println!(
                "{} {} recreated ({} -> {})",
                "✓".green(),
                container.name().bold(),
                short_id(&previous_id),
                short_id(&container.id())
            ),
        }
        Ok(())
    }

    async fn fetch_environment(&self, environment_id: EnvironmentId) -> Result<Environment> {
        match self.client.environment(environment_id).await {
            Err(PortainerError::Api(api)) if api.status == 404 => {
                Err(CliError::EnvironmentNotFound(environment_id))
            }
            other => Ok(other?),
        }
    }

    async fn find_container(&self, target: &ContainerTarget) -> Result<Arc<Container>> {
        let environment = self.fetch_environment(target.environment).await?;
        debug!(
            "Environment {} reports {} containers",
            environment.id(),
            environment.containers().len()
        );

        environment
            .container(&target.name)
            .ok_or_else(|| CliError::ContainerNotFound {
                environment: target.environment,
                name: target.name.clone(),
            })
    }

    fn login_message(&self) -> String {
        let base_url = self.client.session().credentials().base_url().to_string();
        match self.output_format {
            OutputFormat::Json => json!({"result": "logged_in", "url": base_url}).to_string(),
            OutputFormat::Table => format!("{} Logged in to {}", "✓".green(), base_url),
        }
    }

    fn report(&self, target: &ContainerTarget, verb: &str) {
        match self.output_format {
            OutputFormat::Json => println!(
                "{}",
                json!({"environment": target.environment, "name": target.name, "result": verb})
            ),
            OutputFormat::Table => println!("{} {} {}", "✓".green(), target.name.bold(), verb),
        }
    }
}

fn build_filter(
    start: Option<u32>,
    limit: Option<u32>,
    group_ids: Vec<i64>,
    endpoint_ids: Vec<i64>,
) -> EnvironmentFilter {
    let mut filter = EnvironmentFilter::new();
    if let Some(start) = start {
        filter = filter.with_start(start);
    }
    if let Some(limit) = limit {
        filter = filter.with_limit(limit);
    }
    if !group_ids.is_empty() {
        filter = filter.with_group_ids(group_ids);
    }
    if !endpoint_ids.is_empty() {
        filter = filter.with_endpoint_ids(endpoint_ids);
    }
    filter
}

fn environment_row(environment: &Environment) -> EnvironmentRow {
    let status = if environment.status().is_up() {
        environment.status().to_string().green().to_string()
    } else {
        environment.status().to_string().red().to_string()
    };

    EnvironmentRow {
        id: environment.id(),
        name: environment.name().to_string(),
        environment_type: environment.environment_type().to_string(),
        status,
        url: environment.url().to_string(),
        containers: environment.containers().len(),
    }
}

fn environment_json(environment: &Environment) -> Value {
    json!({
        "id": environment.id(),
        "name": environment.name(),
        "type": environment.environment_type(),
        "status": environment.status(),
        "url": environment.url(),
        "group_id": environment.group_id(),
        "public_url": environment.public_url(),
        "status_message": environment.status_message().map(ToString::to_string),
        "containers": environment.container_names(),
    })
}

fn container_row(container: &Container) -> ContainerRow {
    let details = container.details();
    ContainerRow {
        name: container.name().to_string(),
        id: short_id(&details.container_id).to_string(),
        image: details.image,
        state: colored_state(&details.state),
        status: details.status,
        created: format_created(details.created),
    }
}

fn container_json(container: &Container) -> Value {
    let details = container.details();
    json!({
        "name": container.name(),
        "id": details.container_id,
        "image": details.image,
        "image_id": details.image_id,
        "state": details.state,
        "status": details.status,
        "created": details.created,
    })
}

fn colored_state(state: &ContainerState) -> String {
    let text = state.to_string();
    match state {
        ContainerState::Running => text.green().to_string(),
        ContainerState::Exited | ContainerState::Dead => text.red().to_string(),
        _ => text.yellow().to_string(),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn format_created(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|created| created.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

fn format_stats(name: &str, summary: &StatsSummary) -> String {
    format!(
        "{}\n  CPU:    {:.2}%\n  Memory: {} / {} ({:.1}%)",
        name.bold(),
        summary.cpu_usage_percent,
        format_bytes(summary.memory_usage_bytes),
        format_bytes(summary.memory_limit_bytes),
        summary.memory_usage_percent()
    )
}
