mod apply;
mod config;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::{Env, Target};

use pdconf_core::diagnostics::{Diagnostics, Severity};
use pdconf_core::differ::{OperationKind, create_plan};
use pdconf_core::effect::Effect;
use pdconf_core::plan::Plan;
use pdconf_core::provider::Provider;
use pdconf_core::resource::{Resource, ResourceId, Value};
use pdconf_core::schema::ResourceSchema;
use pdconf_provider::resources::resource_types;
use pdconf_provider::schemas::{self, ID_ATTRIBUTE};
use pdconf_provider::{PingDirectoryProvider, ProviderConfig};
use pdconf_state::{StateBackend, StateFile, create_backend};

use apply::{apply_effect, prune_data_sources, refresh_state};
use config::ConfigFile;

#[derive(Parser)]
#[command(name = "pdconf")]
#[command(about = "Declarative External Server management for PingDirectory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "pdconf.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to the configuration file
        #[arg(default_value = "pdconf.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the configuration file
        #[arg(default_value = "pdconf.json")]
        file: PathBuf,
    },
    /// Destroy all resources recorded in the state
    Destroy {
        /// Path to the configuration file
        #[arg(default_value = "pdconf.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Bring an existing External Server under management
    Import {
        /// Resource type (e.g., syslog_external_server)
        resource_type: String,
        /// Name to record the resource under
        name: String,
        /// External Server name on the PingDirectory server
        id: String,

        /// Path to the configuration file
        #[arg(long, short, default_value = "pdconf.json")]
        config: PathBuf,
    },
    /// Show resource type schemas
    Schema {
        /// Resource type to describe (lists all types when omitted)
        resource_type: Option<String>,
    },
    /// Release a stuck state lock
    ForceUnlock {
        /// Lock ID reported by the failed command
        lock_id: String,

        /// Path to the configuration file
        #[arg(long, short, default_value = "pdconf.json")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file).await,
        Commands::Apply { file } => run_apply(&file).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, auto_approve).await,
        Commands::Import {
            resource_type,
            name,
            id,
            config,
        } => run_import(&config, &resource_type, &name, &id).await,
        Commands::Schema { resource_type } => run_schema(resource_type.as_deref()),
        Commands::ForceUnlock { lock_id, config } => run_force_unlock(&config, &lock_id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    let mut all_schemas = HashMap::new();
    for schema in schemas::all_schemas() {
        all_schemas.insert(schema.resource_type.clone(), schema);
    }
    all_schemas
}

/// Check every declared resource against its schema
///
/// Data sources only need the `id` attribute naming an existing object.
fn validate_resources(
    resources: &[Resource],
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<(), String> {
    let mut all_errors = Vec::new();
    let mut server_names = HashSet::new();

    for resource in resources {
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            all_errors.push(format!(
                "{}: Unknown resource type '{}'",
                resource.id, resource.id.resource_type
            ));
            continue;
        };

        if resource.is_data_source() {
            if resource.string_attribute(ID_ATTRIBUTE).is_none() {
                all_errors.push(format!(
                    "{}: Required attribute '{}' is missing",
                    resource.id, ID_ATTRIBUTE
                ));
            }
            continue;
        }

        let mut attributes = resource.attributes.clone();
        schema.apply_defaults(&mut attributes);
        if let Err(errors) = schema.validate(&attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }

        if let Some(server_name) = resource.string_attribute(ID_ATTRIBUTE)
            && !server_names.insert((resource.id.resource_type.as_str(), server_name))
        {
            all_errors.push(format!(
                "{}: External server '{}' is managed by another resource",
                resource.id, server_name
            ));
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed:\n  {}", all_errors.join("\n  ")))
    }
}

/// Load, validate and default the declared resources
fn load_resources(
    config: &ConfigFile,
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<Vec<Resource>, String> {
    let mut resources = config.declared_resources()?;
    validate_resources(&resources, schemas)?;

    for resource in resources.iter_mut().filter(|r| !r.is_data_source()) {
        if let Some(schema) = schemas.get(&resource.id.resource_type) {
            schema.apply_defaults(&mut resource.attributes);
        }
    }
    Ok(resources)
}

fn build_provider(config: &ConfigFile) -> Result<PingDirectoryProvider, String> {
    let settings = ProviderConfig::resolve(&config.provider).map_err(|e| e.to_string())?;
    log::debug!("Provider settings: {:?}", settings);
    PingDirectoryProvider::new(&settings).map_err(|e| e.to_string())
}

fn build_backend(config: &ConfigFile) -> Result<Box<dyn StateBackend>, String> {
    create_backend(&config.backend).map_err(|e| format!("Failed to open state backend: {}", e))
}

async fn read_state(backend: &dyn StateBackend) -> Result<StateFile, String> {
    Ok(backend
        .read_state()
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?
        .unwrap_or_default())
}

async fn save_state(backend: &dyn StateBackend, state: &mut StateFile) -> Result<(), String> {
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}

fn run_validate(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;

    println!("{}", "Validating...".cyan());

    let resources = load_resources(&config, &get_schemas())?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len())
            .green()
            .bold()
    );

    for resource in &resources {
        let kind = if resource.is_data_source() {
            " (data source)"
        } else {
            ""
        };
        println!("  • {}{}", resource.id, kind);
    }

    Ok(())
}

async fn run_plan(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let schemas = get_schemas();
    let resources = load_resources(&config, &schemas)?;
    let provider = build_provider(&config)?;
    let backend = build_backend(&config)?;

    let mut state = read_state(backend.as_ref()).await?;
    for (id, diagnostics) in refresh_state(&provider, &mut state).await? {
        print_diagnostics(&id, &diagnostics);
    }

    let current = state.managed_states().map_err(|e| e.to_string())?;
    let plan = create_plan(&resources, &current, &schemas);
    print_plan(&plan, &schemas);
    Ok(())
}

async fn run_apply(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let schemas = get_schemas();
    let resources = load_resources(&config, &schemas)?;
    let provider = build_provider(&config)?;
    let backend = build_backend(&config)?;

    backend
        .init()
        .await
        .map_err(|e| format!("Failed to initialize state backend: {}", e))?;
    let lock = backend
        .acquire_lock("apply")
        .await
        .map_err(|e| format!("Failed to acquire state lock: {}", e))?;

    let result = apply_locked(&provider, backend.as_ref(), &resources, &schemas).await;

    if let Err(e) = backend.release_lock(&lock).await {
        eprintln!(
            "{} Failed to release state lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
    result
}

async fn apply_locked(
    provider: &dyn Provider,
    backend: &dyn StateBackend,
    resources: &[Resource],
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<(), String> {
    let mut state = read_state(backend).await?;

    let before = state.resources.clone();
    for (id, diagnostics) in refresh_state(provider, &mut state).await? {
        print_diagnostics(&id, &diagnostics);
    }
    prune_data_sources(&mut state, resources);
    if state.resources != before {
        save_state(backend, &mut state).await?;
    }

    let current = state.managed_states().map_err(|e| e.to_string())?;
    let plan = create_plan(resources, &current, schemas);

    if plan.mutation_count() == 0 {
        println!("{}", "No changes needed.".green());
    } else {
        print_plan(&plan, schemas);
        println!();
        println!("{}", "Applying changes...".cyan().bold());
        println!();
    }

    let mut success_count = 0;
    let mut failure_count = 0;
    let mut report = Diagnostics::new();

    for effect in plan.effects() {
        let before = state.resources.clone();
        let result = apply_effect(provider, effect, &mut state).await;

        // A failed replacement may already have deleted the old object
        if state.resources != before {
            save_state(backend, &mut state).await?;
        }

        match result {
            Ok(diagnostics) => {
                if effect.is_mutating() {
                    println!("  {} {}", "✓".green(), format_effect(effect));
                    success_count += 1;
                }
                print_diagnostics(effect.resource_id(), &diagnostics);
                report.extend(diagnostics);
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                report.add_error(format_effect(effect), e.to_string(), None);
                failure_count += 1;
            }
        }
    }

    if plan.mutation_count() == 0 && !report.has_errors() {
        return Ok(());
    }

    println!();
    if !report.has_errors() {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        println!(
            "{}",
            format!(
                "Apply failed. {} succeeded, {} failed.",
                success_count, failure_count
            )
            .red()
            .bold()
        );
        Err(format!("{} of the planned changes failed", failure_count))
    }
}

async fn run_destroy(file: &Path, auto_approve: bool) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let provider = build_provider(&config)?;
    let backend = build_backend(&config)?;

    let lock = backend
        .acquire_lock("destroy")
        .await
        .map_err(|e| format!("Failed to acquire state lock: {}", e))?;

    let result = destroy_locked(&provider, backend.as_ref(), auto_approve).await;

    if let Err(e) = backend.release_lock(&lock).await {
        eprintln!(
            "{} Failed to release state lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
    result
}

async fn destroy_locked(
    provider: &dyn Provider,
    backend: &dyn StateBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = read_state(backend).await?;

    let before = state.resources.clone();
    for (id, diagnostics) in refresh_state(provider, &mut state).await? {
        print_diagnostics(&id, &diagnostics);
    }
    if state.resources != before {
        save_state(backend, &mut state).await?;
    }

    let mut to_destroy: Vec<Effect> = state
        .managed_states()
        .map_err(|e| e.to_string())?
        .into_values()
        .filter_map(|s| {
            let identifier = s.identifier?;
            Some(Effect::Delete { id: s.id, identifier })
        })
        .collect();
    to_destroy.sort_by_key(|e| e.resource_id().to_string());

    if to_destroy.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();

    for effect in &to_destroy {
        if let Effect::Delete { id, identifier } = effect {
            println!("  {} {} ({})", "-".red().bold(), id, identifier);
        }
    }

    println!();
    println!("Plan: {} to destroy.", to_destroy.len().to_string().red());
    println!();

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to destroy all resources?"
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;
    let mut report = Diagnostics::new();

    for effect in &to_destroy {
        match apply_effect(provider, effect, &mut state).await {
            Ok(diagnostics) => {
                save_state(backend, &mut state).await?;
                println!("  {} {}", "✓".green(), format_effect(effect));
                print_diagnostics(effect.resource_id(), &diagnostics);
                report.extend(diagnostics);
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                report.add_error(format_effect(effect), e.to_string(), None);
                failure_count += 1;
            }
        }
    }

    println!();
    if !report.has_errors() {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        println!(
            "{}",
            format!(
                "Destroy failed. {} succeeded, {} failed.",
                success_count, failure_count
            )
            .red()
            .bold()
        );
        Err(format!("{} resources could not be destroyed", failure_count))
    }
}

async fn run_import(
    file: &Path,
    resource_type: &str,
    name: &str,
    identifier: &str,
) -> Result<(), String> {
    if schemas::get_schema_config(resource_type).is_none() {
        return Err(format!("Unknown resource type '{}'", resource_type));
    }

    let config = ConfigFile::load(file)?;
    let provider = build_provider(&config)?;
    let backend = build_backend(&config)?;

    backend
        .init()
        .await
        .map_err(|e| format!("Failed to initialize state backend: {}", e))?;
    let lock = backend
        .acquire_lock("import")
        .await
        .map_err(|e| format!("Failed to acquire state lock: {}", e))?;

    let id = ResourceId::new(resource_type, name);
    let result = import_locked(&provider, backend.as_ref(), &id, identifier).await;

    if let Err(e) = backend.release_lock(&lock).await {
        eprintln!(
            "{} Failed to release state lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
    result
}

async fn import_locked(
    provider: &dyn Provider,
    backend: &dyn StateBackend,
    id: &ResourceId,
    identifier: &str,
) -> Result<(), String> {
    let mut state = read_state(backend).await?;
    if state.find_resource(&id.resource_type, &id.name).is_some() {
        return Err(format!("{} is already managed", id));
    }

    let outcome = provider
        .import(id, identifier)
        .await
        .map_err(|e| format!("Failed to import {}: {}", id, e))?;
    if !outcome.state.exists {
        return Err(format!(
            "Cannot import {}: external server '{}' does not exist",
            id, identifier
        ));
    }

    state.record(&outcome.state, provider.name(), false);
    save_state(backend, &mut state).await?;

    println!(
        "{}",
        format!("Import successful! {} ({}) is now managed.", id, identifier)
            .green()
            .bold()
    );
    print_diagnostics(id, &outcome.diagnostics);
    println!(
        "  {}",
        "Add it to the configuration file, or the next apply will destroy it.".yellow()
    );
    Ok(())
}

fn run_schema(resource_type: Option<&str>) -> Result<(), String> {
    let types = resource_types();

    let Some(resource_type) = resource_type else {
        println!("{}", "Resource types:".cyan().bold());
        for rt in &types {
            let schema = rt.schema();
            println!(
                "  • {} {}",
                rt.name().bold(),
                schema.description.as_deref().unwrap_or_default().dimmed()
            );
        }
        return Ok(());
    };

    let rt = types
        .iter()
        .find(|rt| rt.name() == resource_type)
        .ok_or_else(|| format!("Unknown resource type '{}'", resource_type))?;
    let schema = rt.schema();

    println!("{}", rt.name().cyan().bold());
    if let Some(description) = &schema.description {
        println!("  {}", description);
    }
    println!();

    for attr in schema.attributes() {
        let mut flags = Vec::new();
        if attr.required {
            flags.push("required".to_string());
        }
        if attr.computed {
            flags.push("computed".to_string());
        }
        if attr.sensitive {
            flags.push("sensitive".to_string());
        }
        if attr.read_only {
            flags.push("read-only".to_string());
        }
        if attr.requires_replace {
            flags.push("forces replacement".to_string());
        }
        if let Some(default) = &attr.default {
            flags.push(format!("default {}", default));
        }

        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        println!("  {}: {}{}", attr.name.bold(), attr.attr_type, flags.dimmed());
        if let Some(description) = &attr.description {
            println!("      {}", description.dimmed());
        }
    }
    Ok(())
}

async fn run_force_unlock(file: &Path, lock_id: &str) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let backend = build_backend(&config)?;

    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| format!("Failed to unlock: {}", e))?;

    println!("{}", format!("Lock {} released.", lock_id).green().bold());
    Ok(())
}

fn print_diagnostics(id: &ResourceId, diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        let label = match diagnostic.severity {
            Severity::Warning => "Warning:".yellow().bold(),
            Severity::Error => "Error:".red().bold(),
        };
        println!("    {} {}: {}", label, id, diagnostic);
    }
}

fn print_plan(plan: &Plan, schemas: &HashMap<String, ResourceSchema>) {
    if plan.mutation_count() == 0 {
        println!("{}", "No changes. External servers are up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let schema = schemas.get(&effect.resource_id().resource_type);
        match effect {
            Effect::Read(resource) => {
                println!("  {} {}", "<=".cyan().bold(), resource.id.to_string().cyan());
            }
            Effect::Create(resource) => {
                println!("  {} {}", "+".green().bold(), resource.id.to_string().green());
                let mut keys: Vec<&String> = resource.attributes.keys().collect();
                keys.sort();
                for key in keys {
                    let value = format_value(key, &resource.attributes[key], schema);
                    println!("      {}: {}", key, value.green());
                }
            }
            Effect::Update {
                id,
                from,
                operations,
                ..
            } => {
                println!("  {} {}", "~".yellow().bold(), id.to_string().yellow());
                for op in operations {
                    let old = from
                        .attributes
                        .get(&op.attribute)
                        .map(|v| format_value(&op.attribute, v, schema))
                        .unwrap_or_else(|| "(unset)".to_string());
                    let new = op
                        .value
                        .as_ref()
                        .map(|v| format_value(&op.attribute, v, schema));
                    let line = match (op.kind, new) {
                        (OperationKind::Replace, Some(new)) => {
                            format!("{} → {}", old.red(), new.green())
                        }
                        (OperationKind::Add, Some(new)) => format!("+ {}", new.green()),
                        (OperationKind::Remove, Some(values)) => format!("- {}", values.red()),
                        (_, _) => format!("{} → {}", old.red(), "(unset)".dimmed()),
                    };
                    println!("      {}: {}", op.attribute, line);
                }
            }
            Effect::Replace { from, to } => {
                println!(
                    "  {} {}",
                    "-/+".magenta().bold(),
                    to.id.to_string().magenta()
                );
                let old = from.identifier.as_deref().unwrap_or_default();
                let new = to.string_attribute(ID_ATTRIBUTE).unwrap_or_default();
                println!(
                    "      {}: {} → {} {}",
                    ID_ATTRIBUTE,
                    format!("\"{}\"", old).red(),
                    format!("\"{}\"", new).green(),
                    "(forces replacement)".magenta()
                );
            }
            Effect::Delete { id, identifier } => {
                println!(
                    "  {} {} ({})",
                    "-".red().bold(),
                    id.to_string().red(),
                    identifier
                );
            }
        }
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
}

fn format_effect(effect: &Effect) -> String {
    match effect {
        Effect::Read(r) => format!("Read {}", r.id),
        Effect::Create(r) => format!("Create {}", r.id),
        Effect::Update { id, .. } => format!("Update {}", id),
        Effect::Replace { to, .. } => format!("Replace {}", to.id),
        Effect::Delete { id, .. } => format!("Delete {}", id),
    }
}

/// Display form of a value; sensitive attributes are masked
fn format_value(key: &str, value: &Value, schema: Option<&ResourceSchema>) -> String {
    let sensitive = schema
        .and_then(|s| s.get(key))
        .is_some_and(|attr| attr.sensitive);
    if sensitive {
        "(sensitive)".to_string()
    } else {
        value.to_string()
    }
}
