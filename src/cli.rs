//! Command-line interface: argument parsing, the composition root, and
//! text/json rendering of catalog state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::catalog::{ContainerNode, ContentNode, ContentTree, ItemNode};
use crate::config::{ConfigLoader, MediatreeConfig};
use crate::logging::LoggingConfig;
use crate::media::{ContentCategory, HierarchyMode, MediaIndex};
use crate::types::ROOT_ID;
use crate::watch::Watcher;

#[derive(Parser)]
#[command(
    name = "mediatree",
    version,
    about = "Index media directories into a browsable catalog tree"
)]
pub struct Cli {
    /// Path to a config file (default: platform config dir, then ./mediatree.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan media directories once and print a summary
    Scan {
        /// Directories to index (overrides configured roots)
        dirs: Vec<PathBuf>,
        /// Container layout (flatten, preserve); overrides the config
        #[arg(long)]
        hierarchy: Option<HierarchyMode>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Watch media directories and keep the catalog current
    Watch {
        /// Directories to index (overrides configured roots)
        dirs: Vec<PathBuf>,
        /// Container layout (flatten, preserve); overrides the config
        #[arg(long)]
        hierarchy: Option<HierarchyMode>,
    },
    /// Scan media directories, then show one node of the catalog
    Browse {
        /// Directories to index (overrides configured roots)
        dirs: Vec<PathBuf>,
        /// Node id to show (default: the root container)
        #[arg(long)]
        id: Option<String>,
        /// Container layout (flatten, preserve); overrides the config
        #[arg(long)]
        hierarchy: Option<HierarchyMode>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Commands {
    fn dirs(&self) -> &[PathBuf] {
        match self {
            Commands::Scan { dirs, .. }
            | Commands::Watch { dirs, .. }
            | Commands::Browse { dirs, .. } => dirs,
        }
    }

    fn hierarchy(&self) -> Option<HierarchyMode> {
        match self {
            Commands::Scan { hierarchy, .. }
            | Commands::Watch { hierarchy, .. }
            | Commands::Browse { hierarchy, .. } => *hierarchy,
        }
    }
}

/// What one scan produced, for the `scan` summary output.
#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub roots: Vec<String>,
    pub containers: usize,
    pub items: usize,
    pub resources: usize,
    pub by_category: Vec<CategoryCount>,
    pub duration_ms: u128,
    pub completed_at: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: &'static str,
    pub items: usize,
}

/// One container with its children resolved to titles, for `browse`.
#[derive(Debug, Serialize)]
pub struct ContainerView {
    pub id: String,
    pub title: String,
    pub child_count: usize,
    pub containers: Vec<ChildRow>,
    pub items: Vec<ChildRow>,
}

#[derive(Debug, Serialize)]
pub struct ChildRow {
    pub id: String,
    pub title: String,
}

/// Shared state behind every command: configuration, the node registry,
/// and the indexer wired to it.
pub struct CliContext {
    config: MediatreeConfig,
    roots: Vec<PathBuf>,
    tree: Arc<ContentTree>,
    index: Arc<MediaIndex>,
}

impl CliContext {
    /// Load configuration and build the catalog components for `command`.
    pub fn new(config_path: Option<&Path>, command: &Commands) -> Result<Self> {
        let config = ConfigLoader::load(config_path).context("loading configuration")?;
        let roots = resolve_roots(command.dirs(), &config)?;
        let hierarchy = command.hierarchy().unwrap_or(config.index.hierarchy);
        let tree = Arc::new(ContentTree::new());
        let index = Arc::new(MediaIndex::new(
            Arc::clone(&tree),
            config.index.http_base.clone(),
            hierarchy,
        ));
        Ok(CliContext {
            config,
            roots,
            tree,
            index,
        })
    }

    /// Logging configuration with the level, format, and output flags
    /// applied over the loaded layers. The log file flag goes to
    /// [`init_logging`](crate::logging::init_logging) directly; routed
    /// through the config it would rank below the env override.
    pub fn logging_config(&self, cli: &Cli) -> LoggingConfig {
        let mut logging = self.config.logging.clone();
        if let Some(level) = &cli.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            logging.output = output.clone();
        }
        logging
    }

    /// Execute a CLI command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Scan { format, .. } => self.run_scan(format),
            Commands::Watch { .. } => self.run_watch(),
            Commands::Browse { id, format, .. } => self.run_browse(id.as_deref(), format),
        }
    }

    fn watcher(&self) -> Watcher {
        // method-syntax clone: the Arc<MediaIndex> handle coerces to the
        // listener trait object at the argument
        Watcher::new(self.roots.clone(), self.index.clone())
    }

    fn run_scan(&self, format: &str) -> Result<String> {
        let summary = self.scan();
        if format == "json" {
            return Ok(serde_json::to_string_pretty(&summary)?);
        }
        Ok(render_scan_text(&summary))
    }

    fn run_watch(&self) -> Result<String> {
        self.watcher().run().context("watching media roots")?;
        Ok("watch stopped".to_string())
    }

    fn run_browse(&self, id: Option<&str>, format: &str) -> Result<String> {
        self.watcher().scan_roots();
        let id = id.unwrap_or(ROOT_ID);
        let node = self
            .tree
            .get_node(id)
            .ok_or_else(|| anyhow!("no node with id {id}"))?;
        match node.as_ref() {
            ContentNode::Container(container) => {
                let view = self.container_view(container);
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&view)?)
                } else {
                    Ok(render_container_text(&view))
                }
            }
            ContentNode::Item(item) => {
                if format == "json" {
                    Ok(serde_json::to_string_pretty(item)?)
                } else {
                    Ok(render_item_text(item))
                }
            }
            ContentNode::Resource(resource) => {
                if format == "json" {
                    Ok(serde_json::to_string_pretty(resource)?)
                } else {
                    Ok(format!(
                        "{}\n\n  Id: {}\n  File: {}\n",
                        format_section_heading("Resource"),
                        resource.id,
                        resource.file.display()
                    ))
                }
            }
        }
    }

    fn scan(&self) -> ScanSummary {
        let started = Instant::now();
        self.watcher().scan_roots();
        self.summarize(started)
    }

    fn summarize(&self, started: Instant) -> ScanSummary {
        let mut containers = 0;
        let mut items = 0;
        let mut resources = 0;
        let mut per_category = vec![0usize; ContentCategory::ALL.len()];
        for node in self.tree.nodes() {
            match node.as_ref() {
                ContentNode::Container(_) => containers += 1,
                ContentNode::Item(item) => {
                    items += 1;
                    for (slot, category) in per_category.iter_mut().zip(ContentCategory::ALL) {
                        if item.id.starts_with(category.id_prefix()) {
                            *slot += 1;
                        }
                    }
                }
                ContentNode::Resource(_) => resources += 1,
            }
        }
        let by_category = ContentCategory::ALL
            .iter()
            .zip(per_category)
            .map(|(category, items)| CategoryCount {
                category: category.human_name(),
                items,
            })
            .collect();
        ScanSummary {
            roots: self.roots.iter().map(|p| p.display().to_string()).collect(),
            containers,
            items,
            resources,
            by_category,
            duration_ms: started.elapsed().as_millis(),
            completed_at: Utc::now().to_rfc3339(),
        }
    }

    fn container_view(&self, container: &ContainerNode) -> ContainerView {
        let snapshot = container.snapshot();
        let containers = snapshot
            .containers
            .iter()
            .map(|entry| {
                // Child containers carry a sort key, not a title; resolve
                // the title through the registry.
                let title = self
                    .tree
                    .get_node(&entry.id)
                    .and_then(|node| node.title().map(str::to_string))
                    .unwrap_or_else(|| entry.id.clone());
                ChildRow {
                    id: entry.id.clone(),
                    title,
                }
            })
            .collect();
        let items = snapshot
            .items
            .iter()
            .map(|entry| ChildRow {
                id: entry.id.clone(),
                title: entry.title.clone(),
            })
            .collect();
        ContainerView {
            id: container.id().to_string(),
            title: container.title().to_string(),
            child_count: snapshot.child_count,
            containers,
            items,
        }
    }
}

/// Pick scan roots: command-line directories win over configured roots.
/// Every root is canonicalized so watch events map back to it.
fn resolve_roots(dirs: &[PathBuf], config: &MediatreeConfig) -> Result<Vec<PathBuf>> {
    let chosen: &[PathBuf] = if dirs.is_empty() {
        &config.index.roots
    } else {
        dirs
    };
    if chosen.is_empty() {
        bail!("no media directories given; pass them as arguments or set index.roots in the config");
    }
    let mut roots = Vec::with_capacity(chosen.len());
    for dir in chosen {
        let canonical = dunce::canonicalize(dir)
            .with_context(|| format!("resolving media root {}", dir.display()))?;
        if !canonical.is_dir() {
            bail!("media root {} is not a directory", canonical.display());
        }
        roots.push(canonical);
    }
    Ok(roots)
}

/// Bold/underline heading for text output.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn render_scan_text(summary: &ScanSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Scan Summary")));
    for root in &summary.roots {
        out.push_str(&format!("  Root: {}\n", root));
    }
    out.push_str(&format!("  Completed: {}\n", summary.completed_at));
    out.push_str(&format!("  Duration: {}ms\n\n", summary.duration_ms));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Category", "Items"]);
    for row in &summary.by_category {
        table.add_row(vec![row.category.to_string(), row.items.to_string()]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!(
        "  Containers: {}\n  Items: {}\n  Resources: {}\n",
        summary.containers, summary.items, summary.resources
    ));
    out
}

fn render_container_text(view: &ContainerView) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(&view.title)));
    out.push_str(&format!("  Id: {}\n", view.id));
    out.push_str(&format!("  Children: {}\n\n", view.child_count));
    if view.containers.is_empty() && view.items.is_empty() {
        out.push_str("  (empty)\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "Title", "Id"]);
    for row in &view.containers {
        table.add_row(vec![
            "container".to_string(),
            row.title.clone(),
            row.id.clone(),
        ]);
    }
    for row in &view.items {
        table.add_row(vec!["item".to_string(), row.title.clone(), row.id.clone()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn render_item_text(item: &ItemNode) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(&item.title)));
    out.push_str(&format!("  Id: {}\n", item.id));
    out.push_str(&format!("  File: {}\n", item.file.display()));
    out.push_str(&format!("  Mime: {}\n", item.resource.mime));
    out.push_str(&format!("  Size: {} bytes\n", item.resource.size));
    out.push_str(&format!("  Url: {}\n", item.resource.url));
    if let Some(metadata) = &item.metadata {
        if let Some(artist) = &metadata.artist {
            out.push_str(&format!("  Artist: {}\n", artist));
        }
        if let Some(album) = &metadata.album {
            out.push_str(&format!("  Album: {}\n", album));
        }
    }
    if let Some(art) = &item.art {
        out.push_str(&format!("  Art: {}\n", art.url));
    }
    for subtitle in &item.subtitles {
        out.push_str(&format!("  Subtitle: {} ({})\n", subtitle.url, subtitle.mime));
    }
    out
}
