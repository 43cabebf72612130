//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::services::ServiceConfig;
use plandeck_core::{PlandeckError, Snapshot, Workspace};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_IMPORT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PlandeckError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PlandeckError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PlandeckError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it is
/// an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PlandeckError> {
    let canonical = path.canonicalize().map_err(|e| {
        PlandeckError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PlandeckError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, PlandeckError> {
    let parent = path.parent().unwrap_or(Path::new("."));

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PlandeckError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(PlandeckError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| PlandeckError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// WORKSPACE LOADING
// =============================================================================

/// Open the workspace for the selected backend.
fn load_workspace(db_path: &Path, backend: &str) -> Result<Workspace, PlandeckError> {
    match backend {
        "memory" => Ok(Workspace::new()),
        "redb" => Workspace::with_redb(db_path),
        other => Err(PlandeckError::InvalidInput(format!(
            "unknown backend '{}' (expected 'redb' or 'memory')",
            other
        ))),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: &str,
    host: &str,
    port: u16,
) -> Result<(), PlandeckError> {
    let workspace = load_workspace(db_path, backend)?;
    let services = ServiceConfig::from_env();

    println!("Plandeck Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", host);
    println!("  Port:      {}", port);
    println!("  Backend:   {}", backend);
    println!("  Database:  {:?}", db_path);
    println!("  Detection: {}", services.detect_url);
    println!("  CDN:       {}", services.cdn_url);
    println!();
    println!("Endpoints:");
    println!("  GET  /health                  - Health check");
    println!("  GET  /status                  - Record counts");
    println!("  POST /projects                - Create project / append pages");
    println!("  POST /canvas/detect/{{kind}}    - Run a detection kind");
    println!("  POST /canvas/layer-visibility - Resolve a layer image");
    println!("  POST /canvas/viewer           - Open a viewer session");
    println!("  ...  /invoices /takeoffs /calendar - CRUD");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, workspace, &services).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show workspace record counts.
pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), PlandeckError> {
    let workspace = load_workspace(db_path, backend)?;
    let counts = workspace.counts()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "projects": counts.projects,
            "invoices": counts.invoices,
            "takeoffs": counts.takeoffs,
            "calendar_events": counts.calendar_events,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("Workspace Status");
        println!("  Database:        {:?}", db_path);
        println!("  Backend:         {}", backend);
        println!("  Projects:        {}", counts.projects);
        println!("  Invoices:        {}", counts.invoices);
        println!("  Takeoffs:        {}", counts.takeoffs);
        println!("  Calendar events: {}", counts.calendar_events);
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), PlandeckError> {
    if backend != "redb" {
        return Err(PlandeckError::InvalidInput(
            "init only applies to the redb backend".to_string(),
        ));
    }

    if db_path.exists() {
        if !force {
            return Err(PlandeckError::InvalidInput(format!(
                "Database {:?} already exists (use --force to overwrite)",
                db_path
            )));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| PlandeckError::IoError(format!("Cannot remove database: {}", e)))?;
    }

    let workspace = Workspace::with_redb(db_path)?;
    let counts = workspace.counts()?;
    println!(
        "Initialized empty database at {:?} ({} projects)",
        db_path, counts.projects
    );
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export all records to a JSON file.
pub fn cmd_export(db_path: &Path, backend: &str, output: &Path) -> Result<(), PlandeckError> {
    let output = validate_output_path(output)?;
    let workspace = load_workspace(db_path, backend)?;
    let snapshot = workspace.snapshot()?;

    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| PlandeckError::SerializationError(e.to_string()))?;
    std::fs::write(&output, json)
        .map_err(|e| PlandeckError::IoError(format!("Cannot write {:?}: {}", output, e)))?;

    println!(
        "Exported {} projects, {} invoices, {} takeoffs, {} events to {:?}",
        snapshot.projects.len(),
        snapshot.invoices.len(),
        snapshot.takeoffs.len(),
        snapshot.calendar_events.len(),
        output
    );
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import records from a JSON file.
pub fn cmd_import(db_path: &Path, backend: &str, input: &Path) -> Result<(), PlandeckError> {
    let input = validate_file_path(input)?;
    validate_file_size(&input, MAX_IMPORT_FILE_SIZE)?;

    let json = std::fs::read_to_string(&input)
        .map_err(|e| PlandeckError::IoError(format!("Cannot read {:?}: {}", input, e)))?;
    let snapshot: Snapshot = serde_json::from_str(&json)
        .map_err(|e| PlandeckError::SerializationError(e.to_string()))?;

    let mut workspace = load_workspace(db_path, backend)?;
    workspace.restore(&snapshot)?;

    println!(
        "Imported {} projects, {} invoices, {} takeoffs, {} events from {:?}",
        snapshot.projects.len(),
        snapshot.invoices.len(),
        snapshot.takeoffs.len(),
        snapshot.calendar_events.len(),
        input
    );
    Ok(())
}
