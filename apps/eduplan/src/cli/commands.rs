//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::config::{Backend, Config};
use crate::remote::{RegisterRequest, RemoteClient};
use eduplan_core::{
    AvailabilityEngine, CatalogDocument, CatalogRegistry, CatalogSource, CourseId,
    CurriculumView, Identity, Planner, PlannerError, Profile, ScheduleKey, StatusChange,
    SubjectId, UserId, WeeklySchedule, demo_registry,
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a catalogs file (10 MB).
const MAX_CATALOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PlannerError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PlannerError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PlannerError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

// =============================================================================
// LOADING
// =============================================================================

/// Load catalog documents from a JSON file (an array of documents).
pub fn load_catalog_file(path: &Path) -> Result<CatalogRegistry, PlannerError> {
    validate_file_size(path, MAX_CATALOG_FILE_SIZE)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| PlannerError::IoError(format!("Cannot read {}: {}", path.display(), e)))?;
    let documents: Vec<CatalogDocument> = serde_json::from_str(&text)
        .map_err(|e| PlannerError::SerializationError(format!("{}: {}", path.display(), e)))?;
    CatalogRegistry::from_documents(documents)
}

/// Build the planner the configuration describes.
pub fn load_planner(config: &Config) -> Result<Planner, PlannerError> {
    let catalogs = match &config.planner.catalogs {
        Some(path) => load_catalog_file(path)?,
        None => demo_registry()?,
    };

    for catalog in catalogs.list_catalogs() {
        for (subject, prerequisite) in catalog.dangling_prerequisites() {
            tracing::warn!(
                catalog = %catalog.key(),
                %subject,
                %prerequisite,
                "prerequisite is not part of the catalog; subject stays locked"
            );
        }
    }

    let planner = match config.storage.backend {
        Backend::Redb => Planner::with_redb(catalogs, &config.storage.database)?,
        Backend::Memory => Planner::new(catalogs),
    };
    Ok(planner.with_enforcement(config.planner.enforce_prerequisites))
}

fn local_identity(user: &str) -> Identity {
    Identity::authenticated(UserId::new(user))
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), PlannerError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let planner = load_planner(&config)?;

    println!("EduPlan Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Backend:  {}", config.storage.backend.as_str());
    println!("  Database: {:?}", config.storage.database);
    println!(
        "  Gating:   {}",
        if planner.enforces_prerequisites() {
            "prerequisites enforced"
        } else {
            "off"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /catalogs                             - List catalogs");
    println!("  GET  /courses/{{id}}/subjects                - Subjects by period");
    println!("  PUT  /users/{{id}}/profile                   - Save profile and course");
    println!("  GET  /users/{{id}}/plan                      - Plan of the profile's course");
    println!("  GET  /users/{{id}}/courses/{{course}}/plan     - Curriculum view");
    println!("  PUT  /users/{{id}}/progress/{{subject}}        - Set a status");
    println!("  GET  /users/{{id}}/schedule                  - Weekly schedule");
    println!("  GET  /health                               - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    api::run_server(&addr, AppState::with_config(planner, config.server)).await
}

// =============================================================================
// CATALOG COMMAND
// =============================================================================

/// List known catalogs.
pub fn cmd_catalogs(config: &Config, json_mode: bool) -> Result<(), PlannerError> {
    let catalogs = match &config.planner.catalogs {
        Some(path) => load_catalog_file(path)?,
        None => demo_registry()?,
    };

    if json_mode {
        let summaries: Vec<api::CatalogSummary> = catalogs
            .list_catalogs()
            .into_iter()
            .map(api::CatalogSummary::from)
            .collect();
        print_json(&summaries);
        return Ok(());
    }

    println!("Catalogs");
    println!("========");
    for catalog in catalogs.list_catalogs() {
        println!(
            "[{}] {} ({} subjects, {} periods)",
            catalog.course_id(),
            catalog.key(),
            catalog.len(),
            catalog.periods().len()
        );
    }
    Ok(())
}

// =============================================================================
// PLAN COMMANDS
// =============================================================================

/// Print a curriculum view.
pub fn print_plan(view: &CurriculumView, json_mode: bool) {
    if json_mode {
        print_json(view);
        return;
    }

    println!("{}", view.catalog);
    println!("{}", "=".repeat(view.catalog.to_string().chars().count()));

    for period in &view.periods {
        println!();
        println!("{}", period.label);
        for subject in &period.subjects {
            let marker = if subject.editable { ' ' } else { '*' };
            println!(
                "  {marker}[{:<11}] {:>6}  {}",
                subject.status.to_string(),
                subject.id,
                subject.name
            );
            let missing: Vec<&str> = subject
                .prerequisites
                .iter()
                .filter(|p| !p.satisfied)
                .map(|p| p.label.as_str())
                .collect();
            if !missing.is_empty() {
                println!("                        needs: {}", missing.join(", "));
            }
        }
    }

    let s = view.summary;
    println!();
    println!(
        "Total {} | completed {} | in progress {} | planned {} | open {} | locked {}",
        s.total, s.completed, s.in_progress, s.planned, s.open, s.locked
    );
}

/// Show a user's curriculum view.
pub fn cmd_plan(
    config: &Config,
    json_mode: bool,
    user: &str,
    course: Option<u64>,
) -> Result<(), PlannerError> {
    let planner = load_planner(config)?;
    let view = planner.plan(&local_identity(user), course.map(CourseId))?;
    print_plan(&view, json_mode);
    Ok(())
}

// =============================================================================
// PROFILE COMMANDS
// =============================================================================

fn print_profile(planner: &Planner, profile: Option<Profile>, json_mode: bool) {
    let course_id = profile
        .as_ref()
        .and_then(|p| p.catalog.as_ref())
        .and_then(|key| planner.catalogs().catalog_for_key(key))
        .map(|catalog| catalog.course_id());

    if json_mode {
        print_json(&api::ProfileResponse::success(profile, course_id));
        return;
    }

    let Some(profile) = profile else {
        println!("(no profile)");
        return;
    };
    println!("Name:   {}", profile.name);
    if !profile.email.is_empty() {
        println!("Email:  {}", profile.email);
    }
    match (&profile.catalog, course_id) {
        (Some(key), Some(course_id)) => println!("Course: [{course_id}] {key}"),
        (Some(key), None) => println!("Course: {key} (not loaded)"),
        (None, _) => println!("Course: (none selected)"),
    }
}

/// Show a user's profile.
pub fn cmd_profile(config: &Config, json_mode: bool, user: &str) -> Result<(), PlannerError> {
    let planner = load_planner(config)?;
    let profile = planner.profile(&local_identity(user))?;
    print_profile(&planner, profile, json_mode);
    Ok(())
}

/// Save a user's profile; `course` selects the catalog by course id.
pub fn cmd_profile_set(
    config: &Config,
    json_mode: bool,
    user: &str,
    name: String,
    email: String,
    course: Option<u64>,
) -> Result<(), PlannerError> {
    let mut planner = load_planner(config)?;
    let mut profile = Profile::new(name, email);
    if let Some(course) = course {
        let course_id = CourseId(course);
        let catalog = planner
            .catalogs()
            .catalog_for_course(course_id)
            .ok_or(PlannerError::CatalogNotFound(course_id))?;
        profile = profile.with_catalog(catalog.key().clone());
    }
    let saved = planner.set_profile(&local_identity(user), profile)?;
    print_profile(&planner, Some(saved), json_mode);
    Ok(())
}

/// Mark a subject.
pub fn cmd_set_status(
    config: &Config,
    json_mode: bool,
    user: &str,
    subject: &str,
    status: &str,
    course: Option<u64>,
) -> Result<(), PlannerError> {
    let change: StatusChange = status.parse()?;
    change_status(config, json_mode, user, subject, change, course.map(CourseId))
}

/// Clear a subject's status.
pub fn cmd_clear_status(
    config: &Config,
    json_mode: bool,
    user: &str,
    subject: &str,
    course: Option<u64>,
) -> Result<(), PlannerError> {
    change_status(
        config,
        json_mode,
        user,
        subject,
        StatusChange::Remove,
        course.map(CourseId),
    )
}

fn change_status(
    config: &Config,
    json_mode: bool,
    user: &str,
    subject: &str,
    change: StatusChange,
    course: Option<CourseId>,
) -> Result<(), PlannerError> {
    let mut planner = load_planner(config)?;
    let subject_id = SubjectId::new(subject);
    let (course_id, progress) =
        planner.change_status(&local_identity(user), &subject_id, change, course)?;

    if json_mode {
        print_json(&api::ProgressResponse::success(
            UserId::new(user),
            course_id,
            progress,
        ));
        return Ok(());
    }

    match progress.status(&subject_id) {
        Some(status) => println!("{user}: [{course_id}] {subject_id} -> {status}"),
        None => println!("{user}: [{course_id}] {subject_id} cleared"),
    }
    println!("Recorded statuses: {}", progress.len());
    Ok(())
}

// =============================================================================
// SCHEDULE COMMANDS
// =============================================================================

fn print_schedule(schedule: &WeeklySchedule, json_mode: bool) {
    if json_mode {
        print_json(schedule);
        return;
    }
    if schedule.is_empty() {
        println!("(empty schedule)");
        return;
    }
    for (key, label) in schedule.iter() {
        println!("{:<16} {}", key.to_string(), label);
    }
}

/// Show a user's weekly schedule.
pub fn cmd_schedule(config: &Config, json_mode: bool, user: &str) -> Result<(), PlannerError> {
    let planner = load_planner(config)?;
    print_schedule(&planner.schedule(&local_identity(user))?, json_mode);
    Ok(())
}

/// Write one schedule cell.
pub fn cmd_schedule_set(
    config: &Config,
    json_mode: bool,
    user: &str,
    day: &str,
    time: &str,
    label: &str,
) -> Result<(), PlannerError> {
    let key = ScheduleKey::new(day.parse()?, time.parse()?);
    let mut planner = load_planner(config)?;
    let schedule = planner.set_schedule_entry(&local_identity(user), key, label)?;
    print_schedule(&schedule, json_mode);
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(config: &Config, force: bool) -> Result<(), PlannerError> {
    let db_path = &config.storage.database;

    if config.storage.backend == Backend::Memory {
        println!("Memory backend selected; nothing to initialize");
        return Ok(());
    }

    if db_path.exists() {
        if !force {
            return Err(PlannerError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| PlannerError::IoError(format!("Cannot remove {:?}: {}", db_path, e)))?;
    }

    let _planner = load_planner(config)?;
    println!("Initialized new redb database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// REMOTE COMMAND
// =============================================================================

fn remote_client(config: &Config) -> Result<RemoteClient, PlannerError> {
    Ok(RemoteClient::new(
        &config.remote.url,
        Duration::from_secs(config.remote.timeout_secs),
    )?)
}

/// Log in to the remote service, optionally update one subject, and show
/// the resulting plan. Without `course`, the account's course is used.
pub async fn cmd_remote_plan(
    config: &Config,
    json_mode: bool,
    username: &str,
    password: &str,
    course: Option<u64>,
    mark: Option<(String, StatusChange)>,
) -> Result<(), PlannerError> {
    let mut client = remote_client(config)?;
    let user = client.login(username, password).await?;

    let course_id = match course {
        Some(course) => CourseId(course),
        None => CourseId(client.current_account().await?.course),
    };
    let remote_course = client.course(course_id).await?;
    let catalog = client.catalog(&remote_course).await?;

    if let Some((subject, change)) = mark {
        let subject_id = SubjectId::new(subject);
        if config.planner.enforce_prerequisites {
            let current = client.progress(&user).await?;
            AvailabilityEngine::apply_status_change_checked(
                &catalog,
                &current,
                &subject_id,
                change,
            )?;
        }
        client.apply_change(&subject_id, change).await?;
        tracing::info!(user = %user, subject = %subject_id, ?change, "remote status updated");
    }

    let progress = client.progress(&user).await?;
    print_plan(&CurriculumView::compose(&catalog, &progress), json_mode);
    Ok(())
}

/// Create an account on the remote service.
pub async fn cmd_remote_register(
    config: &Config,
    json_mode: bool,
    request: &RegisterRequest,
) -> Result<(), PlannerError> {
    let mut client = remote_client(config)?;
    let account = client.register(request).await?;

    if json_mode {
        print_json(&account);
        return Ok(());
    }
    println!(
        "Registered account {} ({}) for course {}",
        account.id, account.name, account.course
    );
    Ok(())
}
