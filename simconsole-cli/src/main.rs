//! `SimConsole` CLI - Command-line interface for the `SimConsole` address book
//!
//! Provides commands for listing, adding, editing and deleting connections
//! and groups, refreshing dynamic group rosters and setting display
//! preferences.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use simconsole_core::{
    logging, AddressBook, ConfigManager, Connection, ConnectionDraft, ConnectionGroup,
    ConsoleManager, DialogProvider, EditOutcome, Entity, GroupDraft, HttpRosterFetcher,
    LoadOutcome, RosterDispatcher, RosterRequest, DEFAULT_ROSTER_PORT,
};
use uuid::Uuid;

/// `SimConsole` command-line interface for managing console connections
#[derive(Parser)]
#[command(name = "simconsole")]
#[command(author, version, about = "SimConsole command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List all connections
    #[command(about = "List all connections in the address book")]
    List {
        /// Output format for the connection list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Filter connections by group name
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Show connection details
    #[command(about = "Show connection details")]
    Show {
        /// Connection name or UUID
        name: String,
    },

    /// Add a new connection
    #[command(about = "Add a new connection to the address book")]
    Add {
        /// Name for the new connection
        #[arg(short, long)]
        name: String,

        /// Host address (hostname or IP)
        #[arg(short = 'H', long)]
        host: String,

        /// Console port
        #[arg(short, long, default_value_t = DEFAULT_ROSTER_PORT)]
        port: u16,

        /// Username for the console login
        #[arg(short, long, default_value = "")]
        user: String,

        /// Password for the console login
        #[arg(long, default_value = "")]
        pass: String,

        /// Static group to add the connection to
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Update a connection
    #[command(about = "Update an existing connection")]
    Update {
        /// Connection name or UUID
        name: String,

        #[command(flatten)]
        fields: ConnectionFields,
    },

    /// Rename a connection or a group
    #[command(about = "Rename a connection or a group")]
    Rename {
        /// Current name or UUID
        name: String,

        /// New name
        new_name: String,
    },

    /// Delete a connection
    #[command(about = "Delete a connection")]
    Delete {
        /// Connection name or UUID
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or change display preferences
    #[command(about = "Show or change console display preferences")]
    Prefs {
        /// Render consoles as black text on white
        #[arg(long)]
        black_on_white: Option<bool>,

        /// Use the system font in consoles
        #[arg(long)]
        system_font: Option<bool>,
    },

    /// Manage connection groups
    #[command(subcommand, about = "Manage connection groups")]
    Group(GroupCommands),
}

/// Connection fields that can be changed by `update`
#[derive(clap::Args, Debug, Default)]
pub struct ConnectionFields {
    /// New host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// New port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// New username
    #[arg(short, long)]
    pub user: Option<String>,

    /// New password
    #[arg(long)]
    pub pass: Option<String>,
}

/// Group fields that can be set by `group create` and `group edit`
#[derive(clap::Args, Debug, Default)]
pub struct GroupFields {
    /// Fetch the group's connections from a roster
    #[arg(long)]
    pub dynamic: Option<bool>,

    /// Roster URL for a dynamic group
    #[arg(short, long)]
    pub source: Option<String>,

    /// Username handed to roster connections
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password handed to roster connections
    #[arg(long)]
    pub pass: Option<String>,

    /// DNS server used by the group's sessions (empty to clear)
    #[arg(long)]
    pub dns: Option<String>,
}

/// Output format for list commands
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
    /// Output as CSV
    Csv,
}

/// Group subcommands
#[derive(Subcommand)]
pub enum GroupCommands {
    /// List all groups
    #[command(about = "List all connection groups")]
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show group details
    #[command(about = "Show group details and connections")]
    Show {
        /// Group name or ID
        name: String,
    },

    /// Create a new group
    #[command(about = "Create a new connection group")]
    Create {
        /// Group name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        fields: GroupFields,
    },

    /// Edit a group
    #[command(about = "Edit an existing connection group")]
    Edit {
        /// Group name or ID
        name: String,

        #[command(flatten)]
        fields: GroupFields,
    },

    /// Delete a group
    #[command(about = "Delete an empty connection group")]
    Delete {
        /// Group name or ID
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Fetch dynamic group rosters
    #[command(about = "Fetch the roster of one or every dynamic group")]
    Refresh {
        /// Group name or ID; every dynamic group when omitted
        name: Option<String>,
    },
}

fn main() {
    logging::init(logging::DEFAULT_FILTER);
    let cli = Cli::parse();

    let result = open_manager(cli.config).and_then(|mut manager| run(&mut manager, cli.command));

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn open_manager(config_dir: Option<PathBuf>) -> Result<ConsoleManager, CliError> {
    let config = match config_dir {
        Some(dir) => ConfigManager::with_config_dir(dir),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}")))?,
    };
    Ok(ConsoleManager::open(config))
}

/// Dispatches a parsed command
fn run(manager: &mut ConsoleManager, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List { format, group } => cmd_list(manager, format, group.as_deref()),
        Commands::Show { name } => cmd_show(manager, &name),
        Commands::Add {
            name,
            host,
            port,
            user,
            pass,
            group,
        } => cmd_add(
            manager,
            ConnectionDraft::new(name, host, port).with_credentials(user, pass),
            group.as_deref(),
        ),
        Commands::Update { name, fields } => cmd_update(manager, &name, fields),
        Commands::Rename { name, new_name } => cmd_rename(manager, &name, &new_name),
        Commands::Delete { name, yes } => cmd_delete(manager, &name, yes),
        Commands::Prefs {
            black_on_white,
            system_font,
        } => cmd_prefs(manager, black_on_white, system_font),
        Commands::Group(subcmd) => cmd_group(manager, subcmd),
    }
}

// ========== Dialogs ==========

/// Answers the edit dialogs from command-line flags and asks for
/// confirmation on the terminal
struct FlagDialogs {
    connection: ConnectionFields,
    group: GroupFields,
    assume_yes: bool,
}

impl FlagDialogs {
    fn new(assume_yes: bool) -> Self {
        Self {
            connection: ConnectionFields::default(),
            group: GroupFields::default(),
            assume_yes,
        }
    }
}

impl DialogProvider for FlagDialogs {
    fn edit_connection(&mut self, mut draft: ConnectionDraft, _name_editable: bool) -> Option<ConnectionDraft> {
        let fields = std::mem::take(&mut self.connection);
        if let Some(host) = fields.host {
            draft.host = host;
        }
        if let Some(port) = fields.port {
            draft.port = port;
        }
        if let Some(user) = fields.user {
            draft.username = user;
        }
        if let Some(pass) = fields.pass {
            draft.password = SecretString::from(pass);
        }
        Some(draft)
    }

    fn edit_group(&mut self, draft: GroupDraft) -> Option<GroupDraft> {
        Some(apply_group_fields(draft, std::mem::take(&mut self.group)))
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{title}: {message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
    }
}

fn apply_group_fields(mut draft: GroupDraft, fields: GroupFields) -> GroupDraft {
    if let Some(dynamic) = fields.dynamic {
        draft.dynamic = dynamic;
    }
    if let Some(source) = fields.source {
        draft.source = source;
    }
    if let Some(user) = fields.user {
        draft.username = user;
    }
    if let Some(pass) = fields.pass {
        draft.password = pass;
    }
    if let Some(dns) = fields.dns {
        draft.dns = dns;
    }
    draft
}

// ========== Lookup ==========

/// Find a connection by name or UUID
fn find_connection<'a>(book: &'a AddressBook, name_or_id: &str) -> Result<&'a Connection, CliError> {
    let matches: Vec<&Connection> = book
        .find_by_name_or_id(name_or_id)
        .into_iter()
        .filter_map(|entity| match entity {
            Entity::Connection(c) => Some(c),
            Entity::Group(_) => None,
        })
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::ConnectionNotFound(name_or_id.to_string())),
        [connection] => Ok(*connection),
        _ => Err(ambiguous(name_or_id, matches.iter().map(|c| c.id))),
    }
}

/// Find a group by name or UUID
fn find_group<'a>(book: &'a AddressBook, name_or_id: &str) -> Result<&'a ConnectionGroup, CliError> {
    let matches: Vec<&ConnectionGroup> = book
        .find_by_name_or_id(name_or_id)
        .into_iter()
        .filter_map(|entity| match entity {
            Entity::Group(g) => Some(g),
            Entity::Connection(_) => None,
        })
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::Group(format!("Group not found: {name_or_id}"))),
        [group] => Ok(*group),
        _ => Err(ambiguous(name_or_id, matches.iter().map(|g| g.id))),
    }
}

/// Find any record by name or UUID
fn find_entity<'a>(book: &'a AddressBook, name_or_id: &str) -> Result<&'a Entity, CliError> {
    let matches = book.find_by_name_or_id(name_or_id);
    match matches.as_slice() {
        [] => Err(CliError::ConnectionNotFound(name_or_id.to_string())),
        [entity] => Ok(*entity),
        _ => Err(ambiguous(name_or_id, matches.iter().map(|e| e.id()))),
    }
}

fn ambiguous(name: &str, ids: impl Iterator<Item = Uuid>) -> CliError {
    let ids: Vec<String> = ids.map(|id| id.to_string()).collect();
    CliError::Config(format!(
        "Ambiguous name '{}'. Use one of the IDs: {}",
        name,
        ids.join(", ")
    ))
}

// ========== Connections ==========

/// List connections command handler
fn cmd_list(manager: &ConsoleManager, format: OutputFormat, group: Option<&str>) -> Result<(), CliError> {
    let book = manager.book();
    let group_id = group.map(|name| find_group(book, name).map(|g| g.id)).transpose()?;

    let connections: Vec<&Connection> = book
        .tree()
        .walk()
        .filter_map(|node| book.connection(node.id))
        .filter(|c| group_id.is_none() || book.tree().parent_of(c.id) == group_id)
        .collect();

    match format {
        OutputFormat::Table => println!("{}", format_table(book, &connections)),
        OutputFormat::Json => println!("{}", format_json(book, &connections)?),
        OutputFormat::Csv => println!("{}", format_csv(book, &connections)),
    }
    Ok(())
}

fn group_label(book: &AddressBook, connection: &Connection) -> String {
    book.parent_group(connection.id)
        .map(|g| g.name.clone())
        .unwrap_or_default()
}

/// Format connections as a table string
#[must_use]
pub fn format_table(book: &AddressBook, connections: &[&Connection]) -> String {
    if connections.is_empty() {
        return "No connections found.".to_string();
    }

    let groups: Vec<String> = connections.iter().map(|c| group_label(book, c)).collect();
    let name_width = connections.iter().map(|c| c.name.len()).max().unwrap_or(4).max(4);
    let host_width = connections.iter().map(|c| c.host.len()).max().unwrap_or(4).max(4);
    let group_width = groups.iter().map(String::len).max().unwrap_or(5).max(5);
    let port_width = 5;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<group_width$}",
        "NAME", "HOST", "PORT", "GROUP"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<host_width$}  {:-<port_width$}  {:-<group_width$}",
        "", "", "", ""
    );
    for (conn, group) in connections.iter().zip(&groups) {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<group_width$}",
            conn.name, conn.host, conn.port, group
        );
    }

    output.trim_end().to_string()
}

/// Format connections as JSON string
///
/// # Errors
///
/// Returns `CliError::Config` if JSON serialization fails.
pub fn format_json(book: &AddressBook, connections: &[&Connection]) -> Result<String, CliError> {
    let output: Vec<ConnectionOutput> = connections
        .iter()
        .map(|c| ConnectionOutput::new(book, c))
        .collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}

/// Format connections as CSV string
#[must_use]
pub fn format_csv(book: &AddressBook, connections: &[&Connection]) -> String {
    let mut output = String::from("name,host,port,group\n");
    for conn in connections {
        let _ = writeln!(
            output,
            "{},{},{},{}",
            escape_csv_field(&conn.name),
            escape_csv_field(&conn.host),
            conn.port,
            escape_csv_field(&group_label(book, conn))
        );
    }
    output.trim_end().to_string()
}

/// Escape a CSV field if it contains special characters
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Simplified connection output for CLI
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConnectionOutput {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub dynamic: bool,
}

impl ConnectionOutput {
    fn new(book: &AddressBook, conn: &Connection) -> Self {
        Self {
            id: conn.id.to_string(),
            name: conn.name.clone(),
            host: conn.host.clone(),
            port: conn.port,
            username: conn.username.clone(),
            group: book.parent_group(conn.id).map(|g| g.name.clone()),
            dynamic: conn.dynamic,
        }
    }
}

/// Show connection details command handler
fn cmd_show(manager: &ConsoleManager, name: &str) -> Result<(), CliError> {
    let book = manager.book();
    let connection = find_connection(book, name)?;

    println!("Connection Details:");
    println!("  ID:       {}", connection.id);
    println!("  Name:     {}", connection.name);
    println!("  Host:     {}", connection.host);
    println!("  Port:     {}", connection.port);
    if !connection.username.is_empty() {
        println!("  Username: {}", connection.username);
    }
    if let Some(group) = book.parent_group(connection.id) {
        println!("  Group:    {}", group.name);
        if let Some(dns) = group.dns {
            println!("  DNS:      {dns}");
        }
    }

    Ok(())
}

/// Add connection command handler
fn cmd_add(manager: &mut ConsoleManager, draft: ConnectionDraft, group: Option<&str>) -> Result<(), CliError> {
    let parent = match group {
        Some(name) => {
            let group = find_group(manager.book(), name)?;
            if group.dynamic {
                return Err(CliError::Refused(format!(
                    "Group '{}' is dynamic; its connections come from its roster",
                    group.name
                )));
            }
            Some(group.id)
        }
        None => None,
    };

    let name = draft.name.clone();
    let id = manager
        .add_connection(parent, draft)
        .map_err(|e| CliError::Config(format!("Failed to save connection: {e}")))?
        .ok_or_else(|| CliError::Refused(format!("Cannot add connection '{name}'")))?;

    println!("Created connection '{name}' with ID {id}");
    Ok(())
}

/// Update connection command handler
fn cmd_update(manager: &mut ConsoleManager, name: &str, fields: ConnectionFields) -> Result<(), CliError> {
    let connection = find_connection(manager.book(), name)?;
    let (id, name) = (connection.id, connection.name.clone());

    let mut dialogs = FlagDialogs::new(true);
    dialogs.connection = fields;
    match manager
        .edit(id, &mut dialogs)
        .map_err(|e| CliError::Config(format!("Failed to save connection: {e}")))?
    {
        EditOutcome::Saved { .. } => {
            println!("Updated connection '{name}' (ID: {id})");
            Ok(())
        }
        EditOutcome::Cancelled | EditOutcome::Refused => Err(CliError::Refused(format!(
            "Connection '{name}' is read-only"
        ))),
    }
}

/// Rename command handler
fn cmd_rename(manager: &mut ConsoleManager, name: &str, new_name: &str) -> Result<(), CliError> {
    let id = find_entity(manager.book(), name)?.id();
    let renamed = manager
        .rename(id, new_name)
        .map_err(|e| CliError::Config(format!("Failed to save rename: {e}")))?;
    if !renamed {
        return Err(CliError::Refused(format!("Cannot rename '{name}' to '{new_name}'")));
    }
    println!("Renamed '{name}' to '{new_name}' (ID: {id})");
    Ok(())
}

/// Delete connection command handler
fn cmd_delete(manager: &mut ConsoleManager, name: &str, yes: bool) -> Result<(), CliError> {
    let connection = find_connection(manager.book(), name)?;
    let (id, name) = (connection.id, connection.name.clone());
    if connection.dynamic {
        return Err(CliError::Refused(format!(
            "Connection '{name}' belongs to a dynamic group"
        )));
    }

    let deleted = manager
        .delete(id, &mut FlagDialogs::new(yes))
        .map_err(|e| CliError::Config(format!("Failed to save connections: {e}")))?;
    if deleted {
        println!("Deleted connection '{name}' (ID: {id})");
    }
    Ok(())
}

/// Preferences command handler
fn cmd_prefs(
    manager: &mut ConsoleManager,
    black_on_white: Option<bool>,
    system_font: Option<bool>,
) -> Result<(), CliError> {
    if black_on_white.is_some() || system_font.is_some() {
        let ui = manager.ui();
        let black_on_white = black_on_white.unwrap_or(ui.black_on_white);
        let system_font = system_font.unwrap_or(ui.system_font);
        manager
            .set_preferences(black_on_white, system_font)
            .map_err(|e| CliError::Config(format!("Failed to save preferences: {e}")))?;
    }

    let ui = manager.ui();
    println!("black_on_white = {}", ui.black_on_white);
    println!("system_font    = {}", ui.system_font);
    Ok(())
}

// ========== Groups ==========

/// Group command handler
fn cmd_group(manager: &mut ConsoleManager, subcmd: GroupCommands) -> Result<(), CliError> {
    match subcmd {
        GroupCommands::List { format } => cmd_group_list(manager, format),
        GroupCommands::Show { name } => cmd_group_show(manager, &name),
        GroupCommands::Create { name, fields } => cmd_group_create(manager, name, fields),
        GroupCommands::Edit { name, fields } => cmd_group_edit(manager, &name, fields),
        GroupCommands::Delete { name, yes } => cmd_group_delete(manager, &name, yes),
        GroupCommands::Refresh { name } => cmd_group_refresh(manager, name.as_deref()),
    }
}

/// Simplified group output for CLI
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GroupOutput {
    pub id: String,
    pub name: String,
    pub dynamic: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    pub connections: usize,
}

impl GroupOutput {
    fn new(book: &AddressBook, group: &ConnectionGroup) -> Self {
        Self {
            id: group.id.to_string(),
            name: group.name.clone(),
            dynamic: group.dynamic,
            source: group.source.clone(),
            dns: group.dns.map(|d| d.to_string()),
            connections: book.tree().child_count(group.id),
        }
    }
}

fn cmd_group_list(manager: &ConsoleManager, format: OutputFormat) -> Result<(), CliError> {
    let book = manager.book();
    let groups: Vec<GroupOutput> = book
        .tree()
        .roots()
        .iter()
        .filter_map(|node| book.group(node.id))
        .map(|g| GroupOutput::new(book, g))
        .collect();

    match format {
        OutputFormat::Table => println!("{}", format_group_table(&groups)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&groups)
                .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Csv => {
            println!("name,dynamic,source,connections");
            for g in &groups {
                println!(
                    "{},{},{},{}",
                    escape_csv_field(&g.name),
                    g.dynamic,
                    escape_csv_field(&g.source),
                    g.connections
                );
            }
        }
    }
    Ok(())
}

/// Format groups as a table string
#[must_use]
pub fn format_group_table(groups: &[GroupOutput]) -> String {
    if groups.is_empty() {
        return "No groups found.".to_string();
    }

    let name_width = groups.iter().map(|g| g.name.len()).max().unwrap_or(4).max(4);
    let mut output = String::new();
    let _ = writeln!(output, "{:<name_width$}  {:<7}  {:>5}  SOURCE", "NAME", "TYPE", "CONNS");
    let _ = writeln!(output, "{:-<name_width$}  {:-<7}  {:->5}  {:-<6}", "", "", "", "");
    for g in groups {
        let kind = if g.dynamic { "dynamic" } else { "static" };
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<7}  {:>5}  {}",
            g.name, kind, g.connections, g.source
        );
    }
    output.trim_end().to_string()
}

fn cmd_group_show(manager: &ConsoleManager, name: &str) -> Result<(), CliError> {
    let book = manager.book();
    let group = find_group(book, name)?;

    println!("Group Details:");
    println!("  ID:       {}", group.id);
    println!("  Name:     {}", group.name);
    println!("  Type:     {}", if group.dynamic { "dynamic" } else { "static" });
    if group.dynamic {
        println!("  Source:   {}", group.source);
    }
    if !group.username.is_empty() {
        println!("  Username: {}", group.username);
    }
    if let Some(dns) = group.dns {
        println!("  DNS:      {dns}");
    }

    let children: Vec<&Connection> = book
        .tree()
        .find_node(group.id)
        .map(|node| node.children.iter().filter_map(|c| book.connection(c.id)).collect())
        .unwrap_or_default();
    if children.is_empty() {
        println!("  Connections: none");
    } else {
        println!("  Connections:");
        for c in children {
            println!("    {} ({})", c.name, c.address());
        }
    }
    Ok(())
}

fn cmd_group_create(manager: &mut ConsoleManager, name: String, fields: GroupFields) -> Result<(), CliError> {
    let draft = apply_group_fields(
        GroupDraft {
            name,
            ..GroupDraft::default()
        },
        fields,
    );
    let (id, request) = manager
        .add_group(&draft)
        .map_err(|e| CliError::Config(format!("Failed to save group: {e}")))?;
    println!("Created group '{}' with ID {id}", draft.name);

    if let Some(request) = request {
        run_loads(manager, vec![request])?;
    }
    Ok(())
}

fn cmd_group_edit(manager: &mut ConsoleManager, name: &str, fields: GroupFields) -> Result<(), CliError> {
    let group = find_group(manager.book(), name)?;
    let (id, name) = (group.id, group.name.clone());

    let mut dialogs = FlagDialogs::new(true);
    dialogs.group = fields;
    match manager
        .edit(id, &mut dialogs)
        .map_err(|e| CliError::Config(format!("Failed to save group: {e}")))?
    {
        EditOutcome::Saved { reload } => {
            println!("Updated group '{name}' (ID: {id})");
            if let Some(request) = reload {
                run_loads(manager, vec![request])?;
            }
            Ok(())
        }
        EditOutcome::Cancelled | EditOutcome::Refused => Err(CliError::Refused(format!(
            "Group '{name}' holds connections and cannot become dynamic"
        ))),
    }
}

fn cmd_group_delete(manager: &mut ConsoleManager, name: &str, yes: bool) -> Result<(), CliError> {
    let group = find_group(manager.book(), name)?;
    let (id, name) = (group.id, group.name.clone());
    let children = manager.book().tree().child_count(id);
    if children > 0 {
        return Err(CliError::Refused(format!(
            "Group '{name}' still holds {children} connection(s)"
        )));
    }

    let deleted = manager
        .delete(id, &mut FlagDialogs::new(yes))
        .map_err(|e| CliError::Config(format!("Failed to save groups: {e}")))?;
    if deleted {
        println!("Deleted group '{name}' (ID: {id})");
    }
    Ok(())
}

fn cmd_group_refresh(manager: &mut ConsoleManager, name: Option<&str>) -> Result<(), CliError> {
    let requests = match name {
        Some(name) => {
            let group = find_group(manager.book(), name)?;
            let (id, name) = (group.id, group.name.clone());
            let request = manager.refresh_group(id).ok_or_else(|| {
                CliError::Refused(format!("Group '{name}' is not dynamic or has no valid source"))
            })?;
            vec![request]
        }
        None => manager.start_loads(),
    };

    if requests.is_empty() {
        println!("No dynamic groups to refresh.");
        return Ok(());
    }
    run_loads(manager, requests)
}

/// Fetches rosters and reports what each merge did
///
/// Roster connections are not persisted, so this only reports on them.
fn run_loads(manager: &mut ConsoleManager, requests: Vec<RosterRequest>) -> Result<(), CliError> {
    let fetcher = HttpRosterFetcher::new().map_err(|e| CliError::Roster(e.to_string()))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut failures = 0;
    runtime.block_on(async {
        let mut dispatcher = RosterDispatcher::new(Arc::new(fetcher));
        for request in requests {
            dispatcher.dispatch(request);
        }
        while let Some(response) = dispatcher.next_response().await {
            let group_id = response.group_id;
            let outcome = manager.apply_roster(response);
            let label = manager
                .book()
                .group(group_id)
                .map_or_else(|| group_id.to_string(), |g| g.name.clone());
            match outcome {
                LoadOutcome::Merged { added } => println!("{label}: {added} connection(s)"),
                LoadOutcome::Failed => {
                    failures += 1;
                    println!("{label}: fetch failed ({:?})", manager.book().roster_state(group_id));
                }
                LoadOutcome::Stale | LoadOutcome::Discarded => {
                    tracing::debug!(group = %group_id, ?outcome, "Roster response dropped");
                }
            }
        }
    });

    if failures > 0 {
        return Err(CliError::Roster(format!("{failures} roster fetch(es) failed")));
    }
    Ok(())
}

// ========== Errors ==========

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - record not found or roster could not be fetched
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Group error
    #[error("Group error: {0}")]
    Group(String),

    /// The address book refused the change
    #[error("Refused: {0}")]
    Refused(String),

    /// Roster fetch error
    #[error("Roster error: {0}")]
    Roster(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionNotFound(_) | Self::Roster(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::Group(_) | Self::Refused(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
