//! CLI commands

use anyhow::{Result, anyhow, bail};
use clap::{Subcommand, ValueEnum};
use portal_core::{FileSessionStore, LoginEncoding, PortalConfig, StateDir, UserRecord};
use portal_frontend_common::{Route, SessionController, SessionPhase};
use portal_http::types::UserUpdate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config;

/// Default page size of the user service
const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and persist the issued credentials
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,

        /// Override the configured login encoding
        #[arg(long)]
        encoding: Option<EncodingArg>,
    },

    /// Forget the persisted credentials
    Logout,

    /// Show whether a session is active
    Dashboard,

    /// Create an account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// User account operations
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List user accounts
    List {
        /// Records to skip
        #[arg(long)]
        skip: Option<u32>,

        /// Maximum records to return
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show the signed-in account
    Me,

    /// Show one account
    Get { id: i64 },

    /// Change an account's email or password
    Update {
        id: i64,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,
    },

    /// Delete an account
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Output file path (defaults to the state directory's portal.toml)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EncodingArg {
    Form,
    Json,
}

impl From<EncodingArg> for LoginEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Form => Self::Form,
            EncodingArg::Json => Self::Json,
        }
    }
}

/// Paths given on the command line, resolved lazily
pub struct Context {
    config_file: Option<PathBuf>,
    state_dir: StateDir,
}

impl Context {
    pub fn new(config_file: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        let state_dir = data_dir.map_or_else(StateDir::new, StateDir::with_override);
        Self {
            config_file,
            state_dir,
        }
    }

    fn load_config(&self) -> Result<PortalConfig> {
        config::load_config(self.config_file.as_deref(), &self.state_dir)
    }

    /// Controller over the persisted session, already restored
    fn controller(&self, config: &PortalConfig) -> Result<SessionController> {
        let session_path = config.session_path(&self.state_dir);
        info!("Using session file: {}", session_path.display());

        let store = Arc::new(FileSessionStore::new(session_path));
        let mut controller = SessionController::from_config(config, store)?;
        controller.restore()?;
        Ok(controller)
    }
}

impl Commands {
    pub async fn execute(self, context: Context) -> Result<()> {
        match self {
            Self::Config { command } => command.execute(&context),
            Self::Login {
                email,
                password,
                encoding,
            } => {
                let mut config = context.load_config()?;
                if let Some(encoding) = encoding {
                    config.auth.login_encoding = encoding.into();
                }
                let mut view = context.controller(&config)?;
                login(&mut view, &email, &password).await
            }
            Self::Logout => {
                let config = context.load_config()?;
                let mut view = context.controller(&config)?;
                view.logout()?;
                println!("Signed out");
                Ok(())
            }
            Self::Dashboard => {
                let config = context.load_config()?;
                let mut view = context.controller(&config)?;
                dashboard(&mut view);
                Ok(())
            }
            Self::Register { email, password } => {
                let config = context.load_config()?;
                let mut view = context.controller(&config)?;
                view.navigate(Route::Register);
                match view.register(&email, &password).await {
                    Ok(user) => {
                        println!("Registered {} (id {})", user.email, user.id);
                        println!("You can now sign in with 'portal login'");
                        Ok(())
                    }
                    Err(err) => Err(view_failure(&view, err)),
                }
            }
            Self::Users { command } => {
                let config = context.load_config()?;
                let mut view = context.controller(&config)?;
                command.execute(&mut view).await
            }
        }
    }
}

impl UserCommands {
    async fn execute(self, view: &mut SessionController) -> Result<()> {
        match self {
            Self::List { skip, limit } => {
                view.navigate(Route::Users);
                let result = if skip.is_none() && limit.is_none() {
                    view.list_users().await
                } else {
                    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
                    view.list_users_page(skip.unwrap_or(0), limit).await
                };
                let users = result.map_err(|err| view_failure(view, err))?;
                print_users(&users);
            }
            Self::Me => {
                view.navigate(Route::Profile);
                let user = view
                    .current_user()
                    .await
                    .map_err(|err| view_failure(view, err))?;
                print_user(&user);
            }
            Self::Get { id } => {
                let user = view
                    .get_user(id)
                    .await
                    .map_err(|err| view_failure(view, err))?;
                print_user(&user);
            }
            Self::Update {
                id,
                email,
                password,
            } => {
                let update = UserUpdate { email, password };
                if update.is_empty() {
                    bail!("Nothing to update: pass --email and/or --password");
                }
                let user = view
                    .update_user(id, &update)
                    .await
                    .map_err(|err| view_failure(view, err))?;
                println!("Updated user {}", user.id);
                print_user(&user);
            }
            Self::Delete { id } => {
                let user = view
                    .delete_user(id)
                    .await
                    .map_err(|err| view_failure(view, err))?;
                println!("Deleted {} (id {})", user.email, user.id);
            }
        }
        Ok(())
    }
}

impl ConfigCommands {
    fn execute(self, context: &Context) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                let path = match output {
                    Some(path) => path,
                    None => {
                        context.state_dir.create_directories()?;
                        context.state_dir.config_path()
                    }
                };
                let path = config::generate_default_config(&path, force)?;
                println!("Generated configuration at: {}", path.display());
                Ok(())
            }
            Self::Show => {
                let config = context.load_config()?;
                print!("{}", config.to_toml()?);
                println!(
                    "# session file: {}",
                    config.session_path(&context.state_dir).display()
                );
                Ok(())
            }
        }
    }
}

async fn login(view: &mut SessionController, email: &str, password: &str) -> Result<()> {
    if let Err(err) = view.login(email, password).await {
        return Err(view_failure(view, err));
    }

    if let Some(notice) = &view.state().notice {
        println!("{notice}");
    }
    println!("Signed in as {}", email.trim());
    Ok(())
}

fn dashboard(view: &mut SessionController) {
    view.navigate(Route::Dashboard);
    println!("Welcome to the dashboard");
    match view.phase() {
        SessionPhase::Authenticated => println!("Status: signed in"),
        _ => println!("Status: not signed in"),
    }
}

/// Error carrying exactly the message the view would display
fn view_failure<E>(view: &SessionController, err: E) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    match &view.state().error {
        Some(message) => {
            debug!("Command failed: {err}");
            anyhow!(message.clone())
        }
        None => anyhow::Error::new(err),
    }
}

fn print_users(users: &[UserRecord]) {
    if users.is_empty() {
        println!("No users");
        return;
    }

    let width = users.iter().map(|u| u.email.len()).max().unwrap_or(5).max(5);
    println!("{:>6}  {:<width$}  STATUS", "ID", "EMAIL");
    for user in users {
        println!(
            "{:>6}  {:<width$}  {}",
            user.id,
            user.email,
            user.status_label()
        );
    }
}

fn print_user(user: &UserRecord) {
    println!("id:     {}", user.id);
    println!("email:  {}", user.email);
    println!("status: {}", user.status_label());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_encoding_arg_maps_to_login_encoding() {
        assert_eq!(LoginEncoding::from(EncodingArg::Form), LoginEncoding::Form);
        assert_eq!(LoginEncoding::from(EncodingArg::Json), LoginEncoding::Json);
    }

    #[test]
    fn test_dashboard_without_session() {
        let dir = TempDir::new().unwrap();
        let context = Context::new(None, Some(dir.path().to_path_buf()));
        let config = PortalConfig::default();

        let mut view = context.controller(&config).unwrap();
        assert_eq!(view.phase(), SessionPhase::Anonymous);
        dashboard(&mut view);
        assert_eq!(view.route(), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_users_list_without_session_fails_offline() {
        let dir = TempDir::new().unwrap();
        let context = Context::new(None, Some(dir.path().to_path_buf()));
        let config = PortalConfig::default();
        let mut view = context.controller(&config).unwrap();

        let err = UserCommands::List {
            skip: None,
            limit: None,
        }
        .execute(&mut view)
        .await
        .unwrap_err();
        assert_eq!(format!("{err:#}"), "You are not signed in");
    }

    #[tokio::test]
    async fn test_rejected_login_reports_server_detail_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let context = Context::new(None, Some(dir.path().to_path_buf()));
        let mut config = PortalConfig::default();
        config.auth.base_url = server.uri();
        config.users.base_url = server.uri();

        let mut view = context.controller(&config).unwrap();
        let err = login(&mut view, "a@b.com", "wrong").await.unwrap_err();
        assert_eq!(format!("{err:#}"), "Invalid credentials");
    }

    #[test]
    fn test_config_init_creates_state_directories() {
        let dir = TempDir::new().unwrap();
        let context = Context::new(None, Some(dir.path().join("state")));

        ConfigCommands::Init {
            output: None,
            force: false,
        }
        .execute(&context)
        .unwrap();

        assert!(context.state_dir.config_path().exists());
        assert!(context.state_dir.data_dir().is_dir());
    }

    #[tokio::test]
    async fn test_update_needs_a_field() {
        let dir = TempDir::new().unwrap();
        let context = Context::new(None, Some(dir.path().to_path_buf()));
        let mut view = context.controller(&PortalConfig::default()).unwrap();

        let err = UserCommands::Update {
            id: 1,
            email: None,
            password: None,
        }
        .execute(&mut view)
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("Nothing to update"));
    }
}
