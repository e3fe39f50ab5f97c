//! Client configuration for MongoDB connections.
//!
//! A [`ClientConfig`] describes how to reach a deployment in one of three modes:
//!
//! - **Plain**: `mongodb://<address>` without authentication
//! - **Credentialed**: `mongodb://<address>` authenticating against an explicit
//!   authentication database
//! - **Hosted**: `mongodb+srv://` addressing, where the cluster topology is resolved
//!   through DNS SRV records and the credentials are carried in the URI
//!
//! Every mode uses the same fixed timeouts ([`CONNECT_TIMEOUT`], [`MAX_CONN_IDLE_TIME`],
//! [`SERVER_SELECTION_TIMEOUT`]). Configurations are immutable once built.
//!
//! # Example
//!
//! ```ignore
//! use docaccess_mongodb::config::ClientConfig;
//!
//! let config = ClientConfig::builder("localhost:27017", "inventory-service")
//!     .credentials("admin", "svc", "s3cret")
//!     .observe_commands(true)
//!     .build()?;
//! ```

use std::{fmt, sync::Arc, time::Duration};

use mongodb::{
    error::ErrorKind,
    event::{
        EventHandler,
        command::{CommandEvent, CommandStartedEvent},
    },
    options::{ClientOptions, Credential},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use docaccess_core::error::{DocumentStoreError, DocumentStoreResult};

/// Time allowed for establishing a single connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Time after which an idle pooled connection is closed.
pub const MAX_CONN_IDLE_TIME: Duration = Duration::from_secs(15);
/// Time allowed for selecting a suitable server before an operation fails.
pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands that are never reported to a command listener.
const SUPPRESSED_COMMANDS: &[&str] = &["endSessions"];

/// Tracing target used by the default command listener.
pub const COMMAND_TARGET: &str = "docaccess::command";

/// Receives every reported command-started event.
pub type CommandListener = Arc<dyn Fn(&CommandStartedEvent) + Send + Sync>;

/// Returns whether a command with this name is reported to the command listener.
pub fn should_report_command(name: &str) -> bool {
    !SUPPRESSED_COMMANDS.contains(&name)
}

fn default_listener() -> CommandListener {
    Arc::new(|event: &CommandStartedEvent| {
        tracing::debug!(
            target: COMMAND_TARGET,
            command = %event.command_name,
            database = %event.db,
            request_id = event.request_id,
            body = %event.command,
            "command started"
        );
    })
}

/// Username and password for an authenticated connection.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the client addresses and authenticates against the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    Plain,
    /// Authenticate against `auth_source`.
    Credentialed {
        auth_source: String,
        credentials: Credentials,
    },
    /// SRV addressing with the credentials and default database in the URI.
    Hosted {
        database: String,
        credentials: Credentials,
    },
}

impl ConnectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionMode::Plain => "plain",
            ConnectionMode::Credentialed { .. } => "credentialed",
            ConnectionMode::Hosted { .. } => "hosted",
        }
    }
}

/// Immutable MongoDB client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    address: String,
    app_name: String,
    mode: ConnectionMode,
    command_listener: Option<CommandListener>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("app_name", &self.app_name)
            .field("mode", &self.mode)
            .field("observe_commands", &self.observes_commands())
            .finish()
    }
}

impl ClientConfig {
    /// Starts a plain-mode configuration for `address` (`host:port`, or the cluster
    /// host name in hosted mode).
    pub fn builder(address: impl Into<String>, app_name: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(address, app_name)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn mode(&self) -> &ConnectionMode {
        &self.mode
    }

    pub fn connect_timeout(&self) -> Duration {
        CONNECT_TIMEOUT
    }

    pub fn max_idle_time(&self) -> Duration {
        MAX_CONN_IDLE_TIME
    }

    pub fn server_selection_timeout(&self) -> Duration {
        SERVER_SELECTION_TIMEOUT
    }

    pub fn observes_commands(&self) -> bool {
        self.command_listener.is_some()
    }

    /// The connection string for this configuration.
    ///
    /// Hosted-mode credentials are percent-encoded, so they may contain any character.
    pub fn uri(&self) -> String {
        match &self.mode {
            ConnectionMode::Plain | ConnectionMode::Credentialed { .. } => {
                format!("mongodb://{}", self.address)
            },
            ConnectionMode::Hosted { database, credentials } => format!(
                "mongodb+srv://{}:{}@{}/{}?retryWrites=true&w=majority",
                utf8_percent_encode(&credentials.username, NON_ALPHANUMERIC),
                utf8_percent_encode(&credentials.password, NON_ALPHANUMERIC),
                self.address,
                database,
            ),
        }
    }

    /// Produces driver options for this configuration.
    ///
    /// Hosted mode resolves SRV records while parsing; the other modes do no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] if SRV resolution fails and
    /// [`DocumentStoreError::Configuration`] if the driver rejects the URI.
    pub async fn to_client_options(&self) -> DocumentStoreResult<ClientOptions> {
        let mut options = ClientOptions::parse(self.uri())
            .await
            .map_err(|e| match e.kind.as_ref() {
                ErrorKind::DnsResolve { .. } => DocumentStoreError::Connection(e.to_string()),
                _ => DocumentStoreError::Configuration(format!("failed to parse URI: {e}")),
            })?;

        self.apply(&mut options);

        Ok(options)
    }

    /// Applies timeouts, application name, credentials and the command observer.
    pub(crate) fn apply(&self, options: &mut ClientOptions) {
        options.app_name = Some(self.app_name.clone());
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.max_idle_time = Some(MAX_CONN_IDLE_TIME);
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        if let ConnectionMode::Credentialed { auth_source, credentials } = &self.mode {
            options.credential = Some(
                Credential::builder()
                    .username(credentials.username.clone())
                    .password(credentials.password.clone())
                    .source(auth_source.clone())
                    .build(),
            );
        }

        if let Some(listener) = self.command_listener.clone() {
            options.command_event_handler = Some(EventHandler::callback(move |event: CommandEvent| {
                if let CommandEvent::Started(started) = event {
                    if should_report_command(&started.command_name) {
                        listener(&started);
                    }
                }
            }));
        }
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    address: String,
    app_name: String,
    mode: ConnectionMode,
    observe_commands: bool,
    command_listener: Option<CommandListener>,
}

impl ClientConfigBuilder {
    pub fn new(address: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            app_name: app_name.into(),
            mode: ConnectionMode::Plain,
            observe_commands: false,
            command_listener: None,
        }
    }

    /// Authenticates with `username` and `password` against the `auth_source` database.
    pub fn credentials(
        mut self,
        auth_source: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.mode = ConnectionMode::Credentialed {
            auth_source: auth_source.into(),
            credentials: Credentials {
                username: username.into(),
                password: password.into(),
            },
        };
        self
    }

    /// Switches to hosted (SRV) mode with `database` as the default database.
    pub fn hosted(
        mut self,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.mode = ConnectionMode::Hosted {
            database: database.into(),
            credentials: Credentials {
                username: username.into(),
                password: password.into(),
            },
        };
        self
    }

    /// Reports command-started events to the command listener. Without an explicit
    /// listener they are emitted as `tracing` debug events on [`COMMAND_TARGET`].
    pub fn observe_commands(mut self, enabled: bool) -> Self {
        self.observe_commands = enabled;
        self
    }

    /// Installs `listener` for command-started events and turns observation on.
    pub fn command_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&CommandStartedEvent) + Send + Sync + 'static,
    {
        self.command_listener = Some(Arc::new(listener));
        self.observe_commands = true;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Configuration`] if the address, application name,
    /// username or hosted database name is empty.
    pub fn build(self) -> DocumentStoreResult<ClientConfig> {
        if self.address.trim().is_empty() {
            return Err(DocumentStoreError::Configuration("address must not be empty".into()));
        }
        if self.app_name.trim().is_empty() {
            return Err(DocumentStoreError::Configuration("application name must not be empty".into()));
        }

        match &self.mode {
            ConnectionMode::Plain => {},
            ConnectionMode::Credentialed { credentials, .. } => {
                if credentials.username.is_empty() {
                    return Err(DocumentStoreError::Configuration("username must not be empty".into()));
                }
            },
            ConnectionMode::Hosted { database, credentials } => {
                if credentials.username.is_empty() {
                    return Err(DocumentStoreError::Configuration("username must not be empty".into()));
                }
                if database.is_empty() {
                    return Err(DocumentStoreError::Configuration("hosted database name must not be empty".into()));
                }
            },
        }

        let command_listener = match (self.observe_commands, self.command_listener) {
            (false, _) => None,
            (true, Some(listener)) => Some(listener),
            (true, None) => Some(default_listener()),
        };

        Ok(ClientConfig {
            address: self.address,
            app_name: self.app_name,
            mode: self.mode,
            command_listener,
        })
    }
}
