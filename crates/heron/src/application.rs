//! Application bootstrap.
//!
//! [`Application`] ties the pieces together: it collects components,
//! compiles their routes with the configured options, and hands the
//! resulting dispatcher to the HTTP server.

use heron_config::{HeronConfig, LogFormat, LoggingSection, MetricsSection, RoutingSection, ServerSection};
use heron_core::{compile, CompileOptions, Component, ConfigurationError, DiscoverySource, Registry};
use heron_server::{Dispatcher, Server, ServerConfig, ServerError, ShutdownSignal};
use heron_telemetry::{init_telemetry, LogConfig, MetricsConfig, TelemetryConfig, TelemetryError};
use std::time::Duration;

/// Anything that can stop a service from starting.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] heron_config::ConfigError),

    /// Handler metadata is inconsistent.
    #[error(transparent)]
    Compile(#[from] ConfigurationError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The listener could not be bound or failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A service under construction.
///
/// # Example
///
/// ```rust,ignore
/// use heron::{Application, LinkedComponents};
///
/// #[tokio::main]
/// async fn main() -> Result<(), heron::BootError> {
///     Application::from_env()?
///         .discover(&LinkedComponents)
///         .component::<HealthController>()
///         .run()
///         .await
/// }
/// ```
#[derive(Debug, Default)]
pub struct Application {
    config: HeronConfig,
    registry: Registry,
}

impl Application {
    /// An application with default configuration and no components.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An application with the given configuration.
    #[must_use]
    pub fn with_config(config: HeronConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }

    /// Loads `heron.toml` if present, then `.env` and `HERON__*` variables.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::Config`] if any layer fails to load or validate.
    pub fn from_env() -> Result<Self, BootError> {
        let config = heron_config::ConfigLoader::new()
            .with_optional_file("heron.toml")?
            .with_dotenv()?
            .with_env_prefix("HERON")
            .load()?;
        Ok(Self::with_config(config))
    }

    /// Registers a component, instantiated with `Default`.
    ///
    /// Registering the same type twice keeps the first instance.
    #[must_use]
    pub fn component<T: Component + Default>(mut self) -> Self {
        self.registry.register::<T>();
        self
    }

    /// Registers a pre-built component instance.
    #[must_use]
    pub fn instance<T: Component>(mut self, instance: T) -> Self {
        self.registry.register_instance(instance);
        self
    }

    /// Registers every component a discovery source yields.
    #[must_use]
    pub fn discover(mut self, source: &impl DiscoverySource) -> Self {
        source.populate(&mut self.registry);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HeronConfig {
        &self.config
    }

    /// Returns the registry built so far.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compiles the routes and prepares the server without binding.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::Compile`] if handler metadata is inconsistent.
    pub fn build(self) -> Result<Server, BootError> {
        let routes = compile(&self.registry, compile_options(&self.config.routing))?;
        Ok(Server::new(
            server_config(&self.config.server),
            Dispatcher::new(routes),
        ))
    }

    /// Installs telemetry, builds, and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns the first startup failure.
    pub async fn run(self) -> Result<(), BootError> {
        init_telemetry(&telemetry_config(&self.config))?;
        self.build()?.run().await?;
        Ok(())
    }

    /// Builds and serves until `shutdown` triggers. Telemetry is left as is.
    ///
    /// # Errors
    ///
    /// Returns the first startup failure.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), BootError> {
        self.build()?.run_with_shutdown(shutdown).await?;
        Ok(())
    }
}

/// Route compiler options from `[routing]`.
#[must_use]
pub fn compile_options(section: &RoutingSection) -> CompileOptions {
    CompileOptions {
        reject_duplicates: section.reject_duplicate_routes,
    }
}

/// Transport settings from `[server]`.
#[must_use]
pub fn server_config(section: &ServerSection) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(section.http_addr.clone())
        .shutdown_timeout(Duration::from_secs(section.shutdown_timeout_secs))
        .keep_alive(section.keep_alive)
        .max_connections(section.max_connections)
        .build()
}

/// Telemetry settings from `[logging]` and `[metrics]`.
#[must_use]
pub fn telemetry_config(config: &HeronConfig) -> TelemetryConfig {
    TelemetryConfig::builder()
        .logging(log_config(&config.logging))
        .metrics(metrics_config(&config.metrics))
        .build()
}

fn log_config(section: &LoggingSection) -> LogConfig {
    let base = match section.format {
        LogFormat::Json => LogConfig::production(),
        LogFormat::Pretty => LogConfig::development(),
    };
    LogConfig {
        enabled: section.enabled,
        level: section.level.clone(),
        file_line_info: section.include_location,
        ..base
    }
}

fn metrics_config(section: &MetricsSection) -> MetricsConfig {
    MetricsConfig {
        enabled: section.enabled,
        listen_addr: section.listen_addr.clone(),
        ..MetricsConfig::default()
    }
}
