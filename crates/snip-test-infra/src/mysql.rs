use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const MYSQL_IMAGE: &str = "mysql";
const MYSQL_PORT: u16 = 3306;
const READY_MESSAGE: &str = "ready for connections";

/// Credentials and schema name for a throwaway MySQL server.
///
/// Each storage test suite names its own `database`; the container creates
/// it on boot and grants it to `username`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    image_tag: String,
    #[builder(setter(into))]
    database: String,
    #[builder(default = "snip".to_string(), setter(into))]
    username: String,
    #[builder(default = "snip".to_string(), setter(into))]
    password: String,
}

/// Where a running server can be reached, and as whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlEndpoint {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl MySqlEndpoint {
    /// A `mysql://` DSN pointing at the endpoint's database.
    pub fn dsn(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A MySQL container that lives as long as this value.
///
/// Dropping the server stops and removes the container.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Boots the container and waits until the server logs that it is ready.
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new(MYSQL_IMAGE, config.image_tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_MESSAGE))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    /// Host-side address of the server plus the configured credentials.
    pub async fn endpoint(&self) -> Result<MySqlEndpoint> {
        Ok(MySqlEndpoint {
            host: self.container.get_host().await?.to_string(),
            port: self.container.get_host_port_ipv4(MYSQL_PORT).await?,
            database: self.config.database.clone(),
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        })
    }
}
