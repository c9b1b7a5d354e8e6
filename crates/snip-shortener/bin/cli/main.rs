mod cli;

use crate::cli::{Command, StorageBackendArg, CLI};
use clap::Parser;
use snip_accounts::{AccessError, AccessGate};
use snip_core::{AccountRepository, Repository, ShortCode, Shortener};
use snip_generator::RandomGenerator;
use snip_shortener::{ShortenerService, ShortenerSettings};
use snip_storage::{InMemoryAccountRepository, InMemoryRepository, MySqlRepository};
use std::process::ExitCode;
use tracing::{debug, info};

/// Exit status for `resolve` on an unknown code.
const EXIT_NOT_FOUND: u8 = 4;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = CLI::parse();
    snip_telemetry::init(config.log_format.into())?;

    info!(
        storage_backend = %config.storage,
        code_length = config.code_length,
        max_attempts = config.max_attempts,
        "starting snip"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run(
                InMemoryRepository::new(),
                InMemoryAccountRepository::new(),
                config,
            )
            .await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .clone()
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(&mysql_dsn).await?;
            repository.ensure_schema().await?;

            let outcome = run(repository.clone(), repository.clone(), config).await;
            repository.close().await;
            outcome
        }
    }
}

async fn run<R: Repository, A: AccountRepository>(
    links: R,
    accounts: A,
    config: CLI,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let generator = RandomGenerator::with_length(config.code_length)?;
    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_attempts)
        .build();
    let service = ShortenerService::with_settings(links, generator, settings);
    let gate = AccessGate::new(accounts, config.gate_policy.into());

    match config.command {
        Command::Register { username, password } => {
            let username = gate.register(&username, &password).await?;
            println!("registered {username}");
        }
        Command::Shorten {
            url,
            username,
            password,
        } => {
            let session = match (username, password) {
                (Some(username), Some(password)) => {
                    Some(gate.authenticate(&username, &password).await?)
                }
                (None, None) => None,
                _ => return Err(AccessError::MissingCredentials.into()),
            };
            let owner = gate.owner_for_create(session.as_deref()).await?;
            let mapping = service.create(url, owner).await?;
            println!("{}", mapping.code.to_url(&config.public_base_url));
        }
        Command::Resolve { code } => {
            // A malformed code cannot name a stored mapping.
            let target = match ShortCode::new(&code) {
                Ok(code) => service.resolve(&code).await?,
                Err(err) => {
                    debug!(code = %code, error = %err, "rejecting malformed short code");
                    None
                }
            };

            match target {
                Some(url) => println!("{url}"),
                None => {
                    eprintln!("short code not found: {code}");
                    return Ok(ExitCode::from(EXIT_NOT_FOUND));
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
