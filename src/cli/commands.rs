use std::collections::HashSet;
use std::sync::Arc;

use colored::Colorize;

use super::{Commands, ConfigCommands};
use crate::analytics::{RequestParts, geoip_from_config};
use crate::config::{StaticConfig, get_config};
use crate::errors::{LinkpulseError, Result};
use crate::services::{
    ApiKeyValidator, ClickRecorder, CreateLinkRequest, LinkResolver, LinkService, TagAssociator,
};
use crate::storage::{ClickMetadata, LinkGateway, SeaOrmStorage, UserId};
use crate::utils::time_parser::parse_expire_time;

pub async fn run_command(cmd: Commands) -> Result<()> {
    // 生成配置不需要数据库连接
    if let Commands::Config { action } = cmd {
        return match action {
            ConfigCommands::Generate { output_path, force } => config_generate(output_path, force),
        };
    }

    let storage = Arc::new(SeaOrmStorage::from_config().await?);
    let gateway: Arc<dyn LinkGateway> = storage.clone();

    match cmd {
        Commands::Migrate => {
            // 连接时已执行迁移
            println!(
                "{} Migrations applied on {}",
                "✓".bold().green(),
                storage.backend_name().to_uppercase().cyan()
            );
            Ok(())
        }

        Commands::CreateLink {
            url,
            code,
            password,
            expire,
            owner,
            qr,
        } => {
            let service = LinkService::new(storage);
            let result = service
                .create_link(CreateLinkRequest {
                    original_url: url,
                    short_code: code,
                    password,
                    expires_at: expire,
                    owner: owner.map(UserId::from),
                    qr_code_url: qr,
                })
                .await?;

            if result.generated_code {
                println!(
                    "{} Generated random code: {}",
                    "ℹ".bold().blue(),
                    result.link.short_code.magenta()
                );
            }
            match result.link.expires_at {
                Some(expires_at) => println!(
                    "{} Added short link: {} -> {} (expires: {})",
                    "✓".bold().green(),
                    result.link.short_code.cyan(),
                    result.link.original_url.blue().underline(),
                    expires_at
                        .format("%Y-%m-%d %H:%M:%S UTC")
                        .to_string()
                        .yellow()
                ),
                None => println!(
                    "{} Added short link: {} -> {}",
                    "✓".bold().green(),
                    result.link.short_code.cyan(),
                    result.link.original_url.blue().underline()
                ),
            }
            Ok(())
        }

        Commands::Resolve {
            short_code,
            password,
            record,
            user_agent,
            ip,
        } => {
            let resolver = LinkResolver::without_cache(gateway.clone());
            let resolved = resolver.resolve(&short_code, password.as_deref()).await?;
            println!(
                "{} {} -> {}",
                "✓".bold().green(),
                short_code.cyan(),
                resolved.destination_url.blue().underline()
            );

            if record {
                let geo = geoip_from_config(&get_config().analytics);
                let metadata = ClickMetadata::from_request(
                    RequestParts {
                        ip,
                        user_agent,
                        ..Default::default()
                    },
                    geo.as_deref(),
                )
                .await;
                ClickRecorder::new(gateway).record(resolved.link_id, metadata).await?;
                println!("{} Click recorded", "✓".bold().green());
            }
            Ok(())
        }

        Commands::DeleteLink {
            short_code,
            as_user,
        } => {
            let requester = as_user.map(UserId::from);
            LinkService::new(storage)
                .delete_link(&short_code, requester.as_ref())
                .await?;
            println!(
                "{} Deleted short link: {}",
                "✓".bold().green(),
                short_code.cyan()
            );
            Ok(())
        }

        Commands::Tag {
            short_code,
            owner,
            tags,
        } => {
            let link = LinkService::new(storage).get_link(&short_code).await?;
            let names: HashSet<String> = tags.into_iter().collect();
            let report = TagAssociator::new(gateway)
                .attach_tags(link.id, &UserId::from(owner), &names)
                .await?;

            for tag in &report.attached {
                println!("{} {}", "✓".bold().green(), tag.name.cyan());
            }
            for failure in &report.failed {
                println!(
                    "{} {:?}: {}",
                    "✗".bold().red(),
                    failure.name,
                    failure.error.message()
                );
            }
            if report.is_complete() {
                Ok(())
            } else {
                Err(LinkpulseError::validation(format!(
                    "{} of {} tags failed",
                    report.failed.len(),
                    report.failed.len() + report.attached.len()
                )))
            }
        }

        Commands::IssueKey { user, name, expire } => {
            let expires_at = expire
                .as_deref()
                .map(parse_expire_time)
                .transpose()
                .map_err(LinkpulseError::date_parse)?;
            let issued = LinkService::new(storage)
                .issue_api_key(&UserId::from(user), name, expires_at)
                .await?;

            println!(
                "{} API key issued (id {}), store it now, it will not be shown again:",
                "✓".bold().green(),
                issued.key.id
            );
            println!("  {}", issued.key.key.yellow());
            Ok(())
        }

        Commands::ValidateKey { key } => {
            // 前台命令，等待 last_used 写完再退出
            let auth = ApiKeyValidator::new(gateway, false).validate(&key).await?;
            println!(
                "{} Valid key {} for user {}",
                "✓".bold().green(),
                auth.key_id,
                auth.user_id.as_str().cyan()
            );
            Ok(())
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }
}

fn config_generate(output_path: Option<String>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());

    if std::path::Path::new(&path).exists() && !force {
        return Err(LinkpulseError::file_operation(format!(
            "{} already exists, use --force to overwrite",
            path
        )));
    }

    std::fs::write(&path, StaticConfig::generate_sample_config())?;
    println!(
        "{} Sample configuration written to {}",
        "✓".bold().green(),
        path.cyan()
    );
    Ok(())
}
