use anyhow::{Context, Result};
use clicknote::cli::{self, Command, Invocation};
use clicknote::commands;
use clicknote::config::Config;
use clicknote::context::{AppContext, StandardContext};
use clicknote::sync::SyncOutcome;
use clicknote::vault::FsVault;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let inv = match cli::parse_args(&args) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("error: {}\n\nRun 'clicknote --help' for usage.", e);
            std::process::exit(2);
        }
    };

    cli::init_logging(inv.verbose);

    if let Err(e) = run(inv).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn open_vault(ctx: &dyn AppContext, config: &Config, inv: &Invocation) -> Result<FsVault> {
    let dir = match &inv.vault {
        Some(v) => v.clone(),
        None => config.vault_dir(ctx)?,
    };
    log::debug!("Using vault {}", dir.display());
    FsVault::open(&dir).with_context(|| format!("Cannot open vault {}", dir.display()))
}

async fn run(inv: Invocation) -> Result<()> {
    let ctx = StandardContext::new(inv.root.clone());
    let mut config = Config::load_or_default(&ctx)?;

    match &inv.command {
        Command::Help => cli::print_help("clicknote"),
        Command::Login { token } => {
            let user = commands::login(&mut config, token).await?;
            config.save(&ctx)?;
            println!(
                "Signed in as {} ({} team(s)). Config: {}",
                user.display_name(),
                config.teams.len(),
                Config::get_path_string(&ctx)?
            );
        }
        Command::Logout => {
            commands::logout(&mut config);
            config.save(&ctx)?;
        }
        Command::WhoAmI => match &config.user {
            Some(user) if config.is_signed_in() => {
                match user.id {
                    Some(id) => println!("{} (id {})", user.display_name(), id),
                    None => println!("{}", user.display_name()),
                }
                if let Some(team) = config
                    .team_id
                    .as_ref()
                    .and_then(|id| config.teams.iter().find(|t| &t.id == id))
                {
                    println!("team: {} ({})", team.name, team.id);
                }
            }
            _ => println!("Not signed in"),
        },
        Command::Teams => {
            for team in commands::teams(&config).await? {
                let marker = if config.team_id.as_ref() == Some(&team.id) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}  {}", marker, team.id, team.name);
            }
        }
        Command::Lists { space } => {
            for (space, lists) in commands::lists(&config, space.as_deref()).await? {
                println!("{} {}", space.id, space.name);
                for list in lists {
                    println!("    {}  {}", list.id, list.name);
                }
            }
        }
        Command::UseList { list_id } => {
            commands::use_list(&mut config, list_id)?;
            config.save(&ctx)?;
        }
        Command::Create { text, list, note } => {
            let vault = open_vault(&ctx, &config, &inv)?;
            let (_, link) = commands::create_task_from_selection(
                &config,
                &vault,
                text,
                list.as_deref(),
                note.as_deref(),
            )
            .await?;
            println!("{}", link);
        }
        Command::Track { list_id, name } => {
            let vault = open_vault(&ctx, &config, &inv)?;
            let (path, created) = commands::track(&config, &vault, list_id, name.as_deref())?;
            if created {
                println!("Created {}", path);
            } else {
                println!("Already tracked by {}", path);
            }
        }
        Command::Sync { list_id } => {
            let vault = Arc::new(open_vault(&ctx, &config, &inv)?);
            match commands::sync(&config, vault, list_id.as_deref()).await? {
                SyncOutcome::Updated { path, rows } => println!("{}: {} task(s)", path, rows),
                SyncOutcome::NoteNotFound => println!("No note tracks this list"),
            }
        }
    }
    Ok(())
}
