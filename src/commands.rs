// File: ./src/commands.rs
//! Command handlers behind the `clicknote` subcommands.
//!
//! Every handler gets the configuration explicitly; nothing is read from
//! ambient state.
use crate::client::{ApiError, ClickUpClient};
use crate::config::Config;
use crate::model::{CreatedTask, NewTask, Space, TaskList, Team, User};
use crate::sync::{SyncError, SyncOutcome, Syncer};
use crate::vault::{NoteStore, StoreError, find_list_notes, list_note_path};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("not signed in; run `clicknote login <token>` first")]
    NotSignedIn,

    #[error("nothing selected")]
    EmptySelection,

    #[error("no list given and no default list set; run `clicknote use-list <id>`")]
    NoListSelected,

    #[error("no team known; run `clicknote login <token>` again or pass --team")]
    NoTeamSelected,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type CommandResult<T> = Result<T, CommandError>;

pub fn client_for(config: &Config) -> CommandResult<ClickUpClient> {
    if !config.is_signed_in() {
        return Err(CommandError::NotSignedIn);
    }
    Ok(ClickUpClient::new(
        &config.api_url,
        &config.token,
        config.request_timeout_secs,
    )?)
}

fn resolve_list(config: &Config, list_id: Option<&str>) -> CommandResult<String> {
    list_id
        .map(str::to_string)
        .or_else(|| config.default_list.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or(CommandError::NoListSelected)
}

/// Stores `token` and caches the user and teams it belongs to. The config
/// is only modified when both lookups succeed.
pub async fn login(config: &mut Config, token: &str) -> CommandResult<User> {
    let client = ClickUpClient::new(&config.api_url, token, config.request_timeout_secs)?;
    let user = client.get_authorized_user().await?;
    let teams = client.get_teams().await?;

    config.token = token.to_string();
    if config
        .team_id
        .as_ref()
        .is_none_or(|id| !teams.iter().any(|t| &t.id == id))
    {
        config.team_id = teams.first().map(|t| t.id.clone());
    }
    config.user = Some(user.clone());
    config.teams = teams;
    log::info!("Signed in as {}", user.display_name());
    Ok(user)
}

pub fn logout(config: &mut Config) {
    config.clear_user();
    log::info!("Signed out");
}

pub async fn teams(config: &Config) -> CommandResult<Vec<Team>> {
    Ok(client_for(config)?.get_teams().await?)
}

/// Spaces of the team and the lists inside each, or the lists of one space.
pub async fn lists(
    config: &Config,
    space_id: Option<&str>,
) -> CommandResult<Vec<(Space, Vec<TaskList>)>> {
    let client = client_for(config)?;
    let spaces = match space_id {
        Some(id) => vec![Space {
            id: id.to_string(),
            name: String::new(),
        }],
        None => {
            let team = config
                .team_id
                .as_deref()
                .ok_or(CommandError::NoTeamSelected)?;
            client.get_spaces(team).await?
        }
    };

    let mut out = Vec::with_capacity(spaces.len());
    for space in spaces {
        let lists = client.get_lists(&space.id).await?;
        out.push((space, lists));
    }
    Ok(out)
}

pub fn use_list(config: &mut Config, list_id: &str) -> CommandResult<()> {
    if list_id.trim().is_empty() {
        return Err(CommandError::NoListSelected);
    }
    config.default_list = Some(list_id.trim().to_string());
    Ok(())
}

/// Creates a task named after `selection` and returns its link text.
///
/// When `note` is given the link is appended to that note, like the
/// editor command inserting it after the selection.
pub async fn create_task_from_selection(
    config: &Config,
    store: &dyn NoteStore,
    selection: &str,
    list_id: Option<&str>,
    note: Option<&str>,
) -> CommandResult<(CreatedTask, String)> {
    if selection.trim().is_empty() {
        return Err(CommandError::EmptySelection);
    }
    let list = resolve_list(config, list_id)?;
    let client = client_for(config)?;

    let created = client
        .create_task(&list, &NewTask::from_selection(selection))
        .await?;
    let link = created.to_markdown_link();
    if let Some(path) = note {
        store.append(path, &link)?;
    }
    Ok((created, link))
}

/// Creates an empty note for `list_id` unless one already exists.
/// Returns the path and whether it was created.
pub fn track(
    config: &Config,
    store: &dyn NoteStore,
    list_id: &str,
    name: Option<&str>,
) -> CommandResult<(String, bool)> {
    if list_id.trim().is_empty() {
        return Err(CommandError::NoListSelected);
    }
    if let Some(existing) = find_list_notes(store, &config.note_prefix, list_id)?
        .into_iter()
        .next()
    {
        return Ok((existing.path, false));
    }
    let path = list_note_path(&config.note_prefix, name, list_id);
    store.create_note(&path, "")?;
    log::info!("Tracking list {} in '{}'", list_id, path);
    Ok((path, true))
}

pub async fn sync(
    config: &Config,
    store: Arc<dyn NoteStore>,
    list_id: Option<&str>,
) -> CommandResult<SyncOutcome> {
    let list = resolve_list(config, list_id)?;
    let client = Arc::new(client_for(config)?);
    let syncer = Syncer::new(
        client,
        store,
        config.note_prefix.clone(),
        config.row_options(),
    );
    Ok(syncer.sync_list(&list).await?)
}
