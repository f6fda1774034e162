//! Application shell for pitwall.
//!
//! `App` is the explicit session context: the API client, the token cache,
//! the config and the player, threaded through every operation instead of
//! global state. The main menu loop and the catalog traversal both live
//! here; traversal is a loop over [`NavState`] that runs until a playable
//! stream has been narrowed down.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{CredentialStore, TokenCache, AUTH_FILE};
use crate::config::Config;
use crate::models::{Container, ContainerPage};
use crate::nav::{self, CollectionAccess, NavState, Playable};
use crate::player::Player;
use crate::ui::prompt;

pub struct App {
    api: ApiClient,
    cache: TokenCache,
    config: Config,
    player: Player,
    token: Option<String>,
}

/// One entry of the top-level menu. Live events are injected between Login
/// and Year Choice whenever the front page advertises any.
enum MainMenuEntry {
    Login,
    Live { content_id: String, title: String },
    YearChoice,
    Archive,
    Shows,
    Documentaries,
    Quit,
}

impl fmt::Display for MainMenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainMenuEntry::Login => write!(f, "Login"),
            MainMenuEntry::Live { content_id, title } => {
                write!(f, "LIVE EVENT - {} ({})", title, content_id)
            }
            MainMenuEntry::YearChoice => write!(f, "Year Choice"),
            MainMenuEntry::Archive => write!(f, "Archive"),
            MainMenuEntry::Shows => write!(f, "Shows"),
            MainMenuEntry::Documentaries => write!(f, "Documentaries"),
            MainMenuEntry::Quit => write!(f, "Quit"),
        }
    }
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load().context("Failed to load config")?;
        let api = ApiClient::new()?;
        let player = Player::new(config.player_command());

        Ok(Self {
            api,
            cache: TokenCache::new(AUTH_FILE),
            config,
            player,
            token: None,
        })
    }

    /// Top-level menu loop. Any failed operation prints one message and
    /// control returns to the menu; only Quit leaves the loop.
    pub async fn run(&mut self) -> Result<()> {
        println!("pitwall - F1 TV terminal client");
        loop {
            match self.main_menu().await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => {
                    error!(error = ?e, "operation failed");
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }

    async fn main_menu(&mut self) -> Result<bool> {
        println!();
        let entries = self.build_main_menu().await;
        let labels: Vec<String> = entries.iter().map(|entry| entry.to_string()).collect();
        let index = prompt::select("Choice> ", &labels)?;
        let entry = entries
            .into_iter()
            .nth(index)
            .context("menu selection out of range")?;

        match entry {
            MainMenuEntry::Login => self.login().await?,
            MainMenuEntry::Live { content_id, .. } => {
                let playable = self.navigate(NavState::Streams { content_id }).await?;
                self.play(playable).await?;
            }
            MainMenuEntry::YearChoice => {
                let year = prompt::read_number("Year Choice> ")?;
                let playable = self.navigate(NavState::Meetings { year }).await?;
                self.play(playable).await?;
            }
            MainMenuEntry::Archive => {
                let playable = self.navigate(NavState::ArchiveHome).await?;
                self.play(playable).await?;
            }
            MainMenuEntry::Shows => {
                let playable = self
                    .navigate(NavState::CollectionBlocks {
                        page_id: nav::SHOWS_PAGE_ID,
                    })
                    .await?;
                self.play(playable).await?;
            }
            MainMenuEntry::Documentaries => {
                let playable = self
                    .navigate(NavState::CollectionBlocks {
                        page_id: nav::DOCUMENTARIES_PAGE_ID,
                    })
                    .await?;
                self.play(playable).await?;
            }
            MainMenuEntry::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn build_main_menu(&self) -> Vec<MainMenuEntry> {
        let mut entries = vec![MainMenuEntry::Login];

        // a front page hiccup degrades to a menu without live entries
        match self.api.fetch_page(nav::FRONT_PAGE_ID).await {
            Ok(page) => entries.extend(live_events(&page)),
            Err(e) => warn!(error = %e, "front page unavailable, omitting live events"),
        }

        entries.extend([
            MainMenuEntry::YearChoice,
            MainMenuEntry::Archive,
            MainMenuEntry::Shows,
            MainMenuEntry::Documentaries,
            MainMenuEntry::Quit,
        ]);
        entries
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn login(&mut self) -> Result<()> {
        let username = self.prompt_username()?;
        let password = self.obtain_password(&username)?;

        let api_key = self.api.fetch_api_key().await?;

        // the group id rides along on every catalog path; a lookup failure
        // keeps the default
        match self.api.fetch_group_id().await {
            Ok(group_id) => self.api.set_group_id(group_id),
            Err(e) => warn!(error = %e, "user location lookup failed, keeping default group id"),
        }

        let api = self.api.clone();
        let auth_user = username.clone();
        let auth_pass = password.clone();
        let token = self
            .cache
            .get_token(move || async move {
                api.authenticate(&api_key, &auth_user, &auth_pass).await
            })
            .await?;
        self.token = Some(token);

        if let Err(e) = CredentialStore::store(&username, &password) {
            warn!(error = %e, "Failed to store credentials in keychain");
        }
        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!("login successful");
        println!("Login successful.");
        Ok(())
    }

    fn prompt_username(&self) -> Result<String> {
        if let Ok(username) = std::env::var("PITWALL_USERNAME") {
            if !username.is_empty() {
                return Ok(username);
            }
        }

        match self.config.last_username {
            Some(ref last) => {
                let input = prompt::read_line(&format!("Username [{}]: ", last))?;
                if input.is_empty() {
                    Ok(last.clone())
                } else {
                    Ok(input)
                }
            }
            None => prompt::read_line("Username: "),
        }
    }

    fn obtain_password(&self, username: &str) -> Result<String> {
        if let Ok(password) = std::env::var("PITWALL_PASSWORD") {
            if !password.is_empty() {
                return Ok(password);
            }
        }

        if CredentialStore::has_credentials(username) {
            let answer = prompt::read_line("Use stored password? [Y/n]: ")?;
            if answer.to_lowercase() != "n" {
                return CredentialStore::get_password(username);
            }
        }

        Ok(rpassword::prompt_password("Password: ")?)
    }

    /// Produce a usable subscription token for playback, renewing silently
    /// with the stored password when the cached token has lapsed.
    async fn ensure_token(&mut self) -> Result<String> {
        if let Some(ref token) = self.token {
            return Ok(token.clone());
        }

        // a fresh record from an earlier run is still usable
        if let Ok(Some(record)) = self.cache.load() {
            if record.is_fresh() {
                self.token = Some(record.token.clone());
                return Ok(record.token);
            }
        }

        if let Some(username) = self.config.last_username.clone() {
            if CredentialStore::has_credentials(&username) {
                info!("renewing subscription token with stored credentials");
                let password = CredentialStore::get_password(&username)?;
                let api_key = self.api.fetch_api_key().await?;
                let api = self.api.clone();
                let token = self
                    .cache
                    .get_token(move || async move {
                        api.authenticate(&api_key, &username, &password).await
                    })
                    .await?;
                self.token = Some(token.clone());
                return Ok(token);
            }
        }

        anyhow::bail!("Not logged in - choose Login from the main menu first")
    }

    // =========================================================================
    // Catalog traversal
    // =========================================================================

    async fn navigate(&mut self, start: NavState) -> Result<Playable> {
        let mut state = start;
        loop {
            state = match state {
                NavState::Playable(playable) => return Ok(playable),
                NavState::Meetings { year } => self.choose_meeting(year).await?,
                NavState::Sessions { meeting_key } => self.choose_session(&meeting_key).await?,
                NavState::Streams { content_id } => self.choose_stream(content_id).await?,
                NavState::ArchiveHome => self.choose_archive_block().await?,
                NavState::CollectionBlocks { page_id } => {
                    self.choose_collection_block(page_id).await?
                }
                NavState::CollectionSeasons { access } => self.choose_season(access).await?,
                NavState::SeasonPage { page_id } => self.choose_from_season_page(&page_id).await?,
            };
        }
    }

    async fn choose_meeting(&self, year: u32) -> Result<NavState> {
        let page = self.api.search_meetings(year).await?;
        let labels: Vec<String> = page.containers.iter().map(title_label).collect();
        let index = prompt::select("Meeting Choice> ", &labels)?;

        let meeting_key = page.containers[index]
            .metadata
            .as_ref()
            .and_then(|m| m.emf_attributes.as_ref())
            .and_then(|emf| emf.meeting_key.clone())
            .ok_or(ApiError::MissingField("metadata.emfAttributes.MeetingKey"))?;
        Ok(NavState::Sessions { meeting_key })
    }

    async fn choose_session(&self, meeting_key: &str) -> Result<NavState> {
        let page = self.api.fetch_meeting_sessions(meeting_key).await?;
        let labels: Vec<String> = page.containers.iter().map(title_label).collect();
        let index = prompt::select("Session Choice> ", &labels)?;

        let content_id = page.containers[index]
            .id
            .clone()
            .ok_or(ApiError::MissingField("containers.id"))?;
        Ok(NavState::Streams { content_id })
    }

    /// Stream-variant step. A video without `additionalStreams` metadata
    /// goes straight to its main feed; otherwise entry 1 of the menu is the
    /// main feed and the variants follow in provider order.
    async fn choose_stream(&self, content_id: String) -> Result<NavState> {
        let page = self.api.fetch_video_details(&content_id).await?;
        let container = page
            .containers
            .first()
            .ok_or(ApiError::MissingField("resultObj.containers"))?;

        let additional = container
            .metadata
            .as_ref()
            .and_then(|m| m.additional_streams.clone());

        let streams = match additional {
            None => return Ok(NavState::Playable(Playable::main_feed(content_id))),
            Some(streams) => streams,
        };

        let mut labels = vec!["Main Feed".to_string()];
        labels.extend(streams.iter().map(|stream| stream.display_label()));
        let index = prompt::select("Channel Choice> ", &labels)?;

        let playable = nav::playable_for_stream_index(&content_id, &streams, index)?;
        Ok(NavState::Playable(playable))
    }

    async fn choose_archive_block(&self) -> Result<NavState> {
        let page = self.api.fetch_page(nav::ARCHIVE_PAGE_ID).await?;

        // only labeled trays that actually hold content
        let blocks: Vec<&Container> = page
            .containers
            .iter()
            .filter(|c| c.label().is_some() && !c.tray_items().is_empty())
            .collect();
        let labels: Vec<String> = blocks
            .iter()
            .map(|c| c.label().unwrap_or_default().to_string())
            .collect();
        let index = prompt::select("Choice> ", &labels)?;

        let uri = blocks[index]
            .retrieve_items
            .as_ref()
            .and_then(|r| r.uri_original.as_deref())
            .ok_or(ApiError::MissingField("retrieveItems.uriOriginal"))?;
        let collection_id = nav::collection_id_from_uri(uri)
            .ok_or(ApiError::MissingField("uriOriginal collection id"))?;

        Ok(NavState::CollectionSeasons {
            access: CollectionAccess::Collection { collection_id },
        })
    }

    async fn choose_collection_block(&self, page_id: &'static str) -> Result<NavState> {
        let page = self.api.fetch_page(page_id).await?;
        let labels: Vec<String> = page.containers.iter().map(block_label).collect();
        let index = prompt::select("Choice> ", &labels)?;

        let uri = page.containers[index]
            .retrieve_items
            .as_ref()
            .and_then(|r| r.uri_original.as_deref());

        // prefer the collection reference; a tray without one still knows
        // the search query it was built from
        let access = match uri.and_then(nav::collection_id_from_uri) {
            Some(collection_id) => CollectionAccess::Collection { collection_id },
            None => {
                let params = uri
                    .and_then(nav::search_params_from_uri)
                    .ok_or(ApiError::MissingField("retrieveItems.uriOriginal"))?;
                CollectionAccess::Search { params }
            }
        };
        Ok(NavState::CollectionSeasons { access })
    }

    async fn choose_season(&self, access: CollectionAccess) -> Result<NavState> {
        let from_search = matches!(&access, CollectionAccess::Search { .. });
        let page = match &access {
            CollectionAccess::Collection { collection_id } => {
                self.api.fetch_collection(collection_id).await?
            }
            CollectionAccess::Search { params } => self.api.search_with_params(params).await?,
        };

        let labels: Vec<String> = page
            .containers
            .iter()
            .map(|c| season_label(c, from_search))
            .collect();
        let index = prompt::select("Choice> ", &labels)?;
        let container = &page.containers[index];

        // richer parse first: an action uri pointing at a season page
        if let Some(page_id) = container
            .actions
            .first()
            .and_then(|a| a.uri.as_deref())
            .and_then(nav::page_id_from_uri)
        {
            return Ok(NavState::SeasonPage { page_id });
        }

        // no page reference means this entry is itself a video, typically a
        // season review
        let content_id = container
            .id
            .clone()
            .ok_or(ApiError::MissingField("containers.id"))?;
        Ok(NavState::Streams { content_id })
    }

    async fn choose_from_season_page(&self, page_id: &str) -> Result<NavState> {
        let page = self.api.fetch_page(page_id).await?;

        let categories: Vec<&Container> = page
            .containers
            .iter()
            .filter(|c| !c.tray_items().is_empty())
            .collect();
        let labels: Vec<String> = categories
            .iter()
            .map(|c| c.label().or_else(|| c.title()).unwrap_or("(unlabeled)").to_string())
            .collect();
        let index = prompt::select("Choice> ", &labels)?;

        let items = categories[index].tray_items();
        let item_labels: Vec<String> = items.iter().map(title_label).collect();
        let item_index = prompt::select("Choice> ", &item_labels)?;

        let content_id = items[item_index]
            .id
            .clone()
            .ok_or(ApiError::MissingField("containers.id"))?;
        Ok(NavState::Streams { content_id })
    }

    // =========================================================================
    // Playback
    // =========================================================================

    async fn play(&mut self, playable: Playable) -> Result<()> {
        let token = self.ensure_token().await?;
        let url = self
            .api
            .resolve_playback(&token, &playable.content_id, playable.channel_id.as_deref())
            .await?;
        self.player.play(&url)
    }
}

fn title_label(container: &Container) -> String {
    container.title().unwrap_or("(untitled)").to_string()
}

/// Label for a shows/documentaries tray: its own label, or for unnamed
/// trays the comma-joined titles of the items inside.
fn block_label(container: &Container) -> String {
    if let Some(label) = container.label() {
        if !container.tray_items().is_empty() {
            return label.to_string();
        }
    }

    let titles: Vec<&str> = container
        .tray_items()
        .iter()
        .filter_map(|item| item.title())
        .collect();
    if titles.is_empty() {
        "None".to_string()
    } else {
        titles.join(", ")
    }
}

/// Label for a season entry: collections carry `metadata.season`, search
/// results only a title.
fn season_label(container: &Container, from_search: bool) -> String {
    if !from_search {
        if let Some(season) = container.metadata.as_ref().and_then(|m| m.season.as_deref()) {
            return season.to_string();
        }
    }
    title_label(container)
}

/// Scan the front page for containers whose items are flagged LIVE.
fn live_events(page: &ContainerPage) -> Vec<MainMenuEntry> {
    let mut events = Vec::new();
    for container in &page.containers {
        for item in container.tray_items() {
            let is_live = item
                .metadata
                .as_ref()
                .and_then(|m| m.content_subtype.as_deref())
                == Some("LIVE");
            if !is_live {
                continue;
            }
            if let Some(content_id) = item.id.clone() {
                events.push(MainMenuEntry::Live {
                    content_id,
                    title: title_label(item),
                });
            }
        }
    }
    events
}
