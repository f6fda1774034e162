//! Catalog navigation states and the uri surgery the provider requires.
//!
//! Navigation is an explicit state machine rather than a set of mutually
//! recursive menu functions: each state fetches one list, takes one menu
//! selection and yields either a deeper state or the terminal [`Playable`].
//! The main chain is `Meetings -> Sessions -> Streams -> Playable`; archive,
//! shows and documentaries are lateral entry points that rejoin that chain
//! once a single video has been narrowed down.

use crate::models::AdditionalStream;
use crate::ui::prompt::{selection_index, PromptError};

/// Front page; scanned for currently live events
pub const FRONT_PAGE_ID: &str = "395";
/// Archive landing page
pub const ARCHIVE_PAGE_ID: &str = "493";
/// Shows landing page
pub const SHOWS_PAGE_ID: &str = "410";
/// Documentaries landing page
pub const DOCUMENTARIES_PAGE_ID: &str = "413";

/// One step of the catalog traversal.
#[derive(Debug, Clone)]
pub enum NavState {
    /// Meetings (race weekends) of a season
    Meetings { year: u32 },
    /// Broadcast sessions of one meeting
    Sessions { meeting_key: String },
    /// Stream-variant choice for a single video
    Streams { content_id: String },
    /// Archive landing page: labeled content trays
    ArchiveHome,
    /// Shows/documentaries landing page
    CollectionBlocks { page_id: &'static str },
    /// Season list of one collection tray
    CollectionSeasons { access: CollectionAccess },
    /// A season's page: categories, then their items
    SeasonPage { page_id: String },
    /// Terminal state: a playable stream has been identified
    Playable(Playable),
}

/// How a collection tray's contents are reached. Most trays reference an
/// external collection id; some only carry the raw search query they were
/// built from.
#[derive(Debug, Clone)]
pub enum CollectionAccess {
    Collection { collection_id: String },
    Search { params: Vec<(String, String)> },
}

/// A fully resolved leaf: content id plus the optional channel of an
/// additional stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playable {
    pub content_id: String,
    pub channel_id: Option<String>,
}

impl Playable {
    pub fn main_feed(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            channel_id: None,
        }
    }
}

/// Map a stream-variant menu pick onto a playable.
///
/// The menu is main feed first, then the additional streams in provider
/// order, so index 0 plays without a channel id and index k maps to
/// `additional[k-1]`. Whether the main feed is genuinely always first is an
/// observed provider behavior, not a documented contract.
pub fn playable_for_stream_index(
    content_id: &str,
    additional: &[AdditionalStream],
    index: usize,
) -> Result<Playable, PromptError> {
    // re-validate as a 1-based ordinal against main feed + variants
    let index = selection_index(index as i64 + 1, additional.len() + 1)?;
    if index == 0 {
        return Ok(Playable::main_feed(content_id));
    }
    Ok(Playable {
        content_id: content_id.to_string(),
        channel_id: additional[index - 1].channel_id(),
    })
}

/// Collection id embedded in a tray uri, after `/TRAY/EXTCOLLECTION/`.
pub fn collection_id_from_uri(uri: &str) -> Option<String> {
    let id = uri.split("/TRAY/EXTCOLLECTION/").nth(1)?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Page id embedded in an action uri, between `ALL/PAGE/` and the next `/`.
pub fn page_id_from_uri(uri: &str) -> Option<String> {
    let rest = uri.split("ALL/PAGE/").nth(1)?;
    let id = rest.split('/').next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Query parameters of a raw search uri, for trays without a collection id.
pub fn search_params_from_uri(uri: &str) -> Option<Vec<(String, String)>> {
    let query = uri.split('?').nth(1)?;
    let params: Vec<(String, String)> = query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect();
    (!params.is_empty()).then_some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(channels: &[&str]) -> Vec<AdditionalStream> {
        channels
            .iter()
            .map(|channel| AdditionalStream {
                title: Some(format!("stream {}", channel)),
                kind: Some("obc".to_string()),
                playback_url: Some(format!(
                    "CONTENT/PLAY?channelId={}&contentId=42",
                    channel
                )),
            })
            .collect()
    }

    #[test]
    fn test_ordinal_one_is_main_feed() {
        let additional = streams(&["1022", "1023"]);
        let playable = playable_for_stream_index("42", &additional, 0).unwrap();
        assert_eq!(playable, Playable::main_feed("42"));
    }

    #[test]
    fn test_ordinal_k_maps_to_k_minus_second_stream() {
        let additional = streams(&["1022", "1023", "1024"]);

        // ordinal 2 -> first additional stream
        let playable = playable_for_stream_index("42", &additional, 1).unwrap();
        assert_eq!(playable.channel_id.as_deref(), Some("1022"));

        // ordinal 4 -> third additional stream
        let playable = playable_for_stream_index("42", &additional, 3).unwrap();
        assert_eq!(playable.channel_id.as_deref(), Some("1024"));
    }

    #[test]
    fn test_stream_index_out_of_bounds() {
        let additional = streams(&["1022"]);
        // menu has 2 entries (main feed + one variant)
        assert!(playable_for_stream_index("42", &additional, 2).is_err());
    }

    #[test]
    fn test_collection_id_from_uri() {
        let uri = "/2.0/R/ENG/BIG_SCREEN_HLS/ALL/TRAY/EXTCOLLECTION/8230";
        assert_eq!(collection_id_from_uri(uri).as_deref(), Some("8230"));
        assert_eq!(collection_id_from_uri("/ALL/PAGE/493"), None);
    }

    #[test]
    fn test_page_id_from_uri() {
        let uri = "/2.0/R/ENG/BIG_SCREEN_HLS/ALL/PAGE/1510/F1_TV_Pro_Monthly/14";
        assert_eq!(page_id_from_uri(uri).as_deref(), Some("1510"));
        assert_eq!(page_id_from_uri("no page here"), None);
    }

    #[test]
    fn test_search_params_from_uri() {
        let uri = "/ALL/PAGE/SEARCH/VOD?filter_objectSubtype=Show&filter_fetchAll=Y";
        let params = search_params_from_uri(uri).unwrap();
        assert_eq!(
            params,
            vec![
                ("filter_objectSubtype".to_string(), "Show".to_string()),
                ("filter_fetchAll".to_string(), "Y".to_string()),
            ]
        );
        assert_eq!(search_params_from_uri("/ALL/PAGE/410"), None);
    }
}
