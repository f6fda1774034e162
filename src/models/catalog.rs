//! Serde models for the F1 TV content API.
//!
//! Every content endpoint wraps its payload in a `resultObj` envelope holding
//! a list of `containers`. Containers are heavily polymorphic - the same shape
//! carries meetings, sessions, archive trays and single videos - so almost
//! every field is optional and descent decisions are made on which fields are
//! actually present.

use serde::{Deserialize, Deserializer};

/// Top-level envelope common to all content endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "resultObj")]
    pub result_obj: T,
}

/// A page (or tray) of content containers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerPage {
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// One node in the provider's content tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Container {
    // Numeric for meetings, string for sessions; normalized to a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(rename = "retrieveItems", default)]
    pub retrieve_items: Option<RetrieveItems>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Container {
    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.title.as_deref())
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.label.as_deref())
    }

    /// Items of this container's tray, empty when the provider sent
    /// `retrieveItems.resultObj: {}` or no tray at all.
    pub fn tray_items(&self) -> &[Container] {
        self.retrieve_items
            .as_ref()
            .map(|r| r.result_obj.containers.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub season: Option<String>,
    #[serde(rename = "contentSubtype", default)]
    pub content_subtype: Option<String>,
    #[serde(rename = "emfAttributes", default)]
    pub emf_attributes: Option<EmfAttributes>,
    // Absent entirely when a video has only its main feed; an empty list
    // still means "show the variant menu".
    #[serde(rename = "additionalStreams", default)]
    pub additional_streams: Option<Vec<AdditionalStream>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmfAttributes {
    #[serde(rename = "MeetingKey", default, deserialize_with = "string_or_number")]
    pub meeting_key: Option<String>,
}

/// An alternate feed of a session: onboard camera, pit lane channel, data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalStream {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "playbackUrl", default)]
    pub playback_url: Option<String>,
}

impl AdditionalStream {
    /// Channel id taken from the `channelId` query parameter of the
    /// stream's playback uri.
    pub fn channel_id(&self) -> Option<String> {
        let url = self.playback_url.as_deref()?;
        let query = url.split('?').nth(1)?;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == "channelId" && !value.is_empty()).then(|| value.to_string())
        })
    }

    /// Menu line for the stream-variant prompt, e.g. "obc - VER".
    pub fn display_label(&self) -> String {
        match (self.kind.as_deref(), self.title.as_deref()) {
            (Some(kind), Some(title)) => format!("{} - {}", kind, title),
            (Some(kind), None) => kind.to_string(),
            (None, Some(title)) => title.to_string(),
            (None, None) => "(unnamed stream)".to_string(),
        }
    }
}

/// Tray reference inside a container. `uriOriginal` carries the collection
/// or search uri this tray was built from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveItems {
    #[serde(rename = "uriOriginal", default)]
    pub uri_original: Option<String>,
    #[serde(rename = "resultObj", default)]
    pub result_obj: ContainerPage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub uri: Option<String>,
}

/// `USER/LOCATION` payload, used only for the group id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLocationResult {
    #[serde(rename = "userLocation", default)]
    pub user_location: Vec<UserLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLocation {
    #[serde(rename = "groupId")]
    pub group_id: u32,
}

/// `CONTENT/PLAY` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackResult {
    pub url: String,
}

/// The provider mixes numeric and string ids across endpoints.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meeting_container() {
        let json = r#"{
            "id": 1000004297,
            "metadata": {
                "title": "Bahrain Grand Prix",
                "emfAttributes": {"MeetingKey": "1219"}
            }
        }"#;

        let container: Container = serde_json::from_str(json).unwrap();
        assert_eq!(container.id.as_deref(), Some("1000004297"));
        assert_eq!(container.title(), Some("Bahrain Grand Prix"));
        let key = container
            .metadata
            .unwrap()
            .emf_attributes
            .unwrap()
            .meeting_key;
        assert_eq!(key.as_deref(), Some("1219"));
    }

    #[test]
    fn test_parse_empty_tray() {
        // resultObj is sometimes an empty object rather than a container list
        let json = r#"{
            "metadata": {"label": "Race Replays"},
            "retrieveItems": {"resultObj": {}}
        }"#;

        let container: Container = serde_json::from_str(json).unwrap();
        assert_eq!(container.label(), Some("Race Replays"));
        assert!(container.tray_items().is_empty());
        assert!(container.retrieve_items.is_some());
    }

    #[test]
    fn test_additional_streams_absent_vs_empty() {
        let absent: Metadata = serde_json::from_str(r#"{"title": "Race"}"#).unwrap();
        assert!(absent.additional_streams.is_none());

        let empty: Metadata =
            serde_json::from_str(r#"{"title": "Race", "additionalStreams": []}"#).unwrap();
        assert!(empty.additional_streams.is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn test_channel_id_extraction() {
        let stream = AdditionalStream {
            title: Some("VER".to_string()),
            kind: Some("obc".to_string()),
            playback_url: Some(
                "CONTENT/PLAY?channelId=1022&contentId=1000004297".to_string(),
            ),
        };
        assert_eq!(stream.channel_id().as_deref(), Some("1022"));

        // channelId not the first parameter
        let stream = AdditionalStream {
            playback_url: Some(
                "CONTENT/PLAY?contentId=1000004297&channelId=1055".to_string(),
            ),
            ..Default::default()
        };
        assert_eq!(stream.channel_id().as_deref(), Some("1055"));

        // no query string at all
        let stream = AdditionalStream {
            playback_url: Some("CONTENT/PLAY".to_string()),
            ..Default::default()
        };
        assert_eq!(stream.channel_id(), None);
    }

    #[test]
    fn test_parse_playback_envelope() {
        let json = r#"{"resultObj": {"url": "https://example.com/index.m3u8"}}"#;
        let response: ApiResponse<PlaybackResult> = serde_json::from_str(json).unwrap();
        assert_eq!(response.result_obj.url, "https://example.com/index.m3u8");
    }

    #[test]
    fn test_parse_user_location() {
        let json = r#"{"resultObj": {"userLocation": [{"groupId": 14}]}}"#;
        let response: ApiResponse<UserLocationResult> = serde_json::from_str(json).unwrap();
        assert_eq!(response.result_obj.user_location[0].group_id, 14);
    }
}
