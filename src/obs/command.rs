//! obs-websocket 4.x request types

use serde::Serialize;

/// Scene every camera item lives in
pub const SCENE_NAME: &str = "Scene1";

/// `SetSceneItemProperties` request (obs-websocket 4.x wire format)
#[derive(Debug, Clone, Serialize)]
pub struct SetSceneItemProperties {
    #[serde(rename = "request-type")]
    pub request_type: &'static str,
    #[serde(rename = "message-id")]
    pub message_id: String,
    pub item: String,
    pub visible: bool,
    #[serde(rename = "scene-name")]
    pub scene_name: &'static str,
}

impl SetSceneItemProperties {
    /// Build a visibility toggle for one scene item
    pub fn visibility(message_id: u64, item: &str, visible: bool) -> Self {
        Self {
            request_type: "SetSceneItemProperties",
            message_id: message_id.to_string(),
            item: item.to_string(),
            visible,
            scene_name: SCENE_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let command = SetSceneItemProperties::visibility(7, "cam3", true);
        let json = serde_json::to_value(&command).unwrap();

        assert_eq!(json["request-type"], "SetSceneItemProperties");
        assert_eq!(json["message-id"], "7");
        assert_eq!(json["item"], "cam3");
        assert_eq!(json["visible"], true);
        assert_eq!(json["scene-name"], "Scene1");
    }
}
