//! Load contract tests
//!
//! These tests define the stable contract for the load message.

use serde::{Deserialize, Serialize};

// ===== Canonical Payload Structures =====

/// Load request payload, exactly as the content window reads it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoadPayload {
    pub id: String,
    pub access_token: String,
    #[serde(rename = "type", default)]
    pub embed_type: Option<String>,
    #[serde(default)]
    pub settings: Option<SettingsPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPayload {
    pub filter_pane_enabled: Option<bool>,
    pub nav_content_pane_enabled: Option<bool>,
}

// ===== Contract Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use core_types::EmbedType;
    use embed_components::EmbedError;
    use futures::executor::block_on;
    use ipc::{status, Method, Response, SettingsPatch};
    use serde_json::json;

    #[test]
    fn test_load_contract_for_every_type() {
        for embed_type in EmbedType::ALL {
            let channel = RecordingChannel::new();
            let instance = instance_with(embed_type, &channel);

            let load = instance.embed().attach();
            block_on(instance.embed().load(load)).unwrap();

            let request = channel.single();
            verify_request_contract(
                &request,
                Method::Post,
                &format!("/{}/load", embed_type.as_str()),
            );

            let payload: LoadPayload = serde_json::from_value(request.body).unwrap();
            assert_eq!(payload.id, "content-1");
            assert_eq!(payload.access_token, "token-1");
        }
    }

    #[test]
    fn test_load_carries_default_settings() {
        let channel = RecordingChannel::new();
        let report = report_with(&channel);

        let load = report.embed().attach();
        block_on(report.embed().load(load)).unwrap();

        assert_eq!(
            channel.single().body,
            json!({
                "id": "content-1",
                "accessToken": "token-1",
                "settings": { "filterPaneEnabled": true, "navContentPaneEnabled": true }
            })
        );
    }

    #[test]
    fn test_reload_replays_acknowledged_settings() {
        let channel = RecordingChannel::new();
        let report = report_with(&channel);
        block_on(report.embed().load(report.embed().attach())).unwrap();

        block_on(report.update_settings(SettingsPatch {
            filter_pane_enabled: Some(false),
            nav_content_pane_enabled: None,
        }))
        .unwrap();
        block_on(report.embed().reload()).unwrap();

        let sent = channel.sent();
        let payload: LoadPayload = serde_json::from_value(sent[2].body.clone()).unwrap();
        assert_eq!(
            payload.settings,
            Some(SettingsPayload {
                filter_pane_enabled: Some(false),
                nav_content_pane_enabled: Some(true),
            })
        );
    }

    #[test]
    fn test_rejected_load_surfaces_content_body() {
        let channel = RecordingChannel::new();
        let report = report_with(&channel);
        let body = json!([{ "message": "accessToken is required" }]);
        channel.reply_with(Response::new(status::BAD_REQUEST, body.clone()));

        let err = block_on(report.embed().load(report.embed().attach())).unwrap_err();

        assert!(matches!(err, EmbedError::RemoteValidation { .. }));
        assert_eq!(err.body(), Some(&body));
    }
}
