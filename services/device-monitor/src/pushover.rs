//! Pushover delivery of house alerts
//!
//! Fire and gas alerts go out at high priority with the emergency sound. LPG
//! and temperature warnings use normal priority; routine alerts such as
//! auto-booking are sent quietly.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier, Urgency};
use crate::MonitorError;

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

pub struct PushoverNotifier {
    api_token: String,
    user_key: String,
    title: String,
    sound: String,
    emergency_sound: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier")
            .field("title", &self.title)
            .finish()
    }
}

impl PushoverNotifier {
    pub fn new(config: &NotifierConfig, http: Arc<dyn HttpClient>) -> Self {
        let NotifierConfig::Pushover {
            api_token,
            user_key,
            title,
            sound,
            emergency_sound,
        } = config;

        Self {
            api_token: api_token.clone(),
            user_key: user_key.clone(),
            title: title.clone(),
            sound: sound.clone(),
            emergency_sound: emergency_sound.clone(),
            http,
        }
    }

    /// "Device Monitor - House 23: gas_leak"
    fn title_for(&self, notification: &Notification) -> String {
        format!(
            "{} - House {}: {}",
            self.title, notification.device_id, notification.kind
        )
    }

    /// Pushover priority and sound for an urgency
    fn delivery_for(&self, urgency: Urgency) -> (i8, &str) {
        match urgency {
            Urgency::Routine => (-1, self.sound.as_str()),
            Urgency::Warning => (0, self.sound.as_str()),
            Urgency::Emergency => (1, self.emergency_sound.as_str()),
        }
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn type_name(&self) -> &str {
        "pushover"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let title = self.title_for(notification);
        let (priority, sound) = self.delivery_for(notification.urgency);
        let priority = priority.to_string();
        let params = [
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", title.as_str()),
            ("message", notification.message.as_str()),
            ("priority", priority.as_str()),
            ("sound", sound),
        ];

        tracing::debug!(
            "Sending {:?} alert for house {} to Pushover",
            notification.urgency,
            notification.device_id
        );

        let response = self.http.post_form(PUSHOVER_API_URL, &params).await?;
        if !response.is_success() {
            return Err(MonitorError::Notifier(format!(
                "Pushover rejected alert for house {} with status {}: {}",
                notification.device_id, response.status, response.body
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::paths::DeviceId;

    fn config() -> NotifierConfig {
        NotifierConfig::Pushover {
            api_token: "app-token".to_string(),
            user_key: "household".to_string(),
            title: "Device Monitor".to_string(),
            sound: "pushover".to_string(),
            emergency_sound: "siren".to_string(),
        }
    }

    fn alert(kind: &str, message: &str) -> Notification {
        Notification::for_alert(&DeviceId::new("23").unwrap(), kind, message)
    }

    fn accepted() -> crate::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: r#"{"status":1}"#.to_string(),
        })
    }

    #[tokio::test]
    async fn gas_leak_goes_out_as_emergency() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(|url, params| {
                url == PUSHOVER_API_URL
                    && params.contains(&("token", "app-token"))
                    && params.contains(&("user", "household"))
                    && params.contains(&("title", "Device Monitor - House 23: gas_leak"))
                    && params.contains(&("message", "Gas leak detected"))
                    && params.contains(&("priority", "1"))
                    && params.contains(&("sound", "siren"))
            })
            .times(1)
            .returning(|_, _| Box::pin(async { accepted() }));

        let notifier = PushoverNotifier::new(&config(), Arc::new(mock));
        notifier
            .notify(&alert("gas_leak", "Gas leak detected"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn routine_alert_is_sent_quietly() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(|_, params| {
                params.contains(&("title", "Device Monitor - House 23: auto-book"))
                    && params.contains(&("priority", "-1"))
                    && params.contains(&("sound", "pushover"))
            })
            .times(1)
            .returning(|_, _| Box::pin(async { accepted() }));

        let notifier = PushoverNotifier::new(&config(), Arc::new(mock));
        notifier
            .notify(&alert("auto-book", "Cylinder booked"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn lpg_warning_uses_normal_priority() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(|_, params| {
                params.contains(&("priority", "0")) && params.contains(&("sound", "pushover"))
            })
            .times(1)
            .returning(|_, _| Box::pin(async { accepted() }));

        let notifier = PushoverNotifier::new(&config(), Arc::new(mock));
        notifier.notify(&alert("lpg_low", "LPG at 12%")).await.unwrap();
    }

    #[tokio::test]
    async fn rejection_names_the_house() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 400,
                    body: r#"{"status":0,"errors":["user key is invalid"]}"#.to_string(),
                })
            })
        });

        let notifier = PushoverNotifier::new(&config(), Arc::new(mock));
        let err = notifier
            .notify(&alert("flame", "Flame detected"))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Notifier(_)));
        assert!(err.to_string().contains("house 23"));
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .returning(|_, _| Box::pin(async { Err(MonitorError::Http("timeout".to_string())) }));

        let notifier = PushoverNotifier::new(&config(), Arc::new(mock));
        let err = notifier
            .notify(&alert("flame", "Flame detected"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
