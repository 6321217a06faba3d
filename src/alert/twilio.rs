// src/alert/twilio.rs
use super::{Notifier, NotifyError};
use crate::check::PHONE_LEN;
use crate::config::TwilioConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

const MAX_MESSAGE_LEN: usize = 1600;

/// SMS delivery through the Twilio Messages API.
pub struct TwilioNotifier {
    config: TwilioConfig,
    client: Client,
}

impl TwilioNotifier {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        let phone = phone.trim();
        if phone.chars().count() != PHONE_LEN {
            return Err(NotifyError::InvalidPhone(phone.to_string()));
        }

        let message = message.trim();
        let len = message.chars().count();
        if len == 0 || len > MAX_MESSAGE_LEN {
            return Err(NotifyError::InvalidMessage(len));
        }

        let to = format!("+1{}", phone);
        let form = [
            ("From", self.config.from_phone.as_str()),
            ("To", to.as_str()),
            ("Body", message),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(NotifyError::Rejected(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(api_base: String) -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_phone: "+15005550006".to_string(),
            api_base,
        }
    }

    #[tokio::test]
    async fn test_posts_form_to_messages_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("To".to_string(), "+15551234567".to_string()),
                Matcher::UrlEncoded("From".to_string(), "+15005550006".to_string()),
                Matcher::UrlEncoded("Body".to_string(), "hello".to_string()),
            ]))
            .with_status(201)
            .create_async()
            .await;

        let notifier = TwilioNotifier::new(config(server.url()));
        notifier.send("5551234567", "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(400)
            .create_async()
            .await;

        let notifier = TwilioNotifier::new(config(server.url()));
        let err = notifier.send("5551234567", "hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(400)));
    }

    #[tokio::test]
    async fn test_rejects_bad_input_without_calling_out() {
        let notifier = TwilioNotifier::new(config("http://127.0.0.1:9".to_string()));

        let err = notifier.send("123", "hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidPhone(_)));

        let err = notifier.send("5551234567", "   ").await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidMessage(0)));

        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        let err = notifier.send("5551234567", &long).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidMessage(_)));
    }
}
