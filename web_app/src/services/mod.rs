use async_trait::async_trait;

/// Delivery of outbound messages to the upstream messaging provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingService {
    /// Sends a text message from the business number `phone_number_id` and
    /// returns the provider message id
    async fn send_text_message(
        &self,
        phone_number_id: &str,
        to: &str,
        body: &str,
    ) -> anyhow::Result<String>;
}

pub type ImplMessagingService = Box<dyn MessagingService>;
