use std::sync::Arc;

use tracing::debug;

use super::{Request, Response};
use crate::config::CoreConfig;
use crate::error::Result;
use crate::types::ByteView;

/// Creates messages that share one configuration snapshot.
///
/// Messages keep the `Arc` they were built with, so a factory created from a
/// new configuration does not affect messages already in flight.
#[derive(Debug, Clone, Default)]
pub struct MessageFactory {
    config: Arc<CoreConfig>,
}

impl MessageFactory {
    pub fn new(config: Arc<CoreConfig>) -> Self {
        MessageFactory { config }
    }

    /// Validates `config` before building the factory.
    pub fn with_config(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        debug!(hot_level = config.hot_priority_level, policy = ?config.key_policy, "message factory configured");
        Ok(MessageFactory::new(Arc::new(config)))
    }

    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.config
    }

    pub fn request(&self, method: impl Into<ByteView>, uri: impl Into<ByteView>) -> Request {
        Request::new(Arc::clone(&self.config), method, uri)
    }

    pub fn response(&self, status: u16) -> Response {
        Response::new(Arc::clone(&self.config), status)
    }

    /// A response carrying the request's Via, From, To, Call-ID and CSeq
    pub fn response_for(&self, request: &Request, status: u16) -> Response {
        Response::for_request(request, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SipMessage;

    #[test]
    fn test_shared_config() {
        let factory = MessageFactory::with_config(CoreConfig::default().with_compact_headers()).unwrap();
        let request = factory.request("OPTIONS", "sip:carol@chicago.com");
        let response = factory.response(200);
        assert!(Arc::ptr_eq(request.core().config(), factory.config()));
        assert!(Arc::ptr_eq(response.core().config(), factory.config()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CoreConfig::default().with_hot_priority_level(1000);
        assert!(MessageFactory::with_config(config).is_err());
    }
}
