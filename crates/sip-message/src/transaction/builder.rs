use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::classic::ClassicKeyCollector;
use super::key::{KeyAlgorithm, TransactionKey};
use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::message::{MessageCore, SipMessage};
use crate::parser::framing;
use crate::types::{ByteView, HeaderId, HeaderName, MAGIC_COOKIE};

/// Derives transaction keys under a configuration snapshot.
///
/// The branch cookie key is preferred when asked for; a message whose top
/// Via branch does not carry the RFC 3261 cookie silently gets a classic key
/// instead. Only a failed classic derivation is an error.
#[derive(Debug, Clone)]
pub struct TransactionKeyBuilder {
    config: Arc<CoreConfig>,
}

impl TransactionKeyBuilder {
    pub fn new(config: Arc<CoreConfig>) -> Self {
        TransactionKeyBuilder { config }
    }

    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.config
    }

    /// Returns the message's key, deriving and caching it on first use.
    ///
    /// The cached key is returned as long as it has not been cleared with
    /// [`MessageCore::clear_transaction_key`], whatever `policy` says.
    pub fn derive<M: SipMessage>(&self, message: &mut M, policy: KeyAlgorithm) -> Result<TransactionKey> {
        if let Some(key) = message.core().transaction_key() {
            trace!(%key, "transaction key cached");
            return Ok(key.clone());
        }

        let key = match policy {
            KeyAlgorithm::BranchCookie => match self.branch_cookie_key(message.core()) {
                Some(key) => key,
                None => {
                    debug!(
                        branch = ?message.core().top_via_branch(),
                        "no usable branch cookie, falling back to classic key"
                    );
                    self.classic_key(message)?
                }
            },
            KeyAlgorithm::Classic => self.classic_key(message)?,
        };
        message.core_mut().set_transaction_key(key.clone());
        Ok(key)
    }

    /// The RFC 3261 key: the top Via branch, when it is longer than the magic
    /// cookie and starts with it, plus the CSeq method.
    pub fn branch_cookie_key(&self, core: &MessageCore) -> Option<TransactionKey> {
        let via = core
            .headers()
            .slot(&HeaderName::Known(HeaderId::Via))?
            .first()?
            .as_via()?;
        let branch = via.branch()?;
        if branch.len() <= MAGIC_COOKIE.len() || !branch.starts_with(MAGIC_COOKIE) {
            return None;
        }
        let method = core.cseq_method()?;
        Some(TransactionKey::branch_cookie(
            branch.clone(),
            method.clone(),
            via.host().clone(),
            via.port(),
            self.config.key_context,
        ))
    }

    /// The RFC 2543 key, collected from the finalized bytes.
    ///
    /// Finalizes the message if it is not already.
    pub fn classic_key<M: SipMessage>(&self, message: &mut M) -> Result<TransactionKey> {
        let wire = ByteView::new(message.finalize());
        let mut collector = ClassicKeyCollector::new(self.config.uniquifier_header.as_deref());
        let collected = match framing::scan(&wire, &mut collector) {
            Ok(()) => collector.finish(self.config.key_context),
            Err(Error::KeyDerivationFailed(reason)) => Err(Error::KeyDerivationFailed(reason)),
            Err(other) => Err(Error::KeyDerivationFailed(other.to_string())),
        };
        collected.map_err(|err| {
            warn!(error = %err, "transaction key derivation failed");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageFactory, Request};
    use crate::transaction::KeyContext;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("rvoip_sip_message=trace")
            .with_test_writer()
            .try_init();
    }

    fn invite(factory: &MessageFactory, branch: &str) -> Request {
        let mut request = factory.request("INVITE", "sip:bob@biloxi.com");
        let core = request.core_mut();
        core.add(HeaderId::Via, ByteView::from(format!("SIP/2.0/UDP pc33.atlanta.com;branch={}", branch)))
            .unwrap();
        core.add(HeaderId::To, "Bob <sip:bob@biloxi.com>").unwrap();
        core.add(HeaderId::From, "Alice <sip:alice@atlanta.com>;tag=1928301774").unwrap();
        core.set_call_id("a84b4c76e66710@pc33.atlanta.com");
        core.set_cseq(314159, "INVITE");
        request
    }

    #[test]
    fn test_cookie_key() {
        let factory = MessageFactory::default();
        let mut request = invite(&factory, "z9hG4bK776asdhds");
        let builder = TransactionKeyBuilder::new(Arc::clone(factory.config()));
        let key = builder.derive(&mut request, KeyAlgorithm::BranchCookie).unwrap();
        assert_eq!(key.algorithm(), KeyAlgorithm::BranchCookie);
        assert_eq!(*key.branch().unwrap(), "z9hG4bK776asdhds");
        assert_eq!(*key.cseq_method().unwrap(), "INVITE");
        assert!(!request.is_finalized());
    }

    #[test]
    fn test_bare_cookie_falls_back() {
        init_tracing();
        let factory = MessageFactory::default();
        let mut request = invite(&factory, "z9hG4bK");
        let builder = TransactionKeyBuilder::new(Arc::clone(factory.config()));
        let key = builder.derive(&mut request, KeyAlgorithm::BranchCookie).unwrap();
        assert_eq!(key.algorithm(), KeyAlgorithm::Classic);
        assert!(request.is_finalized());
    }

    #[test]
    fn test_missing_cseq_method_falls_back_and_fails() {
        init_tracing();
        let factory = MessageFactory::default();
        let mut request = invite(&factory, "z9hG4bKx");
        request.core_mut().remove_header(HeaderId::CSeq);
        let builder = TransactionKeyBuilder::new(Arc::clone(factory.config()));
        let err = builder.derive(&mut request, KeyAlgorithm::BranchCookie).unwrap_err();
        assert!(matches!(err, Error::KeyDerivationFailed(_)));
        assert!(request.core().transaction_key().is_none());
    }

    #[test]
    fn test_key_cached_until_cleared() {
        init_tracing();
        let factory = MessageFactory::new(Arc::new(
            CoreConfig::default().with_key_context(KeyContext::USE_VIA),
        ));
        let mut request = invite(&factory, "z9hG4bK776asdhds");
        let builder = TransactionKeyBuilder::new(Arc::clone(factory.config()));
        let first = builder.derive(&mut request, KeyAlgorithm::Classic).unwrap();
        assert_eq!(first.context(), KeyContext::USE_VIA);

        let cached = builder.derive(&mut request, KeyAlgorithm::BranchCookie).unwrap();
        assert_eq!(cached.algorithm(), KeyAlgorithm::Classic);

        request.core_mut().clear_transaction_key();
        let fresh = builder.derive(&mut request, KeyAlgorithm::BranchCookie).unwrap();
        assert_eq!(fresh.algorithm(), KeyAlgorithm::BranchCookie);
    }
}
