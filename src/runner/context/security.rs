//! Security domains and the caller-class resolution that maps stack depth to a domain.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::runner::ds::error::EngineError;

/// Opaque token describing the trust level of code. Compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityDomain(pub String);

impl SecurityDomain {
    pub fn new(name: &str) -> Self {
        SecurityDomain(name.to_string())
    }
}
impl fmt::Display for SecurityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the caller-class stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerClass {
    /// The interpreter itself; its domain is whatever the running unit asserted.
    Interpreter,
    Named(String),
}

/// Host-provided access to the active call stack and per-class domains.
pub trait SecuritySupport: Send + Sync {
    /// Active classes, innermost first. Index 0 is the support object itself.
    fn class_context(&self) -> Vec<CallerClass>;

    fn security_domain(&self, class: &CallerClass) -> Option<SecurityDomain>;

    /// Load generated code under `domain`. Returns the loader's identifier.
    fn define_class(&self, name: &str, domain: Option<&SecurityDomain>) -> String {
        match domain {
            Some(d) => format!("{}@{}", name, d),
            None => name.to_string(),
        }
    }
}

pub const REQUIRED_DOMAIN_MISSING: &str = "Required security context not found";

/// Snapshot of what domain resolution needs from a context.
pub struct SecurityResolver {
    support: Option<Arc<dyn SecuritySupport>>,
    interpreter_domain: Option<SecurityDomain>,
    require_domain: bool,
}
impl SecurityResolver {
    pub fn new(
        support: Option<Arc<dyn SecuritySupport>>,
        interpreter_domain: Option<SecurityDomain>,
        require_domain: bool,
    ) -> Self {
        SecurityResolver {
            support,
            interpreter_domain,
            require_domain,
        }
    }

    fn domain_for_class(&self, support: &dyn SecuritySupport, class: &CallerClass) -> Option<SecurityDomain> {
        match class {
            CallerClass::Interpreter => self.interpreter_domain.clone(),
            CallerClass::Named(_) => support.security_domain(class),
        }
    }

    /// Domain of the class `depth` frames up, or with `None` the first non-absent domain
    /// above the support object. Without a support object nothing is found.
    pub fn domain_for_depth(&self, depth: Option<usize>) -> Result<Option<SecurityDomain>, EngineError> {
        let found = match &self.support {
            Some(support) => self.search(support.as_ref(), depth),
            None => None,
        };
        if found.is_none() && self.require_domain {
            warn!(?depth, "no security domain on the caller stack");
            return Err(EngineError::Security(REQUIRED_DOMAIN_MISSING.to_string()));
        }
        Ok(found)
    }

    fn search(&self, support: &dyn SecuritySupport, depth: Option<usize>) -> Option<SecurityDomain> {
        let classes = support.class_context();
        match depth {
            Some(d) => classes
                .get(d + 1)
                .and_then(|c| self.domain_for_class(support, c)),
            None => classes
                .iter()
                .skip(1)
                .find_map(|c| self.domain_for_class(support, c)),
        }
    }

    pub fn domain_any(&self) -> Result<Option<SecurityDomain>, EngineError> {
        self.domain_for_depth(None)
    }
}
