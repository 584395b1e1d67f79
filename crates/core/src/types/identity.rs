//! Identity of a wrapped callable

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Module-qualified name of a wrapped function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallIdentity {
    module: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl CallIdentity {
    pub fn new(module: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CallIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// Build a [`CallIdentity`] for `name` in the calling module.
///
/// ```
/// use runguard_core::call_identity;
///
/// let identity = call_identity!("load_user");
/// assert_eq!(identity.name(), "load_user");
/// assert_eq!(identity.module(), module_path!());
/// ```
#[macro_export]
macro_rules! call_identity {
    ($name:expr) => {
        $crate::types::CallIdentity::new(module_path!(), $name)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_captures_module() {
        let identity = crate::call_identity!("place_order");

        assert_eq!(identity.module(), "runguard_core::types::identity::tests");
        assert_eq!(identity.name(), "place_order");
        assert_eq!(
            identity.to_string(),
            "runguard_core::types::identity::tests:place_order"
        );
    }

    #[test]
    fn test_owned_names() {
        let identity = CallIdentity::new(String::from("billing"), String::from("charge"));
        assert_eq!(identity.to_string(), "billing:charge");
    }
}
