use derive_more::*;
use serde::{Deserialize, Serialize};

/// The name of a panel, as used in the toolbar order and as the basename of the panel's `.desktop` file.
#[repr(transparent)]
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsRef, From, FromStr, Display)]
pub struct PanelName(pub String);

impl std::fmt::Debug for PanelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PanelName({})", self.0)
    }
}

impl PanelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for PanelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PanelName {
    fn from(s: &str) -> Self {
        PanelName(s.to_owned())
    }
}

/// A D-Bus well-known service name, such as `com.dawati.UX.Shell.Panels.myzone`.
#[repr(transparent)]
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize, AsRef, From, FromStr, Display)]
pub struct ServiceName(pub String);

impl std::fmt::Debug for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceName({})", self.0)
    }
}

impl ServiceName {
    /// The object path a panel service exports its interface on: the service name with dots turned into slashes.
    pub fn object_path(&self) -> String {
        format!("/{}", self.0.replace('.', "/"))
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        ServiceName(s.to_owned())
    }
}
