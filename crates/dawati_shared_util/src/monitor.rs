use std::fmt;

use serde::{Deserialize, Serialize};

/// Selects the monitor the toolbar is shown on: either its index, or its model name as reported by gdk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonitorIdentifier {
    Numeric(i32),
    Name(String),
}

impl fmt::Display for MonitorIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(index) => write!(f, "monitor #{}", index),
            Self::Name(model) => write!(f, "monitor `{}`", model),
        }
    }
}
