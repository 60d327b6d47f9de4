use anyhow::{Context, Result};
use itertools::Itertools;

use crate::error_handling_ctx;

/// Response that the app may send as a response to a event.
/// This is used in `DaemonCommand`s that contain a response sender.
#[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, derive_more::Display)]
pub enum DaemonResponse {
    Success(String),
    Failure(String),
}

#[derive(Debug)]
pub struct DaemonResponseSender(tokio::sync::mpsc::UnboundedSender<DaemonResponse>);

pub fn create_pair() -> (DaemonResponseSender, tokio::sync::mpsc::UnboundedReceiver<DaemonResponse>) {
    let (sender, recv) = tokio::sync::mpsc::unbounded_channel();
    (DaemonResponseSender(sender), recv)
}

impl DaemonResponseSender {
    pub fn send_success(&self, s: String) -> Result<()> {
        self.0.send(DaemonResponse::Success(s)).context("Failed to send success response from application thread")
    }

    pub fn send_failure(&self, s: String) -> Result<()> {
        self.0.send(DaemonResponse::Failure(s)).context("Failed to send failure response from application thread")
    }

    /// Given a list of errors, respond with an error value if there are any errors, and respond with success otherwise.
    pub fn respond_with_error_list(&self, errors: impl IntoIterator<Item = anyhow::Error>) -> Result<()> {
        let errors = errors.into_iter().map(|e| error_handling_ctx::format_error(&e)).join("\n");
        if errors.is_empty() {
            self.send_success(String::new())
        } else {
            self.send_failure(errors)
        }
    }
}

pub type DaemonResponseReceiver = tokio::sync::mpsc::UnboundedReceiver<DaemonResponse>;

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_list_response() {
        let (sender, mut recv) = create_pair();
        sender.respond_with_error_list(Vec::new()).unwrap();
        assert_eq!(recv.try_recv().unwrap(), DaemonResponse::Success(String::new()));

        sender.respond_with_error_list(vec![anyhow::anyhow!("first"), anyhow::anyhow!("second")]).unwrap();
        let response = recv.try_recv().unwrap();
        assert_eq!(response, DaemonResponse::Failure("first\nsecond".to_string()));
    }
}
