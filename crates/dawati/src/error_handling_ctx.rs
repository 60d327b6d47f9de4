use itertools::Itertools;

/// Print an error to the log, including its full chain of causes.
pub fn print_error(err: anyhow::Error) {
    if let Some(json_err) = err.downcast_ref::<serde_json::Error>() {
        log::error!("{:?}\n{}", err, json_hint(json_err));
    } else {
        log::error!("{:?}", err);
    }
}

/// Format an error as a single line, suitable for sending back to a client.
pub fn format_error(err: &anyhow::Error) -> String {
    err.chain().map(|cause| cause.to_string()).dedup().join(": ")
}

fn json_hint(err: &serde_json::Error) -> &'static str {
    match err.classify() {
        serde_json::error::Category::Syntax | serde_json::error::Category::Eof => "hint: toolbar.json is not valid JSON",
        serde_json::error::Category::Data => "hint: toolbar.json needs at least an `order` list of panel names",
        serde_json::error::Category::Io => "hint: toolbar.json could not be read",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_format_error_joins_causes() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("no such panel")).context("Failed to build button for volume");
        assert_eq!(format_error(&result.unwrap_err()), "Failed to build button for volume: no such panel");
    }
}
