/// Log the error of a `Result`, if any, saying what was being done when it happened.
#[macro_export]
macro_rules! log_err {
    ($doing:expr, $result:expr $(,)?) => {
        if let Err(err) = $result {
            log::error!("Error {}: {:?}", $doing, err);
        }
    };
}
