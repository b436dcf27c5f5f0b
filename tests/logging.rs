use airplay_watcher::logging::{LoggingError, init_logging};

// Installs the global subscriber, so it lives alone in this test binary.
#[test]
fn second_init_is_an_error() {
    assert!(init_logging().is_ok());
    assert!(matches!(init_logging(), Err(LoggingError::TracingInit(_))));
}
