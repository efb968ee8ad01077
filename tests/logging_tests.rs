use pagecast::{setup_cli_logging, setup_logging};

#[test]
fn test_logging_setup() {
    // Installing a subscriber twice must not panic
    let result = std::panic::catch_unwind(|| {
        setup_logging();
        setup_logging();
        setup_cli_logging(true);
    });

    assert!(result.is_ok(), "logging setup should not panic");
}
