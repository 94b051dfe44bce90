//! Behavior of the lazy process-wide logger handle.
//!
//! The whole file shares one process, so every test tolerates the handle
//! having been installed by an earlier test; `serial` keeps them from
//! racing the one-shot initialization.

use serial_test::serial;

use gelfling::Settings;

#[test]
#[serial]
fn first_access_falls_back_to_console_when_unconfigured() {
    // No GRAYLOG_ENV in the test process: full initialization fails and
    // the handle downgrades to a console-only logger instead of panicking.
    let logger = gelfling::logger();
    assert_eq!(logger.name(), "root");
    gelfling::info("still alive", &[]);
}

#[test]
#[serial]
fn repeated_access_returns_the_same_handle() {
    let first: *const _ = gelfling::logger();
    let second: *const _ = gelfling::logger();
    assert!(std::ptr::eq(first, second));
}

#[test]
#[serial]
fn initialization_after_first_access_keeps_the_installed_handle() {
    let before = gelfling::logger().name().to_owned();
    let settings = Settings {
        app_name: "late-arrival".into(),
        environment: Some("test".into()),
        ..Settings::default()
    };
    gelfling::try_init(&settings).expect("explicit init succeeds");
    assert_eq!(gelfling::logger().name(), before);
}
