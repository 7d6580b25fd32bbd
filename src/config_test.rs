use super::*;

#[test]
fn default_matches_compiled_values() {
    let cfg = RoomConfig::default();
    assert_eq!(cfg.throttle, Duration::from_millis(50));
    assert_eq!(cfg.focus_pulse, Duration::from_millis(1500));
    assert_eq!(cfg.channel_capacity, 256);
}

#[test]
fn env_parse_falls_back_on_garbage() {
    // Env mutation is process-global, so use a key no other test touches.
    unsafe { std::env::set_var("COREAD_TEST_GARBAGE", "not-a-number") };
    let parsed: u64 = env_parse("COREAD_TEST_GARBAGE", 99);
    assert_eq!(parsed, 99);
    unsafe { std::env::remove_var("COREAD_TEST_GARBAGE") };
}

#[test]
fn env_parse_reads_valid_values() {
    unsafe { std::env::set_var("COREAD_TEST_VALID", "120") };
    let parsed: u64 = env_parse("COREAD_TEST_VALID", 50);
    assert_eq!(parsed, 120);
    unsafe { std::env::remove_var("COREAD_TEST_VALID") };
}
