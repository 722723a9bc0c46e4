use super::*;

#[test]
fn defaults_match_documented_values() {
    let o = EngineOpts::default();
    assert_eq!(o.mode, EngineMode::Auto);
    assert_eq!(o.queue_capacity, 1024);
    assert_eq!(o.arena_block_words, 2000);
    assert_eq!(o.wake_interval, 16);
    assert_eq!(o.idle_retries, 2);
    assert!(o.validate().is_ok());
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let o = EngineOpts::from_json(r#"{"mode":"multi_threaded","threads":4}"#).unwrap();
    assert_eq!(o.mode, EngineMode::MultiThreaded);
    assert_eq!(o.threads, Some(4));
    assert_eq!(o.queue_capacity, 1024);
}

#[test]
fn json_rejects_invalid_values() {
    let err = EngineOpts::from_json(r#"{"queue_capacity":0}"#).unwrap_err();
    assert!(err.to_string().contains("queue_capacity"));
    assert!(EngineOpts::from_json("not json").is_err());
}

#[test]
fn worker_counts_are_clamped() {
    assert_eq!(clamp_workers(1), MIN_WORKERS);
    assert_eq!(clamp_workers(64), MAX_WORKERS);
    assert_eq!(EngineOpts::default().with_threads(Some(5)).resolved_threads(), 5);
}

#[test]
fn mode_names_parse() {
    assert_eq!(EngineMode::parse(" MT "), Some(EngineMode::MultiThreaded));
    assert_eq!(EngineMode::parse("st"), Some(EngineMode::SingleThreaded));
    assert_eq!(EngineMode::parse("auto"), Some(EngineMode::Auto));
    assert_eq!(EngineMode::parse("gpu"), None);
}

#[test]
fn arena_blocks_must_fit_a_full_command() {
    let err = EngineOpts::default()
        .with_arena_block_words(64)
        .validate()
        .unwrap_err();
    assert!(err.to_string().contains("arena_block_words"));
    assert!(EngineOpts::default().with_arena_block_words(512).validate().is_ok());
}

#[test]
fn builders_set_every_field() {
    let opts = EngineOpts::default()
        .with_mode(EngineMode::MultiThreaded)
        .with_threads(Some(3))
        .with_queue_capacity(16)
        .with_arena_block_words(1024)
        .with_wake_interval(4)
        .with_idle_retries(7)
        .with_auto_threshold_pixels(100);
    assert_eq!(opts.mode, EngineMode::MultiThreaded);
    assert_eq!(opts.threads, Some(3));
    assert_eq!(opts.queue_capacity, 16);
    assert_eq!(opts.arena_block_words, 1024);
    assert_eq!(opts.wake_interval, 4);
    assert_eq!(opts.idle_retries, 7);
    assert_eq!(opts.auto_threshold_pixels, 100);
    assert!(opts.validate().is_ok());
}
