use socialkyc_types::{KycStep, SocialNetwork, User, UserId};
use socialkyc_verification::{TemplateError, TemplateKind, TemplateStore};
use std::fs;
use std::path::{Path, PathBuf};

fn user() -> User {
    User {
        id: UserId::new("u-1"),
        username: "alice".into(),
        kyc_step_passed: KycStep::LIVENESS_DETECTION,
        kyc_steps_last_updated_at: Vec::new(),
    }
}

fn write(root: &Path, step: KycStep, network: SocialNetwork, language: &str, body: &str) {
    let dir = root
        .join(step.to_string())
        .join(network.as_str())
        .join(TemplateKind::Post.as_str());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{language}.txt")), body).unwrap();
}

#[test]
fn falls_back_to_default_language() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), KycStep::SOCIAL_1, SocialNetwork::Twitter, "en", "hi {username}\n");
    write(dir.path(), KycStep::SOCIAL_1, SocialNetwork::Twitter, "de", "hallo {username}\n");

    let store = TemplateStore::load(
        dir.path(),
        &[KycStep::SOCIAL_1],
        &[SocialNetwork::Twitter],
        "en",
    )
    .unwrap();

    let render = |lang: &str| {
        store
            .render(KycStep::SOCIAL_1, SocialNetwork::Twitter, TemplateKind::Post, lang, &user())
            .unwrap()
    };
    assert_eq!(render("de"), "hallo alice");
    assert_eq!(render("fr"), "hi alice");
}

#[test]
fn missing_default_language_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), KycStep::SOCIAL_1, SocialNetwork::Twitter, "de", "hallo");

    let err = TemplateStore::load(
        dir.path(),
        &[KycStep::SOCIAL_1],
        &[SocialNetwork::Twitter],
        "en",
    )
    .err()
    .unwrap();
    assert!(matches!(err, TemplateError::MissingDefault { .. }));
}

#[test]
fn missing_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = TemplateStore::load(
        dir.path(),
        &[KycStep::SOCIAL_2],
        &[SocialNetwork::Twitter],
        "en",
    )
    .err()
    .unwrap();
    assert!(matches!(err, TemplateError::Read { .. }));
}

#[test]
fn bad_placeholder_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), KycStep::SOCIAL_1, SocialNetwork::Twitter, "en", "hi {nickname}");

    let err = TemplateStore::load(
        dir.path(),
        &[KycStep::SOCIAL_1],
        &[SocialNetwork::Twitter],
        "en",
    )
    .err()
    .unwrap();
    assert!(matches!(err, TemplateError::Compile { .. }));
}

#[test]
fn rendering_an_unloaded_network_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), KycStep::SOCIAL_1, SocialNetwork::Twitter, "en", "hi");
    let store = TemplateStore::load(
        dir.path(),
        &[KycStep::SOCIAL_1],
        &[SocialNetwork::Twitter],
        "en",
    )
    .unwrap();

    let err = store
        .render(KycStep::SOCIAL_1, SocialNetwork::Facebook, TemplateKind::Post, "en", &user())
        .unwrap_err();
    assert!(matches!(err, TemplateError::NotLoaded { .. }));
}

#[test]
fn bundled_translations_load() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("translations");
    let store = TemplateStore::load(
        &dir,
        &KycStep::SOCIAL_STEPS,
        &SocialNetwork::ALL,
        "en",
    )
    .unwrap();
    let text = store
        .render(KycStep::SOCIAL_2, SocialNetwork::Twitter, TemplateKind::Post, "en", &user())
        .unwrap();
    assert!(text.starts_with("Verifying my ice account alice\n"));
    assert!(text.ends_with("u-1"));
}
