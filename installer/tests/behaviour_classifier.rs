//! Behaviour-driven tests for source applicability.

use archive_fetch::classifier::{Applicability, can_handle};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[derive(Default)]
struct ClassifierWorld {
    source: RefCell<String>,
    applicability: RefCell<Option<Applicability>>,
}

#[fixture]
fn classifier_world() -> ClassifierWorld {
    ClassifierWorld::default()
}

#[given("the source \"{source}\"")]
fn given_source(classifier_world: &ClassifierWorld, source: String) {
    classifier_world.source.replace(source);
}

#[when("applicability is checked")]
fn when_checked(classifier_world: &ClassifierWorld) {
    let result = can_handle(&classifier_world.source.borrow());
    classifier_world.applicability.replace(Some(result));
}

#[then("the source is applicable")]
fn then_applicable(classifier_world: &ClassifierWorld) {
    let applicability = classifier_world.applicability.borrow();
    assert_eq!(applicability.as_ref(), Some(&Applicability::Applicable));
}

#[then("the source is not applicable")]
fn then_not_applicable(classifier_world: &ClassifierWorld) {
    let applicability = classifier_world.applicability.borrow();
    assert!(
        matches!(applicability.as_ref(), Some(Applicability::NotApplicable(_))),
        "got {applicability:?}"
    );
}

#[then("the rejection mentions \"{keyword}\"")]
fn then_rejection_mentions(classifier_world: &ClassifierWorld, keyword: String) {
    let applicability = classifier_world.applicability.borrow();
    match applicability.as_ref() {
        Some(Applicability::NotApplicable(reason)) => {
            let text = reason.to_string();
            assert!(text.contains(&keyword), "expected '{keyword}' in: {text}");
        }
        other => panic!("expected NotApplicable, got {other:?}"),
    }
}

#[scenario(
    path = "tests/features/classifier.feature",
    name = "An https tarball is applicable"
)]
fn scenario_https_tarball(classifier_world: ClassifierWorld) {
    let _ = classifier_world;
}

#[scenario(
    path = "tests/features/classifier.feature",
    name = "An ftp zip archive is applicable"
)]
fn scenario_ftp_zip(classifier_world: ClassifierWorld) {
    let _ = classifier_world;
}

#[scenario(
    path = "tests/features/classifier.feature",
    name = "An unsupported scheme is rejected"
)]
fn scenario_unsupported_scheme(classifier_world: ClassifierWorld) {
    let _ = classifier_world;
}

#[scenario(
    path = "tests/features/classifier.feature",
    name = "A non-archive path is rejected"
)]
fn scenario_non_archive(classifier_world: ClassifierWorld) {
    let _ = classifier_world;
}

#[scenario(
    path = "tests/features/classifier.feature",
    name = "An invalid URL is rejected"
)]
fn scenario_invalid_url(classifier_world: ClassifierWorld) {
    let _ = classifier_world;
}
