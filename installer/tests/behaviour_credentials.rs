//! Behaviour-driven tests for URL credential handling during download.

use archive_fetch::archive::download::download;
use archive_fetch::source::SourceUrl;
use archive_fetch::test_utils::{StubTransport, TempRoot};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

struct CredentialsWorld {
    root: TempRoot,
    transport: StubTransport,
    source: Option<String>,
}

#[fixture]
fn world() -> CredentialsWorld {
    CredentialsWorld {
        root: TempRoot::new(),
        transport: StubTransport::serving(b"archive"),
        source: None,
    }
}

impl CredentialsWorld {
    fn download(&self, source: &str) {
        let source = SourceUrl::parse(source).expect("valid source URL");
        let dest = self.root.path().join(source.basename());
        download(&self.transport, &source, dest.as_std_path()).expect("download");
    }

    fn last_authorization(&self) -> Option<String> {
        self.transport
            .requests()
            .last()
            .expect("a request was made")
            .authorization
            .clone()
    }
}

#[given("the source \"{source}\"")]
fn given_source(world: &mut CredentialsWorld, source: String) {
    world.source = Some(source);
}

#[when("the archive is downloaded")]
fn when_downloaded(world: &mut CredentialsWorld) {
    let source = world.source.clone().expect("source set");
    world.download(&source);
}

#[when("the source \"{source}\" is downloaded next")]
fn when_next_downloaded(world: &mut CredentialsWorld, source: String) {
    world.download(&source);
}

#[then("the request goes to \"{url}\"")]
fn then_request_url(world: &mut CredentialsWorld, url: String) {
    let requests = world.transport.requests();
    let request = requests.first().expect("a request was made");
    assert_eq!(request.url.as_str(), url);
}

#[then("the request carries the authorization \"{header}\"")]
fn then_authorization(world: &mut CredentialsWorld, header: String) {
    assert_eq!(world.last_authorization(), Some(header));
}

#[then("the request carries no authorization")]
fn then_no_authorization(world: &mut CredentialsWorld) {
    assert_eq!(world.last_authorization(), None);
}

#[then("the last request carries no authorization")]
fn then_last_no_authorization(world: &mut CredentialsWorld) {
    assert_eq!(world.transport.requests().len(), 2);
    assert_eq!(world.last_authorization(), None);
}

#[scenario(
    path = "tests/features/credentials.feature",
    name = "Username and password become basic auth"
)]
fn scenario_user_and_password(world: CredentialsWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credentials.feature",
    name = "A username without a password keeps an empty password"
)]
fn scenario_user_only(world: CredentialsWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credentials.feature",
    name = "A URL without credentials sends no authorization"
)]
fn scenario_no_credentials(world: CredentialsWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credentials.feature",
    name = "Credentials do not leak into later requests"
)]
fn scenario_no_leak(world: CredentialsWorld) {
    let _ = world;
}
