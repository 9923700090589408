//! Security-focused integration tests.
//!
//! This module verifies the properties the session check relies on:
//!
//! - Tampered tokens are rejected before any renewal is attempted
//! - Unknown sessions always clear the login cookies
//! - Store outages do not log users out
//! - Cookies without a valid signature are ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum_extra::extract::cookie::{Key, SignedCookieJar};
use chrono::{DateTime, Utc};
use forge_auth::{
    AuthConfig, AuthEnvironment, AuthError, Authenticator, SessionCheck, SessionId, SessionRecord,
    SignedToken, SubjectId, TokenCodec, UserProfile,
    cookies::{self, LoginCookies},
    mocks::{MockClaimsResolver, MockIdentityProvider, MockSessionStore},
    providers::SessionStore,
};
use proptest::prelude::*;

const SIGNING_KEY: &[u8] = b"forge-test-signing-key-0123456789abcdef";
const ATTACKER_KEY: &[u8] = b"attacker-controlled-key-0123456789abcdef";
const ISSUER: &str = "https://github.com";

type TestAuthenticator = Authenticator<MockIdentityProvider, MockSessionStore, MockClaimsResolver>;

fn setup() -> (TestAuthenticator, MockIdentityProvider, MockSessionStore, Key) {
    let provider = MockIdentityProvider::new(UserProfile::new("alice"));
    let sessions = MockSessionStore::new();
    let env = AuthEnvironment::new(
        provider.clone(),
        sessions.clone(),
        MockClaimsResolver::accept_all(),
    );
    let auth = Authenticator::new(AuthConfig::new(SIGNING_KEY), env).unwrap();
    (auth, provider, sessions, Key::generate())
}

async fn store_session(sessions: &MockSessionStore, exp: i64) -> SessionId {
    let session_id = SessionId::new();
    sessions
        .insert_or_update_session(&SessionRecord {
            session_id,
            subject_id: SubjectId::for_login(ISSUER, "alice"),
            access_token: "gho_alice".to_string(),
            refresh_token: "gho_alice".to_string(),
            expires_at: DateTime::from_timestamp(exp, 0).unwrap(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    session_id
}

fn presented(key: &Key, token: &str, session_id: SessionId, exp: i64) -> SignedCookieJar {
    cookies::set_login_cookies(
        SignedCookieJar::new(key.clone()),
        token,
        ISSUER,
        session_id,
        exp,
        true,
    )
}

/// A token signed with another key must fail as tampered, even when it is
/// expired and paired with a live session: the renewal branch must never
/// run for it.
#[tokio::test]
async fn test_forged_token_never_reaches_renewal() {
    let (auth, provider, sessions, key) = setup();
    let exp = Utc::now().timestamp() - 60;
    let session_id = store_session(&sessions, exp).await;
    let forged = TokenCodec::new(ATTACKER_KEY)
        .encode(&SignedToken::new(UserProfile::new("alice"), exp))
        .unwrap();

    let (jar, result) = auth
        .authenticated_http_context(presented(&key, &forged, session_id, exp))
        .await;

    assert_eq!(result.check, SessionCheck::MalformedToken);
    assert_eq!(result.error, Some(AuthError::TokenTampered));
    assert!(result.user.is_none());
    assert_eq!(provider.user_info_calls(), 0);
    assert_eq!(sessions.write_calls(), 1); // seeding only
    assert!(sessions.snapshot(&session_id).unwrap().is_some());
    assert!(LoginCookies::read(&jar).token.is_some());
}

#[tokio::test]
async fn test_garbage_token_is_tampered() {
    let (auth, provider, sessions, key) = setup();
    let exp = Utc::now().timestamp() + 3600;
    let session_id = store_session(&sessions, exp).await;

    let (_, result) = auth
        .authenticated_http_context(presented(
            &key,
            "eyJhbGciOiJub25lIn0.e30.",
            session_id,
            exp,
        ))
        .await;

    assert_eq!(result.error, Some(AuthError::TokenTampered));
    assert_eq!(provider.user_info_calls(), 0);
}

/// An unknown session id clears the login cookies and fails, even though
/// the token itself is valid. The identity in the token is still
/// recoverable for account provisioning.
#[tokio::test]
async fn test_unknown_session_clears_cookies_despite_valid_token() {
    let (auth, provider, sessions, key) = setup();
    let exp = Utc::now().timestamp() + 3600;
    let token = auth
        .codec()
        .encode(&SignedToken::new(UserProfile::new("alice"), exp))
        .unwrap();

    let (jar, result) = auth
        .authenticated_http_context(presented(&key, &token, SessionId::new(), exp))
        .await;

    assert_eq!(result.check, SessionCheck::SessionMissing);
    assert_eq!(result.error, Some(AuthError::SessionNotFound));
    assert!(result.claims.is_none());
    assert_eq!(
        result.user.map(|u| u.subject),
        Some(SubjectId::for_login(ISSUER, "alice"))
    );
    assert_eq!(LoginCookies::read(&jar), LoginCookies::default());
    assert_eq!(sessions.read_calls(), 1);
    assert_eq!(provider.user_info_calls(), 0);
}

#[tokio::test]
async fn test_unknown_session_with_forged_token_has_no_identity() {
    let (auth, _, _, key) = setup();
    let exp = Utc::now().timestamp() + 3600;
    let forged = TokenCodec::new(ATTACKER_KEY)
        .encode(&SignedToken::new(UserProfile::new("mallory"), exp))
        .unwrap();

    let (jar, result) = auth
        .authenticated_http_context(presented(&key, &forged, SessionId::new(), exp))
        .await;

    assert_eq!(result.error, Some(AuthError::SessionNotFound));
    assert!(result.user.is_none());
    assert_eq!(LoginCookies::read(&jar), LoginCookies::default());
}

#[tokio::test]
async fn test_missing_session_cookie_is_session_not_found() {
    let (auth, _, sessions, key) = setup();
    let exp = Utc::now().timestamp() + 3600;
    let token = auth
        .codec()
        .encode(&SignedToken::new(UserProfile::new("alice"), exp))
        .unwrap();
    let jar = presented(&key, &token, SessionId::new(), exp)
        .remove(axum_extra::extract::cookie::Cookie::from("Session-ID"));

    let (jar, result) = auth.authenticated_http_context(jar).await;

    assert_eq!(result.error, Some(AuthError::SessionNotFound));
    assert_eq!(sessions.read_calls(), 0);
    assert_eq!(LoginCookies::read(&jar), LoginCookies::default());
}

/// A store outage is not proof the session is gone, so cookies are kept.
#[tokio::test]
async fn test_store_outage_keeps_cookies() {
    let (auth, provider, sessions, key) = setup();
    let exp = Utc::now().timestamp() - 60;
    let session_id = store_session(&sessions, exp).await;
    let token = auth
        .codec()
        .encode(&SignedToken::new(UserProfile::new("alice"), exp))
        .unwrap();
    sessions.set_fail_reads(true);

    let (jar, result) = auth
        .authenticated_http_context(presented(&key, &token, session_id, exp))
        .await;

    assert_eq!(result.check, SessionCheck::StoreError);
    assert!(matches!(result.error, Some(AuthError::StoreUnavailable(_))));
    assert_eq!(LoginCookies::read(&jar).session_id, Some(session_id));
    assert_eq!(provider.user_info_calls(), 0);
    assert_eq!(sessions.clear_calls(), 0);
}

/// Cookie values without a valid signature read as absent.
#[tokio::test]
async fn test_unsigned_cookies_are_ignored() {
    let (auth, _, sessions, key) = setup();
    let exp = Utc::now().timestamp() + 3600;
    let session_id = store_session(&sessions, exp).await;
    let token = auth
        .codec()
        .encode(&SignedToken::new(UserProfile::new("alice"), exp))
        .unwrap();

    let mut headers = http::HeaderMap::new();
    headers.insert(
        http::header::COOKIE,
        format!("Authorization-Issuer={ISSUER}; Authorization={token}; Session-ID={session_id}")
            .parse()
            .unwrap(),
    );
    let jar = SignedCookieJar::from_headers(&headers, key);
    let (_, result) = auth.authenticated_http_context(jar).await;

    assert_eq!(result.check, SessionCheck::PassThrough);
    assert!(result.error.is_none());
    assert_eq!(sessions.read_calls(), 0);
}

fn profile_strategy() -> impl Strategy<Value = UserProfile> {
    (
        "[a-zA-Z0-9][a-zA-Z0-9-]{0,38}",
        proptest::option::of("[\\p{L} .'-]{0,40}"),
        proptest::option::of("[a-z0-9.]{1,20}@[a-z0-9]{1,10}\\.[a-z]{2,4}"),
        proptest::option::of("https://[a-z]{1,12}\\.example/[a-z0-9]{1,16}\\.png"),
    )
        .prop_map(|(login, name, email, avatar_url)| UserProfile {
            login,
            name,
            email,
            avatar_url,
        })
}

proptest! {
    #[test]
    fn prop_token_round_trip(profile in profile_strategy(), exp in 0i64..4_102_444_800) {
        let codec = TokenCodec::new(SIGNING_KEY);
        let token = SignedToken::new(profile, exp);

        let encoded = codec.encode(&token).unwrap();
        prop_assert_eq!(codec.decode_token(&encoded, false).unwrap(), token);
    }

    #[test]
    fn prop_token_never_verifies_under_other_key(profile in profile_strategy()) {
        let token = SignedToken::new(profile, Utc::now().timestamp() + 3600);
        let encoded = TokenCodec::new(ATTACKER_KEY).encode(&token).unwrap();

        prop_assert_eq!(
            TokenCodec::new(SIGNING_KEY).decode(&encoded, false),
            Err(AuthError::TokenTampered)
        );
    }
}
