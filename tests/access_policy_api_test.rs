//! HTTP tests for `POST /api/v1/projects/{project_id}/access-policies`

mod common;

use axum::http::{Method, StatusCode};
use common::{send, TestAppState};
use pretty_assertions::assert_eq;
use serde_json::json;
use sm_access_core::domain::{
    ClientType, OrganizationUserType, StringUuid, UserProjectAccessPolicy,
};

struct Fixture {
    state: TestAppState,
    organization_id: StringUuid,
    project_id: StringUuid,
}

async fn fixture() -> Fixture {
    let state = TestAppState::new();
    let organization_id = StringUuid::new_v4();
    state.store.enable_secrets_manager(organization_id).await;
    let project = state.store.add_project(organization_id, "Backend").await;
    Fixture {
        state,
        organization_id,
        project_id: project.id,
    }
}

fn path(project_id: StringUuid) -> String {
    format!("/api/v1/projects/{}/access-policies", project_id)
}

fn request(users: &[StringUuid], groups: &[StringUuid], service_accounts: &[StringUuid]) -> serde_json::Value {
    let entries = |ids: &[StringUuid]| {
        ids.iter()
            .map(|id| json!({ "grantee_id": id.to_string(), "read": true, "write": true }))
            .collect::<Vec<_>>()
    };
    json!({
        "user_access_policy_requests": entries(users),
        "group_access_policy_requests": entries(groups),
        "service_account_access_policy_requests": entries(service_accounts),
    })
}

fn ids(n: usize) -> Vec<StringUuid> {
    (0..n).map(|_| StringUuid::new_v4()).collect()
}

#[tokio::test]
async fn test_admin_creates_mixed_batch() {
    let f = fixture().await;
    let admin = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, admin, OrganizationUserType::Admin)
        .await;
    let token = f.state.token_for(admin, ClientType::User);

    let (status, body) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&ids(3), &ids(3), &ids(3))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(9));
    assert_eq!(body["data"][0]["type"], "user");
    assert_eq!(body["data"][0]["granted_project_id"], f.project_id.to_string());
    assert_eq!(f.state.store.policy_count().await, 9);
    assert_eq!(f.state.store.create_many_calls(), 1);
}

#[tokio::test]
async fn test_member_with_write_grant_creates() {
    let f = fixture().await;
    let member = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, member, OrganizationUserType::User)
        .await;
    f.state.store.grant_write(f.project_id, member).await;
    let token = f.state.token_for(member, ClientType::User);

    let (status, _) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&ids(1), &[], &ids(1))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(f.state.store.policy_count().await, 2);
}

#[tokio::test]
async fn test_member_without_grant_is_forbidden() {
    let f = fixture().await;
    let member = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, member, OrganizationUserType::User)
        .await;
    let token = f.state.token_for(member, ClientType::User);

    let (status, body) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&ids(3), &ids(3), &ids(3))),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(f.state.store.create_many_calls(), 0);
    assert_eq!(f.state.store.policy_count().await, 0);
}

#[tokio::test]
async fn test_admin_of_other_organization_is_forbidden() {
    let f = fixture().await;
    let outsider = StringUuid::new_v4();
    f.state
        .store
        .add_member(StringUuid::new_v4(), outsider, OrganizationUserType::Owner)
        .await;
    let token = f.state.token_for(outsider, ClientType::User);

    let (status, _) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&ids(1), &[], &[])),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(f.state.store.create_many_calls(), 0);
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let f = fixture().await;

    let (status, body) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        None,
        Some(request(&ids(1), &[], &[])),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let f = fixture().await;
    let admin = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, admin, OrganizationUserType::Owner)
        .await;
    let token = f.state.token_for(admin, ClientType::User);

    let (status, body) = send(
        &f.state.router(),
        Method::POST,
        &path(StringUuid::new_v4()),
        Some(&token),
        Some(request(&ids(1), &[], &[])),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_duplicate_in_batch_is_conflict() {
    let f = fixture().await;
    let admin = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, admin, OrganizationUserType::Admin)
        .await;
    let token = f.state.token_for(admin, ClientType::User);
    let group = StringUuid::new_v4();

    let (status, body) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&ids(2), &[group, StringUuid::new_v4(), group], &ids(1))),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(f.state.store.create_many_calls(), 0);
}

#[tokio::test]
async fn test_existing_policy_is_conflict() {
    let f = fixture().await;
    let admin = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, admin, OrganizationUserType::Admin)
        .await;
    let existing_user = StringUuid::new_v4();
    f.state
        .store
        .add_policy(UserProjectAccessPolicy::new(existing_user, f.project_id, true, false).into())
        .await;
    let token = f.state.token_for(admin, ClientType::User);

    let (status, _) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&[StringUuid::new_v4(), existing_user], &ids(1), &[])),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(f.state.store.create_many_calls(), 0);
    assert_eq!(f.state.store.policy_count().await, 1);
}

#[tokio::test]
async fn test_same_id_across_kinds_is_accepted() {
    let f = fixture().await;
    let admin = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, admin, OrganizationUserType::Admin)
        .await;
    let token = f.state.token_for(admin, ClientType::User);
    let shared = StringUuid::new_v4();

    let (status, _) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(request(&[shared], &[shared], &[shared])),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(f.state.store.policy_count().await, 3);
}

#[tokio::test]
async fn test_empty_request_is_rejected() {
    let f = fixture().await;
    let admin = StringUuid::new_v4();
    f.state
        .store
        .add_member(f.organization_id, admin, OrganizationUserType::Admin)
        .await;
    let token = f.state.token_for(admin, ClientType::User);

    let (status, body) = send(
        &f.state.router(),
        Method::POST,
        &path(f.project_id),
        Some(&token),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");
    assert_eq!(f.state.store.create_many_calls(), 0);
}
