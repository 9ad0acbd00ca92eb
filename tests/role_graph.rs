use std::sync::Arc;

use sea_orm::TransactionTrait;
use serde_json::json;
use uuid::Uuid;

use rbac_server::{
    db::dao::{DaoBase, NewPermission},
    db::entities::user,
    error::AppError,
    services::{
        ServiceContext,
        role_service::{AssignmentQuery, RoleInput, RoleQuery},
        user_service::NewUser,
    },
    state::AppState,
    test_helpers::{memory_db, test_state},
};

fn pair(subject: &str, action: &str) -> NewPermission {
    NewPermission {
        subject: subject.to_string(),
        action: action.to_string(),
        description: None,
    }
}

fn role_input(name: &str, manage_all: bool, permissions: Vec<NewPermission>) -> RoleInput {
    RoleInput {
        name: name.to_string(),
        is_manage_all: manage_all,
        guard_name: None,
        permissions,
    }
}

fn new_user(email: &str, role_id: Option<Uuid>) -> NewUser {
    NewUser {
        name: "Member".to_string(),
        email: email.to_string(),
        password: Some("secret1".to_string()),
        image: None,
        status: true,
        role_id,
    }
}

/// Creates a user holding `role_id` and returns the stored row.
async fn member(services: &ServiceContext, email: &str, role_id: Option<Uuid>) -> user::Model {
    let details = services
        .user()
        .create_local(new_user(email, role_id), None)
        .await
        .expect("user should be created");
    services
        .user()
        .find_live(details.user.id)
        .await
        .expect("user should be live")
}

async fn services() -> ServiceContext {
    setup().await.1
}

async fn setup() -> (Arc<AppState>, ServiceContext) {
    let state = test_state(memory_db().await, json!({}));
    let services = ServiceContext::from_state(&state);
    (state, services)
}

fn pairs_of(role: &rbac_server::services::role_service::RoleWithPermissions) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = role
        .permissions
        .iter()
        .map(|p| (p.subject.clone(), p.action.clone()))
        .collect();
    pairs.sort();
    pairs
}

#[tokio::test]
async fn update_replaces_the_whole_permission_set() {
    let services = services().await;
    let roles = services.role();

    let editor = roles
        .create(role_input(
            "Editor",
            false,
            vec![pair("Post", "read"), pair("Post", "update")],
        ))
        .await
        .expect("role should be created");
    assert_eq!(editor.permissions.len(), 2);

    roles
        .update(
            editor.role.id,
            role_input("Editor", false, vec![pair("Post", "delete")]),
        )
        .await
        .expect("role should update");

    let reloaded = roles.find(editor.role.id).await.expect("role should exist");
    let pairs: Vec<_> = reloaded
        .permissions
        .iter()
        .map(|p| (p.subject.as_str(), p.action.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Post", "delete")]);
}

#[tokio::test]
async fn duplicate_role_name_is_a_conflict() {
    let services = services().await;
    let roles = services.role();
    roles
        .create(role_input("Editor", false, vec![]))
        .await
        .expect("first role should be created");

    let err = roles
        .create(role_input("Editor", true, vec![]))
        .await
        .expect_err("second role should clash");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn authorization_follows_the_assigned_role() {
    let services = services().await;
    let editor = services
        .role()
        .create(role_input("Editor", false, vec![pair("Post", "read")]))
        .await
        .expect("role should be created");
    let user = member(&services, "editor@x.com", Some(editor.role.id)).await;
    let access = services.access();

    access
        .check(&user, "Post", "read")
        .await
        .expect("granted pair should pass");
    let err = access
        .check(&user, "Post", "delete")
        .await
        .expect_err("missing pair should fail");
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(access.check(&user, "post", "read").await.is_err());
}

#[tokio::test]
async fn manage_all_grants_every_pair() {
    let services = services().await;
    let admin = services
        .role()
        .create(role_input("Owner", true, vec![]))
        .await
        .expect("role should be created");
    let user = member(&services, "owner@x.com", Some(admin.role.id)).await;

    services
        .access()
        .check(&user, "Anything", "whatever")
        .await
        .expect("manage-all role should pass");
}

#[tokio::test]
async fn assigning_again_keeps_a_single_role() {
    let services = services().await;
    let roles = services.role();
    let first = roles
        .create(role_input("Reader", false, vec![pair("Post", "read")]))
        .await
        .expect("role should be created");
    let second = roles
        .create(role_input("Writer", false, vec![pair("Post", "create")]))
        .await
        .expect("role should be created");
    let user = member(&services, "member@x.com", Some(first.role.id)).await;

    roles
        .assign(user.id, second.role.id)
        .await
        .expect("assign should succeed");

    let page = roles
        .list_assignments(AssignmentQuery {
            user_id: Some(user.id),
            role_id: None,
            page: 1,
            limit: 10,
        })
        .await
        .expect("list should succeed");
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].assignment.role_id, second.role.id);
    assert_eq!(
        page.data[0].role.as_ref().map(|r| r.name.as_str()),
        Some("Writer")
    );

    let access = services.access();
    assert!(access.check(&user, "Post", "read").await.is_err());
    access
        .check(&user, "Post", "create")
        .await
        .expect("new role should apply");
}

#[tokio::test]
async fn deleting_a_role_revokes_its_grants() {
    let services = services().await;
    let roles = services.role();
    let editor = roles
        .create(role_input("Editor", false, vec![pair("Post", "read")]))
        .await
        .expect("role should be created");
    let user = member(&services, "editor@x.com", Some(editor.role.id)).await;

    roles.delete(editor.role.id).await.expect("delete should succeed");

    assert!(matches!(
        roles.find(editor.role.id).await,
        Err(AppError::NotFound(_))
    ));
    let page = roles
        .list_assignments(AssignmentQuery {
            user_id: Some(user.id),
            role_id: None,
            page: 1,
            limit: 10,
        })
        .await
        .expect("list should succeed");
    assert!(page.data.is_empty());
    assert!(
        services
            .access()
            .check(&user, "Post", "read")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn list_search_matches_permission_subjects() {
    let services = services().await;
    let roles = services.role();
    roles
        .create(role_input("Editor", false, vec![pair("Invoice", "read")]))
        .await
        .expect("role should be created");
    roles
        .create(role_input("Viewer", false, vec![pair("Post", "read")]))
        .await
        .expect("role should be created");

    let page = roles
        .list(RoleQuery {
            search: Some("invoice".to_string()),
            page: 1,
            limit: 10,
        })
        .await
        .expect("list should succeed");
    let names: Vec<_> = page.data.iter().map(|r| r.role.name.as_str()).collect();
    assert_eq!(names, vec!["Editor"]);
}

#[tokio::test]
async fn failed_update_keeps_the_old_name_and_permissions() {
    let services = services().await;
    let roles = services.role();
    let editor = roles
        .create(role_input(
            "Editor",
            false,
            vec![pair("Post", "read"), pair("Post", "update")],
        ))
        .await
        .expect("role should be created");

    let err = roles
        .update(
            editor.role.id,
            role_input(
                "Renamed",
                true,
                vec![pair("Post", "delete"), pair("Post", "delete")],
            ),
        )
        .await
        .expect_err("duplicated pair should fail");
    assert!(matches!(err, AppError::Conflict(_)));

    let reloaded = roles.find(editor.role.id).await.expect("role should exist");
    assert_eq!(reloaded.role.name, "Editor");
    assert!(!reloaded.role.is_manage_all);
    assert_eq!(
        pairs_of(&reloaded),
        vec![
            ("Post".to_string(), "read".to_string()),
            ("Post".to_string(), "update".to_string()),
        ]
    );
}

#[tokio::test]
async fn interrupted_role_delete_leaves_everything_in_place() {
    let (state, services) = setup().await;
    let editor = services
        .role()
        .create(role_input("Editor", false, vec![pair("Post", "read")]))
        .await
        .expect("role should be created");
    let user = member(&services, "editor@x.com", Some(editor.role.id)).await;
    let daos = services.daos();

    let txn = state.db.begin().await.expect("transaction should open");
    daos.permission()
        .delete_by_role_on(&txn, editor.role.id)
        .await
        .expect("permissions should delete");
    daos.assignment()
        .delete_by_role_on(&txn, editor.role.id)
        .await
        .expect("assignments should delete");
    assert!(daos.role().delete_on(&txn, Uuid::new_v4()).await.is_err());
    drop(txn);

    let reloaded = services
        .role()
        .find(editor.role.id)
        .await
        .expect("role should survive");
    assert_eq!(reloaded.permissions.len(), 1);
    let assignment = daos
        .assignment()
        .find_by_user(user.id)
        .await
        .expect("lookup should succeed")
        .expect("assignment should survive");
    assert_eq!(assignment.role_id, editor.role.id);
    services
        .access()
        .check(&user, "Post", "read")
        .await
        .expect("grant should survive");
}

#[tokio::test]
async fn interrupted_reassignment_keeps_the_previous_role() {
    let (state, services) = setup().await;
    let reader = services
        .role()
        .create(role_input("Reader", false, vec![pair("Post", "read")]))
        .await
        .expect("role should be created");
    let user = member(&services, "reader@x.com", Some(reader.role.id)).await;
    let daos = services.daos();

    let txn = state.db.begin().await.expect("transaction should open");
    let err = daos
        .assignment()
        .replace_on(&txn, user.id, Uuid::new_v4())
        .await;
    assert!(err.is_err(), "unknown role should violate the foreign key");
    drop(txn);

    let assignment = daos
        .assignment()
        .find_by_user(user.id)
        .await
        .expect("lookup should succeed")
        .expect("assignment should survive");
    assert_eq!(assignment.role_id, reader.role.id);

    let err = services
        .role()
        .assign(user.id, Uuid::new_v4())
        .await
        .expect_err("unknown role should be rejected");
    assert!(matches!(err, AppError::NotFound(_)));
    services
        .access()
        .check(&user, "Post", "read")
        .await
        .expect("previous grant should still apply");
}
