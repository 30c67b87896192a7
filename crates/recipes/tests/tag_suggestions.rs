//! Tag suggestions on community recipes and the moderation that follows.

mod common;

use assert_matches::assert_matches;
use common::*;
use forkful_core::activity::ActivityKind;
use forkful_core::error::CoreError;
use forkful_core::tag_suggestion::TagSuggestionStatus;
use forkful_core::tags::{TagScope, TagStatus};
use forkful_db::models::tag::NewTag;
use forkful_db::{Store, StoreTx};
use forkful_recipes::ServiceError;

/// Community A moderated by Alice with Bob and Carol as members, and a
/// recipe owned by Carol.
async fn setup(h: &Harness) -> (i64, i64) {
    let a = h.community("A", ALICE, &[BOB, CAROL]).await;
    let recipe = h.recipe(CAROL, in_community("Hummus", a.id)).await;
    (a.id, recipe.recipe.id)
}

#[tokio::test]
async fn accepting_an_unknown_tag_waits_on_moderation() {
    let h = harness();
    let (community_id, recipe_id) = setup(&h).await;

    let suggestion = h.service.suggest_tag(BOB, recipe_id, "Vegan").await.unwrap();
    assert_eq!(suggestion.status, TagSuggestionStatus::PendingOwner);
    assert_eq!(suggestion.tag_name, "vegan");

    let decided = h
        .service
        .accept_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap();
    assert_eq!(decided.status, TagSuggestionStatus::PendingModerator);

    let detail = h.service.get_recipe(recipe_id).await.unwrap();
    assert_eq!(detail.tags.len(), 1);
    let tag = &detail.tags[0];
    assert_eq!(tag.name, "vegan");
    assert_eq!(tag.scope, TagScope::Community);
    assert_eq!(tag.status, TagStatus::Pending);
    assert_eq!(tag.community_id, Some(community_id));

    let events = h.sink.of_kind(ActivityKind::TagSuggestionPendingModerator);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipient_ids, vec![BOB]);
}

#[tokio::test]
async fn accepting_an_approved_tag_settles_immediately() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    let global = {
        let mut tx = h.store.begin().await.unwrap();
        let tag = tx
            .insert_tag(&NewTag::approved_global("gluten free", None))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        tag
    };

    let suggestion = h
        .service
        .suggest_tag(BOB, recipe_id, "Gluten  Free")
        .await
        .unwrap();
    let decided = h
        .service
        .accept_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap();
    assert_eq!(decided.status, TagSuggestionStatus::Approved);

    let detail = h.service.get_recipe(recipe_id).await.unwrap();
    assert_eq!(detail.tags, vec![global]);
}

#[tokio::test]
async fn duplicate_and_self_suggestions_are_refused() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    h.service.suggest_tag(BOB, recipe_id, "spicy").await.unwrap();

    let err = h.service.suggest_tag(BOB, recipe_id, " SPICY ").await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Conflict(_)));

    // Another member may suggest the same name.
    h.service.suggest_tag(ALICE, recipe_id, "spicy").await.unwrap();

    let err = h.service.suggest_tag(CAROL, recipe_id, "mine").await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    let err = h.service.suggest_tag(BOB, recipe_id, "x").await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn suggestions_respect_the_recipe_tag_cap() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    let names: Vec<String> = (0..10).map(|i| format!("tag {i}")).collect();
    h.service.add_recipe_tags(CAROL, recipe_id, &names).await.unwrap();

    let err = h.service.suggest_tag(BOB, recipe_id, "eleventh").await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::LimitExceeded(_)));

    let err = h.service.suggest_tag(BOB, recipe_id, "tag 3").await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Conflict(_)));
}

#[tokio::test]
async fn rejection_creates_no_tag() {
    let h = harness();
    let (community_id, recipe_id) = setup(&h).await;
    let suggestion = h.service.suggest_tag(BOB, recipe_id, "salty").await.unwrap();

    let decided = h
        .service
        .reject_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap();
    assert_eq!(decided.status, TagSuggestionStatus::Rejected);
    assert!(h.service.get_recipe(recipe_id).await.unwrap().tags.is_empty());

    let mut tx = h.store.begin().await.unwrap();
    assert_eq!(tx.count_community_tags(community_id).await.unwrap(), 0);
}

#[tokio::test]
async fn only_the_owner_decides_and_only_once() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    let suggestion = h.service.suggest_tag(BOB, recipe_id, "creamy").await.unwrap();

    let err = h
        .service
        .accept_tag_suggestion(ALICE, suggestion.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    h.service
        .reject_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap();
    let err = h
        .service
        .accept_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::AlreadyDecided { .. }));
}

#[tokio::test]
async fn orphaned_suggestion_is_auto_rejected() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    let suggestion = h.service.suggest_tag(BOB, recipe_id, "lemony").await.unwrap();
    h.service.delete_recipe(CAROL, recipe_id).await.unwrap();

    let err = h
        .service
        .accept_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::Core(CoreError::NotFound { entity: "Recipe", .. })
    );

    let mut tx = h.store.begin().await.unwrap();
    let stored = tx.find_tag_suggestion(suggestion.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TagSuggestionStatus::Rejected);
    assert!(stored.decided_at.is_some());
}

#[tokio::test]
async fn moderator_approval_settles_waiting_suggestions() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    let suggestion = h.service.suggest_tag(BOB, recipe_id, "mezze").await.unwrap();
    h.service
        .accept_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap();
    let tag_id = h.service.get_recipe(recipe_id).await.unwrap().tags[0].id;

    let err = h.service.approve_community_tag(BOB, tag_id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    let tag = h.service.approve_community_tag(ALICE, tag_id).await.unwrap();
    assert_eq!(tag.status, TagStatus::Approved);

    let mut tx = h.store.begin().await.unwrap();
    let stored = tx.find_tag_suggestion(suggestion.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TagSuggestionStatus::Approved);
    drop(tx);

    let err = h.service.approve_community_tag(ALICE, tag_id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::AlreadyDecided { entity: "Tag", .. }));
    assert_eq!(h.sink.of_kind(ActivityKind::TagApproved).len(), 1);
}

#[tokio::test]
async fn moderator_rejection_removes_the_tag() {
    let h = harness();
    let (_, recipe_id) = setup(&h).await;
    let suggestion = h.service.suggest_tag(BOB, recipe_id, "weird").await.unwrap();
    h.service
        .accept_tag_suggestion(CAROL, suggestion.id)
        .await
        .unwrap();
    let tag_id = h.service.get_recipe(recipe_id).await.unwrap().tags[0].id;

    h.service.reject_community_tag(ALICE, tag_id).await.unwrap();

    assert!(h.service.get_recipe(recipe_id).await.unwrap().tags.is_empty());
    let mut tx = h.store.begin().await.unwrap();
    assert!(tx.find_tag(tag_id).await.unwrap().is_none());
    let stored = tx.find_tag_suggestion(suggestion.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TagSuggestionStatus::Rejected);
}

#[tokio::test]
async fn global_tags_are_not_moderated() {
    let h = harness();
    setup(&h).await;
    let global = {
        let mut tx = h.store.begin().await.unwrap();
        let tag = tx
            .insert_tag(&NewTag::approved_global("classic", None))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        tag
    };

    let err = h
        .service
        .approve_community_tag(ALICE, global.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));
}
