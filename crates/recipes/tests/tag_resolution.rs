//! Tag resolution under scope, status, and capacity rules.

mod common;

use assert_matches::assert_matches;
use common::*;
use forkful_core::error::CoreError;
use forkful_core::tags::{TagScope, TagStatus};
use forkful_db::models::tag::NewTag;
use forkful_db::{Store, StoreTx};
use forkful_recipes::{ServiceError, TagResolver};

async fn seed_community_tags(h: &Harness, community_id: i64, count: usize) {
    let mut tx = h.store.begin().await.unwrap();
    for i in 0..count {
        tx.insert_tag(&NewTag::pending_community(&format!("seeded {i}"), community_id, ALICE))
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;

    let mut tx = h.store.begin().await.unwrap();
    let first = TagResolver::resolve(tx.as_mut(), &["  Spicy  Food "], ALICE, Some(a.id))
        .await
        .unwrap();
    let second = TagResolver::resolve(tx.as_mut(), &["spicy food"], ALICE, Some(a.id))
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.tag_ids, first.pending_tag_ids);

    let personal_first = TagResolver::resolve(tx.as_mut(), &["quick"], ALICE, None).await.unwrap();
    let personal_second = TagResolver::resolve(tx.as_mut(), &["Quick"], ALICE, None).await.unwrap();
    assert_eq!(personal_first.tag_ids, personal_second.tag_ids);
    assert!(personal_first.pending_tag_ids.is_empty());
}

#[tokio::test]
async fn personal_context_creates_approved_global_tags() {
    let h = harness();
    let mut tx = h.store.begin().await.unwrap();

    let resolved = TagResolver::resolve(tx.as_mut(), &["weeknight"], BOB, None).await.unwrap();
    let tag = tx.find_tag(resolved.tag_ids[0]).await.unwrap().unwrap();
    assert_eq!(tag.scope, TagScope::Global);
    assert_eq!(tag.status, TagStatus::Approved);
    assert_eq!(tag.created_by, Some(BOB));
}

#[tokio::test]
async fn community_context_creates_pending_community_tags() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let mut tx = h.store.begin().await.unwrap();

    let resolved = TagResolver::resolve(tx.as_mut(), &["fermented"], ALICE, Some(a.id))
        .await
        .unwrap();
    assert_eq!(resolved.pending_tag_ids, resolved.tag_ids);
    let tag = tx.find_tag(resolved.tag_ids[0]).await.unwrap().unwrap();
    assert_eq!(tag.scope, TagScope::Community);
    assert_eq!(tag.community_id, Some(a.id));
}

#[tokio::test]
async fn approved_global_tag_wins_over_community_tag() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let mut tx = h.store.begin().await.unwrap();
    let global = tx
        .insert_tag(&NewTag::approved_global("vegan", None))
        .await
        .unwrap();
    tx.insert_tag(&NewTag::pending_community("vegan", a.id, ALICE))
        .await
        .unwrap();

    let resolved = TagResolver::resolve(tx.as_mut(), &["VEGAN"], ALICE, Some(a.id))
        .await
        .unwrap();
    assert_eq!(resolved.tag_ids, vec![global.id]);
    assert!(resolved.pending_tag_ids.is_empty());
}

#[tokio::test]
async fn more_than_ten_names_is_rejected() {
    let h = harness();
    let mut tx = h.store.begin().await.unwrap();
    let names: Vec<String> = (0..11).map(|i| format!("tag {i}")).collect();

    let err = TagResolver::resolve(tx.as_mut(), &names, ALICE, None).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::LimitExceeded(_)));
}

#[tokio::test]
async fn hundred_and_first_community_tag_is_rejected() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    seed_community_tags(&h, a.id, 100).await;

    let mut tx = h.store.begin().await.unwrap();
    let err = TagResolver::resolve(tx.as_mut(), &["one too many"], ALICE, Some(a.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::LimitExceeded(_)));
    assert_eq!(tx.count_community_tags(a.id).await.unwrap(), 100);

    let existing = TagResolver::resolve(tx.as_mut(), &["seeded 7"], ALICE, Some(a.id))
        .await
        .unwrap();
    assert_eq!(existing.tag_ids.len(), 1);
}

#[tokio::test]
async fn fork_resolution_respects_target_moderation() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let b = h.community("B", ALICE, &[]).await;
    let mut tx = h.store.begin().await.unwrap();

    let global = tx
        .insert_tag(&NewTag::approved_global("dessert", None))
        .await
        .unwrap();
    let local_known = tx
        .insert_tag(&NewTag::pending_community("grandma", a.id, ALICE))
        .await
        .unwrap();
    let local_new = tx
        .insert_tag(&NewTag::pending_community("secret", a.id, ALICE))
        .await
        .unwrap();
    let target_known = tx
        .insert_tag(&NewTag::pending_community("grandma", b.id, ALICE))
        .await
        .unwrap();
    let target_known = tx
        .set_tag_status(target_known.id, TagStatus::Approved)
        .await
        .unwrap()
        .unwrap();

    let ids = TagResolver::resolve_for_fork(
        tx.as_mut(),
        &[global.clone(), local_known, local_new],
        b.id,
        BOB,
    )
    .await
    .unwrap();

    assert_eq!(ids[0], global.id);
    assert_eq!(ids[1], target_known.id);
    let created = tx.find_tag(ids[2]).await.unwrap().unwrap();
    assert_eq!(created.name, "secret");
    assert_eq!(created.community_id, Some(b.id));
    assert_eq!(created.status, TagStatus::Pending);
    assert_eq!(created.created_by, Some(BOB));
}
