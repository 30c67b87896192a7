//! Direct authoring, owner edits, tagging, and deletion.

mod common;

use assert_matches::assert_matches;
use common::*;
use forkful_core::activity::ActivityKind;
use forkful_core::error::CoreError;
use forkful_core::ingredients::IngredientStatus;
use forkful_core::recipe::{FieldPatch, RecipeKind, RecipeUpdate};
use forkful_core::tags::{TagScope, TagStatus};
use forkful_db::{Store, StoreTx};
use forkful_recipes::ServiceError;

#[tokio::test]
async fn create_personal_recipe() {
    let h = harness();
    let mut input = personal("Granola");
    input.tags = tags(&["Breakfast", "breakfast ", "Crunchy"]);

    let detail = h.service.create_recipe(ALICE, input).await.unwrap();
    assert_eq!(detail.kind, RecipeKind::Personal);
    assert_eq!(detail.recipe.creator_id, ALICE);
    assert_eq!(detail.steps, vec!["Mix everything", "Bake"]);

    let names: Vec<_> = detail.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["breakfast", "crunchy"]);
    assert!(detail
        .tags
        .iter()
        .all(|t| t.scope == TagScope::Global && t.status == TagStatus::Approved));

    let lines: Vec<_> = detail
        .ingredients
        .iter()
        .map(|i| (i.position, i.ingredient_name.as_str(), i.unit.as_deref()))
        .collect();
    assert_eq!(lines, vec![(0, "flour", Some("g")), (1, "sugar", Some("g"))]);

    let mut tx = h.store.begin().await.unwrap();
    let flour = tx.find_ingredient_by_name("flour").await.unwrap().unwrap();
    assert_eq!(flour.status, IngredientStatus::Pending);
    drop(tx);

    let created = h.sink.of_kind(ActivityKind::RecipeCreated);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].recipe_id, Some(detail.recipe.id));
}

#[tokio::test]
async fn community_recipe_tags_go_through_moderation() {
    let h = harness();
    let a = h.community("A", ALICE, &[BOB]).await;
    let mut input = in_community("Baklava", a.id);
    input.tags = tags(&["syrupy"]);

    let detail = h.service.create_recipe(BOB, input).await.unwrap();
    assert_eq!(detail.kind, RecipeKind::CommunityLinked);
    assert_eq!(detail.tags[0].status, TagStatus::Pending);
    assert_eq!(detail.tags[0].community_id, Some(a.id));
    let created = h.sink.of_kind(ActivityKind::RecipeCreated);
    assert_eq!(created[0].metadata["pendingTagIds"][0], detail.tags[0].id);
}

#[tokio::test]
async fn non_members_cannot_author_in_a_community() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;

    let err = h
        .service
        .create_recipe(BOB, in_community("Intruder", a.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    let err = h
        .service
        .create_recipe(BOB, in_community("Nowhere", 999))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::NotFound { entity: "Community", .. }));
}

#[tokio::test]
async fn invalid_shapes_are_rejected_before_writing() {
    let h = harness();

    let mut input = personal("Bad");
    input.draft.servings = 0;
    assert_matches!(
        h.service.create_recipe(ALICE, input).await,
        Err(ServiceError::Core(CoreError::Validation(_)))
    );

    let mut input = personal("Bad");
    input.draft.image_url = Some("ftp://example.com/x.png".to_string());
    assert_matches!(
        h.service.create_recipe(ALICE, input).await,
        Err(ServiceError::Core(CoreError::Validation(_)))
    );

    let mut input = personal("Too many tags");
    input.tags = (0..11).map(|i| format!("tag {i}")).collect();
    assert_matches!(
        h.service.create_recipe(ALICE, input).await,
        Err(ServiceError::Core(CoreError::LimitExceeded(_)))
    );

    assert!(h.sink.events().is_empty());
    let mut tx = h.store.begin().await.unwrap();
    assert!(tx.find_ingredient_by_name("flour").await.unwrap().is_none());
}

#[tokio::test]
async fn eleventh_tag_is_refused_and_the_first_ten_remain() {
    let h = harness();
    let recipe = h.recipe(ALICE, personal("Tagged")).await;

    for i in 0..10 {
        h.service
            .add_recipe_tags(ALICE, recipe.recipe.id, &[format!("tag {i}")])
            .await
            .unwrap();
    }
    let err = h
        .service
        .add_recipe_tags(ALICE, recipe.recipe.id, &[format!("tag {}", 10)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::LimitExceeded(_)));

    let detail = h.service.get_recipe(recipe.recipe.id).await.unwrap();
    assert_eq!(detail.tags.len(), 10);
    assert!(detail.tags.iter().all(|t| t.name != "tag 10"));

    // Re-adding an existing tag does not count against the cap.
    h.service
        .add_recipe_tags(ALICE, recipe.recipe.id, &[String::from("tag 0")])
        .await
        .unwrap();
}

#[tokio::test]
async fn only_the_creator_edits_or_deletes() {
    let h = harness();
    let a = h.community("A", ALICE, &[BOB]).await;
    let recipe = h.recipe(ALICE, in_community("Shared", a.id)).await;
    let update = RecipeUpdate {
        fields: FieldPatch {
            servings: Some(2),
            ..Default::default()
        },
        ..Default::default()
    };

    assert_matches!(
        h.service.update_recipe(BOB, recipe.recipe.id, update.clone()).await,
        Err(ServiceError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        h.service.delete_recipe(BOB, recipe.recipe.id).await,
        Err(ServiceError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        h.service
            .add_recipe_tags(BOB, recipe.recipe.id, &tags(&["nope"]))
            .await,
        Err(ServiceError::Core(CoreError::Forbidden(_)))
    );

    let updated = h.service.update_recipe(ALICE, recipe.recipe.id, update).await.unwrap();
    assert_eq!(updated.recipe.servings, 2);
    assert!(updated.recipe.updated_at > recipe.recipe.updated_at);
}

#[tokio::test]
async fn empty_update_is_invalid() {
    let h = harness();
    let recipe = h.recipe(ALICE, personal("Plain")).await;

    let err = h
        .service
        .update_recipe(ALICE, recipe.recipe.id, RecipeUpdate::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn deleted_recipes_disappear() {
    let h = harness();
    let recipe = h.recipe(ALICE, personal("Ephemeral")).await;

    h.service.delete_recipe(ALICE, recipe.recipe.id).await.unwrap();

    let err = h.service.get_recipe(recipe.recipe.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::NotFound { entity: "Recipe", .. }));
    assert_matches!(
        h.service.delete_recipe(ALICE, recipe.recipe.id).await,
        Err(ServiceError::Core(CoreError::NotFound { .. }))
    );
    assert_eq!(h.sink.of_kind(ActivityKind::RecipeDeleted).len(), 1);
}

#[tokio::test]
async fn moderators_manage_membership() {
    let h = harness();
    let a = h.community("A", ALICE, &[BOB]).await;

    let err = h
        .service
        .add_member(BOB, a.id, CAROL, forkful_core::membership::MemberRole::Member)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    assert_matches!(
        h.service.create_community(ALICE, "   ").await,
        Err(ServiceError::Core(CoreError::Validation(_)))
    );
}
