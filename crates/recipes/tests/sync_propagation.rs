//! Field synchronization between personal recipes and their community copies.

mod common;

use common::*;
use forkful_core::activity::ActivityKind;
use forkful_core::recipe::{FieldPatch, RecipeKind, RecipeUpdate};

fn servings(n: i32) -> RecipeUpdate {
    RecipeUpdate {
        fields: FieldPatch {
            servings: Some(n),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn editing_a_community_copy_reaches_origin_and_siblings_but_not_forks() {
    let h = harness();
    let a = h.community("Bakers A", ALICE, &[]).await;
    let b = h.community("Bakers B", ALICE, &[]).await;
    let d = h.community("Bakers D", ALICE, &[]).await;

    let p = h.recipe(ALICE, personal("Bread")).await;
    let copies = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id, b.id])
        .await
        .unwrap();
    assert_eq!(copies.len(), 2);
    let (c1, c2) = (copies[0].id, copies[1].id);

    let fork = h.service.share_recipe(ALICE, c1, d.id).await.unwrap();
    assert_eq!(fork.recipe.kind(), RecipeKind::Fork);

    h.service.update_recipe(ALICE, c1, servings(6)).await.unwrap();

    for id in [p.recipe.id, c1, c2] {
        assert_eq!(h.service.get_recipe(id).await.unwrap().recipe.servings, 6);
    }
    let fork = h.service.get_recipe(fork.recipe.id).await.unwrap();
    assert_eq!(fork.recipe.servings, 4);
}

#[tokio::test]
async fn editing_the_personal_origin_updates_every_copy() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let b = h.community("B", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Soup")).await;
    let copies = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id, b.id])
        .await
        .unwrap();

    let update = RecipeUpdate {
        fields: FieldPatch {
            title: Some("Winter Soup".to_string()),
            cook_time: Some(None),
            ..Default::default()
        },
        steps: Some(vec!["Chop".to_string(), "Simmer".to_string(), "Serve".to_string()]),
        ..Default::default()
    };
    h.service.update_recipe(ALICE, p.recipe.id, update).await.unwrap();

    for copy in &copies {
        let detail = h.service.get_recipe(copy.id).await.unwrap();
        assert_eq!(detail.recipe.title, "Winter Soup");
        assert_eq!(detail.recipe.cook_time, None);
        assert_eq!(detail.recipe.prep_time, Some(10));
        assert_eq!(detail.steps, vec!["Chop", "Simmer", "Serve"]);
    }
}

#[tokio::test]
async fn unsupplied_fields_stay_untouched_on_linked_copies() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Cake")).await;
    let copy = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id])
        .await
        .unwrap()
        .remove(0);

    h.service.update_recipe(ALICE, copy.id, servings(12)).await.unwrap();

    let origin = h.service.get_recipe(p.recipe.id).await.unwrap();
    assert_eq!(origin.recipe.servings, 12);
    assert_eq!(origin.recipe.title, "Cake");
    assert_eq!(origin.recipe.cook_time, Some(30));
    assert_eq!(origin.steps.len(), 2);
    assert_eq!(origin.ingredients.len(), 2);
}

#[tokio::test]
async fn ingredient_replacement_propagates_in_order() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Pancakes")).await;
    let copy = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id])
        .await
        .unwrap()
        .remove(0);

    let update = RecipeUpdate {
        ingredients: Some(vec![
            ingredient("Milk", 300.0, "ml"),
            ingredient("flour", 150.0, "g"),
            ingredient("egg", 2.0, "pc"),
        ]),
        ..Default::default()
    };
    h.service.update_recipe(ALICE, p.recipe.id, update).await.unwrap();

    let detail = h.service.get_recipe(copy.id).await.unwrap();
    let names: Vec<_> = detail
        .ingredients
        .iter()
        .map(|i| (i.position, i.ingredient_name.as_str()))
        .collect();
    assert_eq!(names, vec![(0, "milk"), (1, "flour"), (2, "egg")]);
}

#[tokio::test]
async fn tags_are_never_synchronized() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let b = h.community("B", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Stew")).await;
    let copies = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id, b.id])
        .await
        .unwrap();

    h.service
        .add_recipe_tags(ALICE, copies[0].id, &tags(&["hearty"]))
        .await
        .unwrap();
    h.service.update_recipe(ALICE, copies[0].id, servings(2)).await.unwrap();

    assert!(h.service.get_recipe(copies[1].id).await.unwrap().tags.is_empty());
    assert!(h.service.get_recipe(p.recipe.id).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn editing_a_fork_never_touches_its_origin() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let b = h.community("B", ALICE, &[]).await;
    let recipe = h.recipe(ALICE, in_community("Curry", a.id)).await;
    let fork = h.service.share_recipe(ALICE, recipe.recipe.id, b.id).await.unwrap();

    h.service
        .update_recipe(ALICE, fork.recipe.id, servings(9))
        .await
        .unwrap();
    assert_eq!(
        h.service.get_recipe(recipe.recipe.id).await.unwrap().recipe.servings,
        4
    );

    h.service
        .update_recipe(ALICE, recipe.recipe.id, servings(3))
        .await
        .unwrap();
    assert_eq!(
        h.service.get_recipe(fork.recipe.id).await.unwrap().recipe.servings,
        9
    );
}

#[tokio::test]
async fn one_update_event_per_affected_community() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let b = h.community("B", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Salad")).await;
    let copies = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id, b.id])
        .await
        .unwrap();
    h.sink.clear();

    h.service.update_recipe(ALICE, copies[0].id, servings(5)).await.unwrap();

    let updates = h.sink.of_kind(ActivityKind::RecipeUpdated);
    let mut communities: Vec<_> = updates.iter().map(|e| e.community_id).collect();
    communities.sort();
    assert_eq!(communities, vec![Some(a.id), Some(b.id)]);
}

#[tokio::test]
async fn personal_edit_without_copies_emits_a_single_event() {
    let h = harness();
    let p = h.recipe(ALICE, personal("Toast")).await;
    h.sink.clear();

    h.service.update_recipe(ALICE, p.recipe.id, servings(1)).await.unwrap();

    let updates = h.sink.of_kind(ActivityKind::RecipeUpdated);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].community_id, None);
}

#[tokio::test]
async fn deleted_origin_still_lets_siblings_sync() {
    let h = harness();
    let a = h.community("A", ALICE, &[]).await;
    let b = h.community("B", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Pie")).await;
    let copies = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id, b.id])
        .await
        .unwrap();

    h.service.delete_recipe(ALICE, p.recipe.id).await.unwrap();
    h.service.update_recipe(ALICE, copies[0].id, servings(7)).await.unwrap();

    assert_eq!(
        h.service.get_recipe(copies[1].id).await.unwrap().recipe.servings,
        7
    );
}
