//! Proposal lifecycle: acceptance cascades, staleness, and variants.

mod common;

use assert_matches::assert_matches;
use common::*;
use forkful_core::activity::ActivityKind;
use forkful_core::error::CoreError;
use forkful_core::proposal::{ProposalDraft, ProposalStatus};
use forkful_core::recipe::{FieldPatch, RecipeKind, RecipeUpdate};
use forkful_db::{Store, StoreTx};
use forkful_recipes::ServiceError;

fn retitle(title: &str, servings: i32) -> ProposalDraft {
    ProposalDraft {
        title: Some(title.to_string()),
        servings: Some(servings),
        ..Default::default()
    }
}

/// Personal recipe by Alice published to A and B. Bob is a member of A.
/// Returns (personal id, copy in A, copy in B).
async fn family(h: &Harness) -> (i64, i64, i64) {
    let a = h.community("A", ALICE, &[BOB]).await;
    let b = h.community("B", ALICE, &[]).await;
    let p = h.recipe(ALICE, personal("Focaccia")).await;
    let copies = h
        .service
        .publish_recipe(ALICE, p.recipe.id, &[a.id, b.id])
        .await
        .unwrap();
    (p.recipe.id, copies[0].id, copies[1].id)
}

#[tokio::test]
async fn accepted_proposal_cascades_through_the_family() {
    let h = harness();
    let (p, c1, c2) = family(&h).await;

    let proposal = h
        .service
        .propose_update(BOB, c1, &retitle("New Title", 8))
        .await
        .unwrap();
    assert_eq!(proposal.status, ProposalStatus::Pending);
    h.sink.clear();

    let accepted = h.service.accept_proposal(ALICE, proposal.id).await.unwrap();
    assert_eq!(accepted.proposal.status, ProposalStatus::Accepted);
    assert!(accepted.proposal.decided_at.is_some());
    assert_eq!(accepted.propagated.len(), 2);

    for id in [p, c1, c2] {
        let recipe = h.service.get_recipe(id).await.unwrap().recipe;
        assert_eq!(recipe.title, "New Title");
        assert_eq!(recipe.servings, 8);
        assert_eq!(recipe.cook_time, Some(30));
    }

    let accepted_events = h.sink.of_kind(ActivityKind::ProposalAccepted);
    assert_eq!(accepted_events.len(), 1);
    assert_eq!(accepted_events[0].recipient_ids, vec![BOB]);
    assert_eq!(h.sink.of_kind(ActivityKind::RecipeUpdated).len(), 2);
}

#[tokio::test]
async fn stale_proposal_is_a_conflict_and_changes_nothing() {
    let h = harness();
    let (_, c1, _) = family(&h).await;
    let proposal = h
        .service
        .propose_update(BOB, c1, &retitle("New Title", 8))
        .await
        .unwrap();

    let owner_edit = RecipeUpdate {
        fields: FieldPatch {
            title: Some("Owner Title".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    h.service.update_recipe(ALICE, c1, owner_edit).await.unwrap();

    let err = h.service.accept_proposal(ALICE, proposal.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Conflict(_)));

    let recipe = h.service.get_recipe(c1).await.unwrap().recipe;
    assert_eq!(recipe.title, "Owner Title");
    assert_eq!(recipe.servings, 4);
    let pending = h.service.list_pending_proposals(c1).await.unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn accepted_steps_and_ingredients_replace_the_old_ones() {
    let h = harness();
    let (p, c1, _) = family(&h).await;
    let draft = ProposalDraft {
        steps: Some(vec!["Knead".to_string(), "Proof".to_string(), "Bake hot".to_string()]),
        ingredients: Some(vec![ingredient("rosemary", 2.0, "sprig")]),
        ..Default::default()
    };
    let proposal = h.service.propose_update(BOB, c1, &draft).await.unwrap();

    // Proposing does not touch the recipe.
    assert_eq!(h.service.get_recipe(c1).await.unwrap().steps.len(), 2);

    h.service.accept_proposal(ALICE, proposal.id).await.unwrap();
    for id in [p, c1] {
        let detail = h.service.get_recipe(id).await.unwrap();
        assert_eq!(detail.steps, vec!["Knead", "Proof", "Bake hot"]);
        assert_eq!(detail.ingredients.len(), 1);
        assert_eq!(detail.ingredients[0].ingredient_name, "rosemary");
    }
}

#[tokio::test]
async fn rejection_branches_exactly_one_variant_for_the_proposer() {
    let h = harness();
    let (_, c1, _) = family(&h).await;
    let mut tagged = tags(&["bread"]);
    tagged.push("italian".to_string());
    h.service.add_recipe_tags(ALICE, c1, &tagged).await.unwrap();
    let before = h.service.get_recipe(c1).await.unwrap();

    let proposal = h
        .service
        .propose_update(BOB, c1, &retitle("Bob's Focaccia", 6))
        .await
        .unwrap();
    let rejected = h.service.reject_proposal(ALICE, proposal.id).await.unwrap();
    assert_eq!(rejected.proposal.status, ProposalStatus::Rejected);

    let after = h.service.get_recipe(c1).await.unwrap();
    assert_eq!(after.recipe, before.recipe);

    let variants = h.service.list_variants(c1).await.unwrap();
    assert_eq!(variants.len(), 1);
    let variant = h.service.get_recipe(variants[0].id).await.unwrap();
    assert_eq!(variant.kind, RecipeKind::Variant);
    assert_eq!(variant.recipe.creator_id, BOB);
    assert_eq!(variant.recipe.community_id, before.recipe.community_id);
    assert_eq!(variant.recipe.origin_recipe_id, Some(c1));
    assert_eq!(variant.recipe.title, "Bob's Focaccia");
    assert_eq!(variant.recipe.servings, 6);
    assert_eq!(variant.recipe.prep_time, before.recipe.prep_time);
    assert_eq!(variant.steps, before.steps);
    assert_eq!(variant.tags.len(), 2);

    let kinds = h.sink.kinds();
    assert!(kinds.contains(&ActivityKind::ProposalRejected));
    assert!(kinds.contains(&ActivityKind::VariantCreated));
}

#[tokio::test]
async fn variants_are_isolated_from_sync() {
    let h = harness();
    let (p, c1, _) = family(&h).await;
    let proposal = h
        .service
        .propose_update(BOB, c1, &retitle("Branch", 2))
        .await
        .unwrap();
    let variant = h.service.reject_proposal(ALICE, proposal.id).await.unwrap().variant;

    let edit = |servings| RecipeUpdate {
        fields: FieldPatch {
            servings: Some(servings),
            ..Default::default()
        },
        ..Default::default()
    };
    h.service.update_recipe(BOB, variant.id, edit(10)).await.unwrap();
    assert_eq!(h.service.get_recipe(c1).await.unwrap().recipe.servings, 4);
    assert_eq!(h.service.get_recipe(p).await.unwrap().recipe.servings, 4);

    h.service.update_recipe(ALICE, p, edit(5)).await.unwrap();
    assert_eq!(h.service.get_recipe(variant.id).await.unwrap().recipe.servings, 10);
}

#[tokio::test]
async fn proposals_are_decided_once_by_the_creator() {
    let h = harness();
    let (_, c1, _) = family(&h).await;
    let proposal = h
        .service
        .propose_update(BOB, c1, &retitle("Once", 3))
        .await
        .unwrap();

    let err = h.service.accept_proposal(BOB, proposal.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    h.service.reject_proposal(ALICE, proposal.id).await.unwrap();
    let err = h.service.accept_proposal(ALICE, proposal.id).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::Core(CoreError::AlreadyDecided { entity: "Proposal", .. })
    );
    let err = h.service.reject_proposal(ALICE, proposal.id).await.unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::AlreadyDecided { .. }));
    assert_eq!(h.service.list_variants(c1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn who_may_propose() {
    let h = harness();
    let (p, c1, c2) = family(&h).await;

    let err = h
        .service
        .propose_update(ALICE, c1, &retitle("Mine", 2))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    let err = h
        .service
        .propose_update(BOB, p, &retitle("Personal", 2))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));

    // Bob is not a member of B.
    let err = h
        .service
        .propose_update(BOB, c2, &retitle("Outsider", 2))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Forbidden(_)));

    let err = h
        .service
        .propose_update(BOB, c1, &ProposalDraft::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn proposal_ingredients_are_resolved_for_the_proposer() {
    let h = harness();
    let (_, c1, _) = family(&h).await;
    let draft = ProposalDraft {
        ingredients: Some(vec![ingredient("Za'atar", 1.0, "tbsp")]),
        ..Default::default()
    };
    let proposal = h.service.propose_update(BOB, c1, &draft).await.unwrap();

    let mut tx = h.store.begin().await.unwrap();
    let lines = tx.list_proposal_ingredients(proposal.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    let ingredient = tx
        .find_ingredient_by_name("za'atar")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ingredient.id, lines[0].ingredient_id);
    assert_eq!(ingredient.created_by, Some(BOB));
}
