//! Shared fixtures for service integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use forkful_core::activity::{ActivityKind, DomainEvent};
use forkful_core::ingredients::IngredientInput;
use forkful_core::membership::MemberRole;
use forkful_core::recipe::RecipeDraft;
use forkful_core::types::DbId;
use forkful_db::models::community::Community;
use forkful_db::MemoryStore;
use forkful_recipes::{EventSink, NewRecipeInput, RecipeDetail, RecipeService};

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;
pub const CAROL: DbId = 3;
pub const DAVE: DbId = 4;

/// Sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<ActivityKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    pub fn of_kind(&self, kind: ActivityKind) -> Vec<DomainEvent> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &DomainEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub struct Harness {
    pub service: RecipeService,
    pub store: MemoryStore,
    pub sink: Arc<RecordingSink>,
}

pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let sink = Arc::new(RecordingSink::default());
    let service = RecipeService::new(Arc::new(store.clone()), sink.clone());
    Harness {
        service,
        store,
        sink,
    }
}

impl Harness {
    /// A community owned (and moderated) by `owner` with `members` as plain members.
    pub async fn community(&self, name: &str, owner: DbId, members: &[DbId]) -> Community {
        let community = self.service.create_community(owner, name).await.unwrap();
        for &member in members {
            self.service
                .add_member(owner, community.id, member, MemberRole::Member)
                .await
                .unwrap();
        }
        community
    }

    pub async fn recipe(&self, actor: DbId, input: NewRecipeInput) -> RecipeDetail {
        self.service.create_recipe(actor, input).await.unwrap()
    }
}

pub fn draft(title: &str) -> RecipeDraft {
    RecipeDraft {
        title: title.to_string(),
        servings: 4,
        prep_time: Some(10),
        cook_time: Some(30),
        rest_time: None,
        image_url: None,
        steps: vec!["Mix everything".to_string(), "Bake".to_string()],
    }
}

pub fn ingredient(name: &str, quantity: f64, unit: &str) -> IngredientInput {
    IngredientInput {
        name: name.to_string(),
        quantity: Some(quantity),
        unit: Some(unit.to_string()),
    }
}

pub fn personal(title: &str) -> NewRecipeInput {
    NewRecipeInput {
        draft: draft(title),
        community_id: None,
        tags: Vec::new(),
        ingredients: vec![ingredient("flour", 200.0, "g"), ingredient("sugar", 50.0, "g")],
    }
}

pub fn in_community(title: &str, community_id: DbId) -> NewRecipeInput {
    NewRecipeInput {
        community_id: Some(community_id),
        ..personal(title)
    }
}

pub fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
