//! Idempotent seeding of the system vocabulary.

use forkful_core::ingredients::normalize_ingredient_name;
use forkful_core::tags::{normalize_tag_name, validate_tag_name, TagStatus};
use forkful_db::models::tag::NewTag;
use forkful_db::StoreTx;
use forkful_recipes::{IngredientResolver, ServiceResult};

use crate::config::SeedIngredient;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub tags_created: usize,
    pub ingredients_created: usize,
}

/// Ensure every name exists as an APPROVED GLOBAL tag with no creator.
pub async fn seed_global_tags(tx: &mut dyn StoreTx, names: &[String]) -> ServiceResult<usize> {
    let mut created = 0;
    for raw in names {
        let name = normalize_tag_name(raw);
        validate_tag_name(&name)?;
        if tx.find_global_tag(&name, TagStatus::Approved).await?.is_some() {
            continue;
        }
        let tag = tx.insert_tag(&NewTag::approved_global(&name, None)).await?;
        tracing::debug!(tag_id = tag.id, name = %tag.name, "Seeded global tag");
        created += 1;
    }
    Ok(created)
}

/// Ensure every ingredient exists. Ingredients created here have no
/// creator and are therefore APPROVED.
pub async fn seed_ingredients(
    tx: &mut dyn StoreTx,
    items: &[SeedIngredient],
) -> ServiceResult<usize> {
    let mut created = 0;
    for item in items {
        let name = normalize_ingredient_name(&item.name);
        if tx.find_ingredient_by_name(&name).await?.is_some() {
            continue;
        }
        IngredientResolver::find_or_create(tx, &name, None, item.default_unit.as_deref()).await?;
        created += 1;
    }
    Ok(created)
}

pub async fn seed_all(
    tx: &mut dyn StoreTx,
    tags: &[String],
    ingredients: &[SeedIngredient],
) -> ServiceResult<SeedReport> {
    Ok(SeedReport {
        tags_created: seed_global_tags(tx, tags).await?,
        ingredients_created: seed_ingredients(tx, ingredients).await?,
    })
}
