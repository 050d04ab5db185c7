//! The entity transform applied to every chunk.

use mobfreeze_common::FreezeRules;
use mobfreeze_common::constants::{ENTITIES_KEY, ENTITY_ID_KEY};
use mobfreeze_nbt::{Compound, List, Tag};

/// Entities touched by one transform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounts {
    /// Entities that had the forced fields written.
    pub updated: usize,
    /// Entities skipped because their id is excluded.
    pub excluded: usize,
}

/// Applies the rules to the entity list of a chunk root.
///
/// Returns `None` when the root has no `Entities` list, in which case the
/// tree is left as it was.
pub fn freeze_chunk(root: &mut Compound, rules: &FreezeRules) -> Option<EntityCounts> {
    let entities = root.get_list_mut(ENTITIES_KEY)?;
    Some(freeze_entities(entities, rules))
}

/// Forces the configured fields on every entity whose id is not excluded.
///
/// List elements that are not compounds are ignored. An entity without a
/// string id is never excluded. Applying the same rules twice leaves the
/// list unchanged after the first pass.
pub fn freeze_entities(entities: &mut List, rules: &FreezeRules) -> EntityCounts {
    let mut counts = EntityCounts::default();

    for entity in entities.iter_mut().filter_map(Tag::as_compound_mut) {
        if entity
            .get_str(ENTITY_ID_KEY)
            .is_some_and(|id| rules.is_excluded(id))
        {
            counts.excluded += 1;
            continue;
        }

        for field in &rules.forced_fields {
            entity.insert(field.as_str(), Tag::Int(rules.forced_value));
        }
        counts.updated += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use mobfreeze_nbt::TagId;

    use super::*;

    fn entity(id: &str) -> Tag {
        Tag::Compound(
            Compound::new()
                .with("id", Tag::from(id))
                .with("NoAI", Tag::Byte(0))
                .with("Health", Tag::Float(10.0)),
        )
    }

    fn chunk(ids: &[&str]) -> Compound {
        let mut list = List::new(TagId::Compound);
        for id in ids {
            list.push(entity(id)).unwrap();
        }
        Compound::new()
            .with("DataVersion", Tag::Int(3700))
            .with("Entities", Tag::List(list))
    }

    fn entity_at(root: &Compound, index: usize) -> &Compound {
        root.get("Entities")
            .and_then(Tag::as_list)
            .and_then(|list| list.get(index))
            .and_then(Tag::as_compound)
            .unwrap()
    }

    #[test]
    fn test_freeze_sets_forced_fields() {
        let mut root = chunk(&["minecraft:zombie"]);
        let counts = freeze_chunk(&mut root, &FreezeRules::default()).unwrap();
        assert_eq!(
            counts,
            EntityCounts {
                updated: 1,
                excluded: 0
            }
        );

        let zombie = entity_at(&root, 0);
        for field in ["Invulnerable", "NoAI", "NoGravity", "PersistenceRequired"] {
            assert_eq!(zombie.get(field), Some(&Tag::Int(1)), "{field}");
        }
        assert_eq!(zombie.get("Health"), Some(&Tag::Float(10.0)));
        assert_eq!(zombie.get_str("id"), Some("minecraft:zombie"));
    }

    #[test]
    fn test_excluded_entities_untouched() {
        let mut root = chunk(&["minecraft:armor_stand", "minecraft:cow", "minecraft:item"]);
        let before = root.clone();
        let counts = freeze_chunk(&mut root, &FreezeRules::default()).unwrap();

        assert_eq!(
            counts,
            EntityCounts {
                updated: 1,
                excluded: 2
            }
        );
        assert_eq!(entity_at(&root, 0), entity_at(&before, 0));
        assert_eq!(entity_at(&root, 2), entity_at(&before, 2));
        assert_eq!(entity_at(&root, 1).get("NoAI"), Some(&Tag::Int(1)));
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let rules = FreezeRules::default();
        let mut root = chunk(&["minecraft:villager", "minecraft:arrow"]);
        freeze_chunk(&mut root, &rules).unwrap();
        let once = root.clone();
        freeze_chunk(&mut root, &rules).unwrap();
        assert_eq!(root, once);
    }

    #[test]
    fn test_missing_entities_list() {
        let mut root = Compound::new().with("DataVersion", Tag::Int(3700));
        let before = root.clone();
        assert_eq!(freeze_chunk(&mut root, &FreezeRules::default()), None);
        assert_eq!(root, before);
    }

    #[test]
    fn test_entity_without_id_is_frozen() {
        let mut list = List::new(TagId::Compound);
        list.push(Tag::Compound(Compound::new())).unwrap();
        let counts = freeze_entities(&mut list, &FreezeRules::default());
        assert_eq!(counts.updated, 1);
        assert_eq!(
            list.get(0).and_then(Tag::as_compound).unwrap().len(),
            4
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = FreezeRules::empty()
            .with_excluded("minecraft:cow")
            .with_forced_field("Silent")
            .with_forced_value(0);
        let mut root = chunk(&["minecraft:cow", "minecraft:pig"]);
        let counts = freeze_chunk(&mut root, &rules).unwrap();

        assert_eq!(counts.excluded, 1);
        assert_eq!(entity_at(&root, 0).get("Silent"), None);
        assert_eq!(entity_at(&root, 1).get("Silent"), Some(&Tag::Int(0)));
        assert_eq!(entity_at(&root, 1).get("NoAI"), Some(&Tag::Byte(0)));
    }
}
