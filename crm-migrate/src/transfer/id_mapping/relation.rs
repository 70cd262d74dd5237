//! Relation checks used to gate ID rewriting

use crate::host::{Metadata, RelationType};

pub struct Relation;

impl Relation {
    /// Whether `attribute` of `entity_type` may hold IDs of `foreign_type`
    ///
    /// True for the entity's own `id`, a belongsTo key pointing at the
    /// foreign type, any belongsToParent key, a hasMany/manyMany ID list of
    /// the foreign type, and attributes declared in `id_reference_attributes`.
    pub fn is_attribute_related_to(
        metadata: &dyn Metadata,
        entity_type: &str,
        attribute: &str,
        foreign_type: &str,
    ) -> bool {
        if attribute == "id" {
            return entity_type == foreign_type;
        }

        let Some(defs) = metadata.entity_defs(entity_type) else {
            return false;
        };

        let related_by_link = defs.relations.iter().any(|relation| {
            let points_at_foreign = relation.entity.as_deref() == Some(foreign_type);
            match relation.relation_type {
                RelationType::BelongsTo => {
                    points_at_foreign && link_key(&relation.name, relation.key.as_deref()) == attribute
                }
                RelationType::BelongsToParent => {
                    link_key(&relation.name, relation.key.as_deref()) == attribute
                }
                RelationType::HasMany | RelationType::ManyMany => {
                    points_at_foreign && attribute == format!("{}Ids", relation.name)
                }
                RelationType::HasChildren | RelationType::HasOne => false,
            }
        });
        if related_by_link {
            return true;
        }

        defs.id_reference_attributes
            .get(attribute)
            .is_some_and(|types| types.iter().any(|t| t == "*" || t == foreign_type))
    }
}

impl Relation {
    /// Type attribute (`<link>Type`) naming the target of a belongsToParent key
    pub fn parent_type_attribute(metadata: &dyn Metadata, entity_type: &str, attribute: &str) -> Option<String> {
        metadata
            .entity_defs(entity_type)?
            .relations
            .iter()
            .find(|r| {
                r.relation_type == RelationType::BelongsToParent
                    && link_key(&r.name, r.key.as_deref()) == attribute
            })
            .map(|r| format!("{}Type", r.name))
    }
}

fn link_key(link: &str, key: Option<&str>) -> String {
    key.map(str::to_string).unwrap_or_else(|| format!("{}Id", link))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::instance::InstanceMetadata;
    use crate::host::{EntityDefs, RelationDefs};

    fn relation(name: &str, relation_type: RelationType, entity: Option<&str>) -> RelationDefs {
        RelationDefs {
            name: name.into(),
            relation_type,
            entity: entity.map(Into::into),
            key: None,
            foreign_key: None,
        }
    }

    fn metadata() -> InstanceMetadata {
        let mut task = EntityDefs::new("Task");
        task.relations.push(relation("assignedUser", RelationType::BelongsTo, Some("User")));
        task.relations.push(relation("parent", RelationType::BelongsToParent, None));
        task.relations.push(relation("teams", RelationType::ManyMany, Some("Team")));
        task.relations.push(relation("children", RelationType::HasChildren, Some("Note")));
        task.id_reference_attributes
            .insert("data".into(), vec!["User".into(), "Team".into()]);
        task.id_reference_attributes.insert("anything".into(), vec!["*".into()]);

        InstanceMetadata::from_defs(vec![task, EntityDefs::new("User")])
    }

    #[test]
    fn test_own_id() {
        let metadata = metadata();
        assert!(Relation::is_attribute_related_to(&metadata, "User", "id", "User"));
        assert!(!Relation::is_attribute_related_to(&metadata, "Task", "id", "User"));
    }

    #[test]
    fn test_belongs_to() {
        let metadata = metadata();
        assert!(Relation::is_attribute_related_to(&metadata, "Task", "assignedUserId", "User"));
        assert!(!Relation::is_attribute_related_to(&metadata, "Task", "assignedUserId", "Team"));
        assert!(!Relation::is_attribute_related_to(&metadata, "Task", "name", "User"));
    }

    #[test]
    fn test_belongs_to_parent_matches_any_type() {
        let metadata = metadata();
        assert!(Relation::is_attribute_related_to(&metadata, "Task", "parentId", "Account"));
        assert!(Relation::is_attribute_related_to(&metadata, "Task", "parentId", "User"));
    }

    #[test]
    fn test_many_many_id_list() {
        let metadata = metadata();
        assert!(Relation::is_attribute_related_to(&metadata, "Task", "teamsIds", "Team"));
        assert!(!Relation::is_attribute_related_to(&metadata, "Task", "teamsIds", "User"));
        assert!(!Relation::is_attribute_related_to(&metadata, "Task", "childrenIds", "Note"));
    }

    #[test]
    fn test_declared_reference_attributes() {
        let metadata = metadata();
        assert!(Relation::is_attribute_related_to(&metadata, "Task", "data", "Team"));
        assert!(!Relation::is_attribute_related_to(&metadata, "Task", "data", "Account"));
        assert!(Relation::is_attribute_related_to(&metadata, "Task", "anything", "Account"));
    }

    #[test]
    fn test_unknown_entity_type() {
        let metadata = metadata();
        assert!(!Relation::is_attribute_related_to(&metadata, "Nope", "assignedUserId", "User"));
    }
}
