use serde_json::Value;

/// Type-name prefix of the entities the denormalizer handles.
pub const DEFAULT_ENTITY_NAMESPACE: &str = "app::entity::";

/// Error reported by an entity lookup backend.
#[derive(Debug, thiserror::Error)]
#[error("lookup of {entity_type} #{id} failed: {message}")]
pub struct LookupError {
    pub entity_type: String,
    pub id: u64,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DenormalizeError {
    #[error("cannot denormalize {data} into {type_name}")]
    Unsupported { data: String, type_name: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Finds persisted entities by type and numeric id.
#[async_trait::async_trait]
pub trait EntityLookup: Send + Sync {
    type Entity: Send;

    /// `Ok(None)` when no entity of that type has this id.
    async fn find(&self, entity_type: &str, id: u64) -> Result<Option<Self::Entity>, LookupError>;
}

/// Turns numeric ids in incoming payloads into entities.
pub struct IdDenormalizer<L> {
    lookup: L,
    namespace: String,
}

impl<L: EntityLookup> IdDenormalizer<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            namespace: DEFAULT_ENTITY_NAMESPACE.to_owned(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// True when `type_name` is an entity type and `data` looks like an id.
    pub fn supports(&self, data: &Value, type_name: &str) -> bool {
        type_name.starts_with(&self.namespace) && numeric_id(data).is_some()
    }

    pub async fn denormalize(
        &self,
        data: &Value,
        type_name: &str,
    ) -> Result<Option<L::Entity>, DenormalizeError> {
        let id = numeric_id(data)
            .filter(|_| type_name.starts_with(&self.namespace))
            .ok_or_else(|| DenormalizeError::Unsupported {
                data: data.to_string(),
                type_name: type_name.to_owned(),
            })?;

        Ok(self.lookup.find(type_name, id).await?)
    }
}

/// Unsigned integer ids, given either as a JSON number or a numeric string.
fn numeric_id(data: &Value) -> Option<u64> {
    match data {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    struct FakeLookup {
        users: HashMap<u64, User>,
    }

    #[async_trait::async_trait]
    impl EntityLookup for FakeLookup {
        type Entity = User;

        async fn find(&self, entity_type: &str, id: u64) -> Result<Option<User>, LookupError> {
            if entity_type != "app::entity::User" {
                return Err(LookupError {
                    entity_type: entity_type.to_owned(),
                    id,
                    message: "unknown table".into(),
                });
            }
            Ok(self.users.get(&id).cloned())
        }
    }

    fn denormalizer() -> IdDenormalizer<FakeLookup> {
        let mut users = HashMap::new();
        users.insert(
            7,
            User {
                id: 7,
                name: "Ada".into(),
            },
        );
        IdDenormalizer::new(FakeLookup { users })
    }

    #[test]
    fn supports_numeric_ids_for_entity_types() {
        let d = denormalizer();
        assert!(d.supports(&json!(7), "app::entity::User"));
        assert!(d.supports(&json!("7"), "app::entity::User"));
    }

    #[test]
    fn rejects_non_entity_types_and_non_numeric_data() {
        let d = denormalizer();
        assert!(!d.supports(&json!(7), "app::dto::User"));
        assert!(!d.supports(&json!("seven"), "app::entity::User"));
        assert!(!d.supports(&json!({"id": 7}), "app::entity::User"));
        assert!(!d.supports(&json!(-1), "app::entity::User"));
        assert!(!d.supports(&json!(1.5), "app::entity::User"));
    }

    #[test]
    fn custom_namespace() {
        let d = denormalizer().with_namespace("crate::models::");
        assert!(d.supports(&json!(1), "crate::models::Post"));
        assert!(!d.supports(&json!(1), "app::entity::User"));
    }

    #[tokio::test]
    async fn denormalize_finds_entity() {
        let user = denormalizer()
            .denormalize(&json!("7"), "app::entity::User")
            .await
            .unwrap();
        assert_eq!(
            user,
            Some(User {
                id: 7,
                name: "Ada".into()
            })
        );
    }

    #[tokio::test]
    async fn denormalize_missing_id_is_none() {
        let user = denormalizer()
            .denormalize(&json!(99), "app::entity::User")
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn denormalize_unsupported_errors() {
        let result = denormalizer()
            .denormalize(&json!("abc"), "app::entity::User")
            .await;
        assert!(matches!(result, Err(DenormalizeError::Unsupported { .. })));
    }

    #[tokio::test]
    async fn lookup_errors_propagate() {
        let result = denormalizer()
            .denormalize(&json!(1), "app::entity::Post")
            .await;
        assert!(matches!(result, Err(DenormalizeError::Lookup(_))));
    }
}
