use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::api::client::ApiClient;
use crate::api::CollectionApi;
use crate::collections::{Collection, Shape};
use crate::errors::AdminError;
use crate::models::{id_from_json, is_placeholder_id, CollectionItem};

/// [`CollectionApi`] over HTTP for the collection described by `C`.
pub struct HttpCollectionClient<C> {
    api: ApiClient,
    _collection: PhantomData<fn() -> C>,
}

impl<C> Clone for HttpCollectionClient<C> {
    fn clone(&self) -> Self {
        Self { api: self.api.clone(), _collection: PhantomData }
    }
}

impl<C: Collection> HttpCollectionClient<C> {
    pub fn new(api: ApiClient) -> Self {
        Self { api, _collection: PhantomData }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn decode_item(value: Value) -> Option<C::Payload> {
        match serde_json::from_value(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Skipping malformed {} item: {e}", C::NAME);
                None
            }
        }
    }

    /// Maps a GET body onto items according to the collection's shape.
    pub fn decode_list(body: Value) -> Vec<CollectionItem<C::Payload>> {
        match (C::SHAPE, body) {
            (_, Value::Null) => Vec::new(),
            (Shape::Array, Value::Array(values)) => values
                .into_iter()
                .filter_map(|value| {
                    let id = value.get("id").and_then(id_from_json);
                    Self::decode_item(value).map(|payload| CollectionItem { id, payload })
                })
                .collect(),
            (Shape::WholeList { .. }, Value::Array(values)) => values
                .into_iter()
                .filter_map(Self::decode_item)
                .map(|payload| CollectionItem { id: C::natural_key(&payload), payload })
                .collect(),
            (Shape::Keyed { key_field, value_field }, Value::Object(map)) => map
                .into_iter()
                .filter_map(|(key, value)| {
                    let mut fields = Map::new();
                    fields.insert(key_field.to_string(), Value::String(key.clone()));
                    fields.insert(value_field.to_string(), value);
                    Self::decode_item(Value::Object(fields))
                        .map(|payload| CollectionItem { id: Some(key), payload })
                })
                .collect(),
            (shape, other) => {
                warn!("Unexpected {} body for {shape:?} collection {}", json_kind(&other), C::NAME);
                Vec::new()
            }
        }
    }

    /// Current server list as raw values, for read-modify-write.
    ///
    /// A 404 here means the list endpoint itself is missing, not the item.
    async fn fetch_whole_list(&self) -> Result<Vec<Value>, AdminError> {
        match self.api.get_json(C::PATH).await.map_err(list_endpoint_missing)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(values) => Ok(values),
            other => Err(AdminError::unavailable(
                C::PATH,
                format!("expected a JSON array, got {}", json_kind(&other)),
            )),
        }
    }

    async fn store_whole_list(&self, field: &str, values: Vec<Value>) -> Result<(), AdminError> {
        let mut body = Map::new();
        body.insert(field.to_string(), Value::Array(values));
        self.api
            .post_json(C::PATH, &Value::Object(body))
            .await
            .map(drop)
            .map_err(list_endpoint_missing)
    }

    fn position_of(values: &[Value], key: &str) -> Option<usize> {
        values.iter().position(|v| Self::key_of(v).as_deref() == Some(key))
    }

    fn key_of(value: &Value) -> Option<String> {
        serde_json::from_value::<C::Payload>(value.clone())
            .ok()
            .and_then(|payload| C::natural_key(&payload))
    }
}

#[async_trait]
impl<C: Collection> CollectionApi<C::Payload> for HttpCollectionClient<C> {
    async fn list(&self) -> Result<Vec<CollectionItem<C::Payload>>, AdminError> {
        let body = self.api.get_json(C::PATH).await?;
        Ok(Self::decode_list(body))
    }

    async fn remove(&self, id: &str) -> Result<(), AdminError> {
        if is_placeholder_id(id) {
            return Err(AdminError::InvalidId {
                id: id.to_string(),
                reason: "not confirmed by the server",
            });
        }

        match C::SHAPE {
            Shape::Array | Shape::Keyed { .. } => {
                self.api.delete(C::PATH, &[(C::ID_PARAM, id)]).await?;
            }
            Shape::WholeList { field } => {
                let mut values = self.fetch_whole_list().await?;
                let pos = Self::position_of(&values, id)
                    .ok_or_else(|| AdminError::NotFound { endpoint: C::PATH.to_string() })?;
                values.remove(pos);
                self.store_whole_list(field, values).await?;
            }
        }
        info!("Removed {id} from {}", C::NAME);
        Ok(())
    }

    async fn remove_all(&self) -> Result<(), AdminError> {
        if !C::CLEARABLE {
            return Err(AdminError::Unsupported { operation: "clear", collection: C::NAME });
        }
        self.api.delete(C::PATH, &[("all", "1")]).await?;
        info!("Cleared {}", C::NAME);
        Ok(())
    }

    async fn add(&self, payload: &C::Payload) -> Result<String, AdminError> {
        let encoded = serde_json::to_value(payload).map_err(|e| AdminError::decode(C::PATH, e))?;

        let id = match C::SHAPE {
            Shape::Array => {
                let reply = self.api.post_json(C::PATH, &encoded).await?;
                reply
                    .get("id")
                    .and_then(id_from_json)
                    .ok_or_else(|| AdminError::MissingId { endpoint: C::PATH.to_string() })?
            }
            Shape::Keyed { .. } => {
                let key = C::natural_key(payload)
                    .ok_or_else(|| AdminError::MissingId { endpoint: C::PATH.to_string() })?;
                self.api.post_json(C::PATH, &encoded).await?;
                key
            }
            Shape::WholeList { field } => {
                let key = C::natural_key(payload)
                    .ok_or_else(|| AdminError::MissingId { endpoint: C::PATH.to_string() })?;
                let mut values = self.fetch_whole_list().await?;
                if Self::position_of(&values, &key).is_some() {
                    return Err(AdminError::Duplicate { key });
                }
                values.push(encoded);
                self.store_whole_list(field, values).await?;
                key
            }
        };
        info!("Added {id} to {}", C::NAME);
        Ok(id)
    }

    async fn update(&self, id: &str, payload: &C::Payload) -> Result<String, AdminError> {
        if is_placeholder_id(id) {
            return Err(AdminError::InvalidId {
                id: id.to_string(),
                reason: "not confirmed by the server",
            });
        }
        let encoded = serde_json::to_value(payload).map_err(|e| AdminError::decode(C::PATH, e))?;

        let key = match C::SHAPE {
            Shape::Array => {
                return Err(AdminError::Unsupported { operation: "update", collection: C::NAME });
            }
            Shape::Keyed { .. } => {
                // Overwrite by key; the key itself is fixed.
                if C::natural_key(payload).as_deref() != Some(id) {
                    return Err(AdminError::InvalidId { id: id.to_string(), reason: "the key cannot change" });
                }
                self.api.post_json(C::PATH, &encoded).await.map_err(list_endpoint_missing)?;
                id.to_string()
            }
            Shape::WholeList { field } => {
                let key = C::natural_key(payload)
                    .ok_or_else(|| AdminError::MissingId { endpoint: C::PATH.to_string() })?;
                let mut values = self.fetch_whole_list().await?;
                let pos = Self::position_of(&values, id)
                    .ok_or_else(|| AdminError::NotFound { endpoint: C::PATH.to_string() })?;
                if key != id && Self::position_of(&values, &key).is_some() {
                    return Err(AdminError::Duplicate { key });
                }
                values[pos] = encoded;
                self.store_whole_list(field, values).await?;
                key
            }
        };
        info!("Updated {id} in {}", C::NAME);
        Ok(key)
    }
}

/// Turns a 404 from a collection-wide request into an outage.
fn list_endpoint_missing(err: AdminError) -> AdminError {
    match err {
        AdminError::NotFound { endpoint } => AdminError::Unavailable { endpoint, reason: "endpoint not found".into() },
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
