/**
 * Per-client report context.
 *
 * The `Context` accumulates the metadata attached to every report the
 * client sends: version, tags, user, custom data, the associated request
 * and an optional grouping-key callback. It is owned by exactly one
 * `Client` and only changed through the client's chainable setters.
 *
 * Cloning copies every value field. The request and the grouping callback
 * are shared behind `Arc`s, so the objects themselves are shared between
 * clones, but assigning a new one on a clone leaves the original alone.
 */
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::protocol::types::{CustomData, Payload};
use crate::request::RequestSource;

/**
 * Computes a custom grouping key from the error and the payload assembled
 * so far. Returning an empty string keeps the backend's default grouping.
 */
pub type GroupingKeyFn = Arc<dyn Fn(&dyn Error, &Payload) -> String + Send + Sync>;

#[derive(Clone)]
pub struct Context {
    request: Option<Arc<dyn RequestSource>>,
    version: String,
    tags: Vec<String>,
    custom_data: CustomData,
    user: String,
    grouping_key_fn: Option<GroupingKeyFn>,

    /// Unique per process, generated once. Never settable.
    identifier: String,
}

impl Context {
    /// Creates an empty context with a fresh process identifier.
    pub fn new() -> Self {
        Self {
            request: None,
            version: String::new(),
            tags: Vec::new(),
            custom_data: CustomData::Empty,
            user: String::new(),
            grouping_key_fn: None,
            identifier: Uuid::new_v4().to_string(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn custom_data(&self) -> &CustomData {
        &self.custom_data
    }

    pub fn request(&self) -> Option<&dyn RequestSource> {
        self.request.as_deref()
    }

    pub fn grouping_key_fn(&self) -> Option<&GroupingKeyFn> {
        self.grouping_key_fn.as_ref()
    }

    pub(crate) fn set_request(&mut self, request: Arc<dyn RequestSource>) {
        self.request = Some(request);
    }

    pub(crate) fn set_version(&mut self, version: String) {
        self.version = version;
    }

    /// Replaces the current tags.
    pub(crate) fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    pub(crate) fn set_custom_data<T: Serialize + ?Sized>(&mut self, data: &T) {
        self.custom_data = CustomData::from_serialize(data);
    }

    pub(crate) fn set_user(&mut self, user: String) {
        self.user = user;
    }

    pub(crate) fn set_grouping_key_fn<F>(&mut self, callback: F)
    where
        F: Fn(&dyn Error, &Payload) -> String + Send + Sync + 'static,
    {
        self.grouping_key_fn = Some(Arc::new(callback));
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request.as_ref().map(|request| request.url()))
            .field("version", &self.version)
            .field("tags", &self.tags)
            .field("custom_data", &self.custom_data)
            .field("user", &self.user)
            .field("grouping_key_fn", &self.grouping_key_fn.is_some())
            .field("identifier", &self.identifier)
            .finish()
    }
}
