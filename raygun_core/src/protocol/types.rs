/**
 * Wire types for the Raygun entries API.
 *
 * The outermost structure is `Payload`, POSTed as JSON to
 * `{endpoint}/entries`:
 * ```json
 * {
 *   "occurredOn": "2024-01-02T15:04:05Z",
 *   "details": { "machineName": "...", "error": { ... }, ... }
 * }
 * ```
 *
 * Field names are fixed by the backend; every rename below is load-bearing.
 */
use std::collections::BTreeMap;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Payload: the top-level structure POSTed to the endpoint
// ---------------------------------------------------------------------------

/**
 * A single error report.
 *
 * Built fresh per report by `Payload::assemble` and never mutated
 * afterwards, except for the optional grouping key which is injected
 * once during assembly.
 */
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// UTC timestamp formatted as `YYYY-MM-DDTHH:MM:SSZ`.
    pub occurred_on: String,

    /// Everything the backend knows about the failure.
    pub details: Details,
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/**
 * The circumstances the error occurred in: machine, error, request,
 * user and the configured context.
 */
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    /// The machine's hostname, or `"not available"`.
    pub machine_name: String,

    /// Application version from the context.
    pub version: String,

    /// Message and stack trace of the reported error.
    pub error: ErrorData,

    /// Tags from the context, in the order they were set.
    pub tags: Vec<String>,

    /// Arbitrary user-supplied data.
    pub user_custom_data: CustomData,

    /// Flattened snapshot of the associated HTTP request.
    pub request: RequestData,

    /// The affected user.
    pub user: UserData,

    /// Process-unique identifier.
    pub context: ContextData,

    /// Identity of this library.
    pub client: ClientData,

    /// Caller-supplied grouping key. Omitted when the backend should group
    /// by stack-trace similarity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_key: Option<String>,
}

/// Everything we know about the error itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub message: String,
    pub stack_trace: Vec<StackFrame>,
}

// ---------------------------------------------------------------------------
// StackFrame
// ---------------------------------------------------------------------------

/**
 * One entry of a call stack.
 *
 * `line_number` is `0` when the location was unknown or unparsable.
 * `package_name` is empty for frames without a package qualifier, e.g.
 * bare runtime functions. The backend calls this field `className`.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub line_number: u32,

    #[serde(rename = "className")]
    pub package_name: String,

    pub file_name: String,

    pub method_name: String,
}

impl StackFrame {
    pub fn new(
        line_number: u32,
        package_name: impl Into<String>,
        file_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            package_name: package_name.into(),
            file_name: file_name.into(),
            method_name: method_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestData
// ---------------------------------------------------------------------------

/**
 * Flattened projection of an HTTP request.
 *
 * Every multi-valued entry has been collapsed into one display string
 * (see `request::flatten`). All fields are empty when no request was
 * associated with the report.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub host_name: String,

    pub url: String,

    pub http_method: String,

    pub ip_address: String,

    /// Key-value pairs from the URL query.
    pub query_string: BTreeMap<String, String>,

    /// Key-value pairs from a posted form.
    pub form: BTreeMap<String, String>,

    pub headers: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// User / context / client identity
// ---------------------------------------------------------------------------

/// The affected user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub identifier: String,
}

/// The running process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextData {
    pub identifier: String,
}

/// Identity of the reporting library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    #[serde(rename = "identifier")]
    pub name: String,

    pub version: String,

    pub client_url: String,
}

// ---------------------------------------------------------------------------
// CustomData
// ---------------------------------------------------------------------------

/**
 * User-supplied custom data, already converted to JSON.
 *
 * A value that failed to convert is kept as `Invalid` so that the failure
 * surfaces when the payload is serialized for delivery, not when the
 * data is configured.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CustomData {
    /// Nothing configured. Serialized as `null`.
    #[default]
    Empty,

    /// Successfully converted data.
    Value(serde_json::Value),

    /// Conversion failed with this message.
    Invalid(String),
}

impl CustomData {
    /// Converts any serializable value, recording the failure instead of
    /// returning it.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => CustomData::Value(value),
            Err(err) => CustomData::Invalid(err.to_string()),
        }
    }
}

impl Serialize for CustomData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CustomData::Empty => serializer.serialize_none(),
            CustomData::Value(value) => value.serialize(serializer),
            CustomData::Invalid(message) => Err(S::Error::custom(format!(
                "custom data is not serializable: {message}"
            ))),
        }
    }
}
