/**
 * Payload assembly.
 *
 * Combines the client's `Context`, the reported error and its stack into
 * a fresh `Payload`. Assembly never fails: a missing hostname falls back
 * to `"not available"` and a missing request yields an empty snapshot.
 */
use std::error::Error;

use chrono::Utc;

use crate::context::Context;
use crate::protocol::constants::{CLIENT_NAME, CLIENT_URL, CLIENT_VERSION, UNKNOWN_MACHINE_NAME};
use crate::protocol::types::{
    ClientData, ContextData, Details, ErrorData, Payload, RequestData, StackFrame, UserData,
};

/// `occurredOn` format. Always UTC, always a literal `Z`.
const OCCURRED_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

impl Payload {
    /**
     * Builds the payload for `error` with the given `stack`.
     *
     * If the context has a grouping-key callback it is invoked last, with
     * the otherwise complete payload; a non-empty result becomes
     * `details.groupingKey`.
     */
    pub fn assemble(context: &Context, error: &dyn Error, stack: Vec<StackFrame>) -> Payload {
        let mut payload = Payload {
            occurred_on: Utc::now().format(OCCURRED_ON_FORMAT).to_string(),
            details: Details {
                machine_name: machine_name(),
                version: context.version().to_string(),
                error: ErrorData {
                    message: error.to_string(),
                    stack_trace: stack,
                },
                tags: context.tags().to_vec(),
                user_custom_data: context.custom_data().clone(),
                request: RequestData::capture(context.request()),
                user: UserData {
                    identifier: context.user().to_string(),
                },
                context: ContextData {
                    identifier: context.identifier().to_string(),
                },
                client: ClientData::current(),
                grouping_key: None,
            },
        };

        if let Some(callback) = context.grouping_key_fn() {
            let key = callback(error, &payload);
            if !key.is_empty() {
                payload.details.grouping_key = Some(key);
            }
        }

        payload
    }
}

impl ClientData {
    /// Identity of this library.
    pub fn current() -> Self {
        ClientData {
            name: CLIENT_NAME.to_string(),
            version: CLIENT_VERSION.to_string(),
            client_url: CLIENT_URL.to_string(),
        }
    }
}

fn machine_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_MACHINE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use serde::ser::Error as _;
    use serde::{Serialize, Serializer};

    use super::*;
    use crate::stack::TracedError;

    fn stack() -> Vec<StackFrame> {
        vec![
            StackFrame::new(11, "foo/package1", "filename1.go", "method1()"),
            StackFrame::new(22, "foo/package2", "filename2.go", "(*action).method2(0x208304420)"),
        ]
    }

    fn context() -> Context {
        let mut context = Context::new();
        context.set_version("1.0.0".into());
        context.set_tags(vec!["local".into()]);
        context.set_user("Test User".into());
        context
    }

    #[test]
    fn test_assemble_copies_context_and_error() {
        let context = context();
        let err = TracedError::with_stack("test error", Vec::new());

        let payload = Payload::assemble(&context, &err, stack());
        let details = &payload.details;

        assert_eq!(details.version, "1.0.0");
        assert_eq!(details.tags, vec!["local".to_string()]);
        assert_eq!(details.user.identifier, "Test User");
        assert_eq!(details.context.identifier, context.identifier());
        assert_eq!(details.error.message, "test error");
        assert_eq!(details.error.stack_trace, stack());
        assert_eq!(details.request, RequestData::default());
        assert_eq!(details.client, ClientData::current());
        assert!(!details.machine_name.is_empty());
        assert!(details.grouping_key.is_none());
    }

    #[test]
    fn test_occurred_on_format() {
        let err = TracedError::with_stack("x", Vec::new());
        let payload = Payload::assemble(&Context::new(), &err, Vec::new());

        assert!(payload.occurred_on.ends_with('Z'));
        assert_eq!(payload.occurred_on.len(), "2006-01-02T15:04:05Z".len());
        assert!(NaiveDateTime::parse_from_str(&payload.occurred_on, OCCURRED_ON_FORMAT).is_ok());
    }

    #[test]
    fn test_wire_field_names() {
        let err = TracedError::with_stack("test error", Vec::new());
        let json = serde_json::to_value(Payload::assemble(&context(), &err, stack())).unwrap();

        let details = &json["details"];
        assert!(json["occurredOn"].is_string());
        assert!(details["machineName"].is_string());
        assert_eq!(details["error"]["message"], "test error");
        assert_eq!(details["error"]["stackTrace"][0]["lineNumber"], 11);
        assert_eq!(details["error"]["stackTrace"][0]["className"], "foo/package1");
        assert_eq!(details["error"]["stackTrace"][0]["fileName"], "filename1.go");
        assert_eq!(details["error"]["stackTrace"][0]["methodName"], "method1()");
        assert!(details["userCustomData"].is_null());
        assert!(details["request"]["hostName"].is_string());
        assert!(details["request"]["queryString"].is_object());
        assert_eq!(details["user"]["identifier"], "Test User");
        assert_eq!(details["client"]["identifier"], CLIENT_NAME);
        assert_eq!(details["client"]["clientUrl"], CLIENT_URL);
        assert!(details.get("groupingKey").is_none());
    }

    #[test]
    fn test_grouping_key_empty_keeps_default_grouping() {
        let mut context = context();
        context.set_grouping_key_fn(|_, _| String::new());

        let err = TracedError::with_stack("x", Vec::new());
        let payload = Payload::assemble(&context, &err, Vec::new());

        assert!(payload.details.grouping_key.is_none());
    }

    #[test]
    fn test_grouping_key_sees_error_and_payload() {
        let mut context = context();
        context.set_grouping_key_fn(|err, payload| format!("{}:{}", err, payload.details.version));

        let err = TracedError::with_stack("k", Vec::new());
        let payload = Payload::assemble(&context, &err, Vec::new());

        assert_eq!(payload.details.grouping_key.as_deref(), Some("k:1.0.0"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap()["details"]["groupingKey"],
            "k:1.0.0"
        );
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("nope"))
        }
    }

    #[test]
    fn test_unserializable_custom_data_fails_at_encoding() {
        let mut context = context();
        context.set_custom_data(&Unserializable);

        let err = TracedError::with_stack("x", Vec::new());
        let payload = Payload::assemble(&context, &err, Vec::new());

        assert!(serde_json::to_string(&payload).is_err());
    }
}
