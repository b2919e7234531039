//! End-to-end dispatch behavior over raw request bodies

use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use turul_json_rpc_dispatcher::{
    ApplicationError, DispatcherConfig, HandlerError, JsonRpcDispatcher, JsonRpcMessage,
    MethodBuilder, MethodRegistry, RawRequest, RegistryError, RequestContext, RequestId,
    ReservedCodeError, Signature, TransportRequest,
};

fn add_registry(calls: Arc<AtomicUsize>) -> MethodRegistry {
    MethodRegistry::new()
        .with(
            MethodBuilder::new("add")
                .param("a")
                .param("b")
                .blocking_handler(move |args, _| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(args.get_as::<i64>("a")? + args.get_as::<i64>("b")?)
                })
                .build()
                .unwrap(),
        )
        .unwrap()
        .with(
            MethodBuilder::new("ping")
                .blocking_handler(|_, _| Ok("pong"))
                .build()
                .unwrap(),
        )
        .unwrap()
        .with(
            MethodBuilder::new("echo")
                .signature(Signature::new().param("value").extra("rest"))
                .handler(|args, _| async move { args.get_as::<Value>("value") })
                .build()
                .unwrap(),
        )
        .unwrap()
}

fn dispatcher() -> JsonRpcDispatcher {
    JsonRpcDispatcher::new(add_registry(Arc::new(AtomicUsize::new(0))))
}

async fn reply(dispatcher: &JsonRpcDispatcher, body: &str) -> Option<Value> {
    let body = dispatcher.dispatch(body, None).await;
    (!body.is_empty()).then(|| serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_success_echoes_request_id() {
    let dispatcher = dispatcher();
    for id in [json!(1), json!("abc"), json!(-7), json!(1.5), json!("")] {
        for params in [json!([1, 2]), json!({"a": 1, "b": 2})] {
            let request = json!({"jsonrpc": "2.0", "method": "add", "params": params, "id": id});
            let response = reply(&dispatcher, &request.to_string()).await.unwrap();
            assert_eq!(response["id"], id);
            assert_eq!(response["result"], 3);
            assert!(response.get("error").is_none());
        }
    }

    let response = reply(&dispatcher, r#"{"jsonrpc":"2.0","method":"ping","id":9}"#)
        .await
        .unwrap();
    assert_eq!(response, json!({"jsonrpc": "2.0", "id": 9, "result": "pong"}));
}

#[tokio::test]
async fn test_exact_wire_format() {
    let dispatcher = dispatcher();
    assert_eq!(
        dispatcher
            .dispatch(r#"{"jsonrpc":"2.0","method":"add","params":[1,2],"id":1}"#, None)
            .await,
        r#"{"jsonrpc":"2.0","id":1,"result":3}"#
    );

    let body = dispatcher.dispatch("not json", None).await;
    assert!(body.starts_with(r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"#));
    let response: Value = serde_json::from_str(&body).unwrap();
    let detail = response["error"]["data"].as_str().unwrap();
    assert_eq!(
        response["error"]["message"],
        format!("Server received invalid JSON: {}", detail)
    );
}

#[tokio::test]
async fn test_large_numeric_ids_are_echoed_verbatim() {
    let dispatcher = dispatcher();
    for id in ["123456789012345678901234567890", "1e400", "-0.000000000000000000000001"] {
        let body = format!(r#"{{"jsonrpc":"2.0","method":"ping","id":{}}}"#, id);
        assert_eq!(
            dispatcher.dispatch(&body, None).await,
            format!(r#"{{"jsonrpc":"2.0","id":{},"result":"pong"}}"#, id)
        );
    }
}

#[tokio::test]
async fn test_unserializable_result_becomes_internal_error() {
    let registry = MethodRegistry::new()
        .with(
            MethodBuilder::new("pairs")
                .blocking_handler(|_, _| {
                    let mut pairs = HashMap::new();
                    pairs.insert((1, 2), "three");
                    Ok(pairs)
                })
                .build()
                .unwrap(),
        )
        .unwrap();
    let dispatcher = JsonRpcDispatcher::new(registry);

    assert_eq!(
        dispatcher
            .dispatch(r#"{"jsonrpc":"2.0","method":"pairs","id":5}"#, None)
            .await,
        r#"{"jsonrpc":"2.0","id":5,"error":{"code":-32603,"message":"key must be a string"}}"#
    );
    assert_eq!(
        dispatcher
            .dispatch(r#"{"jsonrpc":"2.0","method":"pairs"}"#, None)
            .await,
        ""
    );
}

#[tokio::test]
async fn test_notifications_never_get_a_reply() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = JsonRpcDispatcher::new(add_registry(calls.clone()));
    for body in [
        r#"{"jsonrpc":"2.0","method":"add","params":[1,2]}"#,
        r#"{"jsonrpc":"2.0","method":"add","params":[1]}"#,
        r#"{"jsonrpc":"2.0","method":"add","params":{"a":1,"c":2}}"#,
        r#"{"jsonrpc":"2.0","method":"nope"}"#,
        r#"{"jsonrpc":"2.1","method":"add"}"#,
        r#"{"method":"add","params":[1,2]}"#,
        r#"{"jsonrpc":"2.0","method":7}"#,
        r#"{"jsonrpc":"2.0","method":"add","params":"1,2"}"#,
    ] {
        assert_eq!(dispatcher.dispatch(body, None).await, "", "{}", body);
    }
    // Only the first notification was well-formed enough to run
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_params_never_invokes_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = JsonRpcDispatcher::new(add_registry(calls.clone()));
    for params in [json!([1]), json!([1, 2, 3]), json!({"a": 1}), json!({"a": 1, "b": 2, "c": 3}), json!([])] {
        let request = json!({"jsonrpc": "2.0", "method": "add", "params": params, "id": 1});
        let response = reply(&dispatcher, &request.to_string()).await.unwrap();
        assert_eq!(response["error"]["code"], -32602, "{}", request);
        assert_eq!(response["id"], 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_named_params_go_to_extra() {
    let response = reply(
        &dispatcher(),
        r#"{"jsonrpc":"2.0","method":"echo","params":{"value":[1],"other":true},"id":1}"#,
    )
    .await
    .unwrap();
    assert_eq!(response["result"], json!([1]));
}

#[tokio::test]
async fn test_method_not_found_names_the_method() {
    let response = reply(
        &dispatcher(),
        r#"{"jsonrpc":"2.0","method":"frobnicate","id":"q"}"#,
    )
    .await
    .unwrap();
    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["message"], "Method not found `frobnicate`");
    assert_eq!(response["id"], "q");
}

#[tokio::test]
async fn test_invalid_request_messages() {
    let dispatcher = dispatcher();
    let cases = [
        (
            r#"{"method":"add","id":1}"#,
            "Missing `jsonrpc` key in request object",
        ),
        (
            r#"{"jsonrpc":"1.0","method":"add","id":1}"#,
            "Server supports only version 2.0 of the JSON-RPC protocol",
        ),
        (
            r#"{"jsonrpc":2.0,"method":"add","id":1}"#,
            "Server supports only version 2.0 of the JSON-RPC protocol",
        ),
        (
            r#"{"jsonrpc":"2.0","id":1}"#,
            "Missing `method` key in request object",
        ),
        (r#"{"jsonrpc":"2.0","method":["add"],"id":1}"#, "`method` must be a string"),
        (
            r#"{"jsonrpc":"2.0","method":"add","params":3,"id":1}"#,
            "`params` must be an array or an object",
        ),
    ];
    for (body, message) in cases {
        let response = reply(&dispatcher, body).await.unwrap();
        assert_eq!(response["error"]["code"], -32600, "{}", body);
        assert_eq!(response["error"]["message"], message, "{}", body);
        assert_eq!(response["id"], 1, "{}", body);
    }
}

#[tokio::test]
async fn test_untrusted_shapes_reply_with_null_id() {
    let dispatcher = dispatcher();
    for body in [
        r#"[{"jsonrpc":"2.0","method":"ping","id":1}]"#,
        r#""just a string""#,
        r#"{"jsonrpc":"2.0","method":"ping","id":{"nested":true}}"#,
        r#"{"jsonrpc":"2.0","method":"ping","id":true}"#,
    ] {
        let response = reply(&dispatcher, body).await.unwrap();
        assert_eq!(response["error"]["code"], -32600, "{}", body);
        assert_eq!(response["id"], Value::Null, "{}", body);
    }
}

#[tokio::test]
async fn test_malformed_json_always_replies() {
    let dispatcher = dispatcher();
    for body in ["not json", "", "{", r#"{"jsonrpc":"2.0","method":"add""#] {
        let response = reply(&dispatcher, body).await.unwrap();
        assert_eq!(response["error"]["code"], -32700, "{:?}", body);
        assert_eq!(response["id"], Value::Null);
    }
}

#[tokio::test]
async fn test_round_trip_of_handler_value() {
    let value = json!({"nested": [1, "two", null, {"three": 3.5}], "flag": false});
    let response = reply(
        &dispatcher(),
        &json!({"jsonrpc": "2.0", "method": "echo", "params": [value.clone()], "id": 1}).to_string(),
    )
    .await
    .unwrap();
    assert_eq!(response["result"], value);
}

#[test]
fn test_reserved_codes_fail_at_construction() {
    assert_eq!(
        ApplicationError::new(-32000, "reserved").unwrap_err(),
        ReservedCodeError(-32000)
    );
    assert!(
        ApplicationError::new(-32001, "reserved")
            .unwrap_err()
            .to_string()
            .contains("reserved")
    );
    assert!(ApplicationError::new(-1, "fine").is_ok());
}

#[test]
fn test_duplicate_registration_has_no_effect() {
    let mut registry = add_registry(Arc::new(AtomicUsize::new(0)));
    let before = registry.len();
    let err = registry
        .add(
            MethodBuilder::new("add")
                .blocking_handler(|_, _| Ok("shadowed"))
                .build()
                .unwrap(),
        )
        .unwrap_err();
    assert_eq!(err, RegistryError::AlreadyRegistered("add".to_string()));
    assert_eq!(registry.len(), before);

    let dispatcher = JsonRpcDispatcher::new(registry);
    let body =
        dispatcher.dispatch_blocking(r#"{"jsonrpc":"2.0","method":"add","params":[2,2],"id":1}"#, None);
    assert_eq!(body, r#"{"jsonrpc":"2.0","id":1,"result":4}"#);
}

#[tokio::test]
async fn test_transport_adapter_contract() {
    struct HttpLikeRequest {
        body: String,
        user: &'static str,
    }

    impl TransportRequest for HttpLikeRequest {
        fn body(&self) -> &str {
            &self.body
        }

        fn context(&self) -> Option<RequestContext> {
            Some(RequestContext::new().with_metadata("user", json!(self.user)))
        }
    }

    let mut registry = MethodRegistry::new();
    registry
        .add(
            MethodBuilder::new("whoami")
                .takes_context()
                .blocking_handler(|_, context| {
                    context
                        .and_then(|c| c.get("user").cloned())
                        .ok_or_else(|| HandlerError::internal("no user"))
                })
                .build()
                .unwrap(),
        )
        .unwrap();
    let dispatcher = JsonRpcDispatcher::new(registry);

    let request = HttpLikeRequest {
        body: r#"{"jsonrpc":"2.0","method":"whoami","id":1}"#.to_string(),
        user: "bob",
    };
    assert_eq!(
        dispatcher.handle_request(&request).await,
        r#"{"jsonrpc":"2.0","id":1,"result":"bob"}"#
    );

    let message = dispatcher
        .handle_request_structured(&RawRequest::new(r#"{"jsonrpc":"2.0","method":"whoami","id":2}"#))
        .await
        .unwrap();
    assert!(message.is_error());
    assert_eq!(message.id(), Some(&RequestId::from(2)));
    assert_eq!(message.error_code(), Some(-32603));

    let message = dispatcher
        .handle_request_structured(
            &RawRequest::new(r#"{"jsonrpc":"2.0","method":"whoami","id":3}"#)
                .with_context(RequestContext::new().with_metadata("user", json!("carol"))),
        )
        .await;
    assert!(matches!(message, Some(JsonRpcMessage::Response(ref r)) if r.result == json!("carol")));

    assert!(
        dispatcher
            .handle_request_structured(&RawRequest::new(r#"{"jsonrpc":"2.0","method":"whoami"}"#))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_config_from_json() {
    let config: DispatcherConfig =
        serde_json::from_value(json!({"expose_internal_errors": true})).unwrap();
    assert!(config.validate_params);
    assert!(config.expose_internal_errors);

    let mut registry = MethodRegistry::new();
    registry
        .add(
            MethodBuilder::new("boom")
                .blocking_handler(|_, _| -> Result<(), HandlerError> {
                    Err(anyhow::anyhow!("socket closed").context("fetching rates").into())
                })
                .build()
                .unwrap(),
        )
        .unwrap();
    let dispatcher = JsonRpcDispatcher::with_config(registry, config);
    let response = reply(&dispatcher, r#"{"jsonrpc":"2.0","method":"boom","id":1}"#)
        .await
        .unwrap();
    assert_eq!(response["error"]["message"], "Internal Error");
    assert_eq!(response["error"]["data"], "fetching rates: socket closed");
}

#[tokio::test]
async fn test_concurrent_dispatch_shares_one_registry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = JsonRpcDispatcher::new(add_registry(calls.clone()));

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let request =
                    json!({"jsonrpc": "2.0", "method": "add", "params": [i, i], "id": i});
                let body = dispatcher.dispatch(&request.to_string(), None).await;
                let response: Value = serde_json::from_str(&body).unwrap();
                (i, response)
            })
        })
        .collect();

    for task in tasks {
        let (i, response) = task.await.unwrap();
        assert_eq!(response["id"], i);
        assert_eq!(response["result"], i * 2);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 32);
}
