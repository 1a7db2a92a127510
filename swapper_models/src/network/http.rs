use crate::error::{Error, ModelResult};
use error_stack::{ResultExt, report};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::value::Value;
use tracing::warn;

/// Renders a JSON object as a query string with keys sorted alphabetically.
///
/// `null` entries are skipped so optional request fields can be passed through
/// as-is. Nested values are rendered with their JSON representation.
///
/// # Errors
///
/// Returns `Error::ParseError` when `value` is not a JSON object.
pub fn value_to_sorted_querystring(value: &Value) -> ModelResult<String> {
    let Value::Object(map) = value else {
        return Err(report!(Error::ParseError)
            .attach_printable(format!("Query must be a JSON object, got: {value}")));
    };

    let mut pairs: Vec<(&String, String)> = map
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k, rendered)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(b.0));
    Ok(pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<String>>()
        .join("&"))
}

/// Joins `base`, `path` and an optional query object into a request URL
pub fn build_url(base: &str, path: &str, query: Option<&Value>) -> ModelResult<String> {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match query {
        Some(query) => {
            let query = value_to_sorted_querystring(query)?;
            if query.is_empty() {
                Ok(format!("{base}/{path}"))
            } else {
                Ok(format!("{base}/{path}?{query}"))
            }
        }
        None => Ok(format!("{base}/{path}")),
    }
}

/// Maps a `reqwest` send error onto the model taxonomy
pub fn classify_reqwest_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::ReqwestError(err.to_string())
    }
}

/// Deserializes a successful response body, or classifies the failure.
///
/// 4xx answers become `Error::ClientError` carrying the body, because quote
/// APIs use them to explain why they cannot quote. 5xx answers become
/// `Error::ServerError`.
pub async fn handle_reqwest_response<T: DeserializeOwned>(response: Response) -> ModelResult<T> {
    let status = response.status();

    if status.is_success() {
        let body = response
            .bytes()
            .await
            .map_err(|e| report!(classify_reqwest_error(&e)))?;
        return serde_json::from_slice(&body).change_context(Error::SerdeDeserialize(format!(
            "Failed to deserialize body: {}",
            String::from_utf8_lossy(&body)
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| report!(classify_reqwest_error(&e)))?;

    warn!(status = status.as_u16(), body = %body, "Non success response");

    Err(report!(status_error(status, body)))
}

fn status_error(status: StatusCode, body: String) -> Error {
    if status.is_server_error() {
        Error::ServerError {
            status: status.as_u16(),
            body,
        }
    } else {
        Error::ClientError {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_value_to_sorted_querystring() {
        let value = json!({
            "to_asset": "ETH.ETH",
            "amount": 71,
            "from_asset": "ETH.FOX",
            "affiliate": null,
            "streaming": false,
        });

        let result = value_to_sorted_querystring(&value).unwrap();
        assert_eq!(
            result,
            "amount=71&from_asset=ETH.FOX&streaming=false&to_asset=ETH.ETH"
        );
    }

    #[test]
    fn test_value_to_sorted_querystring_rejects_non_objects() {
        assert!(value_to_sorted_querystring(&json!(["a"])).is_err());
        assert!(value_to_sorted_querystring(&json!("a")).is_err());
        assert!(value_to_sorted_querystring(&json!(42)).is_err());
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            build_url("http://node/", "/lcd/thorchain/pools", None).unwrap(),
            "http://node/lcd/thorchain/pools"
        );
        assert_eq!(
            build_url("http://node", "quote", Some(&json!({"b": 2, "a": "x"}))).unwrap(),
            "http://node/quote?a=x&b=2"
        );
        assert_eq!(
            build_url("http://node", "quote", Some(&json!({"a": null}))).unwrap(),
            "http://node/quote"
        );
    }

    #[derive(Debug, Deserialize)]
    struct Pong {
        pong: bool,
    }

    #[tokio::test]
    async fn test_handle_reqwest_response_classifies_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": true})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no route"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();

        let ok = client
            .get(format!("{}/ok", server.uri()))
            .send()
            .await
            .unwrap();
        let pong: Pong = handle_reqwest_response(ok).await.unwrap();
        assert!(pong.pong);

        let bad = client
            .get(format!("{}/bad", server.uri()))
            .send()
            .await
            .unwrap();
        let err = handle_reqwest_response::<Pong>(bad).await.unwrap_err();
        assert_eq!(
            err.current_context(),
            &Error::ClientError {
                status: 400,
                body: "no route".to_string()
            }
        );

        let down = client
            .get(format!("{}/down", server.uri()))
            .send()
            .await
            .unwrap();
        let err = handle_reqwest_response::<Pong>(down).await.unwrap_err();
        assert!(err.current_context().is_transport());
    }
}
