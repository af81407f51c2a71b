//! X (Twitter) API v2 client with OAuth 1.0a user-context signing.

use crate::config::TwitterConfig;
use crate::error::{Result, SocialError};
use crate::social::SocialFeed;

use anyhow::Context as _;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::Rng as _;
use serde::Deserialize;
use sha1::Sha1;
use std::time::Duration;

type HmacSha1 = Hmac<Sha1>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: Option<CreatedTweet>,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Debug, Clone)]
pub struct TwitterClient {
    http_client: reqwest::Client,
    config: TwitterConfig,
}

impl TwitterClient {
    pub fn new(config: TwitterConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

impl SocialFeed for TwitterClient {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn publish(&self, text: &str) -> Result<()> {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        // JSON bodies are not part of the OAuth 1.0a signature.
        let authorization =
            authorization_header("POST", &self.config.endpoint, &self.config, &nonce, &timestamp, &[])?;

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header("authorization", authorization)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|error| SocialError::Request(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| SocialError::Request(format!("failed to read body: {error}")))?;

        if !status.is_success() {
            return Err(SocialError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body).to_string(),
            }
            .into());
        }

        let tweet_id = serde_json::from_str::<CreateTweetResponse>(&body)
            .ok()
            .and_then(|response| response.data)
            .map(|tweet| tweet.id);
        tracing::debug!(?tweet_id, "tweet created");

        Ok(())
    }
}

/// Build the `Authorization: OAuth ...` header value for one request.
///
/// `extra_params` are query or form parameters that must be covered by the
/// signature alongside the `oauth_*` ones.
fn authorization_header(
    method: &str,
    url: &str,
    credentials: &TwitterConfig,
    nonce: &str,
    timestamp: &str,
    extra_params: &[(&str, &str)],
) -> Result<String> {
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signed_params: Vec<(&str, &str)> = oauth_params
        .iter()
        .chain(extra_params.iter())
        .copied()
        .collect();
    let signature = sign(
        method,
        url,
        &signed_params,
        &credentials.api_secret,
        &credentials.access_token_secret,
    )?;

    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort_unstable();

    let fields = oauth_params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {fields}"))
}

/// HMAC-SHA1 signature over the OAuth 1.0a signature base string.
fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|error| SocialError::Signing(error.to_string()))?;
    mac.update(base_string.as_bytes());

    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(300) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    // Worked example from the X developer documentation.
    const CONSUMER_KEY: &str = "xvz1evFS4wEEPTGEFPHBog";
    const CONSUMER_SECRET: &str = "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw";
    const TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
    const TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
    const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const TIMESTAMP: &str = "1318622958";
    const UPDATE_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";
    const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

    fn credentials(endpoint: &str) -> TwitterConfig {
        TwitterConfig {
            endpoint: endpoint.to_string(),
            api_key: CONSUMER_KEY.into(),
            api_secret: CONSUMER_SECRET.into(),
            access_token: TOKEN.into(),
            access_token_secret: TOKEN_SECRET.into(),
        }
    }

    #[test]
    fn signature_matches_documented_example() {
        let params = [
            ("status", STATUS),
            ("include_entities", "true"),
            ("oauth_consumer_key", CONSUMER_KEY),
            ("oauth_nonce", NONCE),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", TIMESTAMP),
            ("oauth_token", TOKEN),
            ("oauth_version", "1.0"),
        ];

        let signature = sign("post", UPDATE_URL, &params, CONSUMER_SECRET, TOKEN_SECRET)
            .expect("signing should succeed");

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn header_lists_encoded_oauth_fields() {
        let header = authorization_header(
            "POST",
            UPDATE_URL,
            &credentials(UPDATE_URL),
            NONCE,
            TIMESTAMP,
            &[("status", STATUS), ("include_entities", "true")],
        )
        .expect("header should build");

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_token=\"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\""));
        assert!(header.ends_with("oauth_version=\"1.0\""));
        assert!(!header.contains("status"));
    }

    #[test]
    fn nonces_are_alphanumeric_and_fresh() {
        let first = generate_nonce();
        let second = generate_nonce();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn publishes_text_with_signed_request() {
        let router = Router::new().route(
            "/2/tweets",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let authorization = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if !authorization.starts_with("OAuth ")
                    || !authorization.contains("oauth_signature=")
                    || body["text"] != "gm #crypto @everyone"
                {
                    return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
                }
                let text = body["text"].clone();
                (
                    StatusCode::CREATED,
                    Json(serde_json::json!({"data": {"id": "1", "text": text}})),
                )
            }),
        );
        let base_url = serve(router).await;
        let client = TwitterClient::new(credentials(&format!("{base_url}/2/tweets")))
            .expect("client should build");

        client
            .publish("gm #crypto @everyone")
            .await
            .expect("publish should succeed");
    }

    #[tokio::test]
    async fn rejected_posts_surface_status() {
        let router = Router::new().route(
            "/2/tweets",
            post(|| async { (StatusCode::FORBIDDEN, "duplicate content") }),
        );
        let base_url = serve(router).await;
        let client = TwitterClient::new(credentials(&format!("{base_url}/2/tweets")))
            .expect("client should build");

        let error = client.publish("gm").await.expect_err("must fail");

        assert!(matches!(
            error,
            crate::Error::Social(SocialError::Rejected { status: 403, .. })
        ));
    }
}
