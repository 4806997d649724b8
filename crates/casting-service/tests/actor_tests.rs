//! Actor endpoint integration tests.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use casting_test_utils::*;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Send `request`, returning the status and the JSON body if there is one.
async fn send(request: reqwest::RequestBuilder) -> Result<(StatusCode, Option<Value>)> {
    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes)?)
    };
    Ok((status, body))
}

async fn create_actor(server: &TestCastingServer, token: &str, body: Value) -> Result<(StatusCode, Value)> {
    let client = Client::new();
    let request = client
        .post(server.api_url("/actors"))
        .bearer_auth(token)
        .json(&body);
    let (status, body) = send(request).await?;
    Ok((status, body.unwrap_or(Value::Null)))
}

async fn actor_count(server: &TestCastingServer) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actors")
        .fetch_one(server.pool())
        .await?;
    Ok(count)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_actor_renders_date_of_birth(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let token = server.token(&TestClaims::casting_director());

    let (status, actor) = create_actor(
        &server,
        &token,
        json!({"name": "Jane Doe", "dob": "1990-03-04", "gender": "female"}),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(actor["name"], "Jane Doe");
    assert_eq!(actor["date of birth"], "1990-03-04");
    assert_eq!(actor["gender"], "female");
    assert!(actor.get("dob").is_none());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_actor_missing_field(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let token = server.token(&TestClaims::casting_director());

    let (status, envelope) = create_actor(
        &server,
        &token,
        json!({"name": "No Gender", "dob": "1990-03-04"}),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["message"], "Actor name, dob and gender is required");
    assert_eq!(actor_count(&server).await?, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_actor_gender_too_long(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let token = server.token(&TestClaims::casting_director());

    let (status, envelope) = create_actor(
        &server,
        &token,
        json!({"name": "Verbose", "dob": "1990-03-04", "gender": "not-specified"}),
    )
    .await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(envelope["code"], "unprocessable");
    assert_eq!(actor_count(&server).await?, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_executive_producer_cannot_write_actors(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    // Holds create:actors but not the Casting Director role
    let token = server.token(&TestClaims::executive_producer());

    let (status, envelope) = create_actor(
        &server,
        &token,
        json!({"name": "Blocked", "dob": "1990-03-04", "gender": "male"}),
    )
    .await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(envelope["message"], "Permission not found.");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_actor_lifecycle(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let director = server.token(&TestClaims::casting_director());
    let assistant = server.token(&TestClaims::casting_assistant());
    let client = Client::new();

    let (_, first) = create_actor(
        &server,
        &director,
        json!({"name": "First", "dob": "1980-01-01", "gender": "male"}),
    )
    .await?;
    let (_, second) = create_actor(
        &server,
        &director,
        json!({"name": "Second", "dob": "1985-05-05", "gender": "female"}),
    )
    .await?;
    let id = first["id"].to_string();

    // Assistant lists in id order
    let (status, list) = send(
        client.get(server.api_url("/actors")).bearer_auth(&assistant),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, Some(json!([first.clone(), second])));

    // Partial update keeps untouched fields
    let (status, updated) = send(
        client
            .patch(server.api_url(&format!("/actors/{id}")))
            .bearer_auth(&director)
            .json(&json!({"dob": "1981-02-02"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let updated = updated.unwrap();
    assert_eq!(updated["success"], true);
    assert_eq!(updated["actor"]["name"], "First");
    assert_eq!(updated["actor"]["date of birth"], "1981-02-02");
    assert_eq!(updated["actor"]["gender"], "male");

    // Null field is refused
    let (status, _) = send(
        client
            .patch(server.api_url(&format!("/actors/{id}")))
            .bearer_auth(&director)
            .json(&json!({"gender": null})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Delete twice: 204 then 404
    let delete = || {
        client
            .delete(server.api_url(&format!("/actors/{id}")))
            .bearer_auth(&director)
    };
    let (status, body) = send(delete()).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());
    let (status, _) = send(delete()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        client
            .get(server.api_url(&format!("/actors/{id}")))
            .bearer_auth(&assistant),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(actor_count(&server).await?, 1);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_patch_unknown_actor(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let director = server.token(&TestClaims::casting_director());
    let client = Client::new();

    let (status, body) = send(
        client
            .patch(server.api_url("/actors/424242"))
            .bearer_auth(&director)
            .json(&json!({"name": "Nobody"})),
    )
    .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["message"], "Resource not Found");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_patch_unknown_actor_with_bad_body_is_not_found(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let director = server.token(&TestClaims::casting_director());
    let client = Client::new();

    for body in [r#"{"gender": null}"#, r#"{"dob": "31/12/1990"}"#, "{"] {
        let (status, envelope) = send(
            client
                .patch(server.api_url("/actors/424242"))
                .bearer_auth(&director)
                .header("Content-Type", "application/json")
                .body(body),
        )
        .await?;

        assert_eq!(status, StatusCode::NOT_FOUND, "body {body}");
        assert_eq!(envelope.unwrap()["message"], "Resource not Found");
    }
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_actor_non_integer_id(pool: PgPool) -> Result<()> {
    let server = TestCastingServer::spawn(pool).await?;
    let assistant = server.token(&TestClaims::casting_assistant());
    let client = Client::new();

    let (status, _) = send(
        client
            .get(server.api_url("/actors/one"))
            .bearer_auth(&assistant),
    )
    .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
