//! API integration tests
//!
//! Run against a live server with seeded data (one active borrower with id 1
//! and one book with id 1 that has an available copy):
//! cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn issue_one_book(client: &Client, borrower_id: i32, book_id: i32) -> Value {
    let due_date = chrono::Utc::now() + chrono::Duration::days(7);
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("x-staff-id", "1")
        .json(&json!({
            "borrower_id": borrower_id,
            "book_ids": [book_id],
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send issue request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse issue response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_issue_requires_books() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "borrower_id": 1,
            "book_ids": [],
            "due_date": chrono::Utc::now().to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_issue_rejects_past_due_date() {
    let client = Client::new();
    let yesterday = chrono::Utc::now() - chrono::Duration::days(1);

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "borrower_id": 1,
            "book_ids": [1],
            "due_date": yesterday.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Due date cannot be earlier than today"));
}

#[tokio::test]
#[ignore]
async fn test_issue_unknown_borrower() {
    let client = Client::new();
    let due_date = chrono::Utc::now() + chrono::Duration::days(7);

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "borrower_id": 999_999,
            "book_ids": [1],
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_issue_duplicate_book_rejected() {
    let client = Client::new();

    let issued = issue_one_book(&client, 1, 1).await;
    let loan_id = issued["issued"][0]["loan_id"].as_i64().unwrap();

    // A second copy of the same book must be refused regardless of capacity
    let due_date = chrono::Utc::now() + chrono::Duration::days(7);
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "borrower_id": 1,
            "book_ids": [1],
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);

    // Clean up
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_double_return_conflicts() {
    let client = Client::new();

    let issued = issue_one_book(&client, 1, 1).await;
    let loan_id = issued["issued"][0]["loan_id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "Completed");
    assert_eq!(body["loan"]["copy_status"], "Available");

    // Returning again must conflict and leave the copy untouched
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send second return request");
    assert_eq!(response.status(), 409);

    let response = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to fetch loan");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["copy_status"], "Available");
}

#[tokio::test]
#[ignore]
async fn test_renew_extends_due_date() {
    let client = Client::new();

    let issued = issue_one_book(&client, 1, 1).await;
    let loan_id = issued["issued"][0]["loan_id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/loans/{}/renew", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send renew request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "Active");

    // Clean up
    client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
}

#[tokio::test]
#[ignore]
async fn test_mark_damaged_charges_flat_penalty() {
    let client = Client::new();

    let issued = issue_one_book(&client, 1, 1).await;
    let loan_id = issued["issued"][0]["loan_id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/loans/{}/damaged", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send mark-damaged request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "Damaged");
    assert_eq!(body["loan"]["copy_status"], "Damaged");
    assert_eq!(body["loan"]["total_penalties"], "300.00");

    // Settling releases nothing: the copy stays Damaged until restored
    let response = client
        .post(format!("{}/loans/{}/payments", BASE_URL, loan_id))
        .json(&json!({ "or_number": "OR-TEST-0001" }))
        .send()
        .await
        .expect("Failed to send settle request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to fetch loan");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "Completed");
    assert_eq!(body["copy_status"], "Damaged");
    assert_eq!(body["payment_status"], "Fully Paid");
}

#[tokio::test]
#[ignore]
async fn test_mark_lost_without_amount_requires_manual_entry() {
    let client = Client::new();

    let issued = issue_one_book(&client, 1, 1).await;
    let loan_id = issued["issued"][0]["loan_id"].as_i64().unwrap();

    // With the market-price lookup disabled, a bare mark-lost must ask for a
    // manual amount and leave the loan unchanged... then succeed with one.
    let response = client
        .post(format!("{}/loans/{}/lost", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send mark-lost request");
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/loans/{}/lost", BASE_URL, loan_id))
        .json(&json!({ "amount": "750.00" }))
        .send()
        .await
        .expect("Failed to send mark-lost request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "Lost");
    assert_eq!(body["loan"]["copy_status"], "Lost");

    // Clean up via settlement; the copy must remain Lost
    client
        .post(format!("{}/loans/{}/payments", BASE_URL, loan_id))
        .json(&json!({ "or_number": "OR-TEST-0002" }))
        .send()
        .await
        .expect("Failed to send settle request");
}

#[tokio::test]
#[ignore]
async fn test_list_loans() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_list_overdues() {
    let client = Client::new();

    let response = client
        .get(format!("{}/overdues?min_days=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_lending_stats() {
    let client = Client::new();

    let response = client
        .get(format!("{}/stats/lending", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["active_loans"].is_number());
    assert!(body["overdue_loans"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_reminder_for_loan_without_overdue_record() {
    let client = Client::new();

    let issued = issue_one_book(&client, 1, 1).await;
    let loan_id = issued["issued"][0]["loan_id"].as_i64().unwrap();

    // The loan is not overdue, so there is nothing to remind about
    let response = client
        .post(format!("{}/overdues/{}/remind", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send reminder request");
    assert_eq!(response.status(), 404);

    // Clean up
    client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
}
