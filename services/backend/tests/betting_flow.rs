/// End-to-end tests for the betting and transfer flows
mod common;

use axum::http::StatusCode;
use common::{
    balance_of, bearer, fund, parse_error, place_bet, setup_admin, setup_user, start_round,
    test_server,
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_full_betting_flow() {
    let server = test_server();
    let admin_token = setup_admin(&server).await;
    let (_, player_token) = setup_user(&server, "player@example.test", "player").await;

    // Fund 100.00 through the manual deposit flow
    fund(&server, &admin_token, &player_token, 10_000).await;
    assert_eq!(balance_of(&server, &player_token).await, 10_000);

    let round_id = start_round(&server, &admin_token).await;

    // Stake 10.00
    let (bet_id, balance) = place_bet(&server, &player_token, round_id, 1_000).await;
    assert_eq!(balance, 9_000);

    // Cash out at 2.00x: gross 20.00, commission 1.00, net 19.00
    let (name, value) = bearer(&player_token);
    let response = server
        .post("/bet/cashout")
        .add_header(name, value)
        .json(&json!({ "bet_id": bet_id, "multiplier": 200 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["gross_payout"], json!(2_000));
    assert_eq!(body["commission"], json!(100));
    assert_eq!(body["net_credit"], json!(1_900));
    assert_eq!(body["balance"], json!(10_900));
    assert_eq!(body["bet"]["cashed_out"], json!(true));
    assert_eq!(body["bet"]["cashed_at_multiplier"], json!(200));

    assert_eq!(balance_of(&server, &player_token).await, 10_900);

    // Commission ledger sees exactly the 1.00 skim
    let (name, value) = bearer(&admin_token);
    let response = server
        .get("/admin/commission/report")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let report: Value = response.json();
    assert_eq!(report["total"], json!(100));
    assert_eq!(report["entries"], json!(1));
}

#[tokio::test]
async fn test_round_finish_marks_results() {
    let server = test_server();
    let admin_token = setup_admin(&server).await;
    let (_, winner_token) = setup_user(&server, "winner@example.test", "player").await;
    let (_, loser_token) = setup_user(&server, "loser@example.test", "player").await;

    fund(&server, &admin_token, &winner_token, 5_000).await;
    fund(&server, &admin_token, &loser_token, 5_000).await;

    let round_id = start_round(&server, &admin_token).await;
    let (winner_bet, _) = place_bet(&server, &winner_token, round_id, 1_000).await;
    let (_loser_bet, _) = place_bet(&server, &loser_token, round_id, 1_000).await;

    // Winner cashes out before the crash
    let (name, value) = bearer(&winner_token);
    let response = server
        .post("/bet/cashout")
        .add_header(name, value)
        .json(&json!({ "bet_id": winner_bet, "multiplier": 150 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = bearer(&admin_token);
    let response = server
        .post("/admin/round/finish")
        .add_header(name, value)
        .json(&json!({ "round_id": round_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["processed"], json!(2));
    assert_eq!(body["round"]["finished"], json!(true));

    // Crash point is recorded in hundredths within the curve range
    let crash = body["round"]["crash_multiplier"]
        .as_u64()
        .expect("No crash multiplier");
    assert!((100..=5_750).contains(&crash), "crash out of range: {}", crash);

    // Exactly one bet paid
    let bets = body["bets"].as_array().expect("No bets in response");
    assert_eq!(bets.len(), 2);

    let paid: Vec<bool> = bets
        .iter()
        .map(|b| b["result_paid"].as_bool().expect("result_paid unset"))
        .collect();
    assert_eq!(paid.iter().filter(|p| **p).count(), 1);

    for bet in bets {
        let expected = bet["bet_id"] == json!(winner_bet);
        assert_eq!(bet["result_paid"], json!(expected));
    }
}

#[tokio::test]
async fn test_withdraw_flow() {
    let server = test_server();
    let admin_token = setup_admin(&server).await;
    let (_, player_token) = setup_user(&server, "cashout@example.test", "player").await;

    fund(&server, &admin_token, &player_token, 5_000).await;

    // Funds are reserved at request time
    let (name, value) = bearer(&player_token);
    let response = server
        .post("/withdraw/request")
        .add_header(name, value)
        .json(&json!({
            "amount": 2_000,
            "method": "bank",
            "details": { "account": "PK00-1234" }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["balance"], json!(3_000));
    assert_eq!(body["withdraw"]["status"], json!("pending"));
    let request_id = body["withdraw"]["request_id"]
        .as_str()
        .expect("No request id")
        .to_string();

    assert_eq!(balance_of(&server, &player_token).await, 3_000);

    // Admin sees the pending request
    let (name, value) = bearer(&admin_token);
    let response = server
        .get("/admin/withdraws")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listed: Vec<Value> = response.json();
    assert!(listed
        .iter()
        .any(|w| w["request_id"] == json!(request_id)));

    // Mark paid exactly once
    let (name, value) = bearer(&admin_token);
    let response = server
        .post("/admin/withdraw/mark-paid")
        .add_header(name, value)
        .json(&json!({ "request_id": request_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let paid: Value = response.json();
    assert_eq!(paid["status"], json!("paid"));

    let (name, value) = bearer(&admin_token);
    let response = server
        .post("/admin/withdraw/mark-paid")
        .add_header(name, value)
        .json(&json!({ "request_id": request_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let body: Value = response.json();
    let (code, _, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "CONFLICT_ALREADY_PROCESSED");
    assert_eq!(category, "Conflict");

    // The reserved funds never return
    assert_eq!(balance_of(&server, &player_token).await, 3_000);
}

#[tokio::test]
async fn test_deposit_instructions_carry_reference() {
    let server = test_server();
    let (_, player_token) = setup_user(&server, "ref@example.test", "player").await;

    let (name, value) = bearer(&player_token);
    let response = server
        .post("/deposit/request")
        .add_header(name, value)
        .json(&json!({ "amount": 500, "method": "easypaisa", "note": "first top-up" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let request_id = body["deposit"]["request_id"].as_str().expect("No request id");
    let message = body["message"].as_str().expect("No message");

    assert!(message.contains(request_id), "reference missing: {}", message);
    assert_eq!(body["deposit"]["status"], json!("pending"));
    assert_eq!(body["deposit"]["note"], json!("first top-up"));
}

#[tokio::test]
async fn test_admin_lists_paginate() {
    let server = test_server();
    let admin_token = setup_admin(&server).await;
    let (_, player_token) = setup_user(&server, "pager@example.test", "player").await;

    for i in 0..5 {
        let (name, value) = bearer(&player_token);
        let response = server
            .post("/deposit/request")
            .add_header(name, value)
            .json(&json!({ "amount": 100 + i, "method": "bank" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let (name, value) = bearer(&admin_token);
    let response = server
        .get("/admin/deposits")
        .add_query_param("limit", 2)
        .add_query_param("offset", 1)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 2);

    // Newest first: offset 1 skips the latest request
    assert_eq!(listed[0]["amount"], json!(103));
    assert_eq!(listed[1]["amount"], json!(102));
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = test_server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], json!("healthy"));
    assert!(body.get("timestamp").is_some());

    let response = server.get("/health/detailed").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["components"]["storage"], json!("healthy"));
}
