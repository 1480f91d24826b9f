use serde_json::json;

use crate::common::{TWO_SUM, TestApp, routes};

fn new_question(slug: &str) -> serde_json::Value {
    json!({
        "slug": slug,
        "title": "Reverse Integer",
        "difficulty": "Medium",
        "tags": ["Math"],
        "description": "Reverse the digits of a signed 32-bit integer.",
    })
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn lists_seeded_questions_by_id() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.get_with_token(routes::QUESTIONS, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let questions = res.body.as_array().unwrap();
        assert_eq!(questions.len(), 6);
        assert_eq!(questions[0]["id"], TWO_SUM);
        assert_eq!(questions[0]["slug"], "two-sum");
        assert_eq!(questions[0]["difficulty"], "Easy");
        assert!(questions[0].get("description").is_none());

        let ids: Vec<i64> = questions.iter().map(|q| q["id"].as_i64().unwrap()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn returns_question_detail() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .get_with_token(&routes::question(TWO_SUM), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Two Sum");
        assert!(res.body["description"].as_str().unwrap().len() > 10);
        assert!(res.body["tags"].is_array());
    }

    #[tokio::test]
    async fn missing_question_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.get_with_token(&routes::question(999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::QUESTIONS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod authoring {
    use super::*;

    #[tokio::test]
    async fn creates_question() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(routes::QUESTIONS, &new_question("reverse-integer"), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "reverse-integer");
        assert_eq!(res.body["tags"], json!(["Math"]));

        let listed = app.get_with_token(routes::QUESTIONS, &token).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(routes::QUESTIONS, &new_question("two-sum"), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn rejects_unknown_difficulty() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let mut body = new_question("reverse-integer");
        body["difficulty"] = json!("Nightmare");

        let res = app.post_with_token(routes::QUESTIONS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_malformed_slug() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        for slug in ["", "Upper-Case", "-leading", "has space"] {
            let res = app
                .post_with_token(routes::QUESTIONS, &new_question(slug), &token)
                .await;
            assert_eq!(res.status, 400, "slug {slug:?} accepted");
        }
    }
}
