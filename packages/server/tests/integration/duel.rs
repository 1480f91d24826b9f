use chrono::{DateTime, Utc};
use serde_json::json;

use crate::common::{ADD_TWO_NUMBERS, TWO_SUM, TestApp, routes};

fn timestamp(value: &serde_json::Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().expect("timestamp should be a string"))
        .expect("timestamp should be RFC 3339")
        .with_timezone(&Utc)
}

async fn sweep_and_check(app: &TestApp, expected: usize) {
    let closed =
        arena_server::duel::expiry::sweep_expired_duels(&app.db, &app.config.duel, Utc::now())
            .await
            .expect("sweep failed");
    assert_eq!(closed, expected);
}

mod duel_creation {
    use super::*;

    #[tokio::test]
    async fn creates_pending_duel_with_creator_as_only_participant() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let alice = app.user_id(&token).await;

        let res = app.create_duel(&token, "Test", true).await;

        assert_eq!(res.body["status"], "pending");
        assert_eq!(res.body["title"], "Test");
        assert_eq!(res.body["time_limit"], 30);
        assert_eq!(res.body["is_public"], true);
        assert_eq!(res.body["created_by"]["id"], alice);
        assert_eq!(res.body["created_by"]["username"], "alice");
        assert_eq!(res.body["question"]["id"], TWO_SUM);
        assert_eq!(res.body["question"]["title"], "Two Sum");
        assert!(res.body["opponent"].is_null());
        assert!(res.body["start_time"].is_null());
        assert!(res.body["end_time"].is_null());

        let participants = res.body["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0]["user"]["id"], alice);
        assert_eq!(participants[0]["slot"], 1);
        assert_eq!(participants[0]["result"], "pending");

        let code = res.body["invite_code"].as_str().unwrap();
        assert_eq!(code.len(), 8);
    }

    #[tokio::test]
    async fn invite_codes_are_unique() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let a = app.create_duel(&token, "One", true).await;
        let b = app.create_duel(&token, "Two", true).await;

        assert_ne!(a.body["invite_code"], b.body["invite_code"]);
    }

    #[tokio::test]
    async fn time_limit_defaults_to_thirty_minutes() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::DUELS,
                &json!({"title": "Defaults", "question_id": TWO_SUM}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["time_limit"], 30);
        assert_eq!(res.body["is_public"], true);
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::DUELS,
                &json!({"title": "Test", "question_id": 9999}),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::DUELS,
                &json!({"title": "   ", "question_id": TWO_SUM}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn out_of_range_time_limit_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        for time_limit in [0, 4, 121] {
            let res = app
                .post_with_token(
                    routes::DUELS,
                    &json!({"title": "Test", "question_id": TWO_SUM, "time_limit": time_limit}),
                    &token,
                )
                .await;
            assert_eq!(res.status, 400, "time_limit {time_limit} accepted");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::DUELS,
                &json!({"title": "Test", "question_id": TWO_SUM}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod joining {
    use super::*;

    #[tokio::test]
    async fn second_participant_activates_duel_and_starts_clock() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let bob_id = app.user_id(&bob).await;
        let id = app.create_duel(&alice, "Test", true).await.id();

        let res = app
            .post_with_token(&routes::duel_join(id), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "active");
        assert_eq!(res.body["opponent"]["id"], bob_id);
        let participants = res.body["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[1]["user"]["username"], "bob");
        assert_eq!(participants[1]["slot"], 2);

        let start = timestamp(&res.body["start_time"]);
        let end = timestamp(&res.body["end_time"]);
        assert_eq!(end - start, chrono::Duration::minutes(30));
    }

    #[tokio::test]
    async fn third_user_cannot_join_an_active_duel() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        let id = app.create_active_duel(&alice, &bob).await;

        let res = app
            .post_with_token(&routes::duel_join(id), &json!({}), &carol)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");

        let duel = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(duel.body["participants"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn creator_cannot_join_own_duel() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_duel(&alice, "Test", true).await.id();

        let res = app
            .post_with_token(&routes::duel_join(id), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "ALREADY_JOINED");
    }

    #[tokio::test]
    async fn unknown_duel_is_not_found() {
        let app = TestApp::spawn().await;
        let bob = app.create_authenticated_user("bob").await;

        let res = app
            .post_with_token(&routes::duel_join(4242), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn cancelled_duel_cannot_be_joined() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_duel(&alice, "Test", true).await.id();
        let cancel = app
            .put_with_token(&routes::duel_cancel(id), &json!({}), &alice)
            .await;
        assert_eq!(cancel.status, 200, "{}", cancel.text);

        let res = app
            .post_with_token(&routes::duel_join(id), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn concurrent_joins_admit_exactly_one_opponent() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        let id = app.create_duel(&alice, "Race", true).await.id();

        let path = routes::duel_join(id);
        let body = json!({});
        let (b, c) = tokio::join!(
            app.post_with_token(&path, &body, &bob),
            app.post_with_token(&path, &body, &carol),
        );

        let mut statuses = [b.status, c.status];
        statuses.sort_unstable();
        assert_eq!(statuses, [200, 400], "bob: {}, carol: {}", b.text, c.text);
        let loser = if b.status == 400 { &b } else { &c };
        assert_eq!(loser.body["code"], "INVALID_STATE");

        let duel = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(duel.body["status"], "active");
        assert_eq!(duel.body["participants"].as_array().unwrap().len(), 2);
    }
}

mod invite_codes {
    use super::*;

    #[tokio::test]
    async fn outsider_can_join_private_duel_by_invite_code() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let dave = app.create_authenticated_user("dave").await;
        let created = app.create_duel(&alice, "Private", false).await;
        let id = created.id();
        let code = created.body["invite_code"].as_str().unwrap().to_string();

        let peek = app.get_with_token(&routes::duel(id), &dave).await;
        assert_eq!(peek.status, 403);
        assert_eq!(peek.body["code"], "PERMISSION_DENIED");

        let res = app
            .post_with_token(&routes::duel_invite(&code), &json!({}), &dave)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "active");
        assert_eq!(res.body["id"], id);

        let after = app.get_with_token(&routes::duel(id), &dave).await;
        assert_eq!(after.status, 200);
        assert_eq!(after.body["invite_code"], code.as_str());
    }

    #[tokio::test]
    async fn private_duel_lookup_by_invite_code_requires_membership() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let dave = app.create_authenticated_user("dave").await;
        let created = app.create_duel(&alice, "Private", false).await;
        let code = created.body["invite_code"].as_str().unwrap().to_string();

        let outsider = app.get_with_token(&routes::duel_invite(&code), &dave).await;
        assert_eq!(outsider.status, 403);

        let creator = app.get_with_token(&routes::duel_invite(&code), &alice).await;
        assert_eq!(creator.status, 200);
        assert_eq!(creator.body["id"], created.id());
    }

    #[tokio::test]
    async fn invite_join_follows_capacity_rules() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let dave = app.create_authenticated_user("dave").await;
        let created = app.create_duel(&alice, "Private", false).await;
        let code = created.body["invite_code"].as_str().unwrap().to_string();

        let first = app
            .post_with_token(&routes::duel_invite(&code), &json!({}), &bob)
            .await;
        assert_eq!(first.status, 200);

        let again = app
            .post_with_token(&routes::duel_invite(&code), &json!({}), &bob)
            .await;
        assert_eq!(again.status, 400);
        assert_eq!(again.body["code"], "INVALID_STATE");

        let late = app
            .post_with_token(&routes::duel_invite(&code), &json!({}), &dave)
            .await;
        assert_eq!(late.status, 400);
        assert_eq!(late.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn unknown_invite_code_is_not_found() {
        let app = TestApp::spawn().await;
        let bob = app.create_authenticated_user("bob").await;

        let res = app
            .post_with_token(&routes::duel_invite("NOPE2345"), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn invite_code_is_hidden_from_outsiders_on_public_duels() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let dave = app.create_authenticated_user("dave").await;
        let id = app.create_duel(&alice, "Public", true).await.id();

        let res = app.get_with_token(&routes::duel(id), &dave).await;

        assert_eq!(res.status, 200);
        assert!(res.body["invite_code"].is_null());
    }
}

mod submitting {
    use super::*;

    #[tokio::test]
    async fn faster_accepted_solution_wins() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = app.user_id(&alice).await;
        let id = app.create_active_duel(&alice, &bob).await;

        let first = app.submit_to_duel(&alice, id, "solve() time=100").await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["status"], "active");
        assert_eq!(first.body["participants"][0]["result"], "success");
        assert_eq!(first.body["participants"][0]["execution_time"], 100);
        assert!(first.body["participants"][0]["completed_at"].is_string());

        let second = app.submit_to_duel(&bob, id, "solve() time=150").await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["status"], "completed");
        assert_eq!(second.body["winner_id"], alice_id);
        assert_eq!(second.body["outcome"], "loss");

        let alice_view = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(alice_view.body["outcome"], "win");
    }

    #[tokio::test]
    async fn accepted_solution_beats_faster_wrong_answer() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let bob_id = app.user_id(&bob).await;
        let id = app.create_active_duel(&alice, &bob).await;

        app.submit_to_duel(&alice, id, "WRONG time=5").await;
        let res = app.submit_to_duel(&bob, id, "solve() time=500").await;

        assert_eq!(res.body["status"], "completed");
        assert_eq!(res.body["winner_id"], bob_id);
        assert_eq!(res.body["participants"][0]["result"], "failed");
    }

    #[tokio::test]
    async fn equal_runtimes_are_a_draw() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;

        app.submit_to_duel(&alice, id, "solve() time=120").await;
        let res = app.submit_to_duel(&bob, id, "solve() time=120").await;

        assert_eq!(res.body["status"], "completed");
        assert!(res.body["winner_id"].is_null());
        assert_eq!(res.body["outcome"], "draw");
    }

    #[tokio::test]
    async fn both_failing_is_a_draw() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;

        app.submit_to_duel(&alice, id, "WRONG").await;
        let res = app.submit_to_duel(&bob, id, "CRASH").await;

        assert_eq!(res.body["status"], "completed");
        assert!(res.body["winner_id"].is_null());
    }

    #[tokio::test]
    async fn resubmission_is_rejected_and_keeps_first_result() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;

        let first = app.submit_to_duel(&alice, id, "WRONG time=80").await;
        assert_eq!(first.status, 200);

        let again = app.submit_to_duel(&alice, id, "solve() time=10").await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "ALREADY_SUBMITTED");

        let duel = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(duel.body["participants"][0]["result"], "failed");
        assert_eq!(duel.body["participants"][0]["execution_time"], 80);
        assert_eq!(duel.body["status"], "active");
    }

    #[tokio::test]
    async fn pending_duel_does_not_accept_solutions() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_duel(&alice, "Alone", true).await.id();

        let res = app.submit_to_duel(&alice, id, "solve()").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn completed_duel_does_not_accept_solutions() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;
        app.expire_duel_clock(id, chrono::Duration::hours(1)).await;
        sweep_and_check(&app, 1).await;

        let res = app.submit_to_duel(&bob, id, "solve()").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn cancelled_duel_does_not_accept_solutions() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_duel(&alice, "Withdrawn", true).await.id();
        app.put_with_token(&routes::duel_cancel(id), &json!({}), &alice)
            .await;

        let res = app.submit_to_duel(&alice, id, "solve()").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn simultaneous_submissions_both_count() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = app.user_id(&alice).await;
        let id = app.create_active_duel(&alice, &bob).await;
        let alices = app.create_submission(&alice, TWO_SUM, "solve() time=30").await;
        let bobs = app.create_submission(&bob, TWO_SUM, "solve() time=60").await;

        let path = routes::duel_submit(id);
        let alice_body = json!({"submission_id": alices});
        let bob_body = json!({"submission_id": bobs});
        let (a, b) = tokio::join!(
            app.post_with_token(&path, &alice_body, &alice),
            app.post_with_token(&path, &bob_body, &bob),
        );

        assert_eq!(a.status, 200, "{}", a.text);
        assert_eq!(b.status, 200, "{}", b.text);

        let duel = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(duel.body["status"], "completed");
        assert_eq!(duel.body["participants"][0]["result"], "success");
        assert_eq!(duel.body["participants"][1]["result"], "success");
        assert_eq!(duel.body["winner_id"], alice_id);
    }

    #[tokio::test]
    async fn non_participant_cannot_submit() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        let id = app.create_active_duel(&alice, &bob).await;

        let res = app.submit_to_duel(&carol, id, "solve()").await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn cannot_submit_someone_elses_submission() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;
        let bobs = app.create_submission(&bob, TWO_SUM, "solve()").await;

        let res = app
            .post_with_token(
                &routes::duel_submit(id),
                &json!({"submission_id": bobs}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn submission_for_another_question_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;
        let other = app
            .create_submission(&alice, ADD_TWO_NUMBERS, "solve()")
            .await;

        let res = app
            .post_with_token(
                &routes::duel_submit(id),
                &json!({"submission_id": other}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_submission_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;

        let res = app
            .post_with_token(
                &routes::duel_submit(id),
                &json!({"submission_id": 777}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn late_submission_is_recorded_as_timeout() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = app.user_id(&alice).await;
        let id = app.create_active_duel(&alice, &bob).await;

        app.submit_to_duel(&alice, id, "solve() time=900").await;
        app.expire_duel_clock(id, chrono::Duration::seconds(5)).await;
        let res = app.submit_to_duel(&bob, id, "solve() time=1").await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "completed");
        assert_eq!(res.body["participants"][1]["result"], "timeout");
        assert_eq!(res.body["winner_id"], alice_id);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn creator_can_cancel_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_duel(&alice, "Test", true).await.id();

        let res = app
            .put_with_token(&routes::duel_cancel(id), &json!({}), &alice)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Duel cancelled successfully");
        assert_eq!(res.body["duel"]["status"], "cancelled");
        assert_eq!(res.body["duel"]["participants"].as_array().unwrap().len(), 1);

        let again = app
            .put_with_token(&routes::duel_cancel(id), &json!({}), &alice)
            .await;
        assert_eq!(again.status, 400);
        assert_eq!(again.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn only_creator_can_cancel() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_duel(&alice, "Test", true).await.id();

        let res = app
            .put_with_token(&routes::duel_cancel(id), &json!({}), &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn completed_duel_cannot_be_cancelled() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;
        app.submit_to_duel(&alice, id, "solve()").await;
        app.submit_to_duel(&bob, id, "solve()").await;

        let res = app
            .put_with_token(&routes::duel_cancel(id), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
        let duel = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(duel.body["status"], "completed");
    }

    #[tokio::test]
    async fn active_duel_cannot_be_cancelled() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;

        let res = app
            .put_with_token(&routes::duel_cancel(id), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }
}

mod listing {
    use super::*;

    fn ids(body: &serde_json::Value) -> Vec<i64> {
        body.as_array()
            .expect("list response should be an array")
            .iter()
            .map(|d| d["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn public_listing_shows_open_public_duels_newest_first() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;

        let pending = app.create_duel(&alice, "Pending", true).await.id();
        let private = app.create_duel(&alice, "Private", false).await.id();
        let cancelled = app.create_duel(&alice, "Cancelled", true).await.id();
        app.put_with_token(&routes::duel_cancel(cancelled), &json!({}), &alice)
            .await;
        let active = app.create_active_duel(&alice, &bob).await;
        let completed = app.create_active_duel(&alice, &bob).await;
        app.submit_to_duel(&alice, completed, "solve()").await;
        app.submit_to_duel(&bob, completed, "solve()").await;

        let res = app.get_with_token(routes::PUBLIC_DUELS, &bob).await;

        assert_eq!(res.status, 200);
        assert_eq!(ids(&res.body), vec![active as i64, pending as i64]);
        assert!(!ids(&res.body).contains(&(private as i64)));
    }

    #[tokio::test]
    async fn my_duels_lists_created_and_joined_duels() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;

        let joined = app.create_active_duel(&alice, &bob).await;
        let created = app.create_duel(&bob, "Bob's", false).await.id();
        app.create_duel(&carol, "Carol's", true).await;

        let res = app.get_with_token(routes::MY_DUELS, &bob).await;

        assert_eq!(res.status, 200);
        assert_eq!(ids(&res.body), vec![created as i64, joined as i64]);
    }

    #[tokio::test]
    async fn stats_count_outcomes() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;

        let won = app.create_active_duel(&alice, &bob).await;
        app.submit_to_duel(&alice, won, "solve() time=10").await;
        app.submit_to_duel(&bob, won, "solve() time=20").await;

        let lost = app.create_active_duel(&alice, &bob).await;
        app.submit_to_duel(&alice, lost, "WRONG").await;
        app.submit_to_duel(&bob, lost, "solve()").await;

        let drawn = app.create_active_duel(&alice, &bob).await;
        app.submit_to_duel(&alice, drawn, "solve() time=7").await;
        app.submit_to_duel(&bob, drawn, "solve() time=7").await;

        app.create_duel(&alice, "Open", true).await;

        let res = app.get_with_token(routes::MY_DUEL_STATS, &alice).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body,
            json!({"total": 4, "completed": 3, "won": 1, "lost": 1, "drawn": 1})
        );

        let bobs = app.get_with_token(routes::MY_DUEL_STATS, &bob).await;
        assert_eq!(bobs.body["won"], 1);
        assert_eq!(bobs.body["lost"], 1);
        assert_eq!(bobs.body["total"], 3);
    }
}

mod expiry {
    use super::*;
    use arena_server::duel::expiry::sweep_expired_duels;

    #[tokio::test]
    async fn sweep_completes_overdue_duel_and_times_out_missing_submitter() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = app.user_id(&alice).await;
        let id = app.create_active_duel(&alice, &bob).await;
        app.submit_to_duel(&alice, id, "solve()").await;
        app.expire_duel_clock(id, chrono::Duration::minutes(5)).await;

        let closed = sweep_expired_duels(&app.db, &app.config.duel, Utc::now())
            .await
            .unwrap();
        assert_eq!(closed, 1);

        let res = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(res.body["status"], "completed");
        assert_eq!(res.body["participants"][1]["result"], "timeout");
        assert!(res.body["participants"][1]["completed_at"].is_null());
        assert_eq!(res.body["winner_id"], alice_id);

        let late = app.submit_to_duel(&bob, id, "solve()").await;
        assert_eq!(late.status, 400);
        assert_eq!(late.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn sweep_respects_grace_period() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;
        app.expire_duel_clock(id, chrono::Duration::seconds(10)).await;

        let closed = sweep_expired_duels(&app.db, &app.config.duel, Utc::now())
            .await
            .unwrap();

        assert_eq!(closed, 0);
        let res = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(res.body["status"], "active");
    }

    #[tokio::test]
    async fn sweep_leaves_pending_duels_alone() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_duel(&alice, "Waiting", true).await.id();

        let later = Utc::now() + chrono::Duration::days(1);
        let closed = sweep_expired_duels(&app.db, &app.config.duel, later)
            .await
            .unwrap();

        assert_eq!(closed, 0);
        let res = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(res.body["status"], "pending");
    }

    #[tokio::test]
    async fn nobody_submitting_is_a_draw() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_active_duel(&alice, &bob).await;
        app.expire_duel_clock(id, chrono::Duration::hours(1)).await;

        sweep_expired_duels(&app.db, &app.config.duel, Utc::now())
            .await
            .unwrap();

        let res = app.get_with_token(&routes::duel(id), &alice).await;
        assert_eq!(res.body["status"], "completed");
        assert!(res.body["winner_id"].is_null());
        assert_eq!(res.body["outcome"], "draw");
    }
}
