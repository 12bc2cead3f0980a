use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use acestep_client::{poll_job_with, PollState};

fn script(bodies: &[&str]) -> RefCell<VecDeque<String>> {
    RefCell::new(bodies.iter().map(|b| b.to_string()).collect())
}

#[tokio::test]
async fn test_succeeded_terminates_in_one_iteration() {
    let responses = script(&[r#"{"job_id":"abc","status":"succeeded"}"#]);
    let fetches = RefCell::new(0usize);

    let outcome = poll_job_with(
        "abc",
        Duration::ZERO,
        |_id| {
            *fetches.borrow_mut() += 1;
            let body = responses
                .borrow_mut()
                .pop_front()
                .expect("polled past a terminal response");
            async move { Ok(body) }
        },
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, PollState::Succeeded);
    assert_eq!(*fetches.borrow(), 1);
}

#[tokio::test]
async fn test_failed_terminates_in_one_iteration_and_keeps_body() {
    let body = r#"{"job_id":"abc","status":"failed","error":"OOM"}"#;
    let responses = script(&[body]);
    let fetches = RefCell::new(0usize);

    let outcome = poll_job_with(
        "abc",
        Duration::ZERO,
        |_id| {
            *fetches.borrow_mut() += 1;
            let body = responses
                .borrow_mut()
                .pop_front()
                .expect("polled past a terminal response");
            async move { Ok(body) }
        },
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.state,
        PollState::Failed {
            error: "OOM".to_string()
        }
    );
    assert_eq!(outcome.body, body);
    assert_eq!(*fetches.borrow(), 1);
}

#[tokio::test]
async fn test_loop_observes_every_state_until_terminal() {
    let responses = script(&[
        r#"{"status":"queued","queue_position":3}"#,
        r#"{"status":"queued","queue_position":1}"#,
        r#"{"status":"running"}"#,
        r#"{"status":"succeeded","audio_paths":[]}"#,
    ]);
    let observed = RefCell::new(Vec::new());

    let outcome = poll_job_with(
        "abc",
        Duration::ZERO,
        |_id| {
            let body = responses
                .borrow_mut()
                .pop_front()
                .expect("polled past a terminal response");
            async move { Ok(body) }
        },
        |state| observed.borrow_mut().push(state.clone()),
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, PollState::Succeeded);
    assert_eq!(
        *observed.borrow(),
        vec![
            PollState::Queued { position: Some(3) },
            PollState::Queued { position: Some(1) },
            PollState::InProgress {
                status: "running".to_string()
            },
            PollState::Succeeded,
        ]
    );
}

#[tokio::test]
async fn test_loop_does_not_give_up_while_in_flight() {
    // 25 non-terminal observations, mixing queued and unrecognized
    // statuses, before the job finally lands.
    let mut bodies: Vec<String> = (0..25)
        .map(|i| {
            if i % 2 == 0 {
                format!(r#"{{"status":"queued","queue_position":{}}}"#, 25 - i)
            } else {
                r#"{"status":"preprocessing"}"#.to_string()
            }
        })
        .collect();
    bodies.push(r#"{"status":"succeeded"}"#.to_string());

    let responses = RefCell::new(bodies.into_iter().collect::<VecDeque<_>>());
    let fetches = RefCell::new(0usize);

    let outcome = poll_job_with(
        "abc",
        Duration::ZERO,
        |_id| {
            *fetches.borrow_mut() += 1;
            let body = responses
                .borrow_mut()
                .pop_front()
                .expect("polled past a terminal response");
            async move { Ok(body) }
        },
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.state, PollState::Succeeded);
    assert_eq!(*fetches.borrow(), 26);
}

#[tokio::test]
async fn test_fetch_error_propagates() {
    let result = poll_job_with(
        "abc",
        Duration::ZERO,
        |_id| async move { Err(anyhow::anyhow!("connection reset")) },
        |_| {},
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("connection reset"));
}
