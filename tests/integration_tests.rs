
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::*;
use tryon_rs::*;

// --- Queue provider ---

#[tokio::test]
async fn test_queue_job_completes_after_pending_polls() {
    let transport = MockTransport::new()
        .queued()
        .status("IN_QUEUE")
        .status("IN_QUEUE")
        .status("IN_PROGRESS")
        .status("COMPLETED")
        .result_reply(200, json!({"images": [{"url": "https://cdn.test/out.jpeg"}]}));
    let sleeper = RecordingSleeper::default();
    let client = client(test_config(60), transport, sleeper.clone());

    let result = client.execute(&request(Provider::Queue)).await.unwrap();

    assert_eq!(result.image_url, "https://cdn.test/out.jpeg");
    assert_eq!(result.provider_used, Provider::Queue);

    let transport = client.transport();
    assert_eq!(transport.status_polls(), 4);
    assert_eq!(transport.result_fetches(), 1);
    assert_eq!(sleeper.count(), 3);
    assert!(sleeper
        .sleeps
        .lock()
        .unwrap()
        .iter()
        .all(|d| *d == Duration::from_secs(5)));
}

#[tokio::test]
async fn test_queue_call_sequence_and_payload() {
    let transport = MockTransport::new()
        .queued()
        .status("COMPLETED")
        .result_reply(200, json!({"images": [{"url": "X"}]}));
    let client = client(test_config(10), transport, RecordingSleeper::default());
    let req = request(Provider::Queue)
        .gender(Gender::Male)
        .garment_category(GarmentCategory::Bottom);

    client.execute(&req).await.unwrap();

    let calls = client.transport().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].url, QUEUE_ENDPOINT);
    assert_eq!(calls[1].url, format!("{}/requests/req-1/status?logs=1", QUEUE_ENDPOINT));
    assert_eq!(calls[2].url, format!("{}/requests/req-1", QUEUE_ENDPOINT));
    assert!(calls.iter().all(|c| c.api_key == "test-key"));

    let body = calls[0].body.as_ref().unwrap();
    let expected = synthesize(Gender::Male, GarmentCategory::Bottom, FitPreference::Regular);
    assert_eq!(body["prompt"], expected.prompt.as_str());
    assert_eq!(body["negative_prompt"], expected.negative_prompt.as_str());
    assert_eq!(
        body["image_urls"],
        json!(["https://img.test/subject.jpg", "https://img.test/garment.jpg"])
    );
}

#[tokio::test]
async fn test_queue_times_out_at_attempt_ceiling() {
    let transport = MockTransport::new().queued().status("IN_PROGRESS");
    let sleeper = RecordingSleeper::default();
    let client = client(test_config(5), transport, sleeper.clone());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();

    assert!(matches!(err, TryOnError::Timeout { attempts: 5 }));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(client.transport().status_polls(), 5);
    assert_eq!(client.transport().result_fetches(), 0);
    assert_eq!(sleeper.count(), 4);
}

#[tokio::test]
async fn test_unknown_status_keeps_polling() {
    let transport = MockTransport::new()
        .queued()
        .status("WARMING_UP")
        .status("COMPLETED")
        .result_reply(200, json!({"image": {"url": "https://cdn.test/a.png"}}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let result = client.execute(&request(Provider::Queue)).await.unwrap();
    assert_eq!(result.image_url, "https://cdn.test/a.png");
    assert_eq!(client.transport().status_polls(), 2);
}

#[tokio::test]
async fn test_unknown_status_forever_times_out() {
    let transport = MockTransport::new().queued().status("SOMETHING_NEW");
    let client = client(test_config(3), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(client.transport().status_polls(), 3);
    assert_eq!(client.transport().result_fetches(), 0);
}

#[tokio::test]
async fn test_status_regression_still_completes() {
    let transport = MockTransport::new()
        .queued()
        .status("IN_PROGRESS")
        .status("IN_QUEUE")
        .status("COMPLETED")
        .result_reply(200, json!({"data": {"images": [{"url": "Y"}]}}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let result = client.execute(&request(Provider::Queue)).await.unwrap();
    assert_eq!(result.image_url, "Y");
    assert_eq!(client.transport().status_polls(), 3);
}

#[tokio::test]
async fn test_failed_status_surfaces_logs() {
    let transport = MockTransport::new().queued().status("IN_QUEUE").status_reply(
        200,
        json!({"status": "FAILED", "logs": [{"message": "face not detected"}]}),
    );
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    match err {
        TryOnError::ProviderFailure { ref logs, .. } => {
            assert_eq!(logs, &vec!["face not detected".to_string()]);
        }
        other => panic!("expected provider failure, got {:?}", other),
    }
    assert_eq!(client.transport().result_fetches(), 0);
}

#[tokio::test]
async fn test_submission_error_keeps_provider_body() {
    let transport = MockTransport::new().post_text(401, r#"{"detail":"Invalid key"}"#);
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    match err {
        TryOnError::Submission { status, ref body } => {
            assert_eq!(status, 401);
            assert_eq!(body, r#"{"detail":"Invalid key"}"#);
        }
        other => panic!("expected submission error, got {:?}", other),
    }
    assert_eq!(client.transport().call_count(), 1);
}

#[tokio::test]
async fn test_polling_error_is_fatal() {
    let transport = MockTransport::new()
        .queued()
        .status("IN_QUEUE")
        .status_reply(503, json!({"detail": "unavailable"}));
    let sleeper = RecordingSleeper::default();
    let client = client(test_config(10), transport, sleeper.clone());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Polling);
    assert_eq!(client.transport().status_polls(), 2);
    assert_eq!(sleeper.count(), 1);
}

#[tokio::test]
async fn test_result_fetch_error_is_polling_error() {
    let transport = MockTransport::new()
        .queued()
        .status("COMPLETED")
        .result_reply(404, json!({"detail": "gone"}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Polling);
}

#[tokio::test]
async fn test_completed_without_image_is_missing_output() {
    let transport = MockTransport::new()
        .queued()
        .status("COMPLETED")
        .result_reply(200, json!({"images": [], "seed": 42}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingOutput);
}

#[tokio::test]
async fn test_status_reply_without_status_is_polling_error() {
    let transport = MockTransport::new()
        .queued()
        .status_reply(200, json!({"queue_position": 3}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    match err {
        TryOnError::Polling { status, ref body } => {
            assert_eq!(status, 200);
            assert_eq!(body, r#"{"queue_position":3}"#);
        }
        other => panic!("expected polling error, got {:?}", other),
    }
    assert_eq!(client.transport().result_fetches(), 0);
}

#[tokio::test]
async fn test_submission_reply_without_request_id_is_submission_error() {
    let transport = MockTransport::new().post_reply(200, json!({"detail": "accepted"}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    match err {
        TryOnError::Submission { status, ref body } => {
            assert_eq!(status, 200);
            assert_eq!(body, r#"{"detail":"accepted"}"#);
        }
        other => panic!("expected submission error, got {:?}", other),
    }
    assert_eq!(client.transport().call_count(), 1);
}

#[tokio::test]
async fn test_submission_reply_not_json_is_submission_error() {
    let transport = MockTransport::new().post_text(200, "<html>ok</html>");
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
}

// --- Direct provider ---

#[tokio::test]
async fn test_direct_single_request() {
    let transport = MockTransport::new()
        .post_reply(200, json!({"images": [{"url": "https://cdn.test/direct.png"}]}));
    let sleeper = RecordingSleeper::default();
    let client = client(test_config(10), transport, sleeper.clone());
    let req = request(Provider::Direct)
        .garment_category(GarmentCategory::Dress)
        .fit_preference(FitPreference::Loose);

    let result = client.execute(&req).await.unwrap();

    assert_eq!(result.image_url, "https://cdn.test/direct.png");
    assert_eq!(result.provider_used, Provider::Direct);
    let calls = client.transport().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, DIRECT_ENDPOINT);
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["category"], "one-pieces");
    assert_eq!(body["mode"], "performance");
    assert!(body.get("prompt").is_none());
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn test_direct_error_body_is_verbatim() {
    let transport = MockTransport::new().post_text(500, "model overloaded");
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Direct)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    assert_eq!(err.to_string(), "Submission failed with HTTP 500: model overloaded");
}

#[tokio::test]
async fn test_direct_missing_output() {
    let transport = MockTransport::new().post_reply(200, json!({"status": "ok"}));
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Direct)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingOutput);
}

// --- Validation ---

#[tokio::test]
async fn test_missing_api_key_makes_no_calls() {
    let config = TryOnConfig::builder()
        .with_queue_endpoint(QUEUE_ENDPOINT)
        .build();
    let client = client(config, MockTransport::new().queued(), RecordingSleeper::default());

    for provider in [Provider::Direct, Provider::Queue] {
        let err = client.execute(&request(provider)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(client.transport().call_count(), 0);
}

#[tokio::test]
async fn test_missing_image_makes_no_calls() {
    let client = client(
        test_config(10),
        MockTransport::new().queued(),
        RecordingSleeper::default(),
    );

    let mut req = request(Provider::Queue);
    req.subject_image = None;
    let err = client.execute(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut req = request(Provider::Direct);
    req.garment_image = Some(ImageSource::bytes(Vec::new(), "image/png"));
    let err = client.execute(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(client.transport().call_count(), 0);
}

#[tokio::test]
async fn test_zero_attempt_ceiling_makes_no_calls() {
    let transport = MockTransport::new()
        .queued()
        .status("COMPLETED")
        .result_reply(200, json!({"images": [{"url": "X"}]}));
    let client = client(test_config(0), transport, RecordingSleeper::default());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(client.transport().call_count(), 0);
}

// --- Cancellation ---

#[tokio::test]
async fn test_cancelled_before_submit() {
    let flag = Arc::new(AtomicBool::new(true));
    let client = client(test_config(10), MockTransport::new().queued(), RecordingSleeper::default())
        .with_cancellation(flag);

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(client.transport().call_count(), 0);
}

#[tokio::test]
async fn test_cancelled_while_polling() {
    let flag = Arc::new(AtomicBool::new(false));
    let sleeper = RecordingSleeper {
        cancel_on_sleep: Some(flag.clone()),
        ..Default::default()
    };
    let transport = MockTransport::new().queued().status("IN_QUEUE");
    let client = client(test_config(10), transport, sleeper).with_cancellation(flag.clone());

    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();
    assert!(matches!(err, TryOnError::Cancelled));
    assert!(flag.load(Ordering::Relaxed));
    assert_eq!(client.transport().status_polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_poll_wait() {
    let flag = Arc::new(AtomicBool::new(false));
    let config = TryOnConfig::builder()
        .with_api_key("test-key")
        .with_queue_endpoint(QUEUE_ENDPOINT)
        .with_poll_interval(Duration::from_secs(60))
        .with_max_poll_attempts(10)
        .build();
    let client = TryOnClient::new(config)
        .with_transport(MockTransport::new().queued().status("IN_QUEUE"))
        .with_cancellation(flag.clone());

    let setter = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        setter.store(true, Ordering::Relaxed);
    });

    let start = tokio::time::Instant::now();
    let err = client.execute(&request(Provider::Queue)).await.unwrap_err();

    assert!(matches!(err, TryOnError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(client.transport().status_polls(), 1);
}

// --- UI reply ---

#[tokio::test]
async fn test_generate_reply_shapes() {
    let transport = MockTransport::new()
        .post_reply(200, json!({"image": {"url": "https://cdn.test/ok.png"}}))
        .post_text(422, "bad garment");
    let client = client(test_config(10), transport, RecordingSleeper::default());

    let ok = client.generate(&request(Provider::Direct)).await;
    assert_eq!(ok.image.as_deref(), Some("https://cdn.test/ok.png"));
    assert_eq!(ok.provider, Provider::Direct);
    assert!(ok.error.is_none());

    let failed = client.generate(&request(Provider::Direct)).await;
    assert!(failed.image.is_none());
    assert_eq!(failed.kind, Some(ErrorKind::Submission));
    assert!(failed.error.unwrap().contains("bad garment"));
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let first = client(
        test_config(10),
        MockTransport::new()
            .queued()
            .status("IN_PROGRESS")
            .status("COMPLETED")
            .result_reply(200, json!({"images": [{"url": "first"}]})),
        RecordingSleeper::default(),
    );
    let second = client(
        test_config(10),
        MockTransport::new().post_reply(200, json!({"image": {"url": "second"}})),
        RecordingSleeper::default(),
    );

    let req_q = request(Provider::Queue);
    let req_d = request(Provider::Direct);
    let (a, b) = tokio::join!(first.execute(&req_q), second.execute(&req_d));

    assert_eq!(a.unwrap().image_url, "first");
    assert_eq!(b.unwrap().image_url, "second");
}
