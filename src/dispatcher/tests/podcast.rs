use super::*;
use crate::types::SideEntry;

fn side_with_audio() -> SideData {
    SideData::new(vec![
        SideEntry {
            topic: "AI".into(),
            audio_url: Some("https://cdn.example.com/ai.mp3".into()),
            summary: Some("A short generated summary".into()),
            item_count: 5,
        },
        SideEntry {
            topic: "Rust".into(),
            audio_url: None,
            summary: Some("summary without audio".into()),
            item_count: 2,
        },
    ])
}

#[tokio::test]
async fn side_content_rides_on_the_first_batch_only() {
    let (target, report) = target_with_batches(ChannelKind::Feishu, 3);
    let transport = MockTransport::replying(ok_response(ChannelKind::Feishu));
    let dispatcher = dispatcher(transport.clone());
    let side = side_with_audio();

    let outcome = dispatcher.dispatch(&target, &report, Some(&side)).await;
    assert_eq!(outcome.status, DispatchStatus::Succeeded);

    let element_counts: Vec<usize> = transport
        .requests()
        .iter()
        .map(|r| match &r.body {
            RequestBody::Json(v) => v["card"]["elements"].as_array().unwrap().len(),
            other => panic!("unexpected body {other:?}"),
        })
        .collect();
    assert!(element_counts[0] > 1);
    assert_eq!(&element_counts[1..], &[1, 1]);
}

#[tokio::test]
async fn podcast_card_is_sent_to_feishu() {
    let transport = MockTransport::replying(ok_response(ChannelKind::Feishu));
    let dispatcher = dispatcher(transport.clone());

    let outcome = dispatcher
        .dispatch_podcast_card(&fast_target(ChannelKind::Feishu), &side_with_audio())
        .await;

    assert!(outcome.overall_success);
    assert_eq!(outcome.batches_total, 1);
    assert_eq!(transport.call_count(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.url, "https://hooks.example.com/feishu");
    let RequestBody::Json(card) = &request.body else {
        panic!("expected JSON card");
    };
    assert_eq!(card["card"]["header"]["template"], "purple");
}

#[tokio::test]
async fn podcast_card_rejects_other_channels_and_empty_side_data() {
    let transport = MockTransport::replying(ok_response(ChannelKind::Feishu));
    let dispatcher = dispatcher(transport.clone());

    let outcome = dispatcher
        .dispatch_podcast_card(&fast_target(ChannelKind::Slack), &side_with_audio())
        .await;
    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert!(matches!(outcome.last_error, Some(Error::Config { .. })));

    let outcome = dispatcher
        .dispatch_podcast_card(&fast_target(ChannelKind::Feishu), &SideData::default())
        .await;
    assert_eq!(outcome.status, DispatchStatus::Failed);

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn rejected_podcast_card_reports_platform_message() {
    let transport = MockTransport::replying(HttpResponse::new(
        200,
        r#"{"code":9499,"msg":"Bad Request"}"#,
    ));
    let dispatcher = dispatcher(transport.clone());

    let outcome = dispatcher
        .dispatch_podcast_card(&fast_target(ChannelKind::Feishu), &side_with_audio())
        .await;

    assert!(!outcome.overall_success);
    assert_eq!(
        outcome.last_error,
        Some(Error::PlatformRejected {
            status: 200,
            message: "Bad Request".into()
        })
    );
}
