//! Orchestration tests against an in-process fake backend.
//!
//! No network: `FakeBackend` returns canned bodies per side and records what
//! it was asked, so these run everywhere.

use arc_extract::{
    extract_card, BackendReply, CardImages, ExtractError, ExtractionClient, ExtractionConfig,
    ExtractionProgressCallback, ExtractionResult, ImagePayload, Pricing, ProgressCallback, Side,
    TokenUsage, TransportKind, VisionBackend, VisionRequest, MASKED,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

const FRONT_BODY: &str = r#"{"Registration No.":"masked","Name":"JOHN DOE","Country/Region":"USA","Status":"masked","Issue Date":"2023.01.15"}"#;

const BACK_BODY: &str = r#"{"Serial No.":"1-234-567-8901","Duration of Stay":[
    {"Start Date":"2023.01.15","End Date":"2024.01.14","Check":"출입국관리사무소"},
    {"Start Date":"2024.01.15","End Date":"2026.01.14","Check":"연장"}
]}"#;

#[derive(Debug, Clone)]
struct Call {
    side: Side,
    system_prompt: String,
    data_uri: String,
}

#[derive(Default)]
struct FakeBackend {
    replies: HashMap<Side, Result<BackendReply, ExtractError>>,
    delays: HashMap<Side, Duration>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    fn reply(mut self, side: Side, body: &str, prompt_tokens: u64, completion_tokens: u64) -> Self {
        self.replies.insert(
            side,
            Ok(BackendReply {
                content: body.to_string(),
                usage: TokenUsage {
                    prompt_tokens,
                    completion_tokens,
                },
            }),
        );
        self
    }

    fn fail(mut self, side: Side, error: ExtractError) -> Self {
        self.replies.insert(side, Err(error));
        self
    }

    fn delay(mut self, side: Side, d: Duration) -> Self {
        self.delays.insert(side, d);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<BackendReply, ExtractError> {
        self.calls.lock().unwrap().push(Call {
            side: request.side,
            system_prompt: request.system_prompt.to_string(),
            data_uri: request.image.data_uri(),
        });
        if let Some(d) = self.delays.get(&request.side) {
            tokio::time::sleep(*d).await;
        }
        self.replies
            .get(&request.side)
            .cloned()
            .unwrap_or_else(|| panic!("no canned reply for {}", request.side))
    }
}

fn png_payload(seed: u8) -> ImagePayload {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(8, 5, |x, y| {
        Rgb([seed, x as u8 * 10, y as u8 * 20])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    ImagePayload::new(buf)
}

fn client(backend: &Arc<FakeBackend>) -> ExtractionClient {
    ExtractionClient::new(Arc::clone(backend) as Arc<dyn VisionBackend>, Pricing::default())
}

const EPS: f64 = 1e-12;

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn both_sides_are_extracted_and_totalled() {
    let backend = Arc::new(
        FakeBackend::default()
            .reply(Side::Front, FRONT_BODY, 1000, 500)
            .reply(Side::Back, BACK_BODY, 2000, 100),
    );
    let config = ExtractionConfig::default();
    let images = CardImages::both(png_payload(1), png_payload(2));

    let report = extract_card(&client(&backend), images, &config, None)
        .await
        .unwrap();

    assert_eq!(report.sides.len(), 2);
    assert_eq!(report.sides[0].side, Side::Front);
    assert_eq!(report.sides[1].side, Side::Back);
    assert_eq!(report.succeeded(), 2);

    let front = report.side(Side::Front).unwrap();
    let front_cost = front.cost.unwrap();
    assert!((front_cost.total_cost - 0.0075).abs() < EPS);
    match front.result.as_ref().unwrap() {
        ExtractionResult::Front(f) => {
            assert_eq!(f.registration_no, MASKED);
            assert_eq!(f.name, "JOHN DOE");
        }
        other => panic!("expected front, got {other:?}"),
    }

    let back = report.side(Side::Back).unwrap();
    match back.result.as_ref().unwrap() {
        ExtractionResult::Back(b) => {
            assert_eq!(b.duration_of_stay.rows().len(), 2);
            assert_eq!(b.duration_of_stay.rows()[1].check, "연장");
        }
        other => panic!("expected back, got {other:?}"),
    }

    assert_eq!(report.total.prompt_tokens, 3000);
    assert_eq!(report.total.completion_tokens, 600);
    assert!((report.total.total_cost - (0.0075 + 0.006)).abs() < EPS);

    let calls = backend.calls();
    assert_eq!(calls.iter().map(|c| c.side).collect::<Vec<_>>(), [Side::Front, Side::Back]);
    assert_eq!(calls[0].system_prompt, arc_extract::prompts::FRONT_SYSTEM_PROMPT);
    assert_eq!(calls[1].system_prompt, arc_extract::prompts::BACK_SYSTEM_PROMPT);
    assert!(calls[0].data_uri.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn back_transport_failure_keeps_front_result() {
    let backend = Arc::new(
        FakeBackend::default()
            .reply(Side::Front, FRONT_BODY, 1000, 500)
            .fail(
                Side::Back,
                ExtractError::Transport {
                    side: Side::Back,
                    kind: TransportKind::RateLimited,
                    detail: "Rate limit reached".into(),
                },
            ),
    );
    let report = extract_card(
        &client(&backend),
        CardImages::both(png_payload(1), png_payload(2)),
        &ExtractionConfig::default(),
        None,
    )
    .await
    .unwrap();

    let front = report.side(Side::Front).unwrap();
    assert!(front.is_success());
    assert!(front.result.is_some());

    let back = report.side(Side::Back).unwrap();
    assert!(back.result.is_none());
    assert!(back.cost.is_none());
    assert!(matches!(
        back.error,
        Some(ExtractError::Transport {
            kind: TransportKind::RateLimited,
            ..
        })
    ));

    assert!(!report.all_failed());
    assert!((report.total.total_cost - 0.0075).abs() < EPS);
}

#[tokio::test]
async fn malformed_back_body_is_parse_error() {
    let backend = Arc::new(
        FakeBackend::default()
            .reply(Side::Front, FRONT_BODY, 10, 10)
            .reply(Side::Back, "I could not find a table.", 900, 12),
    );
    let report = extract_card(
        &client(&backend),
        CardImages::both(png_payload(1), png_payload(2)),
        &ExtractionConfig::default(),
        None,
    )
    .await
    .unwrap();

    match report.side(Side::Back).unwrap().error.as_ref() {
        Some(ExtractError::Parse { side, raw, .. }) => {
            assert_eq!(*side, Side::Back);
            assert_eq!(raw, "I could not find a table.");
        }
        other => panic!("expected Parse, got {other:?}"),
    }
    // A rejected body is not priced into the total.
    assert_eq!(report.total.prompt_tokens, 10);
}

#[tokio::test]
async fn corrupt_front_image_never_reaches_backend() {
    let backend = Arc::new(FakeBackend::default().reply(Side::Back, BACK_BODY, 1, 1));
    let images = CardImages::both(ImagePayload::new(b"\x89PNG garbage".to_vec()), png_payload(3));

    let report = extract_card(&client(&backend), images, &ExtractionConfig::default(), None)
        .await
        .unwrap();

    assert!(matches!(
        report.side(Side::Front).unwrap().error,
        Some(ExtractError::Decode { side: Side::Front, .. })
    ));
    assert!(report.side(Side::Back).unwrap().is_success());
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].side, Side::Back);
}

#[tokio::test]
async fn combined_image_is_sent_with_both_schemas() {
    let backend = Arc::new(
        FakeBackend::default()
            .reply(Side::Front, FRONT_BODY, 1000, 500)
            .reply(Side::Back, BACK_BODY, 1000, 500),
    );
    let report = extract_card(
        &client(&backend),
        CardImages::Combined(png_payload(7)),
        &ExtractionConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.succeeded(), 2);
    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].data_uri, calls[1].data_uri);
    assert_ne!(calls[0].system_prompt, calls[1].system_prompt);
    assert!((report.total.total_cost - 0.015).abs() < EPS);
}

#[tokio::test]
async fn parallel_mode_keeps_front_first_order() {
    let backend = Arc::new(
        FakeBackend::default()
            .reply(Side::Front, FRONT_BODY, 1000, 500)
            .reply(Side::Back, BACK_BODY, 2000, 100)
            .delay(Side::Front, Duration::from_millis(150)),
    );
    let config = ExtractionConfig::builder().parallel_sides(true).build().unwrap();

    let report = extract_card(
        &client(&backend),
        CardImages::both(png_payload(1), png_payload(2)),
        &config,
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        report.sides.iter().map(|s| s.side).collect::<Vec<_>>(),
        [Side::Front, Side::Back]
    );
    assert!((report.total.total_cost - (0.0075 + 0.006)).abs() < EPS);
}

#[tokio::test]
async fn single_back_image_processes_only_back() {
    let backend = Arc::new(FakeBackend::default().reply(Side::Back, BACK_BODY, 5, 5));
    let report = extract_card(
        &client(&backend),
        CardImages::back(png_payload(4)),
        &ExtractionConfig::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.sides.len(), 1);
    assert_eq!(report.sides[0].side, Side::Back);
}

#[tokio::test]
async fn empty_input_is_fatal() {
    let backend = Arc::new(FakeBackend::default());
    let images = CardImages::Sides {
        front: None,
        back: None,
    };
    let err = extract_card(&client(&backend), images, &ExtractionConfig::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, arc_extract::ArcExtractError::NoInput));
}

#[tokio::test]
async fn progress_callbacks_fire_per_side() {
    #[derive(Default)]
    struct Counting {
        started: AtomicUsize,
        completed: AtomicUsize,
        errors: AtomicUsize,
        finished: Mutex<Option<(usize, usize)>>,
    }

    impl ExtractionProgressCallback for Counting {
        fn on_side_start(&self, _side: Side) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_side_complete(&self, _side: Side, _duration_ms: u64) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_side_error(&self, _side: Side, _error: String) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_extraction_complete(&self, total: usize, success: usize) {
            *self.finished.lock().unwrap() = Some((total, success));
        }
    }

    let backend = Arc::new(
        FakeBackend::default()
            .reply(Side::Front, FRONT_BODY, 1, 1)
            .reply(Side::Back, "[]", 1, 1),
    );
    let counting = Arc::new(Counting::default());
    let cb: ProgressCallback = counting.clone();

    extract_card(
        &client(&backend),
        CardImages::both(png_payload(1), png_payload(2)),
        &ExtractionConfig::default(),
        Some(&cb),
    )
    .await
    .unwrap();

    assert_eq!(counting.started.load(Ordering::SeqCst), 2);
    assert_eq!(counting.completed.load(Ordering::SeqCst), 1);
    assert_eq!(counting.errors.load(Ordering::SeqCst), 1);
    assert_eq!(*counting.finished.lock().unwrap(), Some((2, 1)));
}

#[tokio::test]
async fn report_serialises_to_json() {
    let backend = Arc::new(FakeBackend::default().reply(Side::Front, FRONT_BODY, 1000, 500));
    let report = extract_card(
        &client(&backend),
        CardImages::front(png_payload(1)),
        &ExtractionConfig::default(),
        None,
    )
    .await
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["sides"][0]["side"], "front");
    assert_eq!(json["sides"][0]["result"]["Name"], "JOHN DOE");
    assert_eq!(json["total"]["prompt_tokens"], 1000);
}
