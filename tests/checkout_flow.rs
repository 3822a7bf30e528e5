use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use ticketdesk::config::ApiConfig;
use ticketdesk::external::ApiClient;
use ticketdesk::models::*;
use ticketdesk::services::StorefrontBackend;
use ticketdesk::tasks::PollLimits;
use ticketdesk::workflow::*;
use ticketdesk::AppError;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn flow(server: &MockServer) -> CheckoutFlow<StorefrontBackend> {
    let api = ApiClient::new(&ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
    })
    .unwrap();
    let settings = CheckoutSettings {
        show_id: "s1".to_string(),
        max_quantity: 10,
        countdown_secs: 3,
        countdown_tick: Duration::from_millis(10),
        handoff_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(50),
        poll_limits: PollLimits {
            max_attempts: None,
            max_duration: Some(Duration::from_secs(10)),
        },
    };
    CheckoutFlow::new(
        Arc::new(StorefrontBackend::new(api)),
        ComboCatalog::default(),
        settings,
    )
}

fn form() -> BookingForm {
    BookingForm {
        customer_name: "Nguyen A".to_string(),
        phone: "0901234567".to_string(),
        combo_id: "standard".to_string(),
        quantity: 2,
        seat_numbers: vec!["B7".to_string(), "B8".to_string()],
    }
}

#[tokio::test]
async fn test_booking_to_ticket() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .and(body_json(json!({
            "showId": "s1",
            "ticketTypeId": "standard",
            "customerName": "Nguyen A",
            "phone": "0901234567",
            "quantity": 2
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {
                "bookingId": "b-100042",
                "totalAmount": 2400000,
                "paymentQrString": "00020101021238570010A000000727"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    // first poll: nothing issued yet
    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .and(query_param("bookingId", "b-100042"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .and(query_param("bookingId", "b-100042"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t1", "bookingId": "b-100042", "ticketCode": "TK-001", "status": "valid"}
        ])))
        .mount(&server)
        .await;

    let mut flow = flow(&server);
    assert_eq!(flow.select(&form()).unwrap().total_price(), 2_400_000);
    flow.submit().await.unwrap();
    assert_eq!(flow.open_payment(), PaymentEntry::Show);
    flow.confirm_payment().unwrap();

    let mut events = Vec::new();
    let card = loop {
        match flow.next_event().await {
            Some(FlowEvent::TicketIssued(card)) => break card,
            Some(event) => events.push(event),
            None => panic!("flow stopped early after {events:?}"),
        }
    };

    assert_eq!(
        events,
        vec![
            FlowEvent::Countdown(2),
            FlowEvent::Countdown(1),
            FlowEvent::PaymentConfirmed,
            FlowEvent::PollingStarted {
                booking_id: "b-100042".to_string()
            },
        ]
    );
    assert_eq!(card.reference, "BK-100042");
    assert_eq!(card.customer_name, "Nguyen A");
    assert_eq!(card.package, "Standard");
    assert_eq!(card.seat_numbers, vec!["B7", "B8"]);
    assert_eq!(card.total_amount, 2_400_000);
    assert_eq!(card.ticket_codes, vec!["TK-001"]);

    let polls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/tickets")
        .count();
    assert_eq!(polls, 2);
    assert!(flow.selection().is_none());
}

#[tokio::test]
async fn test_rejected_booking_stays_on_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "Show is sold out"})))
        .mount(&server)
        .await;

    let mut flow = flow(&server);
    flow.select(&form()).unwrap();
    let err = flow.submit().await.unwrap_err();
    assert_eq!(err.notice().message, "Show is sold out");
    assert!(matches!(err, AppError::ApiError { status: 422, .. }));
    assert_eq!(flow.state(), &CheckoutState::Selecting);
    assert_eq!(flow.selection().unwrap().quantity(), 2);
    assert_eq!(flow.open_payment(), PaymentEntry::Redirect);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut flow = flow(&server);
    let bad_phone = BookingForm {
        phone: "12ab".to_string(),
        ..form()
    };
    assert!(flow.select(&bad_phone).unwrap_err().is_validation());
    let too_many = BookingForm {
        quantity: 11,
        ..form()
    };
    assert!(flow.select(&too_many).is_err());
    assert!(flow.submit().await.is_err());
}
