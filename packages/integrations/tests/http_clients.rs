// ABOUTME: Integration tests for the CRM, email and PDF HTTP clients
// ABOUTME: Runs each client against a wiremock server

use porchlight_integrations::{
    CrmClient, CrmContact, EmailMessage, EmailSender, HttpCrmClient, HttpEmailSender,
    HttpPdfRenderer, Integrations, IntegrationError, PdfRenderer, ServiceConfig,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> ServiceConfig {
    ServiceConfig::new(&server.uri(), "test-key").unwrap()
}

#[tokio::test]
async fn test_crm_upsert_returns_contact_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "email": "owner@example.com",
            "firstName": "Dana",
            "lastName": "Reyes",
            "source": "contact_form",
            "tags": ["website"],
            "customFields": { "leadId": "lead-1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "crm-42" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpCrmClient::new(service(&server)).unwrap();
    let mut contact = CrmContact {
        email: "owner@example.com".into(),
        source: "contact_form".into(),
        tags: vec!["website".into()],
        ..Default::default()
    }
    .with_full_name(Some("Dana Reyes"));
    contact
        .custom_fields
        .insert("leadId".into(), "lead-1".into());

    let id = client.upsert_contact(&contact).await.unwrap();
    assert_eq!(id, "crm-42");
}

#[tokio::test]
async fn test_crm_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts"))
        .respond_with(ResponseTemplate::new(422).set_body_string("email already merged"))
        .mount(&server)
        .await;

    let client = HttpCrmClient::new(service(&server)).unwrap();
    let err = client
        .upsert_contact(&CrmContact {
            email: "owner@example.com".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        IntegrationError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "email already merged");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_crm_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = HttpCrmClient::new(service(&server)).unwrap();
    let err = client
        .upsert_contact(&CrmContact::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_email_send_includes_sender() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({
            "from": "Porchlight <hello@porchlight.test>",
            "to": ["owner@example.com"],
            "subject": "Hello",
            "reply_to": "team@porchlight.test"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let sender =
        HttpEmailSender::new(service(&server), "Porchlight <hello@porchlight.test>").unwrap();
    let message = EmailMessage::new("owner@example.com", "Hello", "<p>Hi</p>")
        .reply_to("team@porchlight.test");

    sender.send(&message).await.unwrap();
}

#[tokio::test]
async fn test_email_without_recipients_is_rejected_locally() {
    let server = MockServer::start().await;
    let sender = HttpEmailSender::new(service(&server), "hello@porchlight.test").unwrap();

    let mut message = EmailMessage::new("x@example.com", "Hello", "<p>Hi</p>");
    message.to.clear();

    assert!(sender.send(&message).await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pdf_render_returns_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .and(body_partial_json(json!({ "html": "<h1>Timeline</h1>" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 fake".to_vec()))
        .mount(&server)
        .await;

    let renderer = HttpPdfRenderer::new(service(&server)).unwrap();
    let bytes = renderer.render_html("<h1>Timeline</h1>").await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_pdf_render_rejects_non_pdf_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>error page</html>"))
        .mount(&server)
        .await;

    let renderer = HttpPdfRenderer::new(service(&server)).unwrap();
    let err = renderer.render_html("<p>x</p>").await.unwrap_err();
    assert!(matches!(err, IntegrationError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_disabled_integrations_report_not_configured() {
    let integrations = Integrations::disabled();

    let crm_err = integrations
        .crm
        .upsert_contact(&CrmContact::default())
        .await
        .unwrap_err();
    assert!(crm_err.is_not_configured());

    let email_err = integrations
        .email
        .send(&EmailMessage::new("a@example.com", "s", "b"))
        .await
        .unwrap_err();
    assert!(email_err.is_not_configured());

    let pdf_err = integrations.pdf.render_html("<p></p>").await.unwrap_err();
    assert!(pdf_err.is_not_configured());
}
